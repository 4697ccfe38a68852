pub mod harvest;
pub mod maintain;
