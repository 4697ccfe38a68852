pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

pub fn harvest() -> LogCtx<ops::harvest::Harvest> {
    LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData }
}

pub fn maintain() -> LogCtx<ops::maintain::Maintain> {
    LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData }
}
