use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// One participant-detail row, appended per harvest of a profile.
/// Stale duplicates are pruned by the post-run maintenance step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipientRow {
    pub recipient_id: i64,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub country: Option<String>,
    pub occupation: Option<String>,
    pub completed: bool,
    pub last_updated: DateTime<Utc>,
}

/// One question/answer pair from a survey update on a profile page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRow {
    pub recipient_id: i64,
    pub survey_id: i64,
    pub question: String,
    pub answer: String,
    pub payment: Option<String>,
    pub amount_usd: Option<f64>,
    pub amount_local: Option<f64>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Result of one fetch attempt. Expected negative cases are variants here;
/// only transport or otherwise unexpected failures travel as the `Err` arm
/// of the fetcher's `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Loaded {
        recipient: RecipientRow,
        responses: Vec<ResponseRow>,
    },
    /// Profile exists but every survey on it is already persisted.
    NoUpdate,
    /// Identifier does not resolve to a profile.
    NoProfile,
    /// Profile page came back blank.
    EmptyResponse,
    /// New surveys exist but none carries a question/answer pair.
    NoQuestions,
    /// Page retrieved but the expected structure was not found.
    ParsingError,
}

/// Work already durably persisted, snapshotted once at run start.
/// Read-only for the whole run; a re-run takes a fresh snapshot and
/// therefore naturally skips prior successes.
#[derive(Debug, Clone, Default)]
pub struct CompletedSet {
    pub rids: HashSet<i64>,
    pub surveys: HashSet<i64>,
}

/// Per-category counts over one batch. Every attempted identifier lands in
/// exactly one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub loaded: usize,
    pub no_updates: usize,
    pub no_profile: usize,
    pub parsing_error: usize,
    pub unknown_error: usize,
    pub empty_response: usize,
    pub no_questions: usize,
}

impl OutcomeCounts {
    pub fn total(&self) -> usize {
        self.loaded
            + self.no_updates
            + self.no_profile
            + self.parsing_error
            + self.unknown_error
            + self.empty_response
            + self.no_questions
    }

    pub fn add(&mut self, other: &OutcomeCounts) {
        self.loaded += other.loaded;
        self.no_updates += other.no_updates;
        self.no_profile += other.no_profile;
        self.parsing_error += other.parsing_error;
        self.unknown_error += other.unknown_error;
        self.empty_response += other.empty_response;
        self.no_questions += other.no_questions;
    }
}
