use std::marker::PhantomData;
use tracing::{Span, error, info, warn};

use crate::harvest::types::OutcomeCounts;

pub trait PhaseSpan {
    fn name(&self) -> &'static str;
    fn span(&self) -> Span;
}

pub trait OpMarker {
    const NAME: &'static str;
    type Phase: PhaseSpan;
    fn root_span() -> Span;
}

pub struct LogCtx<O: OpMarker> {
    pub(crate) json: bool,
    pub(crate) _marker: PhantomData<O>,
}

impl<O: OpMarker> LogCtx<O> {
    fn op_name(&self) -> &'static str { O::NAME }

    pub fn root_span(&self) -> Span { O::root_span() }

    pub fn root_span_kv<'a, T>(&self, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.root_span();
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), "start");
        } else {
            info!(op = %self.op_name(), details = %details, "start");
        }
        span
    }

    pub fn span(&self, ph: &O::Phase) -> Span { ph.span() }

    pub fn span_kv<'a, T>(&self, ph: &O::Phase, fields: T) -> Span
    where
        T: IntoIterator<Item = (&'a str, String)>,
    {
        let span = self.span(ph);
        let details = kv_to_string(fields);
        if details.is_empty() {
            info!(op = %self.op_name(), phase = ph.name(), "span_start");
        } else {
            info!(op = %self.op_name(), phase = ph.name(), details = %details, "span_start");
        }
        span
    }

    pub fn info(&self, msg: impl AsRef<str>) { if self.json { info!(op = %self.op_name(), "{}", msg.as_ref()); } else { info!("{}", msg.as_ref()); } }
    pub fn warn(&self, msg: impl AsRef<str>) { if self.json { warn!(op = %self.op_name(), "{}", msg.as_ref()); } else { warn!("{}", msg.as_ref()); } }
    pub fn error(&self, msg: impl AsRef<str>) { if self.json { error!(op = %self.op_name(), "{}", msg.as_ref()); } else { error!("{}", msg.as_ref()); } }

    pub fn info_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        if self.json { let details = kv_to_string(kv); info!(op = %self.op_name(), details = %details, "{}", msg); }
        else { info!("{}", msg); }
    }

    pub fn warn_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        let details = kv_to_string(kv);
        if self.json { warn!(op = %self.op_name(), details = %details, "{}", msg); }
        else { warn!("{} {}", msg, details); }
    }

    pub fn error_kv<'a, D>(&self, msg: &str, kv: D)
    where
        D: IntoIterator<Item = (&'a str, String)>,
    {
        let details = kv_to_string(kv);
        if self.json { error!(op = %self.op_name(), details = %details, "{}", msg); }
        else { error!("{} {}", msg, details); }
    }
}

// Harvest-specific helpers remain available on the typed context
impl LogCtx<crate::telemetry::ops::harvest::Harvest> {
    pub fn batch_summary(
        &self,
        attempted: usize,
        skipped: usize,
        start: i64,
        finish: i64,
        interval: i64,
        counts: &OutcomeCounts,
    ) {
        if self.json {
            info!(
                op = %self.op_name(),
                attempted, skipped, start, finish, interval,
                loaded = counts.loaded,
                no_updates = counts.no_updates,
                no_profile = counts.no_profile,
                parsing_error = counts.parsing_error,
                unknown_error = counts.unknown_error,
                empty_response = counts.empty_response,
                no_questions = counts.no_questions,
                "batch_summary"
            );
        } else {
            info!(
                "✅ Finished scraping {} profiles between rid {} and {} with interval {}. Skipped {} complete profiles\n  Loaded: {}\n  No Updates: {}\n  No Profile: {}\n  Parsing Errors: {}\n  Unknown Errors: {}\n  Empty response: {}\n  No questions for item: {}",
                attempted, start, finish, interval, skipped,
                counts.loaded, counts.no_updates, counts.no_profile,
                counts.parsing_error, counts.unknown_error,
                counts.empty_response, counts.no_questions
            );
        }
    }

    pub fn totals(&self, batches: usize, skipped: usize, counts: &OutcomeCounts) {
        if self.json {
            info!(
                op = %self.op_name(),
                batches, skipped,
                loaded = counts.loaded,
                no_updates = counts.no_updates,
                no_profile = counts.no_profile,
                parsing_error = counts.parsing_error,
                unknown_error = counts.unknown_error,
                empty_response = counts.empty_response,
                no_questions = counts.no_questions,
                "harvest_totals"
            );
        } else {
            info!(
                "📊 Harvest totals — batches={} loaded={} no_updates={} no_profile={} parsing_errors={} unknown_errors={} empty_responses={} no_questions={} skipped={}",
                batches, counts.loaded, counts.no_updates, counts.no_profile,
                counts.parsing_error, counts.unknown_error,
                counts.empty_response, counts.no_questions, skipped
            );
        }
    }
}

fn kv_to_string<'a, T>(kv: T) -> String
where
    T: IntoIterator<Item = (&'a str, String)>,
{
    let mut parts: Vec<String> = Vec::new();
    for (k, v) in kv { parts.push(format!("{}={}", k, v)); }
    parts.join(" ")
}
