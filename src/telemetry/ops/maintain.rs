use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Maintain;

#[derive(Copy, Clone, Debug)]
pub enum Phase { DeleteStale, GenderTable, AggregateTable }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::DeleteStale => "delete_stale",
        Phase::GenderTable => "gender_table",
        Phase::AggregateTable => "aggregate_table",
    }}
    fn span(&self) -> Span { match self {
        Phase::DeleteStale => info_span!("delete_stale"),
        Phase::GenderTable => info_span!("gender_table"),
        Phase::AggregateTable => info_span!("aggregate_table"),
    }}
}

impl OpMarker for Maintain {
    const NAME: &'static str = "maintain";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("maintain") }
}
