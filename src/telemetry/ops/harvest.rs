use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Harvest;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Snapshot, Plan, Fetch, Classify, Load }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Snapshot => "snapshot",
        Phase::Plan => "plan",
        Phase::Fetch => "fetch",
        Phase::Classify => "classify",
        Phase::Load => "load",
    }}
    fn span(&self) -> Span { match self {
        Phase::Snapshot => info_span!("snapshot"),
        Phase::Plan => info_span!("plan"),
        Phase::Fetch => info_span!("fetch"),
        Phase::Classify => info_span!("classify"),
        Phase::Load => info_span!("load"),
    }}
}

impl OpMarker for Harvest {
    const NAME: &'static str = "harvest";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("harvest") }
}
