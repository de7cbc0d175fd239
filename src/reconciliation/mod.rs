mod plan;
mod review;

pub use plan::{listing_order, reconcile_artist, Reconciliation, ReconciliationPlan};
pub use review::{
    apply, parse_decisions, proposed_decisions, render_proposal, AcceptAll, Action, AppliedTrack,
    Decision, ReviewError, Reviewer,
};
