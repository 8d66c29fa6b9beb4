//! Vote reconciliation: at most one vote per nickname, last write wins.

use crate::session::Vote;

/// Merge an incoming vote into a vote list.
///
/// Any existing entry with the same nickname (case-sensitive exact match) is
/// removed and the incoming vote is appended, so a re-vote moves to the end
/// of arrival order. Order of unaffected entries is preserved. A vote
/// referencing an unknown mood id is accepted as-is; validation is deferred
/// to aggregation and display.
pub fn reconcile(votes: Vec<Vote>, incoming: Vote) -> Vec<Vote> {
    let mut merged: Vec<Vote> = votes
        .into_iter()
        .filter(|v| v.nickname != incoming.nickname)
        .collect();
    merged.push(incoming);
    merged
}
