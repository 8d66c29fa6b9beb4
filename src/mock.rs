//! Simulated team generator for demos and facilitator dry runs.

use crate::session::{Session, Vote};
use rand::Rng;

const NAMES: [&str; 6] = ["Alice", "Bob", "Charlie", "Diana", "Eve", "Frank"];

const REASONS: [&str; 6] = [
    "Great progress on the feature!",
    "Feeling a bit stuck on the API",
    "Meeting fatigue is real",
    "Excited for the weekend",
    "Coffee isn't working today",
    "Just finished a huge refactor",
];

// Blank entries are kept blank: not everyone leaves kudos.
const KUDOS: [&str; 6] = [
    "Kudos to Bob for the pair programming!",
    "Alice saved my day with that fix",
    "",
    "Eve is crushing the designs",
    "",
    "",
];

/// One vote per simulated teammate, with a random mood drawn from the
/// session's own option catalog.
pub fn simulated_team(session: &Session) -> Vec<Vote> {
    let options = session.theme_options();
    let mut rng = rand::rng();

    NAMES
        .iter()
        .zip(REASONS)
        .zip(KUDOS)
        .map(|((name, reason), kudos)| {
            let mood_id = if options.is_empty() {
                "1".to_string()
            } else {
                options[rng.random_range(0..options.len())].id.clone()
            };
            let mut vote = Vote::new(*name, mood_id).with_reason(reason);
            if !kudos.is_empty() {
                vote = vote.with_kudos(kudos);
            }
            vote
        })
        .collect()
}
