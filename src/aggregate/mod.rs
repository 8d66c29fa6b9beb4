//! Aggregation engine: per-mood counts, dominant mood, kudos extraction.

use crate::session::Session;
use crate::theme::{self, MoodOption};
use std::collections::HashMap;

/// Aggregate view of a session's votes.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodBreakdown {
    /// Tally per raw mood id. Unknown ids are counted under their raw string.
    pub counts: HashMap<String, usize>,
    /// The winning mood, resolved against the session's theme. `None` when
    /// there are no votes; callers render a neutral placeholder.
    pub dominant: Option<MoodOption>,
    /// All non-empty kudos, trimmed, in vote order. Display caps are a
    /// presentation concern.
    pub kudos: Vec<String>,
    /// Mean sentiment value across votes; 0.0 when there are no votes.
    pub mean_value: f32,
    /// Fraction of votes whose resolved value is below 0.5. Drives the
    /// summarizer's nudge condition.
    pub low_mood_share: f32,
}

/// Compute the aggregate view of a session.
///
/// Tie-break: the dominant mood is the first mood id to reach the maximum
/// count in vote arrival order, independent of map iteration order.
pub fn aggregate(session: &Session) -> MoodBreakdown {
    let options = session.theme_options();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut best: Option<(String, usize)> = None;
    let mut kudos = Vec::new();
    let mut value_sum = 0.0f32;
    let mut low_count = 0usize;

    for vote in &session.votes {
        let count = counts.entry(vote.mood_id.clone()).or_insert(0);
        *count += 1;
        // Strictly-greater keeps the earlier id on ties.
        if best.as_ref().is_none_or(|(_, max)| *count > *max) {
            best = Some((vote.mood_id.clone(), *count));
        }

        if let Some(k) = &vote.kudos {
            let trimmed = k.trim();
            if !trimmed.is_empty() {
                kudos.push(trimmed.to_string());
            }
        }

        let value = theme::find(options, &vote.mood_id)
            .map_or_else(|| MoodOption::unknown(&vote.mood_id).value, |o| o.value);
        value_sum += value;
        if value < 0.5 {
            low_count += 1;
        }
    }

    let total = session.votes.len();
    let dominant = best.map(|(id, _)| {
        theme::find(options, &id)
            .cloned()
            .unwrap_or_else(|| MoodOption::unknown(&id))
    });

    MoodBreakdown {
        counts,
        dominant,
        kudos,
        mean_value: if total == 0 { 0.0 } else { value_sum / total as f32 },
        low_mood_share: if total == 0 {
            0.0
        } else {
            low_count as f32 / total as f32
        },
    }
}
