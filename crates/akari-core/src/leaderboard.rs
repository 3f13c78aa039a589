//! Leaderboard aggregation.
//!
//! Pure kernel over a raw event set: group by participant, count, score at a
//! fixed points-per-completion multiplier, rank, truncate. The ordering is a
//! total order (score desc, raw count desc, participant id asc) so identical
//! input always yields identical output; any persisted snapshot is an
//! advisory cache that a recompute can safely replace.

use crate::{AkariError, CompletionEvent, Points, Result, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: u32,
    pub participant: UserId,
    pub completions: u64,
    pub score: Points,
}

/// Rank participants by completion count.
///
/// `points_per_completion` is in raw points units. `top_n` truncates the
/// ranked output; zero is rejected since it would make every call a no-op.
pub fn compute(
    events: &[CompletionEvent],
    points_per_completion: u64,
    top_n: usize,
) -> Result<Vec<LeaderboardRow>> {
    if top_n == 0 {
        return Err(AkariError::InvalidArgument("top_n must be positive".into()));
    }

    let mut counts: BTreeMap<UserId, u64> = BTreeMap::new();
    for event in events {
        *counts.entry(event.participant).or_insert(0) += 1;
    }

    let mut rows = Vec::with_capacity(counts.len());
    for (participant, completions) in counts {
        let score = completions
            .checked_mul(points_per_completion)
            .map(Points)
            .ok_or_else(|| AkariError::Internal("leaderboard score overflow".into()))?;
        rows.push((participant, completions, score));
    }

    rows.sort_by(|a, b| b.2.cmp(&a.2).then(b.1.cmp(&a.1)).then(a.0.cmp(&b.0)));
    rows.truncate(top_n);

    Ok(rows
        .into_iter()
        .enumerate()
        .map(|(idx, (participant, completions, score))| LeaderboardRow {
            rank: (idx + 1) as u32,
            participant,
            completions,
            score,
        })
        .collect())
}
