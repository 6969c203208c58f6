use std::collections::BTreeMap;

use crate::models::player::{self, PlayerId, PlayerState};

const EPSILON: f64 = 1e-9;

/// Weighted plurality count over `voter -> target` ballots.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    counts: BTreeMap<PlayerId, f64>,
}

impl Tally {
    pub(crate) fn count<'a, I, W>(players: &[PlayerState], ballots: I, weight: W) -> Self
    where
        I: IntoIterator<Item = (&'a PlayerId, &'a PlayerId)>,
        W: Fn(&PlayerState) -> f64,
    {
        let mut counts = BTreeMap::new();
        for (voter, target) in ballots {
            let w = player::find(players, voter).map_or(1.0, &weight);
            *counts.entry(target.clone()).or_insert(0.0) += w;
        }
        Self { counts }
    }

    /// Every target sharing the top count, lowest seat first.
    pub(crate) fn leaders(&self, players: &[PlayerState]) -> Vec<PlayerId> {
        let Some(max) = self.counts.values().copied().reduce(f64::max) else {
            return Vec::new();
        };
        let mut leaders: Vec<PlayerId> = self
            .counts
            .iter()
            .filter(|(_, count)| (max - **count).abs() < EPSILON)
            .map(|(id, _)| id.clone())
            .collect();
        leaders.sort_by_key(|id| player::seat_of(players, id));
        leaders
    }

    /// Plurality winner, ties going to the lowest seat number.
    pub(crate) fn winner(&self, players: &[PlayerState]) -> Option<PlayerId> {
        self.leaders(players).into_iter().next()
    }

    /// Plurality winner only when nobody shares the top count.
    pub(crate) fn outright_winner(&self, players: &[PlayerState]) -> Option<PlayerId> {
        let mut leaders = self.leaders(players);
        if leaders.len() == 1 {
            leaders.pop()
        } else {
            None
        }
    }
}
