use std::collections::BTreeSet;

use crate::models::RiskFlag;

/// Running risk total with the flags that produced it
///
/// Intermediate values may leave 0..=100; only the final score is clamped.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RiskTally {
    score: i32,
    flags: BTreeSet<RiskFlag>,
}

impl RiskTally {
    pub(crate) fn flagged(points: i32, flag: RiskFlag) -> Self {
        let mut tally = Self::default();
        tally.add(points, flag);
        tally
    }

    pub(crate) fn add(&mut self, points: i32, flag: RiskFlag) {
        self.score += points;
        self.flags.insert(flag);
    }

    pub(crate) fn relieve(&mut self, points: i32, flag: RiskFlag) {
        self.score -= points;
        self.flags.insert(flag);
    }

    pub(crate) fn into_parts(self) -> (u8, BTreeSet<RiskFlag>) {
        (clamp_score(self.score), self.flags)
    }
}

pub(crate) fn clamp_score(score: i32) -> u8 {
    score.clamp(0, 100) as u8
}
