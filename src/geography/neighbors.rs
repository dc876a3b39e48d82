use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::CountryCode;

/// Land-border adjacency per country
///
/// Maintained by hand: lookups are one-directional and coverage is partial.
/// A missing entry simply means no risk relief.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighborTable(BTreeMap<CountryCode, Vec<CountryCode>>);

impl NeighborTable {
    pub fn new(entries: BTreeMap<CountryCode, Vec<CountryCode>>) -> Self {
        Self(entries)
    }

    /// `b` is listed as a neighbor of `a`
    pub fn are_neighbors(&self, a: &str, b: &str) -> bool {
        self.0
            .get(a)
            .is_some_and(|list| list.iter().any(|code| code == b))
    }

    pub fn neighbors_of(&self, code: &str) -> &[CountryCode] {
        self.0.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn normalize(self) -> Self {
        Self(
            self.0
                .into_iter()
                .map(|(code, list)| {
                    (
                        code.to_ascii_uppercase(),
                        list.into_iter().map(|c| c.to_ascii_uppercase()).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl FromIterator<(&'static str, &'static [&'static str])> for NeighborTable {
    fn from_iter<I: IntoIterator<Item = (&'static str, &'static [&'static str])>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(code, list)| {
                    (
                        code.to_string(),
                        list.iter().map(|c| c.to_string()).collect(),
                    )
                })
                .collect(),
        )
    }
}
