//! Stop registry.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Stop, StopId};

/// Dense index of a stop within a [`StopRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopIndex(pub u32);

impl StopIndex {
    /// Returns the index as a `usize` for slice access.
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Owner of every stop in a network.
///
/// Stops keep the order in which they were inserted, which is the feed
/// order. Everything else refers to stops by [`StopIndex`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopRegistry {
    stops: Vec<Stop>,
    by_id: HashMap<StopId, StopIndex>,
}

impl StopRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from stops in order, dropping repeated ids.
    pub fn from_stops(stops: impl IntoIterator<Item = Stop>) -> Self {
        let mut registry = Self::new();
        for stop in stops {
            registry.insert(stop);
        }
        registry
    }

    /// Insert a stop.
    ///
    /// Returns `None` if a stop with the same id is already registered; the
    /// first registration wins.
    pub fn insert(&mut self, stop: Stop) -> Option<StopIndex> {
        if self.by_id.contains_key(&stop.id) {
            return None;
        }
        let index = StopIndex(self.stops.len() as u32);
        self.by_id.insert(stop.id.clone(), index);
        self.stops.push(stop);
        Some(index)
    }

    /// Look up a stop by index.
    pub fn get(&self, index: StopIndex) -> Option<&Stop> {
        self.stops.get(index.get())
    }

    /// Look up a stop's index by feed id.
    pub fn index_of(&self, id: &StopId) -> Option<StopIndex> {
        self.by_id.get(id).copied()
    }

    /// Look up a stop's index by a raw feed id string.
    pub fn index_of_str(&self, id: &str) -> Option<StopIndex> {
        StopId::parse(id).ok().and_then(|id| self.index_of(&id))
    }

    /// Iterate stops in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (StopIndex, &Stop)> {
        self.stops
            .iter()
            .enumerate()
            .map(|(i, stop)| (StopIndex(i as u32), stop))
    }

    /// All stops in insertion order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Number of stops.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Whether the registry has no stops.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
