//! Time-mode edge filter.

use crate::domain::TimeMode;
use crate::network::{Edge, EdgeKind};

/// Weight of `edge` for a query in `mode`, or `None` if it may not be used.
///
/// Only boarding is filtered: once a line cannot be boarded, none of its
/// travel edges are reachable either.
pub fn edge_cost(edge: &Edge, mode: TimeMode) -> Option<f64> {
    if edge.kind == EdgeKind::Board {
        let allowed = match mode {
            TimeMode::Day => edge.day_eligible,
            TimeMode::Night => edge.night_eligible,
        };
        if !allowed {
            return None;
        }
    }
    Some(edge.weight)
}
