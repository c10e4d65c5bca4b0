//! Route planning over the layered graph.
//!
//! A query resolves both endpoints to their nearest stops, picks the day or
//! night network from the query time, runs Dijkstra over the algorithmic
//! edge weights and folds the resulting edge path into legs whose durations
//! come from the real-time edge costs.

mod config;
mod cost;
mod dijkstra;
mod itinerary;
mod search;

pub use config::RouterConfig;
pub use cost::edge_cost;
pub use itinerary::{Itinerary, ItineraryLeg};
pub use search::{RouteError, Router};
