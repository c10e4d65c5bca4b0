//! Public transport routing engine.
//!
//! Builds a layered graph from a static transit feed (stops, lines and
//! inferred walking transfers), caches it as a snapshot on disk, and
//! answers "how do I get from here to there at this time?" with a single
//! best itinerary.

pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod network;
pub mod planner;
pub mod stations;
pub mod walkable;
