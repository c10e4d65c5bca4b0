//! Stop registry, name normalization and nearest-stop lookup.

mod names;
mod nearest;
mod registry;

pub use names::NameNormalizer;
pub use nearest::{DEFAULT_SEARCH_WINDOW_DEG, NearestStop, StopResolutionFailure, nearest_stop};
pub use registry::{StopIndex, StopRegistry};
