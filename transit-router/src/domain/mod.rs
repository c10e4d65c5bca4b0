//! Domain types for the transit router.
//!
//! This module contains the value types shared by the feed, the graph
//! builder and the router. Types validate their invariants at construction
//! time, so code that receives them can trust their validity.

mod duration;
mod line;
mod stop;
mod time_mode;

pub use duration::{format_duration, whole_minutes};
pub use line::{Line, LineMode, normalize_line_name};
pub use stop::{Coordinates, InvalidStopId, Stop, StopId};
pub use time_mode::{NightWindow, TimeMode, query_hour};
