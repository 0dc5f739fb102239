//! Endpoint health tracking.
//!
//! Each endpoint keeps its last probe results in three bounded windows
//! (2, 10 and 60 minutes) and flips between up and down whenever the
//! short-window availability crosses 80%.

mod endpoint;
mod history;
mod window;

pub use endpoint::*;
pub use history::*;
pub use window::*;
