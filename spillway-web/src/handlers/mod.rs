//! HTTP request handlers organized by route.

pub mod manifest;
pub mod progressive;
pub mod segment;
pub mod utils;

// Re-export handler functions
pub use manifest::serve_master_manifest;
pub use progressive::relay_progressive;
pub use segment::relay_segment;
pub use utils::{extract_range_header, raw_query_param};
