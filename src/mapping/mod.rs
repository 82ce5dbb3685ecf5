//! Mapping module - the per-scan pipeline.
//!
//! ```text
//! scan + raw pose
//!   -> transform into map frame
//!   -> map empty?  yes: grow map (Bootstrap), done
//!   -> neighbors from map, back to robot frame (LocalizeAndAlign)
//!   -> register scan against neighbors
//!   -> refined = raw + correction, re-transform, grow map, extend path (GrowMap)
//! ```
//!
//! Any failure before the last step leaves the map and the path untouched.

pub mod mapper;
pub mod result;
pub mod shared;
pub mod state;
pub mod trajectory;

pub use mapper::OctreeMapper;
pub use result::ScanOutcome;
pub use shared::SharedMapper;
pub use state::MappingState;
pub use trajectory::RefinedPath;
