//! Per-scan state machine of the mapper.

/// Stage the mapper is in (or stopped at) for the current scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MappingState {
    /// Map is empty; the scan seeds it with its raw pose.
    #[default]
    Bootstrap,
    /// Retrieving the local map and registering the scan against it.
    LocalizeAndAlign,
    /// Registration converged; placing the scan and extending the map.
    GrowMap,
    /// The last scan was rejected; map and trajectory were left untouched.
    Failed,
}

impl std::fmt::Display for MappingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MappingState::Bootstrap => "Bootstrap",
            MappingState::LocalizeAndAlign => "LocalizeAndAlign",
            MappingState::GrowMap => "GrowMap",
            MappingState::Failed => "Failed",
        };
        f.write_str(name)
    }
}
