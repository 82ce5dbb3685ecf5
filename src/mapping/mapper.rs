//! The octree mapper: refines raw poses against the map and grows it.

use tracing::{debug, info, warn};

use crate::cloud::{PointCloud, Scan, transform_cloud};
use crate::config::MapperConfig;
use crate::error::Result;
use crate::geometry::Pose6DOF;
use crate::map::PointMap;
use crate::publish::{CloudTopic, MapObserver, NullObserver, StampedCloud};
use crate::registration::GeneralizedIcp;

use super::{MappingState, RefinedPath, ScanOutcome};

/// Scan-to-map mapper.
///
/// Owns the map, the refined path and the registration engine. All methods
/// take `&mut self`, so one scan is always processed start to finish before
/// the next; see [`super::SharedMapper`] for use from several threads.
#[derive(Debug)]
pub struct OctreeMapper<O = NullObserver> {
    config: MapperConfig,
    map: PointMap,
    registration: GeneralizedIcp,
    trajectory: RefinedPath,
    observer: O,
    state: MappingState,
}

impl OctreeMapper<NullObserver> {
    /// Mapper without any output listeners.
    pub fn new(config: MapperConfig) -> Result<Self> {
        Self::with_observer(config, NullObserver)
    }
}

impl<O: MapObserver> OctreeMapper<O> {
    /// Validate `config` and build an empty mapper reporting to `observer`.
    pub fn with_observer(config: MapperConfig, observer: O) -> Result<Self> {
        config.validate()?;
        let map = PointMap::new(config.octree_resolution)?;
        let registration = GeneralizedIcp::new(config.registration.clone())?;

        info!(
            "[Mapper] resolution={} method={:?} frames: map={} robot={}",
            config.octree_resolution,
            config.registration.method,
            config.map_frame,
            config.robot_frame
        );

        Ok(Self {
            config,
            map,
            registration,
            trajectory: RefinedPath::new(),
            observer,
            state: MappingState::Bootstrap,
        })
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn map(&self) -> &PointMap {
        &self.map
    }

    pub fn trajectory(&self) -> &RefinedPath {
        &self.trajectory
    }

    /// Stage reached by the last processed scan.
    pub fn state(&self) -> MappingState {
        self.state
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    /// Drop every map point and rebuild the index with `resolution`.
    ///
    /// The refined path is kept. On an invalid resolution nothing changes.
    pub fn reset_map(&mut self, resolution: f64) -> Result<()> {
        self.map.reset(resolution)?;
        self.state = MappingState::Bootstrap;
        info!("[Mapper] map reset, resolution={}", resolution);
        Ok(())
    }

    /// Process one scan taken at `raw_pose` (robot pose in the map frame).
    ///
    /// Never fails: per-scan errors come back as [`ScanOutcome::Rejected`],
    /// in which case neither the map nor the path has been modified.
    pub fn refine_transform_and_grow_map(&mut self, scan: &Scan, raw_pose: &Pose6DOF) -> ScanOutcome {
        match self.process(scan, raw_pose) {
            Ok(outcome) => outcome,
            Err(error) => {
                let state_reached = self.state;
                self.state = MappingState::Failed;
                warn!(
                    "[Mapper] scan {} rejected during {}: {}",
                    scan.timestamp_ns, state_reached, error
                );
                ScanOutcome::Rejected {
                    state_reached,
                    error,
                }
            }
        }
    }

    fn process(&mut self, scan: &Scan, raw_pose: &Pose6DOF) -> Result<ScanOutcome> {
        self.state = if self.map.is_empty() {
            MappingState::Bootstrap
        } else {
            MappingState::LocalizeAndAlign
        };

        let scan_in_map = transform_cloud(&scan.points, raw_pose)?;

        if self.map.is_empty() {
            let points_added = self.map.grow(&scan_in_map);
            info!(
                "[Bootstrap] scan {}: seeded map with {} of {} points",
                scan.timestamp_ns,
                points_added,
                scan.points.len()
            );
            return Ok(ScanOutcome::Bootstrapped { points_added });
        }

        let neighbors_in_map = self.map.approx_nearest_neighbors(&scan_in_map)?;
        let neighbors = transform_cloud(&neighbors_in_map, &raw_pose.inverse())?;
        if self.observer.wants_cloud(CloudTopic::Neighbors) {
            let msg = self.stamped(&self.config.robot_frame, scan.timestamp_ns, neighbors.clone());
            self.observer.publish_cloud(CloudTopic::Neighbors, msg);
        }

        let registration = self
            .registration
            .align(&scan.points, &neighbors, scan.timestamp_ns)?;

        self.state = MappingState::GrowMap;
        let refined = raw_pose + &registration.transform;
        let registered = transform_cloud(&scan.points, &refined)?;

        let points_added = self.map.grow(&registered);
        self.trajectory.push(refined.clone());
        debug!(
            "[GrowMap] scan {}: iters={} fitness={:.5} pairs={} added={} map={}",
            scan.timestamp_ns,
            registration.iterations,
            registration.fitness,
            registration.correspondences,
            points_added,
            self.map.len()
        );

        if self.observer.wants_cloud(CloudTopic::Registered) {
            let msg = self.stamped(&self.config.map_frame, scan.timestamp_ns, registered);
            self.observer.publish_cloud(CloudTopic::Registered, msg);
        }
        self.publish_map(scan.timestamp_ns);
        if self.observer.wants_path() {
            let msg = self.trajectory.to_message(&self.config.map_frame);
            self.observer.publish_path(msg);
        }

        Ok(ScanOutcome::Refined {
            pose: refined,
            correction: registration.transform,
            points_added,
            iterations: registration.iterations,
            fitness: registration.fitness,
        })
    }

    fn publish_map(&mut self, timestamp_ns: u64) {
        if self.observer.wants_cloud(CloudTopic::Map) {
            let msg = self.stamped(&self.config.map_frame, timestamp_ns, self.map.cloud().clone());
            self.observer.publish_cloud(CloudTopic::Map, msg);
        }
    }

    fn stamped(&self, frame_id: &str, timestamp_ns: u64, cloud: PointCloud) -> StampedCloud {
        StampedCloud {
            frame_id: frame_id.to_string(),
            timestamp_ns,
            cloud,
        }
    }
}
