//! Recorded scan sequences on disk.
//!
//! Layout:
//!
//! ```text
//! <root>/poses.csv                 timestamp_ns,tx,ty,tz,qx,qy,qz,qw   (raw poses)
//! <root>/scans/<timestamp_ns>.csv  x,y,z                               (robot frame)
//! ```
//!
//! Lines starting with `#` are comments.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, Trim};
use nalgebra::{Point3, Vector3};
use tracing::warn;

use crate::cloud::{PointCloud, Scan};
use crate::geometry::{Pose6DOF, SE3};

/// A scan/pose sequence, loaded lazily scan by scan.
#[derive(Debug)]
pub struct ScanSequence {
    root: PathBuf,
    poses: Vec<Pose6DOF>,
}

impl ScanSequence {
    /// Read `poses.csv` under `root`; scans are read on demand.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.join("scans").is_dir() {
            bail!("{} has no scans/ directory", root.display());
        }
        let mut poses = load_poses(&root.join("poses.csv"))?;
        poses.sort_by_key(|p| p.timestamp_ns);
        Ok(Self { root, poses })
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Raw poses in timestamp order.
    pub fn poses(&self) -> &[Pose6DOF] {
        &self.poses
    }

    pub fn scan_path(&self, timestamp_ns: u64) -> PathBuf {
        self.root.join("scans").join(format!("{}.csv", timestamp_ns))
    }

    /// Scan `idx` together with its raw pose.
    pub fn get(&self, idx: usize) -> Result<(Scan, Pose6DOF)> {
        let pose = self
            .poses
            .get(idx)
            .with_context(|| format!("No pose at index {}", idx))?;
        let points = load_cloud(&self.scan_path(pose.timestamp_ns))?;
        Ok((Scan::new(pose.timestamp_ns, points), pose.clone()))
    }

    /// All scans in timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = Result<(Scan, Pose6DOF)>> + '_ {
        (0..self.len()).map(move |idx| self.get(idx))
    }
}

/// Read `timestamp_ns,tx,ty,tz,qx,qy,qz,qw` rows.
pub fn load_poses(csv_path: &Path) -> Result<Vec<Pose6DOF>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))?;

    let mut poses = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("Bad record in {}", csv_path.display()))?;
        if rec.len() < 8 {
            warn!(
                "{}: skipping row {} with {} fields",
                csv_path.display(),
                line + 1,
                rec.len()
            );
            continue;
        }
        let ts: u64 = rec[0].parse()?;
        let translation = Vector3::new(rec[1].parse()?, rec[2].parse()?, rec[3].parse()?);
        let (qx, qy, qz, qw): (f64, f64, f64, f64) =
            (rec[4].parse()?, rec[5].parse()?, rec[6].parse()?, rec[7].parse()?);

        let pose = Pose6DOF::new(SE3::from_quaternion(qw, qx, qy, qz, translation), ts);
        if !pose.is_finite() {
            bail!("{}: non-finite pose at timestamp {}", csv_path.display(), ts);
        }
        poses.push(pose);
    }
    Ok(poses)
}

/// Read `x,y,z` rows into a cloud.
pub fn load_cloud(csv_path: &Path) -> Result<PointCloud> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_path(csv_path)
        .with_context(|| format!("Failed to open {}", csv_path.display()))?;

    let mut cloud = PointCloud::new();
    for rec in rdr.records() {
        let rec = rec.with_context(|| format!("Bad record in {}", csv_path.display()))?;
        if rec.len() < 3 {
            continue;
        }
        cloud.push(Point3::new(rec[0].parse()?, rec[1].parse()?, rec[2].parse()?));
    }
    Ok(cloud)
}
