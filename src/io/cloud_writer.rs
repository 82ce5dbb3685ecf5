//! CSV output for map clouds and trajectories.
//!
//! Files use the same layout [`super::scan_sequence`] reads, so a written
//! trajectory can be replayed as `poses.csv`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csv::WriterBuilder;

use crate::cloud::PointCloud;
use crate::geometry::Pose6DOF;

/// Write one `x,y,z` row per point.
pub fn write_cloud(path: &Path, cloud: &PointCloud) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "# x,y,z")?;

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(out);
    for p in cloud.iter() {
        wtr.serialize((p.x, p.y, p.z))?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write one `timestamp_ns,tx,ty,tz,qx,qy,qz,qw` row per pose.
pub fn write_trajectory(path: &Path, poses: &[Pose6DOF]) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "# timestamp_ns,tx,ty,tz,qx,qy,qz,qw")?;

    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(out);
    for pose in poses {
        let t = pose.translation();
        let q = pose.rotation();
        wtr.serialize((pose.timestamp_ns, t.x, t.y, t.z, q.i, q.j, q.k, q.w))?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SE3;
    use crate::io::scan_sequence::{load_cloud, load_poses};
    use approx::assert_relative_eq;
    use nalgebra::{Point3, UnitQuaternion, Vector3};

    #[test]
    fn test_written_files_load_back() {
        let dir = tempfile::tempdir().unwrap();

        let cloud: PointCloud = vec![Point3::new(1.5, -2.0, 0.25), Point3::new(0.0, 0.0, 9.0)].into();
        let cloud_path = dir.path().join("map.csv");
        write_cloud(&cloud_path, &cloud).unwrap();
        assert_eq!(load_cloud(&cloud_path).unwrap(), cloud);

        let pose = Pose6DOF::new(
            SE3::new(
                UnitQuaternion::from_euler_angles(0.1, 0.2, -0.3),
                Vector3::new(1.0, 2.0, 3.0),
            ),
            42,
        );
        let path_file = dir.path().join("refined_path.csv");
        write_trajectory(&path_file, std::slice::from_ref(&pose)).unwrap();

        let loaded = load_poses(&path_file).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].timestamp_ns, 42);
        assert_relative_eq!(loaded[0].to_matrix(), pose.to_matrix(), epsilon = 1e-12);
    }

    #[test]
    fn test_unwritable_path() {
        let err = write_cloud(Path::new("/nonexistent/dir/map.csv"), &PointCloud::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to create"));
    }
}
