use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_lidar_mapper::config::MapperConfig;
use rust_lidar_mapper::io::{ScanSequence, write_cloud, write_trajectory};
use rust_lidar_mapper::mapping::{OctreeMapper, ScanOutcome};

const USAGE: &str = "usage: rust-lidar-mapper <dataset_dir> [config.yaml] [output_dir]";

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let dataset_path = args.first().context(USAGE)?;
    let config = match args.get(1) {
        Some(path) => MapperConfig::load(Path::new(path))?,
        None => MapperConfig::default(),
    };
    let output_dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    // RUST_LOG wins over the configured verbosity.
    let filter = EnvFilter::builder()
        .with_default_directive(config.log_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Loading scan sequence from {}", dataset_path);
    let sequence = ScanSequence::open(dataset_path)?;
    info!("Loaded {} poses", sequence.len());

    let mut mapper = OctreeMapper::new(config)?;
    let mut refined = 0usize;
    let mut rejected = 0usize;

    for (i, entry) in sequence.iter().enumerate() {
        let (scan, raw_pose) = entry?;
        match mapper.refine_transform_and_grow_map(&scan, &raw_pose) {
            ScanOutcome::Refined { pose, correction, .. } => {
                refined += 1;
                info!(
                    "Scan {} refined: {} (correction {:.3} m, {:.4} rad)",
                    scan.timestamp_ns,
                    pose,
                    correction.translation().norm(),
                    correction.transform.angle()
                );
            }
            ScanOutcome::Bootstrapped { points_added } => {
                info!("Scan {} bootstrapped the map with {} points", scan.timestamp_ns, points_added);
            }
            ScanOutcome::Rejected { .. } => rejected += 1,
        }

        if i % 100 == 0 {
            info!(
                "Scan {}/{}: {} map points, {} refined, {} rejected",
                i + 1,
                sequence.len(),
                mapper.map().len(),
                refined,
                rejected
            );
        }
    }

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    write_cloud(&output_dir.join("map.csv"), mapper.map().cloud())?;
    write_trajectory(&output_dir.join("refined_path.csv"), mapper.trajectory().poses())?;

    info!(
        "Done! {} scans: {} refined, {} rejected, {} map points written to {}",
        sequence.len(),
        refined,
        rejected,
        mapper.map().len(),
        output_dir.display()
    );
    Ok(())
}
