//! Dataset input and result output.

pub mod cloud_writer;
pub mod scan_sequence;

pub use cloud_writer::{write_cloud, write_trajectory};
pub use scan_sequence::ScanSequence;
