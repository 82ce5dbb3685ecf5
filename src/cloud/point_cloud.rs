//! Point cloud containers.

use nalgebra::Point3;

/// Ordered sequence of 3D points.
///
/// Used for scans, neighbor clouds and the map cloud alike. The map cloud is
/// only ever appended to through [`crate::map::PointMap`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point3<f64>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn push(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn get(&self, idx: usize) -> Option<&Point3<f64>> {
        self.points.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point3<f64>> {
        self.points.iter()
    }
}

impl From<Vec<Point3<f64>>> for PointCloud {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point3<f64>> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3<f64>>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3<f64>;
    type IntoIter = std::slice::Iter<'a, Point3<f64>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// A raw sensor scan expressed in the robot frame.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    /// Capture time in nanoseconds.
    pub timestamp_ns: u64,
    pub points: PointCloud,
}

impl Scan {
    pub fn new(timestamp_ns: u64, points: PointCloud) -> Self {
        Self {
            timestamp_ns,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_iterator_preserves_order() {
        let cloud: PointCloud = (0..4).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let xs: Vec<f64> = cloud.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    }
}
