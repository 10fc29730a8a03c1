use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

/// Unordered 3D point set with optional per-point unit normals.
///
/// Order carries no meaning except that indices returned by estimators
/// (e.g. inlier sets) reference positions in `points`.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub points: Vec<Point3<f64>>,
    pub normals: Option<Vec<Vector3<f64>>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3<f64>>) -> Self {
        Self {
            points,
            normals: None,
        }
    }

    pub fn with_normals(mut self, normals: Vec<Vector3<f64>>) -> crate::Result<Self> {
        if normals.len() == self.points.len() {
            self.normals = Some(normals);
            Ok(self)
        } else {
            Err(crate::Error::InvalidInput(format!(
                "Normal count {} does not match point count {}",
                normals.len(),
                self.points.len()
            )))
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Axis-aligned bounds, or `None` for an empty cloud.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.points.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }
        Some((min, max))
    }
}

/// Downsample a point cloud with a voxel grid.
/// Returns a new cloud with one point per voxel (the centroid).
pub fn voxel_down_sample(pc: &PointCloud, voxel_size: f64) -> PointCloud {
    if voxel_size <= 0.0 || pc.is_empty() {
        return pc.clone();
    }

    let n = pc.len();
    let mut indices: Vec<(i64, i64, i64, usize)> = Vec::with_capacity(n);

    for (i, p) in pc.points.iter().enumerate() {
        let hx = (p.x / voxel_size).floor() as i64;
        let hy = (p.y / voxel_size).floor() as i64;
        let hz = (p.z / voxel_size).floor() as i64;
        indices.push((hx, hy, hz, i));
    }

    // Sort by voxel key so each voxel's members are contiguous
    if n > 10_000 {
        indices.par_sort_unstable_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
    } else {
        indices.sort_unstable_by(|a, b| {
            a.0.cmp(&b.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
    }

    let has_normals = pc.normals.is_some();
    let mut new_points = Vec::new();
    let mut new_normals = if has_normals { Some(Vec::new()) } else { None };

    let mut current_voxel = (indices[0].0, indices[0].1, indices[0].2);
    let mut sum_p = Vector3::zeros();
    let mut sum_n = Vector3::zeros();
    let mut count = 0usize;

    let flush = |sum_p: &Vector3<f64>,
                 sum_n: &Vector3<f64>,
                 count: usize,
                 new_points: &mut Vec<Point3<f64>>,
                 new_normals: &mut Option<Vec<Vector3<f64>>>| {
        let factor = 1.0 / count as f64;
        new_points.push(Point3::from(sum_p * factor));
        if let Some(nn) = new_normals {
            let mut n = sum_n * factor;
            if n.norm_squared() > 1e-12 {
                n.normalize_mut();
            }
            nn.push(n);
        }
    };

    for &(hx, hy, hz, idx) in &indices {
        if (hx, hy, hz) != current_voxel {
            flush(&sum_p, &sum_n, count, &mut new_points, &mut new_normals);
            current_voxel = (hx, hy, hz);
            sum_p = Vector3::zeros();
            sum_n = Vector3::zeros();
            count = 0;
        }

        sum_p += pc.points[idx].coords;
        if let Some(normals) = &pc.normals {
            sum_n += normals[idx];
        }
        count += 1;
    }

    if count > 0 {
        flush(&sum_p, &sum_n, count, &mut new_points, &mut new_normals);
    }

    PointCloud {
        points: new_points,
        normals: new_normals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voxel_down_sample() {
        let mut points = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                points.push(Point3::new(i as f64 * 0.01, j as f64 * 0.01, 0.0));
            }
        }
        let pc = PointCloud::new(points);

        // 0.00..0.09 range; a 0.2 voxel covers everything.
        let down = voxel_down_sample(&pc, 0.2);
        assert_eq!(down.len(), 1);

        // 0.00..0.04 -> bin 0, 0.05..0.09 -> bin 1, in x and y.
        let down = voxel_down_sample(&pc, 0.05);
        assert_eq!(down.len(), 4);
    }

    #[test]
    fn test_voxel_down_sample_averages_normals() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.01, 0.0, 0.0),
        ];
        let normals = vec![Vector3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 0.0, 1.0)];
        let pc = PointCloud::new(points).with_normals(normals).unwrap();

        let down = voxel_down_sample(&pc, 1.0);
        assert_eq!(down.len(), 1);
        let ns = down.normals.as_ref().unwrap();
        assert!((ns[0].z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds() {
        let pc = PointCloud::new(vec![
            Point3::new(-1.0, 2.0, 0.5),
            Point3::new(3.0, -2.0, 0.0),
        ]);
        let (min, max) = pc.bounds().unwrap();
        assert_eq!(min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3::new(3.0, 2.0, 0.5));

        assert!(PointCloud::default().bounds().is_none());
    }
}
