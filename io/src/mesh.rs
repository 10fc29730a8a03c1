//! Triangle meshes and surface sampling.
//!
//! OBJ reading (fan-triangulating n-gon faces) plus uniform area-weighted
//! surface sampling into a point cloud with face normals attached.

use crate::{Error, Result};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tireprof_core::PointCloud;

/// Triangle mesh with vertices and face indices
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<[usize; 3]>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertices_and_faces(vertices: Vec<Point3<f64>>, faces: Vec<[usize; 3]>) -> Self {
        Self { vertices, faces }
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Calculate surface area
    pub fn surface_area(&self) -> f64 {
        let mut area = 0.0;
        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];
            area += (v1 - v0).cross(&(v2 - v0)).norm() * 0.5;
        }
        area
    }
}

/// Read a triangle mesh from OBJ (fan-triangulates n-gon faces,
/// handles `v/vt/vn` face syntax).
pub fn read_obj<R: BufRead>(reader: R) -> Result<TriangleMesh> {
    let mut vertices = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with("v ") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 4 {
                let x: f64 = parts[1]
                    .parse()
                    .map_err(|_| Error::Parse(format!("Invalid x coordinate: {}", parts[1])))?;
                let y: f64 = parts[2]
                    .parse()
                    .map_err(|_| Error::Parse(format!("Invalid y coordinate: {}", parts[2])))?;
                let z: f64 = parts[3]
                    .parse()
                    .map_err(|_| Error::Parse(format!("Invalid z coordinate: {}", parts[3])))?;
                vertices.push(Point3::new(x, y, z));
            }
        } else if line.starts_with("f ") {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 4 {
                let face: Vec<usize> = parts[1..]
                    .iter()
                    .map(|p| {
                        let idx_str = p.split('/').next().unwrap_or(p);
                        idx_str
                            .parse::<usize>()
                            .map_err(|_| Error::Parse(format!("Invalid face index: {}", p)))
                            .and_then(|idx| {
                                if idx == 0 {
                                    Err(Error::Parse("OBJ face indices are 1-based".into()))
                                } else {
                                    Ok(idx - 1)
                                }
                            })
                    })
                    .collect::<Result<Vec<_>>>()?;

                // Fan triangulation for n-gons
                for i in 1..(face.len() - 1) {
                    faces.push([face[0], face[i], face[i + 1]]);
                }
            }
        }
    }

    for face in &faces {
        for &idx in face {
            if idx >= vertices.len() {
                return Err(Error::InvalidData(format!(
                    "Face references vertex {} of {}",
                    idx,
                    vertices.len()
                )));
            }
        }
    }

    Ok(TriangleMesh::with_vertices_and_faces(vertices, faces))
}

/// Load an OBJ triangle mesh from disk
pub fn load_obj(path: &Path) -> Result<TriangleMesh> {
    let file = File::open(path)?;
    read_obj(BufReader::new(file))
}

/// Sample `count` points uniformly over the mesh surface.
///
/// Faces are chosen by cumulative area, positions by uniform barycentric
/// coordinates. Face normals are attached so downstream fitting can skip
/// neighborhood normal estimation. `None` seeds the RNG from entropy.
pub fn sample_surface(mesh: &TriangleMesh, count: usize, seed: Option<u64>) -> Result<PointCloud> {
    if mesh.faces.is_empty() {
        return Err(Error::InvalidData("mesh has no faces".into()));
    }

    // Cumulative areas over non-degenerate faces
    let mut face_indices = Vec::new();
    let mut cumulative = Vec::new();
    let mut total = 0.0;
    for (i, face) in mesh.faces.iter().enumerate() {
        let v0 = mesh.vertices[face[0]];
        let v1 = mesh.vertices[face[1]];
        let v2 = mesh.vertices[face[2]];
        let area = (v1 - v0).cross(&(v2 - v0)).norm() * 0.5;
        if area > 0.0 {
            total += area;
            face_indices.push(i);
            cumulative.push(total);
        }
    }
    if total <= 0.0 {
        return Err(Error::InvalidData("mesh has zero surface area".into()));
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut points = Vec::with_capacity(count);
    let mut normals = Vec::with_capacity(count);
    for _ in 0..count {
        let target = rng.gen::<f64>() * total;
        let slot = cumulative
            .partition_point(|&a| a < target)
            .min(face_indices.len() - 1);
        let face = mesh.faces[face_indices[slot]];

        let v0 = mesh.vertices[face[0]];
        let v1 = mesh.vertices[face[1]];
        let v2 = mesh.vertices[face[2]];

        let mut u = rng.gen::<f64>();
        let mut v = rng.gen::<f64>();
        if u + v > 1.0 {
            u = 1.0 - u;
            v = 1.0 - v;
        }
        points.push(v0 + (v1 - v0) * u + (v2 - v0) * v);
        normals.push((v1 - v0).cross(&(v2 - v0)).normalize());
    }

    PointCloud::new(points)
        .with_normals(normals)
        .map_err(|e| Error::InvalidData(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_mesh() -> TriangleMesh {
        TriangleMesh::with_vertices_and_faces(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_read_obj_quad_is_triangulated() {
        let data = b"# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1/1/1 2/2/2 3/3/3 4/4/4\n";
        let mesh = read_obj(&data[..]).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_read_obj_rejects_bad_index() {
        let data = b"v 0 0 0\nv 1 0 0\nf 1 2 9\n";
        assert!(matches!(read_obj(&data[..]), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_sample_surface_stays_on_surface() {
        let mesh = unit_square_mesh();
        let cloud = sample_surface(&mesh, 500, Some(17)).unwrap();
        assert_eq!(cloud.len(), 500);
        for p in &cloud.points {
            assert!(p.z.abs() < 1e-12);
            assert!((-1e-12..=1.0 + 1e-12).contains(&p.x));
            assert!((-1e-12..=1.0 + 1e-12).contains(&p.y));
        }
        let normals = cloud.normals.as_ref().unwrap();
        for n in normals {
            assert!(n.z.abs() > 1.0 - 1e-12);
        }
    }

    #[test]
    fn test_sample_surface_is_reproducible() {
        let mesh = unit_square_mesh();
        let a = sample_surface(&mesh, 50, Some(9)).unwrap();
        let b = sample_surface(&mesh, 50, Some(9)).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn test_sample_surface_requires_faces() {
        let mesh = TriangleMesh::new();
        assert!(matches!(
            sample_surface(&mesh, 10, Some(0)),
            Err(Error::InvalidData(_))
        ));
    }
}
