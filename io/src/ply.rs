//! PLY (Polygon File Format) I/O
//!
//! ASCII PLY reading and writing for point clouds with optional
//! per-point normals.

use crate::{Error, Result};
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tireprof_core::PointCloud;

/// Read a PLY point cloud from a reader
pub fn read_ply<R: BufRead>(reader: R) -> Result<PointCloud> {
    let mut lines = reader.lines();

    // Parse header
    let mut in_header = true;
    let mut format = String::new();
    let mut has_normals = false;
    let mut num_vertices = 0usize;

    while in_header {
        let line = lines
            .next()
            .ok_or_else(|| Error::Parse("Unexpected EOF in header".to_string()))??;
        let line = line.trim();

        if line.starts_with("format ") {
            format = line
                .split_whitespace()
                .nth(1)
                .ok_or_else(|| Error::Parse("Invalid format line".to_string()))?
                .to_string();
        } else if line.starts_with("element vertex ") {
            num_vertices = line
                .split_whitespace()
                .nth(2)
                .ok_or_else(|| Error::Parse("Invalid vertex count".to_string()))?
                .parse()
                .map_err(|_| Error::Parse("Invalid vertex count number".to_string()))?;
        } else if line.contains("property") && line.contains("nx") {
            has_normals = true;
        } else if line == "end_header" {
            in_header = false;
        }
    }

    if format != "ascii" {
        return Err(Error::UnsupportedFormat(format!(
            "PLY format '{}' not supported, only ASCII",
            format
        )));
    }

    let mut points = Vec::with_capacity(num_vertices);
    let mut normals = if has_normals {
        Some(Vec::with_capacity(num_vertices))
    } else {
        None
    };

    for _ in 0..num_vertices {
        let line = lines
            .next()
            .ok_or_else(|| Error::Parse("Unexpected EOF in data".to_string()))??;

        let values: Vec<f64> = line
            .split_whitespace()
            .map(|s| {
                s.parse()
                    .map_err(|_| Error::Parse(format!("Invalid number: {}", s)))
            })
            .collect::<Result<Vec<_>>>()?;

        if values.len() < 3 {
            return Err(Error::InvalidData(
                "Not enough values for vertex".to_string(),
            ));
        }
        points.push(Point3::new(values[0], values[1], values[2]));

        if let Some(normal_list) = &mut normals {
            if values.len() < 6 {
                return Err(Error::InvalidData(
                    "Vertex is missing declared normal".to_string(),
                ));
            }
            normal_list.push(Vector3::new(values[3], values[4], values[5]));
        }
    }

    let cloud = PointCloud::new(points);
    match normals {
        Some(normal_list) => cloud
            .with_normals(normal_list)
            .map_err(|e| Error::InvalidData(e.to_string())),
        None => Ok(cloud),
    }
}

/// Write a point cloud as ASCII PLY
pub fn write_ply<W: Write>(writer: &mut W, cloud: &PointCloud) -> Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", cloud.len())?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    if cloud.normals.is_some() {
        writeln!(writer, "property double nx")?;
        writeln!(writer, "property double ny")?;
        writeln!(writer, "property double nz")?;
    }
    writeln!(writer, "end_header")?;

    for (i, p) in cloud.points.iter().enumerate() {
        write!(writer, "{} {} {}", p.x, p.y, p.z)?;
        if let Some(normals) = &cloud.normals {
            let n = normals[i];
            write!(writer, " {} {} {}", n.x, n.y, n.z)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Load a PLY point cloud from disk
pub fn load_ply(path: &Path) -> Result<PointCloud> {
    let file = File::open(path)?;
    read_ply(BufReader::new(file))
}

/// Save a point cloud to disk as ASCII PLY
pub fn save_ply(path: &Path, cloud: &PointCloud) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ply(&mut writer, cloud)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ply_round_trip_with_normals() {
        let cloud = PointCloud::new(vec![
            Point3::new(0.0, 0.5, -1.25),
            Point3::new(1.0, 1.0, 1.0),
        ])
        .with_normals(vec![Vector3::z(), Vector3::y()])
        .unwrap();

        let mut buffer = Vec::new();
        write_ply(&mut buffer, &cloud).unwrap();

        let loaded = read_ply(buffer.as_slice()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.points[0], cloud.points[0]);
        let normals = loaded.normals.as_ref().unwrap();
        assert_eq!(normals[1], Vector3::y());
    }

    #[test]
    fn test_ply_rejects_binary() {
        let data = b"ply\nformat binary_little_endian 1.0\nelement vertex 0\nend_header\n";
        let result = read_ply(&data[..]);
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_ply_rejects_short_vertex_line() {
        let data = b"ply\nformat ascii 1.0\nelement vertex 1\nend_header\n1.0 2.0\n";
        let result = read_ply(&data[..]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
