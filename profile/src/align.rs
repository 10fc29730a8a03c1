//! Axis alignment.
//!
//! Builds the rigid transform that maps the estimated cylinder axis to
//! +X and a designated reference point ("12 o'clock") onto +Z. The
//! convention is translate-then-rotate: `aligned = R · (p + t)`, with
//! the rotation computed in the translated frame.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::{Error, Result};

/// Skew-symmetric cross-product matrix of `v`.
pub fn skew_symmetric(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v[2], v[1], v[2], 0.0, -v[0], -v[1], v[0], 0.0)
}

/// Rotation mapping the direction of `from` onto the direction of `to`
/// via Rodrigues' formula.
///
/// Parallel inputs yield the identity; anti-parallel inputs yield a
/// 180° rotation about a deterministic axis orthogonal to `from`.
/// Zero-norm inputs are a degenerate-geometry error.
pub fn rotation_from_vectors(from: &Vector3<f64>, to: &Vector3<f64>) -> Result<Matrix3<f64>> {
    let from_norm = from.norm();
    let to_norm = to.norm();
    if from_norm < 1e-12 || to_norm < 1e-12 {
        return Err(Error::DegenerateGeometry(
            "cannot rotate a zero-length direction vector".into(),
        ));
    }
    let a = from / from_norm;
    let b = to / to_norm;

    let v = a.cross(&b);
    let c = a.dot(&b);
    let s_squared = v.norm_squared();

    if s_squared < 1e-18 {
        if c > 0.0 {
            return Ok(Matrix3::identity());
        }
        // Anti-parallel: 180° about any axis orthogonal to `a`,
        // R = 2kkᵀ − I
        let k = orthogonal_unit(&a);
        return Ok(2.0 * k * k.transpose() - Matrix3::identity());
    }

    let kmat = skew_symmetric(&v);
    Ok(Matrix3::identity() + kmat + kmat * kmat * ((1.0 - c) / s_squared))
}

/// Unit vector orthogonal to `a`, chosen deterministically.
fn orthogonal_unit(a: &Vector3<f64>) -> Vector3<f64> {
    let ax = a.x.abs();
    let ay = a.y.abs();
    let az = a.z.abs();
    let pick = if ax <= ay && ax <= az {
        Vector3::x()
    } else if ay <= az {
        Vector3::y()
    } else {
        Vector3::z()
    };
    a.cross(&pick).normalize()
}

/// Rotation by `angle` about the +X axis.
pub fn rotation_about_x(angle: f64) -> Matrix3<f64> {
    let c = angle.cos();
    let s = angle.sin();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c)
}

/// How the in-plane reference point is chosen after the axis rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferenceSelector {
    /// The point with the largest Z coordinate (the cylinder's top).
    #[default]
    TopMost,
    /// A caller-chosen index into the point set.
    Index(usize),
}

/// Align the cylinder axis to +X and the reference point to +Z.
///
/// Returns the aligned points together with the composed rotation and
/// the translation, so the same transform can be re-applied to other
/// point sets with [`apply_transform`].
pub fn align_points(
    points: &[Point3<f64>],
    axis_point: &Point3<f64>,
    axis_direction: &Vector3<f64>,
    selector: ReferenceSelector,
) -> Result<(Vec<Point3<f64>>, Matrix3<f64>, Vector3<f64>)> {
    if points.is_empty() {
        return Err(Error::DegenerateGeometry(
            "cannot align an empty point set".into(),
        ));
    }

    let translation = -axis_point.coords;
    let rot_axis = rotation_from_vectors(axis_direction, &Vector3::x())?;

    let mut aligned: Vec<Point3<f64>> = points
        .iter()
        .map(|p| Point3::from(rot_axis * (p.coords + translation)))
        .collect();

    let reference = match selector {
        ReferenceSelector::TopMost => {
            let mut top = 0;
            for (i, p) in aligned.iter().enumerate() {
                if p.z > aligned[top].z {
                    top = i;
                }
            }
            top
        }
        ReferenceSelector::Index(i) => {
            if i >= aligned.len() {
                return Err(Error::DegenerateGeometry(format!(
                    "reference index {} out of range for {} points",
                    i,
                    aligned.len()
                )));
            }
            i
        }
    };

    let r = aligned[reference];
    let angle = r.y.atan2(r.z);
    let rot_top = rotation_about_x(angle);
    for p in aligned.iter_mut() {
        *p = Point3::from(rot_top * p.coords);
    }

    let rotation = rot_top * rot_axis;
    Ok((aligned, rotation, translation))
}

/// Apply a rigid transform in the translate-then-rotate convention:
/// `rotation · (p + translation)`.
pub fn apply_transform(
    points: &[Point3<f64>],
    rotation: &Matrix3<f64>,
    translation: &Vector3<f64>,
) -> Vec<Point3<f64>> {
    points
        .iter()
        .map(|p| Point3::from(rotation * (p.coords + translation)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_proper_rotation(r: &Matrix3<f64>) {
        let should_be_identity = r * r.transpose();
        assert!((should_be_identity - Matrix3::identity()).norm() < 1e-12);
        assert!((r.determinant() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_parallel_is_identity() {
        let r = rotation_from_vectors(&Vector3::x(), &Vector3::x()).unwrap();
        assert!((r - Matrix3::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_maps_from_onto_to() {
        let from = Vector3::new(0.3, -0.7, 0.2);
        let r = rotation_from_vectors(&from, &Vector3::x()).unwrap();
        assert_proper_rotation(&r);
        let mapped = r * from.normalize();
        assert!((mapped - Vector3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_anti_parallel() {
        let r = rotation_from_vectors(&-Vector3::x(), &Vector3::x()).unwrap();
        assert_proper_rotation(&r);
        let mapped = r * -Vector3::x();
        assert!((mapped - Vector3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_zero_vector_fails() {
        let r = rotation_from_vectors(&Vector3::zeros(), &Vector3::x());
        assert!(matches!(r, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn test_align_maps_axis_to_x_and_reference_to_z() {
        // Tube around a skewed axis
        let axis = Vector3::new(1.0, 0.5, 0.25).normalize();
        let axis_point = Point3::new(2.0, -1.0, 0.5);
        let ortho = axis.cross(&Vector3::z()).normalize();
        let ortho2 = axis.cross(&ortho);

        let mut points = Vec::new();
        for i in 0..32 {
            let theta = i as f64 / 32.0 * std::f64::consts::TAU;
            for j in 0..5 {
                let h = j as f64 * 0.1;
                points.push(axis_point + axis * h + (ortho * theta.cos() + ortho2 * theta.sin()));
            }
        }

        let (aligned, rotation, translation) =
            align_points(&points, &axis_point, &axis, ReferenceSelector::TopMost).unwrap();
        assert_proper_rotation(&rotation);

        // Axis direction lands on +X exactly
        let mapped_axis = rotation * axis;
        assert!((mapped_axis - Vector3::x()).norm() < 1e-12);

        // Every aligned point sits at planar radius 1 around the X axis
        for p in &aligned {
            let r = (p.y * p.y + p.z * p.z).sqrt();
            assert!((r - 1.0).abs() < 1e-12);
        }

        // The topmost point sits on the +Z axis (y = 0)
        let mut top = 0;
        for (i, p) in aligned.iter().enumerate() {
            if p.z > aligned[top].z {
                top = i;
            }
        }
        assert!(aligned[top].y.abs() < 1e-9);
        assert!(aligned[top].z > 0.0);

        // Re-applying the returned transform reproduces the output
        let replayed = apply_transform(&points, &rotation, &translation);
        for (a, b) in aligned.iter().zip(&replayed) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_align_with_explicit_reference_index() {
        let points = vec![
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, -1.0, 0.0),
        ];
        let (aligned, _, _) = align_points(
            &points,
            &Point3::origin(),
            &Vector3::x(),
            ReferenceSelector::Index(0),
        )
        .unwrap();
        // The chosen reference rotates onto +Z
        assert!(aligned[0].y.abs() < 1e-12);
        assert!((aligned[0].z - 1.0).abs() < 1e-12);

        let out_of_range = align_points(
            &points,
            &Point3::origin(),
            &Vector3::x(),
            ReferenceSelector::Index(10),
        );
        assert!(matches!(out_of_range, Err(Error::DegenerateGeometry(_))));
    }

    #[test]
    fn test_align_empty_fails() {
        let result = align_points(
            &[],
            &Point3::origin(),
            &Vector3::x(),
            ReferenceSelector::TopMost,
        );
        assert!(matches!(result, Err(Error::DegenerateGeometry(_))));
    }
}
