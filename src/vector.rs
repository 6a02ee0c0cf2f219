//! Small 2D/3D vector helpers and the perspective view of the 3D demo.

use nalgebra::{Vector2, Vector3};

/// Below this squared length a vector is treated as having no direction.
pub const DEGENERATE_NORM_SQUARED: f64 = 1.0e-24;

pub fn magnitude2(v: &Vector2<f64>) -> f64 {
    v.norm()
}

pub fn magnitude3(v: &Vector3<f64>) -> f64 {
    v.norm()
}

/// Unit vector along `v`, or zero when `v` has no usable length.
pub fn normalize_or_zero2(v: &Vector2<f64>) -> Vector2<f64> {
    if v.norm_squared() > DEGENERATE_NORM_SQUARED {
        v.normalize()
    } else {
        Vector2::zeros()
    }
}

pub fn normalize_or_zero3(v: &Vector3<f64>) -> Vector3<f64> {
    if v.norm_squared() > DEGENERATE_NORM_SQUARED {
        v.normalize()
    } else {
        Vector3::zeros()
    }
}

/// Counter-clockwise rotation in the plane.
pub fn rotate2(v: &Vector2<f64>, angle: f64) -> Vector2<f64> {
    let (s, c) = angle.sin_cos();
    Vector2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// Point on a circle of `radius` around `center` at `angle` (radians from +x).
pub fn polar2(center: &Vector2<f64>, radius: f64, angle: f64) -> Vector2<f64> {
    center + Vector2::new(radius * angle.cos(), radius * angle.sin())
}

/// Camera tilt for the 3D trajectory view, in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tilt {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Tilt {
    pub fn from_degrees(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: x.to_radians(),
            y: y.to_radians(),
            z: z.to_radians(),
        }
    }
}

/// Rotate about X, then Y, then Z.
///
/// The Z step mixes the already X-rotated `y`, not the Y-rotated one; the
/// trajectory view has always composed its tilts this way.
pub fn rotate_xyz(p: &Vector3<f64>, tilt: &Tilt) -> Vector3<f64> {
    let (sx, cx) = tilt.x.sin_cos();
    let y1 = p.y * cx - p.z * sx;
    let z1 = p.y * sx + p.z * cx;

    let (sy, cy) = tilt.y.sin_cos();
    let x2 = p.x * cy + z1 * sy;
    let z2 = -p.x * sy + z1 * cy;

    let (sz, cz) = tilt.z.sin_cos();
    let x3 = x2 * cz - y1 * sz;
    let y3 = x2 * sz + y1 * cz;

    Vector3::new(x3, y3, z2)
}

/// Perspective-project a world point onto the view plane.
///
/// Returns plane coordinates in world units (y up); the caller applies its own
/// pixel scale and offset. A point at or behind the eye collapses to the
/// origin instead of producing an infinite coordinate.
pub fn project_perspective(p: &Vector3<f64>, tilt: &Tilt, fov: f64) -> Vector2<f64> {
    let r = rotate_xyz(p, tilt);
    let depth = fov + r.z;
    if depth.abs() < 1.0e-12 {
        return Vector2::zeros();
    }
    let factor = fov / depth;
    Vector2::new(r.x * factor, r.y * factor)
}
