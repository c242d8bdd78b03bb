//! Coordinate conversions and geometry utilities.
//!
//! Uses `glam` for vector math, the same as the rest of this crate.

use glam::{DMat3, DVec3};

/// A position expressed in polar coordinates.
///
/// Convention (shared with the rest of the crate):
/// - Azimuth 0deg = front centre (+Y axis)
/// - Azimuth 90deg = left (+X axis)
/// - Azimuth -90deg = right (-X axis)
/// - Elevation 0deg = horizontal plane
/// - Elevation 90deg = directly above (+Z axis)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolarPosition {
    /// Azimuth in degrees.
    pub azimuth: f64,
    /// Elevation in degrees.
    pub elevation: f64,
    /// Distance from the listening position.
    pub distance: f64,
}

impl PolarPosition {
    /// Construct a polar position.
    pub fn new(azimuth: f64, elevation: f64, distance: f64) -> Self {
        Self {
            azimuth,
            elevation,
            distance,
        }
    }

    /// Convert to a Cartesian vector. Magnitude equals `distance`.
    #[inline]
    pub fn to_cartesian(self) -> DVec3 {
        polar_to_cartesian(self.azimuth, self.elevation) * self.distance
    }
}

/// Convert polar coordinates (azimuth, elevation, in degrees) to a Cartesian unit vector.
#[inline]
pub fn polar_to_cartesian(azimuth: f64, elevation: f64) -> DVec3 {
    let (azi_sin, azi_cos) = azimuth.to_radians().sin_cos();
    let (ele_sin, ele_cos) = elevation.to_radians().sin_cos();

    DVec3::new(
        ele_cos * azi_sin, // X: left-right
        ele_cos * azi_cos, // Y: front-back
        ele_sin,           // Z: up-down
    )
}

/// Convert a Cartesian vector to a polar position (distance = vector magnitude).
#[inline]
pub fn cartesian_to_polar(v: DVec3) -> PolarPosition {
    let distance = v.length();
    if distance < 1e-15 {
        return PolarPosition::new(0.0, 0.0, 0.0);
    }

    let normalized = v / distance;
    let elevation = normalized.z.clamp(-1.0, 1.0).asin().to_degrees();
    let azimuth = normalized.x.atan2(normalized.y).to_degrees();

    PolarPosition::new(azimuth, elevation, distance)
}

/// Order the given points cyclically about their centroid, for use building n-gon regions
/// (quads and virtual-ngon rings).
///
/// The points are projected onto the plane that best fits them (the plane through the centroid
/// perpendicular to the least-variance principal axis), then sorted by angle within that plane.
/// For exactly coplanar input (e.g. a merged hull facet) this is just "the" plane; for
/// non-coplanar input (e.g. a ring of speakers around a virtual apex at different elevations)
/// it is the best approximation, which is all the caller needs since only the cyclic order
/// matters, not the precise angle values.
///
/// Returns a permutation `order` of `0..positions.len()` such that `positions[order[i]]` visits
/// the points in cyclic (counter-clockwise in the projection plane) order.
pub fn ngon_vertex_order(positions: &[DVec3]) -> Vec<usize> {
    let n = positions.len();
    assert!(n >= 3, "ngon_vertex_order needs at least 3 points");

    let centroid = positions.iter().fold(DVec3::ZERO, |acc, p| acc + *p) / n as f64;
    let centered: Vec<DVec3> = positions.iter().map(|p| *p - centroid).collect();

    let normal = best_fit_normal(&centered);
    let (u, v) = in_plane_basis(normal);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        let angle_i = centered[i].dot(u).atan2(centered[i].dot(v));
        let angle_j = centered[j].dot(u).atan2(centered[j].dot(v));
        angle_i.total_cmp(&angle_j)
    });
    order
}

/// Find an orthonormal basis `(u, v)` for the plane perpendicular to `normal`.
fn in_plane_basis(normal: DVec3) -> (DVec3, DVec3) {
    // Any vector not parallel to `normal` works as a seed; pick the global axis least aligned
    // with it to avoid a near-degenerate cross product.
    let seed = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
        DVec3::X
    } else if normal.y.abs() <= normal.z.abs() {
        DVec3::Y
    } else {
        DVec3::Z
    };

    let u = (seed - normal * seed.dot(normal)).normalize();
    let v = normal.cross(u).normalize();
    (u, v)
}

/// Find the least-variance eigenvector of the covariance of a centred point set: the normal of
/// the plane that best fits the points in a least-squares sense.
///
/// Falls back to an arbitrary fixed axis if the points are too degenerate (e.g. all coincident)
/// to define a plane; this cannot happen for the hull facets and apex rings this crate builds.
fn best_fit_normal(centered: &[DVec3]) -> DVec3 {
    let mut cov = DMat3::ZERO;
    for p in centered {
        cov += DMat3::from_cols(*p * p.x, *p * p.y, *p * p.z);
    }

    match smallest_eigenvector(cov) {
        Some(n) if n.length_squared() > 1e-20 => n.normalize(),
        _ => DVec3::Z,
    }
}

/// Closed-form eigenvector for the smallest eigenvalue of a symmetric 3x3 matrix, using the
/// standard analytic (trigonometric) solution for the characteristic cubic.
///
/// Returns `None` for a matrix too close to a multiple of the identity to have a well-defined
/// smallest eigenvector (any direction is equally "least-variance" in that case).
fn smallest_eigenvector(m: DMat3) -> Option<DVec3> {
    let a = m.x_axis.x;
    let b = m.y_axis.y;
    let c = m.z_axis.z;
    let d = m.y_axis.x; // off-diagonal entries (m is symmetric by construction)
    let e = m.z_axis.x;
    let f = m.z_axis.y;

    let p1 = d * d + e * e + f * f;
    if p1 < 1e-24 {
        // Already diagonal: eigenvalues are a, b, c with the standard basis as eigenvectors.
        let (min_val, min_vec) = [(a, DVec3::X), (b, DVec3::Y), (c, DVec3::Z)]
            .into_iter()
            .fold((f64::INFINITY, DVec3::Z), |acc, cur| {
                if cur.0 < acc.0 {
                    cur
                } else {
                    acc
                }
            });
        let _ = min_val;
        return Some(min_vec);
    }

    let q = (a + b + c) / 3.0;
    let p2 = (a - q).powi(2) + (b - q).powi(2) + (c - q).powi(2) + 2.0 * p1;
    let p = (p2 / 6.0).sqrt();
    if p < 1e-15 {
        return None;
    }

    let b_mat = (m - DMat3::from_diagonal(glam::DVec3::splat(q))) * (1.0 / p);
    let r = (b_mat.determinant() / 2.0).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;

    // Eigenvalues in descending order: eig1 >= eig2 >= eig3.
    let eig1 = q + 2.0 * p * phi.cos();
    let eig3 = q + 2.0 * p * (phi + 2.0 * std::f64::consts::PI / 3.0).cos();
    let eig2 = 3.0 * q - eig1 - eig3;
    let _ = eig2;

    // We want the smallest eigenvalue's eigenvector: solve (M - eig3 I) x = 0 via the cross
    // product of two (independent) rows of the shifted matrix.
    let shifted = m - DMat3::from_diagonal(glam::DVec3::splat(eig3));
    let row0 = shifted.row(0);
    let row1 = shifted.row(1);
    let row2 = shifted.row(2);

    let candidates = [row0.cross(row1), row0.cross(row2), row1.cross(row2)];
    candidates
        .into_iter()
        .max_by(|a, b| a.length_squared().total_cmp(&b.length_squared()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polar_to_cartesian_front() {
        let v = polar_to_cartesian(0.0, 0.0);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(v.z, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_polar_to_cartesian_left() {
        let v = polar_to_cartesian(90.0, 0.0);
        assert_relative_eq!(v.x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_polar_to_cartesian_up() {
        let v = polar_to_cartesian(0.0, 90.0);
        assert_relative_eq!(v.z, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_cartesian_to_polar_roundtrip() {
        for (azi, ele) in [
            (0.0, 0.0),
            (45.0, 0.0),
            (-45.0, 0.0),
            (90.0, 0.0),
            (0.0, 45.0),
            (45.0, 30.0),
        ] {
            let cart = polar_to_cartesian(azi, ele);
            let polar = cartesian_to_polar(cart);
            assert_relative_eq!(polar.azimuth, azi, epsilon = 1e-9);
            assert_relative_eq!(polar.elevation, ele, epsilon = 1e-9);
            assert_relative_eq!(polar.distance, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ngon_vertex_order_square() {
        // A unit square in the XY-like plane (here Y is "front", so use X/Z for a clean test).
        let positions = vec![
            DVec3::new(1.0, 0.0, 1.0),
            DVec3::new(-1.0, 0.0, 1.0),
            DVec3::new(-1.0, 0.0, -1.0),
            DVec3::new(1.0, 0.0, -1.0),
        ];
        let order = ngon_vertex_order(&positions);
        assert_eq!(order.len(), 4);

        // The order should trace the square's boundary, not jump across the diagonal: adjacent
        // points in `order` must be adjacent corners of the square (distance 2), never the
        // diagonal (distance 2*sqrt(2)).
        for i in 0..4 {
            let a = positions[order[i]];
            let b = positions[order[(i + 1) % 4]];
            let dist = (a - b).length();
            assert_relative_eq!(dist, 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ngon_vertex_order_ring_around_apex() {
        // A ring of points at varying elevation (not exactly coplanar), as produced by a
        // virtual-ngon adjacency around a pole. Ordering should still trace a simple, non
        // self-intersecting cycle.
        let n = 6;
        let positions: Vec<DVec3> = (0..n)
            .map(|i| {
                let az = (i as f64) * 360.0 / n as f64;
                let el = 60.0 + 5.0 * (i as f64 % 2.0);
                polar_to_cartesian(az, el)
            })
            .collect();

        let order = ngon_vertex_order(&positions);
        let mut seen: Vec<usize> = order.clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }
}
