//! Convex hull facet computation.
//!
//! Computes the convex hull of a small 3-D point set by exhaustive supporting-plane
//! enumeration: for every non-collinear triple of points, check whether the plane through them
//! has every other point on one side (within a tolerance). If so, every point lying on that
//! plane (not just the original triple) is a vertex of the resulting facet. This sidesteps the
//! usual "triangulate, then merge coplanar triangles" two-step (see `point_source.py`'s
//! `_convex_hull_facets`) because the supporting-plane test already finds every coplanar vertex
//! in one pass -- practical because loudspeaker layouts have at most a few dozen vertices.

use crate::error::{PannerError, Result};
use glam::DVec3;

/// Coplanar-facet merge tolerance, in the same L2-of-plane-equation sense as the distilled spec.
pub const COPLANAR_TOLERANCE: f64 = 1e-5;

/// Tolerance for classifying a point as lying on a candidate supporting plane.
const ON_PLANE_TOLERANCE: f64 = 1e-7;

/// A facet of the convex hull: the indices (into the input point slice) of the vertices lying
/// on a common supporting plane.
#[derive(Clone, Debug)]
pub struct Facet {
    pub vertices: Vec<usize>,
}

/// Compute the convex hull of `positions`, returning one [`Facet`] per maximal supporting plane.
///
/// Points not on the hull boundary (interior points) never appear in any facet. Returns
/// `InvalidLayout` if no facet could be found (degenerate point set: fewer than 4 points, or
/// all points coplanar/collinear).
pub fn convex_hull_facets(positions: &[DVec3]) -> Result<Vec<Facet>> {
    let n = positions.len();
    if n < 4 {
        return Err(PannerError::InvalidLayout(format!(
            "at least 4 points are needed to compute a convex hull, got {}",
            n
        )));
    }

    let centroid = positions.iter().fold(DVec3::ZERO, |acc, p| acc + *p) / n as f64;

    // Canonical (normal, offset, vertices) per discovered facet, used to dedupe rediscoveries of
    // the same plane from different triples within it.
    let mut found: Vec<(DVec3, f64, Vec<usize>)> = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let Some((normal, offset)) =
                    supporting_plane(positions, i, j, k, centroid)
                else {
                    continue;
                };

                if found.iter().any(|(n2, d2, _)| {
                    (normal - *n2).length() < COPLANAR_TOLERANCE && (offset - d2).abs() < COPLANAR_TOLERANCE
                }) {
                    continue;
                }

                let on_plane: Vec<usize> = (0..n)
                    .filter(|&m| (normal.dot(positions[m]) - offset).abs() < ON_PLANE_TOLERANCE)
                    .collect();

                found.push((normal, offset, on_plane));
            }
        }
    }

    if found.is_empty() {
        return Err(PannerError::InvalidLayout(
            "points are degenerate: no convex hull facet could be found".into(),
        ));
    }

    Ok(found
        .into_iter()
        .map(|(_, _, vertices)| Facet { vertices })
        .collect())
}

/// If the plane through `positions[i]`, `positions[j]`, `positions[k]` supports the whole point
/// set (every other point lies on the interior side, within tolerance), return its
/// outward-oriented unit normal and offset (`normal . x = offset` on the plane; the centroid
/// satisfies `normal . centroid < offset`).
fn supporting_plane(
    positions: &[DVec3],
    i: usize,
    j: usize,
    k: usize,
    centroid: DVec3,
) -> Option<(DVec3, f64)> {
    let a = positions[i];
    let b = positions[j];
    let c = positions[k];

    let raw_normal = (b - a).cross(c - a);
    if raw_normal.length_squared() < 1e-20 {
        return None; // collinear triple, no well-defined plane
    }
    let normal = raw_normal.normalize();
    let offset = normal.dot(a);

    // Orient outward: the centroid must end up strictly on the interior (negative) side.
    let (normal, offset) = if normal.dot(centroid) - offset > 0.0 {
        (-normal, -offset)
    } else {
        (normal, offset)
    };

    // A supporting plane has every point on the interior side or on the plane itself; if any
    // point is strictly outside (positive side), this triple does not bound the hull.
    let side_tolerance = 1e-9;
    let is_supporting = positions
        .iter()
        .all(|p| normal.dot(*p) - offset <= side_tolerance);

    if is_supporting {
        Some((normal, offset))
    } else {
        None
    }
}

/// Find the vertices adjacent to `vertex` across all facets (union of other vertices in every
/// facet containing `vertex`).
pub fn adjacent_vertices(facets: &[Facet], vertex: usize) -> Vec<usize> {
    let mut adjacent: Vec<usize> = facets
        .iter()
        .filter(|f| f.vertices.contains(&vertex))
        .flat_map(|f| f.vertices.iter().copied())
        .filter(|&v| v != vertex)
        .collect();
    adjacent.sort_unstable();
    adjacent.dedup();
    adjacent
}
