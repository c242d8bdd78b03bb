//! Region handlers: the four gain-computation strategies a point-source panner dispatches over.
//!
//! A single tagged `enum Region` unifies `Triplet`/`QuadRegion`/`VirtualNgon`/`StereoPanDownmix`,
//! each owning its own precomputed state and dispatched through one `handle` method.

use crate::error::{PannerError, Result};
use crate::geom::ngon_vertex_order;
use crate::panner::PointSourcePannerDownmix;
use glam::{DMat3, DVec3};

/// Triplet tolerance: a candidate gain component below this is rejected (the hull tiling is
/// only geometrically exact in double precision, so the tolerance lets adjacent triangles both
/// "claim" their shared boundary).
pub const TRIPLET_EPSILON: f64 = -1e-11;

/// Quad real-root tolerance: a root is accepted as real if its imaginary part's magnitude is
/// below this, and accepted as in-range if it lies within this distance of `[0, 1]`.
pub const QUAD_ROOT_EPSILON: f64 = 1e-10;

/// A region handler: something that can compute gains for some positions, e.g. a triplet of
/// loudspeakers.
#[derive(Clone, Debug)]
pub enum Region {
    Triplet(Triplet),
    Quad(QuadRegion),
    VirtualNgon(VirtualNgon),
    StereoDownmix(StereoPanDownmix),
}

impl Region {
    /// The channel numbers of the values returned by [`Region::handle`].
    pub fn output_channels(&self) -> &[usize] {
        match self {
            Region::Triplet(t) => &t.output_channels,
            Region::Quad(q) => &q.output_channels,
            Region::VirtualNgon(v) => &v.output_channels,
            Region::StereoDownmix(s) => &s.output_channels,
        }
    }

    /// Try to calculate gains for `position`. Returns `Some` with one gain per
    /// `output_channels()` entry (same order), or `None` if this region doesn't cover
    /// `position`.
    pub fn handle(&self, position: DVec3) -> Option<Vec<f64>> {
        match self {
            Region::Triplet(t) => t.handle(position).map(|g| g.to_vec()),
            Region::Quad(q) => q.handle(position).map(|g| g.to_vec()),
            Region::VirtualNgon(v) => v.handle(position),
            Region::StereoDownmix(s) => s.handle(position),
        }
    }

    /// Call [`Region::handle`] and place the result into a zeroed vector of length `nchannels`
    /// at `output_channels()`.
    pub fn handle_remap(&self, position: DVec3, nchannels: usize) -> Option<Vec<f64>> {
        let partial = self.handle(position)?;
        let mut out = vec![0.0; nchannels];
        for (&ch, g) in self.output_channels().iter().zip(partial) {
            out[ch] = g;
        }
        Some(out)
    }
}

/// VBAP over a triplet of loudspeakers.
///
/// If `handle(p)` returns `g`: `g . positions` is collinear with `p` and on the same side,
/// every component of `g` is `>= 0`, and `‖g‖₂ == 1`.
#[derive(Clone, Debug)]
pub struct Triplet {
    pub output_channels: Vec<usize>,
    basis_inv: DMat3,
}

impl Triplet {
    /// Build a triplet region over three (not necessarily unit) speaker positions.
    pub fn try_new(output_channels: [usize; 3], positions: [DVec3; 3]) -> Result<Self> {
        let basis = DMat3::from_cols(positions[0], positions[1], positions[2]);
        if basis.determinant().abs() < 1e-10 {
            return Err(PannerError::InvalidLayout(
                "degenerate triplet: speakers are collinear".into(),
            ));
        }
        Ok(Self {
            output_channels: output_channels.to_vec(),
            basis_inv: basis.inverse(),
        })
    }

    pub fn handle(&self, position: DVec3) -> Option<[f64; 3]> {
        let g = self.basis_inv * position;

        if g.x >= TRIPLET_EPSILON && g.y >= TRIPLET_EPSILON && g.z >= TRIPLET_EPSILON {
            let norm = g.length();
            if norm < 1e-15 {
                return None;
            }
            let g = (g / norm).max(DVec3::ZERO);
            Some([g.x, g.y, g.z])
        } else {
            None
        }
    }
}

/// n real loudspeakers plus a central virtual loudspeaker, whose gain is redistributed to the
/// real loudspeakers.
///
/// Built as a ring of [`Triplet`]s between the centre and consecutive (cyclically ordered) pairs
/// of real speakers; any gain landing on the virtual centre is folded back into the real
/// speakers via `centre_downmix` and the result renormalized.
#[derive(Clone, Debug)]
pub struct VirtualNgon {
    pub output_channels: Vec<usize>,
    centre_downmix: Vec<f64>,
    sub_triplets: Vec<Triplet>,
}

impl VirtualNgon {
    /// `output_channels`, `positions`, and `centre_downmix` must all have the same length `n`
    /// (`positions[i]`/`centre_downmix[i]` describe `output_channels[i]`).
    pub fn try_new(
        output_channels: Vec<usize>,
        positions: Vec<DVec3>,
        centre_position: DVec3,
        centre_downmix: Vec<f64>,
    ) -> Result<Self> {
        let n = output_channels.len();
        if positions.len() != n || centre_downmix.len() != n {
            return Err(PannerError::InvalidLayout(
                "virtual ngon channel/position/downmix lengths disagree".into(),
            ));
        }
        if n < 3 {
            return Err(PannerError::InvalidLayout(
                "virtual ngon needs at least 3 real speakers".into(),
            ));
        }

        let order = ngon_vertex_order(&positions);

        let mut sub_triplets = Vec::with_capacity(n);
        for step in 0..n {
            let i = order[step];
            let j = order[(step + 1) % n];
            // `n` is the virtual centre's slot in a length-(n+1) working buffer.
            sub_triplets.push(Triplet::try_new(
                [i, j, n],
                [positions[i], positions[j], centre_position],
            )?);
        }

        Ok(Self {
            output_channels,
            centre_downmix,
            sub_triplets,
        })
    }

    pub fn handle(&self, position: DVec3) -> Option<Vec<f64>> {
        let n = self.output_channels.len();

        for triplet in &self.sub_triplets {
            let Some(g3) = triplet.handle(position) else {
                continue;
            };

            let mut buf = vec![0.0; n + 1];
            for (&ch, g) in triplet.output_channels.iter().zip(g3) {
                buf[ch] = g;
            }

            let virtual_gain = buf[n];
            let mut real: Vec<f64> = buf[..n].to_vec();
            for (i, r) in real.iter_mut().enumerate() {
                *r += virtual_gain * self.centre_downmix[i];
            }

            let norm = real.iter().map(|g| g * g).sum::<f64>().sqrt();
            if norm < 1e-15 {
                return None;
            }
            for r in real.iter_mut() {
                *r /= norm;
            }
            return Some(real);
        }

        None
    }
}

/// Bilinear panning across 4 (approximately) coplanar loudspeakers.
#[derive(Clone, Debug)]
pub struct QuadRegion {
    pub output_channels: Vec<usize>,
    positions: [DVec3; 4],
    order: [usize; 4],
    poly_x: [DVec3; 3],
    poly_y: [DVec3; 3],
}

impl QuadRegion {
    pub fn try_new(output_channels: [usize; 4], positions: [DVec3; 4]) -> Result<Self> {
        let order_vec = ngon_vertex_order(&positions);
        let order: [usize; 4] = order_vec
            .try_into()
            .map_err(|_| PannerError::InvalidLayout("quad region needs exactly 4 vertices".into()))?;

        let ordered = [
            positions[order[0]],
            positions[order[1]],
            positions[order[2]],
            positions[order[3]],
        ];
        let poly_x = pan_axis_poly(ordered);
        let rotated = [ordered[1], ordered[2], ordered[3], ordered[0]];
        let poly_y = pan_axis_poly(rotated);

        Ok(Self {
            output_channels: output_channels.to_vec(),
            positions,
            order,
            poly_x,
            poly_y,
        })
    }

    pub fn handle(&self, position: DVec3) -> Option<[f64; 4]> {
        let x = pan_axis_solve(&self.poly_x, position)?;
        let y = pan_axis_solve(&self.poly_y, position)?;

        let ordered_gains = [(1.0 - x) * (1.0 - y), x * (1.0 - y), x * y, (1.0 - x) * y];

        let mut g = [0.0; 4];
        for (step, &idx) in self.order.iter().enumerate() {
            g[idx] = ordered_gains[step];
        }

        let reconstructed: DVec3 = g
            .iter()
            .zip(self.positions.iter())
            .fold(DVec3::ZERO, |acc, (&gi, &pi)| acc + pi * gi);
        if reconstructed.dot(position) <= 0.0 {
            return None; // ray pierces the back face
        }

        let norm = g.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm < 1e-15 {
            return None;
        }
        for v in g.iter_mut() {
            *v /= norm;
        }
        Some(g)
    }
}

/// Build the quadratic `P(t) = poly[0]*t^2 + poly[1]*t + poly[2]`, where dotting with a query
/// position yields the scalar quadratic whose root is that axis's pan parameter.
fn pan_axis_poly(p: [DVec3; 4]) -> [DVec3; 3] {
    let [a, b, c, d] = p;
    [
        (b - a).cross(c - d),
        a.cross(c - d) + (b - a).cross(d),
        a.cross(d),
    ]
}

/// Solve the axis's quadratic for `position` and return the pan parameter in `[0, 1]`, following
/// the "first real root in range, trying the smaller root first" convention (see Open Questions
/// in the design notes: source ordering for degenerate quads is preserved for compatibility
/// rather than always picking the mathematically smallest root).
fn pan_axis_solve(poly: &[DVec3; 3], position: DVec3) -> Option<f64> {
    let a = poly[0].dot(position);
    let b = poly[1].dot(position);
    let c = poly[2].dot(position);

    let lo = -QUAD_ROOT_EPSILON;
    let hi = 1.0 + QUAD_ROOT_EPSILON;

    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return None;
        }
        let t = -c / b;
        return (t >= lo && t <= hi).then(|| t.clamp(0.0, 1.0));
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant >= 0.0 {
        let sqrt_d = discriminant.sqrt();
        for t in [(-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)] {
            if t >= lo && t <= hi {
                return Some(t.clamp(0.0, 1.0));
            }
        }
        None
    } else {
        let imag_mag = (-discriminant).sqrt() / (2.0 * a.abs());
        if imag_mag < QUAD_ROOT_EPSILON {
            let t = -b / (2.0 * a);
            (t >= lo && t <= hi).then(|| t.clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

/// `0+2+0`-only specialization: pans across a full (LFE-stripped) `0+5+0` panner, then downmixes
/// to stereo with a BS.775-derived matrix and a front/back balance attenuation.
#[derive(Clone, Debug)]
pub struct StereoPanDownmix {
    pub output_channels: Vec<usize>,
    inner: Box<PointSourcePannerDownmix>,
}

/// Modified BS.775 downmix coefficients, rows `[left, right]`, columns
/// `[M+030, M-030, M+000, M+110, M-110]`. The centre/surround coefficients are adjusted (from
/// the plain BS.775 `0.707`/`0.707` power-preserving downmix) to preserve the velocity vector.
const STEREO_DOWNMIX: [[f64; 5]; 2] = {
    let c = 0.577_350_269_189_625_8; // sqrt(3) / 3
    let s = 0.707_106_781_186_547_5; // sqrt(1/2)
    [[1.0, 0.0, c, s, 0.0], [0.0, 1.0, c, 0.0, s]]
};

impl StereoPanDownmix {
    pub fn new(
        output_channels: [usize; 2],
        inner: PointSourcePannerDownmix,
    ) -> Self {
        Self {
            output_channels: output_channels.to_vec(),
            inner: Box::new(inner),
        }
    }

    pub fn handle(&self, position: DVec3) -> Option<Vec<f64>> {
        let pv = self.inner.handle(position)?;
        debug_assert_eq!(pv.len(), 5);

        let mut dmix = [0.0_f64; 2];
        for (row, out) in STEREO_DOWNMIX.iter().zip(dmix.iter_mut()) {
            *out = row.iter().zip(pv.iter()).map(|(a, b)| a * b).sum();
        }

        let norm = (dmix[0] * dmix[0] + dmix[1] * dmix[1]).sqrt();
        if norm > 1e-15 {
            dmix[0] /= norm;
            dmix[1] /= norm;
        }

        let front = pv[0].max(pv[1]).max(pv[2]);
        let back = pv[3].max(pv[4]);
        if front + back > 1e-15 {
            let attenuation = 0.5_f64.powf(0.5 * back / (front + back));
            dmix[0] *= attenuation;
            dmix[1] *= attenuation;
        }

        Some(dmix.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::DVec3;

    fn unit(az: f64, el: f64) -> DVec3 {
        crate::geom::polar_to_cartesian(az, el)
    }

    #[test]
    fn test_triplet_centre_of_cone() {
        let t = Triplet::try_new(
            [0, 1, 2],
            [unit(30.0, 0.0), unit(-30.0, 0.0), unit(0.0, 90.0)],
        )
        .unwrap();

        let g = t.handle(unit(0.0, 30.0)).unwrap();
        let sum_sq: f64 = g.iter().map(|v| v * v).sum();
        assert_relative_eq!(sum_sq, 1.0, epsilon = 1e-9);
        assert!(g.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_triplet_outside_cone_returns_none() {
        let t = Triplet::try_new(
            [0, 1, 2],
            [unit(30.0, 0.0), unit(-30.0, 0.0), unit(0.0, 90.0)],
        )
        .unwrap();

        assert!(t.handle(unit(180.0, 0.0)).is_none());
    }

    #[test]
    fn test_triplet_collinear_speakers_rejected() {
        let result = Triplet::try_new(
            [0, 1, 2],
            [
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(2.0, 0.0, 0.0),
                DVec3::new(3.0, 0.0, 0.0),
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_virtual_ngon_centre_direction() {
        // A square ring around the north pole; pointing straight up should split gain evenly
        // over all four real speakers.
        let positions = vec![unit(45.0, 45.0), unit(135.0, 45.0), unit(225.0, 45.0), unit(315.0, 45.0)];
        let ngon = VirtualNgon::try_new(
            vec![0, 1, 2, 3],
            positions,
            DVec3::new(0.0, 0.0, 1.0),
            vec![0.5, 0.5, 0.5, 0.5],
        )
        .unwrap();

        let g = ngon.handle(DVec3::new(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(g.len(), 4);
        let sum_sq: f64 = g.iter().map(|v| v * v).sum();
        assert_relative_eq!(sum_sq, 1.0, epsilon = 1e-9);
        for v in &g {
            assert_relative_eq!(*v, 0.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_quad_region_corner_gains() {
        let positions = [unit(45.0, 0.0), unit(-45.0, 0.0), unit(-135.0, 0.0), unit(135.0, 0.0)];
        let quad = QuadRegion::try_new([0, 1, 2, 3], positions).unwrap();

        for (idx, &p) in positions.iter().enumerate() {
            let g = quad.handle(p).unwrap();
            assert_relative_eq!(g[idx], 1.0, epsilon = 1e-6);
            for (j, &gj) in g.iter().enumerate() {
                if j != idx {
                    assert!(gj.abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_quad_region_gains_non_negative_and_normalized() {
        let positions = [unit(45.0, 0.0), unit(-45.0, 0.0), unit(-135.0, 0.0), unit(135.0, 0.0)];
        let quad = QuadRegion::try_new([0, 1, 2, 3], positions).unwrap();

        let g = quad.handle(unit(0.0, 0.0)).unwrap();
        let sum_sq: f64 = g.iter().map(|v| v * v).sum();
        assert_relative_eq!(sum_sq, 1.0, epsilon = 1e-6);
        assert!(g.iter().all(|&v| v >= -1e-9));
    }

    #[test]
    fn test_quad_region_back_face_rejected() {
        let positions = [unit(45.0, 0.0), unit(-45.0, 0.0), unit(-135.0, 0.0), unit(135.0, 0.0)];
        let quad = QuadRegion::try_new([0, 1, 2, 3], positions).unwrap();

        // Straight up is not on this (horizontal-ring) quad's front face at all.
        assert!(quad.handle(unit(0.0, 90.0)).is_none());
    }
}
