//! Top-level point-source panners.
//!
//! A [`PointSourcePanner`] is a flat list of [`Region`]s covering the whole sphere of
//! directions; [`PointSourcePannerDownmix`] wraps one with a downmix matrix, for when the
//! regions were built over an augmented layout (with virtual/extra speakers) that does not
//! match the real output channel count. [`Panner`] unifies both behind one public interface,
//! mirroring `point_source.py`'s `PointSourcePanner`/`PointSourcePannerDownmix` pair.

use crate::error::{PannerError, Result};
use crate::geom::polar_to_cartesian;
use crate::region::Region;
use glam::DVec3;

/// A point-source panner: a flat partition of the sphere of directions into [`Region`]s, each
/// producing gains for a subset of output channels.
#[derive(Clone, Debug)]
pub struct PointSourcePanner {
    regions: Vec<Region>,
    num_channels: usize,
}

impl PointSourcePanner {
    /// `num_channels` must be at least `1 + ` the highest output-channel index used by any
    /// region, otherwise `handle`/`handle_remap` would index out of bounds.
    pub fn new(regions: Vec<Region>, num_channels: usize) -> Result<Self> {
        let required_channels = regions
            .iter()
            .flat_map(|r| r.output_channels().iter().copied())
            .max()
            .map_or(0, |max_index| max_index + 1);

        if num_channels < required_channels {
            return Err(PannerError::InvalidLayout(format!(
                "num_channels ({}) is less than the {} channels required by the regions' output_channels",
                num_channels, required_channels
            )));
        }

        Ok(Self {
            regions,
            num_channels,
        })
    }

    /// Compute gains for a Cartesian direction. Returns `None` only if no region in the
    /// partition claims `position`, which should not happen for a correctly configured panner
    /// except at floating-point-exact region boundaries.
    pub fn handle(&self, position: DVec3) -> Option<Vec<f64>> {
        self.regions
            .iter()
            .find_map(|r| r.handle_remap(position, self.num_channels))
    }

    /// Convenience wrapper around [`Self::handle`] taking azimuth/elevation in degrees.
    pub fn handle_polar(&self, azimuth: f64, elevation: f64) -> Option<Vec<f64>> {
        self.handle(polar_to_cartesian(azimuth, elevation))
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

/// A [`PointSourcePanner`] over an augmented (real + extra/virtual) layout, downmixed back down
/// to the real output channels.
#[derive(Clone, Debug)]
pub struct PointSourcePannerDownmix {
    inner: PointSourcePanner,
    /// `downmix[real_channel][augmented_channel]`.
    downmix: Vec<Vec<f64>>,
}

impl PointSourcePannerDownmix {
    /// `downmix` must have one row per real output channel, each row one entry per
    /// `inner.num_channels()`.
    pub fn new(inner: PointSourcePanner, downmix: Vec<Vec<f64>>) -> Self {
        debug_assert!(downmix.iter().all(|row| row.len() == inner.num_channels()));
        Self { inner, downmix }
    }

    pub fn handle(&self, position: DVec3) -> Option<Vec<f64>> {
        let inner_gains = self.inner.handle(position)?;

        let mut out: Vec<f64> = self
            .downmix
            .iter()
            .map(|row| row.iter().zip(&inner_gains).map(|(a, b)| a * b).sum())
            .collect();

        let norm = out.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 1e-15 {
            for v in out.iter_mut() {
                *v /= norm;
            }
        }

        Some(out)
    }

    pub fn handle_polar(&self, azimuth: f64, elevation: f64) -> Option<Vec<f64>> {
        self.handle(polar_to_cartesian(azimuth, elevation))
    }

    #[inline]
    pub fn num_channels(&self) -> usize {
        self.downmix.len()
    }

    pub fn inner(&self) -> &PointSourcePanner {
        &self.inner
    }
}

/// A configured point-source panner, either operating directly on the real output channels or
/// wrapping an augmented-layout panner with a downmix.
#[derive(Clone, Debug)]
pub enum Panner {
    Direct(PointSourcePanner),
    Downmixed(PointSourcePannerDownmix),
}

impl Panner {
    /// Compute gains for a Cartesian source direction (need not be unit length; only its
    /// direction matters). One gain per output channel, in the configured layout's channel
    /// order. `None` only at unreachable region-boundary edge cases.
    pub fn handle(&self, position: DVec3) -> Option<Vec<f64>> {
        match self {
            Panner::Direct(p) => p.handle(position),
            Panner::Downmixed(p) => p.handle(position),
        }
    }

    /// Convenience wrapper around [`Self::handle`] taking azimuth/elevation in degrees, using
    /// the same convention as [`crate::geom::polar_to_cartesian`].
    pub fn handle_polar(&self, azimuth: f64, elevation: f64) -> Option<Vec<f64>> {
        self.handle(polar_to_cartesian(azimuth, elevation))
    }

    /// Number of output channels (real loudspeakers, LFE excluded).
    pub fn num_channels(&self) -> usize {
        match self {
            Panner::Direct(p) => p.num_channels(),
            Panner::Downmixed(p) => p.num_channels(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::Triplet;
    use approx::assert_relative_eq;

    fn octant_panner() -> PointSourcePanner {
        // Eight triplets covering the full sphere, one per octant of a unit octahedron.
        let axes = [
            DVec3::X,
            -DVec3::X,
            DVec3::Y,
            -DVec3::Y,
            DVec3::Z,
            -DVec3::Z,
        ];
        let mut regions = Vec::new();
        let signs = [1.0, -1.0];
        for &sx in &signs {
            for &sy in &signs {
                for &sz in &signs {
                    let a = if sx > 0.0 { axes[0] } else { axes[1] };
                    let b = if sy > 0.0 { axes[2] } else { axes[3] };
                    let c = if sz > 0.0 { axes[4] } else { axes[5] };
                    regions.push(Region::Triplet(Triplet::try_new([0, 1, 2], [a, b, c]).unwrap()));
                }
            }
        }
        PointSourcePanner::new(regions, 3).unwrap()
    }

    #[test]
    fn test_new_rejects_insufficient_num_channels() {
        let region = Region::Triplet(Triplet::try_new([0, 1, 4], [DVec3::X, DVec3::Y, DVec3::Z]).unwrap());
        let result = PointSourcePanner::new(vec![region], 3);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_accepts_exact_num_channels() {
        let region = Region::Triplet(Triplet::try_new([0, 1, 2], [DVec3::X, DVec3::Y, DVec3::Z]).unwrap());
        assert!(PointSourcePanner::new(vec![region], 3).is_ok());
    }

    #[test]
    fn test_point_source_panner_covers_sphere() {
        let panner = octant_panner();
        for az in (0..360).step_by(30) {
            for el in (-80..=80).step_by(20) {
                let g = panner
                    .handle_polar(az as f64, el as f64)
                    .unwrap_or_else(|| panic!("no region covered az={az} el={el}"));
                let sum_sq: f64 = g.iter().map(|v| v * v).sum();
                assert_relative_eq!(sum_sq, 1.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_downmix_renormalizes() {
        let inner = octant_panner();
        // Collapse all 3 augmented channels onto 1 real channel.
        let downmix = vec![vec![1.0, 1.0, 1.0]];
        let psp = PointSourcePannerDownmix::new(inner, downmix);

        let g = psp.handle_polar(10.0, 10.0).unwrap();
        assert_eq!(g.len(), 1);
        assert_relative_eq!(g[0].abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_panner_enum_dispatch() {
        let direct = Panner::Direct(octant_panner());
        assert_eq!(direct.num_channels(), 3);
        assert!(direct.handle_polar(0.0, 0.0).is_some());

        let downmixed = Panner::Downmixed(PointSourcePannerDownmix::new(
            octant_panner(),
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 1.0]],
        ));
        assert_eq!(downmixed.num_channels(), 2);
        assert!(downmixed.handle_polar(0.0, 0.0).is_some());
    }
}
