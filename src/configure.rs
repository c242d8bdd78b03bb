//! Configuration pipeline: turn a loudspeaker layout into a configured [`Panner`].
//!
//! Mirrors `point_source.py`'s `configure`/`_configure_full`/`_configure_stereo`/
//! `extra_pos_vertical_nominal` free functions.

use crate::error::{PannerError, Result};
use crate::geom::PolarPosition;
use crate::hull::{adjacent_vertices, convex_hull_facets};
use crate::layout::{Channel, Layout};
use crate::panner::{Panner, PointSourcePanner, PointSourcePannerDownmix};
use crate::presets;
use crate::region::{QuadRegion, Region, StereoPanDownmix, Triplet, VirtualNgon};
use glam::DVec3;
use tracing::{debug, warn};

/// Tolerance on the azimuth comparison deciding whether a mid-layer speaker needs an extra
/// vertical neighbour; gives the limit a little slack so small real-world deployment offsets
/// don't flip the decision.
const EXTRA_SPEAKER_AZ_EPSILON: f64 = 1e-5;

/// Configure a point-source panner for `layout`.
///
/// Returns [`PannerError::InvalidLayout`] if `layout` contains an LFE channel (strip with
/// [`Layout::without_lfe`] first) or if the layout's geometry cannot be turned into a valid
/// region partition.
pub fn configure(layout: &Layout) -> Result<Panner> {
    if layout.channels.iter().any(|c| c.is_lfe) {
        return Err(PannerError::InvalidLayout(
            "an LFE channel was passed to the point-source panner".into(),
        ));
    }

    debug!(layout = %layout.name, channels = layout.channels.len(), "configuring point-source panner");

    if layout.name == "0+2+0" {
        configure_stereo(layout)
    } else {
        configure_full(layout).map(Panner::Downmixed)
    }
}

/// `0+2+0`-only specialization: pan with an inner `0+5+0` panner and downmix to stereo.
fn configure_stereo(layout: &Layout) -> Result<Panner> {
    let left_channel = layout
        .channel_names()
        .iter()
        .position(|&n| n == "M+030")
        .ok_or_else(|| PannerError::UnsupportedLayout("0+2+0 layout has no M+030 channel".into()))?;
    let right_channel = layout
        .channel_names()
        .iter()
        .position(|&n| n == "M-030")
        .ok_or_else(|| PannerError::UnsupportedLayout("0+2+0 layout has no M-030 channel".into()))?;

    let inner_layout = presets::surround_0_5_0().without_lfe();
    if inner_layout.channel_names() != ["M+030", "M-030", "M+000", "M+110", "M-110"] {
        return Err(PannerError::UnsupportedLayout(
            "0+5+0 preset layout does not match the expected stereo-downmix channel order".into(),
        ));
    }
    let inner = configure_full(&inner_layout)?;

    let region = Region::StereoDownmix(StereoPanDownmix::new([left_channel, right_channel], inner));
    let panner = PointSourcePanner::new(vec![region], 2)?;
    Ok(Panner::Direct(panner))
}

/// Generate extra loudspeaker positions to fill gaps in the upper/lower layers, and the downmix
/// matrix (real channels x augmented channels) that folds their gains back onto the real
/// speakers they shadow.
fn extra_pos_vertical_nominal(layout: &Layout) -> (Vec<Channel>, Vec<Vec<f64>>) {
    let n = layout.channels.len();
    let mut extra_channels = Vec::new();

    // One identity row per real channel, to start; one more row per extra channel added below.
    // This is (real + extra) x real; we transpose to (real) x (real + extra) at the end.
    let mut downmix_rows: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let is_mid: Vec<bool> = layout
        .channels
        .iter()
        .map(|c| (-10.0..=10.0).contains(&c.polar_nominal_position.elevation))
        .collect();

    // (layer nominal elevation, layer lower bound, layer upper bound)
    let layers = [(-30.0, -70.0, -10.0), (30.0, 10.0, 70.0)];

    for &(layer_nominal_el, layer_lb, layer_ub) in &layers {
        let layer_members: Vec<usize> = (0..n)
            .filter(|&i| {
                let el = layout.channels[i].polar_nominal_position.elevation;
                layer_lb <= el && el <= layer_ub
            })
            .collect();

        let (az_limit, layer_real_el) = if !layer_members.is_empty() {
            let az_range = layer_members
                .iter()
                .map(|&i| layout.channels[i].polar_nominal_position.azimuth.abs())
                .fold(0.0_f64, f64::max);
            let mean_real_el = layer_members
                .iter()
                .map(|&i| layout.channels[i].polar_position.elevation)
                .sum::<f64>()
                / layer_members.len() as f64;
            (az_range + 40.0, mean_real_el)
        } else {
            (0.0, layer_nominal_el)
        };

        for mid_channel in (0..n).filter(|&i| is_mid[i]) {
            let nominal_az = layout.channels[mid_channel].polar_nominal_position.azimuth;
            if nominal_az.abs() >= az_limit - EXTRA_SPEAKER_AZ_EPSILON {
                let real_az = layout.channels[mid_channel].polar_position.azimuth;
                extra_channels.push(Channel::new(
                    "extra",
                    PolarPosition::new(real_az, layer_real_el, 1.0),
                    PolarPosition::new(nominal_az, layer_nominal_el, 1.0),
                    false,
                ));

                let mut row = vec![0.0; n];
                row[mid_channel] = 1.0;
                downmix_rows.push(row);
            }
        }
    }

    let num_augmented = downmix_rows.len();
    let downmix: Vec<Vec<f64>> = (0..n)
        .map(|real| (0..num_augmented).map(|aug| downmix_rows[aug][real]).collect())
        .collect();

    (extra_channels, downmix)
}

/// General-case pipeline: augment with extra speakers and virtual apexes, take the convex hull
/// of the augmented layout, and turn hull facets into regions.
fn configure_full(layout: &Layout) -> Result<PointSourcePannerDownmix> {
    let (extra_channels, downmix) = extra_pos_vertical_nominal(layout);
    debug!(extra = extra_channels.len(), "added extra vertical speakers");
    let layout_extra = layout.with_extra_channels(extra_channels);
    let num_augmented_channels = layout_extra.channels.len();

    // No upper virtual apex is added for layouts with T+000/UH+180: that speaker may be
    // directly overhead, which would otherwise introduce a gain discontinuity near the zenith.
    let mut virtual_positions = vec![DVec3::new(0.0, 0.0, -1.0)];
    let has_top_speaker = layout
        .channel_names()
        .iter()
        .any(|&n| n == "T+000" || n == "UH+180");
    if !has_top_speaker {
        virtual_positions.push(DVec3::new(0.0, 0.0, 1.0));
    }
    debug!(apexes = virtual_positions.len(), "added virtual apex speakers");

    let mut positions_nominal = layout_extra.nominal_positions();
    positions_nominal.extend(virtual_positions.iter().copied());
    let mut positions_real = layout_extra.norm_positions();
    positions_real.extend(virtual_positions.iter().copied());

    let virtual_verts: Vec<usize> = (0..virtual_positions.len())
        .map(|i| num_augmented_channels + i)
        .collect();

    let facets = convex_hull_facets(&positions_nominal)?;

    let mut regions = Vec::new();

    // Facets adjacent to a virtual apex become virtual ngons, with an equal-power downmix from
    // the apex to the real speakers on its ring.
    for &virtual_vert in &virtual_verts {
        let real_verts = adjacent_vertices(&facets, virtual_vert);
        if real_verts.iter().any(|v| virtual_verts.contains(v)) {
            return Err(PannerError::InvalidLayout(
                "a virtual apex is adjacent to another virtual apex in the hull".into(),
            ));
        }

        let ring_size = real_verts.len();
        let downmix_coeff = 1.0 / (ring_size as f64).sqrt();
        let positions: Vec<DVec3> = real_verts.iter().map(|&v| positions_real[v]).collect();

        regions.push(Region::VirtualNgon(VirtualNgon::try_new(
            real_verts,
            positions,
            positions_real[virtual_vert],
            vec![downmix_coeff; ring_size],
        )?));
    }

    // Facets not touching a virtual apex become triplets or quads directly.
    for facet in &facets {
        if facet.vertices.iter().any(|v| virtual_verts.contains(v)) {
            continue;
        }

        let verts = &facet.vertices;
        let positions: Vec<DVec3> = verts.iter().map(|&v| positions_real[v]).collect();

        match verts.len() {
            3 => {
                regions.push(Region::Triplet(Triplet::try_new(
                    [verts[0], verts[1], verts[2]],
                    [positions[0], positions[1], positions[2]],
                )?));
            }
            4 => {
                regions.push(Region::Quad(QuadRegion::try_new(
                    [verts[0], verts[1], verts[2], verts[3]],
                    [positions[0], positions[1], positions[2], positions[3]],
                )?));
            }
            other => {
                warn!(vertex_count = other, "hull facet with unsupported vertex count after coplanar merge");
                return Err(PannerError::InvalidLayout(format!(
                    "hull facet has {} vertices after coplanar merging; only 3 or 4 are supported",
                    other
                )));
            }
        }
    }

    let inner = PointSourcePanner::new(regions, num_augmented_channels)?;
    Ok(PointSourcePannerDownmix::new(inner, downmix))
}
