//! Loudspeaker layout data model.
//!
//! This is the "external collaborator" the configuration pipeline consumes: a `Layout` is just
//! an ordered list of `Channel`s, each carrying both a nominal position (the idealised position
//! used for hull topology) and a real position (the actual deployment, used for gain
//! computation). A channel's index in `Layout::channels` is its panner output-channel index.

use crate::geom::PolarPosition;
use glam::DVec3;

/// A single loudspeaker channel in a layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    /// Channel name, e.g. `"M+030"`. Only `"M+030"`/`"M-030"` (stereo special-case) and
    /// `"T+000"`/`"UH+180"` (upper-apex suppression) are inspected by name anywhere in this
    /// crate; everything else is purely positional.
    pub name: String,

    /// Real (as-deployed) polar position, used for gain computation.
    pub polar_position: PolarPosition,

    /// Nominal (idealised) polar position, used for hull topology.
    pub polar_nominal_position: PolarPosition,

    /// Whether this channel is a low-frequency-effects channel. LFE channels are never
    /// spatialized and must be filtered out (see [`Layout::without_lfe`]) before configuring a
    /// panner.
    pub is_lfe: bool,
}

impl Channel {
    /// Construct a new channel.
    pub fn new(
        name: impl Into<String>,
        polar_position: PolarPosition,
        polar_nominal_position: PolarPosition,
        is_lfe: bool,
    ) -> Self {
        Self {
            name: name.into(),
            polar_position,
            polar_nominal_position,
            is_lfe,
        }
    }

    /// Construct a non-LFE channel whose nominal and real positions coincide.
    pub fn at(name: impl Into<String>, azimuth: f64, elevation: f64) -> Self {
        let pos = PolarPosition::new(azimuth, elevation, 1.0);
        Self::new(name, pos, pos, false)
    }

    /// The real position as a (not necessarily unit) Cartesian vector.
    #[inline]
    pub fn real_cartesian(&self) -> DVec3 {
        self.polar_position.to_cartesian()
    }

    /// The real position, normalised to a unit vector.
    #[inline]
    pub fn norm_cartesian(&self) -> DVec3 {
        let v = self.real_cartesian();
        if v.length_squared() > 1e-20 {
            v.normalize()
        } else {
            DVec3::ZERO
        }
    }

    /// The nominal position as a Cartesian vector (expected to already be unit-length).
    #[inline]
    pub fn nominal_cartesian(&self) -> DVec3 {
        self.polar_nominal_position.to_cartesian()
    }
}

/// An ordered loudspeaker layout.
///
/// Channel index = position in `channels`; this is also the output-channel index a configured
/// panner's gain vectors are indexed by.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    /// Layout name. Only `"0+2+0"` is treated specially (see `configure`).
    pub name: String,
    /// Ordered channels.
    pub channels: Vec<Channel>,
}

impl Layout {
    /// Construct a layout from a name and ordered channels.
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }

    /// Channel names, in channel order.
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    /// Nominal Cartesian positions, in channel order.
    pub fn nominal_positions(&self) -> Vec<DVec3> {
        self.channels.iter().map(Channel::nominal_cartesian).collect()
    }

    /// Real Cartesian positions, normalised to unit vectors, in channel order.
    pub fn norm_positions(&self) -> Vec<DVec3> {
        self.channels.iter().map(Channel::norm_cartesian).collect()
    }

    /// A copy of this layout with LFE channels removed.
    pub fn without_lfe(&self) -> Layout {
        Layout::new(
            self.name.clone(),
            self.channels.iter().filter(|c| !c.is_lfe).cloned().collect(),
        )
    }

    /// A copy of this layout with extra channels appended (used by the configuration pipeline
    /// to build the "augmented" layout with extra vertical speakers).
    pub fn with_extra_channels(&self, extra: Vec<Channel>) -> Layout {
        let mut channels = self.channels.clone();
        channels.extend(extra);
        Layout::new(self.name.clone(), channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_lfe() {
        let layout = Layout::new(
            "test",
            vec![
                Channel::at("M+030", 30.0, 0.0),
                Channel::new(
                    "LFE1",
                    PolarPosition::new(0.0, -30.0, 1.0),
                    PolarPosition::new(0.0, -30.0, 1.0),
                    true,
                ),
                Channel::at("M-030", -30.0, 0.0),
            ],
        );

        let filtered = layout.without_lfe();
        assert_eq!(filtered.channels.len(), 2);
        assert_eq!(filtered.channel_names(), vec!["M+030", "M-030"]);
    }

    #[test]
    fn test_nominal_positions_unit_length() {
        let layout = Layout::new(
            "test",
            vec![Channel::at("M+030", 30.0, 0.0), Channel::at("M-030", -30.0, 0.0)],
        );

        for p in layout.nominal_positions() {
            assert!((p.length() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_with_extra_channels() {
        let layout = Layout::new("test", vec![Channel::at("M+030", 30.0, 0.0)]);
        let extended = layout.with_extra_channels(vec![Channel::at("extra", 30.0, 30.0)]);
        assert_eq!(extended.channels.len(), 2);
        assert_eq!(layout.channels.len(), 1);
    }
}
