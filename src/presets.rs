//! Standard BS.2051-style loudspeaker layout presets.
//!
//! Azimuth/elevation convention matches `geom`: azimuth 0deg = front, positive = left;
//! elevation 0deg = horizontal, positive = above. Channel names follow the ADM convention
//! (`M` = mid layer, `U` = upper layer, `T` = top, prefixed sign = azimuth sign).

use crate::geom::PolarPosition;
use crate::layout::{Channel, Layout};

fn mid(name: &str, azimuth: f64) -> Channel {
    Channel::at(name, azimuth, 0.0)
}

fn upper(name: &str, azimuth: f64) -> Channel {
    Channel::at(name, azimuth, 30.0)
}

fn lfe(name: &str) -> Channel {
    // LFE channels carry no meaningful direction; the position is never used for panning
    // because `without_lfe` strips them before configuration.
    let pos = PolarPosition::new(45.0, -30.0, 1.0);
    Channel::new(name, pos, pos, true)
}

/// `0+2+0`: stereo, L/R at +-30deg.
pub fn stereo_0_2_0() -> Layout {
    Layout::new("0+2+0", vec![mid("M+030", 30.0), mid("M-030", -30.0)])
}

/// `0+5+0`: ITU-R BS.775 5.1, LFE included (strip with [`Layout::without_lfe`] before use).
pub fn surround_0_5_0() -> Layout {
    Layout::new(
        "0+5+0",
        vec![
            mid("M+030", 30.0),
            mid("M-030", -30.0),
            mid("M+000", 0.0),
            mid("M+110", 110.0),
            mid("M-110", -110.0),
            lfe("LFE1"),
        ],
    )
}

/// `2+5+0`: 5.1 plus two upper-layer speakers above the front pair.
pub fn upper_2_5_0() -> Layout {
    let mut channels = surround_0_5_0().channels;
    channels.push(upper("U+030", 30.0));
    channels.push(upper("U-030", -30.0));
    Layout::new("2+5+0", channels)
}

/// `4+5+0`: 5.1 plus four upper-layer speakers (front and rear pairs).
pub fn surround_4_5_0() -> Layout {
    let mut channels = surround_0_5_0().channels;
    channels.push(upper("U+030", 30.0));
    channels.push(upper("U-030", -30.0));
    channels.push(upper("U+110", 110.0));
    channels.push(upper("U-110", -110.0));
    Layout::new("4+5+0", channels)
}

/// Look up a preset layout by its BS.2051-style name. Returns `None` for unrecognised names.
pub fn lookup(name: &str) -> Option<Layout> {
    match name {
        "0+2+0" => Some(stereo_0_2_0()),
        "0+5+0" => Some(surround_0_5_0()),
        "2+5+0" => Some(upper_2_5_0()),
        "4+5+0" => Some(surround_4_5_0()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_channel_counts() {
        assert_eq!(stereo_0_2_0().channels.len(), 2);
        assert_eq!(surround_0_5_0().channels.len(), 6);
        assert_eq!(upper_2_5_0().channels.len(), 8);
        assert_eq!(surround_4_5_0().channels.len(), 10);
    }

    #[test]
    fn test_0_5_0_without_lfe_matches_stereo_downmix_expectation() {
        let layout = surround_0_5_0().without_lfe();
        assert_eq!(
            layout.channel_names(),
            vec!["M+030", "M-030", "M+000", "M+110", "M-110"]
        );
    }

    #[test]
    fn test_lookup() {
        assert!(lookup("0+2+0").is_some());
        assert!(lookup("9+10+3").is_none());
    }

    #[test]
    fn test_4_5_0_has_no_top_speaker() {
        // Used by configure() to decide whether to suppress the upper virtual apex: 4+5+0 has
        // neither T+000 nor UH+180, so the apex should be inserted.
        let layout = surround_4_5_0();
        assert!(!layout.channel_names().contains(&"T+000"));
        assert!(!layout.channel_names().contains(&"UH+180"));
    }
}
