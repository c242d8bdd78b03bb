//! Error types for point-source panner configuration.

use std::fmt;

/// Errors that can occur while configuring a point-source panner for a loudspeaker layout.
///
/// `handle` (querying a configured panner for a direction) never errors; it returns `None`
/// when it cannot place the source, which clients may treat as silence.
#[derive(Debug, Clone, PartialEq)]
pub enum PannerError {
    /// The layout cannot be turned into a valid region partition: an LFE channel was present,
    /// a hull facet had more than 4 vertices after coplanar merging, a triplet's speaker basis
    /// was non-invertible (collinear speakers), or a virtual-apex ring contained another virtual
    /// apex.
    InvalidLayout(String),

    /// A specialization path was required (e.g. the `0+2+0` stereo downmix, which needs an
    /// inner `0+5+0` panner) but the expected reference layout could not be found or didn't
    /// match the channel names it needs.
    UnsupportedLayout(String),
}

impl fmt::Display for PannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PannerError::InvalidLayout(msg) => write!(f, "invalid loudspeaker layout: {}", msg),
            PannerError::UnsupportedLayout(msg) => {
                write!(f, "unsupported loudspeaker layout: {}", msg)
            }
        }
    }
}

impl std::error::Error for PannerError {}

/// Result type alias for panner configuration.
pub type Result<T> = std::result::Result<T, PannerError>;
