//! # ADM point-source panner
//!
//! A Rust implementation of the point-source panning algorithm from the ADM (Audio Definition
//! Model) renderer: given a loudspeaker layout and a Cartesian or polar source direction,
//! compute one gain per loudspeaker, such that panning a mono source through those gains places
//! a phantom image at the source's direction.
//!
//! The panner is built from a loudspeaker layout in a one-time configuration step
//! ([`configure`]), then queried many times per source direction via [`Panner::handle`]. Gains
//! are computed by partitioning the sphere of directions into regions -- triangles of
//! loudspeakers (VBAP), quads (bilinear panning), and rings of loudspeakers around a phantom
//! apex (virtual n-gons) -- built from the convex hull of the (possibly augmented) layout.
//!
//! ## Quick start
//!
//! ```rust
//! use adm_point_source_panner::{configure, presets};
//!
//! let layout = presets::surround_0_5_0().without_lfe();
//! let panner = configure(&layout).unwrap();
//!
//! // Pan a source 30 degrees to the left, at ear height.
//! let gains = panner.handle_polar(30.0, 0.0).unwrap();
//! println!("{:?}", gains);
//! ```
//!
//! ## Custom layouts
//!
//! ```rust
//! use adm_point_source_panner::{configure, layout::{Channel, Layout}};
//!
//! let layout = Layout::new(
//!     "custom",
//!     vec![
//!         Channel::at("L", 30.0, 0.0),
//!         Channel::at("R", -30.0, 0.0),
//!         Channel::at("C", 0.0, 0.0),
//!         Channel::at("Ls", 110.0, 0.0),
//!         Channel::at("Rs", -110.0, 0.0),
//!     ],
//! );
//! let panner = configure(&layout).unwrap();
//! let gains = panner.handle_polar(45.0, 0.0).unwrap();
//! ```
//!
//! ## Angle conventions
//!
//! - **Azimuth**: 0deg = front centre, 90deg = left, -90deg = right, 180deg = rear
//! - **Elevation**: 0deg = horizontal, 90deg = above, -90deg = below
//!
//! ## References
//!
//! Based on the point-source panner in the ITU-R BS.2127 ADM renderer ("Rendering item type
//! metadata"), following the region-handler design from its reference Python implementation.

pub mod configure;
pub mod error;
pub mod geom;
pub mod hull;
pub mod layout;
pub mod panner;
pub mod presets;
pub mod region;

// Re-exports for ergonomic API
pub use configure::configure;
pub use error::{PannerError, Result};
pub use layout::{Channel, Layout};
pub use panner::{Panner, PointSourcePanner, PointSourcePannerDownmix};
pub use region::Region;
