//! Pan a single source around a 5.1 layout, printing the gains at a few positions.

use adm_point_source_panner::{configure, presets};

fn main() {
    tracing_subscriber::fmt::init();

    let layout = presets::surround_0_5_0().without_lfe();
    let panner = configure(&layout).expect("layout should configure");

    println!("channels: {:?}", layout.channel_names());

    for &(azimuth, elevation) in &[(0.0, 0.0), (30.0, 0.0), (90.0, 0.0), (180.0, 0.0), (0.0, 60.0)] {
        let gains = panner
            .handle_polar(azimuth, elevation)
            .expect("0+5+0 should cover the full sphere");
        println!("az={azimuth:>6.1} el={elevation:>5.1}  gains={gains:?}");
    }
}
