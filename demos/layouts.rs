//! Configure every built-in preset layout and sweep a source across the horizontal plane.

use adm_point_source_panner::{configure, presets};

fn main() {
    tracing_subscriber::fmt::init();

    for name in ["0+2+0", "0+5+0", "2+5+0", "4+5+0"] {
        let layout = presets::lookup(name).expect("known preset").without_lfe();
        let panner = configure(&layout).expect("preset layouts should always configure");

        println!("\n{name} ({} channels): {:?}", panner.num_channels(), layout.channel_names());
        for az in (-180..=180).step_by(45) {
            let gains = panner.handle_polar(az as f64, 0.0).expect("should cover the horizontal plane");
            let loudest = gains
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| layout.channels[i].name.as_str())
                .unwrap_or("-");
            println!("  az={az:>4}  loudest={loudest:<6} gains={gains:?}");
        }
    }
}
