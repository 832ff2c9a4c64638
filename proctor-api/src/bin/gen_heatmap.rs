//! Renders the exposure field of a single occupant as a grayscale PNG.
//!
//! Usage: `gen_heatmap [output.png] [occupant_angle] [candidate_angle]`.
//! Angles are in radians; the output defaults to `vision.png`.

use anyhow::Context;
use proctor_core::heatmap::{render_heatmap, HeatmapOptions};
use proctor_core::seating::Seat;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let output = args.next().unwrap_or_else(|| "vision.png".to_string());
    let occupant_angle: f64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid occupant angle {:?}", raw))?,
        None => 0.0,
    };
    let candidate_angle: f64 = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid candidate angle {:?}", raw))?,
        None => 0.0,
    };

    let occupant = Seat::new("occupant", 0.0, 0.0, occupant_angle).occupied();
    let options = HeatmapOptions {
        candidate_angle,
        ..HeatmapOptions::default()
    };

    let image = render_heatmap(&occupant, &options)?;
    image.save(&output).with_context(|| format!("Failed to write {}", output))?;
    println!("Wrote {}x{} heat-map to {}", image.width(), image.height(), output);

    Ok(())
}
