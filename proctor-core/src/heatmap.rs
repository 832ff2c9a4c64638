use image::{GrayImage, Luma};
use crate::seating::{exposure, Seat};

#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    #[error("Image size must be positive")]
    EmptyImage,

    #[error("Extent must be a positive finite number, got {0}")]
    InvalidExtent(f64),
}

#[derive(Debug, Clone)]
pub struct HeatmapOptions {
    /// Width and height in pixels.
    pub size: u32,
    /// Half-width of the sampled square, in seat units.
    pub extent: f64,
    /// Orientation given to every sampled candidate seat.
    pub candidate_angle: f64,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            size: 512,
            extent: 3.0,
            candidate_angle: 0.0,
        }
    }
}

/// Renders how exposed a seat at each point of the plane would be to
/// `occupant`. Brighter pixels are more exposed. The image is centered on
/// the occupant with +y pointing up.
pub fn render_heatmap(occupant: &Seat, options: &HeatmapOptions) -> Result<GrayImage, HeatmapError> {
    if options.size == 0 {
        return Err(HeatmapError::EmptyImage);
    }
    if !options.extent.is_finite() || options.extent <= 0.0 {
        return Err(HeatmapError::InvalidExtent(options.extent));
    }

    let size = options.size as f64;
    let span = options.extent * 2.0;
    let mut probe = Seat::new("probe", 0.0, 0.0, options.candidate_angle);

    Ok(GrayImage::from_fn(options.size, options.size, |px, py| {
        probe.x = occupant.x - options.extent + (px as f64 + 0.5) / size * span;
        probe.y = occupant.y + options.extent - (py as f64 + 0.5) / size * span;

        let value = exposure(occupant, &probe).clamp(0.0, 1.0);
        Luma([(value * 255.0).round() as u8])
    }))
}
