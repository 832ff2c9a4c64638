use super::seat::Seat;
use std::f64::consts::PI;

/// Rotates `(x, y)` counter-clockwise by `theta` radians.
pub fn rotate_point(x: f64, y: f64, theta: f64) -> (f64, f64) {
    let (sin, cos) = theta.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// How exposed `candidate` is to someone sitting at `occupant`, roughly in
/// `[0, 1]`. Directional: `exposure(a, b)` and `exposure(b, a)` differ in
/// general.
///
/// Two details are load-bearing for existing seat plans and are pinned by
/// the golden tests below:
/// - the distance term feeds the *squared* offsets into `hypot`, so it
///   decays with `sqrt(dx^4 + dy^4)` rather than the Euclidean norm;
/// - the offset is rotated into the *candidate's* facing frame, not the
///   occupant's.
pub fn exposure(occupant: &Seat, candidate: &Seat) -> f64 {
    let dx = candidate.x - occupant.x;
    let dy = candidate.y - occupant.y;

    let distance = (dx * dx).hypot(dy * dy);
    let distance_factor = (-distance).exp();

    let (rotated_x, rotated_y) = rotate_point(dx, dy, candidate.angle);
    let relative_angle = rotated_y.atan2(rotated_x).abs();
    let angle_factor = (PI - relative_angle) / PI;

    distance_factor * angle_factor
}
