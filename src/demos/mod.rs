//! The demo compositions.
//!
//! Each demo implements [`Demo`](crate::flow::Demo). Time-driven parameters
//! are computed by the small pure functions below, straight from the frame
//! time, so no demo accumulates state between frames.

use cgmath::Rad;
use rand::{Rng, RngCore};

pub mod digital_path;
pub mod earth;
pub mod placement;
pub mod starfield;
pub mod wire_sphere;

/// Rotation angle after `time_ms` at `rate` radians per millisecond.
pub fn spin_angle(time_ms: f64, rate: f64) -> Rad<f32> {
    Rad((time_ms * rate) as f32)
}

/// `1 + sin(time_ms * rate) * amplitude`.
pub fn pulse_scale(time_ms: f64, rate: f64, amplitude: f32) -> f32 {
    1.0 + (time_ms * rate).sin() as f32 * amplitude
}

/// Position in `[0, 1)` along a loop that takes `loop_ms` at `speed`.
pub fn loop_fraction(time_ms: f64, speed: f64, loop_ms: f64) -> f32 {
    if loop_ms <= 0.0 {
        return 0.0;
    }
    ((time_ms * speed).rem_euclid(loop_ms) / loop_ms) as f32
}

/// Uniform draw in `[0, max)`; zero when the range is empty.
pub(crate) fn uniform(rng: &mut dyn RngCore, max: f32) -> f32 {
    if max > 0.0 {
        rng.gen_range(0.0..max)
    } else {
        0.0
    }
}
