//! Scattering decorative objects along a curve.

use std::f32::consts::PI;

use cgmath::{Rad, Vector3};
use rand::RngCore;

use crate::{curve::Curve, data_structures::color::Color, demos::uniform};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementConfig {
    pub count: usize,
    /// Upper bound of the random shift added to each evenly spaced sample.
    pub sample_jitter: f32,
    /// Upper bound of the random offset added to each coordinate.
    pub position_jitter: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            count: 55,
            sample_jitter: 0.1,
            position_jitter: 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecorativeInstance {
    /// Normalized arc length the instance was sampled at, in `[0, 1)`.
    pub sample: f32,
    /// Curve point at `sample`.
    pub anchor: Vector3<f32>,
    /// Componentwise in `[0, position_jitter)`.
    pub offset: Vector3<f32>,
    pub position: Vector3<f32>,
    /// Euler angles (X, Y, Z), each in `[0, π)`.
    pub rotation: [Rad<f32>; 3],
    /// `1 - sample`
    pub hue: f32,
    pub color: Color,
}

/// Places `config.count` instances along `curve`.
///
/// Instance `i` samples the curve at `(i / count + U(0, sample_jitter)) mod 1`.
/// The offset only ever pushes towards positive x, y and z. Random numbers
/// are drawn per instance in a fixed order (sample, x, y, z, rotations), so
/// a seeded generator reproduces the layout exactly.
pub fn place_along<C: Curve + ?Sized>(
    curve: &C,
    config: &PlacementConfig,
    rng: &mut dyn RngCore,
) -> Vec<DecorativeInstance> {
    (0..config.count)
        .map(|i| {
            let base = i as f32 / config.count as f32;
            let mut sample = (base + uniform(rng, config.sample_jitter)).rem_euclid(1.0);
            if sample >= 1.0 {
                sample = 0.0;
            }
            let anchor = curve.point_at(sample);
            let offset = Vector3::new(
                uniform(rng, config.position_jitter),
                uniform(rng, config.position_jitter),
                uniform(rng, config.position_jitter),
            );
            let rotation = [
                Rad(uniform(rng, PI)),
                Rad(uniform(rng, PI)),
                Rad(uniform(rng, PI)),
            ];
            let hue = 1.0 - sample;

            DecorativeInstance {
                sample,
                anchor,
                offset,
                position: anchor + offset,
                rotation,
                hue,
                color: Color::from_hsl(hue, 1.0, 0.5),
            }
        })
        .collect()
}
