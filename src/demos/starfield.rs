//! Random point shell around the earth.

use std::f32::consts::PI;

use rand::RngCore;

use crate::{
    data_structures::{color::Color, geometry::Geometry},
    demos::uniform,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StarfieldConfig {
    pub count: usize,
    pub min_radius: f32,
    pub max_radius: f32,
    pub hue: f32,
    pub saturation: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            count: 500,
            min_radius: 25.0,
            max_radius: 50.0,
            hue: 0.6,
            saturation: 0.2,
        }
    }
}

/// Points uniformly distributed over directions, at radii in
/// `[min_radius, max_radius)`, each with a random lightness.
pub fn starfield(config: &StarfieldConfig, rng: &mut dyn RngCore) -> Geometry {
    let mut positions = Vec::with_capacity(config.count);
    let mut colours = Vec::with_capacity(config.count);
    let spread = (config.max_radius - config.min_radius).max(0.0);

    for _ in 0..config.count {
        let radius = config.min_radius + uniform(rng, spread);
        let theta = 2.0 * PI * uniform(rng, 1.0);
        let phi = (2.0 * uniform(rng, 1.0) - 1.0).clamp(-1.0, 1.0).acos();
        positions.push([
            radius * phi.sin() * theta.cos(),
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
        ]);
        colours.push(Color::from_hsl(
            config.hue,
            config.saturation,
            uniform(rng, 1.0),
        ));
    }

    Geometry::points("starfield", &positions, &colours)
}
