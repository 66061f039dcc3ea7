//! Flat-shaded icosahedron with a wireframe overlay, spinning and pulsing.

use cgmath::{Deg, Quaternion, Rotation3};
use rand::RngCore;

use crate::{
    camera::{Camera, Projection, Viewport},
    data_structures::{
        color::Color,
        geometry::Geometry,
        material::Material,
        scene_graph::{Light, Node, NodeId, SceneGraph},
    },
    demos::{pulse_scale, spin_angle},
    flow::{Demo, Stage},
    post::PostProcess,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WireSphereConfig {
    pub fov: Deg<f32>,
    pub near: f32,
    pub far: f32,
    pub camera_distance: f32,
    pub radius: f32,
    pub detail: u32,
    pub color: Color,
    pub wire_color: Color,
    pub spin_rate: f64,
    pub pulse_rate: f64,
    pub pulse_amplitude: f32,
    pub sky: Color,
    pub ground: Color,
}

impl Default for WireSphereConfig {
    fn default() -> Self {
        Self {
            fov: Deg(75.0),
            near: 0.1,
            far: 10.0,
            camera_distance: 2.0,
            radius: 1.0,
            detail: 2,
            color: Color::from_hex(0xffffff),
            wire_color: Color::from_hex(0xffffff),
            spin_rate: 0.0001,
            pulse_rate: 0.002,
            pulse_amplitude: 0.1,
            sky: Color::from_hex(0xffffff),
            ground: Color::from_hex(0x000000),
        }
    }
}

#[derive(Debug)]
pub struct WireSphere {
    pub sphere: NodeId,
    pub wireframe: NodeId,
    spin_rate: f64,
    pulse_rate: f64,
    pulse_amplitude: f32,
}

impl Demo for WireSphere {
    type Config = WireSphereConfig;
    const TITLE: &'static str = "Wire sphere";

    fn assemble(
        config: WireSphereConfig,
        viewport: Viewport,
        _rng: &mut dyn RngCore,
    ) -> anyhow::Result<(Self, Stage)> {
        let camera = Camera::new((0.0, 0.0, config.camera_distance));
        let projection = Projection::new(viewport, config.fov, config.near, config.far);
        let mut scene = SceneGraph::new();

        let geometry = scene.add_geometry(Geometry::icosahedron(config.radius, config.detail));
        let solid = scene
            .add_material(Material::standard("sphere", config.color).with_flat_shading());
        let wire = scene
            .add_material(Material::basic("sphere wireframe", config.wire_color).with_wireframe());

        let sphere = scene.add(Node::mesh("sphere", geometry, solid));
        // Child so it inherits the spin and pulse.
        let wireframe = scene.add_child(sphere, Node::mesh("wireframe", geometry, wire))?;

        scene.add_light(Light::Hemisphere {
            sky: config.sky,
            ground: config.ground,
            intensity: 1.0,
        });

        let demo = WireSphere {
            sphere,
            wireframe,
            spin_rate: config.spin_rate,
            pulse_rate: config.pulse_rate,
            pulse_amplitude: config.pulse_amplitude,
        };
        let stage = Stage {
            camera,
            projection,
            scene,
            post: PostProcess::new(),
        };
        Ok((demo, stage))
    }

    fn update(&mut self, stage: &mut Stage, time_ms: f64) {
        let rotation = Quaternion::from_angle_y(spin_angle(time_ms, self.spin_rate));
        let scale = pulse_scale(time_ms, self.pulse_rate, self.pulse_amplitude);
        match stage.scene.transform_mut(self.sphere) {
            Ok(transform) => {
                transform.rotation = rotation;
                transform.set_uniform_scale(scale);
            }
            Err(e) => log::warn!("Wire sphere update: {}", e),
        }
    }
}
