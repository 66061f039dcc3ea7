//! Rotating textured earth with night lights, clouds, an atmosphere glow and stars.

use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use rand::RngCore;

use crate::{
    camera::{Camera, Projection, Viewport},
    data_structures::{
        color::Color,
        geometry::Geometry,
        instance::Instance,
        material::{Blending, Material},
        scene_graph::{Light, Node, NodeId, SceneGraph},
    },
    demos::{
        spin_angle,
        starfield::{StarfieldConfig, starfield},
    },
    flow::{Demo, Stage},
    post::PostProcess,
};

#[derive(Clone, Debug, PartialEq)]
pub struct EarthConfig {
    pub fov: Deg<f32>,
    pub near: f32,
    pub far: f32,
    pub camera_distance: f32,
    /// Axial tilt of the whole earth group, about z.
    pub tilt: Deg<f32>,
    pub radius: f32,
    pub detail: u32,
    pub day_map: String,
    pub night_map: String,
    pub cloud_map: String,
    pub cloud_opacity: f32,
    pub cloud_scale: f32,
    pub glow_scale: f32,
    pub glow_rim: Color,
    pub glow_facing: Color,
    pub glow_bias: f32,
    pub glow_scale_factor: f32,
    pub glow_power: f32,
    /// Radians per millisecond for the surface, night lights and glow.
    pub spin_rate: f64,
    pub cloud_spin_rate: f64,
    pub sun_position: Vector3<f32>,
    pub stars: StarfieldConfig,
}

impl Default for EarthConfig {
    fn default() -> Self {
        Self {
            fov: Deg(75.0),
            near: 0.1,
            far: 1000.0,
            camera_distance: 5.0,
            tilt: Deg(-23.4),
            radius: 1.0,
            detail: 12,
            day_map: "img/4k_earth_daymap.jpg".to_string(),
            night_map: "img/4k_earth_nightmap.jpg".to_string(),
            cloud_map: "img/4k_earth_clouds.jpg".to_string(),
            cloud_opacity: 0.8,
            cloud_scale: 1.003,
            glow_scale: 1.004,
            glow_rim: Color::from_hex(0x0088ff),
            glow_facing: Color::from_hex(0x000000),
            glow_bias: 0.1,
            glow_scale_factor: 1.0,
            glow_power: 4.0,
            spin_rate: 0.0002,
            cloud_spin_rate: 0.00025,
            sun_position: Vector3::new(-2.0, 0.5, 1.5),
            stars: StarfieldConfig::default(),
        }
    }
}

#[derive(Debug)]
pub struct Earth {
    pub surface: NodeId,
    pub lights: NodeId,
    pub clouds: NodeId,
    pub glow: NodeId,
    spin_rate: f64,
    cloud_spin_rate: f64,
}

impl Demo for Earth {
    type Config = EarthConfig;
    const TITLE: &'static str = "Earth";

    fn assemble(
        config: EarthConfig,
        viewport: Viewport,
        rng: &mut dyn RngCore,
    ) -> anyhow::Result<(Self, Stage)> {
        let camera = Camera::new((0.0, 0.0, config.camera_distance));
        let projection = Projection::new(viewport, config.fov, config.near, config.far);
        let mut scene = SceneGraph::new();

        let group = scene.add(Node::group("earth group").with_transform(
            Instance::new().with_rotation(Quaternion::from_angle_z(config.tilt)),
        ));
        let sphere = scene.add_geometry(Geometry::icosahedron(config.radius, config.detail));

        let day = scene.add_material(
            Material::standard("earth day", Color::WHITE).with_map(config.day_map),
        );
        let night = scene.add_material(
            Material::basic("earth night lights", Color::WHITE)
                .with_map(config.night_map)
                .with_blending(Blending::Additive),
        );
        let clouds = scene.add_material(
            Material::standard("earth clouds", Color::WHITE)
                .with_map(config.cloud_map)
                .with_blending(Blending::Additive)
                .with_opacity(config.cloud_opacity),
        );
        let glow = scene.add_material(
            Material::fresnel(
                "earth glow",
                config.glow_facing,
                config.glow_rim,
                config.glow_bias,
                config.glow_scale_factor,
                config.glow_power,
            )
            .with_blending(Blending::Additive),
        );

        // Opaque surface first, additive shells after it.
        let surface = scene.add_child(group, Node::mesh("earth", sphere, day))?;
        let lights = scene.add_child(group, Node::mesh("night lights", sphere, night))?;
        let clouds = scene.add_child(
            group,
            Node::mesh("clouds", sphere, clouds)
                .with_transform(Instance::new().with_uniform_scale(config.cloud_scale)),
        )?;
        let glow = scene.add_child(
            group,
            Node::mesh("glow", sphere, glow)
                .with_transform(Instance::new().with_uniform_scale(config.glow_scale)),
        )?;

        let stars = scene.add_geometry(starfield(&config.stars, rng));
        let star_material = scene.add_material(Material::points("stars"));
        scene.add(Node::mesh("stars", stars, star_material));

        scene.add_light(Light::Directional {
            color: Color::WHITE,
            intensity: 1.0,
            position: config.sun_position,
        });

        let earth = Earth {
            surface,
            lights,
            clouds,
            glow,
            spin_rate: config.spin_rate,
            cloud_spin_rate: config.cloud_spin_rate,
        };
        let stage = Stage {
            camera,
            projection,
            scene,
            post: PostProcess::new(),
        };
        Ok((earth, stage))
    }

    fn update(&mut self, stage: &mut Stage, time_ms: f64) {
        let spin = Quaternion::from_angle_y(spin_angle(time_ms, self.spin_rate));
        let cloud_spin = Quaternion::from_angle_y(spin_angle(time_ms, self.cloud_spin_rate));
        for (node, rotation) in [
            (self.surface, spin),
            (self.lights, spin),
            (self.clouds, cloud_spin),
            (self.glow, spin),
        ] {
            match stage.scene.transform_mut(node) {
                Ok(transform) => transform.rotation = rotation,
                Err(e) => log::warn!("Earth update: {}", e),
            }
        }
    }
}
