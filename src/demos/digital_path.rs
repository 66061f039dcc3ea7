//! Camera flythrough along a closed spline, inside a tube drawn as glowing edges.

use cgmath::{Deg, EuclideanSpace, Point3, Vector3};
use rand::RngCore;

use crate::{
    camera::{Camera, Projection, Viewport},
    curve::{CatmullRomCurve3, Curve},
    data_structures::{
        color::Color,
        geometry::Geometry,
        instance::Instance,
        material::Material,
        scene_graph::{Fog, Light, Node, NodeId, SceneGraph},
    },
    demos::{
        loop_fraction,
        placement::{DecorativeInstance, PlacementConfig, place_along},
    },
    flow::{Demo, Stage},
    post::{BloomSettings, Pass, PostProcess},
};

/// Control points of the default closed path.
pub const DEFAULT_PATH: [[f32; 3]; 12] = [
    [10.0, 0.0, 0.0],
    [8.5, 1.8, 5.5],
    [4.2, 3.1, 9.0],
    [-1.0, 2.2, 10.4],
    [-5.8, -0.6, 8.7],
    [-9.2, -2.9, 4.6],
    [-10.6, -3.4, -0.4],
    [-8.9, -1.5, -5.2],
    [-4.7, 1.2, -8.9],
    [0.3, 3.4, -10.1],
    [5.1, 2.7, -8.6],
    [8.8, 0.8, -5.0],
];

#[derive(Clone, Debug, PartialEq)]
pub struct DigitalPathConfig {
    pub fov: Deg<f32>,
    pub near: f32,
    pub far: f32,
    pub path: Vec<Vector3<f32>>,
    pub tube_segments: usize,
    pub tube_radius: f32,
    pub tube_radial_segments: usize,
    /// Angle in degrees above which tube faces get an edge line.
    pub tube_edge_threshold: f32,
    pub tube_color: Color,
    pub box_size: f32,
    pub box_edge_threshold: f32,
    pub placement: PlacementConfig,
    /// Duration of one loop at speed 1, in milliseconds.
    pub loop_ms: f64,
    pub speed: f64,
    /// How far ahead along the path the camera looks, in normalized arc length.
    pub look_ahead: f32,
    pub fog_color: Color,
    pub fog_density: f32,
    pub sky: Color,
    pub ground: Color,
    pub bloom: BloomSettings,
}

impl Default for DigitalPathConfig {
    fn default() -> Self {
        Self {
            fov: Deg(75.0),
            near: 0.1,
            far: 1000.0,
            path: DEFAULT_PATH.iter().map(|p| Vector3::from(*p)).collect(),
            tube_segments: 222,
            tube_radius: 0.65,
            tube_radial_segments: 16,
            tube_edge_threshold: 0.2,
            tube_color: Color::from_hex(0xff0000),
            box_size: 0.2,
            box_edge_threshold: 0.3,
            placement: PlacementConfig::default(),
            loop_ms: 20_000.0,
            speed: 0.5,
            look_ahead: 0.01,
            fog_color: Color::from_hex(0x000000),
            fog_density: 0.3,
            sky: Color::from_hex(0xffffff),
            ground: Color::from_hex(0x444444),
            bloom: BloomSettings::default(),
        }
    }
}

#[derive(Debug)]
pub struct DigitalPath {
    path: CatmullRomCurve3,
    instances: Vec<DecorativeInstance>,
    boxes: Vec<NodeId>,
    loop_ms: f64,
    speed: f64,
    look_ahead: f32,
}

impl DigitalPath {
    pub fn path(&self) -> &CatmullRomCurve3 {
        &self.path
    }

    pub fn instances(&self) -> &[DecorativeInstance] {
        &self.instances
    }

    /// Scene nodes of the box edge lines, in instance order.
    pub fn boxes(&self) -> &[NodeId] {
        &self.boxes
    }

    /// Places `camera` on the path for `time_ms`, looking slightly ahead.
    pub fn fly(&self, camera: &mut Camera, time_ms: f64) {
        let p = loop_fraction(time_ms, self.speed, self.loop_ms);
        camera.position = Point3::from_vec(self.path.point_at(p));
        camera.look_at(Point3::from_vec(self.path.point_at(p + self.look_ahead)));
    }
}

impl Demo for DigitalPath {
    type Config = DigitalPathConfig;
    const TITLE: &'static str = "Digital path";

    fn assemble(
        config: DigitalPathConfig,
        viewport: Viewport,
        rng: &mut dyn RngCore,
    ) -> anyhow::Result<(Self, Stage)> {
        let path = CatmullRomCurve3::closed(config.path)?;
        let projection = Projection::new(viewport, config.fov, config.near, config.far);
        let mut scene = SceneGraph::new();
        scene.fog = Some(Fog::Exp2 {
            color: config.fog_color,
            density: config.fog_density,
        });

        let tube = Geometry::tube(
            &path,
            config.tube_segments,
            config.tube_radius,
            config.tube_radial_segments,
            false,
        );
        let tube_edges = scene.add_geometry(tube.edges(config.tube_edge_threshold));
        let tube_material = scene.add_material(Material::line("tube edges", config.tube_color));
        scene.add(Node::mesh("tube", tube_edges, tube_material));

        let box_edges = scene.add_geometry(
            Geometry::cuboid(config.box_size, config.box_size, config.box_size)
                .edges(config.box_edge_threshold),
        );
        let instances = place_along(&path, &config.placement, rng);
        let boxes = instances
            .iter()
            .enumerate()
            .map(|(i, instance)| {
                let material =
                    scene.add_material(Material::line(format!("box {i} edges"), instance.color));
                let [x, y, z] = instance.rotation;
                let transform = Instance::new()
                    .with_position(instance.position)
                    .with_rotation(Instance::euler(x, y, z));
                scene.add(
                    Node::mesh(format!("box {i}"), box_edges, material).with_transform(transform),
                )
            })
            .collect();

        scene.add_light(Light::Hemisphere {
            sky: config.sky,
            ground: config.ground,
            intensity: 1.0,
        });

        let demo = DigitalPath {
            path,
            instances,
            boxes,
            loop_ms: config.loop_ms,
            speed: config.speed,
            look_ahead: config.look_ahead,
        };
        let mut camera = Camera::new((0.0, 0.0, 5.0));
        demo.fly(&mut camera, 0.0);

        let stage = Stage {
            camera,
            projection,
            scene,
            post: PostProcess::new()
                .with_pass(Pass::Render)
                .with_pass(Pass::Bloom(config.bloom)),
        };
        Ok((demo, stage))
    }

    fn update(&mut self, stage: &mut Stage, time_ms: f64) {
        self.fly(&mut stage.camera, time_ms);
    }
}
