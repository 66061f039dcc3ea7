use cgmath::{InnerSpace, Point3, Rad, Vector3};
use vista_ngin::{
    camera::{Camera, Viewport},
    curve::{CatmullRomCurve3, Curve},
    data_structures::{
        color::Color,
        geometry::Topology,
        material::{Blending, Shading},
        scene_graph::{Fog, NodeId, NodeKind},
    },
    demos::{
        digital_path::{DEFAULT_PATH, DigitalPath, DigitalPathConfig},
        earth::{Earth, EarthConfig},
        loop_fraction,
        placement::{PlacementConfig, place_along},
        pulse_scale, spin_angle,
        starfield::{StarfieldConfig, starfield},
        wire_sphere::{WireSphere, WireSphereConfig},
    },
    flow::{Demo, Stage},
    pipelines::environment::EnvironmentUniform,
    post::{BloomSettings, Pass},
};

use crate::common::test_utils::{EPSILON, approx_eq, seeded};

mod common;

fn default_path() -> CatmullRomCurve3 {
    CatmullRomCurve3::closed(DEFAULT_PATH.iter().map(|p| Vector3::from(*p)).collect()).unwrap()
}

#[test]
fn spin_is_linear_in_time() {
    assert_eq!(spin_angle(0.0, 0.0002), Rad(0.0));
    assert!(approx_eq(spin_angle(5_000.0, 0.0002).0, 1.0, EPSILON));
    assert!(approx_eq(spin_angle(10_000.0, 0.00025).0, 2.5, EPSILON));
}

#[test]
fn pulse_stays_within_amplitude() {
    assert_eq!(pulse_scale(0.0, 0.002, 0.1), 1.0);
    for t in (0..10_000).step_by(37) {
        let scale = pulse_scale(t as f64, 0.002, 0.1);
        assert!((0.9 - 1e-6..=1.1 + 1e-6).contains(&scale), "scale {scale} at {t}");
    }
    // sin peaks a quarter period in.
    let peak = std::f64::consts::FRAC_PI_2 / 0.002;
    assert!(approx_eq(pulse_scale(peak, 0.002, 0.1), 1.1, EPSILON));
}

#[test]
fn loop_fraction_wraps() {
    assert_eq!(loop_fraction(0.0, 0.5, 20_000.0), 0.0);
    assert!(approx_eq(loop_fraction(20_000.0, 0.5, 20_000.0), 0.5, EPSILON));
    assert_eq!(loop_fraction(40_000.0, 0.5, 20_000.0), 0.0);
    assert!(approx_eq(loop_fraction(45_000.0, 0.5, 20_000.0), 0.125, EPSILON));
    assert_eq!(loop_fraction(1_000.0, 0.5, 0.0), 0.0);
}

#[test]
fn placement_count_and_offsets() {
    let path = default_path();
    let config = PlacementConfig::default();
    let instances = place_along(&path, &config, &mut seeded(5));

    assert_eq!(instances.len(), 55);
    for instance in &instances {
        assert!((0.0..1.0).contains(&instance.sample));
        for offset in [instance.offset.x, instance.offset.y, instance.offset.z] {
            assert!((0.0..0.4).contains(&offset), "offset {offset}");
        }
        for angle in instance.rotation {
            assert!((0.0..std::f32::consts::PI).contains(&angle.0));
        }
        assert!(approx_eq(instance.hue, 1.0 - instance.sample, 1e-6));
        let expected = path.point_at(instance.sample) + instance.offset;
        assert!((instance.position - expected).magnitude() < 1e-4);
    }
}

#[test]
fn placement_samples_stay_near_their_slot() {
    let instances = place_along(&default_path(), &PlacementConfig::default(), &mut seeded(9));
    for (i, instance) in instances.iter().enumerate() {
        let base = i as f32 / 55.0;
        let shift = (instance.sample - base).rem_euclid(1.0);
        assert!(shift < 0.1 + 1e-5, "instance {i} moved by {shift}");
    }
}

#[test]
fn placement_is_reproducible_from_a_seed() {
    let path = default_path();
    let config = PlacementConfig::default();
    let first = place_along(&path, &config, &mut seeded(42));
    let second = place_along(&path, &config, &mut seeded(42));
    let other = place_along(&path, &config, &mut seeded(43));
    assert_eq!(first, second);
    assert_ne!(first, other);
}

#[test]
fn placement_without_jitter_is_even() {
    let config = PlacementConfig {
        count: 4,
        sample_jitter: 0.0,
        position_jitter: 0.0,
    };
    let instances = place_along(&default_path(), &config, &mut seeded(0));
    let samples: Vec<f32> = instances.iter().map(|i| i.sample).collect();
    assert_eq!(samples, vec![0.0, 0.25, 0.5, 0.75]);
    assert!(instances.iter().all(|i| i.offset == Vector3::new(0.0, 0.0, 0.0)));
}

#[test]
fn starfield_points_sit_in_the_shell() {
    let config = StarfieldConfig::default();
    let stars = starfield(&config, &mut seeded(3));
    assert_eq!(stars.topology, Topology::Points);
    assert_eq!(stars.vertices.len(), 500);
    for vertex in &stars.vertices {
        let radius = Vector3::from(vertex.position).magnitude();
        assert!((25.0 - 1e-3..50.0 + 1e-3).contains(&radius), "radius {radius}");
    }
}

fn assemble<D: Demo>(config: D::Config, seed: u64) -> (D, Stage) {
    D::assemble(config, Viewport::new(800, 600), &mut seeded(seed)).unwrap()
}

#[test]
fn earth_layers_and_lighting() {
    let (earth, stage) = assemble::<Earth>(EarthConfig::default(), 1);
    let scene = &stage.scene;

    let material_of = |node: NodeId| match scene.node(node).unwrap().kind {
        NodeKind::Mesh { material, .. } => scene.material(material).unwrap().clone(),
        NodeKind::Group => panic!("expected a mesh"),
    };
    assert!(!material_of(earth.surface).is_blended());
    assert_eq!(material_of(earth.lights).blending, Blending::Additive);
    let clouds = material_of(earth.clouds);
    assert!(clouds.transparent);
    assert!(approx_eq(clouds.opacity, 0.8, 1e-6));
    assert!(matches!(
        material_of(earth.glow).shading,
        Shading::Fresnel { power, .. } if power == 4.0
    ));

    assert_eq!(
        scene.texture_sources(),
        vec![
            "img/4k_earth_daymap.jpg",
            "img/4k_earth_nightmap.jpg",
            "img/4k_earth_clouds.jpg",
        ]
    );

    let environment = EnvironmentUniform::from_scene(scene);
    assert_eq!(environment.sun_direction[3], 1.0);
    let sun = Vector3::new(
        environment.sun_direction[0],
        environment.sun_direction[1],
        environment.sun_direction[2],
    );
    assert!((sun - Vector3::new(-2.0, 0.5, 1.5).normalize()).magnitude() < 1e-5);
    assert_eq!(environment.fog[3], 0.0);
    assert_eq!(stage.post.bloom(), None);
}

#[test]
fn earth_layers_share_the_tilt() {
    let (earth, stage) = assemble::<Earth>(EarthConfig::default(), 1);
    let scene = &stage.scene;
    let surface = scene.node(earth.surface).unwrap();
    let group = surface.parent().unwrap();
    for layer in [earth.lights, earth.clouds, earth.glow] {
        assert_eq!(scene.node(layer).unwrap().parent(), Some(group));
    }
    let world = scene.world_transform(earth.clouds).unwrap();
    assert!(approx_eq(world.scale.x, 1.003, 1e-6));
}

#[test]
fn earth_layers_spin_at_their_own_rates() {
    let (mut earth, mut stage) = assemble::<Earth>(EarthConfig::default(), 1);
    let t = 5_000.0;
    earth.update(&mut stage, t);

    let angle = |node: NodeId| {
        let rotation = stage.scene.node(node).unwrap().transform.rotation;
        // Pure y rotation: (cos(a/2), 0, sin(a/2), 0).
        2.0 * rotation.v.y.atan2(rotation.s)
    };
    assert!(approx_eq(angle(earth.surface), 1.0, 1e-4));
    assert!(approx_eq(angle(earth.lights), 1.0, 1e-4));
    assert!(approx_eq(angle(earth.glow), 1.0, 1e-4));
    assert!(approx_eq(angle(earth.clouds), 1.25, 1e-4));
}

#[test]
fn earth_update_depends_only_on_time() {
    let (mut a, mut stage_a) = assemble::<Earth>(EarthConfig::default(), 1);
    let (mut b, mut stage_b) = assemble::<Earth>(EarthConfig::default(), 1);
    for t in [16.0, 32.0, 48.0, 3_000.0] {
        a.update(&mut stage_a, t);
    }
    b.update(&mut stage_b, 3_000.0);
    for node in [a.surface, a.clouds] {
        assert_eq!(
            stage_a.scene.node(node).unwrap().transform,
            stage_b.scene.node(node).unwrap().transform
        );
    }
}

#[test]
fn wire_sphere_overlay_follows_the_sphere() {
    let (mut sphere, mut stage) = assemble::<WireSphere>(WireSphereConfig::default(), 0);
    let wire = stage.scene.node(sphere.wireframe).unwrap();
    assert_eq!(wire.parent(), Some(sphere.sphere));
    let NodeKind::Mesh { material, .. } = wire.kind else {
        panic!("wireframe is not a mesh");
    };
    assert!(stage.scene.material(material).unwrap().wireframe);

    let peak = std::f64::consts::FRAC_PI_2 / 0.002;
    sphere.update(&mut stage, peak);
    let world = stage.scene.world_transform(sphere.wireframe).unwrap();
    assert!(approx_eq(world.scale.x, 1.1, 1e-4));
    assert!(approx_eq(world.scale.y, 1.1, 1e-4));

    let environment = EnvironmentUniform::from_scene(&stage.scene);
    assert!(environment.sky.iter().all(|c| approx_eq(*c, 1.0, 1e-5)));
    assert_eq!(environment.ground, [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(environment.sun_direction[3], 0.0);
}

#[test]
fn digital_path_composition() {
    let (path, stage) = assemble::<DigitalPath>(DigitalPathConfig::default(), 7);
    let scene = &stage.scene;

    assert_eq!(path.path().control_points().len(), DEFAULT_PATH.len());
    assert!(path.path().is_closed());
    // One tube plus one node per box.
    assert_eq!(scene.draw_list().len(), 1 + 55);
    assert!(
        scene
            .geometries()
            .all(|(_, geometry)| geometry.topology == Topology::Lines)
    );

    let first_box = scene.node(path.boxes()[0]).unwrap();
    let instance = path.instances()[0];
    assert_eq!(first_box.transform.position, instance.position);
    let NodeKind::Mesh { material, .. } = first_box.kind else {
        panic!("box is not a mesh");
    };
    assert_eq!(scene.material(material).unwrap().color, instance.color);
    for instance in path.instances() {
        assert_eq!(instance.color, Color::from_hsl(instance.hue, 1.0, 0.5));
    }

    assert!(matches!(scene.fog, Some(Fog::Exp2 { density, .. }) if density == 0.3));
    assert_eq!(
        stage.post.passes,
        vec![Pass::Render, Pass::Bloom(BloomSettings::default())]
    );
    let bloom = stage.post.bloom().unwrap();
    assert_eq!((bloom.strength, bloom.radius, bloom.threshold), (1.5, 0.0, 0.002));
}

#[test]
fn digital_path_layout_is_seeded() {
    let (a, _) = assemble::<DigitalPath>(DigitalPathConfig::default(), 21);
    let (b, _) = assemble::<DigitalPath>(DigitalPathConfig::default(), 21);
    assert_eq!(a.instances(), b.instances());
}

#[test]
fn digital_path_rejects_a_single_control_point() {
    let config = DigitalPathConfig {
        path: vec![Vector3::new(0.0, 0.0, 0.0)],
        ..Default::default()
    };
    assert!(DigitalPath::assemble(config, Viewport::new(800, 600), &mut seeded(0)).is_err());
}

#[test]
fn camera_aspect_clamps_empty_dimensions() {
    assert!(approx_eq(Viewport::new(800, 600).aspect(), 4.0 / 3.0, 1e-6));
    assert_eq!(Viewport::new(0, 600).aspect(), 1.0 / 600.0);
    assert_eq!(Viewport::new(800, 0).aspect(), 800.0);
}

#[test]
fn camera_looking_straight_up_or_down_has_a_finite_view() {
    let mut camera = Camera::new((0.0, 0.0, 0.0));
    for target in [Point3::new(0.0, 5.0, 0.0), Point3::new(0.0, -5.0, 0.0)] {
        camera.look_at(target);
        assert!(approx_eq(camera.forward().x, 0.0, 1e-6));
        let view: [[f32; 4]; 4] = camera.view_matrix().into();
        assert!(view.iter().flatten().all(|v| v.is_finite()), "{view:?}");
    }
}
