use cgmath::{EuclideanSpace, InnerSpace, Vector3};
use rand::RngCore;
use vista_ngin::{
    camera::{Camera, Projection, Viewport},
    clock::{FrameClock, ManualClock},
    curve::Curve,
    data_structures::scene_graph::SceneGraph,
    demos::digital_path::{DigitalPath, DigitalPathConfig},
    flow::{Demo, FrameDriver, FrameStatus, RunOptions, Stage},
    post::PostProcess,
};

use crate::common::test_utils::{RecordingRenderer, approx_eq, approx_eq_vec, seeded};

mod common;

/// Demo that only records the times it was updated with.
#[derive(Default)]
struct TimeLog {
    updates: Vec<f64>,
}

impl Demo for TimeLog {
    type Config = ();
    const TITLE: &'static str = "Time log";

    fn assemble(
        _: (),
        viewport: Viewport,
        _: &mut dyn RngCore,
    ) -> anyhow::Result<(Self, Stage)> {
        let stage = Stage {
            camera: Camera::new((0.0, 0.0, 5.0)),
            projection: Projection::new(viewport, cgmath::Deg(75.0), 0.1, 100.0),
            scene: SceneGraph::new(),
            post: PostProcess::new(),
        };
        Ok((TimeLog::default(), stage))
    }

    fn update(&mut self, stage: &mut Stage, time_ms: f64) {
        self.updates.push(time_ms);
        stage.camera.position.x = time_ms as f32;
    }
}

fn time_log_driver(clock: ManualClock) -> FrameDriver<TimeLog, ManualClock> {
    FrameDriver::assemble((), Viewport::new(800, 600), &mut seeded(0), clock).unwrap()
}

#[test]
fn each_step_updates_and_renders_once() {
    let clock = ManualClock::new(0.0);
    let mut driver = time_log_driver(clock.clone());
    let mut renderer = RecordingRenderer::new();

    for _ in 0..3 {
        driver.step(&mut renderer).unwrap();
        clock.advance(16.0);
    }

    assert_eq!(renderer.renders(), 3);
    assert_eq!(driver.frames(), 3);
    assert_eq!(driver.demo().updates, vec![0.0, 16.0, 32.0]);
    // The update ran before the frame was drawn.
    assert_eq!(renderer.camera_positions()[2].x, 32.0);
}

#[test]
fn cancelled_driver_stops_without_rendering() {
    let clock = ManualClock::new(0.0);
    let mut driver = time_log_driver(clock);
    let mut renderer = RecordingRenderer::new();
    let handle = driver.cancel_handle();

    assert!(matches!(driver.step(&mut renderer).unwrap(), FrameStatus::Rendered { .. }));
    assert!(!handle.is_cancelled());
    handle.cancel();
    assert!(handle.is_cancelled());
    assert!(!driver.is_running());

    assert_eq!(driver.step(&mut renderer).unwrap(), FrameStatus::Stopped);
    assert_eq!(driver.step_at(100.0, &mut renderer).unwrap(), FrameStatus::Stopped);
    assert_eq!(renderer.renders(), 1);
    assert_eq!(driver.demo().updates.len(), 1);
}

#[test]
fn resize_applies_on_next_frame() {
    let mut driver = time_log_driver(ManualClock::new(0.0));
    let mut renderer = RecordingRenderer::new();

    driver.step(&mut renderer).unwrap();
    driver.resize(Viewport::new(1920, 1080));
    assert!(approx_eq(driver.stage().projection.aspect(), 800.0 / 600.0, 1e-6));
    driver.step(&mut renderer).unwrap();

    assert!(approx_eq(renderer.aspects()[0], 4.0 / 3.0, 1e-6));
    assert!(approx_eq(renderer.aspects()[1], 16.0 / 9.0, 1e-6));
}

#[test]
fn zero_sized_viewport_keeps_a_finite_aspect() {
    let mut driver = time_log_driver(ManualClock::new(0.0));
    let mut renderer = RecordingRenderer::new();
    driver.resize(Viewport::new(0, 600));
    driver.step(&mut renderer).unwrap();
    let aspect = renderer.aspects()[0];
    assert!(aspect.is_finite() && aspect > 0.0);
    assert!(driver.stage().projection.calc_matrix().x.x.is_finite());
}

#[test]
fn time_never_runs_backwards() {
    let mut driver = time_log_driver(ManualClock::new(0.0));
    let mut renderer = RecordingRenderer::new();

    assert_eq!(
        driver.step_at(500.0, &mut renderer).unwrap(),
        FrameStatus::Rendered { time_ms: 500.0 }
    );
    assert_eq!(
        driver.step_at(200.0, &mut renderer).unwrap(),
        FrameStatus::Rendered { time_ms: 500.0 }
    );
    assert_eq!(
        driver.step_at(f64::NAN, &mut renderer).unwrap(),
        FrameStatus::Rendered { time_ms: 500.0 }
    );
    driver.step_at(700.0, &mut renderer).unwrap();
    assert_eq!(driver.demo().updates, vec![500.0, 500.0, 500.0, 700.0]);

    // With no earlier frame to hold, a NaN first frame starts at zero.
    let mut fresh = time_log_driver(ManualClock::new(0.0));
    assert_eq!(
        fresh.step_at(f64::NAN, &mut renderer).unwrap(),
        FrameStatus::Rendered { time_ms: 0.0 }
    );
    assert_eq!(fresh.demo().updates, vec![0.0]);
}

#[test]
fn flythrough_starting_at_nan_keeps_the_camera_finite() {
    let mut driver = FrameDriver::<DigitalPath, _>::assemble(
        DigitalPathConfig::default(),
        Viewport::new(800, 600),
        &mut seeded(2),
        ManualClock::new(0.0),
    )
    .unwrap();
    let mut renderer = RecordingRenderer::new();
    driver.step_at(f64::NAN, &mut renderer).unwrap();
    let position = renderer.camera_positions()[0];
    assert!(position.x.is_finite() && position.y.is_finite() && position.z.is_finite());
}

#[test]
fn render_errors_propagate_without_counting_a_frame() {
    let mut driver = time_log_driver(ManualClock::new(0.0));
    let mut renderer = RecordingRenderer::new();
    renderer.fail_next();
    assert!(driver.step(&mut renderer).is_err());
    assert_eq!(driver.frames(), 0);
    assert!(driver.step(&mut renderer).is_ok());
    assert_eq!(driver.frames(), 1);
}

#[test]
fn manual_clock_clones_share_time() {
    let clock = ManualClock::new(10.0);
    let mut view = clock.clone();
    clock.advance(5.0);
    assert_eq!(view.now_ms(), 15.0);
    clock.set(3.0);
    assert_eq!(view.now_ms(), 3.0);
}

#[test]
fn seeded_run_options_reproduce_the_rng() {
    let options = RunOptions {
        seed: Some(7),
        max_frames: None,
    };
    assert_eq!(options.rng().next_u64(), options.rng().next_u64());
}

#[test]
fn flythrough_camera_follows_the_path() {
    let clock = ManualClock::new(0.0);
    let config = DigitalPathConfig::default();
    let placement = config.placement;
    let mut driver = FrameDriver::<DigitalPath, _>::assemble(
        config,
        Viewport::new(800, 600),
        &mut seeded(11),
        clock.clone(),
    )
    .unwrap();
    let mut renderer = RecordingRenderer::new();

    assert_eq!(driver.demo().instances().len(), placement.count);
    assert_eq!(driver.demo().boxes().len(), placement.count);

    let start = driver.demo().path().point_at(0.0);
    driver.step(&mut renderer).unwrap();
    assert!(approx_eq_vec(
        renderer.camera_positions()[0].to_vec(),
        start,
        1e-4
    ));

    // At speed 0.5 a 20 s loop takes 40 s of frame time.
    clock.set(40_000.0);
    driver.step(&mut renderer).unwrap();
    assert!(approx_eq_vec(
        renderer.camera_positions()[1].to_vec(),
        start,
        1e-3
    ));

    // A quarter of the way round, looking further along the path.
    clock.set(10_000.0 + 40_000.0);
    driver.step(&mut renderer).unwrap();
    let path = driver.demo().path();
    let position = path.point_at(0.25);
    let ahead = path.point_at(0.26);
    let camera = driver.stage().camera;
    assert!(approx_eq_vec(camera.position.to_vec(), position, 1e-3));
    let expected = (ahead - position).normalize();
    assert!(camera.forward().dot(expected) > 0.999);
}

#[test]
fn flythrough_in_a_vertical_plane_keeps_a_finite_view() {
    // A loop in the xy-plane looks straight up and down along the way.
    let path = (0..8)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / 8.0;
            Vector3::new(5.0 * angle.cos(), 5.0 * angle.sin(), 0.0)
        })
        .collect();
    let clock = ManualClock::new(0.0);
    let mut driver = FrameDriver::<DigitalPath, _>::assemble(
        DigitalPathConfig {
            path,
            ..Default::default()
        },
        Viewport::new(800, 600),
        &mut seeded(4),
        clock.clone(),
    )
    .unwrap();
    let mut renderer = RecordingRenderer::new();

    let mut vertical = false;
    for frame in 0..400 {
        clock.set(frame as f64 * 100.0);
        driver.step(&mut renderer).unwrap();
        let camera = driver.stage().camera;
        vertical |= camera.forward().y.abs() > 0.99;
        let view: [[f32; 4]; 4] = camera.view_matrix().into();
        assert!(
            view.iter().flatten().all(|v| v.is_finite()),
            "frame {frame}: forward {:?}",
            camera.forward()
        );
    }
    assert!(vertical);
}
