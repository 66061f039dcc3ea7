#![allow(dead_code)]

use cgmath::{Point3, Vector3};
use rand::{SeedableRng, rngs::StdRng};
use vista_ngin::flow::{FrameRenderer, Stage};

/// Renderer double that remembers what each frame looked like.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    renders: u32,
    camera_positions: Vec<Point3<f32>>,
    aspects: Vec<f32>,
    fail_next: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> u32 {
        self.renders
    }

    pub fn camera_positions(&self) -> &[Point3<f32>] {
        &self.camera_positions
    }

    pub fn aspects(&self) -> &[f32] {
        &self.aspects
    }

    /// Makes the next `render` call return an error.
    pub fn fail_next(&mut self) {
        self.fail_next = true;
    }
}

impl FrameRenderer for RecordingRenderer {
    fn render(&mut self, stage: &Stage) -> anyhow::Result<()> {
        if std::mem::take(&mut self.fail_next) {
            anyhow::bail!("device lost");
        }
        self.renders += 1;
        self.camera_positions.push(stage.camera.position);
        self.aspects.push(stage.projection.aspect());
        Ok(())
    }
}

pub(crate) const EPSILON: f32 = 1e-4;

pub(crate) fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}

pub(crate) fn approx_eq_vec(a: Vector3<f32>, b: Vector3<f32>, epsilon: f32) -> bool {
    approx_eq(a.x, b.x, epsilon) && approx_eq(a.y, b.y, epsilon) && approx_eq(a.z, b.z, epsilon)
}

pub(crate) fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
