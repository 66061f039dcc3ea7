//! vista-ngin
//!
//! Three small wgpu scene demos that run natively and in the browser: a
//! rotating textured earth, a pulsing wireframe sphere and a bloom-lit
//! flythrough along a closed spline. Each demo is a pure scene assembler plus
//! a time-driven update; the rest of the crate is the machinery they share.
//!
//! High-level modules
//! - `camera`: look-at camera, projection and the camera uniform
//! - `clock`: monotonic frame clocks, including a manual one for tests
//! - `context`: window surface, device and queue
//! - `curve`: Catmull-Rom splines with arc-length parameterization
//! - `data_structures`: geometry generators, materials, transforms and the scene graph
//! - `demos`: the three demo compositions
//! - `flow`: the frame driver and the winit event loop
//! - `pipelines`: scene and bloom render pipelines
//! - `post`: post-processing chain description
//! - `render`: draws a stage through the pipelines
//! - `resources`: texture loading on native and web
//!

pub mod camera;
pub mod clock;
pub mod context;
pub mod curve;
pub mod data_structures;
pub mod demos;
pub mod flow;
pub mod pipelines;
pub mod post;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::PhysicalSize;
pub use winit::event::WindowEvent;
