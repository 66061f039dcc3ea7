//! Scene data structures.
//!
//! - `color` holds sRGB colours with hex and HSL constructors
//! - `geometry` holds vertex/index data and the shape generators
//! - `instance` holds per-node transformation data and its GPU layout
//! - `material` describes how a surface is shaded and blended
//! - `scene_graph` enables hierarchical scene organization
//! - `texture` contains the GPU texture wrapper and creation utilities

pub mod color;
pub mod geometry;
pub mod instance;
pub mod material;
pub mod scene_graph;
pub mod texture;
