//! Render pipelines.
//!
//! - `scene` draws meshes of every topology with one shared shader
//! - `environment` holds the lights and fog uniform
//! - `bloom` is the bright-pass, blur and composite post-processing chain

pub mod bloom;
pub mod environment;
pub mod scene;
