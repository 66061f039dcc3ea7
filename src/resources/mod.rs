/**
 * This module contains all logic for loading textures from external files.
 */
pub mod texture;

pub use texture::{load_binary, load_texture, load_textures};
