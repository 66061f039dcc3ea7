//! Surface descriptions shared by meshes.
//!
//! A [`Material`] is plain data. The renderer turns it into a
//! [`MaterialUniform`] plus an optional texture once, the first time a mesh
//! that uses it is drawn.

use crate::data_structures::color::Color;

/// How a surface reacts to light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shading {
    /// Colour is taken as is (lines, points, basic meshes).
    Unlit,
    /// Hemisphere plus directional light. `flat` uses per-face normals.
    Lit { flat: bool },
    /// View-dependent rim glow.
    ///
    /// `factor = bias + scale * (1 + dot(view_dir, normal))^power`, and the
    /// final colour mixes from the material colour to `rim` by that factor.
    Fresnel {
        rim: Color,
        bias: f32,
        scale: f32,
        power: f32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Blending {
    #[default]
    Normal,
    Additive,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub shading: Shading,
    pub color: Color,
    /// Asset path of a colour map, relative to the asset root.
    pub map: Option<String>,
    pub blending: Blending,
    pub transparent: bool,
    pub opacity: f32,
    /// Draw a triangle mesh as its edges instead of filled faces.
    pub wireframe: bool,
    pub vertex_colors: bool,
    /// Whether scene fog applies to this material.
    pub fog: bool,
}

impl Material {
    fn with_shading(name: impl Into<String>, shading: Shading, color: Color) -> Self {
        Self {
            name: name.into(),
            shading,
            color,
            map: None,
            blending: Blending::Normal,
            transparent: false,
            opacity: 1.0,
            wireframe: false,
            vertex_colors: false,
            fog: true,
        }
    }

    /// Lit, smooth shaded.
    pub fn standard(name: impl Into<String>, color: Color) -> Self {
        Self::with_shading(name, Shading::Lit { flat: false }, color)
    }

    pub fn basic(name: impl Into<String>, color: Color) -> Self {
        Self::with_shading(name, Shading::Unlit, color)
    }

    pub fn line(name: impl Into<String>, color: Color) -> Self {
        Self::with_shading(name, Shading::Unlit, color)
    }

    pub fn points(name: impl Into<String>) -> Self {
        Self::with_shading(name, Shading::Unlit, Color::WHITE).with_vertex_colors()
    }

    pub fn fresnel(
        name: impl Into<String>,
        facing: Color,
        rim: Color,
        bias: f32,
        scale: f32,
        power: f32,
    ) -> Self {
        Self::with_shading(
            name,
            Shading::Fresnel {
                rim,
                bias,
                scale,
                power,
            },
            facing,
        )
    }

    pub fn with_map(mut self, path: impl Into<String>) -> Self {
        self.map = Some(path.into());
        self
    }

    pub fn with_blending(mut self, blending: Blending) -> Self {
        self.blending = blending;
        self
    }

    /// Marks the material as alpha blended with the given opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.transparent = true;
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn with_flat_shading(mut self) -> Self {
        if let Shading::Lit { flat } = &mut self.shading {
            *flat = true;
        }
        self
    }

    pub fn with_wireframe(mut self) -> Self {
        self.wireframe = true;
        self
    }

    pub fn with_vertex_colors(mut self) -> Self {
        self.vertex_colors = true;
        self
    }

    pub fn without_fog(mut self) -> Self {
        self.fog = false;
        self
    }

    /// Blended materials are drawn after all opaque ones, without reordering
    /// among themselves.
    pub fn is_blended(&self) -> bool {
        self.transparent || self.blending == Blending::Additive
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        let mut flags = [0.0; 4];
        let mut fresnel = [0.0; 4];
        let mut rim_color = [0.0; 4];
        match self.shading {
            Shading::Unlit => flags[0] = SHADING_UNLIT,
            Shading::Lit { flat } => {
                flags[0] = SHADING_LIT;
                flags[3] = if flat { 1.0 } else { 0.0 };
            }
            Shading::Fresnel {
                rim,
                bias,
                scale,
                power,
            } => {
                flags[0] = SHADING_FRESNEL;
                rim_color = rim.to_linear_rgba(1.0);
                fresnel = [bias, scale, power, 0.0];
            }
        }
        flags[1] = if self.vertex_colors { 1.0 } else { 0.0 };
        flags[2] = if self.fog { 1.0 } else { 0.0 };

        let opacity = if self.transparent { self.opacity } else { 1.0 };
        MaterialUniform {
            color: self.color.to_linear_rgba(opacity),
            rim_color,
            flags,
            fresnel,
        }
    }
}

const SHADING_UNLIT: f32 = 0.0;
const SHADING_LIT: f32 = 1.0;
const SHADING_FRESNEL: f32 = 2.0;

/// Per-material shader constants.
///
/// `flags` holds the shading model, vertex-colour switch, fog switch and
/// flat-shading switch; `fresnel` holds bias, scale and power.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub rim_color: [f32; 4],
    pub flags: [f32; 4],
    pub fresnel: [f32; 4],
}
