//! Post-processing description.
//!
//! Demos describe which passes they want; the renderer decides how to
//! execute them. An empty pass list (or one with only [`Pass::Render`])
//! renders straight to the surface.

/// Parameters of the bloom glow.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomSettings {
    /// How strongly the blurred highlights are added back.
    pub strength: f32,
    /// Blur spread in `[0, 1]`; 0 gives the tightest glow.
    pub radius: f32,
    /// Luminance above which a pixel contributes to the glow.
    pub threshold: f32,
}

impl Default for BloomSettings {
    fn default() -> Self {
        Self {
            strength: 1.5,
            radius: 0.0,
            threshold: 0.002,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pass {
    /// Draws the scene.
    Render,
    Bloom(BloomSettings),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostProcess {
    pub passes: Vec<Pass>,
}

impl PostProcess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pass(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }

    /// The first bloom pass, if any.
    pub fn bloom(&self) -> Option<BloomSettings> {
        self.passes.iter().find_map(|pass| match pass {
            Pass::Bloom(settings) => Some(*settings),
            Pass::Render => None,
        })
    }
}
