//! Scene-wide lighting and fog constants (group 1 of the scene pipelines).

use wgpu::util::DeviceExt;

use crate::data_structures::scene_graph::{Fog, Light, SceneGraph};

/// Colours are linear and premultiplied by light intensity.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EnvironmentUniform {
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    /// Unit vector towards the sun; `w` is 1 when a sun exists.
    pub sun_direction: [f32; 4],
    pub sun_color: [f32; 4],
    /// Fog colour with the exp2 density in `w` (0 disables fog).
    pub fog: [f32; 4],
}

impl EnvironmentUniform {
    /// Uses the first light of each kind; further lights of the same kind are ignored.
    pub fn from_scene(scene: &SceneGraph) -> Self {
        let mut uniform = Self::zeroed();
        let mut has_hemisphere = false;
        let mut has_sun = false;

        for light in scene.lights() {
            match *light {
                Light::Hemisphere {
                    sky,
                    ground,
                    intensity,
                } if !has_hemisphere => {
                    has_hemisphere = true;
                    uniform.sky = sky.scaled(intensity).to_linear_rgba(1.0);
                    uniform.ground = ground.scaled(intensity).to_linear_rgba(1.0);
                }
                Light::Directional {
                    color,
                    intensity,
                    position,
                } if !has_sun => {
                    use cgmath::InnerSpace;
                    if position.magnitude2() == 0.0 {
                        log::warn!("Directional light at the origin has no direction, ignoring it");
                        continue;
                    }
                    has_sun = true;
                    let direction = position.normalize();
                    uniform.sun_direction = [direction.x, direction.y, direction.z, 1.0];
                    uniform.sun_color = color.scaled(intensity).to_linear_rgba(1.0);
                }
                _ => log::debug!("Ignoring additional light {:?}", light),
            }
        }

        if let Some(Fog::Exp2 { color, density }) = scene.fog {
            uniform.fog = color.to_linear_rgba(density.max(0.0));
        }
        uniform
    }

    fn zeroed() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

pub struct EnvironmentResources {
    pub uniform: EnvironmentUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl EnvironmentResources {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = EnvironmentUniform::zeroed();
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Uploads the scene's lights and fog when they changed.
    pub fn write(&mut self, queue: &wgpu::Queue, scene: &SceneGraph) {
        let uniform = EnvironmentUniform::from_scene(scene);
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}

impl std::fmt::Debug for EnvironmentResources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentResources")
            .field("uniform", &self.uniform)
            .finish_non_exhaustive()
    }
}

pub fn mk_buffer(device: &wgpu::Device, uniform: EnvironmentUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Environment Buffer"),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("environment_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
        label: Some("environment_bind_group"),
    })
}
