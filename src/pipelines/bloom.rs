//! Bloom post-processing.
//!
//! The scene is drawn into a full-resolution offscreen target. Bright pixels
//! are extracted into a half-resolution target, blurred horizontally then
//! vertically, and added back on top of the scene while writing to the
//! surface.

use wgpu::util::DeviceExt;

use crate::{data_structures::texture::Texture, post::BloomSettings};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BloomUniform {
    pub direction: [f32; 2],
    pub texel_size: [f32; 2],
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
    _pad: f32,
}

impl BloomUniform {
    pub fn new(settings: BloomSettings, direction: [f32; 2], size: [u32; 2]) -> Self {
        Self {
            direction,
            texel_size: [1.0 / size[0].max(1) as f32, 1.0 / size[1].max(1) as f32],
            threshold: settings.threshold,
            strength: settings.strength,
            radius: settings.radius.clamp(0.0, 1.0),
            _pad: 0.0,
        }
    }
}

struct Targets {
    scene: Texture,
    bright: Texture,
    blur_a: Texture,
    blur_b: Texture,
}

impl Targets {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: [u32; 2]) -> Self {
        let half = half_size(size);
        Self {
            scene: Texture::create_render_target(device, size, format, "bloom scene target"),
            bright: Texture::create_render_target(device, half, format, "bloom bright target"),
            blur_a: Texture::create_render_target(device, half, format, "bloom blur target a"),
            blur_b: Texture::create_render_target(device, half, format, "bloom blur target b"),
        }
    }
}

struct BindGroups {
    bright: wgpu::BindGroup,
    blur_horizontal: wgpu::BindGroup,
    blur_vertical: wgpu::BindGroup,
    composite: wgpu::BindGroup,
}

pub struct BloomChain {
    settings: BloomSettings,
    size: [u32; 2],
    format: wgpu::TextureFormat,
    layout: wgpu::BindGroupLayout,
    bright_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    composite_pipeline: wgpu::RenderPipeline,
    base_uniform: wgpu::Buffer,
    horizontal_uniform: wgpu::Buffer,
    vertical_uniform: wgpu::Buffer,
    targets: Targets,
    bind_groups: BindGroups,
}

impl BloomChain {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: [u32; 2],
        settings: BloomSettings,
    ) -> Self {
        let layout = mk_bind_group_layout(device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Bloom Pipeline Layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Bloom Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("bloom.wgsl").into()),
        });
        let pipeline = |entry_point: &str| {
            mk_fullscreen_pipeline(device, &pipeline_layout, &shader, format, entry_point)
        };
        let bright_pipeline = pipeline("fs_bright");
        let blur_pipeline = pipeline("fs_blur");
        let composite_pipeline = pipeline("fs_composite");

        let half = half_size(size);
        let uniform_buffer = |label: &str, uniform: BloomUniform| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        };
        let base_uniform = uniform_buffer(
            "Bloom Base Uniform",
            BloomUniform::new(settings, [0.0, 0.0], size),
        );
        let horizontal_uniform = uniform_buffer(
            "Bloom Horizontal Uniform",
            BloomUniform::new(settings, [1.0, 0.0], half),
        );
        let vertical_uniform = uniform_buffer(
            "Bloom Vertical Uniform",
            BloomUniform::new(settings, [0.0, 1.0], half),
        );

        let targets = Targets::new(device, format, size);
        let bind_groups = mk_bind_groups(
            device,
            &layout,
            &targets,
            &base_uniform,
            &horizontal_uniform,
            &vertical_uniform,
        );

        Self {
            settings,
            size,
            format,
            layout,
            bright_pipeline,
            blur_pipeline,
            composite_pipeline,
            base_uniform,
            horizontal_uniform,
            vertical_uniform,
            targets,
            bind_groups,
        }
    }

    /// View the scene should be rendered into before [`apply`](Self::apply).
    pub fn scene_view(&self) -> &wgpu::TextureView {
        &self.targets.scene.view
    }

    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, size: [u32; 2]) {
        if size == self.size {
            return;
        }
        self.size = size;
        self.targets = Targets::new(device, self.format, size);
        self.bind_groups = mk_bind_groups(
            device,
            &self.layout,
            &self.targets,
            &self.base_uniform,
            &self.horizontal_uniform,
            &self.vertical_uniform,
        );
        self.write_uniforms(queue);
    }

    pub fn set_settings(&mut self, queue: &wgpu::Queue, settings: BloomSettings) {
        if settings != self.settings {
            self.settings = settings;
            self.write_uniforms(queue);
        }
    }

    fn write_uniforms(&self, queue: &wgpu::Queue) {
        let half = half_size(self.size);
        let write = |buffer: &wgpu::Buffer, uniform: BloomUniform| {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[uniform]));
        };
        write(
            &self.base_uniform,
            BloomUniform::new(self.settings, [0.0, 0.0], self.size),
        );
        write(
            &self.horizontal_uniform,
            BloomUniform::new(self.settings, [1.0, 0.0], half),
        );
        write(
            &self.vertical_uniform,
            BloomUniform::new(self.settings, [0.0, 1.0], half),
        );
    }

    /// Runs bright pass, blur and composite, writing the result to `output`.
    pub fn apply(&self, encoder: &mut wgpu::CommandEncoder, output: &wgpu::TextureView) {
        let passes: [(&str, &wgpu::RenderPipeline, &wgpu::BindGroup, &wgpu::TextureView); 4] = [
            (
                "Bloom Bright Pass",
                &self.bright_pipeline,
                &self.bind_groups.bright,
                &self.targets.bright.view,
            ),
            (
                "Bloom Horizontal Blur",
                &self.blur_pipeline,
                &self.bind_groups.blur_horizontal,
                &self.targets.blur_a.view,
            ),
            (
                "Bloom Vertical Blur",
                &self.blur_pipeline,
                &self.bind_groups.blur_vertical,
                &self.targets.blur_b.view,
            ),
            (
                "Bloom Composite",
                &self.composite_pipeline,
                &self.bind_groups.composite,
                output,
            ),
        ];

        for (label, pipeline, bind_group, target) in passes {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(label),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
    }
}

fn half_size(size: [u32; 2]) -> [u32; 2] {
    [(size[0] / 2).max(1), (size[1] / 2).max(1)]
}

fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture_entry(3),
        ],
        label: Some("bloom_bind_group_layout"),
    })
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    source: &Texture,
    glow: &Texture,
    uniform: &wgpu::Buffer,
    label: &str,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&source.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&source.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&glow.view),
            },
        ],
        label: Some(label),
    })
}

fn mk_bind_groups(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    targets: &Targets,
    base_uniform: &wgpu::Buffer,
    horizontal_uniform: &wgpu::Buffer,
    vertical_uniform: &wgpu::Buffer,
) -> BindGroups {
    BindGroups {
        bright: mk_bind_group(
            device,
            layout,
            &targets.scene,
            &targets.scene,
            base_uniform,
            "bloom_bright_bind_group",
        ),
        blur_horizontal: mk_bind_group(
            device,
            layout,
            &targets.bright,
            &targets.bright,
            horizontal_uniform,
            "bloom_blur_h_bind_group",
        ),
        blur_vertical: mk_bind_group(
            device,
            layout,
            &targets.blur_a,
            &targets.blur_a,
            vertical_uniform,
            "bloom_blur_v_bind_group",
        ),
        composite: mk_bind_group(
            device,
            layout,
            &targets.scene,
            &targets.blur_b,
            base_uniform,
            "bloom_composite_bind_group",
        ),
    }
}

fn mk_fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    entry_point: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(entry_point),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(entry_point),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
    })
}
