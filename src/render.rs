//! GPU rendering of a [`Stage`].
//!
//! [`GpuRenderer`] is the wgpu implementation of [`FrameRenderer`]. It owns
//! the [`Context`], uploads geometry and materials the first time they are
//! drawn and then, every frame, only rewrites the camera, environment and
//! instance buffers.
//!
//! Draw order is all opaque meshes first, then all blended meshes, each group
//! in scene traversal order (see [`draw_order`]). When the stage asks for
//! bloom, the scene goes to an offscreen target and the bloom chain writes
//! the final image to the surface.

use std::{collections::HashMap, sync::Arc};

use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    context::Context,
    data_structures::{
        geometry::{Geometry, Topology},
        instance::InstanceRaw,
        material::Material,
        scene_graph::{DrawItem, GeometryId, MaterialId, SceneGraph},
        texture::Texture,
    },
    flow::{FrameRenderer, Stage},
    pipelines::{
        bloom::BloomChain,
        scene::{BlendMode, PipelineKey, ScenePipelines},
    },
    resources::load_textures,
};

/// Opaque items first, then blended ones, keeping traversal order within each set.
pub fn draw_order(items: Vec<DrawItem>) -> Vec<DrawItem> {
    let (opaque, blended): (Vec<_>, Vec<_>) = items.into_iter().partition(|item| !item.blended);
    opaque.into_iter().chain(blended).collect()
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    topology: Topology,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", geometry.label)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", geometry.label)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices.len() as u32,
            topology: geometry.topology,
        }
    }
}

struct GpuMaterial {
    #[allow(unused)]
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    blend: BlendMode,
}

struct DrawCall {
    mesh: (GeometryId, bool),
    material: MaterialId,
    pipeline: PipelineKey,
}

pub struct GpuRenderer {
    ctx: Context,
    pipelines: ScenePipelines,
    bloom: Option<BloomChain>,
    textures: HashMap<String, Texture>,
    white: Texture,
    meshes: HashMap<(GeometryId, bool), GpuMesh>,
    materials: HashMap<MaterialId, GpuMaterial>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
}

impl GpuRenderer {
    /// Creates the GPU context for `window` and loads every texture map up front.
    pub async fn new(window: Arc<Window>, texture_sources: Vec<String>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        let textures = load_textures(&texture_sources, &ctx.device, &ctx.queue).await;
        log::info!("Loaded {}/{} textures", textures.len(), texture_sources.len());
        let white = Texture::solid(&ctx.device, &ctx.queue, [255; 4], "white texture");
        let pipelines = ScenePipelines::new(
            &ctx.device,
            ctx.config.format,
            &ctx.camera.bind_group_layout,
            &ctx.environment.bind_group_layout,
        );
        let instance_capacity = 64;
        let instance_buffer = mk_instance_buffer(&ctx.device, instance_capacity);

        Ok(Self {
            ctx,
            pipelines,
            bloom: None,
            textures,
            white,
            meshes: HashMap::new(),
            materials: HashMap::new(),
            instance_buffer,
            instance_capacity,
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.ctx.resize(size.width, size.height);
        if let Some(bloom) = &mut self.bloom {
            bloom.resize(
                &self.ctx.device,
                &self.ctx.queue,
                [self.ctx.config.width, self.ctx.config.height],
            );
        }
    }

    /// Uploads whatever the draw list needs and writes the instance buffer.
    fn prepare(&mut self, scene: &SceneGraph) -> Vec<DrawCall> {
        let items = draw_order(scene.draw_list());
        let mut calls = Vec::with_capacity(items.len());
        let mut instances = Vec::with_capacity(items.len());

        for item in items {
            let Some(material) = scene.material(item.material) else {
                log::warn!("Mesh {:?} uses unknown material {:?}", item.node, item.material);
                continue;
            };
            let Some(geometry) = scene.geometry(item.geometry) else {
                log::warn!("Mesh {:?} uses unknown geometry {:?}", item.node, item.geometry);
                continue;
            };
            if geometry.indices.is_empty() {
                continue;
            }

            let wireframe = material.wireframe && geometry.topology == Topology::Triangles;
            let mesh_key = (item.geometry, wireframe);
            let topology = self
                .meshes
                .entry(mesh_key)
                .or_insert_with(|| {
                    if wireframe {
                        GpuMesh::new(&self.ctx.device, &geometry.wireframe())
                    } else {
                        GpuMesh::new(&self.ctx.device, geometry)
                    }
                })
                .topology;

            if !self.materials.contains_key(&item.material) {
                let gpu_material = self.upload_material(material);
                self.materials.insert(item.material, gpu_material);
            }
            let blend = BlendMode::of(material);
            let pipeline = PipelineKey { topology, blend };
            self.pipelines.prepare(&self.ctx.device, pipeline);

            instances.push(item.world.to_raw());
            calls.push(DrawCall {
                mesh: mesh_key,
                material: item.material,
                pipeline,
            });
        }

        if instances.len() > self.instance_capacity {
            self.instance_capacity = instances.len().next_power_of_two();
            self.instance_buffer = mk_instance_buffer(&self.ctx.device, self.instance_capacity);
        }
        if !instances.is_empty() {
            self.ctx
                .queue
                .write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        calls
    }

    fn upload_material(&self, material: &Material) -> GpuMaterial {
        let buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Material Buffer", material.name)),
                contents: bytemuck::cast_slice(&[material.to_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let texture = material
            .map
            .as_ref()
            .and_then(|map| self.textures.get(map))
            .unwrap_or(&self.white);
        let bind_group = self
            .ctx
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                layout: &self.pipelines.material_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&texture.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(&texture.sampler),
                    },
                ],
                label: Some(&material.name),
            });
        GpuMaterial {
            buffer,
            bind_group,
            blend: BlendMode::of(material),
        }
    }

    fn sync_bloom(&mut self, stage: &Stage) {
        match stage.post.bloom() {
            Some(settings) => match &mut self.bloom {
                Some(bloom) => bloom.set_settings(&self.ctx.queue, settings),
                None => {
                    self.bloom = Some(BloomChain::new(
                        &self.ctx.device,
                        self.ctx.config.format,
                        [self.ctx.config.width, self.ctx.config.height],
                        settings,
                    ));
                }
            },
            None => self.bloom = None,
        }
    }
}

impl FrameRenderer for GpuRenderer {
    fn render(&mut self, stage: &Stage) -> anyhow::Result<()> {
        if !self.ctx.is_surface_configured() {
            return Ok(());
        }

        self.ctx
            .camera
            .write(&self.ctx.queue, &stage.camera, &stage.projection);
        self.ctx.environment.write(&self.ctx.queue, &stage.scene);
        let calls = self.prepare(&stage.scene);
        self.sync_bloom(stage);

        let output = match self.ctx.surface.get_current_texture() {
            Ok(output) => output,
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.ctx.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let target = match &self.bloom {
                Some(bloom) => bloom.scene_view(),
                None => &view,
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(stage.scene.background.into()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            render_pass.set_bind_group(0, &self.ctx.camera.bind_group, &[]);
            render_pass.set_bind_group(1, &self.ctx.environment.bind_group, &[]);

            let stride = std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress;
            for (i, call) in calls.iter().enumerate() {
                let (Some(mesh), Some(material), Some(pipeline)) = (
                    self.meshes.get(&call.mesh),
                    self.materials.get(&call.material),
                    self.pipelines.get(call.pipeline),
                ) else {
                    continue;
                };
                debug_assert_eq!(material.blend, call.pipeline.blend);
                let offset = i as wgpu::BufferAddress * stride;
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(2, &material.bind_group, &[]);
                render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                render_pass
                    .set_vertex_buffer(1, self.instance_buffer.slice(offset..offset + stride));
                render_pass
                    .set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..mesh.num_indices, 0, 0..1);
            }
        }

        if let Some(bloom) = &self.bloom {
            bloom.apply(&mut encoder, &view);
        }

        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn mk_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Instance Buffer"),
        size: (capacity.max(1) * std::mem::size_of::<InstanceRaw>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
