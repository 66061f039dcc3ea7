//! CPU-side shape descriptions.
//!
//! A [`Geometry`] owns vertex and index data together with the primitive
//! topology it is meant to be drawn with. The generators mirror the handful
//! of shapes the demos need: subdivided icosahedron spheres, boxes, tubes
//! swept along a [`Curve`], feature edges, wireframes and point clouds.
//! Geometry is uploaded once by the renderer and never changes afterwards.

use std::collections::{BTreeMap, BTreeSet};
use std::f32::consts::PI;

use cgmath::{InnerSpace, Vector3};

use crate::{curve::Curve, data_structures::color::Color};

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Primitive topology of a [`Geometry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topology {
    Triangles,
    Lines,
    Points,
}

impl From<Topology> for wgpu::PrimitiveTopology {
    fn from(topology: Topology) -> Self {
        match topology {
            Topology::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Topology::Lines => wgpu::PrimitiveTopology::LineList,
            Topology::Points => wgpu::PrimitiveTopology::PointList,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    /// Linear vertex colour, multiplied with the material colour.
    pub color: [f32; 3],
}

impl ModelVertex {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: [0.0; 3],
            tex_coords: [0.0; 2],
            color: [1.0; 3],
        }
    }
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[derive(Clone, Debug)]
pub struct Geometry {
    pub label: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Geometry {
    pub fn new(
        label: impl Into<String>,
        vertices: Vec<ModelVertex>,
        indices: Vec<u32>,
        topology: Topology,
    ) -> Self {
        Self {
            label: label.into(),
            vertices,
            indices,
            topology,
        }
    }

    /// Number of primitives (triangles, segments or points) described by the indices.
    pub fn primitive_count(&self) -> usize {
        match self.topology {
            Topology::Triangles => self.indices.len() / 3,
            Topology::Lines => self.indices.len() / 2,
            Topology::Points => self.indices.len(),
        }
    }

    /// Sphere approximated by a subdivided icosahedron.
    ///
    /// Every one of the 20 base faces is split into `(detail + 1)^2`
    /// triangles, projected onto the sphere. Faces do not share vertices so
    /// flat shading and UV seams stay clean.
    pub fn icosahedron(radius: f32, detail: u32) -> Self {
        let t = (1.0 + 5.0_f32.sqrt()) / 2.0;
        let base: [[f32; 3]; 12] = [
            [-1.0, t, 0.0],
            [1.0, t, 0.0],
            [-1.0, -t, 0.0],
            [1.0, -t, 0.0],
            [0.0, -1.0, t],
            [0.0, 1.0, t],
            [0.0, -1.0, -t],
            [0.0, 1.0, -t],
            [t, 0.0, -1.0],
            [t, 0.0, 1.0],
            [-t, 0.0, -1.0],
            [-t, 0.0, 1.0],
        ];
        const FACES: [[usize; 3]; 20] = [
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        let mut positions: Vec<Vector3<f32>> = Vec::new();
        for face in FACES {
            let [a, b, c] = face.map(|i| Vector3::from(base[i]));
            subdivide_face(a, b, c, detail, &mut positions);
        }

        let directions: Vec<Vector3<f32>> = positions.iter().map(|p| p.normalize()).collect();
        let mut uvs: Vec<[f32; 2]> = directions
            .iter()
            .map(|d| [azimuth(*d) / (2.0 * PI) + 0.5, inclination(*d) / PI + 0.5])
            .collect();
        correct_pole_uvs(&directions, &mut uvs);
        correct_seam_uvs(&mut uvs);

        let vertices = directions
            .iter()
            .zip(uvs)
            .map(|(direction, tex_coords)| ModelVertex {
                position: (direction * radius).into(),
                normal: (*direction).into(),
                tex_coords,
                color: [1.0; 3],
            })
            .collect::<Vec<_>>();
        let indices = (0..vertices.len() as u32).collect();

        Self::new(
            format!("icosahedron r{radius} d{detail}"),
            vertices,
            indices,
            Topology::Triangles,
        )
    }

    /// Axis-aligned box centred on the origin, four vertices per face.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);
        // (normal, u, v) with u x v == normal so every face winds counter-clockwise
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ];
        let extent = |axis: Vector3<f32>| {
            axis.x.abs() * half.x + axis.y.abs() * half.y + axis.z.abs() * half.z
        };

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let (normal, u, v) = (Vector3::from(normal), Vector3::from(u), Vector3::from(v));
            let centre = normal * extent(normal);
            let (hu, hv) = (u * extent(u), v * extent(v));
            let first = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                vertices.push(ModelVertex {
                    position: (centre + hu * su + hv * sv).into(),
                    normal: normal.into(),
                    tex_coords: [(su + 1.0) / 2.0, (1.0 - sv) / 2.0],
                    color: [1.0; 3],
                });
            }
            indices.extend([first, first + 1, first + 2, first, first + 2, first + 3]);
        }

        Self::new(
            format!("box {width}x{height}x{depth}"),
            vertices,
            indices,
            Topology::Triangles,
        )
    }

    /// Tube of constant `radius` swept along `curve`.
    ///
    /// Rings are placed at equal arc-length steps and oriented with the
    /// curve's Frenet frames. An open tube still samples the final ring at
    /// `u = 1`; a closed one reuses the first ring.
    pub fn tube<C: Curve + ?Sized>(
        curve: &C,
        tubular_segments: usize,
        radius: f32,
        radial_segments: usize,
        closed: bool,
    ) -> Self {
        let tubular_segments = tubular_segments.max(1);
        let radial_segments = radial_segments.max(3);
        let frames = curve.frenet_frames(tubular_segments, closed);

        let mut vertices = Vec::with_capacity((tubular_segments + 1) * (radial_segments + 1));
        let mut push_ring = |i: usize, frame_index: usize| {
            let centre = curve.point_at(i as f32 / tubular_segments as f32);
            let normal = frames.normals[frame_index];
            let binormal = frames.binormals[frame_index];
            for j in 0..=radial_segments {
                let v = j as f32 / radial_segments as f32 * PI * 2.0;
                let (sin, cos) = (v.sin(), -v.cos());
                let direction = (normal * cos + binormal * sin).normalize();
                let position = centre + direction * radius;
                vertices.push(ModelVertex {
                    position: position.into(),
                    normal: direction.into(),
                    tex_coords: [
                        i as f32 / tubular_segments as f32,
                        j as f32 / radial_segments as f32,
                    ],
                    color: [1.0; 3],
                });
            }
        };
        for i in 0..tubular_segments {
            push_ring(i, i);
        }
        if closed {
            push_ring(0, 0);
        } else {
            push_ring(tubular_segments, tubular_segments);
        }

        let ring = radial_segments as u32 + 1;
        let mut indices = Vec::with_capacity(tubular_segments * radial_segments * 6);
        for j in 1..=tubular_segments as u32 {
            for i in 1..=radial_segments as u32 {
                let a = ring * (j - 1) + (i - 1);
                let b = ring * j + (i - 1);
                let c = ring * j + i;
                let d = ring * (j - 1) + i;
                indices.extend([a, b, d, b, c, d]);
            }
        }

        Self::new(
            format!("tube {tubular_segments}x{radial_segments} r{radius}"),
            vertices,
            indices,
            Topology::Triangles,
        )
    }

    /// Point cloud with one linear colour per point.
    pub fn points(label: impl Into<String>, positions: &[[f32; 3]], colours: &[Color]) -> Self {
        let vertices = positions
            .iter()
            .enumerate()
            .map(|(i, position)| ModelVertex {
                color: colours.get(i).copied().unwrap_or_default().to_linear(),
                ..ModelVertex::at(*position)
            })
            .collect::<Vec<_>>();
        let indices = (0..vertices.len() as u32).collect();
        Self::new(label, vertices, indices, Topology::Points)
    }

    /// Feature edges of a triangle geometry as a line list.
    ///
    /// An edge is kept when the two faces sharing it bend by more than
    /// `threshold_deg`, or when only one face uses it. Vertices are matched
    /// by position so split seams still pair up.
    pub fn edges(&self, threshold_deg: f32) -> Geometry {
        let threshold_dot = threshold_deg.to_radians().cos();
        let mut open: BTreeMap<EdgeKey, (Vector3<f32>, Vector3<f32>, Vector3<f32>)> =
            BTreeMap::new();
        let mut segments: Vec<[Vector3<f32>; 2]> = Vec::new();

        if self.topology != Topology::Triangles {
            log::warn!("edges() called on non-triangle geometry {}", self.label);
            return Geometry::new(
                format!("{} edges", self.label),
                Vec::new(),
                Vec::new(),
                Topology::Lines,
            );
        }

        for triangle in self.indices.chunks_exact(3) {
            let corners =
                [0, 1, 2].map(|k| Vector3::from(self.vertices[triangle[k] as usize].position));
            let keys = corners.map(PositionKey::from);
            if keys[0] == keys[1] || keys[1] == keys[2] || keys[2] == keys[0] {
                continue;
            }
            let normal = (corners[1] - corners[0]).cross(corners[2] - corners[0]);
            if normal.magnitude2() == 0.0 {
                continue;
            }
            let normal = normal.normalize();

            for j in 0..3 {
                let next = (j + 1) % 3;
                let (start, end) = (keys[j], keys[next]);
                match open.remove(&(end, start)) {
                    Some((_, _, other)) => {
                        if normal.dot(other) <= threshold_dot {
                            segments.push([corners[j], corners[next]]);
                        }
                    }
                    None => {
                        open.entry((start, end))
                            .or_insert((corners[j], corners[next], normal));
                    }
                }
            }
        }
        segments.extend(open.into_values().map(|(start, end, _)| [start, end]));

        Self::line_list(format!("{} edges", self.label), &segments)
    }

    /// Every triangle edge exactly once, as a line list.
    pub fn wireframe(&self) -> Geometry {
        let mut seen = BTreeSet::new();
        let mut indices = Vec::new();
        if self.topology == Topology::Triangles {
            for triangle in self.indices.chunks_exact(3) {
                for (a, b) in [
                    (triangle[0], triangle[1]),
                    (triangle[1], triangle[2]),
                    (triangle[2], triangle[0]),
                ] {
                    if seen.insert((a.min(b), a.max(b))) {
                        indices.extend([a, b]);
                    }
                }
            }
        }
        Geometry::new(
            format!("{} wireframe", self.label),
            self.vertices.clone(),
            indices,
            Topology::Lines,
        )
    }

    fn line_list(label: String, segments: &[[Vector3<f32>; 2]]) -> Geometry {
        let vertices = segments
            .iter()
            .flatten()
            .map(|p| ModelVertex::at((*p).into()))
            .collect::<Vec<_>>();
        let indices = (0..vertices.len() as u32).collect();
        Geometry::new(label, vertices, indices, Topology::Lines)
    }
}

/// Quantized position used to match coincident vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct PositionKey([i64; 3]);

impl From<Vector3<f32>> for PositionKey {
    fn from(p: Vector3<f32>) -> Self {
        let q = |v: f32| (v * 1e4).round() as i64;
        PositionKey([q(p.x), q(p.y), q(p.z)])
    }
}

type EdgeKey = (PositionKey, PositionKey);

fn subdivide_face(
    a: Vector3<f32>,
    b: Vector3<f32>,
    c: Vector3<f32>,
    detail: u32,
    out: &mut Vec<Vector3<f32>>,
) {
    let cols = detail as usize + 1;
    let lerp = |from: Vector3<f32>, to: Vector3<f32>, t: f32| from + (to - from) * t;

    let grid: Vec<Vec<Vector3<f32>>> = (0..=cols)
        .map(|i| {
            let aj = lerp(a, c, i as f32 / cols as f32);
            let bj = lerp(b, c, i as f32 / cols as f32);
            let rows = cols - i;
            (0..=rows)
                .map(|j| {
                    if rows == 0 {
                        aj
                    } else {
                        lerp(aj, bj, j as f32 / rows as f32)
                    }
                })
                .collect()
        })
        .collect();

    for i in 0..cols {
        for j in 0..2 * (cols - i) - 1 {
            let k = j / 2;
            if j % 2 == 0 {
                out.extend([grid[i][k + 1], grid[i + 1][k], grid[i][k]]);
            } else {
                out.extend([grid[i][k + 1], grid[i + 1][k + 1], grid[i + 1][k]]);
            }
        }
    }
}

fn azimuth(v: Vector3<f32>) -> f32 {
    v.z.atan2(-v.x)
}

fn inclination(v: Vector3<f32>) -> f32 {
    (-v.y).atan2((v.x * v.x + v.z * v.z).sqrt())
}

/// Pole vertices have no azimuth of their own; borrow the face centroid's.
fn correct_pole_uvs(directions: &[Vector3<f32>], uvs: &mut [[f32; 2]]) {
    for (face, face_uvs) in directions.chunks_exact(3).zip(uvs.chunks_exact_mut(3)) {
        let centroid = (face[0] + face[1] + face[2]) / 3.0;
        let face_azimuth = azimuth(centroid);
        for (direction, uv) in face.iter().zip(face_uvs.iter_mut()) {
            if face_azimuth < 0.0 && uv[0] == 1.0 {
                uv[0] -= 1.0;
            }
            if direction.x == 0.0 && direction.z == 0.0 {
                uv[0] = face_azimuth / (2.0 * PI) + 0.5;
            }
        }
    }
}

/// Faces straddling the texture seam get their low U values wrapped past 1.
fn correct_seam_uvs(uvs: &mut [[f32; 2]]) {
    for face in uvs.chunks_exact_mut(3) {
        let max = face.iter().map(|uv| uv[0]).fold(f32::MIN, f32::max);
        let min = face.iter().map(|uv| uv[0]).fold(f32::MAX, f32::min);
        if max > 0.9 && min < 0.1 {
            for uv in face.iter_mut() {
                if uv[0] < 0.2 {
                    uv[0] += 1.0;
                }
            }
        }
    }
}
