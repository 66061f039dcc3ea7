//! Parametric 3D curves.
//!
//! A [`Curve`] maps a raw parameter `t` in `[0, 1]` to a point. Raw `t` does
//! not move at constant speed, so every consumer in this crate goes through
//! the arc-length parameter `u` instead: [`Curve::point_at`] and
//! [`Curve::tangent_at`] remap `u` through a cached table of cumulative
//! segment lengths. Closed curves are periodic in `u` with period 1; open
//! curves clamp `u` to `[0, 1]`.

use cgmath::{InnerSpace, Quaternion, Rad, Rotation3, Vector3};
use thiserror::Error;

/// Number of chords used to approximate arc lengths.
pub const ARC_LENGTH_DIVISIONS: usize = 200;

const TANGENT_DELTA: f32 = 0.0001;

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("a spline needs at least 2 control points, got {0}")]
    TooFewPoints(usize),
}

/// Orthonormal frames sampled along a curve, used to sweep tubes.
#[derive(Clone, Debug, Default)]
pub struct FrenetFrames {
    pub tangents: Vec<Vector3<f32>>,
    pub normals: Vec<Vector3<f32>>,
    pub binormals: Vec<Vector3<f32>>,
}

pub trait Curve {
    /// Point at raw curve parameter `t` in `[0, 1]`.
    fn point(&self, t: f32) -> Vector3<f32>;

    fn is_closed(&self) -> bool;

    /// Cumulative chord lengths at `ARC_LENGTH_DIVISIONS + 1` evenly spaced values of `t`.
    fn arc_lengths(&self) -> &[f32];

    fn length(&self) -> f32 {
        self.arc_lengths().last().copied().unwrap_or(0.0)
    }

    /// Maps normalized arc length `u` in `[0, 1]` to the raw parameter `t`.
    fn u_to_t(&self, u: f32) -> f32 {
        let lengths = self.arc_lengths();
        if lengths.len() < 2 {
            return u;
        }
        let last = lengths.len() - 1;
        let target = u.clamp(0.0, 1.0) * lengths[last];

        let i = lengths.partition_point(|length| *length <= target).saturating_sub(1);
        if i >= last {
            return 1.0;
        }
        let before = lengths[i];
        if before == target {
            return i as f32 / last as f32;
        }
        let segment = lengths[i + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (i as f32 + fraction) / last as f32
    }

    /// Wraps or clamps `u` into `[0, 1)` / `[0, 1]` depending on closedness.
    fn normalize_u(&self, u: f32) -> f32 {
        if self.is_closed() {
            let wrapped = u.rem_euclid(1.0);
            // rem_euclid can round up to exactly 1.0 for tiny negative inputs
            if wrapped >= 1.0 { 0.0 } else { wrapped }
        } else {
            u.clamp(0.0, 1.0)
        }
    }

    /// Point at normalized arc length `u`.
    fn point_at(&self, u: f32) -> Vector3<f32> {
        self.point(self.u_to_t(self.normalize_u(u)))
    }

    /// Unit tangent at raw parameter `t`, by central difference.
    fn tangent(&self, t: f32) -> Vector3<f32> {
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        let delta = self.point(t2) - self.point(t1);
        if delta.magnitude2() == 0.0 {
            return Vector3::unit_z();
        }
        delta.normalize()
    }

    fn tangent_at(&self, u: f32) -> Vector3<f32> {
        self.tangent(self.u_to_t(self.normalize_u(u)))
    }

    /// `divisions + 1` points at equal arc-length spacing.
    fn spaced_points(&self, divisions: usize) -> Vec<Vector3<f32>> {
        let divisions = divisions.max(1);
        (0..=divisions)
            .map(|i| self.point(self.u_to_t(i as f32 / divisions as f32)))
            .collect()
    }

    /// `segments + 1` frames at equal arc-length spacing.
    ///
    /// Normals are propagated by parallel transport from an initial normal
    /// chosen along the tangent's smallest axis. For closed curves the
    /// accumulated twist between the first and last frame is spread evenly
    /// over all frames so the ends line up.
    fn frenet_frames(&self, segments: usize, closed: bool) -> FrenetFrames {
        let segments = segments.max(1);
        let tangents: Vec<Vector3<f32>> = (0..=segments)
            .map(|i| self.tangent_at(i as f32 / segments as f32))
            .collect();

        let first = tangents[0];
        let (tx, ty, tz) = (first.x.abs(), first.y.abs(), first.z.abs());
        let mut min = f32::MAX;
        let mut seed = Vector3::unit_x();
        if tx <= min {
            min = tx;
            seed = Vector3::unit_x();
        }
        if ty <= min {
            min = ty;
            seed = Vector3::unit_y();
        }
        if tz <= min {
            seed = Vector3::unit_z();
        }
        let side = first.cross(seed).normalize();

        let mut normals = Vec::with_capacity(segments + 1);
        let mut binormals = Vec::with_capacity(segments + 1);
        normals.push(first.cross(side));
        binormals.push(first.cross(normals[0]));

        for i in 1..=segments {
            let mut normal = normals[i - 1];
            let axis = tangents[i - 1].cross(tangents[i]);
            if axis.magnitude() > f32::EPSILON {
                let theta = tangents[i - 1].dot(tangents[i]).clamp(-1.0, 1.0).acos();
                normal = Quaternion::from_axis_angle(axis.normalize(), Rad(theta)) * normal;
            }
            binormals.push(tangents[i].cross(normal));
            normals.push(normal);
        }

        if closed {
            let mut theta =
                normals[0].dot(normals[segments]).clamp(-1.0, 1.0).acos() / segments as f32;
            if tangents[0].dot(normals[0].cross(normals[segments])) > 0.0 {
                theta = -theta;
            }
            for i in 1..=segments {
                normals[i] =
                    Quaternion::from_axis_angle(tangents[i], Rad(theta * i as f32)) * normals[i];
                binormals[i] = tangents[i].cross(normals[i]);
            }
        }

        FrenetFrames {
            tangents,
            normals,
            binormals,
        }
    }
}

/// Parameterization of a Catmull-Rom spline.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum CurveType {
    /// Knot spacing by the fourth root of the squared chord length.
    #[default]
    Centripetal,
    /// Knot spacing by the square root of the squared chord length.
    Chordal,
    /// Uniform knots with the given tension.
    CatmullRom(f32),
}

/// Catmull-Rom spline through a list of control points.
#[derive(Clone, Debug)]
pub struct CatmullRomCurve3 {
    points: Vec<Vector3<f32>>,
    closed: bool,
    curve_type: CurveType,
    arc_lengths: Vec<f32>,
}

impl CatmullRomCurve3 {
    pub fn new(
        points: Vec<Vector3<f32>>,
        closed: bool,
        curve_type: CurveType,
    ) -> Result<Self, CurveError> {
        if points.len() < 2 {
            return Err(CurveError::TooFewPoints(points.len()));
        }
        let mut curve = Self {
            points,
            closed,
            curve_type,
            arc_lengths: Vec::new(),
        };
        curve.arc_lengths = curve.compute_arc_lengths(ARC_LENGTH_DIVISIONS);
        Ok(curve)
    }

    pub fn closed(points: Vec<Vector3<f32>>) -> Result<Self, CurveError> {
        Self::new(points, true, CurveType::default())
    }

    pub fn control_points(&self) -> &[Vector3<f32>] {
        &self.points
    }

    fn compute_arc_lengths(&self, divisions: usize) -> Vec<f32> {
        let mut lengths = Vec::with_capacity(divisions + 1);
        let mut last = self.point(0.0);
        let mut sum = 0.0;
        lengths.push(0.0);
        for p in 1..=divisions {
            let current = self.point(p as f32 / divisions as f32);
            sum += (current - last).magnitude();
            lengths.push(sum);
            last = current;
        }
        lengths
    }
}

impl Curve for CatmullRomCurve3 {
    fn point(&self, t: f32) -> Vector3<f32> {
        let points = &self.points;
        let l = points.len() as i64;

        let p = (l - if self.closed { 0 } else { 1 }) as f32 * t;
        let mut int_point = p.floor() as i64;
        let mut weight = p - int_point as f32;

        if self.closed {
            int_point = int_point.rem_euclid(l);
        } else if weight == 0.0 && int_point == l - 1 {
            int_point = l - 2;
            weight = 1.0;
        }
        let at = |i: i64| points[i.rem_euclid(l) as usize];

        let p0 = if self.closed || int_point > 0 {
            at(int_point - 1)
        } else {
            points[0] * 2.0 - points[1]
        };
        let p1 = at(int_point);
        let p2 = at(int_point + 1);
        let p3 = if self.closed || int_point + 2 < l {
            at(int_point + 2)
        } else {
            points[(l - 1) as usize] * 2.0 - points[(l - 2) as usize]
        };

        let (px, py, pz) = match self.curve_type {
            CurveType::Centripetal | CurveType::Chordal => {
                let pow = if self.curve_type == CurveType::Chordal {
                    0.5
                } else {
                    0.25
                };
                let mut dt0 = (p1 - p0).magnitude2().powf(pow);
                let mut dt1 = (p2 - p1).magnitude2().powf(pow);
                let mut dt2 = (p3 - p2).magnitude2().powf(pow);
                if dt1 < 1e-4 {
                    dt1 = 1.0;
                }
                if dt0 < 1e-4 {
                    dt0 = dt1;
                }
                if dt2 < 1e-4 {
                    dt2 = dt1;
                }
                let dts = [dt0, dt1, dt2];
                (
                    CubicPoly::nonuniform([p0.x, p1.x, p2.x, p3.x], dts),
                    CubicPoly::nonuniform([p0.y, p1.y, p2.y, p3.y], dts),
                    CubicPoly::nonuniform([p0.z, p1.z, p2.z, p3.z], dts),
                )
            }
            CurveType::CatmullRom(tension) => (
                CubicPoly::uniform([p0.x, p1.x, p2.x, p3.x], tension),
                CubicPoly::uniform([p0.y, p1.y, p2.y, p3.y], tension),
                CubicPoly::uniform([p0.z, p1.z, p2.z, p3.z], tension),
            ),
        };

        Vector3::new(px.calc(weight), py.calc(weight), pz.calc(weight))
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn arc_lengths(&self) -> &[f32] {
        &self.arc_lengths
    }
}

/// Cubic Hermite segment between `x1` and `x2`.
#[derive(Clone, Copy, Debug)]
struct CubicPoly {
    c0: f32,
    c1: f32,
    c2: f32,
    c3: f32,
}

impl CubicPoly {
    fn hermite(x0: f32, x1: f32, t0: f32, t1: f32) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    fn uniform([x0, x1, x2, x3]: [f32; 4], tension: f32) -> Self {
        Self::hermite(x1, x2, tension * (x2 - x0), tension * (x3 - x1))
    }

    fn nonuniform([x0, x1, x2, x3]: [f32; 4], [dt0, dt1, dt2]: [f32; 3]) -> Self {
        let t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        Self::hermite(x1, x2, t1 * dt1, t2 * dt1)
    }

    fn calc(&self, t: f32) -> f32 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}
