use cgmath::{InnerSpace, Vector3};
use vista_ngin::curve::{ARC_LENGTH_DIVISIONS, CatmullRomCurve3, Curve, CurveError, CurveType};

use crate::common::test_utils::{approx_eq, approx_eq_vec};

mod common;

fn square() -> Vec<Vector3<f32>> {
    vec![
        Vector3::new(1.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, 1.0),
        Vector3::new(-1.0, 0.0, 0.0),
        Vector3::new(0.0, 0.0, -1.0),
    ]
}

#[test]
fn closed_curve_passes_through_control_points() {
    let curve = CatmullRomCurve3::closed(square()).unwrap();
    for (i, point) in square().into_iter().enumerate() {
        let t = i as f32 / 4.0;
        assert!(
            approx_eq_vec(curve.point(t), point, 1e-5),
            "point({t}) = {:?}, expected {:?}",
            curve.point(t),
            point
        );
    }
}

#[test]
fn open_curve_ends_on_first_and_last_point() {
    let points = vec![
        Vector3::new(0.0, 0.0, 0.0),
        Vector3::new(1.0, 2.0, 0.0),
        Vector3::new(3.0, 2.0, 1.0),
    ];
    for curve_type in [CurveType::Centripetal, CurveType::Chordal, CurveType::CatmullRom(0.5)] {
        let curve = CatmullRomCurve3::new(points.clone(), false, curve_type).unwrap();
        assert!(approx_eq_vec(curve.point(0.0), points[0], 1e-5));
        assert!(approx_eq_vec(curve.point(0.5), points[1], 1e-5));
        assert!(approx_eq_vec(curve.point(1.0), points[2], 1e-5));
    }
}

#[test]
fn needs_two_control_points() {
    assert_eq!(
        CatmullRomCurve3::closed(vec![Vector3::new(1.0, 2.0, 3.0)]).unwrap_err(),
        CurveError::TooFewPoints(1)
    );
    assert_eq!(
        CatmullRomCurve3::new(Vec::new(), false, CurveType::Centripetal).unwrap_err(),
        CurveError::TooFewPoints(0)
    );
}

#[test]
fn arc_lengths_are_monotonic() {
    let curve = CatmullRomCurve3::closed(square()).unwrap();
    let lengths = curve.arc_lengths();
    assert_eq!(lengths.len(), ARC_LENGTH_DIVISIONS + 1);
    assert_eq!(lengths[0], 0.0);
    assert!(lengths.windows(2).all(|pair| pair[1] >= pair[0]));
    assert_eq!(curve.length(), lengths[ARC_LENGTH_DIVISIONS]);
}

#[test]
fn closed_curve_is_periodic_in_arc_length() {
    let curve = CatmullRomCurve3::closed(square()).unwrap();
    for u in [0.0, 0.13, 0.5, 0.87] {
        let here = curve.point_at(u);
        assert!(approx_eq_vec(curve.point_at(u + 1.0), here, 1e-4));
        assert!(approx_eq_vec(curve.point_at(u - 1.0), here, 1e-4));
    }
    assert!(approx_eq_vec(curve.point_at(1.0), curve.point_at(0.0), 1e-4));
}

#[test]
fn open_curve_clamps_arc_length() {
    let points = vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(4.0, 0.0, 0.0)];
    let curve = CatmullRomCurve3::new(points.clone(), false, CurveType::default()).unwrap();
    assert!(approx_eq_vec(curve.point_at(-0.5), points[0], 1e-5));
    assert!(approx_eq_vec(curve.point_at(1.5), points[1], 1e-5));
}

#[test]
fn equal_arc_length_steps_cover_equal_distances() {
    // A straight two-point spline is a line, so arc length is just distance.
    let curve = CatmullRomCurve3::new(
        vec![Vector3::new(0.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0)],
        false,
        CurveType::default(),
    )
    .unwrap();
    assert!(approx_eq(curve.length(), 10.0, 1e-3));
    for u in [0.1, 0.25, 0.5, 0.9] {
        assert!(approx_eq(curve.point_at(u).x, 10.0 * u, 1e-2));
    }

    let points = curve.spaced_points(5);
    assert_eq!(points.len(), 6);
    for (i, point) in points.iter().enumerate() {
        assert!(approx_eq(point.x, 2.0 * i as f32, 1e-2), "spaced point {i}: {point:?}");
    }
}

#[test]
fn tangents_are_unit_length() {
    let curve = CatmullRomCurve3::closed(square()).unwrap();
    for u in [0.0, 0.3, 0.6, 0.99] {
        assert!(approx_eq(curve.tangent_at(u).magnitude(), 1.0, 1e-4));
    }
}

#[test]
fn frenet_frames_are_orthonormal() {
    let curve = CatmullRomCurve3::closed(square()).unwrap();
    let frames = curve.frenet_frames(32, true);
    assert_eq!(frames.tangents.len(), 33);
    assert_eq!(frames.normals.len(), 33);
    assert_eq!(frames.binormals.len(), 33);
    for i in 0..=32 {
        let (t, n, b) = (frames.tangents[i], frames.normals[i], frames.binormals[i]);
        assert!(approx_eq(n.magnitude(), 1.0, 1e-3), "normal {i} not unit");
        assert!(approx_eq(t.dot(n), 0.0, 1e-3), "normal {i} not orthogonal");
        assert!(approx_eq(t.dot(b), 0.0, 1e-3), "binormal {i} not orthogonal");
    }
}
