use vista_ngin::data_structures::{color::Color, material::Material};

use crate::common::test_utils::approx_eq;

mod common;

fn assert_rgb(colour: Color, expected: [f32; 3]) {
    let actual = [colour.r, colour.g, colour.b];
    for (a, e) in actual.iter().zip(expected) {
        assert!(approx_eq(*a, e, 1e-6), "{actual:?} != {expected:?}");
    }
}

#[test]
fn hsl_primaries_at_full_saturation() {
    assert_rgb(Color::from_hsl(0.0, 1.0, 0.5), [1.0, 0.0, 0.0]);
    assert_rgb(Color::from_hsl(1.0 / 3.0, 1.0, 0.5), [0.0, 1.0, 0.0]);
    assert_rgb(Color::from_hsl(2.0 / 3.0, 1.0, 0.5), [0.0, 0.0, 1.0]);
    assert_rgb(Color::from_hsl(0.5, 1.0, 0.5), [0.0, 1.0, 1.0]);
}

#[test]
fn hsl_hue_wraps_around() {
    assert_rgb(Color::from_hsl(1.0, 1.0, 0.5), [1.0, 0.0, 0.0]);
    assert_rgb(Color::from_hsl(1.5, 1.0, 0.5), [0.0, 1.0, 1.0]);
}

#[test]
fn hsl_without_saturation_is_grey() {
    assert_eq!(Color::from_hsl(0.7, 0.0, 0.3), Color::new(0.3, 0.3, 0.3));
    assert_eq!(Color::from_hsl(0.2, 0.0, 1.5), Color::WHITE);
}

#[test]
fn hex_matches_hsl_red() {
    assert_eq!(Color::from_hex(0xff0000), Color::new(1.0, 0.0, 0.0));
    assert_rgb(Color::from_hex(0xff0000), [1.0, 0.0, 0.0]);
    assert_eq!(Color::from_hex(0x000000), Color::BLACK);
}

#[test]
fn linear_conversion_keeps_the_ends() {
    assert_eq!(Color::BLACK.to_linear(), [0.0, 0.0, 0.0]);
    for c in Color::WHITE.to_linear() {
        assert!(approx_eq(c, 1.0, 1e-5));
    }
    // Mid grey is darker in linear light.
    let [grey, _, _] = Color::new(0.5, 0.5, 0.5).to_linear();
    assert!(approx_eq(grey, 0.214, 1e-3));
}

#[test]
fn fog_switch_reaches_the_uniform() {
    let fogged = Material::line("tube", Color::WHITE);
    assert!(fogged.fog);
    assert_eq!(fogged.to_uniform().flags[2], 1.0);

    let clear = Material::line("tube", Color::WHITE).without_fog();
    assert!(!clear.fog);
    assert_eq!(clear.to_uniform().flags[2], 0.0);
}
