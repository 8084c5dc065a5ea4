//! Tests for the color conversion kernel and per-space conversions.

use pagepaint_core::model::color::convert::{
    D65_WHITE_POINT, cmyk_to_rgb, cmyk_to_xyz, gray_to_rgb, rgb_to_cmyk, rgb_to_gray, rgb_to_xyz,
    xyz_to_cmyk, xyz_to_rgb,
};
use pagepaint_core::model::color::{CalRGB, ColorSpace, Lab};

fn assert_close(got: &[f64], want: &[f64], eps: f64) {
    assert_eq!(got.len(), want.len(), "length mismatch: {got:?} vs {want:?}");
    for (g, w) in got.iter().zip(want) {
        assert!((g - w).abs() < eps, "{got:?} != {want:?}");
    }
}

// ============================================================================
// CMYK <-> RGB
// ============================================================================

#[test]
fn test_rgb_to_cmyk_concrete_values() {
    assert_eq!(rgb_to_cmyk(&[1.0, 0.0, 0.0]).unwrap().as_slice(), &[0.0, 1.0, 1.0, 0.0]);
    assert_eq!(rgb_to_cmyk(&[0.0, 0.0, 0.0]).unwrap().as_slice(), &[0.0, 0.0, 0.0, 1.0]);
    assert_eq!(cmyk_to_rgb(&[0.0, 0.0, 0.0, 1.0]).unwrap().as_slice(), &[0.0, 0.0, 0.0]);
}

#[test]
fn test_cmyk_round_trip_over_grid() {
    let steps = [0.0, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
    for &r in &steps {
        for &g in &steps {
            for &b in &steps {
                let cmyk = rgb_to_cmyk(&[r, g, b]).unwrap();
                let rgb = cmyk_to_rgb(&cmyk).unwrap();
                assert_close(&rgb, &[r, g, b], 1e-6);
            }
        }
    }
}

#[test]
fn test_black_collapses_chromatic_components() {
    let cmyk = rgb_to_cmyk(&[0.0, 0.0, 0.0]).unwrap();
    assert_eq!(&cmyk[..3], &[0.0, 0.0, 0.0]);
    assert_eq!(cmyk[3], 1.0);
    assert_close(&cmyk_to_rgb(&cmyk).unwrap(), &[0.0, 0.0, 0.0], 1e-12);
}

#[test]
fn test_wrong_length_is_none() {
    assert!(rgb_to_cmyk(&[1.0, 0.0]).is_none());
    assert!(cmyk_to_rgb(&[0.0, 0.0, 0.0]).is_none());
    assert!(rgb_to_xyz(&[]).is_none());
    assert!(gray_to_rgb(&[0.1, 0.2]).is_none());
}

// ============================================================================
// XYZ anchor
// ============================================================================

#[test]
fn test_rgb_white_is_d65() {
    let xyz = rgb_to_xyz(&[1.0, 1.0, 1.0]).unwrap();
    assert_close(&xyz, &D65_WHITE_POINT, 1e-3);
    assert_close(&xyz_to_rgb(&xyz).unwrap(), &[1.0, 1.0, 1.0], 1e-3);
}

#[test]
fn test_cmyk_xyz_composes_through_rgb() {
    let cmyk = [0.1, 0.2, 0.3, 0.4];
    let via_rgb = rgb_to_xyz(&cmyk_to_rgb(&cmyk).unwrap()).unwrap();
    assert_close(&cmyk_to_xyz(&cmyk).unwrap(), &via_rgb, 1e-12);
    let back = xyz_to_cmyk(&via_rgb).unwrap();
    assert_close(&cmyk_to_rgb(&back).unwrap(), &cmyk_to_rgb(&cmyk).unwrap(), 1e-3);
}

#[test]
fn test_gray_luma() {
    assert_close(&rgb_to_gray(&[1.0, 0.0, 0.0]).unwrap(), &[0.299], 1e-12);
    assert_close(&gray_to_rgb(&[0.4]).unwrap(), &[0.4, 0.4, 0.4], 1e-12);
}

// ============================================================================
// Calibrated spaces
// ============================================================================

#[test]
fn test_calrgb_with_srgb_matrix_matches_device_rgb() {
    let space = ColorSpace::CalRGB(CalRGB {
        white_point: D65_WHITE_POINT,
        black_point: [0.0; 3],
        gamma: [1.0; 3],
        matrix: [
            0.4124, 0.2126, 0.0193, 0.3576, 0.7152, 0.1192, 0.1805, 0.0722, 0.9505,
        ],
    });
    let rgb = space.to_rgb(&[0.2, 0.5, 0.8]).unwrap().unwrap();
    assert_close(&rgb, &[0.2, 0.5, 0.8], 1e-3);
}

#[test]
fn test_lab_round_trip() {
    let space = ColorSpace::Lab(Lab {
        white_point: [0.9642, 1.0, 0.8249],
        black_point: [0.0; 3],
        range: Lab::DEFAULT_RANGE,
    });
    let xyz = space.to_xyz(&[60.0, 20.0, -30.0]).unwrap().unwrap();
    let lab = space.from_xyz(&xyz).unwrap().unwrap();
    assert_close(&lab, &[60.0, 20.0, -30.0], 1e-3);
}

#[test]
fn test_lab_clamps_into_range() {
    let space = ColorSpace::Lab(Lab {
        white_point: D65_WHITE_POINT,
        black_point: [0.0; 3],
        range: [-10.0, 10.0, -10.0, 10.0],
    });
    let clamped = space.to_rgb(&[50.0, 80.0, 0.0]).unwrap().unwrap();
    let edge = space.to_rgb(&[50.0, 10.0, 0.0]).unwrap().unwrap();
    assert_close(&clamped, &edge, 1e-12);
}
