//! Color model conversion kernel.
//!
//! Pure functions between device encodings and the two anchor spaces: RGB
//! (treated as linear, sRGB primaries, D65) and CIE XYZ. Every function
//! checks the input length and returns `None` on a mismatch. Out-of-gamut
//! values are passed through.

use smallvec::{SmallVec, smallvec};

/// A color component vector. Four inline slots cover every device space.
pub type Components = SmallVec<[f64; 4]>;

/// Row-major 3x3 matrix.
pub type Mat3 = [[f64; 3]; 3];

/// Linear sRGB to XYZ (D65) matrix.
pub const SRGB_TO_XYZ: Mat3 = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.1191920, 0.9503041],
];

/// XYZ (D65) to linear sRGB matrix.
pub const XYZ_TO_SRGB: Mat3 = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

const BRADFORD: Mat3 = [
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
];

const BRADFORD_INVERSE: Mat3 = [
    [0.9869929, -0.1470543, 0.1599627],
    [0.4323053, 0.5183603, 0.0492912],
    [-0.0085287, 0.0400428, 0.9684867],
];

/// D65 reference white, the white point of the RGB anchor.
pub const D65_WHITE_POINT: [f64; 3] = [0.95047, 1.0, 1.08883];

/// Rec. 601 luma weights used when collapsing RGB to gray.
const LUMA: [f64; 3] = [0.299, 0.587, 0.114];

/// Multiplies a matrix by a column vector.
pub fn mat3_mul(m: &Mat3, v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Inverts a matrix, or `None` when it is singular.
pub fn mat3_invert(m: &Mat3) -> Option<Mat3> {
    let [[a, b, c], [d, e, f], [g, h, i]] = *m;
    let co_a = e * i - f * h;
    let co_b = -(d * i - f * g);
    let co_c = d * h - e * g;
    let det = a * co_a + b * co_b + c * co_c;
    if det.abs() < 1e-12 {
        return None;
    }
    let inv = 1.0 / det;
    Some([
        [co_a * inv, -(b * i - c * h) * inv, (b * f - c * e) * inv],
        [co_b * inv, (a * i - c * g) * inv, -(a * f - c * d) * inv],
        [co_c * inv, -(a * h - b * g) * inv, (a * e - b * d) * inv],
    ])
}

fn triple(v: &[f64]) -> Option<[f64; 3]> {
    match v {
        [a, b, c] => Some([*a, *b, *c]),
        _ => None,
    }
}

/// RGB to CMYK with full gray-component replacement.
pub fn rgb_to_cmyk(rgb: &[f64]) -> Option<Components> {
    let [r, g, b] = triple(rgb)?;
    let c = 1.0 - r;
    let m = 1.0 - g;
    let y = 1.0 - b;
    let k = c.min(m).min(y);
    if k == 1.0 {
        return Some(smallvec![0.0, 0.0, 0.0, k]);
    }
    Some(smallvec![
        (c - k) / (1.0 - k),
        (m - k) / (1.0 - k),
        (y - k) / (1.0 - k),
        k
    ])
}

/// CMYK to RGB.
pub fn cmyk_to_rgb(cmyk: &[f64]) -> Option<Components> {
    let [c, m, y, k] = match cmyk {
        [c, m, y, k] => [*c, *m, *y, *k],
        _ => return None,
    };
    let c = c * (1.0 - k) + k;
    let m = m * (1.0 - k) + k;
    let y = y * (1.0 - k) + k;
    Some(smallvec![1.0 - c, 1.0 - m, 1.0 - y])
}

/// RGB to CIE XYZ.
pub fn rgb_to_xyz(rgb: &[f64]) -> Option<Components> {
    let xyz = mat3_mul(&SRGB_TO_XYZ, triple(rgb)?);
    Some(SmallVec::from_slice(&xyz))
}

/// CIE XYZ to RGB.
pub fn xyz_to_rgb(xyz: &[f64]) -> Option<Components> {
    let rgb = mat3_mul(&XYZ_TO_SRGB, triple(xyz)?);
    Some(SmallVec::from_slice(&rgb))
}

/// CMYK to CIE XYZ, through RGB.
pub fn cmyk_to_xyz(cmyk: &[f64]) -> Option<Components> {
    rgb_to_xyz(&cmyk_to_rgb(cmyk)?)
}

/// CIE XYZ to CMYK, through RGB.
pub fn xyz_to_cmyk(xyz: &[f64]) -> Option<Components> {
    rgb_to_cmyk(&xyz_to_rgb(xyz)?)
}

/// Gray level to RGB.
pub fn gray_to_rgb(gray: &[f64]) -> Option<Components> {
    match gray {
        [g] => Some(smallvec![*g, *g, *g]),
        _ => None,
    }
}

/// RGB to a gray level using luma weights.
pub fn rgb_to_gray(rgb: &[f64]) -> Option<Components> {
    let [r, g, b] = triple(rgb)?;
    Some(smallvec![LUMA[0] * r + LUMA[1] * g + LUMA[2] * b])
}

/// Adapts an XYZ value from one reference white to another (Bradford).
pub fn bradford_adapt(xyz: [f64; 3], from_white: [f64; 3], to_white: [f64; 3]) -> [f64; 3] {
    if from_white == to_white {
        return xyz;
    }
    let lms = mat3_mul(&BRADFORD, xyz);
    let src = mat3_mul(&BRADFORD, from_white);
    let dst = mat3_mul(&BRADFORD, to_white);
    let scaled = [
        lms[0] * dst[0] / src[0],
        lms[1] * dst[1] / src[1],
        lms[2] * dst[2] / src[2],
    ];
    mat3_mul(&BRADFORD_INVERSE, scaled)
}

const LAB_DELTA: f64 = 6.0 / 29.0;

fn lab_f(t: f64) -> f64 {
    if t > LAB_DELTA.powi(3) {
        t.cbrt()
    } else {
        t / (3.0 * LAB_DELTA * LAB_DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    if t >= LAB_DELTA {
        t.powi(3)
    } else {
        3.0 * LAB_DELTA * LAB_DELTA * (t - 4.0 / 29.0)
    }
}

/// CIE L*a*b* to XYZ relative to `white`.
pub fn lab_to_xyz(lab: [f64; 3], white: [f64; 3]) -> [f64; 3] {
    let [l, a, b] = lab;
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;
    [
        white[0] * lab_f_inv(fx),
        white[1] * lab_f_inv(fy),
        white[2] * lab_f_inv(fz),
    ]
}

/// XYZ to CIE L*a*b* relative to `white`.
pub fn xyz_to_lab(xyz: [f64; 3], white: [f64; 3]) -> [f64; 3] {
    let fx = lab_f(xyz[0] / white[0]);
    let fy = lab_f(xyz[1] / white[1]);
    let fz = lab_f(xyz[2] / white[2]);
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64], eps: f64) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < eps)
    }

    #[test]
    fn rgb_to_cmyk_primaries() {
        assert_eq!(rgb_to_cmyk(&[1.0, 0.0, 0.0]).unwrap().as_slice(), &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(rgb_to_cmyk(&[0.0, 0.0, 0.0]).unwrap().as_slice(), &[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(rgb_to_cmyk(&[1.0, 1.0, 1.0]).unwrap().as_slice(), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn cmyk_black_is_rgb_black() {
        assert_eq!(cmyk_to_rgb(&[0.0, 0.0, 0.0, 1.0]).unwrap().as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn wrong_length_yields_none() {
        assert!(rgb_to_cmyk(&[1.0, 0.0]).is_none());
        assert!(cmyk_to_rgb(&[0.0, 0.0, 0.0]).is_none());
        assert!(rgb_to_xyz(&[]).is_none());
        assert!(xyz_to_cmyk(&[0.1, 0.2, 0.3, 0.4]).is_none());
        assert!(gray_to_rgb(&[0.1, 0.2]).is_none());
    }

    #[test]
    fn xyz_matrices_are_inverse() {
        let rgb = [0.2, 0.5, 0.8];
        let back = xyz_to_rgb(&rgb_to_xyz(&rgb).unwrap()).unwrap();
        assert!(close(&back, &rgb, 1e-5), "{back:?}");
    }

    #[test]
    fn rgb_white_maps_to_d65() {
        let xyz = rgb_to_xyz(&[1.0, 1.0, 1.0]).unwrap();
        assert!(close(&xyz, &D65_WHITE_POINT, 1e-4), "{xyz:?}");
    }

    #[test]
    fn cmyk_xyz_composes_through_rgb() {
        let cmyk = [0.1, 0.2, 0.3, 0.4];
        let via_rgb = rgb_to_xyz(&cmyk_to_rgb(&cmyk).unwrap()).unwrap();
        assert_eq!(cmyk_to_xyz(&cmyk).unwrap(), via_rgb);
    }

    #[test]
    fn invert_identity_and_singular() {
        let id = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_eq!(mat3_invert(&id), Some(id));
        assert_eq!(mat3_invert(&[[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]]), None);
    }

    #[test]
    fn invert_round_trips_srgb() {
        let inv = mat3_invert(&SRGB_TO_XYZ).unwrap();
        for (row, expected) in inv.iter().zip(XYZ_TO_SRGB.iter()) {
            assert!(close(row, expected, 1e-3), "{row:?} vs {expected:?}");
        }
    }

    #[test]
    fn lab_round_trip() {
        let white = [0.9505, 1.0, 1.089];
        for lab in [[50.0, 20.0, -30.0], [5.0, 0.0, 0.0], [100.0, -80.0, 60.0]] {
            let back = xyz_to_lab(lab_to_xyz(lab, white), white);
            assert!(close(&back, &lab, 1e-6), "{lab:?} -> {back:?}");
        }
    }

    #[test]
    fn lab_white_is_reference_white() {
        let white = [0.9642, 1.0, 0.8249];
        let xyz = lab_to_xyz([100.0, 0.0, 0.0], white);
        assert!(close(&xyz, &white, 1e-9));
    }

    #[test]
    fn bradford_is_identity_for_same_white() {
        let xyz = [0.3, 0.4, 0.5];
        assert_eq!(bradford_adapt(xyz, D65_WHITE_POINT, D65_WHITE_POINT), xyz);
    }

    #[test]
    fn bradford_maps_white_to_white() {
        let d50 = [0.9642, 1.0, 0.8249];
        let adapted = bradford_adapt(d50, d50, D65_WHITE_POINT);
        assert!(close(&adapted, &D65_WHITE_POINT, 1e-3), "{adapted:?}");
    }
}
