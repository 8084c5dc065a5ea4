//! Geometry helpers shared by the interpreter and the canvas.
//!
//! Provides:
//! - Geometric types (Point, Rect, Matrix)
//! - Matrix transformation operations
//! - Bounding box computation

/// A 2D point (x, y).
pub type Point = (f64, f64);

/// A rectangle defined by (x0, y0, x1, y1) where (x0, y0) is typically bottom-left
/// and (x1, y1) is top-right.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transformation matrix (a, b, c, d, e, f).
/// Transforms point (x, y) to (ax + cy + e, bx + dy + f).
pub type Matrix = (f64, f64, f64, f64, f64, f64);

/// Identity transformation matrix.
pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// Multiplies two matrices: result = m1 * m0.
/// The result applies m1 first, then m0.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

/// Applies a matrix to a point.
pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// Returns the tight bounding box of a set of points.
///
/// An empty input yields `None`.
pub fn get_bound<I: IntoIterator<Item = Point>>(pts: I) -> Option<Rect> {
    let mut iter = pts.into_iter();
    let (x, y) = iter.next()?;
    let mut bound = (x, y, x, y);
    for (x, y) in iter {
        bound.0 = bound.0.min(x);
        bound.1 = bound.1.min(y);
        bound.2 = bound.2.max(x);
        bound.3 = bound.3.max(y);
    }
    Some(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_neutral() {
        let m = (2.0, 0.5, -1.0, 3.0, 10.0, 20.0);
        assert_eq!(mult_matrix(m, MATRIX_IDENTITY), m);
        assert_eq!(mult_matrix(MATRIX_IDENTITY, m), m);
    }

    #[test]
    fn mult_applies_right_operand_first() {
        let scale = (2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let translate = (1.0, 0.0, 0.0, 1.0, 5.0, 7.0);
        // scale first, then translate
        let m = mult_matrix(scale, translate);
        assert_eq!(apply_matrix_pt(m, (1.0, 1.0)), (7.0, 9.0));
    }

    #[test]
    fn bound_of_points() {
        let b = get_bound([(1.0, 5.0), (-2.0, 3.0), (4.0, -1.0)]);
        assert_eq!(b, Some((-2.0, -1.0, 4.0, 5.0)));
        assert_eq!(get_bound(std::iter::empty()), None);
    }
}
