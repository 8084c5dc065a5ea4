//! Canvas - output interface for page interpretation.
//!
//! The interpreter emits device-space path segments and paint calls to a
//! [`Canvas`]. [`RecordingCanvas`] keeps every call, which is what tests and
//! the `paintdump` tool consume.

use crate::model::color::ColorSpaceFamily;
use crate::utils::{MATRIX_IDENTITY, Matrix, Point, Rect, apply_matrix_pt, get_bound};

/// Path segment for graphics operations, in device space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    /// Move to point (x, y)
    MoveTo(f64, f64),
    /// Line to point (x, y)
    LineTo(f64, f64),
    /// Cubic bezier curve (x1, y1, x2, y2, x3, y3)
    CurveTo(f64, f64, f64, f64, f64, f64),
    /// Close path
    ClosePath,
}

impl PathSegment {
    /// Points the segment mentions, control points included.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let pts: [Option<Point>; 3] = match *self {
            Self::MoveTo(x, y) | Self::LineTo(x, y) => [Some((x, y)), None, None],
            Self::CurveTo(x1, y1, x2, y2, x3, y3) => {
                [Some((x1, y1)), Some((x2, y2)), Some((x3, y3))]
            }
            Self::ClosePath => [None, None, None],
        };
        pts.into_iter().flatten()
    }
}

/// Ordered sequence of path segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// End point of the last segment.
    ///
    /// After a `ClosePath` this is the start of the closed subpath.
    pub fn current_point(&self) -> Option<Point> {
        match self.segments.last()? {
            PathSegment::MoveTo(x, y) | PathSegment::LineTo(x, y) => Some((*x, *y)),
            PathSegment::CurveTo(.., x, y) => Some((*x, *y)),
            PathSegment::ClosePath => self.segments.iter().rev().find_map(|s| match s {
                PathSegment::MoveTo(x, y) => Some((*x, *y)),
                _ => None,
            }),
        }
    }

    /// Tight box around every segment point, or `None` for an empty path.
    pub fn bounding_box(&self) -> Option<Rect> {
        get_bound(self.segments.iter().flat_map(PathSegment::points))
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

/// Canvas trait - receives the interpreter's geometric output.
pub trait Canvas {
    /// Set the current transformation matrix.
    fn set_ctm(&mut self, ctm: Matrix);

    /// Get the current transformation matrix.
    fn ctm(&self) -> Matrix;

    /// Map a user-space point to device space.
    fn transform_point(&self, x: f64, y: f64) -> Point {
        apply_matrix_pt(self.ctm(), (x, y))
    }

    /// Append a device-space segment to the current path.
    fn append_path_segment(&mut self, segment: PathSegment);

    /// Fill the current path.
    fn fill_path(&mut self, components: &[f64], family: ColorSpaceFamily, even_odd: bool);

    /// Stroke the current path.
    fn stroke_path(&mut self, components: &[f64], family: ColorSpaceFamily);

    /// Drop the current path without painting it (`n`).
    fn discard_path(&mut self) {}

    /// The current path has been consumed by a paint or discard operator.
    fn end_path(&mut self) {}
}

/// A call received by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasCall {
    SetCtm(Matrix),
    Segment(PathSegment),
    Fill {
        components: Vec<f64>,
        family: ColorSpaceFamily,
        even_odd: bool,
        path: Path,
    },
    Stroke {
        components: Vec<f64>,
        family: ColorSpaceFamily,
        path: Path,
    },
    Discard,
}

/// Canvas that records every call.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    ctm: Matrix,
    path: Path,
    calls: Vec<CanvasCall>,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingCanvas {
    pub const fn new() -> Self {
        Self {
            ctm: MATRIX_IDENTITY,
            path: Path { segments: Vec::new() },
            calls: Vec::new(),
        }
    }

    /// Calls in the order they arrived.
    pub fn calls(&self) -> &[CanvasCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<CanvasCall> {
        self.calls
    }

    /// Path built since the last paint or discard.
    pub const fn current_path(&self) -> &Path {
        &self.path
    }

    /// Painted paths, fills and strokes alike.
    pub fn painted(&self) -> impl Iterator<Item = &CanvasCall> {
        self.calls
            .iter()
            .filter(|c| matches!(c, CanvasCall::Fill { .. } | CanvasCall::Stroke { .. }))
    }
}

impl Canvas for RecordingCanvas {
    fn set_ctm(&mut self, ctm: Matrix) {
        self.ctm = ctm;
        self.calls.push(CanvasCall::SetCtm(ctm));
    }

    fn ctm(&self) -> Matrix {
        self.ctm
    }

    fn append_path_segment(&mut self, segment: PathSegment) {
        self.path.push(segment);
        self.calls.push(CanvasCall::Segment(segment));
    }

    fn fill_path(&mut self, components: &[f64], family: ColorSpaceFamily, even_odd: bool) {
        self.calls.push(CanvasCall::Fill {
            components: components.to_vec(),
            family,
            even_odd,
            path: self.path.clone(),
        });
    }

    fn stroke_path(&mut self, components: &[f64], family: ColorSpaceFamily) {
        self.calls.push(CanvasCall::Stroke {
            components: components.to_vec(),
            family,
            path: self.path.clone(),
        });
    }

    fn discard_path(&mut self) {
        self.calls.push(CanvasCall::Discard);
    }

    fn end_path(&mut self) {
        self.path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounding_box_includes_control_points() {
        let path: Path = [
            PathSegment::MoveTo(0.0, 0.0),
            PathSegment::CurveTo(-5.0, 10.0, 5.0, 12.0, 3.0, 1.0),
            PathSegment::ClosePath,
        ]
        .into_iter()
        .collect();
        assert_eq!(path.bounding_box(), Some((-5.0, 0.0, 5.0, 12.0)));
        assert_eq!(Path::new().bounding_box(), None);
    }

    #[test]
    fn current_point_after_close_is_subpath_start() {
        let path: Path = [
            PathSegment::MoveTo(1.0, 2.0),
            PathSegment::LineTo(3.0, 4.0),
            PathSegment::ClosePath,
        ]
        .into_iter()
        .collect();
        assert_eq!(path.current_point(), Some((1.0, 2.0)));
    }

    #[test]
    fn recording_canvas_transforms_with_ctm() {
        let mut canvas = RecordingCanvas::new();
        canvas.set_ctm((2.0, 0.0, 0.0, 2.0, 10.0, 0.0));
        assert_eq!(canvas.transform_point(1.0, 1.0), (12.0, 2.0));
    }
}
