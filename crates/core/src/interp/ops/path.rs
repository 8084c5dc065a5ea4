//! Path construction and painting operators.
//!
//! Handles: m, l, c, v, y, h, re, S, s, f, F, f*, B, B*, b, b*, n
//!
//! Path construction:
//! - m: Move to
//! - l: Line to
//! - c, v, y: Bezier curves (cubic variants)
//! - h: Close subpath
//! - re: Rectangle shorthand
//!
//! Path painting:
//! - S/s: Stroke (s closes first)
//! - f/F/f*: Fill (F is legacy, f* uses even-odd rule)
//! - B/B*/b/b*: Fill then stroke
//! - n: End path without painting
//!
//! Coordinates are mapped through the CTM as they arrive, so the path and
//! the canvas only ever see device space.

use crate::error::PdfError;
use crate::interp::device::{Canvas, PathSegment};
use crate::interp::interpreter::{PDFPageInterpreter, ProcessorTable};

#[allow(non_snake_case)]
impl<'a, C: Canvas> PDFPageInterpreter<'a, C> {
    pub(crate) fn register_path_ops(table: &mut ProcessorTable<'a, C>) {
        table.insert("m", |interp, op, args| {
            let (x, y) = Self::pop_point(op, args)?;
            interp.do_m(x, y);
            Ok(())
        });
        table.insert("l", |interp, op, args| {
            let (x, y) = Self::pop_point(op, args)?;
            interp.do_l(x, y);
            Ok(())
        });
        table.insert("c", |interp, op, args| {
            let p = Self::pop_numbers(op, args, 6)?;
            interp.do_c(p[0], p[1], p[2], p[3], p[4], p[5]);
            Ok(())
        });
        table.insert("v", |interp, op, args| {
            let p = Self::pop_numbers(op, args, 4)?;
            interp.do_v(p[0], p[1], p[2], p[3]);
            Ok(())
        });
        table.insert("y", |interp, op, args| {
            if args.len() != 4 {
                return Err(PdfError::OperandCountError {
                    operator: op.to_string(),
                    expected: 4,
                    got: args.len(),
                });
            }
            let p = Self::pop_numbers(op, args, 4)?;
            interp.do_y(p[0], p[1], p[2], p[3]);
            Ok(())
        });
        table.insert("h", |interp, _, _| {
            interp.do_h();
            Ok(())
        });
        table.insert("re", |interp, op, args| {
            let p = Self::pop_numbers(op, args, 4)?;
            interp.do_re(p[0], p[1], p[2], p[3]);
            Ok(())
        });

        table.insert("S", |interp, _, _| {
            interp.do_S();
            Ok(())
        });
        table.insert("s", |interp, _, _| {
            interp.do_s();
            Ok(())
        });
        table.insert("f", |interp, _, _| {
            interp.do_f();
            Ok(())
        });
        table.insert("F", |interp, _, _| {
            interp.do_F();
            Ok(())
        });
        table.insert("f*", |interp, _, _| {
            interp.do_f_a();
            Ok(())
        });
        table.insert("B", |interp, _, _| {
            interp.do_B();
            Ok(())
        });
        table.insert("B*", |interp, _, _| {
            interp.do_B_a();
            Ok(())
        });
        table.insert("b", |interp, _, _| {
            interp.do_b();
            Ok(())
        });
        table.insert("b*", |interp, _, _| {
            interp.do_b_a();
            Ok(())
        });
        table.insert("n", |interp, _, _| {
            interp.do_n();
            Ok(())
        });
    }

    // ========================================================================
    // Path Construction Operators
    // ========================================================================

    /// Begins a new subpath at the given point.
    ///
    /// PDF operator: `m`
    pub fn do_m(&mut self, x: f64, y: f64) {
        let (x, y) = self.canvas.transform_point(x, y);
        self.append_segment(PathSegment::MoveTo(x, y));
    }

    /// Appends a straight line segment from the current point.
    ///
    /// PDF operator: `l`
    pub fn do_l(&mut self, x: f64, y: f64) {
        let (x, y) = self.canvas.transform_point(x, y);
        self.append_segment(PathSegment::LineTo(x, y));
    }

    /// Appends a cubic Bezier curve to the path.
    ///
    /// The curve extends from the current point to (x3, y3),
    /// using (x1, y1) and (x2, y2) as control points.
    ///
    /// PDF operator: `c`
    pub fn do_c(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        let (x1, y1) = self.canvas.transform_point(x1, y1);
        let (x2, y2) = self.canvas.transform_point(x2, y2);
        let (x3, y3) = self.canvas.transform_point(x3, y3);
        self.append_segment(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    /// Appends a cubic Bezier curve with the current point as first control point.
    ///
    /// With no current point the curve starts at the device origin.
    ///
    /// PDF operator: `v`
    pub fn do_v(&mut self, x2: f64, y2: f64, x3: f64, y3: f64) {
        let (x1, y1) = self.curpath.current_point().unwrap_or((0.0, 0.0));
        let (x2, y2) = self.canvas.transform_point(x2, y2);
        let (x3, y3) = self.canvas.transform_point(x3, y3);
        self.append_segment(PathSegment::CurveTo(x1, y1, x2, y2, x3, y3));
    }

    /// Appends a cubic Bezier curve with the endpoint as second control point.
    ///
    /// PDF operator: `y`
    pub fn do_y(&mut self, x1: f64, y1: f64, x3: f64, y3: f64) {
        let (x1, y1) = self.canvas.transform_point(x1, y1);
        let (x3, y3) = self.canvas.transform_point(x3, y3);
        self.append_segment(PathSegment::CurveTo(x1, y1, x3, y3, x3, y3));
    }

    /// Closes the current subpath by appending a straight line from the
    /// current point to the starting point of the subpath.
    ///
    /// PDF operator: `h`
    pub fn do_h(&mut self) {
        self.append_segment(PathSegment::ClosePath);
    }

    /// Appends a rectangle to the current path as a complete subpath.
    ///
    /// The corners are transformed first and the rectangle is rebuilt from
    /// its device-space extents, so the subpath always starts at the
    /// bottom-left device corner and has non-negative width and height.
    ///
    /// PDF operator: `re`
    pub fn do_re(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let (mut x0, mut y0) = self.canvas.transform_point(x, y);
        let (x1, y1) = self.canvas.transform_point(x + w, y + h);
        let mut width = x1 - x0;
        let mut height = y1 - y0;
        if width < 0.0 {
            x0 += width;
            width = -width;
        }
        if height < 0.0 {
            y0 += height;
            height = -height;
        }
        self.append_segment(PathSegment::MoveTo(x0, y0));
        self.append_segment(PathSegment::LineTo(x0 + width, y0));
        self.append_segment(PathSegment::LineTo(x0 + width, y0 + height));
        self.append_segment(PathSegment::LineTo(x0, y0 + height));
        self.append_segment(PathSegment::LineTo(x0, y0));
        self.append_segment(PathSegment::ClosePath);
    }

    // ========================================================================
    // Path Painting Operators
    // ========================================================================

    /// Strokes the current path.
    ///
    /// PDF operator: `S`
    pub fn do_S(&mut self) {
        self.paint_path(true, false, false);
    }

    /// Closes and strokes the current path.
    ///
    /// PDF operator: `s`
    pub fn do_s(&mut self) {
        self.do_h();
        self.paint_path(true, false, false);
    }

    /// Fills the current path using the nonzero winding number rule.
    ///
    /// PDF operator: `f`
    pub fn do_f(&mut self) {
        self.paint_path(false, true, false);
    }

    /// Fills the current path (obsolete equivalent of `f`).
    ///
    /// PDF operator: `F`
    pub fn do_F(&mut self) {
        self.do_f();
    }

    /// Fills the current path using the even-odd rule.
    ///
    /// PDF operator: `f*`
    pub fn do_f_a(&mut self) {
        self.paint_path(false, true, true);
    }

    /// Fills and then strokes the current path (nonzero winding).
    ///
    /// PDF operator: `B`
    pub fn do_B(&mut self) {
        self.paint_path(true, true, false);
    }

    /// Fills and then strokes the current path (even-odd).
    ///
    /// PDF operator: `B*`
    pub fn do_B_a(&mut self) {
        self.paint_path(true, true, true);
    }

    /// Closes, fills and strokes the current path (nonzero winding).
    ///
    /// PDF operator: `b`
    pub fn do_b(&mut self) {
        self.do_h();
        self.paint_path(true, true, false);
    }

    /// Closes, fills and strokes the current path (even-odd).
    ///
    /// PDF operator: `b*`
    pub fn do_b_a(&mut self) {
        self.do_h();
        self.paint_path(true, true, true);
    }

    /// Ends the path object without filling or stroking it.
    ///
    /// PDF operator: `n`
    pub fn do_n(&mut self) {
        self.paint_path(false, false, false);
    }
}
