//! Graphics state operators.
//!
//! Handles: q, Q, cm, w
//!
//! These operators manage the graphics state stack and transformation matrix.
//! - q/Q: Push/pop graphics state
//! - cm: Concatenate transformation matrix
//! - w: Line width

use crate::interp::device::Canvas;
use crate::interp::interpreter::{PDFPageInterpreter, ProcessorTable};
use crate::utils::{Matrix, mult_matrix};
use tracing::debug;

#[allow(non_snake_case)]
impl<'a, C: Canvas> PDFPageInterpreter<'a, C> {
    pub(crate) fn register_graphics_state_ops(table: &mut ProcessorTable<'a, C>) {
        table.insert("q", |interp, _, _| {
            interp.do_q();
            Ok(())
        });
        table.insert("Q", |interp, _, _| {
            interp.do_Q();
            Ok(())
        });
        table.insert("cm", |interp, op, args| {
            let matrix = Self::pop_matrix(op, args)?;
            interp.do_cm(matrix);
            Ok(())
        });
        table.insert("w", |interp, op, args| {
            let width = Self::pop_scalar(op, args)?;
            interp.do_w(width);
            Ok(())
        });
    }

    /// Saves the current graphics state to the stack.
    ///
    /// PDF operator: `q`
    pub fn do_q(&mut self) {
        self.gstack.push(self.get_current_state());
    }

    /// Restores the graphics state from the stack.
    ///
    /// PDF operator: `Q`
    pub fn do_Q(&mut self) {
        match self.gstack.pop() {
            Some(state) => self.set_current_state(state),
            None => debug!("Q with empty graphics state stack"),
        }
    }

    /// Concatenates a matrix to the current transformation matrix.
    ///
    /// PDF operator: `cm`
    pub fn do_cm(&mut self, matrix: Matrix) {
        self.graphicstate.ctm = mult_matrix(matrix, self.graphicstate.ctm);
        self.canvas.set_ctm(self.graphicstate.ctm);
    }

    /// Sets the line width in the graphics state.
    ///
    /// PDF operator: `w`
    pub const fn do_w(&mut self, linewidth: f64) {
        self.graphicstate.linewidth = linewidth;
    }
}
