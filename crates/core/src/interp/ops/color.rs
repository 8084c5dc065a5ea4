//! Color operators.
//!
//! Handles: CS, cs, G, g, RG, rg, K, k, SC, SCN, sc, scn
//!
//! - CS/cs: Select color space from resources (stroke/non-stroke)
//! - G/g: DeviceGray (stroke/non-stroke)
//! - RG/rg: DeviceRGB (stroke/non-stroke)
//! - K/k: DeviceCMYK (stroke/non-stroke)
//! - SC/SCN/sc/scn: Set color in current color space
//!
//! Colors set while a Separation space is active are re-dispatched to the
//! native processor of the Separation's alternate space. The active space
//! stays the Separation; only the color value changes.

use crate::error::{PdfError, Result};
use crate::interp::device::Canvas;
use crate::interp::interpreter::{PDFPageInterpreter, ProcessorTable};
use crate::model::color::{ColorSpace, ColorSpaceFamily, Separation};
use crate::model::objects::PDFObject;
use crate::model::state::Color;
use std::sync::Arc;

/// Processors that store a color value without changing the active space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeProcessor {
    Gray,
    Rgb,
    Cmyk,
    IccBased,
    CalRgb,
}

impl NativeProcessor {
    pub const fn family(self) -> ColorSpaceFamily {
        match self {
            Self::Gray => ColorSpaceFamily::DeviceGray,
            Self::Rgb => ColorSpaceFamily::DeviceRGB,
            Self::Cmyk => ColorSpaceFamily::DeviceCMYK,
            Self::IccBased => ColorSpaceFamily::ICCBased,
            Self::CalRgb => ColorSpaceFamily::CalRGB,
        }
    }
}

/// Where a Separation's color goes once tinted.
enum Redispatch<'s> {
    Native(NativeProcessor),
    Nested(&'s Separation),
    Unsupported,
}

fn redispatch_target(alternate: &ColorSpace) -> Redispatch<'_> {
    match alternate {
        ColorSpace::DeviceGray => Redispatch::Native(NativeProcessor::Gray),
        ColorSpace::DeviceRGB => Redispatch::Native(NativeProcessor::Rgb),
        ColorSpace::DeviceCMYK => Redispatch::Native(NativeProcessor::Cmyk),
        ColorSpace::ICCBased(_) => Redispatch::Native(NativeProcessor::IccBased),
        ColorSpace::CalRGB(_) => Redispatch::Native(NativeProcessor::CalRgb),
        ColorSpace::Separation(inner) => Redispatch::Nested(inner),
        ColorSpace::CalGray(_)
        | ColorSpace::Lab(_)
        | ColorSpace::Indexed(_)
        | ColorSpace::DeviceN(_)
        | ColorSpace::Pattern(_) => Redispatch::Unsupported,
    }
}

#[allow(non_snake_case)]
impl<'a, C: Canvas> PDFPageInterpreter<'a, C> {
    pub(crate) fn register_color_ops(table: &mut ProcessorTable<'a, C>) {
        table.insert("CS", |interp, op, args| interp.do_CS(op, args, true));
        table.insert("cs", |interp, op, args| interp.do_CS(op, args, false));
        table.insert("G", |interp, op, args| {
            let gray = Self::pop_scalar(op, args)?;
            interp.do_G(gray);
            Ok(())
        });
        table.insert("g", |interp, op, args| {
            let gray = Self::pop_scalar(op, args)?;
            interp.do_g(gray);
            Ok(())
        });
        table.insert("RG", |interp, op, args| {
            let v = Self::pop_numbers(op, args, 3)?;
            interp.do_RG(v[0], v[1], v[2]);
            Ok(())
        });
        table.insert("rg", |interp, op, args| {
            let v = Self::pop_numbers(op, args, 3)?;
            interp.do_rg(v[0], v[1], v[2]);
            Ok(())
        });
        table.insert("K", |interp, op, args| {
            let v = Self::pop_numbers(op, args, 4)?;
            interp.do_K(v[0], v[1], v[2], v[3]);
            Ok(())
        });
        table.insert("k", |interp, op, args| {
            let v = Self::pop_numbers(op, args, 4)?;
            interp.do_k(v[0], v[1], v[2], v[3]);
            Ok(())
        });
        table.insert("SC", |interp, op, args| interp.do_SC(op, args, true));
        table.insert("SCN", |interp, op, args| interp.do_SC(op, args, true));
        table.insert("sc", |interp, op, args| interp.do_SC(op, args, false));
        table.insert("scn", |interp, op, args| interp.do_SC(op, args, false));
    }

    /// Selects a color space from the page resources.
    ///
    /// PDF operator: `CS` / `cs`
    ///
    /// The color resets to the space's initial color. A space that fails to
    /// resolve leaves the current one in place.
    pub fn do_CS(&mut self, operator: &str, args: &mut Vec<PDFObject>, stroke: bool) -> Result<()> {
        let operand = args.pop().ok_or_else(|| PdfError::OperandCountError {
            operator: operator.to_string(),
            expected: 1,
            got: 0,
        })?;
        let space = self.resolver.resolve_resource(operand.as_name()?, &self.resources)?;
        self.graphicstate.set_space(stroke, space);
        Ok(())
    }

    /// Sets the gray level for stroking operations.
    ///
    /// PDF operator: `G`
    pub fn do_G(&mut self, gray: f64) {
        self.graphicstate.set_space(true, ColorSpace::device_gray());
        self.apply_native(NativeProcessor::Gray, true, &[gray]);
    }

    /// Sets the gray level for non-stroking operations.
    ///
    /// PDF operator: `g`
    pub fn do_g(&mut self, gray: f64) {
        self.graphicstate.set_space(false, ColorSpace::device_gray());
        self.apply_native(NativeProcessor::Gray, false, &[gray]);
    }

    /// Sets the RGB color for stroking operations.
    ///
    /// PDF operator: `RG`
    pub fn do_RG(&mut self, r: f64, g: f64, b: f64) {
        self.graphicstate.set_space(true, ColorSpace::device_rgb());
        self.apply_native(NativeProcessor::Rgb, true, &[r, g, b]);
    }

    /// Sets the RGB color for non-stroking operations.
    ///
    /// PDF operator: `rg`
    pub fn do_rg(&mut self, r: f64, g: f64, b: f64) {
        self.graphicstate.set_space(false, ColorSpace::device_rgb());
        self.apply_native(NativeProcessor::Rgb, false, &[r, g, b]);
    }

    /// Sets the CMYK color for stroking operations.
    ///
    /// PDF operator: `K`
    pub fn do_K(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.graphicstate.set_space(true, ColorSpace::device_cmyk());
        self.apply_native(NativeProcessor::Cmyk, true, &[c, m, y, k]);
    }

    /// Sets the CMYK color for non-stroking operations.
    ///
    /// PDF operator: `k`
    pub fn do_k(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.graphicstate.set_space(false, ColorSpace::device_cmyk());
        self.apply_native(NativeProcessor::Cmyk, false, &[c, m, y, k]);
    }

    /// Store `values` as the current color in the processor's family.
    pub fn apply_native(&mut self, processor: NativeProcessor, stroke: bool, values: &[f64]) {
        let color = Color::from_components(processor.family(), values);
        self.graphicstate.set_color(stroke, color);
    }

    /// Sets the color in the current color space.
    ///
    /// PDF operator: `SC` / `SCN` / `sc` / `scn`
    ///
    /// Handles Pattern color spaces per ISO 32000-1:2008 4.5.5 (PDF 1.7)
    /// and ISO 32000-2:2020 8.7.3 (PDF 2.0):
    /// - Colored patterns (PaintType=1): single operand (pattern name)
    /// - Uncolored patterns (PaintType=2): n+1 operands (colors + pattern name)
    pub fn do_SC(&mut self, operator: &str, args: &mut Vec<PDFObject>, stroke: bool) -> Result<()> {
        let space = Arc::clone(self.graphicstate.space(stroke));
        match space.as_ref() {
            ColorSpace::Separation(_) => self.do_separation_color(operator, args, stroke),
            ColorSpace::Pattern(pattern) => {
                let name = match args.pop() {
                    Some(PDFObject::Name(name)) => name,
                    Some(other) => {
                        return Err(PdfError::TypeError {
                            expected: "name",
                            got: other.type_name(),
                        });
                    }
                    None => {
                        return Err(PdfError::OperandCountError {
                            operator: operator.to_string(),
                            expected: 1,
                            got: 0,
                        });
                    }
                };
                let color = match (&pattern.underlying, args.is_empty()) {
                    (_, true) => Color::PatternColored(name),
                    (Some(base), false) => {
                        let values = Self::pop_numbers(operator, args, base.n_components())?;
                        let base_color = Color::from_components(base.family(), &values);
                        Color::PatternUncolored(Box::new(base_color), name)
                    }
                    (None, false) => {
                        return Err(PdfError::InvalidColorSpaceOperator {
                            operator: operator.to_string(),
                            space: space.to_string(),
                        });
                    }
                };
                self.graphicstate.set_color(stroke, color);
                Ok(())
            }
            _ => {
                let n = space.n_components();
                if args.len() != n {
                    return Err(PdfError::OperandCountError {
                        operator: operator.to_string(),
                        expected: n,
                        got: args.len(),
                    });
                }
                let values = Self::pop_numbers(operator, args, n)?;
                let color = Color::from_components(space.family(), &values);
                self.graphicstate.set_color(stroke, color);
                Ok(())
            }
        }
    }

    /// Sets a Separation tint through the alternate space's processor.
    ///
    /// PDF operator: `SC` / `SCN` / `sc` / `scn` with a Separation space active
    ///
    /// Fails with `InvalidColorSpaceOperator` when the active space is not
    /// a Separation, and with `UnsupportedAlternateColorSpace` when no native
    /// processor exists for the alternate space. The color is left unchanged
    /// in both cases.
    pub fn do_separation_color(
        &mut self,
        operator: &str,
        args: &mut Vec<PDFObject>,
        stroke: bool,
    ) -> Result<()> {
        let space = Arc::clone(self.graphicstate.space(stroke));
        let ColorSpace::Separation(separation) = space.as_ref() else {
            return Err(PdfError::InvalidColorSpaceOperator {
                operator: operator.to_string(),
                space: space.to_string(),
            });
        };
        let tint = Self::pop_numbers(operator, args, 1)?;
        self.redispatch_separation(operator, separation, &tint, stroke)
    }

    fn redispatch_separation(
        &mut self,
        operator: &str,
        separation: &Separation,
        tint: &[f64],
        stroke: bool,
    ) -> Result<()> {
        let alternate = separation.alternate_space();
        match redispatch_target(alternate) {
            Redispatch::Unsupported => Err(PdfError::UnsupportedAlternateColorSpace {
                operator: operator.to_string(),
                space: alternate.to_string(),
            }),
            Redispatch::Native(processor) => {
                let values = separation.tinted_components(tint)?;
                self.apply_native(processor, stroke, &values);
                Ok(())
            }
            Redispatch::Nested(inner) => {
                let values = separation.tinted_components(tint)?;
                self.redispatch_separation(operator, inner, &values, stroke)
            }
        }
    }
}
