//! Graphics state and color values.

use super::color::{ColorSpace, ColorSpaceFamily, Components};
use crate::utils::{MATRIX_IDENTITY, Matrix};
use std::sync::Arc;

/// Color value held in the graphics state.
///
/// The three device families get their own variants; every other family
/// carries its components untyped:
/// - `Components` for CalGray, CalRGB, Lab, ICCBased, Indexed, Separation, DeviceN
/// - `PatternColored` for a colored tiling pattern (PaintType=1)
/// - `PatternUncolored` for an uncolored pattern (PaintType=2) with its base color
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Greyscale color (0.0 = black, 1.0 = white)
    Gray(f64),
    /// RGB color
    Rgb(f64, f64, f64),
    /// CMYK color
    Cmyk(f64, f64, f64, f64),
    /// Components in any other family
    Components {
        family: ColorSpaceFamily,
        values: Components,
    },
    /// Colored tiling pattern (PaintType=1) - just the pattern name
    PatternColored(String),
    /// Uncolored tiling pattern (PaintType=2) - base color + pattern name
    PatternUncolored(Box<Color>, String),
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(0.0)
    }
}

impl Color {
    /// Build the typed color for `values` in `family`.
    ///
    /// Device families with the right component count collapse to their
    /// dedicated variants.
    pub fn from_components(family: ColorSpaceFamily, values: &[f64]) -> Self {
        match (family, values) {
            (ColorSpaceFamily::DeviceGray, [g]) => Color::Gray(*g),
            (ColorSpaceFamily::DeviceRGB, [r, g, b]) => Color::Rgb(*r, *g, *b),
            (ColorSpaceFamily::DeviceCMYK, [c, m, y, k]) => Color::Cmyk(*c, *m, *y, *k),
            _ => Color::Components {
                family,
                values: Components::from_slice(values),
            },
        }
    }

    /// Initial color of a space, as selected by `CS`/`cs`.
    pub fn initial(space: &ColorSpace) -> Self {
        Self::from_components(space.family(), &space.initial_color())
    }

    /// Family the components are expressed in.
    pub fn family(&self) -> ColorSpaceFamily {
        match self {
            Color::Gray(_) => ColorSpaceFamily::DeviceGray,
            Color::Rgb(..) => ColorSpaceFamily::DeviceRGB,
            Color::Cmyk(..) => ColorSpaceFamily::DeviceCMYK,
            Color::Components { family, .. } => *family,
            Color::PatternColored(_) | Color::PatternUncolored(..) => ColorSpaceFamily::Pattern,
        }
    }

    /// Flatten to numeric components.
    ///
    /// For pattern colors:
    /// - PatternColored: returns empty vec (no numeric components)
    /// - PatternUncolored: returns the base color's components
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Color::Gray(g) => vec![*g],
            Color::Rgb(r, g, b) => vec![*r, *g, *b],
            Color::Cmyk(c, m, y, k) => vec![*c, *m, *y, *k],
            Color::Components { values, .. } => values.to_vec(),
            Color::PatternColored(_) => vec![],
            Color::PatternUncolored(base, _) => base.to_vec(),
        }
    }

    /// Get the pattern name if this is a pattern color.
    pub fn pattern_name(&self) -> Option<&str> {
        match self {
            Color::PatternColored(name) => Some(name),
            Color::PatternUncolored(_, name) => Some(name),
            _ => None,
        }
    }

    /// Check if this color is a pattern color.
    pub fn is_pattern(&self) -> bool {
        matches!(
            self,
            Color::PatternColored(_) | Color::PatternUncolored(_, _)
        )
    }
}

/// PDF Graphics State - the part of the drawing context saved by `q`.
///
/// The current path is not part of it; it lives on the interpreter and
/// survives `q`/`Q`.
#[derive(Debug, Clone)]
pub struct PDFGraphicState {
    /// Current transformation matrix
    pub ctm: Matrix,
    /// Line width for stroke operations
    pub linewidth: f64,

    /// Stroking color
    pub scolor: Color,
    /// Stroking color space
    pub scs: Arc<ColorSpace>,

    /// Non-stroking (fill) color
    pub ncolor: Color,
    /// Non-stroking color space
    pub ncs: Arc<ColorSpace>,
}

impl PDFGraphicState {
    /// Create new graphics state with default values.
    pub fn new() -> Self {
        Self::with_ctm(MATRIX_IDENTITY)
    }

    /// Default state under an initial transformation.
    pub fn with_ctm(ctm: Matrix) -> Self {
        let device_gray = ColorSpace::device_gray();
        Self {
            ctm,
            linewidth: 1.0,
            scolor: Color::Gray(0.0),
            scs: Arc::clone(&device_gray),
            ncolor: Color::Gray(0.0),
            ncs: device_gray,
        }
    }

    /// Active space for stroking (`stroke == true`) or filling.
    pub fn space(&self, stroke: bool) -> &Arc<ColorSpace> {
        if stroke { &self.scs } else { &self.ncs }
    }

    /// Current color for stroking or filling.
    pub fn color(&self, stroke: bool) -> &Color {
        if stroke { &self.scolor } else { &self.ncolor }
    }

    /// Replace the stroking or non-stroking color.
    pub fn set_color(&mut self, stroke: bool, color: Color) {
        if stroke {
            self.scolor = color;
        } else {
            self.ncolor = color;
        }
    }

    /// Select a space and reset the color to the space's initial color.
    pub fn set_space(&mut self, stroke: bool, space: Arc<ColorSpace>) {
        let color = Color::initial(&space);
        if stroke {
            self.scs = space;
            self.scolor = color;
        } else {
            self.ncs = space;
            self.ncolor = color;
        }
    }
}

impl Default for PDFGraphicState {
    fn default() -> Self {
        Self::new()
    }
}
