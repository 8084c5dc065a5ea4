//! PDF content stream operator implementations.
//!
//! Operators are grouped by category:
//! - `graphics_state` - State stack and transforms (q, Q, cm, w)
//! - `color` - Color space and values (CS, cs, G, g, RG, rg, K, k, SC, SCN, sc, scn)
//! - `path` - Path construction and painting (m, l, c, v, y, h, re, S, s, f, F, f\*, B, B\*, b, b\*, n)

mod color;
mod graphics_state;
mod path;

pub use color::NativeProcessor;
