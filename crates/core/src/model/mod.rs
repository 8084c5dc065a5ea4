//! PDF model types - objects, state, and color spaces.
//!
//! - `objects` - PDF object types (PDFObject, PDFStream, PDFObjRef) and reference resolution
//! - `state` - Graphics state and color values (PDFGraphicState, Color)
//! - `color` - Color spaces, their resolution and conversion

pub mod color;
pub mod objects;
pub mod state;

// Re-export main types for convenience
pub use color::{ColorSpace, ColorSpaceFamily, ColorSpaceResolver};
pub use objects::{MemoryObjectStore, ObjectResolver, PDFObjRef, PDFObject, PDFStream};
pub use state::{Color, PDFGraphicState};
