//! Color spaces and color conversion.
//!
//! - `convert` - conversion kernel between device encodings, RGB and XYZ
//! - `space` - the color space variants
//! - `resolve` - descriptor resolution and caching
//! - `tint` - tint transforms of Separation and DeviceN spaces

pub mod convert;
pub mod resolve;
pub mod space;
pub mod tint;

pub use convert::Components;
pub use resolve::{ColorSpaceResolver, NativeColorSpace, ResolverOptions};
pub use space::{
    CalGray, CalRGB, ColorSpace, ColorSpaceFamily, DeviceN, IccBased, Indexed, Lab, PatternSpace,
    Separation,
};
pub use tint::TintTransform;
