//! Color space variants.
//!
//! [`ColorSpace`] is a closed sum over every supported space. Instances are
//! immutable once resolved and are shared as `Arc<ColorSpace>`; the three
//! device spaces exist once per process.
//!
//! Conversions return `Ok(None)` when the input length does not match the
//! space, or when the space has no numeric color (a Pattern without an
//! underlying space). `Err` only comes out of tint transforms.

use super::convert::{
    self, Components, D65_WHITE_POINT, bradford_adapt, lab_to_xyz, mat3_invert, mat3_mul,
    xyz_to_lab,
};
use super::tint::TintTransform;
use crate::error::Result;
use crate::model::objects::{PDFObject, PDFStream};
use smallvec::smallvec;
use std::fmt;
use std::sync::{Arc, LazyLock};

static DEVICE_GRAY: LazyLock<Arc<ColorSpace>> = LazyLock::new(|| Arc::new(ColorSpace::DeviceGray));
static DEVICE_RGB: LazyLock<Arc<ColorSpace>> = LazyLock::new(|| Arc::new(ColorSpace::DeviceRGB));
static DEVICE_CMYK: LazyLock<Arc<ColorSpace>> = LazyLock::new(|| Arc::new(ColorSpace::DeviceCMYK));

/// Tag identifying a color space variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpaceFamily {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    CalGray,
    CalRGB,
    Lab,
    ICCBased,
    Indexed,
    Separation,
    DeviceN,
    Pattern,
}

impl ColorSpaceFamily {
    /// The PDF name of the family.
    pub const fn name(self) -> &'static str {
        match self {
            Self::DeviceGray => "DeviceGray",
            Self::DeviceRGB => "DeviceRGB",
            Self::DeviceCMYK => "DeviceCMYK",
            Self::CalGray => "CalGray",
            Self::CalRGB => "CalRGB",
            Self::Lab => "Lab",
            Self::ICCBased => "ICCBased",
            Self::Indexed => "Indexed",
            Self::Separation => "Separation",
            Self::DeviceN => "DeviceN",
            Self::Pattern => "Pattern",
        }
    }
}

impl fmt::Display for ColorSpaceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// CIE-based gray space.
#[derive(Debug, Clone, PartialEq)]
pub struct CalGray {
    pub white_point: [f64; 3],
    pub black_point: [f64; 3],
    pub gamma: f64,
}

impl CalGray {
    fn to_xyz(&self, a: f64) -> [f64; 3] {
        let ag = a.clamp(0.0, 1.0).powf(self.gamma);
        let wp = self.white_point;
        bradford_adapt([wp[0] * ag, wp[1] * ag, wp[2] * ag], wp, D65_WHITE_POINT)
    }

    fn from_xyz(&self, xyz: [f64; 3]) -> f64 {
        let local = bradford_adapt(xyz, D65_WHITE_POINT, self.white_point);
        let y = (local[1] / self.white_point[1]).max(0.0);
        y.powf(1.0 / self.gamma)
    }
}

/// CIE-based RGB space.
#[derive(Debug, Clone, PartialEq)]
pub struct CalRGB {
    pub white_point: [f64; 3],
    pub black_point: [f64; 3],
    pub gamma: [f64; 3],
    /// Column-major `[XA YA ZA XB YB ZB XC YC ZC]`, as written in the dictionary.
    pub matrix: [f64; 9],
}

impl CalRGB {
    fn abc_to_xyz_matrix(&self) -> convert::Mat3 {
        let m = &self.matrix;
        [[m[0], m[3], m[6]], [m[1], m[4], m[7]], [m[2], m[5], m[8]]]
    }

    fn to_xyz(&self, abc: [f64; 3]) -> [f64; 3] {
        let mut v = [0.0; 3];
        for i in 0..3 {
            v[i] = abc[i].clamp(0.0, 1.0).powf(self.gamma[i]);
        }
        let xyz = mat3_mul(&self.abc_to_xyz_matrix(), v);
        bradford_adapt(xyz, self.white_point, D65_WHITE_POINT)
    }

    fn from_xyz(&self, xyz: [f64; 3]) -> Option<[f64; 3]> {
        let local = bradford_adapt(xyz, D65_WHITE_POINT, self.white_point);
        let inv = mat3_invert(&self.abc_to_xyz_matrix())?;
        let v = mat3_mul(&inv, local);
        let mut abc = [0.0; 3];
        for i in 0..3 {
            abc[i] = v[i].max(0.0).powf(1.0 / self.gamma[i]);
        }
        Some(abc)
    }
}

/// CIE L*a*b* space.
#[derive(Debug, Clone, PartialEq)]
pub struct Lab {
    pub white_point: [f64; 3],
    pub black_point: [f64; 3],
    /// `[amin amax bmin bmax]`
    pub range: [f64; 4],
}

impl Lab {
    pub const DEFAULT_RANGE: [f64; 4] = [-100.0, 100.0, -100.0, 100.0];

    fn clamp(&self, lab: [f64; 3]) -> [f64; 3] {
        [
            lab[0].clamp(0.0, 100.0),
            lab[1].max(self.range[0]).min(self.range[1]),
            lab[2].max(self.range[2]).min(self.range[3]),
        ]
    }

    fn to_xyz(&self, lab: [f64; 3]) -> [f64; 3] {
        let xyz = lab_to_xyz(self.clamp(lab), self.white_point);
        bradford_adapt(xyz, self.white_point, D65_WHITE_POINT)
    }

    fn from_xyz(&self, xyz: [f64; 3]) -> [f64; 3] {
        let local = bradford_adapt(xyz, D65_WHITE_POINT, self.white_point);
        self.clamp(xyz_to_lab(local, self.white_point))
    }
}

/// ICC profile based space.
///
/// Profiles are not executed. The profile header's data color space picks
/// the matching device space; otherwise the alternate space, otherwise the
/// device space implied by the component count.
#[derive(Debug, Clone)]
pub struct IccBased {
    pub profile: PDFStream,
    pub n: usize,
    /// `[min0 max0 min1 max1 ...]`, two entries per component.
    pub ranges: Vec<f64>,
    pub alternate: Option<Arc<ColorSpace>>,
}

impl IccBased {
    /// Data color space signature from the profile header (bytes 16..20).
    pub fn header_signature(&self) -> Option<[u8; 4]> {
        let data = self.profile.get_data();
        data.get(16..20).and_then(|s| s.try_into().ok())
    }

    /// Space that conversions are delegated to.
    pub fn fallback(&self) -> Arc<ColorSpace> {
        let from_header = match (self.header_signature().as_ref().map(|s| &s[..]), self.n) {
            (Some(b"GRAY"), 1) => Some(ColorSpace::device_gray()),
            (Some(b"RGB "), 3) => Some(ColorSpace::device_rgb()),
            (Some(b"CMYK"), 4) => Some(ColorSpace::device_cmyk()),
            _ => None,
        };
        from_header
            .or_else(|| {
                self.alternate
                    .clone()
                    .filter(|alt| alt.n_components() == self.n)
            })
            .unwrap_or_else(|| match self.n {
                1 => ColorSpace::device_gray(),
                4 => ColorSpace::device_cmyk(),
                _ => ColorSpace::device_rgb(),
            })
    }

    fn initial_color(&self) -> Components {
        (0..self.n)
            .map(|i| match self.ranges.get(2 * i..2 * i + 2) {
                Some([lo, hi]) => 0.0f64.clamp(*lo, hi.max(*lo)),
                _ => 0.0,
            })
            .collect()
    }
}

/// Palette space.
#[derive(Debug, Clone)]
pub struct Indexed {
    pub base: Arc<ColorSpace>,
    pub hival: usize,
    /// One row of base components per index, `hival + 1` rows.
    pub lookup: Vec<Components>,
}

impl Indexed {
    /// Row for a (possibly out of range) index value.
    ///
    /// The value is clamped into `[0, hival]` and rounded.
    pub fn lookup_row(&self, value: f64) -> Option<&Components> {
        let idx = (value.clamp(0.0, self.hival as f64) + 0.5) as usize;
        self.lookup.get(idx.min(self.lookup.len().saturating_sub(1)))
    }

    fn nearest_index(&self, rgb: &[f64]) -> Result<Option<Components>> {
        let mut best: Option<(usize, f64)> = None;
        for (i, row) in self.lookup.iter().enumerate() {
            let Some(candidate) = self.base.to_rgb(row)? else {
                continue;
            };
            let dist: f64 = candidate.iter().zip(rgb).map(|(a, b)| (a - b) * (a - b)).sum();
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        Ok(best.map(|(i, _)| smallvec![i as f64]))
    }
}

/// Single-colorant space painted through an alternate space.
#[derive(Debug, Clone)]
pub struct Separation {
    colorant: String,
    alternate: Arc<ColorSpace>,
    tint: TintTransform,
    descriptor_len: usize,
    color_values: Option<Vec<f64>>,
}

impl Separation {
    pub fn new(
        colorant: String,
        alternate: Arc<ColorSpace>,
        tint: TintTransform,
        descriptor_len: usize,
        color_values: Option<Vec<f64>>,
    ) -> Self {
        Self {
            colorant,
            alternate,
            tint,
            descriptor_len,
            color_values,
        }
    }

    pub fn colorant_name(&self) -> &str {
        &self.colorant
    }

    pub const fn alternate_space(&self) -> &Arc<ColorSpace> {
        &self.alternate
    }

    pub const fn tint_transform(&self) -> &TintTransform {
        &self.tint
    }

    /// Element count of the array this space was resolved from.
    pub const fn descriptor_len(&self) -> usize {
        self.descriptor_len
    }

    /// `C1` entry of the tint transform dictionary, if any.
    pub fn color_values(&self) -> Option<&[f64]> {
        self.color_values.as_deref()
    }

    /// Alternate-space components for a tint.
    ///
    /// Uses the `C1` values when present; otherwise evaluates the tint
    /// transform.
    pub fn tinted_components(&self, tint: &[f64]) -> Result<Components> {
        match self.color_values() {
            Some(values) => Ok(Components::from_slice(values)),
            None => self.tint.evaluate(tint),
        }
    }

    /// Tint whose alternate-space color is closest to `rgb`.
    fn nearest_tint(&self, rgb: &[f64]) -> Result<Option<Components>> {
        const STEPS: usize = 256;
        let mut best: Option<(f64, f64)> = None;
        for step in 0..=STEPS {
            let t = step as f64 / STEPS as f64;
            let alt = self.tint.evaluate(&[t])?;
            let Some(candidate) = self.alternate.to_rgb(&alt)? else {
                return Ok(None);
            };
            let dist: f64 = candidate.iter().zip(rgb).map(|(a, b)| (a - b) * (a - b)).sum();
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((t, dist));
            }
        }
        Ok(best.map(|(t, _)| smallvec![t]))
    }
}

/// Multi-colorant space painted through an alternate space.
#[derive(Debug, Clone)]
pub struct DeviceN {
    colorants: Vec<String>,
    alternate: Arc<ColorSpace>,
    tint: TintTransform,
    attributes: Option<PDFObject>,
}

impl DeviceN {
    pub fn new(
        colorants: Vec<String>,
        alternate: Arc<ColorSpace>,
        tint: TintTransform,
        attributes: Option<PDFObject>,
    ) -> Self {
        Self {
            colorants,
            alternate,
            tint,
            attributes,
        }
    }

    pub fn colorant_names(&self) -> &[String] {
        &self.colorants
    }

    pub const fn alternate_space(&self) -> &Arc<ColorSpace> {
        &self.alternate
    }

    pub const fn tint_transform(&self) -> &TintTransform {
        &self.tint
    }

    /// Attributes dictionary (fifth array element), kept as is.
    pub const fn attributes(&self) -> Option<&PDFObject> {
        self.attributes.as_ref()
    }
}

/// Pattern space, optionally over the space of uncolored patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSpace {
    pub underlying: Option<Arc<ColorSpace>>,
}

/// A resolved color space.
#[derive(Debug, Clone)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    CalGray(CalGray),
    CalRGB(CalRGB),
    Lab(Lab),
    ICCBased(IccBased),
    Indexed(Indexed),
    Separation(Separation),
    DeviceN(DeviceN),
    Pattern(PatternSpace),
}

impl fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Separation(sep) => write!(f, "Separation({})", sep.colorant),
            _ => f.write_str(self.family().name()),
        }
    }
}

fn triple(c: &[f64]) -> Option<[f64; 3]> {
    c.try_into().ok()
}

fn components(v: [f64; 3]) -> Option<Components> {
    Some(Components::from_slice(&v))
}

impl ColorSpace {
    /// The shared DeviceGray instance.
    pub fn device_gray() -> Arc<Self> {
        Arc::clone(&DEVICE_GRAY)
    }

    /// The shared DeviceRGB instance.
    pub fn device_rgb() -> Arc<Self> {
        Arc::clone(&DEVICE_RGB)
    }

    /// The shared DeviceCMYK instance.
    pub fn device_cmyk() -> Arc<Self> {
        Arc::clone(&DEVICE_CMYK)
    }

    pub const fn family(&self) -> ColorSpaceFamily {
        match self {
            Self::DeviceGray => ColorSpaceFamily::DeviceGray,
            Self::DeviceRGB => ColorSpaceFamily::DeviceRGB,
            Self::DeviceCMYK => ColorSpaceFamily::DeviceCMYK,
            Self::CalGray(_) => ColorSpaceFamily::CalGray,
            Self::CalRGB(_) => ColorSpaceFamily::CalRGB,
            Self::Lab(_) => ColorSpaceFamily::Lab,
            Self::ICCBased(_) => ColorSpaceFamily::ICCBased,
            Self::Indexed(_) => ColorSpaceFamily::Indexed,
            Self::Separation(_) => ColorSpaceFamily::Separation,
            Self::DeviceN(_) => ColorSpaceFamily::DeviceN,
            Self::Pattern(_) => ColorSpaceFamily::Pattern,
        }
    }

    /// Number of components a color in this space has.
    pub fn n_components(&self) -> usize {
        match self {
            Self::DeviceGray | Self::CalGray(_) | Self::Indexed(_) | Self::Separation(_) => 1,
            Self::DeviceRGB | Self::CalRGB(_) | Self::Lab(_) => 3,
            Self::DeviceCMYK => 4,
            Self::ICCBased(icc) => icc.n,
            Self::DeviceN(dn) => dn.colorants.len(),
            Self::Pattern(p) => p.underlying.as_ref().map_or(1, |u| u.n_components()),
        }
    }

    /// Color selected by `CS`/`cs` before any `SC`.
    pub fn initial_color(&self) -> Components {
        match self {
            Self::DeviceGray | Self::CalGray(_) | Self::Indexed(_) => smallvec![0.0],
            Self::DeviceRGB | Self::CalRGB(_) => smallvec![0.0, 0.0, 0.0],
            Self::DeviceCMYK => smallvec![0.0, 0.0, 0.0, 1.0],
            Self::Lab(lab) => Components::from_slice(&lab.clamp([0.0, 0.0, 0.0])),
            Self::ICCBased(icc) => icc.initial_color(),
            Self::Separation(_) => smallvec![1.0],
            Self::DeviceN(dn) => smallvec![1.0; dn.colorants.len()],
            Self::Pattern(_) => Components::new(),
        }
    }

    /// Space components to RGB.
    pub fn to_rgb(&self, c: &[f64]) -> Result<Option<Components>> {
        if c.len() != self.n_components() {
            return Ok(None);
        }
        Ok(match self {
            Self::DeviceGray => convert::gray_to_rgb(c),
            Self::DeviceRGB => Some(Components::from_slice(c)),
            Self::DeviceCMYK => convert::cmyk_to_rgb(c),
            Self::CalGray(_) | Self::CalRGB(_) | Self::Lab(_) => {
                return match self.to_xyz(c)? {
                    Some(xyz) => Ok(convert::xyz_to_rgb(&xyz)),
                    None => Ok(None),
                };
            }
            Self::ICCBased(icc) => return icc.fallback().to_rgb(c),
            Self::Indexed(idx) => match idx.lookup_row(c[0]) {
                Some(row) => return idx.base.to_rgb(row),
                None => None,
            },
            Self::Separation(sep) => {
                let alt = sep.tint.evaluate(c)?;
                return sep.alternate.to_rgb(&alt);
            }
            Self::DeviceN(dn) => {
                let alt = dn.tint.evaluate(c)?;
                return dn.alternate.to_rgb(&alt);
            }
            Self::Pattern(p) => match &p.underlying {
                Some(u) => return u.to_rgb(c),
                None => None,
            },
        })
    }

    /// RGB to space components.
    ///
    /// Indexed spaces answer with the nearest palette entry and Separation
    /// spaces with the nearest tint. DeviceN has no inverse for more than
    /// one colorant.
    pub fn from_rgb(&self, rgb: &[f64]) -> Result<Option<Components>> {
        if rgb.len() != 3 {
            return Ok(None);
        }
        Ok(match self {
            Self::DeviceGray => convert::rgb_to_gray(rgb),
            Self::DeviceRGB => Some(Components::from_slice(rgb)),
            Self::DeviceCMYK => convert::rgb_to_cmyk(rgb),
            Self::CalGray(_) | Self::CalRGB(_) | Self::Lab(_) => match convert::rgb_to_xyz(rgb) {
                Some(xyz) => return self.from_xyz(&xyz),
                None => None,
            },
            Self::ICCBased(icc) => return icc.fallback().from_rgb(rgb),
            Self::Indexed(idx) => return idx.nearest_index(rgb),
            Self::Separation(sep) => return sep.nearest_tint(rgb),
            Self::DeviceN(_) => None,
            Self::Pattern(p) => match &p.underlying {
                Some(u) => return u.from_rgb(rgb),
                None => None,
            },
        })
    }

    /// Space components to CIE XYZ (D65).
    pub fn to_xyz(&self, c: &[f64]) -> Result<Option<Components>> {
        if c.len() != self.n_components() {
            return Ok(None);
        }
        Ok(match self {
            Self::DeviceGray => convert::gray_to_rgb(c).and_then(|rgb| convert::rgb_to_xyz(&rgb)),
            Self::DeviceRGB => convert::rgb_to_xyz(c),
            Self::DeviceCMYK => convert::cmyk_to_xyz(c),
            Self::CalGray(cal) => components(cal.to_xyz(c[0])),
            Self::CalRGB(cal) => triple(c).and_then(|abc| components(cal.to_xyz(abc))),
            Self::Lab(lab) => triple(c).and_then(|v| components(lab.to_xyz(v))),
            Self::ICCBased(icc) => return icc.fallback().to_xyz(c),
            Self::Indexed(idx) => match idx.lookup_row(c[0]) {
                Some(row) => return idx.base.to_xyz(row),
                None => None,
            },
            Self::Separation(sep) => {
                let alt = sep.tint.evaluate(c)?;
                return sep.alternate.to_xyz(&alt);
            }
            Self::DeviceN(dn) => {
                let alt = dn.tint.evaluate(c)?;
                return dn.alternate.to_xyz(&alt);
            }
            Self::Pattern(p) => match &p.underlying {
                Some(u) => return u.to_xyz(c),
                None => None,
            },
        })
    }

    /// CIE XYZ (D65) to space components.
    pub fn from_xyz(&self, xyz: &[f64]) -> Result<Option<Components>> {
        let Some(v) = triple(xyz) else {
            return Ok(None);
        };
        Ok(match self {
            Self::DeviceGray => convert::xyz_to_rgb(xyz).and_then(|rgb| convert::rgb_to_gray(&rgb)),
            Self::DeviceRGB => convert::xyz_to_rgb(xyz),
            Self::DeviceCMYK => convert::xyz_to_cmyk(xyz),
            Self::CalGray(cal) => Some(smallvec![cal.from_xyz(v)]),
            Self::CalRGB(cal) => cal.from_xyz(v).and_then(components),
            Self::Lab(lab) => components(lab.from_xyz(v)),
            Self::ICCBased(icc) => return icc.fallback().from_xyz(xyz),
            Self::Indexed(_) | Self::Separation(_) | Self::DeviceN(_) => {
                match convert::xyz_to_rgb(xyz) {
                    Some(rgb) => return self.from_rgb(&rgb),
                    None => None,
                }
            }
            Self::Pattern(p) => match &p.underlying {
                Some(u) => return u.from_xyz(xyz),
                None => None,
            },
        })
    }
}
