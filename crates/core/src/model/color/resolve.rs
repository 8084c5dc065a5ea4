//! Color space resolution.
//!
//! Turns color space descriptors (a name, a tagged array, or a reference to
//! either) into shared [`ColorSpace`] values. Resolution of indirect
//! descriptors is memoized per reference.

use super::space::{
    CalGray, CalRGB, ColorSpace, DeviceN, IccBased, Indexed, Lab, PatternSpace, Separation,
};
use super::convert::{Components, D65_WHITE_POINT};
use super::tint::TintTransform;
use crate::error::{PdfError, Result};
use crate::function::FunctionEvaluator;
use crate::model::objects::{ObjectResolver, PDFObjRef, PDFObject, PDFStream};
use bytes::Bytes;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Options for [`ColorSpaceResolver`].
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Memoize spaces resolved through indirect references.
    pub caching: bool,
    /// Maximum nesting of alternate/base spaces.
    pub max_depth: usize,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            caching: true,
            max_depth: 16,
        }
    }
}

/// A color space handed over by the host platform instead of a document.
#[derive(Debug, Clone)]
pub enum NativeColorSpace {
    /// The platform's standard RGB space.
    Srgb,
    /// An ICC profile with one `(min, max)` range per component.
    IccProfile {
        profile: Bytes,
        ranges: Vec<(f64, f64)>,
    },
    /// Anything else, by name.
    Other(String),
}

fn unsupported(msg: impl Into<String>) -> PdfError {
    PdfError::UnsupportedColorSpace(msg.into())
}

/// Resolves and caches color spaces.
pub struct ColorSpaceResolver {
    objects: Arc<dyn ObjectResolver>,
    functions: Arc<dyn FunctionEvaluator>,
    options: ResolverOptions,
    cache: RwLock<FxHashMap<PDFObjRef, Arc<ColorSpace>>>,
}

impl std::fmt::Debug for ColorSpaceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorSpaceResolver")
            .field("options", &self.options)
            .field("cached", &self.cached_len())
            .finish()
    }
}

impl ColorSpaceResolver {
    pub fn new(objects: Arc<dyn ObjectResolver>, functions: Arc<dyn FunctionEvaluator>) -> Self {
        Self::with_options(objects, functions, ResolverOptions::default())
    }

    pub fn with_options(
        objects: Arc<dyn ObjectResolver>,
        functions: Arc<dyn FunctionEvaluator>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            objects,
            functions,
            options,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    pub const fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Number of memoized spaces.
    pub fn cached_len(&self) -> usize {
        self.cache.read().map_or(0, |cache| cache.len())
    }

    /// Resolve a color space descriptor.
    pub fn resolve(&self, descriptor: &PDFObject) -> Result<Arc<ColorSpace>> {
        let mut in_progress = FxHashSet::default();
        self.resolve_inner(descriptor, &mut in_progress, 0)
    }

    /// Resolve `name` against a resource dictionary.
    ///
    /// `resources` is the page resource dictionary; its `/ColorSpace`
    /// entry is consulted first, then `name` is resolved as a plain name.
    pub fn resolve_resource(
        &self,
        name: &str,
        resources: &HashMap<String, PDFObject>,
    ) -> Result<Arc<ColorSpace>> {
        if let Some(entry) = resources.get("ColorSpace") {
            let table = self.objects.resolve(entry)?;
            if let Some(descriptor) = table.dict_get(name) {
                return self.resolve(descriptor);
            }
        }
        self.resolve(&PDFObject::Name(name.to_string()))
    }

    /// Resolve a color space supplied by the platform.
    pub fn resolve_native(&self, native: &NativeColorSpace) -> Result<Arc<ColorSpace>> {
        match native {
            NativeColorSpace::Srgb => Ok(ColorSpace::device_rgb()),
            NativeColorSpace::IccProfile { profile, ranges } => {
                let n = ranges.len();
                if !matches!(n, 1 | 3 | 4) {
                    return Err(unsupported(format!("ICC profile with {n} components")));
                }
                let flat: Vec<f64> = ranges.iter().flat_map(|(lo, hi)| [*lo, *hi]).collect();
                let mut attrs = HashMap::new();
                attrs.insert("N".to_string(), PDFObject::Int(n as i64));
                attrs.insert("Range".to_string(), PDFObject::reals(&flat));
                let stream = PDFStream::new(attrs, profile.clone());
                debug!(n, bytes = profile.len(), "embedded native ICC profile");
                Ok(Arc::new(ColorSpace::ICCBased(IccBased {
                    profile: stream,
                    n,
                    ranges: flat,
                    alternate: None,
                })))
            }
            NativeColorSpace::Other(name) => Err(unsupported(format!("native color space {name}"))),
        }
    }

    fn deref(&self, obj: &PDFObject) -> Result<PDFObject> {
        self.objects.resolve(obj)
    }

    fn resolve_inner(
        &self,
        descriptor: &PDFObject,
        in_progress: &mut FxHashSet<PDFObjRef>,
        depth: usize,
    ) -> Result<Arc<ColorSpace>> {
        if depth > self.options.max_depth {
            return Err(unsupported(format!(
                "color space nesting deeper than {}",
                self.options.max_depth
            )));
        }
        match descriptor {
            PDFObject::Ref(objref) => self.resolve_ref(*objref, in_progress, depth),
            PDFObject::Name(name) => Self::resolve_name(name),
            PDFObject::Array(items) => self.resolve_array(items, in_progress, depth),
            other => Err(unsupported(format!("{other:?}"))),
        }
    }

    fn resolve_ref(
        &self,
        objref: PDFObjRef,
        in_progress: &mut FxHashSet<PDFObjRef>,
        depth: usize,
    ) -> Result<Arc<ColorSpace>> {
        if self.options.caching {
            if let Some(space) = self.cache.read().ok().and_then(|c| c.get(&objref).cloned()) {
                return Ok(space);
            }
        }
        if !in_progress.insert(objref) {
            return Err(unsupported(format!(
                "color space {} {} R refers to itself",
                objref.objid, objref.genno
            )));
        }
        let result = self
            .objects
            .resolve_ref(objref)
            .and_then(|obj| self.resolve_inner(&obj, in_progress, depth + 1));
        in_progress.remove(&objref);
        let space = result?;

        if !self.options.caching {
            return Ok(space);
        }
        match self.cache.write() {
            Ok(mut cache) => Ok(Arc::clone(cache.entry(objref).or_insert(space))),
            Err(_) => Ok(space),
        }
    }

    fn resolve_name(name: &str) -> Result<Arc<ColorSpace>> {
        let space = match name {
            "DeviceGray" | "G" => return Ok(ColorSpace::device_gray()),
            "DeviceRGB" | "RGB" => return Ok(ColorSpace::device_rgb()),
            "DeviceCMYK" | "CMYK" => return Ok(ColorSpace::device_cmyk()),
            "Lab" => ColorSpace::Lab(Lab {
                white_point: D65_WHITE_POINT,
                black_point: [0.0; 3],
                range: Lab::DEFAULT_RANGE,
            }),
            "Pattern" => ColorSpace::Pattern(PatternSpace::default()),
            _ => return Err(unsupported(format!("/{name}"))),
        };
        Ok(Arc::new(space))
    }

    fn resolve_array(
        &self,
        items: &[PDFObject],
        in_progress: &mut FxHashSet<PDFObjRef>,
        depth: usize,
    ) -> Result<Arc<ColorSpace>> {
        let tag_obj = match items.first() {
            Some(obj) => self.deref(obj)?,
            None => return Err(unsupported("empty color space array")),
        };
        let tag = tag_obj
            .as_name()
            .map_err(|_| unsupported(format!("color space tag {tag_obj:?}")))?;
        let malformed = |e: PdfError| match e {
            PdfError::FunctionEvaluationError(_) | PdfError::UnsupportedColorSpace(_) => e,
            other => unsupported(format!("malformed /{tag} color space: {other}")),
        };
        let element = |i: usize| -> Result<PDFObject> {
            items
                .get(i)
                .ok_or_else(|| unsupported(format!("/{tag} color space is missing element {i}")))
                .and_then(|obj| self.deref(obj))
        };

        let space = match tag {
            "DeviceGray" | "G" => return Ok(ColorSpace::device_gray()),
            "DeviceRGB" | "RGB" => return Ok(ColorSpace::device_rgb()),
            "DeviceCMYK" | "CMYK" => return Ok(ColorSpace::device_cmyk()),
            "CalGray" => {
                let dict = element(1)?;
                ColorSpace::CalGray(CalGray {
                    white_point: self.num3(&dict, "WhitePoint", D65_WHITE_POINT).map_err(malformed)?,
                    black_point: self.num3(&dict, "BlackPoint", [0.0; 3]).map_err(malformed)?,
                    gamma: self.num(&dict, "Gamma", 1.0).map_err(malformed)?,
                })
            }
            "CalRGB" => {
                let dict = element(1)?;
                let matrix = match dict.dict_get("Matrix") {
                    Some(obj) => self
                        .deref(obj)?
                        .as_num_array()
                        .ok()
                        .and_then(|v| <[f64; 9]>::try_from(v).ok())
                        .ok_or_else(|| unsupported("/CalRGB /Matrix needs nine numbers"))?,
                    None => [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
                };
                ColorSpace::CalRGB(CalRGB {
                    white_point: self.num3(&dict, "WhitePoint", D65_WHITE_POINT).map_err(malformed)?,
                    black_point: self.num3(&dict, "BlackPoint", [0.0; 3]).map_err(malformed)?,
                    gamma: self.num3(&dict, "Gamma", [1.0; 3]).map_err(malformed)?,
                    matrix,
                })
            }
            "Lab" => {
                let dict = element(1)?;
                let range = match dict.dict_get("Range") {
                    Some(obj) => self
                        .deref(obj)?
                        .as_num_array()
                        .ok()
                        .and_then(|v| <[f64; 4]>::try_from(v).ok())
                        .ok_or_else(|| unsupported("/Lab /Range needs four numbers"))?,
                    None => Lab::DEFAULT_RANGE,
                };
                if range[0] > range[1] || range[2] > range[3] {
                    return Err(unsupported(format!("/Lab /Range {range:?} has min above max")));
                }
                ColorSpace::Lab(Lab {
                    white_point: self.num3(&dict, "WhitePoint", D65_WHITE_POINT).map_err(malformed)?,
                    black_point: self.num3(&dict, "BlackPoint", [0.0; 3]).map_err(malformed)?,
                    range,
                })
            }
            "ICCBased" => {
                let obj = element(1)?;
                let stream = obj.as_stream().map_err(malformed)?.clone();
                let alternate = match stream.get("Alternate") {
                    Some(alt) => Some(self.resolve_inner(alt, in_progress, depth + 1)?),
                    None => None,
                };
                let n = match stream.get("N") {
                    Some(n) => self.deref(n)?.as_int().map_err(malformed)? as usize,
                    None => alternate
                        .as_ref()
                        .map(|alt| alt.n_components())
                        .ok_or_else(|| unsupported("/ICCBased stream without /N"))?,
                };
                // 2 has no device fallback, so conversions go through the alternate.
                let two_channel =
                    n == 2 && alternate.as_ref().is_some_and(|alt| alt.n_components() == 2);
                if !(matches!(n, 1 | 3 | 4) || two_channel) {
                    return Err(unsupported(format!("/ICCBased with /N {n}")));
                }
                let ranges = match stream.get("Range") {
                    Some(r) => self.deref(r)?.as_num_array().map_err(malformed)?,
                    None => [0.0, 1.0].repeat(n),
                };
                ColorSpace::ICCBased(IccBased {
                    profile: stream,
                    n,
                    ranges,
                    alternate,
                })
            }
            "Indexed" | "I" => {
                let base_obj = items
                    .get(1)
                    .ok_or_else(|| unsupported("/Indexed color space without base"))?;
                let base = self.resolve_inner(base_obj, in_progress, depth + 1)?;
                let hival = element(2)?.as_num().map_err(malformed)?.clamp(0.0, 255.0) as usize;
                let table = match element(3)? {
                    PDFObject::String(bytes) => bytes,
                    PDFObject::Stream(stream) => stream.get_data().to_vec(),
                    other => {
                        return Err(unsupported(format!(
                            "/Indexed lookup must be a string or stream, got {}",
                            other.type_name()
                        )));
                    }
                };
                let lookup = Self::build_lookup(&base, hival, &table);
                ColorSpace::Indexed(Indexed {
                    base,
                    hival,
                    lookup,
                })
            }
            "Separation" => {
                if items.len() < 4 {
                    return Err(unsupported("/Separation needs four elements"));
                }
                let colorant = element(1)?.as_name().map_err(malformed)?.to_string();
                let alternate = self.resolve_inner(&items[2], in_progress, depth + 1)?;
                let function = element(3)?;
                let color_values = match function.dict_get("C1") {
                    Some(c1) => Some(self.deref(c1)?.as_num_array().map_err(malformed)?),
                    None => None,
                }
                .filter(|c1| {
                    let fits = c1.len() == alternate.n_components();
                    if !fits {
                        debug!(
                            colorant = %colorant,
                            c1 = c1.len(),
                            alternate = alternate.n_components(),
                            "ignoring /C1 that does not match the alternate space"
                        );
                    }
                    fits
                });
                let tint = TintTransform::new(
                    function,
                    Arc::clone(&self.functions),
                    1,
                    alternate.n_components(),
                );
                ColorSpace::Separation(Separation::new(
                    colorant,
                    alternate,
                    tint,
                    items.len(),
                    color_values,
                ))
            }
            "DeviceN" => {
                if items.len() < 4 {
                    return Err(unsupported("/DeviceN needs at least four elements"));
                }
                let colorants = element(1)?
                    .as_array()
                    .map_err(malformed)?
                    .iter()
                    .map(|n| self.deref(n).and_then(|n| n.as_name().map(str::to_string)))
                    .collect::<Result<Vec<_>>>()
                    .map_err(malformed)?;
                if colorants.is_empty() {
                    return Err(unsupported("/DeviceN without colorants"));
                }
                let alternate = self.resolve_inner(&items[2], in_progress, depth + 1)?;
                let tint = TintTransform::new(
                    element(3)?,
                    Arc::clone(&self.functions),
                    colorants.len(),
                    alternate.n_components(),
                );
                let attributes = match items.get(4) {
                    Some(obj) => Some(self.deref(obj)?),
                    None => None,
                };
                ColorSpace::DeviceN(DeviceN::new(colorants, alternate, tint, attributes))
            }
            "Pattern" => {
                let underlying = match items.get(1) {
                    Some(obj) => Some(self.resolve_inner(obj, in_progress, depth + 1)?),
                    None => None,
                };
                ColorSpace::Pattern(PatternSpace { underlying })
            }
            _ => return Err(unsupported(format!("{items:?}"))),
        };
        debug!(family = %space.family(), n = space.n_components(), "resolved color space");
        Ok(Arc::new(space))
    }

    /// Splits the palette bytes into rows of base components.
    ///
    /// Bytes are scaled into the base space's decode ranges. Rows missing
    /// from a short table read as zero bytes.
    fn build_lookup(base: &ColorSpace, hival: usize, table: &[u8]) -> Vec<Components> {
        let n = base.n_components();
        let ranges: Vec<(f64, f64)> = match base {
            ColorSpace::Lab(lab) => vec![
                (0.0, 100.0),
                (lab.range[0], lab.range[1]),
                (lab.range[2], lab.range[3]),
            ],
            ColorSpace::ICCBased(icc) => icc
                .ranges
                .chunks_exact(2)
                .map(|r| (r[0], r[1]))
                .collect(),
            _ => vec![(0.0, 1.0); n],
        };
        (0..=hival)
            .map(|row| {
                (0..n)
                    .map(|i| {
                        let byte = table.get(row * n + i).copied().unwrap_or(0);
                        let (lo, hi) = ranges.get(i).copied().unwrap_or((0.0, 1.0));
                        lo + f64::from(byte) / 255.0 * (hi - lo)
                    })
                    .collect()
            })
            .collect()
    }

    fn num(&self, dict: &PDFObject, key: &str, default: f64) -> Result<f64> {
        match dict.dict_get(key) {
            Some(obj) => self.deref(obj)?.as_num(),
            None => Ok(default),
        }
    }

    fn num3(&self, dict: &PDFObject, key: &str, default: [f64; 3]) -> Result<[f64; 3]> {
        match dict.dict_get(key) {
            Some(obj) => {
                let values = self.deref(obj)?.as_num_array()?;
                <[f64; 3]>::try_from(values)
                    .map_err(|_| PdfError::KeyError(format!("/{key} needs three numbers")))
            }
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::NoFunctionEvaluator;
    use crate::model::color::ColorSpaceFamily;
    use crate::model::objects::MemoryObjectStore;

    fn resolver(store: MemoryObjectStore) -> ColorSpaceResolver {
        ColorSpaceResolver::new(Arc::new(store), Arc::new(NoFunctionEvaluator))
    }

    #[test]
    fn names_resolve_to_families() {
        let r = resolver(MemoryObjectStore::new());
        for (name, family) in [
            ("G", ColorSpaceFamily::DeviceGray),
            ("RGB", ColorSpaceFamily::DeviceRGB),
            ("CMYK", ColorSpaceFamily::DeviceCMYK),
            ("Lab", ColorSpaceFamily::Lab),
            ("Pattern", ColorSpaceFamily::Pattern),
        ] {
            assert_eq!(r.resolve(&PDFObject::name(name)).unwrap().family(), family);
        }
    }

    #[test]
    fn array_device_tags_alias_singletons() {
        let r = resolver(MemoryObjectStore::new());
        let cs = r
            .resolve(&PDFObject::Array(vec![PDFObject::name("DeviceRGB"), PDFObject::Int(9)]))
            .unwrap();
        assert!(Arc::ptr_eq(&cs, &ColorSpace::device_rgb()));
    }

    #[test]
    fn self_reference_is_rejected() {
        let mut store = MemoryObjectStore::new();
        let me = PDFObjRef::new(1, 0);
        store.insert(
            1,
            PDFObject::Array(vec![
                PDFObject::name("Indexed"),
                PDFObject::Ref(me),
                PDFObject::Int(0),
                PDFObject::String(vec![0]),
            ]),
        );
        let err = resolver(store).resolve(&PDFObject::Ref(me)).unwrap_err();
        assert!(matches!(err, PdfError::UnsupportedColorSpace(_)), "{err:?}");
    }

    #[test]
    fn depth_bound_applies_without_references() {
        let mut desc = PDFObject::name("DeviceGray");
        for _ in 0..20 {
            desc = PDFObject::Array(vec![PDFObject::name("Pattern"), desc]);
        }
        let err = resolver(MemoryObjectStore::new()).resolve(&desc).unwrap_err();
        assert!(matches!(err, PdfError::UnsupportedColorSpace(_)));
    }

    #[test]
    fn first_cached_value_wins() {
        let mut store = MemoryObjectStore::new();
        let lab = store.insert(3, PDFObject::name("Lab"));
        let r = resolver(store);
        let a = r.resolve(&PDFObject::Ref(lab)).unwrap();
        let b = r.resolve(&PDFObject::Ref(lab)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(r.cached_len(), 1);
    }

    #[test]
    fn caching_can_be_disabled() {
        let mut store = MemoryObjectStore::new();
        let lab = store.insert(3, PDFObject::name("Lab"));
        let r = ColorSpaceResolver::with_options(
            Arc::new(store),
            Arc::new(NoFunctionEvaluator),
            ResolverOptions {
                caching: false,
                ..Default::default()
            },
        );
        let a = r.resolve(&PDFObject::Ref(lab)).unwrap();
        let b = r.resolve(&PDFObject::Ref(lab)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(r.cached_len(), 0);
    }

    #[test]
    fn native_spaces() {
        let r = resolver(MemoryObjectStore::new());
        assert!(Arc::ptr_eq(
            &r.resolve_native(&NativeColorSpace::Srgb).unwrap(),
            &ColorSpace::device_rgb()
        ));
        let icc = r
            .resolve_native(&NativeColorSpace::IccProfile {
                profile: Bytes::from_static(b"profile"),
                ranges: vec![(0.0, 1.0); 3],
            })
            .unwrap();
        let ColorSpace::ICCBased(icc) = icc.as_ref() else {
            panic!("expected ICCBased");
        };
        assert_eq!(icc.n, 3);
        assert_eq!(icc.profile.get("N"), Some(&PDFObject::Int(3)));
        assert_eq!(icc.profile.get_data(), b"profile");
        assert!(matches!(
            r.resolve_native(&NativeColorSpace::Other("XYZ".into())),
            Err(PdfError::UnsupportedColorSpace(_))
        ));
    }
}
