//! PDF object types.
//!
//! The interpreter consumes an already-parsed object graph. These types are
//! the minimal model of it: primitives, arrays, dictionaries, streams and
//! indirect references, plus the [`ObjectResolver`] seam through which
//! references are followed.

use crate::error::{PdfError, Result};
use bytes::Bytes;
use rustc_hash::FxHashMap;
use std::collections::HashMap;

/// Maximum number of reference hops followed by [`ObjectResolver::resolve`].
const MAX_REF_CHAIN: usize = 32;

/// PDF Object types - the fundamental value type in PDF.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Type, /Font)
    Name(String),
    /// String (byte array)
    String(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary (name -> object mapping)
    Dict(HashMap<String, Self>),
    /// Stream (dictionary + binary data)
    Stream(Box<PDFStream>),
    /// Indirect object reference
    Ref(PDFObjRef),
}

impl PDFObject {
    /// Shorthand for building a name object.
    pub fn name(name: &str) -> Self {
        Self::Name(name.to_string())
    }

    /// Shorthand for building an array of reals.
    pub fn reals(values: &[f64]) -> Self {
        Self::Array(values.iter().map(|v| Self::Real(*v)).collect())
    }

    /// Check if this is a null object
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this is a numeric object
    pub const fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Real(_))
    }

    /// Get as integer
    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "int",
                got: self.type_name(),
            }),
        }
    }

    /// Get numeric value (int or real coerced to f64)
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(PdfError::TypeError {
                expected: "number",
                got: self.type_name(),
            }),
        }
    }

    /// Get as name string
    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "name",
                got: self.type_name(),
            }),
        }
    }

    /// Get as byte string
    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "string",
                got: self.type_name(),
            }),
        }
    }

    /// Get as array
    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(PdfError::TypeError {
                expected: "array",
                got: self.type_name(),
            }),
        }
    }

    /// Get as dictionary
    pub const fn as_dict(&self) -> Result<&HashMap<String, Self>> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(PdfError::TypeError {
                expected: "dict",
                got: self.type_name(),
            }),
        }
    }

    /// Get as stream
    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(PdfError::TypeError {
                expected: "stream",
                got: self.type_name(),
            }),
        }
    }

    /// Get as object reference
    pub const fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(PdfError::TypeError {
                expected: "ref",
                got: self.type_name(),
            }),
        }
    }

    /// Array element at `index`.
    pub fn get(&self, index: usize) -> Result<&Self> {
        self.as_array()?
            .get(index)
            .ok_or_else(|| PdfError::KeyError(format!("array index {index}")))
    }

    /// Dictionary entry for `key`.
    ///
    /// Streams answer with their attribute dictionary, so a function stream
    /// and a function dictionary can be read the same way.
    pub fn dict_get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Dict(d) => d.get(key),
            Self::Stream(s) => s.get(key),
            _ => None,
        }
    }

    /// Array of numbers as `f64`s.
    pub fn as_num_array(&self) -> Result<Vec<f64>> {
        self.as_array()?.iter().map(Self::as_num).collect()
    }

    /// Get type name for error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    /// Object ID
    pub objid: u32,
    /// Generation number
    pub genno: u32,
}

impl PDFObjRef {
    /// Create a new object reference.
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// PDF Stream - dictionary attributes + decoded data.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    /// Stream dictionary attributes
    pub attrs: HashMap<String, PDFObject>,
    /// Decoded stream data
    data: Bytes,
}

impl PDFStream {
    /// Create a new stream.
    pub fn new(attrs: HashMap<String, PDFObject>, data: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            data: data.into(),
        }
    }

    /// Get decoded data.
    pub fn get_data(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// Get data as shared bytes.
    pub fn data_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Get attribute by name.
    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }
}

/// Source of indirect objects.
///
/// Implemented by whatever owns the parsed document; the color engine only
/// ever follows references through this trait.
pub trait ObjectResolver: Send + Sync {
    /// Look up the object an indirect reference points to.
    fn resolve_ref(&self, objref: PDFObjRef) -> Result<PDFObject>;

    /// Follow references until a direct object is reached.
    fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        let mut current = obj.clone();
        for _ in 0..MAX_REF_CHAIN {
            match current {
                PDFObject::Ref(r) => current = self.resolve_ref(r)?,
                other => return Ok(other),
            }
        }
        Err(PdfError::KeyError("reference chain too long".to_string()))
    }
}

/// In-memory object table.
#[derive(Debug, Default, Clone)]
pub struct MemoryObjectStore {
    objects: FxHashMap<PDFObjRef, PDFObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `obj` under `objid 0 R` and return the reference.
    pub fn insert(&mut self, objid: u32, obj: PDFObject) -> PDFObjRef {
        let objref = PDFObjRef::new(objid, 0);
        self.objects.insert(objref, obj);
        objref
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl ObjectResolver for MemoryObjectStore {
    fn resolve_ref(&self, objref: PDFObjRef) -> Result<PDFObject> {
        self.objects
            .get(&objref)
            .cloned()
            .ok_or(PdfError::ObjectNotFound(objref.objid, objref.genno))
    }
}
