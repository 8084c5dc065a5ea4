//! PDF function objects.
//!
//! Tint transforms are backed by PDF functions. The color engine only sees
//! the [`FunctionEvaluator`] / [`PdfFunction`] pair; [`BasicFunctionEvaluator`]
//! covers the exponential (Type 2) and stitching (Type 3) dictionaries that
//! Separation and DeviceN spaces use in practice.

use crate::error::{PdfError, Result};
use crate::model::objects::{ObjectResolver, PDFObject};
use std::fmt;
use std::sync::Arc;

/// A constructed function: maps an input vector to an output vector.
pub trait PdfFunction: Send + Sync + fmt::Debug {
    fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>>;
}

/// Builds [`PdfFunction`]s from function descriptors.
pub trait FunctionEvaluator: Send + Sync {
    fn construct(&self, descriptor: &PDFObject) -> Result<Arc<dyn PdfFunction>>;
}

fn function_error(msg: impl Into<String>) -> PdfError {
    PdfError::FunctionEvaluationError(msg.into())
}

/// Evaluator for Type 2 and Type 3 function dictionaries.
#[derive(Default, Clone)]
pub struct BasicFunctionEvaluator {
    resolver: Option<Arc<dyn ObjectResolver>>,
}

impl fmt::Debug for BasicFunctionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicFunctionEvaluator")
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl BasicFunctionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow indirect references inside function dictionaries through `resolver`.
    pub fn with_resolver(resolver: Arc<dyn ObjectResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    fn deref(&self, obj: &PDFObject) -> Result<PDFObject> {
        match (obj, &self.resolver) {
            (PDFObject::Ref(_), Some(resolver)) => resolver.resolve(obj),
            (PDFObject::Ref(r), None) => Err(function_error(format!(
                "unresolved function reference {} {} R",
                r.objid, r.genno
            ))),
            _ => Ok(obj.clone()),
        }
    }

    fn num_array(&self, dict: &PDFObject, key: &str) -> Result<Option<Vec<f64>>> {
        match dict.dict_get(key) {
            Some(obj) => {
                let values = self
                    .deref(obj)?
                    .as_num_array()
                    .map_err(|e| function_error(format!("/{key}: {e}")))?;
                Ok(Some(values))
            }
            None => Ok(None),
        }
    }

    fn build(&self, descriptor: &PDFObject, depth: usize) -> Result<Arc<dyn PdfFunction>> {
        if depth > 8 {
            return Err(function_error("function nesting too deep"));
        }
        let descriptor = self.deref(descriptor)?;
        let function_type = descriptor
            .dict_get("FunctionType")
            .ok_or_else(|| function_error("missing /FunctionType"))?
            .as_int()
            .map_err(|e| function_error(e.to_string()))?;

        let domain = self.num_array(&descriptor, "Domain")?.unwrap_or(vec![0.0, 1.0]);
        if domain.len() < 2 {
            return Err(function_error("/Domain needs two values"));
        }
        let range = self.num_array(&descriptor, "Range")?;
        if let Some(range) = &range {
            if range.len() % 2 != 0 || range.chunks_exact(2).any(|r| r[0] > r[1]) {
                return Err(function_error(format!("malformed /Range {range:?}")));
            }
        }

        match function_type {
            2 => {
                let c0 = self.num_array(&descriptor, "C0")?.unwrap_or(vec![0.0]);
                let c1 = self.num_array(&descriptor, "C1")?.unwrap_or(vec![1.0]);
                if c0.len() != c1.len() {
                    return Err(function_error("/C0 and /C1 differ in length"));
                }
                let n = descriptor
                    .dict_get("N")
                    .ok_or_else(|| function_error("missing /N"))
                    .and_then(|o| self.deref(o)?.as_num().map_err(|e| function_error(e.to_string())))?;
                Ok(Arc::new(ExponentialFunction {
                    domain: [domain[0], domain[1]],
                    range,
                    c0,
                    c1,
                    n,
                }))
            }
            3 => {
                let functions = match descriptor.dict_get("Functions") {
                    Some(obj) => self
                        .deref(obj)?
                        .as_array()
                        .map_err(|e| function_error(e.to_string()))?
                        .iter()
                        .map(|f| self.build(f, depth + 1))
                        .collect::<Result<Vec<_>>>()?,
                    None => return Err(function_error("missing /Functions")),
                };
                let bounds = self.num_array(&descriptor, "Bounds")?.unwrap_or_default();
                let encode = self
                    .num_array(&descriptor, "Encode")?
                    .ok_or_else(|| function_error("missing /Encode"))?;
                let k = functions.len();
                if k == 0 || bounds.len() + 1 != k || encode.len() != 2 * k {
                    return Err(function_error("malformed stitching function"));
                }
                Ok(Arc::new(StitchingFunction {
                    domain: [domain[0], domain[1]],
                    range,
                    functions,
                    bounds,
                    encode,
                }))
            }
            other => Err(function_error(format!("unsupported function type {other}"))),
        }
    }
}

impl FunctionEvaluator for BasicFunctionEvaluator {
    fn construct(&self, descriptor: &PDFObject) -> Result<Arc<dyn PdfFunction>> {
        self.build(descriptor, 0)
    }
}

/// Evaluator that cannot build anything.
///
/// For callers that only need the C1 shortcut of Separation spaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFunctionEvaluator;

impl FunctionEvaluator for NoFunctionEvaluator {
    fn construct(&self, _descriptor: &PDFObject) -> Result<Arc<dyn PdfFunction>> {
        Err(function_error("no function evaluator configured"))
    }
}

fn single_input(inputs: &[f64], domain: [f64; 2]) -> Result<f64> {
    match inputs {
        [x] => Ok(x.max(domain[0].min(domain[1])).min(domain[1].max(domain[0]))),
        _ => Err(function_error(format!(
            "expected 1 input, got {}",
            inputs.len()
        ))),
    }
}

fn clip_to_range(mut out: Vec<f64>, range: Option<&[f64]>) -> Vec<f64> {
    if let Some(range) = range {
        for (v, r) in out.iter_mut().zip(range.chunks_exact(2)) {
            *v = v.max(r[0]).min(r[1]);
        }
    }
    out
}

/// Type 2: `y = C0 + x^N * (C1 - C0)`.
#[derive(Debug, Clone)]
struct ExponentialFunction {
    domain: [f64; 2],
    range: Option<Vec<f64>>,
    c0: Vec<f64>,
    c1: Vec<f64>,
    n: f64,
}

impl PdfFunction for ExponentialFunction {
    fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        let x = single_input(inputs, self.domain)?;
        let xn = x.powf(self.n);
        let out = self
            .c0
            .iter()
            .zip(&self.c1)
            .map(|(c0, c1)| c0 + xn * (c1 - c0))
            .collect();
        Ok(clip_to_range(out, self.range.as_deref()))
    }
}

/// Type 3: piecewise selection between 1-input sub-functions.
#[derive(Debug)]
struct StitchingFunction {
    domain: [f64; 2],
    range: Option<Vec<f64>>,
    functions: Vec<Arc<dyn PdfFunction>>,
    bounds: Vec<f64>,
    encode: Vec<f64>,
}

impl PdfFunction for StitchingFunction {
    fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        let x = single_input(inputs, self.domain)?;
        let i = self
            .bounds
            .iter()
            .position(|b| x < *b)
            .unwrap_or(self.functions.len() - 1);
        let low = if i == 0 { self.domain[0] } else { self.bounds[i - 1] };
        let high = if i == self.bounds.len() {
            self.domain[1]
        } else {
            self.bounds[i]
        };
        let (e0, e1) = (self.encode[2 * i], self.encode[2 * i + 1]);
        let t = if high == low {
            e0
        } else {
            e0 + (x - low) * (e1 - e0) / (high - low)
        };
        let out = self.functions[i].evaluate(&[t])?;
        Ok(clip_to_range(out, self.range.as_deref()))
    }
}
