//! Tint transform adapter for Separation and DeviceN spaces.

use super::convert::Components;
use crate::error::{PdfError, Result};
use crate::function::{FunctionEvaluator, PdfFunction};
use crate::model::objects::PDFObject;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;

/// Maps colorant tints to components of the alternate space.
///
/// The function behind the descriptor is built on first use and then kept,
/// so a space that is only ever painted through its `C1` values never
/// touches the evaluator.
#[derive(Clone)]
pub struct TintTransform {
    descriptor: PDFObject,
    evaluator: Arc<dyn FunctionEvaluator>,
    function: OnceCell<Arc<dyn PdfFunction>>,
    n_inputs: usize,
    n_outputs: usize,
}

impl fmt::Debug for TintTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TintTransform")
            .field("descriptor", &self.descriptor)
            .field("constructed", &self.function.get().is_some())
            .field("n_inputs", &self.n_inputs)
            .field("n_outputs", &self.n_outputs)
            .finish()
    }
}

impl TintTransform {
    pub fn new(
        descriptor: PDFObject,
        evaluator: Arc<dyn FunctionEvaluator>,
        n_inputs: usize,
        n_outputs: usize,
    ) -> Self {
        Self {
            descriptor,
            evaluator,
            function: OnceCell::new(),
            n_inputs,
            n_outputs,
        }
    }

    /// The function descriptor this transform was built from.
    pub const fn descriptor(&self) -> &PDFObject {
        &self.descriptor
    }

    pub const fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub const fn n_outputs(&self) -> usize {
        self.n_outputs
    }

    /// Constructed function handle, built on first call.
    pub fn function(&self) -> Result<&Arc<dyn PdfFunction>> {
        self.function
            .get_or_try_init(|| self.evaluator.construct(&self.descriptor))
    }

    /// Evaluate the transform.
    ///
    /// Fails with `FunctionEvaluationError` when the input or output
    /// arity does not match the owning space and its alternate.
    pub fn evaluate(&self, inputs: &[f64]) -> Result<Components> {
        if inputs.len() != self.n_inputs {
            return Err(PdfError::FunctionEvaluationError(format!(
                "tint transform expects {} inputs, got {}",
                self.n_inputs,
                inputs.len()
            )));
        }
        let out = self.function()?.evaluate(inputs)?;
        if out.len() != self.n_outputs {
            return Err(PdfError::FunctionEvaluationError(format!(
                "tint transform produced {} outputs, alternate space needs {}",
                out.len(),
                self.n_outputs
            )));
        }
        Ok(Components::from_vec(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Halve;

    impl PdfFunction for Halve {
        fn evaluate(&self, inputs: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![inputs[0] / 2.0; 3])
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    impl FunctionEvaluator for Counting {
        fn construct(&self, _descriptor: &PDFObject) -> Result<Arc<dyn PdfFunction>> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Halve))
        }
    }

    #[test]
    fn function_is_built_once() {
        let evaluator = Arc::new(Counting::default());
        let tint = TintTransform::new(PDFObject::Null, evaluator.clone(), 1, 3);
        assert_eq!(evaluator.0.load(Ordering::SeqCst), 0);
        assert_eq!(tint.evaluate(&[1.0]).unwrap().as_slice(), &[0.5, 0.5, 0.5]);
        tint.evaluate(&[0.5]).unwrap();
        assert_eq!(evaluator.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arity_is_checked_both_ways() {
        let tint = TintTransform::new(PDFObject::Null, Arc::new(Counting::default()), 1, 4);
        assert!(matches!(
            tint.evaluate(&[0.1, 0.2]),
            Err(PdfError::FunctionEvaluationError(_))
        ));
        assert!(matches!(
            tint.evaluate(&[0.1]),
            Err(PdfError::FunctionEvaluationError(_))
        ));
    }
}
