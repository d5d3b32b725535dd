//! Core trait for multi-label classifiers.
//!
//! The trait captures the capability set shared by multi-label models:
//! predict a label combination for a feature vector, persist the whole
//! model, and optionally describe features and labels for reporting.

use std::path::Path;

use crate::error::Result;
use crate::metadata::{FeatureList, LabelTranslator};
use crate::multilabel::LabelSet;
use crate::primitives::FeatureVector;

/// A classifier that maps a feature vector to a label combination.
///
/// Implementations are expected to be pure during inference: `predict`
/// takes `&self` and mutates nothing, so a shared model may serve
/// concurrent callers.
///
/// # Examples
///
/// ```
/// use etiquetar::prelude::*;
///
/// fn describe(model: &dyn MultiLabelClassifier, x: &FeatureVector) -> String {
///     match model.predict(x) {
///         Ok(combination) => combination.to_string(),
///         Err(e) => format!("prediction failed: {e}"),
///     }
/// }
///
/// let model = PairwiseCrf::new(2, 1)
///     .with_supported_combinations(vec![LabelSet::empty(), LabelSet::from_labels([0])]);
/// let x = FeatureVector::from_dense(&[1.0]);
/// assert_eq!(describe(&model, &x), "{}");
/// ```
pub trait MultiLabelClassifier {
    /// Number of classes in the label universe.
    fn num_classes(&self) -> usize;

    /// Predicts the label combination for `x`.
    ///
    /// # Errors
    ///
    /// Returns an error on a feature-dimension mismatch or when the model
    /// has no combination to return.
    fn predict(&self, x: &FeatureVector) -> Result<LabelSet>;

    /// Persists the whole model to `path` as one atomic record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    fn save(&self, path: &Path) -> Result<()>;

    /// Feature names for reporting, when known.
    fn feature_list(&self) -> Option<&FeatureList> {
        None
    }

    /// Label names for reporting, when known.
    fn label_translator(&self) -> Option<&LabelTranslator> {
        None
    }
}
