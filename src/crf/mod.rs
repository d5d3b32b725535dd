//! Pairwise log-linear scoring and inference over supported label
//! combinations.
//!
//! [`PairwiseCrf`] scores every admissible label combination under a
//! log-linear model with per-class (unary) and optional pairwise
//! (label-interaction) potentials, normalizes scores into a probability
//! distribution with a numerically stable softmax, and predicts the
//! highest-scoring combination.
//!
//! # Example
//!
//! ```
//! use etiquetar::crf::PairwiseCrf;
//! use etiquetar::multilabel::LabelSet;
//! use etiquetar::primitives::FeatureVector;
//!
//! let mut model = PairwiseCrf::new(2, 1)
//!     .with_feature_only(true)
//!     .with_supported_combinations(vec![
//!         LabelSet::empty(),
//!         LabelSet::from_labels([0]),
//!         LabelSet::from_labels([1]),
//!         LabelSet::from_labels([0, 1]),
//!     ]);
//! model.weights_mut().set_class_weights(0, &[1.0]).unwrap();
//! model.weights_mut().set_class_weights(1, &[-1.0]).unwrap();
//!
//! let x = FeatureVector::from_dense(&[2.0]);
//! assert_eq!(model.combination_scores(&x).unwrap(), vec![0.0, 2.0, -2.0, 0.0]);
//! assert_eq!(model.predict(&x).unwrap(), LabelSet::from_labels([0]));
//! ```

use std::fmt;
use std::fs;
use std::path::Path;

use serde_json::{json, Value as JsonValue};

use crate::error::{EtiquetarError, Result};
use crate::metadata::{FeatureList, LabelTranslator};
use crate::multilabel::LabelSet;
use crate::primitives::FeatureVector;
use crate::serialization::{ModelReader, ModelWriter, FORMAT_VERSION};
use crate::traits::MultiLabelClassifier;

mod weights;

pub use weights::Weights;

/// Identifies persisted records written by this model.
const MODEL_TYPE: &str = "pairwise_crf";

/// A conditional multi-label model over an externally gathered list of
/// supported label combinations.
///
/// The model owns its dimensions, flag, [`Weights`], and the ordered
/// supported-combination list; the combination index `k` is the sole
/// identity used by scoring and prediction. All inference methods take
/// `&self` and mutate nothing, so a constructed (or loaded) model may be
/// shared across threads freely; to republish after retraining, swap an
/// `Arc<PairwiseCrf>` atomically.
#[derive(Debug, Clone)]
pub struct PairwiseCrf {
    num_classes: usize,
    num_features: usize,
    feature_only: bool,
    weights: Weights,
    supported: Vec<LabelSet>,
    feature_list: Option<FeatureList>,
    label_translator: Option<LabelTranslator>,
}

impl PairwiseCrf {
    /// Creates a model with pairwise potentials enabled and zeroed weights.
    #[must_use]
    pub fn new(num_classes: usize, num_features: usize) -> Self {
        Self {
            num_classes,
            num_features,
            feature_only: false,
            weights: Weights::new(num_classes, num_features, false),
            supported: Vec::new(),
            feature_list: None,
            label_translator: None,
        }
    }

    /// Enables or disables feature-only mode. A feature-only model carries
    /// no pairwise block and scores combinations from unary potentials
    /// alone.
    ///
    /// Intended at construction time: changing the flag reallocates the
    /// weight storage, resetting all weights to zero.
    #[must_use]
    pub fn with_feature_only(mut self, feature_only: bool) -> Self {
        if self.feature_only != feature_only {
            self.feature_only = feature_only;
            self.weights = Weights::new(self.num_classes, self.num_features, feature_only);
        }
        self
    }

    /// Sets the ordered supported-combination list (builder form).
    #[must_use]
    pub fn with_supported_combinations(mut self, combinations: Vec<LabelSet>) -> Self {
        self.supported = combinations;
        self
    }

    /// Attaches feature names for reporting.
    #[must_use]
    pub fn with_feature_list(mut self, feature_list: FeatureList) -> Self {
        self.feature_list = Some(feature_list);
        self
    }

    /// Attaches label names for reporting.
    #[must_use]
    pub fn with_label_translator(mut self, label_translator: LabelTranslator) -> Self {
        self.label_translator = Some(label_translator);
        self
    }

    /// Replaces the ordered supported-combination list.
    pub fn set_supported_combinations(&mut self, combinations: Vec<LabelSet>) {
        self.supported = combinations;
    }

    /// Number of classes in the label universe.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Feature dimension expected of every input vector.
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Number of supported combinations, derived from the list itself.
    #[must_use]
    pub fn num_supported(&self) -> usize {
        self.supported.len()
    }

    /// Whether pairwise potentials are disabled.
    #[must_use]
    pub fn is_feature_only(&self) -> bool {
        self.feature_only
    }

    /// The model's weights.
    #[must_use]
    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    /// Mutable access to the weights, for an external trainer. Inference
    /// never mutates.
    pub fn weights_mut(&mut self) -> &mut Weights {
        &mut self.weights
    }

    /// The ordered supported-combination list.
    #[must_use]
    pub fn supported_combinations(&self) -> &[LabelSet] {
        &self.supported
    }

    /// Optional feature names.
    #[must_use]
    pub fn feature_list(&self) -> Option<&FeatureList> {
        self.feature_list.as_ref()
    }

    /// Optional label names.
    #[must_use]
    pub fn label_translator(&self) -> Option<&LabelTranslator> {
        self.label_translator.as_ref()
    }

    fn check_dim(&self, x: &FeatureVector) -> Result<()> {
        if x.dim() != self.num_features {
            return Err(EtiquetarError::dimension_mismatch(
                "num_features",
                self.num_features,
                x.dim(),
            ));
        }
        Ok(())
    }

    /// Unnormalized log-score of one label combination.
    ///
    /// Sums, over the classes present in `y`, the class weight row dotted
    /// with `x` plus the class bias; unless the model is feature-only, adds
    /// one pairwise weight per unordered class pair, selected by the pair's
    /// joint on/off state in `y`.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` does not match the model's feature
    /// dimension.
    pub fn combination_score(&self, x: &FeatureVector, y: &LabelSet) -> Result<f64> {
        self.check_dim(x)?;
        Ok(self.score_unchecked(x, y))
    }

    /// Like [`PairwiseCrf::combination_score`], addressing the combination
    /// by its supported index `k`.
    ///
    /// # Errors
    ///
    /// Returns an error if `k` is out of range or `x` does not match the
    /// model's feature dimension.
    pub fn combination_score_at(&self, x: &FeatureVector, k: usize) -> Result<f64> {
        let y = self
            .supported
            .get(k)
            .ok_or(EtiquetarError::IndexOutOfRange {
                what: "supported combination",
                index: k,
                len: self.supported.len(),
            })?;
        self.combination_score(x, y)
    }

    fn score_unchecked(&self, x: &FeatureVector, y: &LabelSet) -> f64 {
        let present = y.membership_mask(self.num_classes);
        let mut score = 0.0;
        for l in 0..self.num_classes {
            if present[l] {
                score += x.dot(self.weights.class_weights(l));
                score += self.weights.bias(l);
            }
        }
        if self.feature_only {
            return score;
        }
        // Walk the pairwise block in its frozen enumeration order: l1 outer
        // ascending, l2 inner ascending, 4 joint-state slots per pair.
        let mut start = self.weights.feature_block_size();
        for l1 in 0..self.num_classes {
            for l2 in (l1 + 1)..self.num_classes {
                let pattern = match (present[l1], present[l2]) {
                    (false, false) => 0,
                    (true, false) => 1,
                    (false, true) => 2,
                    (true, true) => 3,
                };
                score += self.weights.pairwise_weight(start + pattern);
                start += 4;
            }
        }
        score
    }

    /// Scores of all supported combinations, in list order.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` does not match the model's feature
    /// dimension.
    pub fn combination_scores(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        self.check_dim(x)?;
        Ok(self
            .supported
            .iter()
            .map(|y| self.score_unchecked(x, y))
            .collect())
    }

    /// Probability of each supported combination under the model, via a
    /// numerically stable softmax over the scores. Empty when no
    /// combination is supported.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` does not match the model's feature
    /// dimension.
    pub fn combination_probs(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        let scores = self.combination_scores(x)?;
        if scores.is_empty() {
            return Ok(scores);
        }
        let log_z = log_sum_exp(&scores);
        Ok(scores.iter().map(|&s| (s - log_z).exp()).collect())
    }

    /// Log-probability of each supported combination, `score_k - logZ`,
    /// computed without exponentiation underflow. Empty when no combination
    /// is supported.
    ///
    /// # Errors
    ///
    /// Returns an error if `x` does not match the model's feature
    /// dimension.
    pub fn log_combination_probs(&self, x: &FeatureVector) -> Result<Vec<f64>> {
        let scores = self.combination_scores(x)?;
        if scores.is_empty() {
            return Ok(scores);
        }
        let log_z = log_sum_exp(&scores);
        Ok(scores.iter().map(|&s| s - log_z).collect())
    }

    /// The highest-scoring supported combination. On ties the FIRST index
    /// attaining the maximum wins; later equal scores never overwrite it.
    ///
    /// # Errors
    ///
    /// Returns an error if the supported list is empty or `x` does not
    /// match the model's feature dimension.
    pub fn predict(&self, x: &FeatureVector) -> Result<LabelSet> {
        let scores = self.combination_scores(x)?;
        if scores.is_empty() {
            return Err(EtiquetarError::EmptySupport);
        }
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (k, &score) in scores.iter().enumerate() {
            if score > best_score {
                best_score = score;
                best = k;
            }
        }
        Ok(self.supported[best].clone())
    }

    /// Serializes the whole model into the versioned container format.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = ModelWriter::new();
        writer.set_metadata("model_type", json!(MODEL_TYPE));
        writer.set_metadata("format_version", json!(FORMAT_VERSION));
        writer.set_metadata("num_classes", json!(self.num_classes));
        writer.set_metadata("num_features", json!(self.num_features));
        writer.set_metadata("feature_only", json!(self.feature_only));
        let combinations: Vec<&[usize]> = self.supported.iter().map(LabelSet::labels).collect();
        writer.set_metadata("supported_combinations", json!(combinations));
        if let Some(feature_list) = &self.feature_list {
            writer.set_metadata("feature_names", json!(feature_list.names()));
        }
        if let Some(translator) = &self.label_translator {
            writer.set_metadata("label_names", json!(translator.names()));
        }

        writer.add_block_f64(
            "class_weights",
            vec![self.num_classes, self.num_features],
            self.weights.class_weight_block(),
        );
        writer.add_block_f64("biases", vec![self.num_classes], self.weights.bias_block());
        if !self.feature_only {
            writer.add_block_f64(
                "pairwise",
                vec![self.weights.num_pairs(), 4],
                self.weights.pairwise_block(),
            );
        }
        writer.to_bytes()
    }

    /// Reconstructs a model from container bytes, validating structure
    /// against the declared dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed container, a checksum or version
    /// mismatch, or weight blocks that disagree with the declared
    /// dimensions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let reader = ModelReader::from_bytes(bytes.to_vec())?;

        match reader.metadata("model_type").and_then(JsonValue::as_str) {
            Some(MODEL_TYPE) => {}
            other => {
                return Err(EtiquetarError::FormatError {
                    message: format!("unexpected model type {other:?}"),
                })
            }
        }
        let version = require_usize(&reader, "format_version")? as u32;
        if version > FORMAT_VERSION {
            return Err(EtiquetarError::UnsupportedVersion {
                found: version,
                supported: FORMAT_VERSION,
            });
        }

        let num_classes = require_usize(&reader, "num_classes")?;
        let num_features = require_usize(&reader, "num_features")?;
        let feature_only = reader
            .metadata("feature_only")
            .and_then(JsonValue::as_bool)
            .ok_or_else(|| missing_field("feature_only"))?;

        let combinations: Vec<Vec<usize>> = reader
            .metadata("supported_combinations")
            .cloned()
            .ok_or_else(|| missing_field("supported_combinations"))
            .and_then(|value| {
                serde_json::from_value(value)
                    .map_err(|e| EtiquetarError::Serialization(e.to_string()))
            })?;
        for combination in &combinations {
            if let Some(&label) = combination.iter().find(|&&l| l >= num_classes) {
                return Err(EtiquetarError::FormatError {
                    message: format!(
                        "supported combination references class {label}, num_classes={num_classes}"
                    ),
                });
            }
        }
        let supported: Vec<LabelSet> = combinations.into_iter().map(LabelSet::from_labels).collect();

        let class_weights = reader.read_block_f64("class_weights")?;
        let biases = reader.read_block_f64("biases")?;
        let pairwise = if feature_only {
            Vec::new()
        } else {
            reader.read_block_f64("pairwise")?
        };
        let weights = Weights::from_parts(
            num_classes,
            num_features,
            feature_only,
            class_weights,
            biases,
            pairwise,
        )
        .map_err(|e| EtiquetarError::FormatError {
            message: e.to_string(),
        })?;

        let feature_list = optional_names(&reader, "feature_names")?.map(FeatureList::new);
        let label_translator =
            optional_names(&reader, "label_names")?.map(LabelTranslator::from_names);

        Ok(Self {
            num_classes,
            num_features,
            feature_only,
            weights,
            supported,
            feature_list,
            label_translator,
        })
    }

    /// Saves the model to `path` as one atomic record, creating missing
    /// parent directories first.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Loads a model previously written by [`PairwiseCrf::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or fails structural
    /// validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_bytes(&fs::read(path)?)
    }
}

impl fmt::Display for PairwiseCrf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PairwiseCrf {{ classes: {}, features: {}, feature_only: {}, supported: {} }}",
            self.num_classes,
            self.num_features,
            self.feature_only,
            self.supported.len()
        )
    }
}

impl MultiLabelClassifier for PairwiseCrf {
    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn predict(&self, x: &FeatureVector) -> Result<LabelSet> {
        PairwiseCrf::predict(self, x)
    }

    fn save(&self, path: &Path) -> Result<()> {
        PairwiseCrf::save(self, path)
    }

    fn feature_list(&self) -> Option<&FeatureList> {
        self.feature_list.as_ref()
    }

    fn label_translator(&self) -> Option<&LabelTranslator> {
        self.label_translator.as_ref()
    }
}

/// Stable log-sum-exp: `m + ln(Σ exp(s - m))` with `m = max(s)`.
///
/// Valid even when all scores coincide or are large in magnitude; the
/// max subtraction keeps every exponent at or below zero.
fn log_sum_exp(scores: &[f64]) -> f64 {
    let max = scores.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    max + scores.iter().map(|&s| (s - max).exp()).sum::<f64>().ln()
}

fn require_usize(reader: &ModelReader, key: &str) -> Result<usize> {
    reader
        .metadata(key)
        .and_then(JsonValue::as_u64)
        .map(|v| v as usize)
        .ok_or_else(|| missing_field(key))
}

fn optional_names(reader: &ModelReader, key: &str) -> Result<Option<Vec<String>>> {
    match reader.metadata(key) {
        None => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| EtiquetarError::Serialization(e.to_string())),
    }
}

fn missing_field(key: &str) -> EtiquetarError {
    EtiquetarError::FormatError {
        message: format!("missing or invalid `{key}` metadata"),
    }
}


#[cfg(test)]
mod tests_distribution_contract;
