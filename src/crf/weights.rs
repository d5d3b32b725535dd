//! Weight storage for the pairwise log-linear model.

use crate::error::{EtiquetarError, Result};
use serde::{Deserialize, Serialize};

/// Per-class weight vectors, per-class biases, and (unless the model is
/// feature-only) a flat block of pairwise interaction weights.
///
/// The flattened layout places all `num_classes * num_features` class
/// weights first; the pairwise block begins at [`Weights::feature_block_size`].
/// Unordered class pairs `(l1, l2)` with `l1 < l2` are enumerated with `l1`
/// ascending outer and `l2` ascending inner, 4 consecutive slots per pair
/// for the joint states (l1 absent, l2 absent), (l1 present, l2 absent),
/// (l1 absent, l2 present), (l1 present, l2 present). Weight files are
/// order-dependent, so this enumeration is frozen.
///
/// All read accessors are pure; mutation belongs to an external trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    num_classes: usize,
    num_features: usize,
    feature_only: bool,
    /// Row-major `num_classes x num_features`.
    class_weights: Vec<f64>,
    biases: Vec<f64>,
    /// `4 * num_pairs` values, empty when feature-only.
    pairwise: Vec<f64>,
}

impl Weights {
    /// Creates zero-initialized weights for the given dimensions.
    #[must_use]
    pub fn new(num_classes: usize, num_features: usize, feature_only: bool) -> Self {
        let pairwise_len = if feature_only {
            0
        } else {
            4 * num_classes * num_classes.saturating_sub(1) / 2
        };
        Self {
            num_classes,
            num_features,
            feature_only,
            class_weights: vec![0.0; num_classes * num_features],
            biases: vec![0.0; num_classes],
            pairwise: vec![0.0; pairwise_len],
        }
    }

    /// Reassembles weights from raw parts, validating every length against
    /// the declared dimensions. Used when loading a persisted model.
    ///
    /// # Errors
    ///
    /// Returns an error if any block length disagrees with the dimensions.
    pub fn from_parts(
        num_classes: usize,
        num_features: usize,
        feature_only: bool,
        class_weights: Vec<f64>,
        biases: Vec<f64>,
        pairwise: Vec<f64>,
    ) -> Result<Self> {
        if class_weights.len() != num_classes * num_features {
            return Err(EtiquetarError::dimension_mismatch(
                "class weight block",
                num_classes * num_features,
                class_weights.len(),
            ));
        }
        if biases.len() != num_classes {
            return Err(EtiquetarError::dimension_mismatch(
                "bias block",
                num_classes,
                biases.len(),
            ));
        }
        let expected_pairwise = if feature_only {
            0
        } else {
            4 * num_classes * num_classes.saturating_sub(1) / 2
        };
        if pairwise.len() != expected_pairwise {
            return Err(EtiquetarError::dimension_mismatch(
                "pairwise block",
                expected_pairwise,
                pairwise.len(),
            ));
        }
        Ok(Self {
            num_classes,
            num_features,
            feature_only,
            class_weights,
            biases,
            pairwise,
        })
    }

    /// Number of classes the weights cover.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Feature dimension of each class weight row.
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Whether the pairwise block is absent.
    #[must_use]
    pub fn is_feature_only(&self) -> bool {
        self.feature_only
    }

    /// Offset where the pairwise block begins in the flattened layout,
    /// equal to `num_classes * num_features`.
    #[must_use]
    pub fn feature_block_size(&self) -> usize {
        self.num_classes * self.num_features
    }

    /// Number of unordered class pairs, `C * (C-1) / 2`.
    #[must_use]
    pub fn num_pairs(&self) -> usize {
        self.num_classes * self.num_classes.saturating_sub(1) / 2
    }

    /// Weight row for class `class` (bias excluded).
    ///
    /// # Panics
    ///
    /// Panics if `class >= num_classes`.
    #[must_use]
    pub fn class_weights(&self, class: usize) -> &[f64] {
        assert!(
            class < self.num_classes,
            "class index {class} out of range (num_classes={})",
            self.num_classes
        );
        let start = class * self.num_features;
        &self.class_weights[start..start + self.num_features]
    }

    /// Bias scalar for class `class`.
    ///
    /// # Panics
    ///
    /// Panics if `class >= num_classes`.
    #[must_use]
    pub fn bias(&self, class: usize) -> f64 {
        assert!(
            class < self.num_classes,
            "class index {class} out of range (num_classes={})",
            self.num_classes
        );
        self.biases[class]
    }

    /// Pairwise weight at flattened-model index `flat_index`, which must be
    /// at least [`Weights::feature_block_size`].
    ///
    /// # Panics
    ///
    /// Panics if the model is feature-only or `flat_index` falls outside
    /// the pairwise block.
    #[must_use]
    pub fn pairwise_weight(&self, flat_index: usize) -> f64 {
        assert!(
            !self.feature_only,
            "pairwise weight requested from a feature-only model"
        );
        let block = self.feature_block_size();
        assert!(
            flat_index >= block && flat_index - block < self.pairwise.len(),
            "pairwise index {flat_index} out of range (block starts at {block}, len={})",
            self.pairwise.len()
        );
        self.pairwise[flat_index - block]
    }

    /// Flattened offset of the 4-slot block for pair `(l1, l2)`.
    ///
    /// # Panics
    ///
    /// Panics unless `l1 < l2 < num_classes`.
    #[must_use]
    pub fn pair_offset(&self, l1: usize, l2: usize) -> usize {
        assert!(
            l1 < l2 && l2 < self.num_classes,
            "invalid class pair ({l1}, {l2}) for num_classes={}",
            self.num_classes
        );
        let rank = l1 * (2 * self.num_classes - l1 - 1) / 2 + (l2 - l1 - 1);
        self.feature_block_size() + 4 * rank
    }

    /// Replaces the weight row for class `class`.
    ///
    /// # Errors
    ///
    /// Returns an error if `class` or the row length is out of range.
    pub fn set_class_weights(&mut self, class: usize, row: &[f64]) -> Result<()> {
        if class >= self.num_classes {
            return Err(EtiquetarError::IndexOutOfRange {
                what: "class",
                index: class,
                len: self.num_classes,
            });
        }
        if row.len() != self.num_features {
            return Err(EtiquetarError::dimension_mismatch(
                "num_features",
                self.num_features,
                row.len(),
            ));
        }
        let start = class * self.num_features;
        self.class_weights[start..start + self.num_features].copy_from_slice(row);
        Ok(())
    }

    /// Sets the bias for class `class`.
    ///
    /// # Errors
    ///
    /// Returns an error if `class` is out of range.
    pub fn set_bias(&mut self, class: usize, bias: f64) -> Result<()> {
        if class >= self.num_classes {
            return Err(EtiquetarError::IndexOutOfRange {
                what: "class",
                index: class,
                len: self.num_classes,
            });
        }
        self.biases[class] = bias;
        Ok(())
    }

    /// Sets the pairwise weight at flattened-model index `flat_index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is feature-only or the index falls
    /// outside the pairwise block.
    pub fn set_pairwise_weight(&mut self, flat_index: usize, weight: f64) -> Result<()> {
        let block = self.feature_block_size();
        if self.feature_only || flat_index < block || flat_index - block >= self.pairwise.len() {
            return Err(EtiquetarError::IndexOutOfRange {
                what: "pairwise weight",
                index: flat_index,
                len: block + self.pairwise.len(),
            });
        }
        self.pairwise[flat_index - block] = weight;
        Ok(())
    }

    /// The full class-weight block, row-major.
    #[must_use]
    pub fn class_weight_block(&self) -> &[f64] {
        &self.class_weights
    }

    /// All biases, indexed by class.
    #[must_use]
    pub fn bias_block(&self) -> &[f64] {
        &self.biases
    }

    /// The raw pairwise block (empty when feature-only).
    #[must_use]
    pub fn pairwise_block(&self) -> &[f64] {
        &self.pairwise
    }
}
