//! Etiquetar: multi-label structured prediction in pure Rust.
//!
//! Etiquetar scores every admissible combination of labels under a
//! log-linear model with per-class and pairwise (label-interaction)
//! potentials, converts scores to a probability distribution via a
//! numerically stable softmax, and selects the highest-scoring combination
//! as the prediction. Training, dataset handling and the enumeration of
//! admissible combinations are left to external collaborators; the model
//! consumes an ordered supported-combination list and a feature vector.
//!
//! # Quick Start
//!
//! ```
//! use etiquetar::prelude::*;
//!
//! // Two classes, one feature, unary potentials only.
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
//! let predicted = model.predict(&x).unwrap();
//! assert_eq!(predicted, LabelSet::from_labels([0]));
//!
//! let probs = model.combination_probs(&x).unwrap();
//! assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: sparse [`primitives::FeatureVector`] input type
//! - [`multilabel`]: [`multilabel::LabelSet`] label combinations
//! - [`crf`]: the [`crf::PairwiseCrf`] model (scoring, softmax, argmax)
//! - [`metadata`]: optional feature/label names for reporting
//! - [`serialization`]: versioned binary container behind save/load
//! - [`traits`]: the [`traits::MultiLabelClassifier`] abstraction
//! - [`error`]: crate error type and `Result` alias

pub mod crf;
pub mod error;
pub mod metadata;
pub mod multilabel;
pub mod prelude;
pub mod primitives;
pub mod serialization;
pub mod traits;
