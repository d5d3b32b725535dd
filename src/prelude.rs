//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use etiquetar::prelude::*;
//! ```

pub use crate::crf::{PairwiseCrf, Weights};
pub use crate::error::{EtiquetarError, Result};
pub use crate::metadata::{FeatureList, LabelTranslator};
pub use crate::multilabel::LabelSet;
pub use crate::primitives::FeatureVector;
pub use crate::traits::MultiLabelClassifier;
