//! Optional descriptive metadata for downstream reporting.
//!
//! Neither type participates in scoring; a model without them behaves
//! identically. They exist so reports can print feature and label names
//! instead of raw indices.

use crate::multilabel::LabelSet;
use serde::{Deserialize, Serialize};

/// Human-readable names for feature coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureList {
    names: Vec<String>,
}

impl FeatureList {
    /// Builds a feature list from names, indexed by feature coordinate.
    #[must_use]
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Name of feature `index`, if known.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Number of named features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no feature is named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All feature names, indexed by coordinate.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Maps class indices to human-readable label names and back.
///
/// # Examples
///
/// ```
/// use etiquetar::metadata::LabelTranslator;
/// use etiquetar::multilabel::LabelSet;
///
/// let translator = LabelTranslator::from_names(vec![
///     "sports".to_string(),
///     "politics".to_string(),
/// ]);
/// assert_eq!(translator.name(1), Some("politics"));
/// assert_eq!(translator.index_of("sports"), Some(0));
///
/// let y = LabelSet::from_labels([0, 1]);
/// assert_eq!(translator.translate(&y), vec!["sports", "politics"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTranslator {
    names: Vec<String>,
}

impl LabelTranslator {
    /// Builds a translator from names, indexed by class.
    #[must_use]
    pub fn from_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Name of class `class`, if known.
    #[must_use]
    pub fn name(&self, class: usize) -> Option<&str> {
        self.names.get(class).map(String::as_str)
    }

    /// Class index of `name`, if known.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Number of named classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no class is named.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All label names, indexed by class.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names for every class present in `combination`; classes without a
    /// known name render as their index.
    #[must_use]
    pub fn translate(&self, combination: &LabelSet) -> Vec<String> {
        combination
            .labels()
            .iter()
            .map(|&l| match self.name(l) {
                Some(name) => name.to_string(),
                None => l.to_string(),
            })
            .collect()
    }
}
