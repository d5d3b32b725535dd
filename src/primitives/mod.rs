//! Core numeric primitives.
//!
//! [`FeatureVector`] is the read-only input to all scoring operations. It is
//! stored sparsely so dot products against dense weight rows only visit
//! active coordinates.

mod feature_vector;

pub use feature_vector::FeatureVector;
