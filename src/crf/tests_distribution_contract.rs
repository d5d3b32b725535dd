//! Property tests for the distribution and prediction contracts.
//!
//! A reference scorer is rebuilt here from the potential decomposition so
//! the production scoring loop is checked against an independent reading of
//! the same model.

use super::*;
use proptest::prelude::*;

const NUM_CLASSES: usize = 3;
const NUM_FEATURES: usize = 2;

/// All 2^3 combinations, empty set first.
fn power_set() -> Vec<LabelSet> {
    (0..8u32)
        .map(|bits| LabelSet::from_labels((0..NUM_CLASSES).filter(|&l| bits & (1 << l) != 0)))
        .collect()
}

fn build_model(class_weights: &[f64], biases: &[f64], pairwise: &[f64]) -> PairwiseCrf {
    let mut model =
        PairwiseCrf::new(NUM_CLASSES, NUM_FEATURES).with_supported_combinations(power_set());
    for l in 0..NUM_CLASSES {
        model
            .weights_mut()
            .set_class_weights(l, &class_weights[l * NUM_FEATURES..(l + 1) * NUM_FEATURES])
            .expect("row length matches");
        model.weights_mut().set_bias(l, biases[l]).expect("class in range");
    }
    let block = model.weights().feature_block_size();
    for (i, &w) in pairwise.iter().enumerate() {
        model
            .weights_mut()
            .set_pairwise_weight(block + i, w)
            .expect("index in block");
    }
    model
}

/// Independent scorer: unary terms over present classes, plus the
/// joint-state weight of every unordered pair via `pair_offset`.
fn reference_score(model: &PairwiseCrf, x: &[f64], y: &LabelSet) -> f64 {
    let mut score = 0.0;
    for l in 0..NUM_CLASSES {
        if y.contains(l) {
            let row = model.weights().class_weights(l);
            score += row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>();
            score += model.weights().bias(l);
        }
    }
    for l1 in 0..NUM_CLASSES {
        for l2 in (l1 + 1)..NUM_CLASSES {
            let pattern = usize::from(y.contains(l1)) + 2 * usize::from(y.contains(l2));
            score += model
                .weights()
                .pairwise_weight(model.weights().pair_offset(l1, l2) + pattern);
        }
    }
    score
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_probabilities_form_a_distribution(
        class_weights in prop::collection::vec(-5.0f64..5.0, NUM_CLASSES * NUM_FEATURES),
        biases in prop::collection::vec(-5.0f64..5.0, NUM_CLASSES),
        pairwise in prop::collection::vec(-5.0f64..5.0, 4 * NUM_CLASSES * (NUM_CLASSES - 1) / 2),
        x in prop::collection::vec(-10.0f64..10.0, NUM_FEATURES),
    ) {
        let model = build_model(&class_weights, &biases, &pairwise);
        let input = FeatureVector::from_dense(&x);

        let probs = model.combination_probs(&input).expect("dimension matches");
        let log_probs = model.log_combination_probs(&input).expect("dimension matches");

        let total: f64 = probs.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "probabilities sum to {total}");
        for (p, lp) in probs.iter().zip(&log_probs) {
            prop_assert!(*p >= 0.0);
            prop_assert!((p - lp.exp()).abs() < 1e-12);
        }
    }

    #[test]
    fn prop_predict_is_first_index_argmax(
        class_weights in prop::collection::vec(-5.0f64..5.0, NUM_CLASSES * NUM_FEATURES),
        biases in prop::collection::vec(-5.0f64..5.0, NUM_CLASSES),
        pairwise in prop::collection::vec(-5.0f64..5.0, 4 * NUM_CLASSES * (NUM_CLASSES - 1) / 2),
        x in prop::collection::vec(-10.0f64..10.0, NUM_FEATURES),
    ) {
        let model = build_model(&class_weights, &biases, &pairwise);
        let input = FeatureVector::from_dense(&x);

        let scores = model.combination_scores(&input).expect("dimension matches");
        let mut best = 0;
        for (k, &s) in scores.iter().enumerate() {
            if s > scores[best] {
                best = k;
            }
        }
        let predicted = model.predict(&input).expect("supported list is non-empty");
        prop_assert_eq!(predicted, model.supported_combinations()[best].clone());
    }

    #[test]
    fn prop_scores_match_reference_decomposition(
        class_weights in prop::collection::vec(-5.0f64..5.0, NUM_CLASSES * NUM_FEATURES),
        biases in prop::collection::vec(-5.0f64..5.0, NUM_CLASSES),
        pairwise in prop::collection::vec(-5.0f64..5.0, 4 * NUM_CLASSES * (NUM_CLASSES - 1) / 2),
        x in prop::collection::vec(-10.0f64..10.0, NUM_FEATURES),
    ) {
        let model = build_model(&class_weights, &biases, &pairwise);
        let input = FeatureVector::from_dense(&x);

        let scores = model.combination_scores(&input).expect("dimension matches");
        for (k, y) in model.supported_combinations().iter().enumerate() {
            let expected = reference_score(&model, &x, y);
            prop_assert!(
                (scores[k] - expected).abs() < 1e-9,
                "combination {k}: {} vs reference {expected}",
                scores[k]
            );
        }
    }

    #[test]
    fn prop_round_trip_preserves_scores(
        class_weights in prop::collection::vec(-5.0f64..5.0, NUM_CLASSES * NUM_FEATURES),
        biases in prop::collection::vec(-5.0f64..5.0, NUM_CLASSES),
        pairwise in prop::collection::vec(-5.0f64..5.0, 4 * NUM_CLASSES * (NUM_CLASSES - 1) / 2),
        x in prop::collection::vec(-10.0f64..10.0, NUM_FEATURES),
    ) {
        let model = build_model(&class_weights, &biases, &pairwise);
        let input = FeatureVector::from_dense(&x);

        let bytes = model.to_bytes().expect("serialization succeeds");
        let loaded = PairwiseCrf::from_bytes(&bytes).expect("record is valid");

        prop_assert_eq!(
            model.combination_scores(&input).expect("dimension matches"),
            loaded.combination_scores(&input).expect("dimension matches")
        );
    }
}
