//! Scorer Interface contract: feature reordering, missing-feature
//! failures, and the per-kind attribution providers.

use credit_core::error::EngineError;
use credit_core::features::FeatureVector;
use credit_core::scorer::{
    Classifier, DecisionTree, LogisticModel, ModelKind, Scorer, StandardScaler, TreeEnsemble,
    TreeNode,
};

fn leaf(value: f64) -> TreeNode {
    TreeNode {
        feature: -1,
        threshold: 0.0,
        left: 0,
        right: 0,
        value,
    }
}

fn stump(feature: usize, threshold: f64, below: f64, above: f64) -> DecisionTree {
    DecisionTree {
        nodes: vec![
            TreeNode {
                feature: feature as i32,
                threshold,
                left: 1,
                right: 2,
                value: (below + above) / 2.0,
            },
            leaf(below),
            leaf(above),
        ],
    }
}

fn logistic_scorer() -> Scorer {
    Scorer {
        name: "test-pd".into(),
        features: vec!["a".into(), "b".into()],
        scaler: Some(StandardScaler {
            mean: vec![1.0, 2.0],
            scale: vec![2.0, 4.0],
        }),
        model: ModelKind::Logistic(LogisticModel {
            weights: vec![1.0, -1.0],
            intercept: 0.0,
        }),
    }
}

#[test]
fn input_feature_order_does_not_matter() {
    let scorer = logistic_scorer();

    let mut forward = FeatureVector::new();
    forward.set("a", 3.0);
    forward.set("b", 6.0);

    let mut reversed = FeatureVector::new();
    reversed.set("b", 6.0);
    reversed.set("a", 3.0);

    let s1 = scorer.score(&forward).expect("score");
    let s2 = scorer.score(&reversed).expect("score");
    assert_eq!(s1, s2, "scorer must reorder inputs itself");
}

#[test]
fn extra_features_are_ignored() {
    let scorer = logistic_scorer();
    let mut fv = FeatureVector::new();
    fv.set("a", 3.0);
    fv.set("b", 6.0);
    fv.set("unrelated", 99.0);
    assert!(scorer.score(&fv).is_ok());
}

#[test]
fn missing_feature_is_a_data_contract_error() {
    let scorer = logistic_scorer();
    let mut fv = FeatureVector::new();
    fv.set("a", 3.0);

    match scorer.score(&fv) {
        Err(EngineError::MissingFeature { scorer, feature }) => {
            assert_eq!(scorer, "test-pd");
            assert_eq!(feature, "b");
        }
        other => panic!("expected MissingFeature, got {other:?}"),
    }
}

#[test]
fn logistic_probability_and_contributions() {
    let scorer = logistic_scorer();
    let mut fv = FeatureVector::new();
    fv.set("a", 3.0); // z = 1.0
    fv.set("b", 2.0); // z = 0.0

    // logit = 1*1 + (-1)*0 = 1
    let p = scorer.score(&fv).expect("score");
    assert!((p - 1.0 / (1.0 + (-1.0f64).exp())).abs() < 1e-12);

    let contributions = scorer.contributions(&fv).expect("contributions");
    assert_eq!(contributions, vec![1.0, -0.0]);
}

#[test]
fn tree_path_contributions_sum_to_leaf_minus_root() {
    let tree = stump(0, 0.5, -1.0, 3.0);
    let x = [0.7, 0.0];

    assert_eq!(tree.predict(&x), 3.0);
    let mut out = [0.0; 2];
    tree.accumulate_contributions(&x, &mut out);
    // Root expectation is 1.0, leaf is 3.0: feature 0 gets the delta.
    assert_eq!(out, [2.0, 0.0]);
}

#[test]
fn ensemble_prediction_is_base_plus_tree_sum() {
    let ensemble = TreeEnsemble {
        base: 10.0,
        trees: vec![stump(0, 0.5, 1.0, 2.0), stump(1, 0.5, -3.0, 4.0)],
    };
    assert_eq!(ensemble.predict(&[0.0, 1.0]), 10.0 + 1.0 + 4.0);
    assert_eq!(ensemble.predict(&[1.0, 0.0]), 10.0 + 2.0 - 3.0);
}

#[test]
fn classifier_ties_break_toward_lowest_class_index() {
    let same = TreeEnsemble {
        base: 1.0,
        trees: vec![],
    };
    let classifier = Classifier {
        name: "test-risk".into(),
        features: vec!["a".into()],
        labels: vec!["LOW".into(), "MEDIUM".into(), "HIGH".into()],
        per_class: vec![same.clone(), same.clone(), same],
    };

    let mut fv = FeatureVector::new();
    fv.set("a", 0.0);
    assert_eq!(classifier.classify(&fv).expect("classify"), 0);
}

#[test]
fn classifier_picks_highest_scoring_class() {
    let mk = |base: f64| TreeEnsemble { base, trees: vec![] };
    let classifier = Classifier {
        name: "test-risk".into(),
        features: vec!["a".into()],
        labels: vec!["LOW".into(), "MEDIUM".into(), "HIGH".into()],
        per_class: vec![mk(0.1), mk(2.5), mk(-1.0)],
    };

    let mut fv = FeatureVector::new();
    fv.set("a", 0.0);
    assert_eq!(classifier.classify(&fv).expect("classify"), 1);
}
