//! Discretizer unit properties: left-closed/right-open buckets and
//! state construction.

use credit_core::discretize::{digitize, BinConfig};

#[test]
fn value_equal_to_edge_falls_into_upper_bucket() {
    let edges = [0.2, 0.4, 0.6, 0.8];
    assert_eq!(digitize(0.2, &edges), 1);
    assert_eq!(digitize(0.4, &edges), 2);
    assert_eq!(digitize(0.8, &edges), 4);
}

#[test]
fn values_between_edges_land_in_expected_buckets() {
    let edges = [0.2, 0.4, 0.6, 0.8];
    assert_eq!(digitize(0.0, &edges), 0);
    assert_eq!(digitize(0.19, &edges), 0);
    assert_eq!(digitize(0.3, &edges), 1);
    assert_eq!(digitize(0.59, &edges), 2);
    assert_eq!(digitize(0.99, &edges), 4);
}

#[test]
fn max_bucket_index_equals_edge_count() {
    let edges = [0.3, 0.6, 0.8];
    assert_eq!(digitize(f64::MAX, &edges), edges.len());

    // One more edge raises the maximum index by exactly one.
    let more = [0.3, 0.6, 0.8, 0.9];
    assert_eq!(digitize(f64::MAX, &more), edges.len() + 1);
}

#[test]
fn no_edges_means_single_bucket() {
    assert_eq!(digitize(123.0, &[]), 0);
    assert_eq!(digitize(-123.0, &[]), 0);
}

#[test]
fn same_bins_produce_identical_states() {
    let bins = BinConfig::default();

    // Different continuous values, same buckets on every axis.
    let a = bins.build_state(0.05, 0.35, 450.0);
    let b = bins.build_state(0.19, 0.59, 499.0);
    assert_eq!(a, b, "same-bin inputs must map to the identical state");

    // Crossing one axis boundary changes the state.
    let c = bins.build_state(0.25, 0.35, 450.0);
    assert_ne!(a, c);
}

#[test]
fn default_bins_cover_three_axes() {
    let bins = BinConfig::default();
    assert_eq!(bins.pd.len(), 4);
    assert_eq!(bins.anom.len(), 3);
    assert_eq!(bins.cs.len(), 4);
}
