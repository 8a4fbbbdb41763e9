use std::collections::HashSet;

use remanufacturing_scheduler::domain::similarity_clusterer::{avg_pairwise_jaccard, cluster_by_jaccard, jaccard, jaccard_matrix, ClusterInput};

fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn jaccard_of_two_empty_sets_is_zero_not_nan() {
    assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
}

#[test]
fn jaccard_of_identical_sets_is_one() {
    let a = set(&["A", "B", "C"]);
    assert_eq!(jaccard(&a, &a), 1.0);
}

#[test]
fn four_identical_step_sets_cluster_together() {
    let inputs: Vec<ClusterInput> = (1..=4).map(|i| ClusterInput { order_id: format!("O{i}"), due_date: 10_000.0, seq_set: set(&["A", "B", "C"]) }).collect();
    let clusters = cluster_by_jaccard(&inputs, 0.5, 4);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].len(), 4);

    let sets: Vec<&HashSet<String>> = clusters[0].iter().map(|&i| &inputs[i].seq_set).collect();
    assert_eq!(avg_pairwise_jaccard(&sets), 1.0);
}

#[test]
fn oversized_cluster_is_sliced_into_q_max_sized_chunks() {
    let inputs: Vec<ClusterInput> = (1..=5).map(|i| ClusterInput { order_id: format!("O{i}"), due_date: i as f64, seq_set: set(&["A", "B"]) }).collect();
    let clusters = cluster_by_jaccard(&inputs, 0.5, 2);
    assert_eq!(clusters.len(), 3, "5 orders chunked by q_max=2 yields 2+2+1");
    assert_eq!(clusters.iter().map(|c| c.len()).sum::<usize>(), 5);
    assert!(clusters.iter().all(|c| c.len() <= 2));
}

#[test]
fn dissimilar_orders_form_singleton_clusters() {
    let inputs = vec![
        ClusterInput { order_id: "O1".into(), due_date: 1.0, seq_set: set(&["A"]) },
        ClusterInput { order_id: "O2".into(), due_date: 2.0, seq_set: set(&["Z"]) },
    ];
    let clusters = cluster_by_jaccard(&inputs, 0.5, 4);
    assert_eq!(clusters.len(), 2);
}

#[test]
fn avg_pairwise_jaccard_of_a_singleton_is_one() {
    let a = set(&["A"]);
    assert_eq!(avg_pairwise_jaccard(&[&a]), 1.0);
}

#[test]
fn jaccard_matrix_has_a_unit_diagonal() {
    let a = set(&["A", "B"]);
    let b = set(&["B", "C"]);
    let matrix = jaccard_matrix(&[&a, &b]);
    assert_eq!(matrix[0][0], 1.0);
    assert_eq!(matrix[1][1], 1.0);
    assert!((matrix[0][1] - (1.0 / 3.0)).abs() < 1e-9);
    assert_eq!(matrix[0][1], matrix[1][0]);
}
