//! Greedy Jaccard clustering of orders by process-sequence similarity.
//!
//! Orders are sorted by due date ascending, then each unassigned order seeds
//! a cluster absorbing every other unassigned order whose step-set Jaccard
//! similarity meets the threshold; oversized clusters are sliced into
//! `qMax`-sized sub-clusters.

use std::collections::HashSet;

pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union: HashSet<&String> = a.union(b).collect();
    if union.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union.len() as f64
}

/// One clustering input: an order id, its due date (for seed ordering) and
/// its normalized step set.
#[derive(Debug, Clone)]
pub struct ClusterInput {
    pub order_id: String,
    pub due_date: f64,
    pub seq_set: HashSet<String>,
}

/// Clusters orders greedily; every returned cluster has size <= `q_max`.
pub fn cluster_by_jaccard(orders: &[ClusterInput], threshold: f64, q_max: usize) -> Vec<Vec<usize>> {
    let q_max = q_max.max(1);
    let mut sorted_idx: Vec<usize> = (0..orders.len()).collect();
    sorted_idx.sort_by(|&a, &b| orders[a].due_date.partial_cmp(&orders[b].due_date).unwrap_or(std::cmp::Ordering::Equal));

    let mut assigned = vec![false; orders.len()];
    let mut clusters = Vec::new();

    for &seed_pos in &sorted_idx {
        if assigned[seed_pos] {
            continue;
        }
        assigned[seed_pos] = true;
        let mut cluster = vec![seed_pos];
        let base_seq = &orders[seed_pos].seq_set;

        for &cand_pos in &sorted_idx {
            if assigned[cand_pos] {
                continue;
            }
            if jaccard(base_seq, &orders[cand_pos].seq_set) >= threshold {
                assigned[cand_pos] = true;
                cluster.push(cand_pos);
            }
        }

        for chunk in cluster.chunks(q_max) {
            clusters.push(chunk.to_vec());
        }
    }

    clusters
}

/// Average pairwise Jaccard similarity within a cluster (1.0 for singletons).
pub fn avg_pairwise_jaccard(sets: &[&HashSet<String>]) -> f64 {
    if sets.len() <= 1 {
        return 1.0;
    }
    let mut total = 0.0;
    let mut count = 0usize;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            total += jaccard(sets[i], sets[j]);
            count += 1;
        }
    }
    if count == 0 { 1.0 } else { total / count as f64 }
}

/// Full n x n similarity matrix, diagonal = 1.0.
pub fn jaccard_matrix(sets: &[&HashSet<String>]) -> Vec<Vec<f64>> {
    let n = sets.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            matrix[i][j] = if i == j { 1.0 } else { jaccard(sets[i], sets[j]) };
        }
    }
    matrix
}
