use std::collections::BTreeMap;

use super::order::OperationPhase;

/// One scheduled interval produced by the `CapacitySimulator`.
#[derive(Debug, Clone)]
pub struct ScheduledOp {
    pub order_id: String,
    pub op_id: String,
    pub phase: OperationPhase,
    pub slot_index: usize,
    pub step: Option<String>,
    pub start: f64,
    pub end: f64,
    pub setup_applied: bool,
}

/// Aggregate metrics produced by one simulation run.
#[derive(Debug, Clone, Default)]
pub struct SimMetrics {
    pub makespan: f64,
    pub tardiness: f64,
    pub avg_tardiness: f64,
    /// Population variance of per-order tardiness within this one run.
    pub tardiness_variance: f64,
    pub lateness: f64,
    pub avg_lateness: f64,
    pub idle_time: f64,
    pub setup_time: f64,
    pub avg_utilization: f64,
    pub slot_utilizations: Vec<f64>,
}

/// LRB output: a cluster of orders released together.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub order_ids: Vec<String>,
    pub release_at: f64,
    pub window_start_earliest: f64,
    pub window_start_latest: f64,
    pub window_end_earliest: f64,
    pub window_end_latest: f64,
    pub avg_jaccard: f64,
    pub jaccard_matrix: Vec<Vec<f64>>,
    pub order_sequences: Vec<(String, Vec<String>)>,
}

/// MRS/SRFS output: one candidate permutation + variant assignment and its
/// simulated outcome.
#[derive(Debug, Clone)]
pub struct Plan {
    pub id: String,
    pub sequence: Vec<usize>,
    pub variant_choices: BTreeMap<String, usize>,
    pub timeline: Option<Vec<ScheduledOp>>,
    pub metrics: SimMetrics,
    /// 1 = non-dominated front. `None` outside of SRFS.
    pub pareto_rank: Option<usize>,
    pub crowding_distance: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct HoldDecision {
    pub order_id: String,
    pub hold_until_sim_minute: f64,
    pub reason: String,
}
