//! Post-hoc admission control, shared by all three stages: hold orders
//! beyond predicted capacity when slack permits. LRB additionally emits one
//! hold per deferred cluster via [`deferred_cluster_holds`].

use super::plan::HoldDecision;

/// One order's position in an already-built release sequence, with the
/// data needed to judge whether it can safely be held.
#[derive(Debug, Clone)]
pub struct HoldCandidate {
    pub order_id: String,
    pub due_date: f64,
    pub estimated_completion: f64,
    pub processing_time: f64,
}

/// Estimates per-cycle capacity as `total_slots * cycle_minutes` and load as
/// the sum of every candidate's processing time. If predicted utilization
/// exceeds `threshold` and there are more orders than slots, every order
/// past the slot-count-th position with slack `>= 2 * cycle_minutes` is
/// held until `now + cycle_minutes`.
pub fn decide_holds(candidates_in_release_order: &[HoldCandidate], total_slots: usize, cycle_minutes: f64, threshold: f64, now: f64) -> Vec<HoldDecision> {
    if total_slots == 0 || cycle_minutes <= 0.0 {
        return Vec::new();
    }
    let capacity = total_slots as f64 * cycle_minutes;
    let load: f64 = candidates_in_release_order.iter().map(|c| c.processing_time).sum();
    let predicted_util = load / capacity;

    if predicted_util <= threshold || candidates_in_release_order.len() <= total_slots {
        return Vec::new();
    }

    let mut holds = Vec::new();
    for candidate in &candidates_in_release_order[total_slots..] {
        let slack = candidate.due_date - candidate.estimated_completion;
        if slack >= 2.0 * cycle_minutes {
            holds.push(HoldDecision {
                order_id: candidate.order_id.clone(),
                hold_until_sim_minute: now + cycle_minutes,
                reason: format!("predicted utilization {:.1}% exceeds threshold with {:.0} min slack available", predicted_util * 100.0, slack),
            });
        }
    }
    holds
}

/// LRB holds every order in a deferred cluster until the next planning
/// cycle, independent of the slack-based admission check above.
pub fn deferred_cluster_holds(order_ids: &[String], hold_until_sim_minute: f64) -> Vec<HoldDecision> {
    order_ids
        .iter()
        .map(|order_id| HoldDecision {
            order_id: order_id.clone(),
            hold_until_sim_minute,
            reason: "batch deferred to next planning cycle: cluster too weak to release".to_string(),
        })
        .collect()
}
