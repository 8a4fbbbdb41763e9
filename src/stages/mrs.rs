//! Mid-range sequencing: a genetic algorithm jointly optimizes the order
//! permutation and each order's process-sequence variant, evaluated by the
//! shared capacity simulator. Falls back to a plain FIFO release when there
//! are too few orders for a GA pass to be meaningful.

use std::collections::{BTreeMap, HashMap};

use crate::api::common::{DebugEntryDto, EtaEntryDto, HoldDecisionDto};
use crate::api::mrs::{BatchDto, MrsInput, MrsOutput, PriorityDto, RouteDto};
use crate::domain::capacity_simulator::CapacityConfig;
use crate::domain::genetic_optimizer::{self, EvaluationStrategy};
use crate::domain::hold_decider::{self, HoldCandidate};
use crate::domain::input_model::{build_order, DueDatePolicy};
use crate::domain::order::Order;
use crate::domain::plan::Plan;
use crate::domain::similarity_clusterer::jaccard;

fn debug(stage: &str, message: impl Into<String>) -> DebugEntryDto {
    DebugEntryDto { stage: stage.to_string(), message: message.into(), fields: Default::default() }
}

fn fifo_result(orders: &[Order], reason: &str) -> MrsOutput {
    let release_list: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let priorities = release_list
        .iter()
        .map(|id| PriorityDto { order_id: id.clone(), priority: 1.0, due_date: None, expected_completion: 0.0 })
        .collect();
    MrsOutput {
        priorities,
        routes: Vec::new(),
        batches: Vec::new(),
        release_list: release_list.clone(),
        input_order_list: release_list,
        debug: vec![debug("MRS", reason)],
        ..Default::default()
    }
}

/// Applies the "tight due date" policy switch: when enabled, the
/// caller-provided due date is replaced with the earlier of itself and
/// `ready + 0.85 * totalProcessTime`, deliberately forcing tardiness signal
/// into the GA's fitness function.
fn apply_tight_due_dates(orders: &mut [Order], enabled: bool) {
    if !enabled {
        return;
    }
    for order in orders.iter_mut() {
        let tight = order.ready_at + 0.85 * order.process_time_total;
        order.due_date = order.due_date.min(tight);
    }
}

fn op_signature(order: &Order) -> std::collections::HashSet<String> {
    order.dem_ops.iter().chain(order.mon_ops.iter()).map(|op| op.match_key().to_string()).collect()
}

/// Splits `sequence` into consecutive chunks of `q_max`, dropping any
/// trailing chunk smaller than `q_min`.
fn build_batches(sequence: &[usize], orders: &[Order], plan_starts: &HashMap<String, f64>, priority_map: &HashMap<String, f64>, q_min: usize, q_max: usize) -> Vec<BatchDto> {
    let q_min = q_min.max(1);
    let q_max = q_max.max(q_min);
    let signatures: HashMap<&str, std::collections::HashSet<String>> = orders.iter().map(|o| (o.id.as_str(), op_signature(o))).collect();

    let mut batches = Vec::new();
    for chunk in sequence.chunks(q_max) {
        if chunk.len() < q_min {
            continue;
        }
        let order_ids: Vec<String> = chunk.iter().map(|&idx| orders[idx].id.clone()).collect();
        let release_at = plan_starts.get(&order_ids[0]).copied().unwrap_or(0.0);
        let mean_priority = order_ids.iter().map(|id| priority_map.get(id).copied().unwrap_or(0.0)).sum::<f64>() / order_ids.len() as f64;

        let sets: Vec<&std::collections::HashSet<String>> = order_ids.iter().filter_map(|id| signatures.get(id.as_str())).collect();
        let n = sets.len();
        let matrix: Vec<Vec<f64>> = (0..n).map(|i| (0..n).map(|j| if i == j { 1.0 } else { jaccard(sets[i], sets[j]) }).collect()).collect();
        let pairwise: Vec<f64> = (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j))).map(|(i, j)| matrix[i][j]).collect();
        let mean_similarity = if pairwise.is_empty() { 1.0 } else { pairwise.iter().sum::<f64>() / pairwise.len() as f64 };

        batches.push(BatchDto {
            id: format!("pip-ga-batch-v2-{}", batches.len() + 1),
            order_ids,
            release_at,
            mean_priority,
            mean_similarity,
            jaccard_matrix: matrix,
        });
    }
    batches
}

/// Runs the MRS stage. Never propagates an error: a fatal per-order failure
/// is folded into an `MRS_ERROR` debug entry on an otherwise-empty output.
pub fn run_mrs(input: &MrsInput) -> MrsOutput {
    if input.orders.is_empty() {
        return MrsOutput { debug: vec![debug("MRS", "MRS_EMPTY: no orders to plan")], ..Default::default() };
    }

    let mut orders = Vec::with_capacity(input.orders.len());
    for dto in &input.orders {
        match build_order(dto, DueDatePolicy::Strict) {
            Ok(order) => orders.push(order),
            Err(e) => return MrsOutput { debug: vec![debug("MRS", format!("MRS_ERROR: {e}"))], ..Default::default() },
        }
    }

    if orders.len() <= 1 {
        return fifo_result(&orders, "MRS_FALLBACK: too few orders for GA, FIFO plan used");
    }

    let cfg = &input.config;
    apply_tight_due_dates(&mut orders, cfg.tight_due_date);

    let capacity = match cfg.factory_capacity.clone() {
        Some(fc) if fc.demontage_stationen > 0 && fc.montage_stationen > 0 => fc,
        _ => {
            return MrsOutput {
                debug: vec![debug("MRS", "MRS_ERROR: factoryCapacity must provide demontageStationen and montageStationen (no defaults allowed)")],
                ..Default::default()
            };
        }
    };
    let cap_cfg = CapacityConfig {
        nd: capacity.demontage_stationen,
        nm: capacity.montage_stationen,
        dem_flex_share: cfg.dem_flex_share_pct / 100.0,
        mon_flex_share: cfg.mon_flex_share_pct / 100.0,
        setup_minutes: cfg.setup_minutes,
    };

    let strategy = EvaluationStrategy::Capacitated;
    let ga_result = genetic_optimizer::run_ga(&orders, &cfg.ga, strategy, cap_cfg, input.now, cfg.variance_weight, cfg.setup_weight);
    let best: Plan = match ga_result {
        Ok(plan) => plan,
        Err(e) => return MrsOutput { debug: vec![debug("MRS", format!("MRS_ERROR: {e}"))], ..Default::default() },
    };

    let input_order_list: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();
    let release_list: Vec<String> = best.sequence.iter().map(|&idx| orders[idx].id.clone()).collect();

    let mut plan_start: HashMap<String, f64> = HashMap::new();
    let mut plan_end: HashMap<String, f64> = HashMap::new();
    if let Some(timeline) = &best.timeline {
        for op in timeline {
            let entry_start = plan_start.entry(op.order_id.clone()).or_insert(op.start);
            if op.start < *entry_start {
                *entry_start = op.start;
            }
            let entry_end = plan_end.entry(op.order_id.clone()).or_insert(op.end);
            if op.end > *entry_end {
                *entry_end = op.end;
            }
        }
    }

    let mut priorities = Vec::with_capacity(orders.len());
    let mut priority_map = HashMap::new();
    for &order_idx in &best.sequence {
        let order = &orders[order_idx];
        let end = plan_end.get(&order.id).copied().unwrap_or(order.ready_at);
        let tardiness = (end - order.due_date).max(0.0);
        let priority = if tardiness > 0.0 { 1.0 + tardiness } else { 1.0 / (1.0 + (order.due_date - end).max(0.0)) };
        priority_map.insert(order.id.clone(), priority);
        priorities.push(PriorityDto { order_id: order.id.clone(), priority, due_date: Some(order.due_date), expected_completion: end });
    }
    priorities.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(std::cmp::Ordering::Equal));

    let routes: Vec<RouteDto> = orders
        .iter()
        .map(|order| {
            let expected_start = plan_start.get(&order.id).copied().unwrap_or(order.ready_at);
            let expected_end = plan_end.get(&order.id).copied().unwrap_or(expected_start + order.process_time_total);
            let operations: Vec<String> = order.dem_ops.iter().chain(order.mon_ops.iter()).map(|op| op.id.clone()).collect();
            RouteDto { order_id: order.id.clone(), route_id: format!("ga-route-{}", order.id), operations, expected_start, expected_end }
        })
        .collect();

    let batches = build_batches(&best.sequence, &orders, &plan_start, &priority_map, cfg.q_min, cfg.q_max);

    let eta_list: Vec<EtaEntryDto> = best
        .sequence
        .iter()
        .map(|&idx| {
            let order = &orders[idx];
            let eta = plan_end.get(&order.id).copied().unwrap_or(order.ready_at + order.process_time_total);
            EtaEntryDto { order_id: order.id.clone(), eta, lower: eta * 0.9, upper: eta * 1.1, confidence: 0.75 }
        })
        .collect();

    let chosen_variants: BTreeMap<String, usize> = best.variant_choices.clone();

    let hold_candidates: Vec<HoldCandidate> = best
        .sequence
        .iter()
        .map(|&idx| {
            let order = &orders[idx];
            let completion = plan_end.get(&order.id).copied().unwrap_or(order.ready_at + order.process_time_total);
            HoldCandidate { order_id: order.id.clone(), due_date: order.due_date, estimated_completion: completion, processing_time: order.process_time_total }
        })
        .collect();
    let total_slots = cap_cfg.nd + cap_cfg.nm;
    let hold_decisions: Vec<HoldDecisionDto> = hold_decider::decide_holds(&hold_candidates, total_slots, cfg.horizon_minutes, 0.8, input.now)
        .into_iter()
        .map(|h| HoldDecisionDto { order_id: h.order_id, hold_until_sim_minute: h.hold_until_sim_minute, hold_reason: h.reason })
        .collect();

    let mut debug_entries = vec![debug("MRS", format!("GA best fitness plan: makespan={:.1} tardiness={:.1}", best.metrics.makespan, best.metrics.tardiness))];
    if best.metrics.tardiness == 0.0 && best.metrics.tardiness_variance == 0.0 && best.metrics.makespan == 0.0 {
        debug_entries.push(debug("MRS", "MRS_FITNESS_CONSTANT: best plan shows zero tardiness, variance, and makespan"));
    }

    MrsOutput {
        priorities,
        routes,
        batches,
        release_list,
        input_order_list,
        eta_list,
        expected_tardiness: best.metrics.tardiness,
        variance_tardiness: best.metrics.tardiness_variance,
        chosen_variants,
        hold_decisions,
        debug: debug_entries,
    }
}
