//! The deterministic discrete-event simulator shared by every fitness
//! evaluation in MRS and SRFS, and by the LRB utilization gate indirectly
//! through `Order::process_time_total`.
//!
//! Two resource pools (disassembly, reassembly), each split into a
//! fixed-assignment share (pre-assigned once per call by mean step
//! duration, longest first) and a flex share that pays `setup_minutes` on
//! assembly-group switches. Every order's operations are processed strictly
//! sequentially — a job-internal precedence constraint independent of which
//! slots end up serving them.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::Result;

use super::machine_pool::MachinePool;
use super::order::{Operation, OperationPhase, Order};
use super::plan::{ScheduledOp, SimMetrics};
use super::sequence_parser::build_ops_from_variant;

#[derive(Debug, Clone, Copy)]
pub struct CapacityConfig {
    pub nd: usize,
    pub nm: usize,
    pub dem_flex_share: f64,
    pub mon_flex_share: f64,
    pub setup_minutes: f64,
}

/// Builds the concrete operation list for every order under its chosen
/// variant (default variant 0 if unspecified or out of range).
fn resolve_order_ops(orders: &[Order], variant_choices: &BTreeMap<String, usize>) -> Result<HashMap<String, Vec<Operation>>> {
    let mut out = HashMap::new();
    for order in orders {
        let ops = if order.variants.is_empty() {
            let mut all = order.dem_ops.clone();
            all.extend(order.mon_ops.clone());
            all
        } else {
            let idx = variant_choices.get(&order.id).copied().unwrap_or(0).min(order.variants.len() - 1);
            build_ops_from_variant(&order.id, &order.variants[idx], &order.dem_ops, &order.mon_ops)?
        };
        out.insert(order.id.clone(), ops);
    }
    Ok(out)
}

/// Mean duration per assembly-group step, split by phase, across every
/// order's resolved operation list — used for the once-per-call fixed-slot
/// pre-assignment.
fn step_means(ops_by_order: &HashMap<String, Vec<Operation>>, phase: OperationPhase) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for ops in ops_by_order.values() {
        for op in ops {
            if op.phase != phase {
                continue;
            }
            let key = op.match_key().to_string();
            let entry = sums.entry(key).or_insert((0.0, 0));
            entry.0 += op.expected_duration;
            entry.1 += 1;
        }
    }
    sums.into_iter().map(|(k, (sum, n))| (k, sum / n as f64)).collect()
}

/// Runs one deterministic simulation of `permutation` (indices into
/// `orders`) under `variant_choices` (by order id), returning aggregate
/// metrics and, optionally, the full operation timeline.
pub fn simulate(orders: &[Order], permutation: &[usize], variant_choices: &BTreeMap<String, usize>, start_time: f64, cfg: CapacityConfig, with_timeline: bool) -> Result<(SimMetrics, Option<Vec<ScheduledOp>>)> {
    if orders.is_empty() || permutation.is_empty() {
        return Ok((SimMetrics::default(), if with_timeline { Some(Vec::new()) } else { None }));
    }

    let ops_by_order = resolve_order_ops(orders, variant_choices)?;

    let mut dem_pool = MachinePool::new(cfg.nd, cfg.dem_flex_share, start_time);
    let mut mon_pool = MachinePool::new(cfg.nm, cfg.mon_flex_share, start_time);
    dem_pool.preassign_fixed(step_means(&ops_by_order, OperationPhase::Disassembly));
    mon_pool.preassign_fixed(step_means(&ops_by_order, OperationPhase::Reassembly));

    let mut timeline = Vec::new();
    let mut tardiness_sum = 0.0;
    let mut tardiness_vals: Vec<f64> = Vec::with_capacity(permutation.len());
    let mut lateness_sum = 0.0;
    let mut setup_time = 0.0;
    let mut global_end: f64 = start_time;
    let mut completed = 0usize;

    let orders_by_idx: HashMap<usize, &Order> = permutation.iter().map(|&i| (i, &orders[i])).collect();

    for &order_idx in permutation {
        let order = match orders_by_idx.get(&order_idx) {
            Some(o) => *o,
            None => continue,
        };
        let ops = ops_by_order.get(&order.id).cloned().unwrap_or_default();
        let mut order_clock = start_time.max(order.ready_at);
        let mut last_end = order_clock;

        for op in &ops {
            let pool = match op.phase {
                OperationPhase::Disassembly => &mut dem_pool,
                OperationPhase::Reassembly => &mut mon_pool,
            };
            let step = Some(op.match_key());
            let (slot_idx, setup_applied) = pool.select_slot(step);
            let slot_ready = pool.slots[slot_idx].available_at;
            let mut start = order_clock.max(slot_ready);
            if setup_applied {
                start += cfg.setup_minutes;
                setup_time += cfg.setup_minutes;
            }
            let end = start + op.expected_duration;
            pool.commit(slot_idx, start, end, step);
            order_clock = end;
            last_end = end;
            global_end = global_end.max(end);

            if with_timeline {
                timeline.push(ScheduledOp {
                    order_id: order.id.clone(),
                    op_id: op.id.clone(),
                    phase: op.phase,
                    slot_index: slot_idx,
                    step: op.step.clone(),
                    start,
                    end,
                    setup_applied,
                });
            }
        }

        let completion = if ops.is_empty() { order.ready_at } else { last_end };
        let tardiness = (completion - order.due_date).max(0.0);
        let lateness = completion - order.due_date;
        tardiness_sum += tardiness;
        tardiness_vals.push(tardiness);
        lateness_sum += lateness;
        completed += 1;
    }

    let makespan = (global_end - start_time).max(0.0);
    let total_slots = dem_pool.slots.len() + mon_pool.slots.len();
    let total_busy = dem_pool.total_busy() + mon_pool.total_busy();
    let idle_time = (makespan * total_slots as f64 - total_busy).max(0.0);
    let avg_utilization = if makespan > 0.0 && total_slots > 0 { (total_busy / (makespan * total_slots as f64)) * 100.0 } else { 0.0 };
    let slot_utilizations: Vec<f64> = dem_pool.slots.iter().chain(mon_pool.slots.iter()).map(|s| s.utilization_pct()).collect();

    let n = completed.max(1) as f64;
    let tardiness_variance = if tardiness_vals.len() > 1 {
        let mean = tardiness_vals.iter().sum::<f64>() / tardiness_vals.len() as f64;
        tardiness_vals.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / tardiness_vals.len() as f64
    } else {
        0.0
    };
    let metrics = SimMetrics {
        makespan,
        tardiness: tardiness_sum,
        avg_tardiness: tardiness_sum / n,
        tardiness_variance,
        lateness: lateness_sum,
        avg_lateness: lateness_sum / n,
        idle_time,
        setup_time,
        avg_utilization,
        slot_utilizations,
    };
    Ok((metrics, if with_timeline { Some(timeline) } else { None }))
}

/// Verifies the "fixed-slot assignment" invariant: if a fixed slot was
/// pre-assigned a step and some scheduled operation in the same pool
/// shares that step, at least one interval on that slot must use it.
pub fn fixed_slot_assignment_honored(timeline: &[ScheduledOp], pool_fixed_steps: &[(usize, String)], phase: OperationPhase) -> bool {
    let used_steps: HashSet<&str> = timeline.iter().filter(|op| op.phase == phase).filter_map(|op| op.step.as_deref()).collect();
    for (slot_idx, step) in pool_fixed_steps {
        if !used_steps.contains(step.as_str()) {
            continue;
        }
        let honored = timeline.iter().any(|op| op.phase == phase && op.slot_index == *slot_idx && op.step.as_deref() == Some(step.as_str()));
        if !honored {
            return false;
        }
    }
    true
}
