//! Short-range fine scheduling: multi-objective harmony search over the
//! joint order+variant genome, producing a Pareto front and a weighted-sum
//! selected plan. `etaList`/`releaseList`/`holdDecisions` follow the same
//! construction as the mid-range stage.

use std::collections::HashMap;

use crate::api::common::{DebugEntryDto, EtaEntryDto, HoldDecisionDto};
use crate::api::srfs::{ParetoEntryDto, ScheduledOpDto, SrfsInput, SrfsOutput};
use crate::domain::capacity_simulator::CapacityConfig;
use crate::domain::harmony_searcher::{self, SrfsResult};
use crate::domain::hold_decider::{self, HoldCandidate};
use crate::domain::input_model::{build_order, DueDatePolicy};
use crate::domain::order::Order;
use crate::domain::plan::Plan;

fn debug(stage: &str, message: impl Into<String>) -> DebugEntryDto {
    DebugEntryDto { stage: stage.to_string(), message: message.into(), fields: Default::default() }
}

fn plan_to_pareto_entry(plan: &Plan, orders: &[Order]) -> ParetoEntryDto {
    let sequence: Vec<String> = plan.sequence.iter().map(|&idx| orders[idx].id.clone()).collect();
    let operations: Vec<ScheduledOpDto> = plan
        .timeline
        .as_ref()
        .map(|t| t.iter().map(|op| ScheduledOpDto { order_id: op.order_id.clone(), op_id: op.op_id.clone(), start: op.start, end: op.end }).collect())
        .unwrap_or_default();
    ParetoEntryDto {
        id: plan.id.clone(),
        sequence,
        variant_choices: plan.variant_choices.clone(),
        operations,
        objective_values: [plan.metrics.makespan, plan.metrics.tardiness, plan.metrics.idle_time],
    }
}

/// Runs the SRFS stage. Never propagates an error: a fatal per-order
/// failure is folded into an `SRFS_ERROR` debug entry on an otherwise-empty
/// output.
pub fn run_srfs(input: &SrfsInput) -> SrfsOutput {
    if input.orders.is_empty() {
        return SrfsOutput { debug: vec![debug("SRFS", "SRFS_EMPTY: no orders for fine scheduling")], ..Default::default() };
    }

    let mut orders = Vec::with_capacity(input.orders.len());
    for dto in &input.orders {
        match build_order(dto, DueDatePolicy::Strict) {
            Ok(order) => orders.push(order),
            Err(e) => return SrfsOutput { debug: vec![debug("SRFS", format!("SRFS_ERROR: {e}"))], ..Default::default() },
        }
    }

    let cfg = &input.config;
    let capacity = match cfg.factory_capacity.clone() {
        Some(fc) if fc.demontage_stationen > 0 && fc.montage_stationen > 0 => fc,
        _ => {
            return SrfsOutput {
                debug: vec![debug("SRFS", "SRFS_ERROR: factoryCapacity must provide demontageStationen and montageStationen (no defaults allowed)")],
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

    let result = harmony_searcher::run_harmony_search(&orders, cfg, cap_cfg, input.start_time);
    let SrfsResult { pareto_set, selected, released_ops } = match result {
        Ok(r) => r,
        Err(e) => return SrfsOutput { debug: vec![debug("SRFS", format!("SRFS_ERROR: {e}"))], ..Default::default() },
    };

    let input_order_list: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();

    if pareto_set.is_empty() {
        return SrfsOutput {
            input_order_list,
            debug: vec![debug("SRFS", "SRFS_DEGENERATE: harmony search produced no non-dominated plan")],
            ..Default::default()
        };
    }

    let pareto_entries: Vec<ParetoEntryDto> = pareto_set.iter().map(|p| plan_to_pareto_entry(p, &orders)).collect();

    let reference = selected.as_ref().unwrap_or(&pareto_set[0]);
    let release_list: Vec<String> = reference.sequence.iter().map(|&idx| orders[idx].id.clone()).collect();

    let mut plan_end: HashMap<String, f64> = HashMap::new();
    if let Some(timeline) = &reference.timeline {
        for op in timeline {
            let entry = plan_end.entry(op.order_id.clone()).or_insert(op.end);
            if op.end > *entry {
                *entry = op.end;
            }
        }
    }

    let eta_list: Vec<EtaEntryDto> = reference
        .sequence
        .iter()
        .map(|&idx| {
            let order = &orders[idx];
            let eta = plan_end.get(&order.id).copied().unwrap_or(order.ready_at + order.process_time_total);
            EtaEntryDto { order_id: order.id.clone(), eta, lower: eta * 0.95, upper: eta * 1.05, confidence: 0.85 }
        })
        .collect();

    let hold_candidates: Vec<HoldCandidate> = reference
        .sequence
        .iter()
        .map(|&idx| {
            let order = &orders[idx];
            let completion = plan_end.get(&order.id).copied().unwrap_or(order.ready_at + order.process_time_total);
            HoldCandidate { order_id: order.id.clone(), due_date: order.due_date, estimated_completion: completion, processing_time: order.process_time_total }
        })
        .collect();
    let total_slots = cap_cfg.nd + cap_cfg.nm;
    let cycle_minutes = reference.metrics.makespan.max(1.0);
    let hold_decisions: Vec<HoldDecisionDto> = hold_decider::decide_holds(&hold_candidates, total_slots, cycle_minutes, 0.8, input.start_time)
        .into_iter()
        .map(|h| HoldDecisionDto { order_id: h.order_id, hold_until_sim_minute: h.hold_until_sim_minute, hold_reason: h.reason })
        .collect();

    let mut debug_entries = vec![debug("SRFS", format!("harmony search produced {} non-dominated plans", pareto_entries.len()))];
    let makespans_equal = pareto_set.windows(2).all(|w| (w[0].metrics.makespan - w[1].metrics.makespan).abs() < 1e-9 && (w[0].metrics.tardiness - w[1].metrics.tardiness).abs() < 1e-9);
    if makespans_equal && pareto_set.len() > 1 {
        debug_entries.push(debug("SRFS", "SRFS_FITNESS_CONSTANT: every retained plan shares identical objective values"));
    }

    SrfsOutput {
        pareto_set: pareto_entries,
        selected_plan_id: selected.as_ref().map(|p| p.id.clone()),
        selected_variant_choices: selected.as_ref().map(|p| p.variant_choices.clone()).unwrap_or_default(),
        released_ops,
        input_order_list,
        release_list,
        eta_list,
        hold_decisions,
        debug: debug_entries,
    }
}
