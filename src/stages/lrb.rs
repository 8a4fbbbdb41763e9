//! Long-range batching: clusters orders by process-sequence similarity,
//! gates each cluster's release window against forecast capacity pressure,
//! and defers weak clusters to the next planning cycle.

use std::collections::HashMap;

use crate::api::common::{DebugEntryDto, EtaEntryDto, HoldDecisionDto};
use crate::api::lrb::{BatchDto, CtpEntryDto, LrbInput, LrbOutput, UtilizationBucketDto};
use crate::domain::defer_scorer::{self, DeferScoreInputs};
use crate::domain::hold_decider::{self, HoldCandidate};
use crate::domain::input_model::{build_order, DueDatePolicy};
use crate::domain::order::Order;
use crate::domain::similarity_clusterer::{self, avg_pairwise_jaccard, jaccard, jaccard_matrix, ClusterInput};
use crate::domain::window_gate::{self, WindowProbe};

fn debug(stage: &str, message: impl Into<String>) -> DebugEntryDto {
    DebugEntryDto { stage: stage.to_string(), message: message.into(), fields: Default::default() }
}

/// Runs the LRB stage over an in-memory request, never propagating an
/// error to the caller: any fatal per-order failure is folded into a
/// `LRB_ERROR` debug entry on an otherwise-empty output.
pub fn run_lrb(input: &LrbInput) -> LrbOutput {
    let mut out = LrbOutput::default();

    if input.orders.is_empty() {
        out.debug.push(debug("LRB", "LRB_EMPTY: no orders to plan"));
        return out;
    }

    let mut orders = Vec::with_capacity(input.orders.len());
    for dto in &input.orders {
        match build_order(dto, DueDatePolicy::SoftBackfill { now: input.now }) {
            Ok(order) => orders.push(order),
            Err(e) => {
                out.debug.push(debug("LRB", format!("LRB_ERROR: {e}")));
                return LrbOutput { debug: out.debug, ..Default::default() };
            }
        }
    }

    let cfg = &input.config;
    let cluster_inputs: Vec<ClusterInput> = orders.iter().map(|o| ClusterInput { order_id: o.id.clone(), due_date: o.due_date, seq_set: o.seq_set.clone() }).collect();
    let clusters = similarity_clusterer::cluster_by_jaccard(&cluster_inputs, cfg.jaccard_threshold, cfg.setup.q_max);

    let order_by_id: HashMap<&str, &Order> = orders.iter().map(|o| (o.id.as_str(), o)).collect();
    let order_work: HashMap<String, f64> = orders.iter().map(|o| (o.id.clone(), o.process_time_total)).collect();

    let interval = cfg.interval_minutes;
    let target_util_eff = defer_scorer::dynamic_target_util(cfg, &input.forecast);

    let mut existing_probes: Vec<WindowProbe> = Vec::new();
    let mut batches = Vec::new();
    let mut deferred_orders = Vec::new();
    let mut hold_decisions = Vec::new();

    for cluster in &clusters {
        let cluster_orders: Vec<&Order> = cluster.iter().map(|&idx| &orders[idx]).collect();
        let sets: Vec<&std::collections::HashSet<String>> = cluster_orders.iter().map(|o| &o.seq_set).collect();
        let avg_j = avg_pairwise_jaccard(&sets);
        let seed_seq = &cluster_orders[0].seq_set;

        let exp_similar_next = defer_scorer::expected_similar_next(seed_seq, &input.forecast, cfg.jaccard_threshold);
        let eff_q_min = defer_scorer::effective_q_min(cfg.setup.q_min, exp_similar_next, cfg.setup.q_max);
        let is_weak = cluster_orders.len() < eff_q_min || avg_j < cfg.jaccard_threshold;

        let due_process: Vec<(f64, f64)> = cluster_orders.iter().map(|o| (o.due_date, o.process_time_total)).collect();
        let must_release = defer_scorer::must_release_batch(&due_process, input.now, cfg.defer.service_window_days);
        let under_defer_budget = cluster_orders.iter().all(|o| o.deferred_count < cfg.defer.k_max_defers);

        if is_weak && !must_release && cfg.defer.enable && under_defer_budget {
            let util_with_probe = window_gate::next_bucket_util(&existing_probes.iter().collect::<Vec<_>>(), &order_work, interval, cfg.machines, cfg.shift_minutes_per_day, input.now);
            let inputs = DeferScoreInputs { batch_seq_sets: &sets, batch_due_process: &due_process, seed_seq, util_with_probe };
            let (score, _) = defer_scorer::defer_score(inputs, &cfg.defer, &input.forecast, input.now, cfg.jaccard_threshold, target_util_eff);
            if score > 0.0 {
                let order_ids: Vec<String> = cluster_orders.iter().map(|o| o.id.clone()).collect();
                deferred_orders.extend(order_ids.clone());
                hold_decisions.extend(hold_decider::deferred_cluster_holds(&order_ids, input.now + interval).into_iter().map(to_hold_dto));
                continue;
            }
        }

        let nb_start = ((input.now / interval).floor() + 1.0) * interval;
        let total_work: f64 = cluster_orders.iter().map(|o| o.process_time_total).sum();
        let span_estimate = (total_work / (cfg.machines.max(1) as f64)).max(1.0);
        let mut probe = WindowProbe {
            order_ids: cluster_orders.iter().map(|o| o.id.clone()).collect(),
            start_earliest: nb_start,
            start_latest: nb_start + cfg.windows.alpha * interval,
            end_earliest: nb_start + span_estimate,
            end_latest: nb_start + span_estimate + cfg.windows.beta * interval,
        };
        window_gate::push_until_gated(&mut probe, &existing_probes.iter().collect::<Vec<_>>(), &order_work, interval, cfg.machines, cfg.shift_minutes_per_day, input.now, target_util_eff);

        let matrix = jaccard_matrix(&sets);
        batches.push(BatchDto {
            id: format!("batch-{}", batches.len() + 1),
            order_ids: probe.order_ids.clone(),
            release_at: probe.start_earliest,
            window_start_earliest: probe.start_earliest,
            window_start_latest: probe.start_latest,
            window_end_earliest: probe.end_earliest,
            window_end_latest: probe.end_latest,
            avg_jaccard: avg_j,
            jaccard_matrix: matrix,
        });
        existing_probes.push(probe);
    }

    let mut eta_list = Vec::new();
    for batch in &batches {
        for order_id in &batch.order_ids {
            if let Some(order) = order_by_id.get(order_id.as_str()) {
                let eta = batch.release_at + order.process_time_total;
                eta_list.push(EtaEntryDto { order_id: order_id.clone(), eta, lower: batch.release_at + order.process_time_dem(), upper: eta + cfg.setup.min_batch as f64 * 5.0, confidence: 0.8 });
            }
        }
    }

    let num_buckets = 6usize;
    let mut utilization_forecast = Vec::with_capacity(num_buckets);
    for k in 0..num_buckets {
        let probe_time = input.now + (k as f64) * interval;
        let util = window_gate::next_bucket_util(&existing_probes.iter().collect::<Vec<_>>(), &order_work, interval, cfg.machines, cfg.shift_minutes_per_day, probe_time);
        let bucket_start = ((probe_time / interval).floor() + 1.0) * interval;
        utilization_forecast.push(UtilizationBucketDto { bucket_start, bucket_end: bucket_start + interval, utilization: util });
    }

    let mut ctp_preview = Vec::new();
    for dto in &input.new_orders {
        if let Ok(new_order) = build_order(dto, DueDatePolicy::SoftBackfill { now: input.now }) {
            let mut best: Option<(&BatchDto, f64)> = None;
            for batch in &batches {
                let batch_set: std::collections::HashSet<String> = batch.order_ids.iter().filter_map(|id| order_by_id.get(id.as_str())).flat_map(|o| o.seq_set.iter().cloned()).collect();
                let sim = jaccard(&new_order.seq_set, &batch_set);
                if best.as_ref().map(|(_, s)| sim > *s).unwrap_or(true) {
                    best = Some((batch, sim));
                }
            }
            match best {
                Some((batch, sim)) if sim >= cfg.jaccard_threshold => {
                    ctp_preview.push(CtpEntryDto {
                        order_id: new_order.id.clone(),
                        promised_eta: batch.release_at + new_order.process_time_total,
                        inserted_batch_id: Some(batch.id.clone()),
                        confidence: (0.7 + 0.3 * sim).min(1.0),
                    });
                }
                _ => {
                    ctp_preview.push(CtpEntryDto {
                        order_id: new_order.id.clone(),
                        promised_eta: input.now + cfg.defer.service_window_days * 24.0 * 60.0,
                        inserted_batch_id: None,
                        confidence: 0.4,
                    });
                }
            }
        }
    }

    let hold_candidates: Vec<HoldCandidate> = batches
        .iter()
        .flat_map(|b| b.order_ids.iter().map(move |oid| (oid, b.release_at)))
        .filter_map(|(oid, release_at)| order_by_id.get(oid.as_str()).map(|o| HoldCandidate { order_id: o.id.clone(), due_date: o.due_date, estimated_completion: release_at + o.process_time_total, processing_time: o.process_time_total }))
        .collect();
    let capacity_holds = hold_decider::decide_holds(&hold_candidates, cfg.machines, interval, 0.8, input.now);
    hold_decisions.extend(capacity_holds.into_iter().map(to_hold_dto));

    out.debug.push(debug("LRB", format!("clustered {} orders into {} batches ({} deferred)", orders.len(), batches.len(), deferred_orders.len())));

    LrbOutput {
        batches,
        eta_list,
        utilization_forecast,
        ctp_preview,
        deferred_orders,
        hold_decisions,
        debug: out.debug,
    }
}

fn to_hold_dto(h: crate::domain::plan::HoldDecision) -> HoldDecisionDto {
    HoldDecisionDto { order_id: h.order_id, hold_until_sim_minute: h.hold_until_sim_minute, hold_reason: h.reason }
}
