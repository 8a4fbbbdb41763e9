//! DeferScore: decide whether a weak batch should be held for the next
//! cycle, weighing expected similarity gain against urgency and capacity
//! pressure.

use std::collections::HashSet;

use crate::config::{DeferConfig, Forecast, LrbConfig};

use super::order::normalize_step;
use super::similarity_clusterer::{avg_pairwise_jaccard, jaccard};

/// `E[N_similar]` = sum over forecast variants of `lambda_v` where the
/// variant's prototype steps meet the Jaccard threshold against the seed.
/// Implemented as the documented hard (0/1) membership test, not a
/// probability model.
pub fn expected_similar_next(seed_seq: &HashSet<String>, forecast: &Forecast, tau: f64) -> f64 {
    let mut exp = 0.0;
    for variant in &forecast.variants {
        let proto: HashSet<String> = variant.proto_steps.iter().map(|s| normalize_step(s)).collect();
        let prob_fit = if jaccard(seed_seq, &proto) >= tau { 1.0 } else { 0.0 };
        exp += variant.lambda_per_t * prob_fit;
    }
    exp.max(0.0)
}

/// `targetUtil_eff = max(0.3, targetUtil - k * forecast_load_ratio)`.
pub fn dynamic_target_util(cfg: &LrbConfig, forecast: &Forecast) -> f64 {
    let base = cfg.target_util;
    let k = cfg.defer.util_adjust_k;
    let t = cfg.interval_minutes;
    let machines = cfg.machines.max(1) as f64;
    let shift = cfg.shift_minutes_per_day;
    let cap_t = machines * t.min(shift);
    if cap_t <= 0.0 {
        return base;
    }
    let lam_sum_t: f64 = forecast.variants.iter().map(|v| v.lambda_per_t * t).sum();
    let load_ratio = (lam_sum_t / cap_t).min(1.0);
    (base - k * load_ratio).max(0.3)
}

/// `bufferPct_eff = bufferPct_base * (1 + cv_arrival)`.
pub fn adjusted_buffer_pct(defer: &DeferConfig, forecast: &Forecast) -> f64 {
    (defer.buffer_pct * (1.0 + forecast.cv_arrival.max(0.0))).max(0.0)
}

/// Temporarily raises `qMin` by one when many similar arrivals are expected
/// in the next interval (threshold 1.5, as in the original).
pub fn effective_q_min(q_min: usize, exp_similar_next: f64, q_max: usize) -> usize {
    let bump = if exp_similar_next >= 1.5 { 1 } else { 0 };
    (q_min + bump).clamp(1, q_max.max(1))
}

pub fn expected_delta_j(avg_j: f64, size: usize, exp_similar_next: f64) -> f64 {
    if size == 0 || exp_similar_next <= 0.0 {
        return 0.0;
    }
    let new_avg = (size as f64 * avg_j + exp_similar_next) / (size as f64 + exp_similar_next);
    (new_avg - avg_j).max(0.0)
}

/// Mean over orders of `min(1, max(0, 1 - slack/(gamma*p)))`.
pub fn urgency_u(orders: &[(f64, f64)], now: f64, gamma: f64) -> f64 {
    if orders.is_empty() {
        return 0.0;
    }
    let vals: Vec<f64> = orders
        .iter()
        .map(|&(due_date, p)| {
            let slack = (due_date - now - p).max(0.0);
            let denom = (gamma * p).max(1e-6);
            (1.0 - slack / denom).max(0.0).min(1.0)
        })
        .collect();
    vals.iter().sum::<f64>() / vals.len() as f64
}

pub fn capacity_pressure_c(util_with_probe: f64, target_util: f64) -> f64 {
    (util_with_probe - target_util).max(0.0)
}

/// `must-release`: any order's slack <= 0, or due within the service window.
pub fn must_release_batch(orders: &[(f64, f64)], now: f64, service_window_days: f64) -> bool {
    let service_deadline = now + service_window_days * 24.0 * 60.0;
    orders.iter().any(|&(due_date, p)| {
        let slack = due_date - now - p;
        slack <= 0.0 || due_date <= service_deadline
    })
}

pub struct DeferScoreInputs<'a> {
    pub batch_seq_sets: &'a [&'a HashSet<String>],
    pub batch_due_process: &'a [(f64, f64)],
    pub seed_seq: &'a HashSet<String>,
    pub util_with_probe: f64,
}

/// `lam_sim * dJ - lam_urg * U - lam_cap * C`. Returns `(score,
/// exp_similar_next)`.
pub fn defer_score(inputs: DeferScoreInputs, defer: &DeferConfig, forecast: &Forecast, now: f64, tau: f64, target_util: f64) -> (f64, f64) {
    let exp_sim = expected_similar_next(inputs.seed_seq, forecast, tau);
    let avg_j = avg_pairwise_jaccard(inputs.batch_seq_sets);
    let d_j = expected_delta_j(avg_j, inputs.batch_seq_sets.len(), exp_sim);
    let u = urgency_u(inputs.batch_due_process, now, defer.gamma);
    let c = capacity_pressure_c(inputs.util_with_probe, target_util);
    let score = defer.lam_sim * d_j - defer.lam_urg * u - defer.lam_cap * c;
    (score, exp_sim)
}
