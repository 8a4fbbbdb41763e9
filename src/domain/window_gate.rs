//! Computes a batch's release/end window and pushes it forward in time
//! until the projected next-bucket utilization clears the (forecast
//! adjusted) target.

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct WindowProbe {
    pub order_ids: Vec<String>,
    pub start_earliest: f64,
    pub start_latest: f64,
    pub end_earliest: f64,
    pub end_latest: f64,
}

impl WindowProbe {
    pub fn shift(&mut self, by: f64) {
        self.start_earliest += by;
        self.start_latest += by;
        self.end_earliest += by;
        self.end_latest += by;
    }
}

/// Projected workload utilization of the bucket immediately following
/// `now`, counting every batch (existing plus the probe) that overlaps it,
/// pro-rated by overlap fraction.
pub fn next_bucket_util(batches: &[&WindowProbe], order_work: &HashMap<String, f64>, interval: f64, machines: usize, shift_minutes_per_day: f64, now: f64) -> f64 {
    let machines = machines.max(1) as f64;
    let cap_bucket = machines * interval.min(shift_minutes_per_day);
    if cap_bucket <= 0.0 {
        return 0.0;
    }
    let nb_start = ((now / interval).floor() + 1.0) * interval;
    let nb_end = nb_start + interval;

    let mut wl_next = 0.0;
    for batch in batches {
        let s = batch.start_earliest;
        let e = batch.end_latest;
        if e <= s {
            continue;
        }
        let overlap = (e.min(nb_end) - s.max(nb_start)).max(0.0);
        if overlap <= 0.0 {
            continue;
        }
        let work: f64 = batch.order_ids.iter().filter_map(|oid| order_work.get(oid)).sum();
        if work <= 0.0 {
            continue;
        }
        wl_next += work * (overlap / (e - s));
    }
    (wl_next / cap_bucket).min(1.0)
}

/// Pushes `probe`'s window forward by `interval` repeatedly until the
/// resulting next-bucket utilization, computed with the probe included,
/// no longer exceeds `target_util_eff`.
pub fn push_until_gated(probe: &mut WindowProbe, existing: &[&WindowProbe], order_work: &HashMap<String, f64>, interval: f64, machines: usize, shift_minutes_per_day: f64, now: f64, target_util_eff: f64) {
    loop {
        let mut all: Vec<&WindowProbe> = existing.to_vec();
        all.push(probe);
        let util = next_bucket_util(&all, order_work, interval, machines, shift_minutes_per_day, now);
        if util <= target_util_eff {
            break;
        }
        probe.shift(interval);
    }
}
