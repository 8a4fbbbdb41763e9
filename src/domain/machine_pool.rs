//! A pool of parallel machine slots, split into a fixed-assignment share and
//! a flex share that pays a setup cost on assembly-group switches.

#[derive(Debug, Clone)]
pub struct Slot {
    pub available_at: f64,
    pub last_step: Option<String>,
    pub busy_total: f64,
    pub min_start: Option<f64>,
    pub max_end: Option<f64>,
}

impl Slot {
    fn new(start_time: f64) -> Self {
        Slot { available_at: start_time, last_step: None, busy_total: 0.0, min_start: None, max_end: None }
    }

    fn record(&mut self, start: f64, end: f64) {
        self.busy_total += end - start;
        self.min_start = Some(self.min_start.map_or(start, |m| m.min(start)));
        self.max_end = Some(self.max_end.map_or(end, |m| m.max(end)));
    }

    /// Per-slot utilization as a percentage of its own busy span.
    /// A never-used slot is 0%; a slot with one job and zero span is 100%.
    pub fn utilization_pct(&self) -> f64 {
        match (self.min_start, self.max_end) {
            (Some(s), Some(e)) => {
                let span = e - s;
                if span <= 0.0 {
                    100.0
                } else {
                    (self.busy_total / span) * 100.0
                }
            }
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MachinePool {
    pub slots: Vec<Slot>,
    pub num_fixed: usize,
}

impl MachinePool {
    pub fn new(total: usize, flex_share: f64, start_time: f64) -> Self {
        let total = total.max(1);
        let flex_count = ((total as f64) * flex_share.max(0.0)).round() as usize;
        let flex_count = flex_count.min(total);
        let num_fixed = total - flex_count;
        MachinePool { slots: (0..total).map(|_| Slot::new(start_time)).collect(), num_fixed }
    }

    /// Pre-assigns the first `num_fixed` slots to the steps with the
    /// highest mean duration, longest first. Flex slots keep `last_step =
    /// None`. Recomputed once per `simulate()` call, per the documented
    /// (intentionally non-monotone) behavior.
    pub fn preassign_fixed(&mut self, mut step_means: Vec<(String, f64)>) {
        step_means.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
        for (i, (step, _)) in step_means.into_iter().enumerate() {
            if i >= self.num_fixed {
                break;
            }
            self.slots[i].last_step = Some(step);
        }
    }

    /// Selects a slot for an operation keyed by `step`, per the tie-break
    /// priority order: (1) a fixed slot pre-assigned to this step, (2) the
    /// earliest-available flex slot whose last step already matches, (3)
    /// the earliest-available flex slot at all (setup iff switching), (4)
    /// any slot at all (fallback).
    ///
    /// Returns `(slot_index, setup_applied)`.
    pub fn select_slot(&self, step: Option<&str>) -> (usize, bool) {
        if let Some(s) = step {
            for i in 0..self.num_fixed {
                if self.slots[i].last_step.as_deref() == Some(s) {
                    return (i, false);
                }
            }
            if let Some(idx) = (self.num_fixed..self.slots.len())
                .filter(|&i| self.slots[i].last_step.as_deref() == Some(s))
                .min_by(|&a, &b| self.slots[a].available_at.partial_cmp(&self.slots[b].available_at).unwrap())
            {
                return (idx, false);
            }
        }
        if let Some(idx) = (self.num_fixed..self.slots.len())
            .min_by(|&a, &b| self.slots[a].available_at.partial_cmp(&self.slots[b].available_at).unwrap())
        {
            let switching = match (&self.slots[idx].last_step, step) {
                (Some(last), Some(s)) => last != s,
                _ => false,
            };
            return (idx, switching);
        }
        let idx = (0..self.slots.len()).min_by(|&a, &b| self.slots[a].available_at.partial_cmp(&self.slots[b].available_at).unwrap()).unwrap_or(0);
        let is_flex = idx >= self.num_fixed;
        let switching = is_flex
            && match (&self.slots[idx].last_step, step) {
                (Some(last), Some(s)) => last != s,
                _ => false,
            };
        (idx, switching)
    }

    /// Commits a scheduled interval to `slot_idx`: advances availability,
    /// updates the flex last-step marker (fixed slots never change theirs),
    /// and accumulates utilization bookkeeping.
    pub fn commit(&mut self, slot_idx: usize, start: f64, end: f64, step: Option<&str>) {
        let is_flex = slot_idx >= self.num_fixed;
        let slot = &mut self.slots[slot_idx];
        slot.available_at = end;
        if is_flex {
            slot.last_step = step.map(|s| s.to_string());
        }
        slot.record(start, end);
    }

    pub fn total_busy(&self) -> f64 {
        self.slots.iter().map(|s| s.busy_total).sum()
    }
}
