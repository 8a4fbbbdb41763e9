use std::collections::HashSet;

use crate::error::{Error, Result};

/// Which half of a remanufacturing job an operation belongs to.
///
/// Classified from the station id: anything whose lowercased name contains
/// `"dem"` or `"disassembly"` is disassembly, everything else is reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationPhase {
    Disassembly,
    Reassembly,
}

impl OperationPhase {
    pub fn classify(station_id: &str) -> Self {
        let lower = station_id.to_lowercase();
        if lower.contains("dem") || lower.contains("disassembly") || lower.contains("zerlegen") || lower.contains("abbau") {
            OperationPhase::Disassembly
        } else {
            OperationPhase::Reassembly
        }
    }
}

/// A single unit of work at a station.
///
/// `step` is the primary setup-family / assembly-group identifier used both
/// by `SequenceParser` to map sequence tokens to operations and by
/// `CapacitySimulator` to detect setup switches on flex slots.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: String,
    pub station_id: String,
    pub phase: OperationPhase,
    pub expected_duration: f64,
    pub step: Option<String>,
    pub label: Option<String>,
    pub setup_family: Option<String>,
    pub bg: Option<String>,
    /// Triangular fuzzy estimate (low, mode, high), guessed if not supplied.
    pub tfn: (f64, f64, f64),
}

impl Operation {
    pub fn new(
        order_id: &str,
        id: String,
        station_id: String,
        expected_duration: f64,
        step: Option<String>,
        label: Option<String>,
        setup_family: Option<String>,
        bg: Option<String>,
    ) -> Result<Self> {
        if expected_duration <= 0.0 {
            return Err(Error::InvalidDuration {
                order_id: order_id.to_string(),
                op_id: id,
                duration: expected_duration,
            });
        }
        let phase = OperationPhase::classify(&station_id);
        let tfn = guess_tfn(expected_duration, 0.25);
        Ok(Operation { id, station_id, phase, expected_duration, step, label, setup_family, bg, tfn })
    }

    /// The key used for setup-family matching: the step id if present,
    /// falling back to label, setup family, then bg, then the op id itself.
    pub fn match_key(&self) -> &str {
        self.step
            .as_deref()
            .or(self.label.as_deref())
            .or(self.setup_family.as_deref())
            .or(self.bg.as_deref())
            .unwrap_or(&self.id)
    }
}

/// `(low, mode, high)` triangular fuzzy number guessed from a point estimate.
pub fn guess_tfn(duration: f64, variation: f64) -> (f64, f64, f64) {
    let base = duration.max(1.0);
    let spread = (base * variation).max(1.0);
    let lower = (base - spread).max(0.5);
    let upper = base + spread;
    (lower, base, upper)
}

pub fn defuzzify_tfn(tfn: (f64, f64, f64)) -> f64 {
    (tfn.0 + tfn.1 + tfn.2) / 3.0
}

/// One alternative process-sequence through disassembly and reassembly,
/// as a raw token stream (`I`, step ids, `×`, step ids, `Q`).
#[derive(Debug, Clone)]
pub struct SequenceVariant {
    pub id: String,
    pub steps: Vec<String>,
}

/// Strips a leading `BG-`/`BGT-` prefix so the two families compare equal.
pub fn normalize_step(step: &str) -> String {
    let trimmed = step.trim();
    if let Some(rest) = trimmed.strip_prefix("BGT-") {
        rest.to_string()
    } else if let Some(rest) = trimmed.strip_prefix("BG-") {
        rest.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A remanufacturing order, normalized once at input and immutable for the
/// remainder of the planning call.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: String,
    pub ready_at: f64,
    pub due_date: f64,
    pub dem_ops: Vec<Operation>,
    pub mon_ops: Vec<Operation>,
    pub variants: Vec<SequenceVariant>,
    /// Union of normalized steps across all variants; used by the LRB
    /// similarity clusterer.
    pub seq_set: HashSet<String>,
    pub deferred_count: u32,
    pub process_time_total: f64,
}

impl Order {
    pub fn process_time_dem(&self) -> f64 {
        self.dem_ops.iter().map(|o| o.expected_duration).sum()
    }

    pub fn process_time_mon(&self) -> f64 {
        self.mon_ops.iter().map(|o| o.expected_duration).sum()
    }
}

/// Converts a raw value that may be minutes or milliseconds into minutes.
///
/// If the magnitude exceeds `1e10` it is assumed to be epoch milliseconds
/// and divided down; otherwise it is returned unchanged.
pub fn normalize_minutes(value: f64) -> f64 {
    if value.abs() > 1e10 { value / 60_000.0 } else { value }
}
