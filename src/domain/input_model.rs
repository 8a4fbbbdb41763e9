//! Normalizes wire-level `OrderDto`s into the internal `Order` model.
//!
//! Multiple historical JSON shapes for process sequences are tolerated
//! (per-order sequences, a global fallback, legacy flat fields); a step set
//! is always derived from real data, never fabricated.

use std::collections::HashSet;

use serde_json::Value;

use crate::api::common::OrderDto;
use crate::error::{Error, Result};

use super::order::{normalize_minutes, normalize_step, Operation, Order, SequenceVariant};

const STOP_TOKENS: [&str; 3] = ["I", "×", "Q"];

fn is_stop_token(s: &str) -> bool {
    STOP_TOKENS.contains(&s)
}

/// Resolves `processSequences` (possibly JSON-string-encoded) into a `Value`.
fn resolve_process_sequences(raw: &Value) -> Option<Value> {
    match raw {
        Value::String(s) => serde_json::from_str::<Value>(s).ok(),
        Value::Object(_) => Some(raw.clone()),
        _ => None,
    }
}

fn block_sequences<'a>(root: &'a Value, key: &str) -> Vec<&'a Value> {
    root.get(key)
        .and_then(|b| b.get("sequences"))
        .and_then(|s| s.as_array())
        .map(|arr| arr.iter().collect())
        .unwrap_or_default()
}

fn seq_steps(seq: &Value) -> Vec<String> {
    seq.get("steps")
        .and_then(|s| s.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

/// Extracts every named process-sequence variant from `processSequences`,
/// preferring `baugruppentypen` and falling back to `baugruppen`.
fn parse_all_sequence_variants(process_sequences: &Value) -> Vec<(String, Vec<String>)> {
    let root = match resolve_process_sequences(process_sequences) {
        Some(v) => v,
        None => return Vec::new(),
    };
    let extract = |key: &str| -> Vec<(String, Vec<String>)> {
        block_sequences(&root, key)
            .into_iter()
            .enumerate()
            .map(|(i, seq)| {
                let id = seq.get("id").and_then(|v| v.as_str()).map(|s| s.to_string()).unwrap_or_else(|| format!("seq-{}", i + 1));
                (id, seq_steps(seq))
            })
            .collect()
    };
    let primary = extract("baugruppentypen");
    if !primary.is_empty() {
        return primary;
    }
    extract("baugruppen")
}

/// Builds the ordered list of `SequenceVariant`s for an order, trying
/// `processSequences` first and the legacy top-level `sequences` field next.
pub fn extract_variants(dto: &OrderDto) -> Vec<SequenceVariant> {
    if let Some(ps) = &dto.process_sequences {
        let variants = parse_all_sequence_variants(ps);
        if !variants.is_empty() {
            return variants.into_iter().map(|(id, steps)| SequenceVariant { id, steps }).collect();
        }
    }
    if let Some(seqs) = &dto.sequences {
        if let Some(arr) = seqs.as_array() {
            if arr.iter().all(|v| v.is_string()) {
                let steps: Vec<String> = arr.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()).collect();
                if !steps.is_empty() {
                    return vec![SequenceVariant { id: "seq-1".to_string(), steps }];
                }
            } else {
                let variants: Vec<SequenceVariant> = arr
                    .iter()
                    .enumerate()
                    .map(|(i, seq)| {
                        let id = seq.get("id").and_then(|v| v.as_str()).map(|s| s.to_string()).unwrap_or_else(|| format!("seq-{}", i + 1));
                        SequenceVariant { id, steps: seq_steps(seq) }
                    })
                    .collect();
                if !variants.is_empty() {
                    return variants;
                }
            }
        }
    }
    Vec::new()
}

/// Union of every normalized, non-token step appearing in any variant plus
/// the raw `baugruppen`/`baugruppentypen` blocks (which may carry sequences
/// beyond the ones actually used to build operations).
pub fn seq_set(dto: &OrderDto) -> HashSet<String> {
    let mut set = HashSet::new();
    if let Some(ps) = &dto.process_sequences {
        if let Some(root) = resolve_process_sequences(ps) {
            for key in ["baugruppen", "baugruppentypen"] {
                for seq in block_sequences(&root, key) {
                    for step in seq_steps(seq) {
                        if !is_stop_token(&step) {
                            set.insert(normalize_step(&step));
                        }
                    }
                }
            }
        }
    }
    if let Some(seqs) = &dto.sequences {
        if let Some(arr) = seqs.as_array() {
            if arr.iter().all(|v| v.is_string()) {
                for v in arr {
                    if let Some(s) = v.as_str() {
                        if !is_stop_token(s) {
                            set.insert(normalize_step(s));
                        }
                    }
                }
            } else {
                for seq in arr {
                    for step in seq_steps(seq) {
                        if !is_stop_token(&step) {
                            set.insert(normalize_step(&step));
                        }
                    }
                }
            }
        }
    }
    if set.is_empty() {
        for v in extract_variants(dto) {
            for step in v.steps {
                if !is_stop_token(&step) {
                    set.insert(normalize_step(&step));
                }
            }
        }
    }
    set
}

fn build_ops(order_id: &str, dtos: &[crate::api::common::OperationDto]) -> Result<Vec<Operation>> {
    dtos.iter()
        .map(|d| {
            let id = d.id.clone().unwrap_or_default();
            let station_id = d.station_id.clone().ok_or_else(|| Error::MissingRequired {
                order_id: order_id.to_string(),
                field: "stationId".to_string(),
            })?;
            let duration = d.expected_duration.ok_or_else(|| Error::MissingRequired {
                order_id: order_id.to_string(),
                field: "expectedDuration".to_string(),
            })?;
            let step = d.meta.as_ref().and_then(|m| m.step.clone());
            Operation::new(order_id, id, station_id, duration, step, d.label.clone(), d.setup_family.clone(), d.bg.clone())
        })
        .collect()
}

/// Splits a generic `operations[]` array (SRFS shape) into disassembly and
/// reassembly lists by station-name classification.
fn split_operations(order_id: &str, dtos: &[crate::api::common::OperationDto]) -> Result<(Vec<Operation>, Vec<Operation>)> {
    let ops = build_ops(order_id, dtos)?;
    let mut dem = Vec::new();
    let mut mon = Vec::new();
    for op in ops {
        match op.phase {
            super::order::OperationPhase::Disassembly => dem.push(op),
            super::order::OperationPhase::Reassembly => mon.push(op),
        }
    }
    Ok((dem, mon))
}

/// Policy for how a missing/absent due date is handled.
pub enum DueDatePolicy {
    /// Hard error (MRS/SRFS): absent data is an error, not a zero.
    Strict,
    /// Soft backfill used only by LRB windowing math: `now + 30 days`.
    SoftBackfill { now: f64 },
}

/// Builds an `Order` from its wire DTO.
pub fn build_order(dto: &OrderDto, due_date_policy: DueDatePolicy) -> Result<Order> {
    let ready_at = normalize_minutes(dto.ready_at.unwrap_or(0.0));
    let due_date = match (dto.due_date, due_date_policy) {
        (Some(d), _) => normalize_minutes(d),
        (None, DueDatePolicy::SoftBackfill { now }) => now + 30.0 * 24.0 * 60.0,
        (None, DueDatePolicy::Strict) => {
            return Err(Error::MissingRequired { order_id: dto.order_id.clone(), field: "dueDate".to_string() });
        }
    };

    let (mut dem_ops, mut mon_ops) = (Vec::new(), Vec::new());
    if let Some(d) = &dto.dem_ops {
        dem_ops = build_ops(&dto.order_id, d)?;
    }
    if let Some(m) = &dto.mon_ops {
        mon_ops = build_ops(&dto.order_id, m)?;
    }
    if let Some(ops) = &dto.operations {
        let (d, m) = split_operations(&dto.order_id, ops)?;
        dem_ops.extend(d);
        mon_ops.extend(m);
    }

    let variants = extract_variants(dto);
    let seq_set = seq_set(dto);

    let process_time_total = if !dem_ops.is_empty() || !mon_ops.is_empty() {
        dem_ops.iter().map(|o| o.expected_duration).sum::<f64>() + mon_ops.iter().map(|o| o.expected_duration).sum::<f64>()
    } else {
        dto.process_time_dem.unwrap_or(60.0) + dto.process_time_mon.unwrap_or(90.0)
    };

    Ok(Order {
        id: dto.order_id.clone(),
        ready_at,
        due_date,
        dem_ops,
        mon_ops,
        variants,
        seq_set,
        deferred_count: dto.deferred_count.unwrap_or(0),
        process_time_total,
    })
}
