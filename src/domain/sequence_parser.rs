//! Maps a `SequenceVariant`'s raw token stream onto concrete `Operation`s.
//!
//! The `×` token splits disassembly steps (before) from reassembly steps
//! (after); `I`/`Q` are inspection/quality markers and are dropped. Absent
//! `×`, a legacy positional fallback classifies steps by keyword instead.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

use super::order::{normalize_step, Operation, SequenceVariant};

const SEPARATOR: &str = "×";

fn is_inspection(token: &str) -> bool {
    let t = token.trim();
    t.eq_ignore_ascii_case("i") || t.eq_ignore_ascii_case("inspektion")
}

fn is_quality(token: &str) -> bool {
    let t = token.trim();
    t.eq_ignore_ascii_case("q") || t.eq_ignore_ascii_case("qualität") || t.eq_ignore_ascii_case("qualitaet") || t.eq_ignore_ascii_case("quality")
}

fn build_name_index<'a>(ops: &'a [Operation]) -> BTreeMap<String, &'a Operation> {
    let mut index = BTreeMap::new();
    for op in ops {
        if let Some(step) = &op.step {
            index.insert(step.clone(), op);
        }
        let fallback = op.label.clone().or_else(|| op.setup_family.clone()).or_else(|| op.bg.clone());
        if let Some(name) = fallback {
            index.entry(name).or_insert(op);
        }
    }
    index
}

/// Resolves one sequence token to an operation: exact key, then
/// substring/prefix match, then `BGT-`/`BG-` normalized match.
fn resolve_step<'a>(token: &str, index: &BTreeMap<String, &'a Operation>) -> Option<&'a Operation> {
    if let Some(op) = index.get(token) {
        return Some(*op);
    }
    for (key, op) in index.iter() {
        if token.contains(key.as_str()) || key.contains(token) {
            return Some(*op);
        }
    }
    let normalized_token = normalize_step(token);
    for (key, op) in index.iter() {
        if normalize_step(key) == normalized_token {
            return Some(*op);
        }
    }
    None
}

/// Substring heuristics (English and German) used only when a variant's
/// token stream lacks the `×` phase separator. Preserved exactly as a
/// documented compatibility shim — do not "fix" the asymmetric keyword list.
fn is_legacy_disassembly_token(lower: &str) -> bool {
    lower.starts_with("demontage")
        || lower.starts_with("dem")
        || lower.starts_with("d-")
        || lower.contains("dem")
        || lower.contains("zerlegen")
        || lower.contains("abbau")
        || lower.contains("disassembly")
        || lower.contains("teardown")
        || lower.contains("removal")
}

fn is_legacy_reassembly_token(lower: &str) -> bool {
    lower.starts_with("montage")
        || lower.starts_with("mon")
        || lower.starts_with("m-")
        || lower.contains("mon")
        || lower.contains("zusammenbau")
        || lower.contains("aufbau")
        || lower.contains("assembly")
        || lower.contains("reassembly")
        || lower.contains("installation")
}

/// Legacy fallback: steps are classified by keyword and consumed
/// positionally from `dem_ops`/`mon_ops` (not matched by name).
fn build_ops_legacy(steps: &[String], dem_ops: &[Operation], mon_ops: &[Operation]) -> Vec<Operation> {
    let mut result = Vec::new();
    let mut dem_idx = 0;
    let mut mon_idx = 0;
    for raw in steps {
        let lower = raw.trim().to_lowercase();
        if is_legacy_disassembly_token(&lower) {
            if let Some(op) = dem_ops.get(dem_idx) {
                dem_idx += 1;
                if op.expected_duration > 0.0 {
                    result.push(op.clone());
                }
            }
        } else if is_legacy_reassembly_token(&lower) {
            if let Some(op) = mon_ops.get(mon_idx) {
                mon_idx += 1;
                if op.expected_duration > 0.0 {
                    result.push(op.clone());
                }
            }
        }
    }
    result
}

/// Produces the executable, ordered operation list for `variant` given an
/// order's disassembly and reassembly operation pools.
///
/// Unresolved steps are dropped (no warning channel at this layer; callers
/// that want one should log the gap between `variant.steps` and the
/// returned list's sequence-step coverage). Contract: every returned
/// operation has `expected_duration > 0`.
pub fn build_ops_from_variant(order_id: &str, variant: &SequenceVariant, dem_ops: &[Operation], mon_ops: &[Operation]) -> Result<Vec<Operation>> {
    let separator_idx = variant.steps.iter().position(|s| s.trim() == SEPARATOR);

    let result = match separator_idx {
        None => build_ops_legacy(&variant.steps, dem_ops, mon_ops),
        Some(sep) => {
            let dem_steps: Vec<&String> = variant.steps[..sep].iter().filter(|s| !is_inspection(s)).collect();
            let mon_steps: Vec<&String> = variant.steps[sep + 1..].iter().filter(|s| !is_quality(s)).collect();

            let dem_index = build_name_index(dem_ops);
            let mon_index = build_name_index(mon_ops);

            let mut out = Vec::new();
            for step in dem_steps {
                if let Some(op) = resolve_step(step, &dem_index) {
                    if op.expected_duration > 0.0 {
                        out.push(op.clone());
                    }
                }
            }
            for step in mon_steps {
                if let Some(op) = resolve_step(step, &mon_index) {
                    if op.expected_duration > 0.0 {
                        out.push(op.clone());
                    }
                }
            }
            out
        }
    };

    if result.is_empty() && (!dem_ops.is_empty() || !mon_ops.is_empty()) {
        return Err(Error::EmptyVariantMapping { order_id: order_id.to_string(), variant_id: variant.id.clone() });
    }
    Ok(result)
}
