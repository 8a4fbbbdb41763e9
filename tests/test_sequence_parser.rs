use remanufacturing_scheduler::domain::order::{normalize_step, Operation, SequenceVariant};
use remanufacturing_scheduler::domain::sequence_parser::build_ops_from_variant;

fn op(id: &str, station: &str, duration: f64, step: &str) -> Operation {
    Operation::new("O1", id.to_string(), station.to_string(), duration, Some(step.to_string()), None, None, None).expect("valid operation")
}

#[test]
fn separator_splits_disassembly_from_reassembly_and_drops_markers() {
    let variant = SequenceVariant { id: "v1".into(), steps: vec!["I".into(), "A".into(), "B".into(), "×".into(), "C".into(), "Q".into()] };
    let dem = vec![op("d1", "Demontage-1", 10.0, "A"), op("d2", "Demontage-1", 5.0, "B")];
    let mon = vec![op("m1", "Montage-1", 20.0, "C")];

    let ops = build_ops_from_variant("O1", &variant, &dem, &mon).expect("resolves");
    let ids: Vec<&str> = ops.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["d1", "d2", "m1"], "disassembly steps precede reassembly steps, in the given order");
}

#[test]
fn bgt_and_bg_prefixes_normalize_to_the_same_step() {
    assert_eq!(normalize_step("BGT-Fahrwerk"), normalize_step("BG-Fahrwerk"));
    assert_eq!(normalize_step("BGT-Fahrwerk"), "Fahrwerk");

    let variant = SequenceVariant { id: "v1".into(), steps: vec!["BGT-Fahrwerk".into(), "×".into()] };
    let dem = vec![op("d1", "Demontage-1", 10.0, "BG-Fahrwerk")];
    let ops = build_ops_from_variant("O1", &variant, &dem, &[]).expect("resolves via BG/BGT normalization");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].id, "d1");
}

#[test]
fn legacy_fallback_classifies_steps_by_keyword_when_separator_absent() {
    let variant = SequenceVariant { id: "v1".into(), steps: vec!["Demontage-Schritt".into(), "Montage-Schritt".into()] };
    let dem = vec![op("d1", "Demontage-1", 10.0, "A")];
    let mon = vec![op("m1", "Montage-1", 10.0, "C")];

    let ops = build_ops_from_variant("O1", &variant, &dem, &mon).expect("resolves via legacy fallback");
    let ids: Vec<&str> = ops.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["d1", "m1"]);
}

#[test]
fn unresolved_steps_are_silently_dropped_not_fatal() {
    let variant = SequenceVariant { id: "v1".into(), steps: vec!["Unknown".into(), "×".into(), "C".into()] };
    let dem = vec![op("d1", "Demontage-1", 10.0, "A")];
    let mon = vec![op("m1", "Montage-1", 10.0, "C")];
    let ops = build_ops_from_variant("O1", &variant, &dem, &mon).expect("still resolves the mon half");
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].id, "m1");
}

#[test]
fn a_variant_with_no_resolvable_operations_is_an_error() {
    let variant = SequenceVariant { id: "v1".into(), steps: vec!["Unknown".into(), "×".into(), "AlsoUnknown".into()] };
    let dem = vec![op("d1", "Demontage-1", 10.0, "A")];
    let mon = vec![op("m1", "Montage-1", 10.0, "C")];
    assert!(build_ops_from_variant("O1", &variant, &dem, &mon).is_err());
}

#[test]
fn resolved_operations_always_have_positive_duration() {
    let variant = SequenceVariant { id: "v1".into(), steps: vec!["A".into(), "×".into(), "C".into()] };
    let dem = vec![op("d1", "Demontage-1", 10.0, "A")];
    let mon = vec![op("m1", "Montage-1", 10.0, "C")];
    let ops = build_ops_from_variant("O1", &variant, &dem, &mon).expect("resolves");
    assert!(ops.iter().all(|o| o.expected_duration > 0.0));
}
