use std::collections::{BTreeMap, HashMap, HashSet};

use remanufacturing_scheduler::domain::capacity_simulator::{fixed_slot_assignment_honored, simulate, CapacityConfig};
use remanufacturing_scheduler::domain::order::{Operation, OperationPhase, Order};

fn make_order(id: &str, due: f64, dem_ops: Vec<Operation>, mon_ops: Vec<Operation>) -> Order {
    let process_time_total = dem_ops.iter().map(|o| o.expected_duration).sum::<f64>() + mon_ops.iter().map(|o| o.expected_duration).sum::<f64>();
    Order { id: id.to_string(), ready_at: 0.0, due_date: due, dem_ops, mon_ops, variants: Vec::new(), seq_set: HashSet::new(), deferred_count: 0, process_time_total }
}

fn op(order_id: &str, id: &str, station: &str, duration: f64, step: &str) -> Operation {
    Operation::new(order_id, id.to_string(), station.to_string(), duration, Some(step.to_string()), None, None, None).expect("valid operation")
}

/// Scenario: one order with 3 disassembly ops on steps A, A, B; Nd=2 both
/// fixed, slot 0 pre-assigned to A (higher mean duration) and slot 1 to B.
#[test]
fn fixed_slot_is_reused_back_to_back_with_no_setup() {
    let order = make_order("O1", 1000.0, vec![op("O1", "d-a1", "Demontage-1", 20.0, "A"), op("O1", "d-a2", "Demontage-1", 20.0, "A"), op("O1", "d-b", "Demontage-1", 10.0, "B")], Vec::new());

    let cfg = CapacityConfig { nd: 2, nm: 1, dem_flex_share: 0.0, mon_flex_share: 0.0, setup_minutes: 30.0 };
    let (metrics, timeline) = simulate(&[order], &[0], &BTreeMap::new(), 0.0, cfg, true).expect("simulate ok");
    let timeline = timeline.expect("timeline requested");

    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline[0].slot_index, 0);
    assert_eq!(timeline[1].slot_index, 0, "second A op reuses the slot fixed to A");
    assert_eq!(timeline[2].slot_index, 1);
    assert!(!timeline[0].setup_applied && !timeline[1].setup_applied && !timeline[2].setup_applied);
    assert_eq!(timeline[1].start, timeline[0].end, "back-to-back, no setup gap between the two A ops");
    assert_eq!(metrics.setup_time, 0.0);

    let fixed_steps = vec![(0usize, "A".to_string()), (1usize, "B".to_string())];
    assert!(fixed_slot_assignment_honored(&timeline, &fixed_steps, OperationPhase::Disassembly));
}

/// Scenario: two orders, each with one op on A then one op on B, sharing a
/// single flex slot. Every assembly-group switch on that slot pays setup.
#[test]
fn flex_slot_pays_setup_on_every_assembly_group_switch() {
    let d = 10.0;
    let setup = 10.0;
    let order0 = make_order("O1", 1000.0, vec![op("O1", "o1-a", "Demontage-1", d, "A"), op("O1", "o1-b", "Demontage-1", d, "B")], Vec::new());
    let order1 = make_order("O2", 1000.0, vec![op("O2", "o2-a", "Demontage-1", d, "A"), op("O2", "o2-b", "Demontage-1", d, "B")], Vec::new());

    let cfg = CapacityConfig { nd: 1, nm: 1, dem_flex_share: 1.0, mon_flex_share: 0.0, setup_minutes: setup };
    let (metrics, _) = simulate(&[order0, order1], &[0, 1], &BTreeMap::new(), 0.0, cfg, false).expect("simulate ok");

    assert_eq!(metrics.setup_time, 3.0 * setup, "three switches: within order 1, between orders, within order 2");
    assert_eq!(metrics.makespan, 4.0 * d + 3.0 * setup);
}

#[test]
fn timeline_is_internally_consistent() {
    let order0 = make_order("O1", 50.0, vec![op("O1", "o1-a", "Demontage-1", 15.0, "A"), op("O1", "o1-b", "Demontage-1", 10.0, "B")], vec![op("O1", "o1-c", "Montage-1", 5.0, "C")]);
    let order1 = make_order("O2", 20.0, vec![op("O2", "o2-a", "Demontage-1", 25.0, "A")], vec![op("O2", "o2-b", "Montage-1", 5.0, "C")]);

    let cfg = CapacityConfig { nd: 2, nm: 2, dem_flex_share: 0.5, mon_flex_share: 0.5, setup_minutes: 5.0 };
    let (metrics, timeline) = simulate(&[order0, order1], &[0, 1], &BTreeMap::new(), 0.0, cfg, true).expect("simulate ok");
    let timeline = timeline.expect("timeline requested");

    let durations: HashMap<&str, f64> = [("o1-a", 15.0), ("o1-b", 10.0), ("o1-c", 5.0), ("o2-a", 25.0), ("o2-b", 5.0)].into_iter().collect();

    for scheduled in &timeline {
        assert!(scheduled.start >= 0.0, "no operation starts before the simulation window");
        let expected_duration = durations[scheduled.op_id.as_str()];
        assert!((scheduled.end - scheduled.start - expected_duration).abs() < 1e-9, "end must equal start + duration");
    }

    let mut by_slot: HashMap<(OperationPhase, usize), Vec<(f64, f64)>> = HashMap::new();
    for scheduled in &timeline {
        by_slot.entry((scheduled.phase, scheduled.slot_index)).or_default().push((scheduled.start, scheduled.end));
    }
    for intervals in by_slot.values() {
        let mut sorted = intervals.clone();
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        for pair in sorted.windows(2) {
            assert!(pair[1].0 >= pair[0].1 - 1e-9, "no two operations may overlap on the same slot");
        }
    }

    assert!(metrics.avg_utilization >= 0.0 && metrics.avg_utilization <= 100.0);
    assert!(metrics.idle_time >= 0.0);
    assert!(metrics.makespan + 1e-9 >= timeline.iter().map(|o| o.end).fold(0.0_f64, f64::max) - 0.0);
}

#[test]
fn empty_orders_or_permutation_short_circuits_to_default_metrics() {
    let cfg = CapacityConfig { nd: 1, nm: 1, dem_flex_share: 0.5, mon_flex_share: 0.5, setup_minutes: 5.0 };
    let (metrics, timeline) = simulate(&[], &[], &BTreeMap::new(), 0.0, cfg, true).expect("simulate ok");
    assert_eq!(metrics.makespan, 0.0);
    assert!(timeline.expect("timeline requested").is_empty());
}
