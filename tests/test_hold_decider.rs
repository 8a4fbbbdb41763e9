use remanufacturing_scheduler::domain::hold_decider::{decide_holds, deferred_cluster_holds, HoldCandidate};

/// 20 orders of uniform processing time, sized so total load is exactly 3x
/// the per-cycle capacity of 4 slots: every order past the 4th position
/// should be held, since each has ample slack.
#[test]
fn overloaded_queue_holds_every_order_past_slot_capacity() {
    let total_slots = 4;
    let cycle_minutes = 100.0;
    let processing_time = 60.0; // 20 * 60 = 1200 = 3 * (4 * 100)
    let due_date = 2000.0;

    let candidates: Vec<HoldCandidate> = (0..20)
        .map(|i| HoldCandidate { order_id: format!("O{i}"), due_date, estimated_completion: (i + 1) as f64 * processing_time, processing_time })
        .collect();

    let holds = decide_holds(&candidates, total_slots, cycle_minutes, 0.8, 0.0);
    assert_eq!(holds.len(), 20 - total_slots, "every order beyond the slot count should be held given ample slack");
    for hold in &holds {
        assert!(candidates.iter().skip(total_slots).any(|c| c.order_id == hold.order_id));
    }
}

#[test]
fn utilization_exactly_at_threshold_holds_nothing() {
    let total_slots = 2;
    let cycle_minutes = 100.0;
    // capacity = 200, load = 160 -> utilization exactly 0.8
    let candidates: Vec<HoldCandidate> =
        (0..4).map(|i| HoldCandidate { order_id: format!("O{i}"), due_date: 1000.0, estimated_completion: (i + 1) as f64 * 40.0, processing_time: 40.0 }).collect();

    let holds = decide_holds(&candidates, total_slots, cycle_minutes, 0.8, 0.0);
    assert!(holds.is_empty(), "utilization at or below threshold never triggers holds");
}

#[test]
fn fewer_orders_than_slots_holds_nothing_regardless_of_utilization() {
    let candidates: Vec<HoldCandidate> =
        (0..2).map(|i| HoldCandidate { order_id: format!("O{i}"), due_date: 50.0, estimated_completion: (i + 1) as f64 * 1000.0, processing_time: 1000.0 }).collect();
    let holds = decide_holds(&candidates, 4, 100.0, 0.1, 0.0);
    assert!(holds.is_empty());
}

#[test]
fn zero_slots_or_cycle_length_never_holds() {
    let candidates = vec![HoldCandidate { order_id: "O1".into(), due_date: 10.0, estimated_completion: 1000.0, processing_time: 1000.0 }];
    assert!(decide_holds(&candidates, 0, 100.0, 0.1, 0.0).is_empty());
    assert!(decide_holds(&candidates, 4, 0.0, 0.1, 0.0).is_empty());
}

#[test]
fn deferred_cluster_holds_covers_every_order_with_the_same_reason() {
    let order_ids = vec!["O1".to_string(), "O2".to_string(), "O3".to_string()];
    let holds = deferred_cluster_holds(&order_ids, 240.0);
    assert_eq!(holds.len(), 3);
    for hold in &holds {
        assert_eq!(hold.hold_until_sim_minute, 240.0);
        assert!(hold.reason.contains("deferred"));
    }
}
