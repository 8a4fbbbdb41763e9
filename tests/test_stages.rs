use remanufacturing_scheduler::api::common::OrderDto;
use remanufacturing_scheduler::api::lrb::LrbInput;
use remanufacturing_scheduler::api::mrs::MrsInput;
use remanufacturing_scheduler::api::srfs::SrfsInput;
use remanufacturing_scheduler::config::{Forecast, LrbConfig, MrsConfig, SetupConfig, SrfsConfig};
use remanufacturing_scheduler::{run_lrb, run_mrs, run_srfs};

fn order_with_steps(order_id: &str, due_date: f64, dem: f64, mon: f64, steps: &[&str]) -> OrderDto {
    let sequences = serde_json::json!({
        "baugruppentypen": {
            "sequences": [{ "id": "seq-1", "steps": steps }]
        }
    });
    OrderDto {
        order_id: order_id.to_string(),
        due_date: Some(due_date),
        ready_at: Some(0.0),
        process_time_dem: Some(dem),
        process_time_mon: Some(mon),
        process_sequences: Some(sequences),
        ..Default::default()
    }
}

/// spec scenario: 4 orders sharing step set {A,B,C}, qMax=4/qMin=2,
/// jaccardThreshold=0.5, intervalMinutes=120, machines=1, targetUtil=1.0 —
/// expect one batch of all 4 orders with avg Jaccard 1.0, released at or
/// after t=120.
#[test]
fn lrb_clusters_four_identical_orders_into_one_batch() {
    let orders: Vec<OrderDto> = (1..=4).map(|i| order_with_steps(&format!("O{i}"), 10_000.0, 60.0, 60.0, &["A", "B", "C"])).collect();

    let config = LrbConfig {
        interval_minutes: 120.0,
        machines: 1,
        target_util: 1.0,
        jaccard_threshold: 0.5,
        setup: SetupConfig { min_batch: 2, q_min: 2, q_max: 4 },
        ..Default::default()
    };
    let input = LrbInput { now: 0.0, orders, new_orders: Vec::new(), config, forecast: Forecast::default(), process_sequences: None };

    let output = run_lrb(&input);

    assert_eq!(output.batches.len(), 1, "all four orders should form a single batch");
    let batch = &output.batches[0];
    assert_eq!(batch.order_ids.len(), 4);
    assert_eq!(batch.avg_jaccard, 1.0);
    assert!(batch.release_at >= 120.0, "release must fall at or after the first interval boundary");
    assert!(output.deferred_orders.is_empty(), "a fully similar batch at size qMax should never be deferred for weakness");
}

#[test]
fn lrb_on_empty_orders_returns_empty_result_and_marks_debug() {
    let input = LrbInput::default();
    let output = run_lrb(&input);
    assert!(output.batches.is_empty());
    assert!(output.eta_list.is_empty());
    assert!(output.debug.iter().any(|d| d.message.contains("LRB_EMPTY")));
}

#[test]
fn mrs_on_empty_orders_returns_empty_result() {
    let input = MrsInput::default();
    let output = run_mrs(&input);
    assert!(output.release_list.is_empty());
    assert!(output.debug.iter().any(|d| d.message.contains("MRS_EMPTY")));
}

#[test]
fn srfs_on_empty_orders_returns_empty_result() {
    let input = SrfsInput::default();
    let output = run_srfs(&input);
    assert!(output.pareto_set.is_empty());
    assert!(output.debug.iter().any(|d| d.message.contains("SRFS_EMPTY")));
}

#[test]
fn mrs_missing_due_date_is_a_fatal_per_order_error_not_a_panic() {
    let mut order = order_with_steps("O1", 0.0, 60.0, 60.0, &["A", "×", "C"]);
    order.due_date = None;
    let input = MrsInput { now: 0.0, orders: vec![order, order_with_steps("O2", 500.0, 10.0, 10.0, &["A", "×", "C"])], config: MrsConfig::default() };
    let output = run_mrs(&input);
    assert!(output.release_list.is_empty());
    assert!(output.debug.iter().any(|d| d.message.contains("MRS_ERROR")));
}

#[test]
fn srfs_single_order_produces_a_one_element_release_list() {
    let order = order_with_steps("O1", 500.0, 30.0, 20.0, &["A", "×", "C"]);
    let config = SrfsConfig { factory_capacity: Some(remanufacturing_scheduler::config::FactoryCapacity::default()), hms: 5, iterations: 3, candidates_per_iter: 4, ..Default::default() };
    let input = SrfsInput { start_time: 0.0, orders: vec![order], config };
    let output = run_srfs(&input);
    assert_eq!(output.release_list.len(), 1);
    assert_eq!(output.release_list[0], "O1");
}
