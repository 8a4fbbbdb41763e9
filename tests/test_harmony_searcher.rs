use std::collections::HashSet;

use remanufacturing_scheduler::config::{ObjectiveWeights, SrfsConfig};
use remanufacturing_scheduler::domain::capacity_simulator::CapacityConfig;
use remanufacturing_scheduler::domain::harmony_searcher::{self, SrfsResult};
use remanufacturing_scheduler::domain::order::{Operation, Order};

fn make_order(id: &str, due: f64, dem: f64, mon: f64) -> Order {
    let d = Operation::new(id, format!("{id}-D1"), "Demontage-1".to_string(), dem, Some("A".to_string()), None, None, None).expect("valid op");
    let m = Operation::new(id, format!("{id}-M1"), "Montage-1".to_string(), mon, Some("C".to_string()), None, None, None).expect("valid op");
    Order { id: id.to_string(), ready_at: 0.0, due_date: due, dem_ops: vec![d], mon_ops: vec![m], variants: Vec::new(), seq_set: HashSet::new(), deferred_count: 0, process_time_total: dem + mon }
}

fn eight_orders() -> Vec<Order> {
    (1..=8)
        .map(|i| {
            let dem = 10.0 + (i as f64 * 7.0 % 23.0);
            let mon = 8.0 + (i as f64 * 5.0 % 17.0);
            let due = 80.0 + (i as f64 * 13.0 % 50.0);
            make_order(&format!("O{i}"), due, dem, mon)
        })
        .collect()
}

fn cfg() -> SrfsConfig {
    SrfsConfig {
        hms: 20,
        iterations: 40,
        candidates_per_iter: 10,
        max_pareto: 20,
        release_fraction: 0.3,
        weights: ObjectiveWeights::default(),
        hmcr_min: 0.7,
        hmcr_max: 0.95,
        par_min: 0.1,
        par_max: 0.4,
        seed: 99,
        factory_capacity: None,
        dem_flex_share_pct: 30.0,
        mon_flex_share_pct: 30.0,
        setup_minutes: 10.0,
    }
}

fn cap_cfg() -> CapacityConfig {
    CapacityConfig { nd: 2, nm: 2, dem_flex_share: 0.3, mon_flex_share: 0.3, setup_minutes: 10.0 }
}

fn dominates(a: [f64; 3], b: [f64; 3]) -> bool {
    let mut strictly_better = false;
    for i in 0..3 {
        if a[i] > b[i] {
            return false;
        }
        if a[i] < b[i] {
            strictly_better = true;
        }
    }
    strictly_better
}

#[test]
fn returned_pareto_front_is_mutually_non_dominated() {
    let orders = eight_orders();
    let SrfsResult { pareto_set, selected, .. } = harmony_searcher::run_harmony_search(&orders, &cfg(), cap_cfg(), 0.0).expect("harmony search runs");

    assert!(!pareto_set.is_empty(), "expected at least one Pareto-optimal plan");
    assert!(pareto_set.iter().all(|p| p.pareto_rank == Some(1)), "every retained plan must be rank 1");

    let objectives: Vec<[f64; 3]> = pareto_set.iter().map(|p| [p.metrics.makespan, p.metrics.tardiness, p.metrics.idle_time]).collect();
    for i in 0..objectives.len() {
        for j in 0..objectives.len() {
            if i == j {
                continue;
            }
            assert!(!dominates(objectives[i], objectives[j]), "plan {i} must not dominate plan {j} within a non-dominated front");
        }
    }

    assert!(selected.is_some(), "a weighted-sum selected plan must be produced when the front is non-empty");
}

#[test]
fn zero_iterations_returns_a_front_from_the_initial_memory_only() {
    let orders = eight_orders();
    let mut config = cfg();
    config.iterations = 0;
    let SrfsResult { pareto_set, .. } = harmony_searcher::run_harmony_search(&orders, &config, cap_cfg(), 0.0).expect("harmony search runs");
    assert!(!pareto_set.is_empty());
    assert!(pareto_set.len() <= config.hms, "with no iterations the front can be no larger than the initial memory");
}

#[test]
fn empty_order_list_returns_an_empty_result() {
    let SrfsResult { pareto_set, selected, released_ops } = harmony_searcher::run_harmony_search(&[], &cfg(), cap_cfg(), 0.0).expect("harmony search runs");
    assert!(pareto_set.is_empty());
    assert!(selected.is_none());
    assert!(released_ops.is_empty());
}
