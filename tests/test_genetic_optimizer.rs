use std::collections::HashSet;

use remanufacturing_scheduler::config::GaConfig;
use remanufacturing_scheduler::domain::capacity_simulator::CapacityConfig;
use remanufacturing_scheduler::domain::genetic_optimizer::{self, EvaluationStrategy, Genome};
use remanufacturing_scheduler::domain::order::{Operation, Order};

fn make_order(id: &str, due: f64, duration: f64) -> Order {
    let op = Operation::new(id, format!("{id}-D1"), "Demontage-1".to_string(), duration, Some("A".to_string()), None, None, None).expect("valid op");
    Order { id: id.to_string(), ready_at: 0.0, due_date: due, dem_ops: vec![op], mon_ops: Vec::new(), variants: Vec::new(), seq_set: HashSet::new(), deferred_count: 0, process_time_total: duration }
}

/// Six orders on a single disassembly slot: one large job (O1) due earliest,
/// five tiny jobs due later. Sequencing by EDD processes the large job
/// first and drags every small job's completion past its own due date,
/// whereas processing the small jobs first and the large job last leaves
/// only O1 tardy. The GA's initial population already contains the SPT
/// permutation, so it must find a fitness at least as good as EDD's.
fn six_orders() -> Vec<Order> {
    vec![
        make_order("O1", 50.0, 100.0),
        make_order("O2", 60.0, 1.0),
        make_order("O3", 70.0, 1.0),
        make_order("O4", 80.0, 1.0),
        make_order("O5", 90.0, 1.0),
        make_order("O6", 95.0, 1.0),
    ]
}

fn cap_cfg() -> CapacityConfig {
    CapacityConfig { nd: 1, nm: 1, dem_flex_share: 0.0, mon_flex_share: 0.0, setup_minutes: 0.0 }
}

fn edd_genome(orders: &[Order]) -> Genome {
    let mut order_sequence: Vec<usize> = (0..orders.len()).collect();
    order_sequence.sort_by(|&a, &b| orders[a].due_date.partial_cmp(&orders[b].due_date).unwrap());
    let variant_sequence = vec![0; order_sequence.len()];
    Genome { order_sequence, variant_sequence }
}

fn plan_genome(plan: &remanufacturing_scheduler::domain::plan::Plan) -> Genome {
    let variant_sequence = plan.sequence.iter().map(|_| 0usize).collect();
    Genome { order_sequence: plan.sequence.clone(), variant_sequence }
}

#[test]
fn ga_best_fitness_is_no_worse_than_edd_baseline() {
    let orders = six_orders();
    let cfg = GaConfig { population: 30, generations: 50, mutation_rate: 0.1, variant_mutation_rate: 0.0, elite: 2, replications: 1, seed: 42 };
    let strategy = EvaluationStrategy::Capacitated;
    let cap_cfg = cap_cfg();

    let (edd_fitness, edd_metrics) =
        genetic_optimizer::evaluate_genome(&orders, &edd_genome(&orders), strategy, cap_cfg, 0.0, cfg.seed, 0, 0.2, 0.1).expect("edd evaluation");
    assert!(edd_metrics.tardiness > 0.0, "EDD baseline must show nonzero tardiness for this fixture");

    let best_plan = genetic_optimizer::run_ga(&orders, &cfg, strategy, cap_cfg, 0.0, 0.2, 0.1).expect("ga run");
    let (ga_fitness, _) = genetic_optimizer::evaluate_genome(&orders, &plan_genome(&best_plan), strategy, cap_cfg, 0.0, cfg.seed, 0, 0.2, 0.1).expect("ga evaluation");

    assert!(ga_fitness <= edd_fitness + 1e-9, "GA best fitness ({ga_fitness}) should be no worse than EDD baseline ({edd_fitness})");
}

#[test]
fn ga_is_deterministic_for_a_fixed_seed() {
    let orders = six_orders();
    let cfg = GaConfig { population: 20, generations: 15, mutation_rate: 0.1, variant_mutation_rate: 0.0, elite: 2, replications: 1, seed: 7 };
    let cap_cfg = cap_cfg();

    let plan_a = genetic_optimizer::run_ga(&orders, &cfg, EvaluationStrategy::Capacitated, cap_cfg, 0.0, 0.2, 0.1).expect("run a");
    let plan_b = genetic_optimizer::run_ga(&orders, &cfg, EvaluationStrategy::Capacitated, cap_cfg, 0.0, 0.2, 0.1).expect("run b");

    assert_eq!(plan_a.sequence, plan_b.sequence);
    assert_eq!(plan_a.metrics.tardiness, plan_b.metrics.tardiness);
}

#[test]
fn single_order_needs_no_iteration_to_produce_a_trivial_plan() {
    let orders = vec![make_order("O1", 1000.0, 10.0)];
    let cfg = GaConfig { population: 5, generations: 1, mutation_rate: 0.0, variant_mutation_rate: 0.0, elite: 1, replications: 1, seed: 1 };
    let plan = genetic_optimizer::run_ga(&orders, &cfg, EvaluationStrategy::Capacitated, cap_cfg(), 0.0, 0.2, 0.1).expect("ga run");
    assert_eq!(plan.sequence, vec![0]);
    assert_eq!(plan.metrics.tardiness, 0.0);
}
