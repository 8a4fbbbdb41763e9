//! Mid-range sequencing: a genome-tuple-cached genetic algorithm over order
//! permutations paired with per-order variant choices. Order-crossover (OX)
//! on the permutation half, swap + variant-flip mutation, elitism, and a
//! choice of fitness strategy — Monte Carlo duration sampling against the
//! triangular-fuzzy estimates, or a single deterministic run of the capacity
//! simulator.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::GaConfig;
use crate::error::Result;

use super::capacity_simulator::{self, CapacityConfig};
use super::order::{Operation, Order};
use super::plan::{Plan, SimMetrics};
use super::seed::derive_seed;

#[derive(Debug, Clone, Copy)]
pub enum EvaluationStrategy {
    MonteCarlo { replications: usize },
    Capacitated,
}

/// An order permutation (indices into the `orders` slice) paired with a
/// variant choice per position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genome {
    pub order_sequence: Vec<usize>,
    pub variant_sequence: Vec<usize>,
}

impl Genome {
    fn cache_key(&self) -> (Vec<usize>, Vec<usize>) {
        (self.order_sequence.clone(), self.variant_sequence.clone())
    }

    fn variant_choices(&self, orders: &[Order]) -> BTreeMap<String, usize> {
        self.order_sequence
            .iter()
            .zip(self.variant_sequence.iter())
            .map(|(&order_idx, &v)| (orders[order_idx].id.clone(), v))
            .collect()
    }
}

fn sample_triangular(rng: &mut StdRng, low: f64, mode: f64, high: f64) -> f64 {
    if high <= low {
        return mode.max(0.0);
    }
    let u: f64 = rng.random_range(0.0..1.0);
    let fc = if (mode - low) > 0.0 { (mode - low) / (high - low) } else { 0.0 };
    if u < fc {
        low + (u * (high - low) * (mode - low)).sqrt()
    } else {
        high - ((1.0 - u) * (high - low) * (high - mode)).sqrt()
    }
}

/// Clones `orders` with every operation's duration resampled from its TFN.
fn resample_durations(orders: &[Order], rng: &mut StdRng) -> Vec<Order> {
    let resample_ops = |ops: &[Operation], rng: &mut StdRng| -> Vec<Operation> {
        ops.iter()
            .map(|op| {
                let mut clone = op.clone();
                clone.expected_duration = sample_triangular(rng, op.tfn.0, op.tfn.1, op.tfn.2).max(0.01);
                clone
            })
            .collect()
    };
    orders
        .iter()
        .map(|o| {
            let mut clone = o.clone();
            clone.dem_ops = resample_ops(&o.dem_ops, rng);
            clone.mon_ops = resample_ops(&o.mon_ops, rng);
            clone
        })
        .collect()
}

fn weighted_fitness(metrics: &SimMetrics, variance_weight: f64, setup_weight: f64, tardiness_variance: f64) -> f64 {
    metrics.tardiness + variance_weight * tardiness_variance + setup_weight * metrics.setup_time + 0.01 * metrics.idle_time
}

/// Evaluates one genome under the chosen strategy, returning its scalar
/// fitness (lower is better) and the metrics of its representative run.
pub fn evaluate_genome(orders: &[Order], genome: &Genome, strategy: EvaluationStrategy, cap_cfg: CapacityConfig, start_time: f64, master_seed: u64, generation: usize, variance_weight: f64, setup_weight: f64) -> Result<(f64, SimMetrics)> {
    let variant_choices = genome.variant_choices(orders);
    let paired: Vec<(usize, usize)> = genome.order_sequence.iter().copied().zip(genome.variant_sequence.iter().copied()).collect();
    let seed = derive_seed(master_seed, generation, &paired);

    match strategy {
        EvaluationStrategy::Capacitated => {
            let (metrics, _) = capacity_simulator::simulate(orders, &genome.order_sequence, &variant_choices, start_time, cap_cfg, false)?;
            let fitness = weighted_fitness(&metrics, variance_weight, setup_weight, metrics.tardiness_variance);
            Ok((fitness, metrics))
        }
        EvaluationStrategy::MonteCarlo { replications } => {
            let mut rng = StdRng::seed_from_u64(seed);
            let replications = replications.max(1);
            let mut tardiness_samples = Vec::with_capacity(replications);
            let mut last_metrics = SimMetrics::default();
            for _ in 0..replications {
                let sampled_orders = resample_durations(orders, &mut rng);
                let (metrics, _) = capacity_simulator::simulate(&sampled_orders, &genome.order_sequence, &variant_choices, start_time, cap_cfg, false)?;
                tardiness_samples.push(metrics.tardiness);
                last_metrics = metrics;
            }
            let mean_tardiness = tardiness_samples.iter().sum::<f64>() / replications as f64;
            let variance = tardiness_samples.iter().map(|t| (t - mean_tardiness).powi(2)).sum::<f64>() / replications as f64;
            let mut avg_metrics = last_metrics;
            avg_metrics.tardiness = mean_tardiness;
            avg_metrics.tardiness_variance = variance;
            let fitness = weighted_fitness(&avg_metrics, variance_weight, setup_weight, variance);
            Ok((fitness, avg_metrics))
        }
    }
}

fn ox_crossover(rng: &mut StdRng, a: &[usize], b: &[usize]) -> Vec<usize> {
    let n = a.len();
    if n < 2 {
        return a.to_vec();
    }
    let mut i = rng.random_range(0..n);
    let mut j = rng.random_range(0..n);
    if i > j {
        std::mem::swap(&mut i, &mut j);
    }
    let mut child = vec![usize::MAX; n];
    child[i..=j].copy_from_slice(&a[i..=j]);
    let taken: std::collections::HashSet<usize> = child[i..=j].iter().copied().collect();
    let mut fill_pos = (j + 1) % n;
    for k in 0..n {
        let cand = b[(j + 1 + k) % n];
        if taken.contains(&cand) {
            continue;
        }
        child[fill_pos] = cand;
        fill_pos = (fill_pos + 1) % n;
    }
    child
}

pub(crate) fn variant_bound(orders: &[Order], order_idx: usize) -> usize {
    orders[order_idx].variants.len().max(1)
}

pub(crate) fn random_genome(orders: &[Order], rng: &mut StdRng) -> Genome {
    let mut order_sequence: Vec<usize> = (0..orders.len()).collect();
    order_sequence.shuffle(rng);
    let variant_sequence = order_sequence.iter().map(|&idx| rng.random_range(0..variant_bound(orders, idx))).collect();
    Genome { order_sequence, variant_sequence }
}

pub(crate) fn init_population(orders: &[Order], size: usize, rng: &mut StdRng) -> Vec<Genome> {
    let mut population = Vec::with_capacity(size);

    let identity: Vec<usize> = (0..orders.len()).collect();
    population.push(Genome { order_sequence: identity.clone(), variant_sequence: identity.iter().map(|_| 0).collect() });

    let mut spt = identity.clone();
    spt.sort_by(|&a, &b| orders[a].process_time_total.partial_cmp(&orders[b].process_time_total).unwrap_or(std::cmp::Ordering::Equal));
    population.push(Genome { order_sequence: spt.clone(), variant_sequence: spt.iter().map(|_| 0).collect() });

    let mut edd = identity.clone();
    edd.sort_by(|&a, &b| orders[a].due_date.partial_cmp(&orders[b].due_date).unwrap_or(std::cmp::Ordering::Equal));
    population.push(Genome { order_sequence: edd.clone(), variant_sequence: edd.iter().map(|_| 0).collect() });

    while population.len() < size.max(3) {
        population.push(random_genome(orders, rng));
    }
    population.truncate(size.max(1));
    population
}

fn mutate(genome: &mut Genome, orders: &[Order], mutation_rate: f64, variant_mutation_rate: f64, rng: &mut StdRng) {
    let n = genome.order_sequence.len();
    if n >= 2 && rng.random_range(0.0..1.0) < mutation_rate {
        let i = rng.random_range(0..n);
        let j = rng.random_range(0..n);
        genome.order_sequence.swap(i, j);
        genome.variant_sequence.swap(i, j);
    }
    for pos in 0..n {
        if rng.random_range(0.0..1.0) < variant_mutation_rate {
            let bound = variant_bound(orders, genome.order_sequence[pos]);
            genome.variant_sequence[pos] = rng.random_range(0..bound);
        }
    }
}

/// Runs the GA to completion and returns the best genome found as a `Plan`
/// (with its representative timeline populated).
pub fn run_ga(orders: &[Order], cfg: &GaConfig, strategy: EvaluationStrategy, cap_cfg: CapacityConfig, start_time: f64, variance_weight: f64, setup_weight: f64) -> Result<Plan> {
    if orders.is_empty() {
        return Ok(Plan {
            id: "ga-empty".to_string(),
            sequence: Vec::new(),
            variant_choices: BTreeMap::new(),
            timeline: Some(Vec::new()),
            metrics: SimMetrics::default(),
            pareto_rank: None,
            crowding_distance: None,
        });
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut population = init_population(orders, cfg.population, &mut rng);
    let mut cache: HashMap<(Vec<usize>, Vec<usize>), (f64, SimMetrics)> = HashMap::new();

    let mut best_genome = population[0].clone();
    let mut best_fitness = f64::INFINITY;
    let mut best_metrics = SimMetrics::default();

    for generation in 0..cfg.generations.max(1) {
        // Uncached genomes are evaluated concurrently via rayon; the seed passed to
        // each evaluation is derived structurally from (master_seed, generation, genome)
        // so the result is independent of thread scheduling order.
        let uncached: Vec<&Genome> = population.iter().filter(|g| !cache.contains_key(&g.cache_key())).collect();
        let freshly_evaluated: Vec<((Vec<usize>, Vec<usize>), (f64, SimMetrics))> = uncached
            .par_iter()
            .map(|genome| -> Result<_> {
                let evaluated = evaluate_genome(orders, genome, strategy, cap_cfg, start_time, cfg.seed, generation, variance_weight, setup_weight)?;
                Ok((genome.cache_key(), evaluated))
            })
            .collect::<Result<Vec<_>>>()?;
        cache.extend(freshly_evaluated);

        let mut scored: Vec<(Genome, f64, SimMetrics)> = Vec::with_capacity(population.len());
        for genome in &population {
            let (fitness, metrics) = cache.get(&genome.cache_key()).expect("evaluated above").clone();
            if fitness < best_fitness {
                best_fitness = fitness;
                best_genome = genome.clone();
                best_metrics = metrics.clone();
            }
            scored.push((genome.clone(), fitness, metrics));
        }

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let elite_count = cfg.elite.min(scored.len());
        let mut next_population: Vec<Genome> = scored.iter().take(elite_count).map(|(g, _, _)| g.clone()).collect();

        let pool: Vec<&Genome> = scored.iter().take((scored.len() / 2).max(2).min(scored.len())).map(|(g, _, _)| g).collect();
        while next_population.len() < population.len() {
            let parent_a = pool.choose(&mut rng).unwrap_or(&&best_genome);
            let parent_b = pool.choose(&mut rng).unwrap_or(&&best_genome);
            let child_sequence = ox_crossover(&mut rng, &parent_a.order_sequence, &parent_b.order_sequence);
            let pos_of: HashMap<usize, usize> = parent_a.order_sequence.iter().enumerate().map(|(i, &o)| (o, i)).collect();
            let child_variants: Vec<usize> = child_sequence
                .iter()
                .map(|order_idx| {
                    let idx_in_a = pos_of.get(order_idx).copied().unwrap_or(0);
                    parent_a.variant_sequence.get(idx_in_a).copied().unwrap_or(0)
                })
                .collect();
            let mut child = Genome { order_sequence: child_sequence, variant_sequence: child_variants };
            mutate(&mut child, orders, cfg.mutation_rate, cfg.variant_mutation_rate, &mut rng);
            next_population.push(child);
        }

        population = next_population;
    }

    let variant_choices = best_genome.variant_choices(orders);
    let (_, timeline) = capacity_simulator::simulate(orders, &best_genome.order_sequence, &variant_choices, start_time, cap_cfg, true)?;

    Ok(Plan {
        id: "ga-best".to_string(),
        sequence: best_genome.order_sequence,
        variant_choices,
        timeline,
        metrics: best_metrics,
        pareto_rank: None,
        crowding_distance: None,
    })
}
