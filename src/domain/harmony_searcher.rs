//! Short-range fine scheduling: multi-objective harmony search over the
//! same order+variant genome used by the GA, producing a Pareto front
//! instead of a single best. Memory harmonies are ranked by non-dominated
//! sort plus crowding distance each iteration; the final front is trimmed
//! to `maxPareto` and one plan is selected by a configured weighted sum.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{ObjectiveWeights, SrfsConfig};
use crate::error::Result;

use super::capacity_simulator::{self, CapacityConfig};
use super::genetic_optimizer::{self, Genome};
use super::order::Order;
use super::plan::{Plan, SimMetrics};

/// `(makespan, tardiness, idleTime)` — the three objectives ranked by
/// non-dominated sort, all minimized.
fn objectives(metrics: &SimMetrics) -> [f64; 3] {
    [metrics.makespan, metrics.tardiness, metrics.idle_time]
}

fn dominates(a: &[f64; 3], b: &[f64; 3]) -> bool {
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

/// NSGA-II style non-dominated sort; returns each entry's front rank (1 =
/// first/best front).
fn non_dominated_ranks(objs: &[[f64; 3]]) -> Vec<usize> {
    let n = objs.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count = vec![0usize; n];
    let mut ranks = vec![0usize; n];

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            if dominates(&objs[i], &objs[j]) {
                dominated_by[i].push(j);
            } else if dominates(&objs[j], &objs[i]) {
                domination_count[i] += 1;
            }
        }
    }

    let mut current_front: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    let mut rank = 1;
    while !current_front.is_empty() {
        let mut next_front = Vec::new();
        for &i in &current_front {
            ranks[i] = rank;
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next_front.push(j);
                }
            }
        }
        rank += 1;
        current_front = next_front;
    }
    ranks
}

/// NSGA-II crowding distance within each front (by rank), boundary points
/// get `f64::INFINITY`.
fn crowding_distances(objs: &[[f64; 3]], ranks: &[usize]) -> Vec<f64> {
    let n = objs.len();
    let mut distances = vec![0.0; n];
    let max_rank = ranks.iter().copied().max().unwrap_or(0);

    for r in 1..=max_rank {
        let members: Vec<usize> = (0..n).filter(|&i| ranks[i] == r).collect();
        if members.len() <= 2 {
            for &i in &members {
                distances[i] = f64::INFINITY;
            }
            continue;
        }
        for obj_idx in 0..3 {
            let mut sorted = members.clone();
            sorted.sort_by(|&a, &b| objs[a][obj_idx].partial_cmp(&objs[b][obj_idx]).unwrap_or(std::cmp::Ordering::Equal));
            let min_v = objs[sorted[0]][obj_idx];
            let max_v = objs[sorted[sorted.len() - 1]][obj_idx];
            distances[sorted[0]] = f64::INFINITY;
            distances[sorted[sorted.len() - 1]] = f64::INFINITY;
            let span = (max_v - min_v).max(1e-9);
            for w in 1..sorted.len() - 1 {
                let prev = objs[sorted[w - 1]][obj_idx];
                let next = objs[sorted[w + 1]][obj_idx];
                if distances[sorted[w]].is_finite() {
                    distances[sorted[w]] += (next - prev) / span;
                }
            }
        }
    }
    distances
}

/// Average fraction of positions at which two harmonies' order sequences
/// disagree, averaged pairwise across the whole memory. 0 = identical
/// memory, 1 = maximally diverse.
fn memory_diversity(genomes: &[Genome]) -> f64 {
    let n = genomes.len();
    if n < 2 {
        return 1.0;
    }
    let len = genomes[0].order_sequence.len().max(1);
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            let differing = genomes[i].order_sequence.iter().zip(genomes[j].order_sequence.iter()).filter(|(a, b)| a != b).count();
            total += differing as f64 / len as f64;
            pairs += 1;
        }
    }
    if pairs == 0 { 1.0 } else { total / pairs as f64 }
}

fn multi_swap(genome: &mut Genome, rng: &mut StdRng, count: usize) {
    let n = genome.order_sequence.len();
    if n < 2 {
        return;
    }
    for _ in 0..count {
        let i = rng.random_range(0..n);
        let j = rng.random_range(0..n);
        genome.order_sequence.swap(i, j);
        genome.variant_sequence.swap(i, j);
    }
}

fn segment_inversion(genome: &mut Genome, rng: &mut StdRng) {
    let n = genome.order_sequence.len();
    if n < 2 {
        return;
    }
    let mut i = rng.random_range(0..n);
    let mut j = rng.random_range(0..n);
    if i > j {
        std::mem::swap(&mut i, &mut j);
    }
    genome.order_sequence[i..=j].reverse();
    genome.variant_sequence[i..=j].reverse();
}

/// How often each variant index is currently in use across the memory for
/// a given order, used to bias pitch adjustment toward rarer choices.
fn variant_usage(memory: &[Genome], order_idx: usize, bound: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bound];
    for g in memory {
        for (&oi, &v) in g.order_sequence.iter().zip(g.variant_sequence.iter()) {
            if oi == order_idx && v < bound {
                counts[v] += 1;
            }
        }
    }
    counts
}

/// Samples a variant index inversely weighted by its current usage in
/// `memory` — rarer choices are more likely, biasing pitch adjustment
/// toward variant diversity rather than re-picking whatever is already
/// common.
fn rare_variant_choice(memory: &[Genome], orders: &[Order], order_idx: usize, rng: &mut StdRng) -> usize {
    let bound = genetic_optimizer::variant_bound(orders, order_idx);
    if bound <= 1 {
        return 0;
    }
    let counts = variant_usage(memory, order_idx, bound);
    let weights: Vec<f64> = counts.iter().map(|&c| 1.0 / (1.0 + c as f64)).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.random_range(0..bound);
    }
    let mut threshold = rng.random_range(0.0..total);
    for (v, w) in weights.iter().enumerate() {
        if threshold < *w {
            return v;
        }
        threshold -= w;
    }
    bound - 1
}

fn long_distance_variant_jump(genome: &mut Genome, orders: &[Order], memory: &[Genome], rng: &mut StdRng) {
    let n = genome.order_sequence.len();
    if n == 0 {
        return;
    }
    let pos = rng.random_range(0..n);
    genome.variant_sequence[pos] = rare_variant_choice(memory, orders, genome.order_sequence[pos], rng);
}

fn contiguous_variant_reset_block(genome: &mut Genome, orders: &[Order], memory: &[Genome], rng: &mut StdRng) {
    let n = genome.order_sequence.len();
    if n == 0 {
        return;
    }
    let start = rng.random_range(0..n);
    let block_len = rng.random_range(1..=n.min(3));
    for offset in 0..block_len {
        let pos = (start + offset) % n;
        genome.variant_sequence[pos] = rare_variant_choice(memory, orders, genome.order_sequence[pos], rng);
    }
}

/// Applies pitch adjustment with probability `par`, picking one of the four
/// perturbation operators uniformly. The two variant-touching operators are
/// biased toward rarer variant choices already present in `memory`.
fn pitch_adjust(genome: &mut Genome, orders: &[Order], memory: &[Genome], par: f64, rng: &mut StdRng) {
    if rng.random_range(0.0..1.0) >= par {
        return;
    }
    match rng.random_range(0..4) {
        0 => multi_swap(genome, rng, 2),
        1 => segment_inversion(genome, rng),
        2 => long_distance_variant_jump(genome, orders, memory, rng),
        _ => contiguous_variant_reset_block(genome, orders, memory, rng),
    }
}

/// Picks a memory harmony weighted toward better-ranked entries — `memory`
/// is kept front-sorted by (Pareto rank, crowding distance) after each
/// rebuild, so index 0 is always at least as good as index 1, etc.
fn weighted_memory_pick<'a>(memory: &'a [Genome], rng: &mut StdRng) -> &'a Genome {
    let weights: Vec<f64> = (0..memory.len()).map(|i| 1.0 / (1.0 + i as f64)).collect();
    let total: f64 = weights.iter().sum();
    let mut threshold = rng.random_range(0.0..total.max(1e-9));
    for (i, w) in weights.iter().enumerate() {
        if threshold < *w {
            return &memory[i];
        }
        threshold -= w;
    }
    &memory[memory.len() - 1]
}

fn improvise(memory: &[Genome], orders: &[Order], hmcr: f64, par: f64, rng: &mut StdRng) -> Genome {
    let mut candidate = if rng.random_range(0.0..1.0) < hmcr {
        weighted_memory_pick(memory, rng).clone()
    } else {
        genetic_optimizer::random_genome(orders, rng)
    };
    pitch_adjust(&mut candidate, orders, memory, par, rng);
    candidate
}

fn simulate_metrics(orders: &[Order], genome: &Genome, cap_cfg: CapacityConfig, start_time: f64) -> Result<SimMetrics> {
    let variant_choices: BTreeMap<String, usize> = genome.order_sequence.iter().zip(genome.variant_sequence.iter()).map(|(&oi, &v)| (orders[oi].id.clone(), v)).collect();
    let (metrics, _) = capacity_simulator::simulate(orders, &genome.order_sequence, &variant_choices, start_time, cap_cfg, false)?;
    Ok(metrics)
}

/// Evaluates every genome in `pool` not already present in `cache`, running the
/// uncached subset concurrently via rayon (each simulation is independent and
/// keyed only by genome contents, so evaluation order never affects the result),
/// then returns the metrics for the whole pool in order.
fn evaluate_pool(pool: &[Genome], orders: &[Order], cap_cfg: CapacityConfig, start_time: f64, cache: &mut HashMap<(Vec<usize>, Vec<usize>), SimMetrics>) -> Result<Vec<SimMetrics>> {
    let uncached: Vec<&Genome> = pool.iter().filter(|g| !cache.contains_key(&(g.order_sequence.clone(), g.variant_sequence.clone()))).collect();
    let freshly_evaluated: Vec<((Vec<usize>, Vec<usize>), SimMetrics)> = uncached
        .par_iter()
        .map(|genome| -> Result<_> {
            let key = (genome.order_sequence.clone(), genome.variant_sequence.clone());
            let metrics = simulate_metrics(orders, genome, cap_cfg, start_time)?;
            Ok((key, metrics))
        })
        .collect::<Result<Vec<_>>>()?;
    cache.extend(freshly_evaluated);

    Ok(pool.iter().map(|g| cache.get(&(g.order_sequence.clone(), g.variant_sequence.clone())).expect("evaluated above").clone()).collect())
}

fn weighted_scalar(metrics: &SimMetrics, weights: &ObjectiveWeights) -> f64 {
    weights.makespan * metrics.makespan + weights.tardiness * metrics.tardiness + weights.idle_time * metrics.idle_time
}

/// A point on (or near) the Pareto front: the plan plus its rank/crowding.
pub struct SrfsResult {
    pub pareto_set: Vec<Plan>,
    pub selected: Option<Plan>,
    pub released_ops: Vec<String>,
}

/// Runs harmony search to `cfg.iterations`, returning the final
/// non-dominated front plus a weighted-sum-selected plan and the set of
/// operation ids released under `releaseFraction`.
pub fn run_harmony_search(orders: &[Order], cfg: &SrfsConfig, cap_cfg: CapacityConfig, start_time: f64) -> Result<SrfsResult> {
    if orders.is_empty() {
        return Ok(SrfsResult { pareto_set: Vec::new(), selected: None, released_ops: Vec::new() });
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut memory: Vec<Genome> = genetic_optimizer::init_population(orders, cfg.hms.max(3), &mut rng);

    let mut eval_cache: HashMap<(Vec<usize>, Vec<usize>), SimMetrics> = HashMap::new();

    for _ in 0..cfg.iterations {
        let diversity = memory_diversity(&memory);
        let similarity = 1.0 - diversity;
        let hmcr = cfg.hmcr_max - (cfg.hmcr_max - cfg.hmcr_min) * similarity;
        let par = cfg.par_min + (cfg.par_max - cfg.par_min) * similarity.powf(0.7);

        let mut candidates = Vec::with_capacity(cfg.candidates_per_iter);
        for _ in 0..cfg.candidates_per_iter.max(1) {
            candidates.push(improvise(&memory, orders, hmcr, par, &mut rng));
        }

        let mut pool = memory.clone();
        pool.extend(candidates);

        let metrics_by_genome = evaluate_pool(&pool, orders, cap_cfg, start_time, &mut eval_cache)?;

        let objs: Vec<[f64; 3]> = metrics_by_genome.iter().map(objectives).collect();
        let ranks = non_dominated_ranks(&objs);
        let distances = crowding_distances(&objs, &ranks);

        let mut indices: Vec<usize> = (0..pool.len()).collect();
        indices.sort_by(|&a, &b| {
            ranks[a].cmp(&ranks[b]).then_with(|| distances[b].partial_cmp(&distances[a]).unwrap_or(std::cmp::Ordering::Equal))
        });
        indices.truncate(cfg.hms.max(1));
        memory = indices.iter().map(|&i| pool[i].clone()).collect();
    }

    let metrics_by_genome = evaluate_pool(&memory, orders, cap_cfg, start_time, &mut eval_cache)?;
    let objs: Vec<[f64; 3]> = metrics_by_genome.iter().map(objectives).collect();
    let ranks = non_dominated_ranks(&objs);
    let distances = crowding_distances(&objs, &ranks);

    let mut pareto_set = Vec::new();
    let mut best_scalar = f64::INFINITY;
    let mut selected: Option<Plan> = None;

    for (idx, genome) in memory.iter().enumerate() {
        let variant_choices: BTreeMap<String, usize> = genome.order_sequence.iter().zip(genome.variant_sequence.iter()).map(|(&oi, &v)| (orders[oi].id.clone(), v)).collect();
        let metrics = metrics_by_genome[idx].clone();
        let (_, timeline) = capacity_simulator::simulate(orders, &genome.order_sequence, &variant_choices, start_time, cap_cfg, true)?;
        let plan = Plan {
            id: format!("hs-plan-{idx}"),
            sequence: genome.order_sequence.clone(),
            variant_choices: variant_choices.clone(),
            timeline,
            metrics: metrics.clone(),
            pareto_rank: Some(ranks[idx]),
            crowding_distance: Some(distances[idx]),
        };

        if ranks[idx] == 1 {
            let scalar = weighted_scalar(&metrics, &cfg.weights);
            if scalar < best_scalar {
                best_scalar = scalar;
                selected = Some(plan.clone());
            }
            pareto_set.push(plan);
        }
    }

    pareto_set.sort_by(|a, b| {
        b.crowding_distance.unwrap_or(0.0).partial_cmp(&a.crowding_distance.unwrap_or(0.0)).unwrap_or(std::cmp::Ordering::Equal)
    });
    pareto_set.truncate(cfg.max_pareto.max(1));

    let released_ops = if let Some(plan) = &selected {
        let mut ops: Vec<(f64, String)> = plan
            .timeline
            .as_ref()
            .map(|t| t.iter().map(|op| (op.start, op.op_id.clone())).collect())
            .unwrap_or_default();
        ops.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let cutoff = ((ops.len() as f64) * cfg.release_fraction.clamp(0.0, 1.0)).ceil() as usize;
        ops.into_iter().take(cutoff).map(|(_, id)| id).collect()
    } else {
        Vec::new()
    };

    Ok(SrfsResult { pareto_set, selected, released_ops })
}
