//! Stage configuration structs. Every field carries a sane `Default`, and
//! every stage config deserializes leniently (`#[serde(default)]`
//! throughout) so a caller may omit any subsection and still get sane
//! behavior.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SetupConfig {
    #[serde(rename = "minBatch")]
    pub min_batch: usize,
    #[serde(rename = "qMin")]
    pub q_min: usize,
    #[serde(rename = "qMax")]
    pub q_max: usize,
}

impl Default for SetupConfig {
    fn default() -> Self {
        SetupConfig { min_batch: 2, q_min: 2, q_max: 7 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeferConfig {
    pub enable: bool,
    #[serde(rename = "bufferPct")]
    pub buffer_pct: f64,
    #[serde(rename = "maxHoldDays")]
    pub max_hold_days: f64,
    #[serde(rename = "serviceWindowDays")]
    pub service_window_days: f64,
    #[serde(rename = "kMaxDefers")]
    pub k_max_defers: u32,
    pub gamma: f64,
    #[serde(rename = "lamSim")]
    pub lam_sim: f64,
    #[serde(rename = "lamUrg")]
    pub lam_urg: f64,
    #[serde(rename = "lamCap")]
    pub lam_cap: f64,
    #[serde(rename = "utilAdjustK")]
    pub util_adjust_k: f64,
}

impl Default for DeferConfig {
    fn default() -> Self {
        DeferConfig {
            enable: true,
            buffer_pct: 0.15,
            max_hold_days: 14.0,
            service_window_days: 21.0,
            k_max_defers: 3,
            gamma: 2.0,
            lam_sim: 1.0,
            lam_urg: 1.0,
            lam_cap: 0.5,
            util_adjust_k: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WindowsConfig {
    pub alpha: f64,
    pub beta: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LrbConfig {
    #[serde(rename = "intervalMinutes")]
    pub interval_minutes: f64,
    pub machines: usize,
    #[serde(rename = "shiftMinutesPerDay")]
    pub shift_minutes_per_day: f64,
    #[serde(rename = "targetUtil")]
    pub target_util: f64,
    #[serde(rename = "jaccardThreshold")]
    pub jaccard_threshold: f64,
    pub setup: SetupConfig,
    pub defer: DeferConfig,
    pub windows: WindowsConfig,
    #[serde(rename = "ctpMaxSlots")]
    pub ctp_max_slots: usize,
}

impl Default for LrbConfig {
    fn default() -> Self {
        LrbConfig {
            interval_minutes: 120.0,
            machines: 1,
            shift_minutes_per_day: 480.0,
            target_util: 0.5,
            jaccard_threshold: 0.3,
            setup: SetupConfig::default(),
            defer: DeferConfig::default(),
            windows: WindowsConfig::default(),
            ctp_max_slots: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ForecastVariant {
    pub id: String,
    #[serde(rename = "lambda_per_T")]
    pub lambda_per_t: f64,
    #[serde(default)]
    pub proto_steps: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Forecast {
    pub variants: Vec<ForecastVariant>,
    pub cv_arrival: f64,
}

impl Default for Forecast {
    fn default() -> Self {
        Forecast {
            variants: vec![ForecastVariant {
                id: "proto-default".to_string(),
                lambda_per_t: 0.5,
                proto_steps: vec!["PS-Fahrwerk".to_string(), "PS-Antrieb".to_string(), "PS-Chassis".to_string()],
            }],
            cv_arrival: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FactoryCapacity {
    #[serde(rename = "demontageStationen")]
    pub demontage_stationen: usize,
    #[serde(rename = "montageStationen")]
    pub montage_stationen: usize,
}

impl Default for FactoryCapacity {
    fn default() -> Self {
        FactoryCapacity { demontage_stationen: 2, montage_stationen: 2 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GaConfig {
    pub population: usize,
    pub generations: usize,
    #[serde(rename = "mutationRate")]
    pub mutation_rate: f64,
    #[serde(rename = "variantMutationRate")]
    pub variant_mutation_rate: f64,
    pub elite: usize,
    pub replications: usize,
    pub seed: u64,
}

impl Default for GaConfig {
    fn default() -> Self {
        GaConfig { population: 30, generations: 50, mutation_rate: 0.1, variant_mutation_rate: 0.15, elite: 2, replications: 20, seed: 42 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MrsConfig {
    #[serde(rename = "qMin")]
    pub q_min: usize,
    #[serde(rename = "qMax")]
    pub q_max: usize,
    #[serde(rename = "horizonMinutes")]
    pub horizon_minutes: f64,
    #[serde(rename = "varianceWeight")]
    pub variance_weight: f64,
    #[serde(rename = "setupWeight")]
    pub setup_weight: f64,
    #[serde(rename = "factoryCapacity")]
    pub factory_capacity: Option<FactoryCapacity>,
    /// Percent (0-100) as received on the wire; divide by 100 at the
    /// `CapacityConfig` boundary, matching `dem_flex_share = ... / 100.0`.
    #[serde(rename = "demFlexSharePct")]
    pub dem_flex_share_pct: f64,
    #[serde(rename = "monFlexSharePct")]
    pub mon_flex_share_pct: f64,
    #[serde(rename = "setupMinutes")]
    pub setup_minutes: f64,
    pub ga: GaConfig,
    /// When true, replaces a caller-provided due date with
    /// `min(provided, ready + 0.85 * total)`, deliberately forcing
    /// non-trivial tardiness signal into the fitness function.
    #[serde(rename = "tightDueDate")]
    pub tight_due_date: bool,
}

impl Default for MrsConfig {
    fn default() -> Self {
        MrsConfig {
            q_min: 2,
            q_max: 7,
            horizon_minutes: 1440.0,
            variance_weight: 0.2,
            setup_weight: 0.1,
            factory_capacity: None,
            dem_flex_share_pct: 30.0,
            mon_flex_share_pct: 30.0,
            setup_minutes: 15.0,
            ga: GaConfig::default(),
            tight_due_date: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub makespan: f64,
    pub tardiness: f64,
    #[serde(rename = "idleTime")]
    pub idle_time: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        ObjectiveWeights { makespan: 0.34, tardiness: 0.33, idle_time: 0.33 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SrfsConfig {
    #[serde(rename = "HMS")]
    pub hms: usize,
    pub iterations: usize,
    #[serde(rename = "candidatesPerIter")]
    pub candidates_per_iter: usize,
    #[serde(rename = "maxPareto")]
    pub max_pareto: usize,
    #[serde(rename = "releaseFraction")]
    pub release_fraction: f64,
    pub weights: ObjectiveWeights,
    #[serde(rename = "HMCRmin")]
    pub hmcr_min: f64,
    #[serde(rename = "HMCRmax")]
    pub hmcr_max: f64,
    #[serde(rename = "PARmin")]
    pub par_min: f64,
    #[serde(rename = "PARmax")]
    pub par_max: f64,
    pub seed: u64,
    #[serde(rename = "factoryCapacity")]
    pub factory_capacity: Option<FactoryCapacity>,
    #[serde(rename = "demFlexSharePct")]
    pub dem_flex_share_pct: f64,
    #[serde(rename = "monFlexSharePct")]
    pub mon_flex_share_pct: f64,
    #[serde(rename = "setupMinutes")]
    pub setup_minutes: f64,
}

impl Default for SrfsConfig {
    fn default() -> Self {
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
            seed: 42,
            factory_capacity: None,
            dem_flex_share_pct: 30.0,
            mon_flex_share_pct: 30.0,
            setup_minutes: 15.0,
        }
    }
}

/// Hold-admission thresholds shared by all three stages.
#[derive(Debug, Clone)]
pub struct HoldConfig {
    pub utilization_threshold: f64,
    pub cycle_minutes: f64,
}

impl Default for HoldConfig {
    fn default() -> Self {
        HoldConfig { utilization_threshold: 0.8, cycle_minutes: 120.0 }
    }
}
