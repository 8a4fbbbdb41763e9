//! SRFS (short-range fine scheduling) request/response wire types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::SrfsConfig;

use super::common::{DebugEntryDto, EtaEntryDto, HoldDecisionDto, OrderDto};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SrfsInput {
    #[serde(rename = "startTime")]
    pub start_time: f64,
    pub orders: Vec<OrderDto>,
    pub config: SrfsConfig,
}

impl Default for SrfsInput {
    fn default() -> Self {
        SrfsInput { start_time: 0.0, orders: Vec::new(), config: SrfsConfig::default() }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ScheduledOpDto {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "opId")]
    pub op_id: String,
    pub start: f64,
    pub end: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct ParetoEntryDto {
    pub id: String,
    pub sequence: Vec<String>,
    #[serde(rename = "variantChoices")]
    pub variant_choices: BTreeMap<String, usize>,
    pub operations: Vec<ScheduledOpDto>,
    #[serde(rename = "objectiveValues")]
    pub objective_values: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SrfsOutput {
    #[serde(rename = "paretoSet")]
    pub pareto_set: Vec<ParetoEntryDto>,
    #[serde(rename = "selectedPlanId")]
    pub selected_plan_id: Option<String>,
    #[serde(rename = "selectedVariantChoices")]
    pub selected_variant_choices: BTreeMap<String, usize>,
    #[serde(rename = "releasedOps")]
    pub released_ops: Vec<String>,
    #[serde(rename = "inputOrderList")]
    pub input_order_list: Vec<String>,
    #[serde(rename = "releaseList")]
    pub release_list: Vec<String>,
    #[serde(rename = "etaList")]
    pub eta_list: Vec<EtaEntryDto>,
    #[serde(rename = "holdDecisions")]
    pub hold_decisions: Vec<HoldDecisionDto>,
    pub debug: Vec<DebugEntryDto>,
}
