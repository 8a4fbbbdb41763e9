//! MRS (mid-range sequencing) request/response wire types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::MrsConfig;

use super::common::{DebugEntryDto, EtaEntryDto, HoldDecisionDto, OrderDto};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MrsInput {
    pub now: f64,
    pub orders: Vec<OrderDto>,
    pub config: MrsConfig,
}

impl Default for MrsInput {
    fn default() -> Self {
        MrsInput { now: 0.0, orders: Vec::new(), config: MrsConfig::default() }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct PriorityDto {
    #[serde(rename = "orderId")]
    pub order_id: String,
    pub priority: f64,
    #[serde(rename = "dueDate")]
    pub due_date: Option<f64>,
    #[serde(rename = "expectedCompletion")]
    pub expected_completion: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RouteDto {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "routeId")]
    pub route_id: String,
    pub operations: Vec<String>,
    #[serde(rename = "expectedStart")]
    pub expected_start: f64,
    #[serde(rename = "expectedEnd")]
    pub expected_end: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct BatchDto {
    pub id: String,
    #[serde(rename = "orderIds")]
    pub order_ids: Vec<String>,
    #[serde(rename = "releaseAt")]
    pub release_at: f64,
    #[serde(rename = "meanPriority")]
    pub mean_priority: f64,
    #[serde(rename = "meanSimilarity")]
    pub mean_similarity: f64,
    #[serde(rename = "jaccardMatrix")]
    pub jaccard_matrix: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct MrsOutput {
    pub priorities: Vec<PriorityDto>,
    pub routes: Vec<RouteDto>,
    pub batches: Vec<BatchDto>,
    #[serde(rename = "releaseList")]
    pub release_list: Vec<String>,
    #[serde(rename = "inputOrderList")]
    pub input_order_list: Vec<String>,
    #[serde(rename = "etaList")]
    pub eta_list: Vec<EtaEntryDto>,
    #[serde(rename = "expectedTardiness")]
    pub expected_tardiness: f64,
    #[serde(rename = "varianceTardiness")]
    pub variance_tardiness: f64,
    #[serde(rename = "chosenVariants")]
    pub chosen_variants: BTreeMap<String, usize>,
    #[serde(rename = "holdDecisions")]
    pub hold_decisions: Vec<HoldDecisionDto>,
    pub debug: Vec<DebugEntryDto>,
}
