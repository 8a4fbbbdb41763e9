//! LRB (long-range batching) request/response wire types.

use serde::{Deserialize, Serialize};

use crate::config::{Forecast, LrbConfig};

use super::common::{DebugEntryDto, EtaEntryDto, HoldDecisionDto, OrderDto};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LrbInput {
    pub now: f64,
    pub orders: Vec<OrderDto>,
    #[serde(rename = "newOrders")]
    pub new_orders: Vec<OrderDto>,
    pub config: LrbConfig,
    pub forecast: Forecast,
    #[serde(rename = "processSequences")]
    pub process_sequences: Option<serde_json::Value>,
}

impl Default for LrbInput {
    fn default() -> Self {
        LrbInput { now: 0.0, orders: Vec::new(), new_orders: Vec::new(), config: LrbConfig::default(), forecast: Forecast::default(), process_sequences: None }
    }
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct BatchDto {
    pub id: String,
    #[serde(rename = "orderIds")]
    pub order_ids: Vec<String>,
    #[serde(rename = "releaseAt")]
    pub release_at: f64,
    #[serde(rename = "windowStartEarliest")]
    pub window_start_earliest: f64,
    #[serde(rename = "windowStartLatest")]
    pub window_start_latest: f64,
    #[serde(rename = "windowEndEarliest")]
    pub window_end_earliest: f64,
    #[serde(rename = "windowEndLatest")]
    pub window_end_latest: f64,
    #[serde(rename = "avgJaccard")]
    pub avg_jaccard: f64,
    #[serde(rename = "jaccardMatrix")]
    pub jaccard_matrix: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct UtilizationBucketDto {
    #[serde(rename = "bucketStart")]
    pub bucket_start: f64,
    #[serde(rename = "bucketEnd")]
    pub bucket_end: f64,
    pub utilization: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct CtpEntryDto {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "promisedEta")]
    pub promised_eta: f64,
    #[serde(rename = "insertedBatchId")]
    pub inserted_batch_id: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct LrbOutput {
    pub batches: Vec<BatchDto>,
    #[serde(rename = "etaList")]
    pub eta_list: Vec<EtaEntryDto>,
    #[serde(rename = "utilizationForecast")]
    pub utilization_forecast: Vec<UtilizationBucketDto>,
    #[serde(rename = "ctpPreview")]
    pub ctp_preview: Vec<CtpEntryDto>,
    #[serde(rename = "deferredOrders")]
    pub deferred_orders: Vec<String>,
    #[serde(rename = "holdDecisions")]
    pub hold_decisions: Vec<HoldDecisionDto>,
    pub debug: Vec<DebugEntryDto>,
}
