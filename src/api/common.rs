use serde::{Deserialize, Serialize};

/// Wire representation of an `Operation`, shared by the MRS and SRFS request
/// bodies. Field names match the upstream planning system's JSON payload
/// exactly so requests can be forwarded without reshaping.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OperationDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "stationId", default)]
    pub station_id: Option<String>,
    #[serde(rename = "expectedDuration", default)]
    pub expected_duration: Option<f64>,
    #[serde(default)]
    pub meta: Option<OperationMetaDto>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "setupFamily", default)]
    pub setup_family: Option<String>,
    #[serde(default)]
    pub bg: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OperationMetaDto {
    #[serde(default)]
    pub step: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SequenceStepsDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct SequenceBlockDto {
    #[serde(default)]
    pub sequences: Vec<SequenceStepsDto>,
}

/// `processSequences` payload: `{baugruppentypen: {...}, baugruppen: {...}}`.
/// Some producers send this as a JSON string rather than a nested object, so
/// the loader tolerates both.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProcessSequencesDto {
    #[serde(default)]
    pub baugruppentypen: Option<SequenceBlockDto>,
    #[serde(default)]
    pub baugruppen: Option<SequenceBlockDto>,
}

/// Generic order wire shape covering the union of fields used by LRB, MRS
/// and SRFS. Each stage's loader only reads the subset it needs.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct OrderDto {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "dueDate", default)]
    pub due_date: Option<f64>,
    #[serde(rename = "readyAt", default)]
    pub ready_at: Option<f64>,
    #[serde(rename = "processTimeDem", default)]
    pub process_time_dem: Option<f64>,
    #[serde(rename = "processTimeMon", default)]
    pub process_time_mon: Option<f64>,
    #[serde(rename = "demOps", default)]
    pub dem_ops: Option<Vec<OperationDto>>,
    #[serde(rename = "monOps", default)]
    pub mon_ops: Option<Vec<OperationDto>>,
    #[serde(default)]
    pub operations: Option<Vec<OperationDto>>,
    #[serde(rename = "processSequences", default)]
    pub process_sequences: Option<serde_json::Value>,
    #[serde(default)]
    pub sequences: Option<serde_json::Value>,
    #[serde(rename = "deferredCount", default)]
    pub deferred_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HoldDecisionDto {
    #[serde(rename = "orderId")]
    pub order_id: String,
    #[serde(rename = "holdUntilSimMinute")]
    pub hold_until_sim_minute: f64,
    #[serde(rename = "holdReason")]
    pub hold_reason: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DebugEntryDto {
    pub stage: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct EtaEntryDto {
    #[serde(rename = "orderId")]
    pub order_id: String,
    pub eta: f64,
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct FactoryCapacityDto {
    #[serde(rename = "demontageStationen", default)]
    pub demontage_stationen: Option<usize>,
    #[serde(rename = "montageStationen", default)]
    pub montage_stationen: Option<usize>,
}
