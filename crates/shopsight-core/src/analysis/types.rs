//! Analysis response types
//!
//! These mirror the JSON shape the model is asked to produce and are returned
//! to API callers unchanged. Only the three top-level lists are required;
//! any other key the model adds is kept in `extra` and serialized back out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An urgent issue flagged by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisAlert {
    /// Free-form category chosen by the model (e.g. "inventory", "cashflow")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One recommended step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parsed model answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// At most two alerts
    pub alerts: Vec<AnalysisAlert>,
    /// Exactly three insights
    pub insights: Vec<String>,
    /// Exactly three actions
    pub action_plan: Vec<ActionItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
