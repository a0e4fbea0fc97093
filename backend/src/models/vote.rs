use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single vote reported by the dApp frontend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteEvent {
    pub wallet: String,
    /// Token amount as a JSON number or a numeric string.
    pub amount: Value,
    pub project_name: String,
    pub project_symbol: String,
    #[serde(default)]
    pub round: Option<Value>,
}

impl VoteEvent {
    pub fn amount_as_f64(&self) -> Option<f64> {
        let amount = match &self.amount {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        amount.filter(|v| v.is_finite())
    }

    pub fn round_label(&self) -> Option<String> {
        match self.round.as_ref()? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }
}
