//! Account-level settings record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Remote-backed settings, one record per account.
///
/// The server is the source of truth: every successful update replaces the
/// cached record wholesale with the server's response, never a client-side
/// merge (the server may derive or round fields such as `updated_at`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    /// Currency display format selector (e.g. "dot_separator")
    pub currency_format: String,
    /// Date display format selector
    pub date_format: String,
    /// USD to VND exchange rate; precision rules are server-owned
    pub usd_to_vnd_rate: f64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial settings change for `PUT /settings`. Absent fields are left
/// unchanged server-side.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usd_to_vnd_rate: Option<f64>,
}
