use serde::{Deserialize, Serialize};

use pricedesk_core::{AssetKind, Symbol, UtcDateTime};

/// A tracked instrument. Owns its alerts and price history; deleting the
/// asset cascades to both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub symbol: Symbol,
    pub name: String,
    pub kind: AssetKind,
    pub created_at: UtcDateTime,
}

/// Input for asset creation; id and created_at are store-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAsset {
    pub symbol: Symbol,
    pub name: String,
    pub kind: AssetKind,
}

/// Whether an alert fires above or below its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    High,
    Low,
}

/// Currency the alert threshold is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertCurrency {
    Usd,
    Jpy,
}

/// User-configured price alert.
///
/// `is_triggered`/`triggered_at` are bookkeeping fields mutated through
/// [`AlertPatch`]; no component in this workspace evaluates alerts against
/// live prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub asset_id: String,
    pub direction: AlertDirection,
    pub threshold: f64,
    pub currency: AlertCurrency,
    pub is_active: bool,
    pub is_triggered: bool,
    pub triggered_at: Option<UtcDateTime>,
    pub created_at: UtcDateTime,
}

/// Input for alert creation; id and created_at are store-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub asset_id: String,
    pub direction: AlertDirection,
    pub threshold: f64,
    pub currency: AlertCurrency,
    pub is_active: bool,
}

/// Partial alert update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertPatch {
    pub direction: Option<AlertDirection>,
    pub threshold: Option<f64>,
    pub currency: Option<AlertCurrency>,
    pub is_active: Option<bool>,
    pub is_triggered: Option<bool>,
    pub triggered_at: Option<Option<UtcDateTime>>,
}

/// One appended price observation. Never updated after creation; removed
/// only when the owning asset is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryRecord {
    pub id: String,
    pub asset_id: String,
    pub price_usd: f64,
    pub price_jpy: f64,
    pub volume: Option<u64>,
    pub timestamp: UtcDateTime,
}

/// Input for a history append; the id is store-assigned, the timestamp is
/// the caller's observation time so both currency columns stay tied to the
/// quote instant they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPricePoint {
    pub asset_id: String,
    pub price_usd: f64,
    pub price_jpy: f64,
    pub volume: Option<u64>,
    pub timestamp: UtcDateTime,
}
