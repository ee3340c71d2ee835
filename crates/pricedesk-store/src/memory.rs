use std::sync::RwLock;

use pricedesk_core::{Symbol, UtcDateTime};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    AlertPatch, AlertRecord, AssetRecord, NewAlert, NewAsset, NewPricePoint, PriceHistoryRecord,
};
use crate::store::{AssetStore, StoreFuture};

/// In-memory reference backend.
///
/// Keeps the full contract semantics (server-assigned ids, newest-first
/// history, cascade deletion) without any I/O; the default wiring for the
/// web binary and the backend used by behavioral tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    assets: Vec<AssetRecord>,
    alerts: Vec<AlertRecord>,
    history: Vec<PriceHistoryRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().expect("store lock should not be poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner
            .write()
            .expect("store lock should not be poisoned")
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl AssetStore for MemoryStore {
    fn assets(&self) -> StoreFuture<'_, Vec<AssetRecord>> {
        let assets = self.read().assets.clone();
        Box::pin(async move { Ok(assets) })
    }

    fn asset_by_id<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<AssetRecord>> {
        let found = self.read().assets.iter().find(|a| a.id == id).cloned();
        Box::pin(async move { Ok(found) })
    }

    fn asset_by_symbol<'a>(&'a self, symbol: &'a Symbol) -> StoreFuture<'a, Option<AssetRecord>> {
        let found = self
            .read()
            .assets
            .iter()
            .find(|a| a.symbol == *symbol)
            .cloned();
        Box::pin(async move { Ok(found) })
    }

    fn create_asset(&self, asset: NewAsset) -> StoreFuture<'_, AssetRecord> {
        let record = AssetRecord {
            id: new_id(),
            symbol: asset.symbol,
            name: asset.name,
            kind: asset.kind,
            created_at: UtcDateTime::now(),
        };
        self.write().assets.push(record.clone());
        Box::pin(async move { Ok(record) })
    }

    fn delete_asset<'a>(&'a self, id: &'a str) -> StoreFuture<'a, ()> {
        let result = {
            let mut inner = self.write();
            let before = inner.assets.len();
            inner.assets.retain(|a| a.id != id);

            if inner.assets.len() == before {
                Err(StoreError::asset_not_found(id))
            } else {
                inner.alerts.retain(|alert| alert.asset_id != id);
                inner.history.retain(|entry| entry.asset_id != id);
                Ok(())
            }
        };
        Box::pin(async move { result })
    }

    fn alerts(&self) -> StoreFuture<'_, Vec<AlertRecord>> {
        let alerts = self.read().alerts.clone();
        Box::pin(async move { Ok(alerts) })
    }

    fn alerts_for_asset<'a>(&'a self, asset_id: &'a str) -> StoreFuture<'a, Vec<AlertRecord>> {
        let alerts = self
            .read()
            .alerts
            .iter()
            .filter(|alert| alert.asset_id == asset_id)
            .cloned()
            .collect();
        Box::pin(async move { Ok(alerts) })
    }

    fn create_alert(&self, alert: NewAlert) -> StoreFuture<'_, AlertRecord> {
        let record = AlertRecord {
            id: new_id(),
            asset_id: alert.asset_id,
            direction: alert.direction,
            threshold: alert.threshold,
            currency: alert.currency,
            is_active: alert.is_active,
            is_triggered: false,
            triggered_at: None,
            created_at: UtcDateTime::now(),
        };
        self.write().alerts.push(record.clone());
        Box::pin(async move { Ok(record) })
    }

    fn update_alert<'a>(&'a self, id: &'a str, patch: AlertPatch) -> StoreFuture<'a, AlertRecord> {
        let result = {
            let mut inner = self.write();
            match inner.alerts.iter_mut().find(|alert| alert.id == id) {
                Some(alert) => {
                    if let Some(direction) = patch.direction {
                        alert.direction = direction;
                    }
                    if let Some(threshold) = patch.threshold {
                        alert.threshold = threshold;
                    }
                    if let Some(currency) = patch.currency {
                        alert.currency = currency;
                    }
                    if let Some(is_active) = patch.is_active {
                        alert.is_active = is_active;
                    }
                    if let Some(is_triggered) = patch.is_triggered {
                        alert.is_triggered = is_triggered;
                    }
                    if let Some(triggered_at) = patch.triggered_at {
                        alert.triggered_at = triggered_at;
                    }
                    Ok(alert.clone())
                }
                None => Err(StoreError::alert_not_found(id)),
            }
        };
        Box::pin(async move { result })
    }

    fn delete_alert<'a>(&'a self, id: &'a str) -> StoreFuture<'a, ()> {
        let result = {
            let mut inner = self.write();
            let before = inner.alerts.len();
            inner.alerts.retain(|alert| alert.id != id);

            if inner.alerts.len() == before {
                Err(StoreError::alert_not_found(id))
            } else {
                Ok(())
            }
        };
        Box::pin(async move { result })
    }

    fn price_history<'a>(
        &'a self,
        asset_id: &'a str,
        limit: Option<usize>,
    ) -> StoreFuture<'a, Vec<PriceHistoryRecord>> {
        let mut history: Vec<PriceHistoryRecord> = self
            .read()
            .history
            .iter()
            .filter(|entry| entry.asset_id == asset_id)
            .cloned()
            .collect();

        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = limit {
            history.truncate(limit);
        }

        Box::pin(async move { Ok(history) })
    }

    fn add_price_point(&self, point: NewPricePoint) -> StoreFuture<'_, PriceHistoryRecord> {
        let record = PriceHistoryRecord {
            id: new_id(),
            asset_id: point.asset_id,
            price_usd: point.price_usd,
            price_jpy: point.price_jpy,
            volume: point.volume,
            timestamp: point.timestamp,
        };
        self.write().history.push(record.clone());
        Box::pin(async move { Ok(record) })
    }
}
