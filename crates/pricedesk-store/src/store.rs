use std::future::Future;
use std::pin::Pin;

use pricedesk_core::Symbol;

use crate::error::StoreError;
use crate::models::{
    AlertPatch, AlertRecord, AssetRecord, NewAlert, NewAsset, NewPricePoint, PriceHistoryRecord,
};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Record store contract consumed by the aggregation layer and its callers.
///
/// Backends are pluggable; this workspace ships an in-memory reference
/// implementation, and a remote backend only has to honor the same
/// semantics: server-assigned ids, newest-first history reads, and
/// cascade deletion of an asset's alerts and history.
pub trait AssetStore: Send + Sync {
    fn assets(&self) -> StoreFuture<'_, Vec<AssetRecord>>;

    fn asset_by_id<'a>(&'a self, id: &'a str) -> StoreFuture<'a, Option<AssetRecord>>;

    /// Case-insensitive symbol lookup (symbols are stored normalized).
    fn asset_by_symbol<'a>(&'a self, symbol: &'a Symbol) -> StoreFuture<'a, Option<AssetRecord>>;

    fn create_asset(&self, asset: NewAsset) -> StoreFuture<'_, AssetRecord>;

    /// Deletes the asset and, transactionally from the caller's view, every
    /// alert and price-history record that references it.
    fn delete_asset<'a>(&'a self, id: &'a str) -> StoreFuture<'a, ()>;

    fn alerts(&self) -> StoreFuture<'_, Vec<AlertRecord>>;

    fn alerts_for_asset<'a>(&'a self, asset_id: &'a str) -> StoreFuture<'a, Vec<AlertRecord>>;

    fn create_alert(&self, alert: NewAlert) -> StoreFuture<'_, AlertRecord>;

    fn update_alert<'a>(&'a self, id: &'a str, patch: AlertPatch) -> StoreFuture<'a, AlertRecord>;

    fn delete_alert<'a>(&'a self, id: &'a str) -> StoreFuture<'a, ()>;

    /// History for one asset, newest first, optionally truncated.
    fn price_history<'a>(
        &'a self,
        asset_id: &'a str,
        limit: Option<usize>,
    ) -> StoreFuture<'a, Vec<PriceHistoryRecord>>;

    /// Append-only write; entries are never updated afterwards.
    fn add_price_point(&self, point: NewPricePoint) -> StoreFuture<'_, PriceHistoryRecord>;
}
