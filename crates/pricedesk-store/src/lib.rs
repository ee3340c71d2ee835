//! Record store contract and reference backend for pricedesk.
//!
//! The aggregation layer appends price observations here and the service
//! layer reads asset metadata; alert records round out the schema. The
//! production backend is pluggable behind [`AssetStore`].

mod error;
mod memory;
mod models;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{
    AlertCurrency, AlertDirection, AlertPatch, AlertRecord, AssetRecord, NewAlert, NewAsset,
    NewPricePoint, PriceHistoryRecord,
};
pub use store::{AssetStore, StoreFuture};
