use std::sync::Arc;

use pricedesk_core::PriceService;
use pricedesk_store::AssetStore;

/// Shared service handles for the route handlers.
pub struct AppState {
    pub prices: PriceService,
    pub store: Arc<dyn AssetStore>,
}

impl AppState {
    pub fn new(prices: PriceService, store: Arc<dyn AssetStore>) -> Arc<Self> {
        Arc::new(Self { prices, store })
    }
}
