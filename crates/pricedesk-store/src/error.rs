use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn asset_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "asset",
            id: id.into(),
        }
    }

    pub fn alert_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "alert",
            id: id.into(),
        }
    }
}
