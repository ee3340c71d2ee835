mod models;
mod symbol;
mod timestamp;

pub use models::{AssetKind, AssetPrice, HistoryPoint};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
