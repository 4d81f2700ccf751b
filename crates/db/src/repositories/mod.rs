mod alert_repo;
mod card_repo;
mod collection_repo;
mod notification_repo;
mod price_history_repo;
mod price_snapshot_repo;
mod search_metric_repo;
mod set_repo;
mod trending_repo;

pub use alert_repo::AlertRepo;
pub use card_repo::CardRepo;
pub use collection_repo::CollectionRepo;
pub use notification_repo::NotificationRepo;
pub use price_history_repo::PriceHistoryRepo;
pub use price_snapshot_repo::PriceSnapshotRepo;
pub use search_metric_repo::SearchMetricRepo;
pub use set_repo::SetRepo;
pub use trending_repo::TrendingRepo;
