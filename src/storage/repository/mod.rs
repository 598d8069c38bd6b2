pub mod market_repo;

pub use market_repo::{DailyRecord, MarketRepository, YearlyRecord};
