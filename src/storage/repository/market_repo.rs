use crate::storage::entity::daily_data::{self, Entity as DailyData, Model as DailyModel};
use crate::storage::entity::yearly_data::{Entity as YearlyData, Model as YearlyModel};
use chrono::NaiveDate;
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};

/// yearly_data 的一行
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct YearlyRecord {
    pub symbol: String,
    pub company: String,
    pub sector: String,
    pub avg_price: f64,
    pub avg_volume: f64,
    pub yearly_return: f64,
    pub volatility: f64,
}

impl From<YearlyModel> for YearlyRecord {
    fn from(model: YearlyModel) -> Self {
        Self {
            symbol: model.symbol,
            company: model.company,
            sector: model.sector,
            avg_price: model.avg_price,
            avg_volume: model.avg_volume,
            yearly_return: model.yearly_return,
            volatility: model.volatility,
        }
    }
}

/// daily_data 的一行
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: i64,
    pub symbol: String,
    pub daily_return: Option<f64>,
    pub cumulative_return: Option<f64>,
}

impl From<DailyModel> for DailyRecord {
    fn from(model: DailyModel) -> Self {
        Self {
            date: model.date,
            open: model.open,
            close: model.close,
            high: model.high,
            low: model.low,
            volume: model.volume,
            symbol: model.symbol,
            daily_return: model.daily_returns,
            cumulative_return: model.cumulative_return_daily,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub yearly: u64,
    pub daily: u64,
}

pub struct MarketRepository;

impl MarketRepository {
    /// 不加排序，保持存储返回的顺序（排名并列时依赖它）
    pub async fn load_yearly(db: &DatabaseConnection) -> Result<Vec<YearlyRecord>, sea_orm::DbErr> {
        let rows = YearlyData::find().all(db).await?;
        Ok(rows.into_iter().map(YearlyRecord::from).collect())
    }

    pub async fn load_daily(db: &DatabaseConnection) -> Result<Vec<DailyRecord>, sea_orm::DbErr> {
        let rows = DailyData::find()
            .order_by_asc(daily_data::Column::Symbol)
            .order_by_asc(daily_data::Column::Date)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(DailyRecord::from).collect())
    }

    pub async fn count_rows(db: &DatabaseConnection) -> Result<RowCounts, sea_orm::DbErr> {
        let yearly = YearlyData::find().count(db).await?;
        let daily = DailyData::find().count(db).await?;
        Ok(RowCounts { yearly, daily })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::connection::{create_schema, establish_connection};
    use crate::storage::entity::{daily_data, yearly_data};
    use sea_orm::{ConnectionTrait, Set, Statement};

    async fn memory_db() -> DatabaseConnection {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        create_schema(&db).await.unwrap();
        db
    }

    fn yearly(symbol: &str, sector: &str, ret: f64) -> yearly_data::ActiveModel {
        yearly_data::ActiveModel {
            symbol: Set(symbol.to_string()),
            company: Set(format!("{} Ltd", symbol)),
            sector: Set(sector.to_string()),
            avg_price: Set(1000.0),
            avg_volume: Set(250_000.0),
            yearly_return: Set(ret),
            volatility: Set(0.02),
        }
    }

    fn daily(symbol: &str, date: &str, close: f64, ret: Option<f64>) -> daily_data::ActiveModel {
        daily_data::ActiveModel {
            symbol: Set(symbol.to_string()),
            date: Set(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()),
            open: Set(close),
            close: Set(close),
            high: Set(close + 1.0),
            low: Set(close - 1.0),
            volume: Set(10_000),
            daily_returns: Set(ret),
            cumulative_return_daily: Set(ret),
        }
    }

    #[tokio::test]
    async fn loads_typed_records_from_both_tables() {
        let db = memory_db().await;
        YearlyData::insert_many(vec![
            yearly("TCS", "IT", 12.5),
            yearly("ONGC", "ENERGY", -4.0),
        ])
        .exec(&db)
        .await
        .unwrap();
        DailyData::insert_many(vec![
            daily("TCS", "2024-01-03", 101.0, Some(0.01)),
            daily("TCS", "2024-01-02", 100.0, None),
            daily("ONGC", "2024-01-02", 50.0, None),
        ])
        .exec(&db)
        .await
        .unwrap();

        let yearly = MarketRepository::load_yearly(&db).await.unwrap();
        assert_eq!(yearly.len(), 2);
        let tcs = yearly.iter().find(|r| r.symbol == "TCS").unwrap();
        assert_eq!(tcs.company, "TCS Ltd");
        assert_eq!(tcs.yearly_return, 12.5);

        let daily = MarketRepository::load_daily(&db).await.unwrap();
        let keys: Vec<(String, String)> = daily
            .iter()
            .map(|r| (r.symbol.clone(), r.date.to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("ONGC".to_string(), "2024-01-02".to_string()),
                ("TCS".to_string(), "2024-01-02".to_string()),
                ("TCS".to_string(), "2024-01-03".to_string()),
            ]
        );
        assert_eq!(daily[1].daily_return, None);
        assert_eq!(daily[2].daily_return, Some(0.01));

        let counts = MarketRepository::count_rows(&db).await.unwrap();
        assert_eq!(counts, RowCounts { yearly: 2, daily: 3 });
    }

    #[tokio::test]
    async fn empty_tables_yield_empty_vectors() {
        let db = memory_db().await;
        assert!(MarketRepository::load_yearly(&db).await.unwrap().is_empty());
        assert!(MarketRepository::load_daily(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_column_is_an_error() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "CREATE TABLE yearly_data (symbol TEXT PRIMARY KEY, sector TEXT);".to_string(),
        ))
        .await
        .unwrap();
        db.execute(Statement::from_string(
            db.get_database_backend(),
            "INSERT INTO yearly_data (symbol, sector) VALUES ('TCS', 'IT');".to_string(),
        ))
        .await
        .unwrap();

        assert!(MarketRepository::load_yearly(&db).await.is_err());
    }
}
