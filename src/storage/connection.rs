use log::info;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// 建立只读看板使用的单连接
pub async fn establish_connection(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    opt.max_connections(1)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;
    // 立即 ping 一次，连不上直接失败，不做重试
    db.ping().await?;

    info!("Database connection established: {:?}", db.get_database_backend());

    Ok(db)
}

/// 测试用：按实体在内存库中建表
#[cfg(test)]
pub(crate) async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    use crate::storage::entity::{daily_data, yearly_data};
    use sea_orm::Schema;

    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmt = builder.build(
        schema
            .create_table_from_entity(yearly_data::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    let stmt = builder.build(
        schema
            .create_table_from_entity(daily_data::Entity)
            .if_not_exists(),
    );
    db.execute(stmt).await?;

    Ok(())
}
