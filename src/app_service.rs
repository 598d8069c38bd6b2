use crate::app_state::AppEvent;
use crate::commands::AppCommand;
use crate::dashboard::MarketSnapshot;
use crate::error::DashboardError;
use crate::storage::repository::{DailyRecord, MarketRepository, YearlyRecord};
use chrono::Local;
use log::{error, info};
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// 一次完整的渲染输入：两张表全量读取
pub async fn load_snapshot(db: &DatabaseConnection) -> Result<MarketSnapshot, DashboardError> {
    let yearly = MarketRepository::load_yearly(db).await?;
    let daily = MarketRepository::load_daily(db).await?;
    check_keys(&yearly, &daily)?;

    Ok(MarketSnapshot {
        yearly,
        daily,
        loaded_at: Local::now(),
    })
}

/// 两张表的唯一性约定：yearly 的 symbol、daily 的 (symbol, date)
fn check_keys(yearly: &[YearlyRecord], daily: &[DailyRecord]) -> Result<(), DashboardError> {
    let mut symbols = HashSet::new();
    for row in yearly {
        if !symbols.insert(row.symbol.as_str()) {
            return Err(DashboardError::Contract(format!(
                "yearly_data 中 symbol 重复: {}",
                row.symbol
            )));
        }
    }

    let mut keys = HashSet::new();
    for row in daily {
        if !keys.insert((row.symbol.as_str(), row.date)) {
            return Err(DashboardError::Contract(format!(
                "daily_data 中 (symbol, date) 重复: {} {}",
                row.symbol, row.date
            )));
        }
    }
    Ok(())
}

pub async fn refresh_ui(db: &Arc<DatabaseConnection>, tx: &mpsc::UnboundedSender<AppEvent>) {
    match load_snapshot(db).await {
        Ok(snapshot) => {
            info!(
                "snapshot loaded: {} yearly rows, {} daily rows",
                snapshot.yearly.len(),
                snapshot.daily.len()
            );
            let _ = tx.send(AppEvent::Snapshot(Arc::new(snapshot)));
        }
        Err(e) => {
            error!("snapshot load failed: {}", e);
            let _ = tx.send(AppEvent::Fatal(e.to_string()));
        }
    }
}

/// 取走通道里已排队的刷新请求，连续按键只触发一次查询。
/// 后台只处理 Reload，其余命令一并丢弃。返回合并掉的 Reload 数量。
pub fn drain_pending_reloads(rx: &mut mpsc::UnboundedReceiver<AppCommand>) -> usize {
    let mut merged = 0;
    while let Ok(cmd) = rx.try_recv() {
        if cmd == AppCommand::Reload {
            merged += 1;
        }
    }
    merged
}

/// 定时刷新，UI 端关闭通道后退出
pub async fn periodic_refresh(
    db: Arc<DatabaseConnection>,
    tx: mpsc::UnboundedSender<AppEvent>,
    period: Duration,
) {
    loop {
        tokio::time::sleep(period).await;
        if tx.is_closed() {
            break;
        }
        let _ = tx.send(AppEvent::Log(format!(
            "定时刷新数据 (每 {} 秒)",
            period.as_secs()
        )));
        refresh_ui(&db, &tx).await;
    }
}
