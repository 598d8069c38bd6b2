mod analytics;
mod app_service;
mod app_state;
mod commands;
mod config;
mod dashboard;
mod error;
mod storage;
mod ui;

use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_service::{drain_pending_reloads, periodic_refresh, refresh_ui};
use crate::app_state::{App, AppEvent};
use crate::commands::AppCommand;
use crate::config::AppConfig;
use crate::error::DashboardError;
use crate::storage::repository::MarketRepository;
use crate::ui::draw;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    std::fs::create_dir_all(&config.log_dir)?;
    let log_path = config.log_dir.join(format!("app-{}.log", ts));
    let log_file = std::fs::File::create(&log_path)?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file))) // TUI 占用终端，日志只写文件
        .filter_level(log::LevelFilter::Warn)
        .filter_module("nifty_dashboard", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .init();

    log::info!("启动配置: {:?}", config);

    let mut startup_info = Vec::new();
    startup_info.push(format!("日志文件: {}", log_path.display()));

    // 初始化数据库，连不上直接退出
    let db = match storage::establish_connection(&config.database_url).await {
        Ok(connection) => {
            startup_info.push("✓ 数据库连接成功".to_string());
            Arc::new(connection)
        }
        Err(e) => {
            log::error!("数据库连接失败: {}", e);
            eprintln!("无法连接数据库 {}: {}", config.redacted_url(), e);
            return Err(DashboardError::Connection(e).into());
        }
    };

    match MarketRepository::count_rows(db.as_ref()).await {
        Ok(counts) => {
            log::info!("数据集行数: 年度 {}, 日线 {}", counts.yearly, counts.daily);
            startup_info.push(format!(
                "✓ 数据集: 年度 {} 行, 日线 {} 行",
                counts.yearly, counts.daily
            ));
        }
        Err(e) => {
            log::warn!("统计行数失败: {}", e);
            startup_info.push(format!("⚠ 统计行数失败: {}", e));
        }
    }

    if config.refresh_secs > 0 {
        startup_info.push(format!("定时刷新: 每 {} 秒", config.refresh_secs));
    }

    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<AppCommand>();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    // 后台任务 (Actor)：只负责查询，渲染与筛选在 UI 线程完成
    let db_bg = Arc::clone(&db);
    let evt_tx_bg = evt_tx.clone();
    let refresh_secs = config.refresh_secs;
    tokio::spawn(async move {
        refresh_ui(&db_bg, &evt_tx_bg).await;

        if refresh_secs > 0 {
            tokio::spawn(periodic_refresh(
                db_bg.clone(),
                evt_tx_bg.clone(),
                std::time::Duration::from_secs(refresh_secs),
            ));
        }

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                AppCommand::Reload => {
                    let merged = drain_pending_reloads(&mut cmd_rx);
                    if merged > 0 {
                        log::debug!("合并 {} 次排队的刷新请求", merged);
                    }
                    refresh_ui(&db_bg, &evt_tx_bg).await;
                }
                // 其余命令只影响 UI 状态
                other => log::debug!("后台忽略命令: {:?}", other),
            }
        }
    });

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(startup_info, config.reload_on_input, cmd_tx, evt_rx);

    let res = match app.evt_rx.take() {
        Some(rx) => run_app_loop(&mut terminal, &mut app, rx).await,
        None => Ok(()),
    };

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = res {
        log::error!("界面循环异常退出: {}", e);
    }
    log::info!("应用退出");
    res.map_err(|e| DashboardError::Io(e).into())
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        while let Ok(event) = evt_rx.try_recv() {
            app.apply_event(event);
        }

        terminal.draw(|f| draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key_event(key.code) {
                    return Ok(());
                }
            }
        }
    }
}
