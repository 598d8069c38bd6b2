use crate::commands::{AppCommand, HELP_TEXT};
use crate::dashboard::{self, Filters, MarketSnapshot, Tab, TabView, ViewModel};
use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug)]
pub enum AppEvent {
    Log(String),
    Snapshot(Arc<MarketSnapshot>),
    Fatal(String),
}

pub struct App {
    pub filters: Filters,
    pub snapshot: Option<Arc<MarketSnapshot>>,
    pub view: Option<ViewModel>,
    pub fatal: Option<String>,
    pub loading: bool,
    pub reload_on_input: bool,
    pub picker_index: usize,
    pub picker_state: ListState,
    pub input_mode: InputMode,
    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub cmd_tx: mpsc::UnboundedSender<AppCommand>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(
        startup_info: Vec<String>,
        reload_on_input: bool,
        cmd_tx: mpsc::UnboundedSender<AppCommand>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> App {
        let mut log_messages = vec!["应用已启动".to_string()];
        log_messages.extend(startup_info);

        App {
            filters: Filters::default(),
            snapshot: None,
            view: None,
            fatal: None,
            loading: false,
            reload_on_input,
            picker_index: 0,
            picker_state: {
                let mut s = ListState::default();
                s.select(Some(0));
                s
            },
            input_mode: InputMode::Normal,
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages,
            cmd_tx,
            evt_rx: Some(evt_rx),
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(msg) => self.add_log(msg),
            AppEvent::Snapshot(snapshot) => {
                self.add_log(format!(
                    "✓ 数据已加载: 年度 {} 行, 日线 {} 行 ({})",
                    snapshot.yearly.len(),
                    snapshot.daily.len(),
                    snapshot.loaded_at.format("%H:%M:%S")
                ));
                self.snapshot = Some(snapshot);
                self.fatal = None;
                self.loading = false;
                self.rebuild_view();
            }
            AppEvent::Fatal(msg) => {
                self.add_log(format!("✗ {}", msg));
                self.fatal = Some(msg);
                self.loading = false;
            }
        }
    }

    /// 用当前快照和筛选条件重新生成视图
    pub fn rebuild_view(&mut self) {
        self.view = self
            .snapshot
            .as_ref()
            .map(|snapshot| dashboard::render(snapshot, &self.filters));
        self.clamp_picker();
    }

    pub fn request_reload(&mut self) {
        if self.cmd_tx.send(AppCommand::Reload).is_ok() {
            self.loading = true;
        }
    }

    /// 每次交互：先按新的筛选条件重绘，再按配置重新查询
    fn on_interaction(&mut self) {
        self.rebuild_view();
        if self.reload_on_input {
            self.request_reload();
        }
    }

    pub fn picker_symbols(&self) -> &[String] {
        self.view
            .as_ref()
            .map(|v| v.tab.picker_symbols())
            .unwrap_or(&[])
    }

    pub fn clamp_picker(&mut self) {
        let len = self.picker_symbols().len();
        if self.picker_index >= len {
            self.picker_index = len.saturating_sub(1);
        }
        self.picker_state.select(Some(self.picker_index));
    }

    fn move_picker(&mut self, delta: isize) {
        let len = self.picker_symbols().len();
        if len == 0 {
            return;
        }
        let next = (self.picker_index as isize + delta).clamp(0, len as isize - 1);
        self.picker_index = next as usize;
        self.picker_state.select(Some(self.picker_index));
    }

    fn toggle_picker_symbol(&mut self) {
        let Some(symbol) = self.picker_symbols().get(self.picker_index).cloned() else {
            return;
        };
        self.filters.toggle_symbol(&symbol);
        self.on_interaction();
    }

    fn select_tab(&mut self, tab: Tab) {
        if self.filters.tab != tab {
            self.filters.tab = tab;
            self.picker_index = 0;
            self.on_interaction();
        }
    }

    /// 在可选月份之间前后移动
    fn shift_month(&mut self, delta: isize) {
        let Some(ViewModel {
            tab: TabView::Movers {
                months,
                movers: Some(movers),
            },
            ..
        }) = self.view.as_ref()
        else {
            return;
        };
        let Some(pos) = months.iter().position(|m| *m == movers.month) else {
            return;
        };
        let next = (pos as isize + delta).clamp(0, months.len() as isize - 1) as usize;
        if next != pos {
            self.filters.month = Some(months[next]);
            self.on_interaction();
        }
    }

    /// 执行一条命令，返回 true 表示退出
    pub fn execute_command(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::Reload => {
                self.add_log("正在重新加载数据...".to_string());
                self.request_reload();
            }
            AppCommand::SelectTab(tab) => self.select_tab(tab),
            AppCommand::Select(symbols) => match self.filters.selection_mut() {
                Some(sel) => {
                    *sel = symbols;
                    self.on_interaction();
                }
                None => self.add_log("⚠ 当前页没有多选控件".to_string()),
            },
            AppCommand::Clear => {
                if let Some(sel) = self.filters.selection_mut() {
                    sel.clear();
                    self.on_interaction();
                }
            }
            AppCommand::Month(month) => {
                self.filters.month = Some(month);
                self.on_interaction();
            }
            AppCommand::ShowAll(value) => {
                self.filters.correlation_show_all =
                    value.unwrap_or(!self.filters.correlation_show_all);
                self.on_interaction();
            }
            AppCommand::Help => self.add_log(HELP_TEXT.to_string()),
            AppCommand::Quit => return true,
            AppCommand::Unknown(msg) => self.add_log(format!("✗ {}", msg)),
        }
        false
    }

    /// 获取当前的补全建议
    pub fn get_completion_hint(&self) -> Option<String> {
        let commands = ["reload", "tab", "select", "clear", "month", "all", "help", "quit"];
        let input = self.command_input.trim();
        if input.is_empty() {
            return None;
        }

        let parts: Vec<&str> = input.split_whitespace().collect();
        if parts.len() == 1 && !self.command_input.ends_with(' ') {
            for cmd in commands {
                if cmd.starts_with(parts[0]) && cmd != parts[0] {
                    return Some(cmd[parts[0].len()..].to_string());
                }
            }
            return None;
        }

        if parts[0] == "select" {
            let cur = if self.command_input.ends_with(' ') {
                ""
            } else {
                parts.last().copied().unwrap_or("")
            };
            if cur.is_empty() {
                return None;
            }
            let upper = cur.to_ascii_uppercase();
            return self
                .picker_symbols()
                .iter()
                .find(|s| s.starts_with(&upper) && **s != upper)
                .map(|s| s[upper.len()..].to_string());
        }
        None
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        if self.input_mode == InputMode::Command {
            return self.handle_command_key(key);
        }

        match key {
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
                false
            }
            KeyCode::Char('q') => true,
            KeyCode::Tab => {
                self.select_tab(self.filters.tab.next());
                false
            }
            KeyCode::BackTab => {
                self.select_tab(self.filters.tab.prev());
                false
            }
            KeyCode::Char(c @ '1'..='5') => {
                if let Some(tab) = c.to_digit(10).and_then(|d| Tab::from_index(d as usize - 1)) {
                    self.select_tab(tab);
                }
                false
            }
            KeyCode::Char('r') => {
                self.execute_command(AppCommand::Reload);
                false
            }
            KeyCode::Up => {
                self.move_picker(-1);
                false
            }
            KeyCode::Down => {
                self.move_picker(1);
                false
            }
            KeyCode::PageUp => {
                self.move_picker(-10);
                false
            }
            KeyCode::PageDown => {
                self.move_picker(10);
                false
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if self.filters.tab.has_symbol_picker() {
                    self.toggle_picker_symbol();
                }
                false
            }
            KeyCode::Char('c') => {
                if self.filters.tab.has_symbol_picker() {
                    self.execute_command(AppCommand::Clear);
                }
                false
            }
            KeyCode::Char('t') => {
                if self.filters.tab == Tab::Correlation {
                    self.execute_command(AppCommand::ShowAll(None));
                }
                false
            }
            KeyCode::Left => {
                self.shift_month(-1);
                false
            }
            KeyCode::Right => {
                self.shift_month(1);
                false
            }
            _ => false,
        }
    }

    fn handle_command_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Enter => {
                let cmd_owned = self.command_input.trim().to_string();
                self.command_input.clear();
                self.command_cursor = 0;
                self.input_mode = InputMode::Normal;
                if cmd_owned.is_empty() {
                    return false;
                }

                let app_cmd = AppCommand::from_str(&cmd_owned)
                    .unwrap_or_else(|_| AppCommand::Unknown(cmd_owned.clone()));
                self.command_history.push(cmd_owned);
                self.command_history_index = None;
                self.execute_command(app_cmd)
            }
            KeyCode::Esc => {
                self.command_input.clear();
                self.command_cursor = 0;
                self.input_mode = InputMode::Normal;
                false
            }
            KeyCode::Tab => {
                if let Some(hint) = self.get_completion_hint() {
                    let insert = format!("{} ", hint);
                    self.command_input.insert_str(self.command_cursor, &insert);
                    self.command_cursor += insert.len();
                }
                false
            }
            KeyCode::Up => {
                if self.command_history.is_empty() {
                    return false;
                }
                let next = match self.command_history_index {
                    None => self.command_history.len().saturating_sub(1),
                    Some(i) => i.saturating_sub(1),
                };
                self.command_history_index = Some(next);
                if let Some(cmd) = self.command_history.get(next) {
                    self.command_input = cmd.clone();
                    self.command_cursor = self.command_input.len();
                }
                false
            }
            KeyCode::Down => {
                let Some(i) = self.command_history_index else {
                    return false;
                };
                let n = i + 1;
                if n >= self.command_history.len() {
                    self.command_history_index = None;
                    self.command_input.clear();
                    self.command_cursor = 0;
                    return false;
                }
                self.command_history_index = Some(n);
                if let Some(cmd) = self.command_history.get(n) {
                    self.command_input = cmd.clone();
                    self.command_cursor = self.command_input.len();
                }
                false
            }
            KeyCode::Backspace => {
                if self.command_cursor > 0 && !self.command_input.is_empty() {
                    let idx = self.command_cursor - 1;
                    self.command_input.remove(idx);
                    self.command_cursor -= 1;
                }
                false
            }
            KeyCode::Delete => {
                if self.command_cursor < self.command_input.len() {
                    self.command_input.remove(self.command_cursor);
                }
                false
            }
            KeyCode::Left => {
                self.command_cursor = self.command_cursor.saturating_sub(1);
                false
            }
            KeyCode::Right => {
                if self.command_cursor < self.command_input.len() {
                    self.command_cursor += 1;
                }
                false
            }
            KeyCode::Home => {
                self.command_cursor = 0;
                false
            }
            KeyCode::End => {
                self.command_cursor = self.command_input.len();
                false
            }
            // 命令只接受 ASCII，光标按字节计
            KeyCode::Char(c) if c.is_ascii() => {
                self.command_input.insert(self.command_cursor, c);
                self.command_cursor += 1;
                false
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testkit::{daily, with_returns, yearly};
    use chrono::Local;

    fn app(reload_on_input: bool) -> (App, mpsc::UnboundedReceiver<AppCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (_evt_tx, evt_rx) = mpsc::unbounded_channel();
        (App::new(Vec::new(), reload_on_input, cmd_tx, evt_rx), cmd_rx)
    }

    fn snapshot() -> Arc<MarketSnapshot> {
        let mut rows = Vec::new();
        for sym in ["AAA", "BBB", "CCC"] {
            rows.push(with_returns(daily(sym, "2024-01-02", 100.0), None, Some(0.0)));
            rows.push(with_returns(daily(sym, "2024-02-02", 110.0), Some(0.1), Some(0.1)));
            rows.push(with_returns(daily(sym, "2024-03-04", 120.0), Some(0.09), Some(0.2)));
        }
        Arc::new(MarketSnapshot {
            yearly: vec![yearly("AAA", "IT", 5.0)],
            daily: rows,
            loaded_at: Local::now(),
        })
    }

    fn type_command(app: &mut App, text: &str) -> bool {
        app.handle_key_event(KeyCode::Char('/'));
        for c in text.chars() {
            app.handle_key_event(KeyCode::Char(c));
        }
        app.handle_key_event(KeyCode::Enter)
    }

    #[test]
    fn snapshot_event_builds_view_and_clears_fatal() {
        let (mut app, _rx) = app(false);
        app.apply_event(AppEvent::Fatal("boom".to_string()));
        assert!(app.fatal.is_some());
        app.apply_event(AppEvent::Snapshot(snapshot()));
        assert!(app.fatal.is_none());
        assert!(app.view.is_some());
    }

    #[test]
    fn interaction_requests_reload_when_enabled() {
        let (mut app, mut rx) = app(true);
        app.apply_event(AppEvent::Snapshot(snapshot()));
        app.handle_key_event(KeyCode::Char('2'));
        assert_eq!(app.filters.tab, Tab::Volatility);
        assert_eq!(rx.try_recv().ok(), Some(AppCommand::Reload));
        assert!(app.loading);
    }

    #[test]
    fn no_reload_when_disabled() {
        let (mut app, mut rx) = app(false);
        app.apply_event(AppEvent::Snapshot(snapshot()));
        app.handle_key_event(KeyCode::Tab);
        assert_eq!(app.filters.tab, Tab::Volatility);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn picker_toggles_symbol_under_cursor() {
        let (mut app, _rx) = app(false);
        app.apply_event(AppEvent::Snapshot(snapshot()));
        app.handle_key_event(KeyCode::Char('3'));
        app.handle_key_event(KeyCode::Down);
        app.handle_key_event(KeyCode::Char(' '));
        assert_eq!(app.filters.cumulative_symbols, vec!["BBB"]);

        app.handle_key_event(KeyCode::Char('c'));
        assert!(app.filters.cumulative_symbols.is_empty());
    }

    #[test]
    fn month_arrows_step_through_available_months() {
        let (mut app, _rx) = app(false);
        app.apply_event(AppEvent::Snapshot(snapshot()));
        app.handle_key_event(KeyCode::Char('5'));
        // 默认最后一个月，再往右不动
        app.handle_key_event(KeyCode::Right);
        assert_eq!(app.filters.month, None);
        app.handle_key_event(KeyCode::Left);
        assert_eq!(app.filters.month.map(|m| m.to_string()).as_deref(), Some("2024-02"));
    }

    #[test]
    fn typed_commands_are_executed() {
        let (mut app, _rx) = app(false);
        app.apply_event(AppEvent::Snapshot(snapshot()));
        assert!(!type_command(&mut app, "tab corr"));
        assert_eq!(app.filters.tab, Tab::Correlation);
        assert!(!type_command(&mut app, "select aaa ccc"));
        assert_eq!(app.filters.correlation_symbols, vec!["AAA", "CCC"]);
        assert!(!type_command(&mut app, "all on"));
        assert!(app.filters.correlation_show_all);
        assert_eq!(app.command_history.len(), 3);
        assert!(type_command(&mut app, "quit"));
    }

    #[test]
    fn completion_hint_for_commands_and_symbols() {
        let (mut app, _rx) = app(false);
        app.apply_event(AppEvent::Snapshot(snapshot()));
        app.handle_key_event(KeyCode::Char('3'));
        app.command_input = "sel".to_string();
        assert_eq!(app.get_completion_hint().as_deref(), Some("ect"));
        app.command_input = "select bb".to_string();
        assert_eq!(app.get_completion_hint().as_deref(), Some("B"));
    }
}
