use crate::analytics::monthly::MonthKey;
use crate::dashboard::Tab;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Reload,
    SelectTab(Tab),
    /// 替换当前页的多选
    Select(Vec<String>),
    Clear,
    Month(MonthKey),
    /// None 表示切换
    ShowAll(Option<bool>),
    Help,
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "可用命令: reload | tab <1-5|sector|vol|cum|corr|movers> | select <SYM...> | clear | month <YYYY-MM> | all [on|off] | help | quit";

impl FromStr for AppCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(AppCommand::Unknown("".to_string()));
        }

        match parts[0] {
            "reload" | "r" | "refresh" => Ok(AppCommand::Reload),
            "tab" => match parts.get(1).and_then(|t| Tab::parse(t)) {
                Some(tab) => Ok(AppCommand::SelectTab(tab)),
                None => Ok(AppCommand::Unknown(
                    "用法: tab <1-5|sector|vol|cum|corr|movers>".to_string(),
                )),
            },
            "select" | "sel" => {
                let symbols: Vec<String> = parts[1..]
                    .iter()
                    .flat_map(|p| p.split(','))
                    .map(|s| s.trim().to_ascii_uppercase())
                    .filter(|s| !s.is_empty())
                    .collect();
                if symbols.is_empty() {
                    Ok(AppCommand::Unknown("用法: select <SYM...>".to_string()))
                } else {
                    Ok(AppCommand::Select(symbols))
                }
            }
            "clear" => Ok(AppCommand::Clear),
            "month" => match parts.get(1).map(|m| m.parse::<MonthKey>()) {
                Some(Ok(month)) => Ok(AppCommand::Month(month)),
                Some(Err(e)) => Ok(AppCommand::Unknown(e)),
                None => Ok(AppCommand::Unknown("用法: month <YYYY-MM>".to_string())),
            },
            "all" => match parts.get(1).map(|s| s.to_ascii_lowercase()) {
                None => Ok(AppCommand::ShowAll(None)),
                Some(v) if matches!(v.as_str(), "on" | "1" | "true" | "yes") => {
                    Ok(AppCommand::ShowAll(Some(true)))
                }
                Some(v) if matches!(v.as_str(), "off" | "0" | "false" | "no") => {
                    Ok(AppCommand::ShowAll(Some(false)))
                }
                Some(_) => Ok(AppCommand::Unknown("用法: all [on|off]".to_string())),
            },
            "help" | "h" => Ok(AppCommand::Help),
            "quit" | "q" | "exit" => Ok(AppCommand::Quit),
            _ => Ok(AppCommand::Unknown(format!("未知命令: {}", parts[0]))),
        }
    }
}
