//! User slash-command parser.
//!
//! Parses `/command arg1 arg2 ...` input lines into typed [`ParsedCommand`]
//! values that the event handler can act on. Widget-scoped commands apply
//! to the focused widget.

use crate::app::table::{PageMove, SortKey};
use crate::store::settings::{parse_interval, Theme};
use crate::store::widget::WidgetKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedCommand {
    Add { kind: WidgetKind, title: Option<String> },
    AddApi { url: String, title: Option<String> },
    Remove,
    Title { text: String },
    Symbols { symbols: Vec<String> },
    Symbol { symbol: String },
    Interval { interval: String },
    Period { period: String },
    Count { count: u64 },
    Holding { symbol: String, shares: f64, cost: f64 },
    Fields { fields: Vec<String> },
    Map { field: String, name: String },
    Mode { mode: String },
    /// api-custom refresh override, seconds.
    Every { secs: u64 },
    Theme { theme: Theme },
    IntervalAll { ms: u64 },
    AutoRefresh { on: bool },
    Compact { on: bool },
    Export { path: Option<String> },
    Import { path: String },
    Reset,
    Refresh,
    ClearCache,
    Filter { text: String },
    Sort { key: SortKey },
    Page { step: PageMove },
    Help,
    Quit,
}

/// Parse a slash-command string into a [`ParsedCommand`].
///
/// Returns `None` if the input does not start with `/`, is not a recognized
/// command, or its arguments do not parse. Command names are
/// case-insensitive.
pub fn parse_command(input: &str) -> Option<ParsedCommand> {
    let input = input.trim();
    let body = input.strip_prefix('/')?;

    let (cmd, rest) = match body.split_once(' ') {
        Some((cmd, rest)) => (cmd.to_lowercase(), rest.trim()),
        None => (body.to_lowercase(), ""),
    };
    let rest_opt = (!rest.is_empty()).then(|| rest.to_string());

    match cmd.as_str() {
        "add" => {
            let (kind, title) = split_first(rest)?;
            let kind = kind.parse().ok()?;
            if kind == WidgetKind::ApiCustom {
                return None;
            }
            Some(ParsedCommand::Add { kind, title })
        }
        "api" => {
            let (url, title) = split_first(rest)?;
            Some(ParsedCommand::AddApi {
                url: url.to_string(),
                title,
            })
        }
        "remove" | "rm" => Some(ParsedCommand::Remove),
        "title" | "rename" => Some(ParsedCommand::Title { text: rest_opt? }),
        "symbols" => {
            let symbols = split_list(rest, true);
            (!symbols.is_empty()).then_some(ParsedCommand::Symbols { symbols })
        }
        "symbol" => {
            let symbol = rest.split_whitespace().next()?.to_uppercase();
            Some(ParsedCommand::Symbol { symbol })
        }
        "interval" => Some(ParsedCommand::Interval {
            interval: rest.split_whitespace().next()?.to_uppercase(),
        }),
        "period" => Some(ParsedCommand::Period {
            period: rest.split_whitespace().next()?.to_uppercase(),
        }),
        "count" => {
            let count: u64 = rest.parse().ok()?;
            (count > 0).then_some(ParsedCommand::Count { count })
        }
        "holding" => {
            let mut parts = rest.split_whitespace();
            let symbol = parts.next()?.to_uppercase();
            let shares: f64 = parts.next()?.parse().ok()?;
            let cost: f64 = parts.next()?.parse().ok()?;
            if !(shares.is_finite() && cost.is_finite()) || shares < 0.0 || cost < 0.0 {
                return None;
            }
            Some(ParsedCommand::Holding { symbol, shares, cost })
        }
        "fields" => Some(ParsedCommand::Fields {
            fields: split_list(rest, false),
        }),
        "map" => {
            let (field, name) = split_first(rest)?;
            Some(ParsedCommand::Map {
                field: field.to_string(),
                name: name?,
            })
        }
        "mode" => {
            let mode = rest.to_lowercase();
            matches!(mode.as_str(), "card" | "table" | "chart").then_some(ParsedCommand::Mode { mode })
        }
        "every" => {
            let secs: u64 = rest.trim_end_matches('s').parse().ok()?;
            (secs > 0).then_some(ParsedCommand::Every { secs })
        }
        "theme" => Some(ParsedCommand::Theme {
            theme: rest.parse().ok()?,
        }),
        "interval-all" | "rate" => Some(ParsedCommand::IntervalAll {
            ms: parse_interval(rest)?,
        }),
        "autorefresh" | "auto" => Some(ParsedCommand::AutoRefresh { on: parse_switch(rest)? }),
        "compact" => Some(ParsedCommand::Compact { on: parse_switch(rest)? }),
        "export" => Some(ParsedCommand::Export { path: rest_opt }),
        "import" => Some(ParsedCommand::Import { path: rest_opt? }),
        "reset" => Some(ParsedCommand::Reset),
        "refresh" | "r" => Some(ParsedCommand::Refresh),
        "clear-cache" => Some(ParsedCommand::ClearCache),
        "filter" | "search" => Some(ParsedCommand::Filter {
            text: rest.to_string(),
        }),
        "sort" => Some(ParsedCommand::Sort {
            key: rest.parse().ok()?,
        }),
        "page" => {
            let step = match rest.to_lowercase().as_str() {
                "next" | "n" | "+" => PageMove::Next,
                "prev" | "p" | "-" => PageMove::Prev,
                other => PageMove::To(other.parse().ok().filter(|n: &usize| *n > 0)?),
            };
            Some(ParsedCommand::Page { step })
        }
        "help" | "h" => Some(ParsedCommand::Help),
        "quit" | "exit" | "q" => Some(ParsedCommand::Quit),
        _ => None,
    }
}

/// First word and the optional remainder.
fn split_first(rest: &str) -> Option<(&str, Option<String>)> {
    let mut parts = rest.splitn(2, ' ');
    let first = parts.next().filter(|s| !s.is_empty())?;
    let remainder = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Some((first, remainder))
}

fn split_list(rest: &str, upper: bool) -> Vec<String> {
    rest.split([',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| if upper { s.to_uppercase() } else { s.to_string() })
        .collect()
}

fn parse_switch(arg: &str) -> Option<bool> {
    match arg.to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_a_command() {
        assert_eq!(parse_command("hello"), None);
        assert_eq!(parse_command("/frobnicate"), None);
    }

    #[test]
    fn test_add() {
        assert_eq!(
            parse_command("/add chart Tesla daily"),
            Some(ParsedCommand::Add {
                kind: WidgetKind::Chart,
                title: Some("Tesla daily".into())
            })
        );
        assert_eq!(
            parse_command("/ADD Gainers"),
            Some(ParsedCommand::Add {
                kind: WidgetKind::Gainers,
                title: None
            })
        );
        assert_eq!(parse_command("/add"), None);
        assert_eq!(parse_command("/add sparkline"), None);
        // custom API widgets need a URL
        assert_eq!(parse_command("/add api-custom"), None);
    }

    #[test]
    fn test_api() {
        assert_eq!(
            parse_command("/api https://example.com/rates.json FX Rates"),
            Some(ParsedCommand::AddApi {
                url: "https://example.com/rates.json".into(),
                title: Some("FX Rates".into())
            })
        );
    }

    #[test]
    fn test_lists_are_normalized() {
        assert_eq!(
            parse_command("/symbols aapl, msft,tsla"),
            Some(ParsedCommand::Symbols {
                symbols: vec!["AAPL".into(), "MSFT".into(), "TSLA".into()]
            })
        );
        assert_eq!(parse_command("/symbols"), None);
        assert_eq!(
            parse_command("/fields data.rate, data.base"),
            Some(ParsedCommand::Fields {
                fields: vec!["data.rate".into(), "data.base".into()]
            })
        );
        assert_eq!(parse_command("/fields"), Some(ParsedCommand::Fields { fields: vec![] }));
    }

    #[test]
    fn test_holding() {
        assert_eq!(
            parse_command("/holding aapl 10 150.5"),
            Some(ParsedCommand::Holding {
                symbol: "AAPL".into(),
                shares: 10.0,
                cost: 150.5
            })
        );
        assert_eq!(parse_command("/holding aapl ten 150"), None);
        assert_eq!(parse_command("/holding aapl -1 150"), None);
    }

    #[test]
    fn test_settings_commands() {
        assert_eq!(
            parse_command("/theme dark"),
            Some(ParsedCommand::Theme { theme: Theme::Dark })
        );
        assert_eq!(
            parse_command("/interval-all 5m"),
            Some(ParsedCommand::IntervalAll { ms: 300_000 })
        );
        assert_eq!(
            parse_command("/autorefresh off"),
            Some(ParsedCommand::AutoRefresh { on: false })
        );
        assert_eq!(parse_command("/compact maybe"), None);
    }

    #[test]
    fn test_map_and_mode() {
        assert_eq!(
            parse_command("/map data.rate Exchange rate"),
            Some(ParsedCommand::Map {
                field: "data.rate".into(),
                name: "Exchange rate".into()
            })
        );
        assert_eq!(parse_command("/map data.rate"), None);
        assert_eq!(
            parse_command("/mode Table"),
            Some(ParsedCommand::Mode { mode: "table".into() })
        );
        assert_eq!(parse_command("/mode grid"), None);
        assert_eq!(parse_command("/every 45s"), Some(ParsedCommand::Every { secs: 45 }));
    }

    #[test]
    fn test_table_commands() {
        assert_eq!(
            parse_command("/sort volume"),
            Some(ParsedCommand::Sort { key: SortKey::Volume })
        );
        assert_eq!(
            parse_command("/page next"),
            Some(ParsedCommand::Page { step: PageMove::Next })
        );
        assert_eq!(
            parse_command("/page 3"),
            Some(ParsedCommand::Page { step: PageMove::To(3) })
        );
        assert_eq!(parse_command("/page 0"), None);
        assert_eq!(
            parse_command("/filter"),
            Some(ParsedCommand::Filter { text: String::new() })
        );
    }

    #[test]
    fn test_transfer_commands() {
        assert_eq!(parse_command("/export"), Some(ParsedCommand::Export { path: None }));
        assert_eq!(
            parse_command("/import /tmp/board.json"),
            Some(ParsedCommand::Import {
                path: "/tmp/board.json".into()
            })
        );
        assert_eq!(parse_command("/import"), None);
        assert_eq!(parse_command("/quit"), Some(ParsedCommand::Quit));
    }
}
