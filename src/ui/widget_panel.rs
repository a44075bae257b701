use crate::api::fields::{discover_fields, display_value, field_value, leaf_paths};
use crate::api::types::{ChartPoint, MarketIndex, StockQuote};
use crate::app::portfolio::{self, Holding};
use crate::app::refresh::{FeedState, WidgetPayload};
use crate::app::state::AppState;
use crate::app::table::{company_name, SortDir, SortKey};
use crate::store::widget::{Widget, WidgetKind};
use crate::ui::theme::Palette;
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::block::Padding;
use ratatui::widgets::{
    Axis, BarChart, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table, Wrap,
};
use serde_json::Value;

/// Custom widgets with no field selection show this many discovered fields.
const DEFAULT_FIELD_COUNT: usize = 8;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, idx: usize, widget: &Widget, palette: &Palette) {
    let focused = state.focus == idx;
    let moving = state.reorder.active_id() == Some(widget.id.as_str());
    let drop_target = state.reorder.is_dragging()
        && state.reorder.target_index(state.store.widgets()) == Some(idx);

    let (border_style, border_type) = if drop_target {
        (Style::default().fg(palette.warn), palette.border_type_focused())
    } else if focused {
        (palette.border_focused(), palette.border_type_focused())
    } else {
        (palette.border(), palette.border_type())
    };

    let mut title = vec![Span::styled(format!(" {} ", widget.title), palette.title())];
    if moving {
        title.push(Span::styled("[moving] ", Style::default().fg(palette.warn)));
    }

    let feed = state.scheduler.feed(&widget.id);
    let updated = feed
        .and_then(|f| f.updated_at)
        .map(|t| format!(" {} ", t.format(&state.config.ui.timestamp_format)))
        .unwrap_or_default();

    let block = Block::default()
        .title(Line::from(title))
        .title(Line::from(Span::styled(updated, palette.muted())).right_aligned())
        .borders(Borders::ALL)
        .border_type(border_type)
        .border_style(border_style)
        .padding(Padding::horizontal(1))
        .style(palette.base());

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if !widget.active {
        message(frame, inner, "Paused", palette.muted());
        return;
    }

    match feed.map(|f| &f.state) {
        None | Some(FeedState::Loading) => message(frame, inner, "Loading…", palette.muted()),
        Some(FeedState::Failed(error)) => {
            let text = Text::from(vec![
                Line::from(Span::styled(error.as_str(), palette.error())),
                Line::from(Span::styled("r to retry", palette.muted())),
            ]);
            frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: true }), inner);
        }
        Some(FeedState::Ready(payload)) => render_payload(frame, inner, state, widget, payload, palette),
    }
}

fn message(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    frame.render_widget(Paragraph::new(Span::styled(text, style)), area);
}

fn render_payload(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    widget: &Widget,
    payload: &WidgetPayload,
    palette: &Palette,
) {
    match (widget.kind, payload) {
        (_, WidgetPayload::Indices(indices)) => render_indices(frame, area, indices, palette),
        (WidgetKind::Table, WidgetPayload::Quotes(quotes)) => {
            render_table(frame, area, state, widget, quotes, palette)
        }
        (WidgetKind::Portfolio, WidgetPayload::Quotes(quotes)) => {
            render_portfolio(frame, area, &portfolio::holdings(widget), quotes, palette)
        }
        (_, WidgetPayload::Quotes(quotes)) => render_quotes(frame, area, quotes, palette),
        (_, WidgetPayload::Chart { points, quote }) => {
            render_chart(frame, area, points, quote.as_ref(), palette)
        }
        (_, WidgetPayload::Custom(value)) => render_custom(frame, area, widget, value, palette),
    }
}

pub fn format_price(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn format_change(change: f64, percent: f64) -> String {
    format!("{:+.2} ({:+.2}%)", change, percent)
}

pub fn format_volume(volume: u64) -> String {
    let v = volume as f64;
    if v >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if v >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if v >= 1e3 {
        format!("{:.1}K", v / 1e3)
    } else {
        volume.to_string()
    }
}

fn render_indices(frame: &mut Frame, area: Rect, indices: &[MarketIndex], palette: &Palette) {
    if indices.is_empty() {
        message(frame, area, "No indices; use /symbols", palette.muted());
        return;
    }
    let rows = indices.iter().map(|index| {
        Row::new(vec![
            Cell::from(Span::styled(index.symbol.clone(), palette.title())),
            Cell::from(index.name.clone()),
            Cell::from(Line::from(format_price(index.price)).right_aligned()),
            Cell::from(
                Line::from(format_change(index.change, index.change_percent))
                    .style(palette.change(index.change))
                    .right_aligned(),
            ),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Min(10),
            Constraint::Length(10),
            Constraint::Length(18),
        ],
    );
    frame.render_widget(table, area);
}

fn render_quotes(frame: &mut Frame, area: Rect, quotes: &[StockQuote], palette: &Palette) {
    if quotes.is_empty() {
        message(frame, area, "No symbols; use /symbols AAPL,MSFT", palette.muted());
        return;
    }
    let rows = quotes.iter().map(|quote| {
        Row::new(vec![
            Cell::from(Span::styled(quote.symbol.clone(), palette.title())),
            Cell::from(Line::from(format_price(quote.price)).right_aligned()),
            Cell::from(
                Line::from(format!("{:+.2}%", quote.change_percent))
                    .style(palette.change(quote.change))
                    .right_aligned(),
            ),
        ])
    });
    let table = Table::new(
        rows,
        [Constraint::Min(6), Constraint::Length(10), Constraint::Length(9)],
    );
    frame.render_widget(table, area);
}

fn render_table(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    widget: &Widget,
    quotes: &[StockQuote],
    palette: &Palette,
) {
    let view = state.table_view(&widget.id);
    let page = view.arrange(quotes);

    let heading = |key: SortKey| {
        let arrow = match (view.sort == key, view.dir) {
            (true, SortDir::Asc) => " ▲",
            (true, SortDir::Desc) => " ▼",
            (false, _) => "",
        };
        Cell::from(format!("{}{}", key.label(), arrow))
    };
    let header = Row::new(vec![
        heading(SortKey::Symbol),
        Cell::from("Company"),
        heading(SortKey::Price),
        heading(SortKey::ChangePercent),
        heading(SortKey::Volume),
    ])
    .style(palette.header_bar().add_modifier(Modifier::BOLD));

    let rows = page.rows.iter().map(|quote| {
        Row::new(vec![
            Cell::from(quote.symbol.clone()),
            Cell::from(company_name(&quote.symbol)),
            Cell::from(format_price(quote.price)),
            Cell::from(Span::styled(
                format!("{:+.2}%", quote.change_percent),
                palette.change(quote.change),
            )),
            Cell::from(format_volume(quote.volume)),
        ])
    });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(2), Constraint::Length(1)])
        .split(area);

    let table = Table::new(
        rows,
        [
            Constraint::Length(7),
            Constraint::Min(10),
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header);
    frame.render_widget(table, chunks[0]);

    let mut footer = format!(
        "Page {}/{} · {} of {} shown",
        page.page + 1,
        page.total_pages,
        page.rows.len(),
        page.matched
    );
    if !view.filter.is_empty() {
        footer.push_str(&format!(" · filter: {}", view.filter));
    }
    message(frame, chunks[1], &footer, palette.muted());
}

fn render_portfolio(frame: &mut Frame, area: Rect, holdings: &[Holding], quotes: &[StockQuote], palette: &Palette) {
    if holdings.is_empty() {
        message(frame, area, "No holdings; use /holding AAPL 10 150", palette.muted());
        return;
    }
    let summary = portfolio::summarize(holdings, quotes);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Total value  ", palette.muted()),
            Span::styled(format_price(summary.total_value), palette.title()),
        ]),
        Line::from(vec![
            Span::styled("Day gain     ", palette.muted()),
            Span::styled(
                format_change(summary.day_gain, summary.day_gain_percent),
                palette.change(summary.day_gain),
            ),
        ]),
        Line::from(vec![
            Span::styled("Total gain   ", palette.muted()),
            Span::styled(
                format_change(summary.total_gain, summary.total_gain_percent),
                palette.change(summary.total_gain),
            ),
        ]),
    ];
    if summary.unpriced > 0 {
        lines.push(Line::from(Span::styled(
            format!("{} holding(s) without a quote", summary.unpriced),
            Style::default().fg(palette.warn),
        )));
    }
    lines.push(Line::default());
    for holding in holdings {
        let price = quotes.iter().find(|q| q.symbol == holding.symbol);
        let value = price
            .map(|q| format_price(q.price * holding.shares))
            .unwrap_or_else(|| "-".to_string());
        lines.push(Line::from(vec![
            Span::styled(format!("{:<6}", holding.symbol), palette.title()),
            Span::raw(format!(" {:>8} sh  {:>10}", holding.shares, value)),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_chart(
    frame: &mut Frame,
    area: Rect,
    points: &[ChartPoint],
    quote: Option<&StockQuote>,
    palette: &Palette,
) {
    if points.is_empty() {
        message(frame, area, "No chart data", palette.muted());
        return;
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(area);

    if let Some(quote) = quote {
        let headline = Line::from(vec![
            Span::styled(format!("{} ", quote.symbol), palette.title()),
            Span::raw(format!("{} ", format_price(quote.price))),
            Span::styled(
                format_change(quote.change, quote.change_percent),
                palette.change(quote.change),
            ),
        ]);
        frame.render_widget(Paragraph::new(headline), chunks[0]);
    }

    let data: Vec<(f64, f64)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.price))
        .collect();
    let (lo, hi) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
        (lo.min(p.price), hi.max(p.price))
    });
    let pad = ((hi - lo) * 0.05).max(0.01);
    let (lo, hi) = (lo - pad, hi + pad);

    let trend = points.last().map(|p| p.price).unwrap_or(0.0) - points[0].price;
    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(palette.change(trend))
        .data(&data);

    let first = points[0].timestamp.clone();
    let last = points.last().map(|p| p.timestamp.clone()).unwrap_or_default();
    let chart = Chart::new(vec![dataset])
        .x_axis(
            Axis::default()
                .style(palette.muted())
                .bounds([0.0, (data.len().max(2) - 1) as f64])
                .labels(vec![first, last]),
        )
        .y_axis(
            Axis::default()
                .style(palette.muted())
                .bounds([lo, hi])
                .labels(vec![format_price(lo), format_price(hi)]),
        );
    frame.render_widget(chart, chunks[1]);
}

/// Fields a custom widget shows, as `(path, display name)`.
pub fn custom_fields(widget: &Widget, value: &Value) -> Vec<(String, String)> {
    let mut fields = widget.config_strings("selectedFields");
    if fields.is_empty() {
        fields = leaf_paths(&discover_fields(value))
            .into_iter()
            .take(DEFAULT_FIELD_COUNT)
            .collect();
    }
    let mapping = widget.config.get("fieldMapping");
    fields
        .into_iter()
        .map(|path| {
            let name = mapping
                .and_then(|m| m.get(&path))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| path.clone());
            (path, name)
        })
        .collect()
}

fn render_custom(frame: &mut Frame, area: Rect, widget: &Widget, value: &Value, palette: &Palette) {
    let fields = custom_fields(widget, value);
    if fields.is_empty() {
        message(frame, area, "Response has no fields", palette.muted());
        return;
    }

    match widget.config_str("displayMode").unwrap_or("card") {
        "table" => {
            let header = Row::new(vec!["Field", "Value"]).style(palette.header_bar().add_modifier(Modifier::BOLD));
            let rows = fields.iter().map(|(path, name)| {
                Row::new(vec![name.clone(), display_value(field_value(value, path))])
            });
            let table = Table::new(rows, [Constraint::Percentage(50), Constraint::Percentage(50)]).header(header);
            frame.render_widget(table, area);
        }
        "chart" => {
            let numeric: Vec<(String, u64)> = fields
                .iter()
                .filter_map(|(path, name)| {
                    let n = field_value(value, path)?.as_f64()?;
                    Some((name.clone(), n.max(0.0).round() as u64))
                })
                .collect();
            if numeric.is_empty() {
                message(frame, area, "No numeric fields to chart", palette.muted());
                return;
            }
            let bars: Vec<(&str, u64)> = numeric.iter().map(|(n, v)| (n.as_str(), *v)).collect();
            let width = (area.width / bars.len() as u16).saturating_sub(1).clamp(1, 12);
            let chart = BarChart::default()
                .data(bars.as_slice())
                .bar_width(width)
                .bar_style(Style::default().fg(palette.accent))
                .value_style(palette.header_bar());
            frame.render_widget(chart, area);
        }
        _ => {
            let lines: Vec<Line> = fields
                .iter()
                .flat_map(|(path, name)| {
                    [
                        Line::from(Span::styled(name.clone(), palette.muted())),
                        Line::from(Span::styled(
                            display_value(field_value(value, path)),
                            palette.title(),
                        )),
                    ]
                })
                .collect();
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
        }
    }
}
