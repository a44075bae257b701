use crate::store::layout::flow_layout;
use crate::store::widget::Widget;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Grid rows never shrink below this many lines; extra rows scroll.
pub const MIN_ROW_HEIGHT: u16 = 9;

pub struct AppLayout {
    pub header: Rect,
    pub grid: Rect,
    pub input_box: Rect,
    pub status_bar: Rect,
}

pub fn compute_layout(area: Rect, show_input: bool) -> AppLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                                  // Header
            Constraint::Min(5),                                     // Widget grid
            Constraint::Length(if show_input { 3 } else { 0 }),     // Command input
            Constraint::Length(1),                                  // Status bar
        ])
        .split(area);

    AppLayout {
        header: chunks[0],
        grid: chunks[1],
        input_box: chunks[2],
        status_bar: chunks[3],
    }
}

/// Screen rectangle for each visible widget, as `(index, rect)`. Rows scroll
/// so the row holding `focus` stays on screen.
pub fn grid_cells(area: Rect, widgets: &[Widget], cols: u16, focus: usize) -> Vec<(usize, Rect)> {
    if widgets.is_empty() || area.width == 0 || area.height == 0 {
        return Vec::new();
    }
    let cols = cols.max(1);
    let placed = flow_layout(widgets, cols);
    let rows = placed.values().map(|r| r.y + 1).max().unwrap_or(1);

    let visible = (area.height / MIN_ROW_HEIGHT).clamp(1, rows);
    let focus_row = widgets
        .get(focus)
        .and_then(|w| placed.get(&w.id))
        .map(|r| r.y)
        .unwrap_or(0);
    let first = focus_row.saturating_sub(visible - 1).min(rows - visible);

    let row_height = area.height / visible;
    let col_width = area.width / cols;

    widgets
        .iter()
        .enumerate()
        .filter_map(|(idx, widget)| {
            let cell = placed.get(&widget.id)?;
            if cell.y < first || cell.y >= first + visible {
                return None;
            }
            let x = area.x + cell.x * col_width;
            // last column and last row absorb rounding
            let width = if cell.x + cell.w >= cols {
                area.right() - x
            } else {
                cell.w * col_width
            };
            let row = cell.y - first;
            let y = area.y + row * row_height;
            let height = if row + 1 == visible {
                area.bottom() - y
            } else {
                row_height
            };
            Some((idx, Rect::new(x, y, width, height)))
        })
        .collect()
}
