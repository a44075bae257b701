//! Per-widget grid coordinates.
//!
//! The dashboard renders in flow order; the map is bookkeeping that
//! records where each widget landed so exports carry the arrangement.

use crate::store::widget::Widget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutRect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

pub type LayoutMap = BTreeMap<String, LayoutRect>;

/// Place widgets left to right, wrapping at `cols`. Wide kinds take two
/// columns (clamped to the grid width); a widget that does not fit on the
/// current row starts the next one.
pub fn flow_layout(widgets: &[Widget], cols: u16) -> LayoutMap {
    let cols = cols.max(1);
    let mut map = LayoutMap::new();
    let (mut x, mut y) = (0u16, 0u16);

    for widget in widgets {
        let w = if widget.kind.is_wide() { 2.min(cols) } else { 1 };
        if x + w > cols {
            x = 0;
            y += 1;
        }
        map.insert(widget.id.clone(), LayoutRect { x, y, w, h: 1 });
        x += w;
        if x >= cols {
            x = 0;
            y += 1;
        }
    }
    map
}
