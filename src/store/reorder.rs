//! Drag-and-drop reordering.
//!
//! In the terminal the "pointer" is the keyboard: the focused widget is
//! picked up, the drop target moves with the arrow keys, and Enter drops.

use crate::store::widget::Widget;
use crate::store::{DashboardStore, StoreError};

/// Remove the element at `from` and insert it at `to`. Out-of-range
/// indices leave the vector as it was.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() || to >= items.len() || from == to {
        return;
    }
    let item = items.remove(from);
    items.insert(to, item);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReorderController {
    active_id: Option<String>,
    target: Option<usize>,
}

impl ReorderController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_drag(&mut self, id: impl Into<String>) {
        self.active_id = Some(id.into());
        self.target = None;
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.active_id.is_some()
    }

    pub fn cancel_drag(&mut self) {
        self.active_id = None;
        self.target = None;
    }

    /// Finish the drag. Returns the reordered sequence, or `None` when
    /// there is nothing to do.
    pub fn end_drag(&mut self, over: Option<&str>, widgets: &[Widget]) -> Option<Vec<Widget>> {
        let active = self.active_id.take();
        self.target = None;
        let (active, over) = (active?, over?);
        if active == over {
            return None;
        }
        let from = widgets.iter().position(|w| w.id == active)?;
        let to = widgets.iter().position(|w| w.id == over)?;
        let mut moved = widgets.to_vec();
        array_move(&mut moved, from, to);
        Some(moved)
    }

    /// End the drag over `over` and commit the result to the store.
    pub fn drop_onto(&mut self, store: &mut DashboardStore, over: Option<&str>) -> Result<bool, StoreError> {
        match self.end_drag(over, store.widgets()) {
            Some(moved) => {
                store.reorder_widgets(moved)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Index the held widget would land on.
    pub fn target_index(&self, widgets: &[Widget]) -> Option<usize> {
        let active = self.active_id.as_deref()?;
        match self.target {
            Some(idx) if idx < widgets.len() => Some(idx),
            _ => widgets.iter().position(|w| w.id == active),
        }
    }

    pub fn target_id<'a>(&self, widgets: &'a [Widget]) -> Option<&'a str> {
        self.target_index(widgets)
            .and_then(|idx| widgets.get(idx))
            .map(|w| w.id.as_str())
    }

    /// Shift the drop target by `delta` positions, clamped to the list.
    pub fn move_target(&mut self, delta: isize, widgets: &[Widget]) {
        let Some(current) = self.target_index(widgets) else {
            return;
        };
        let last = widgets.len().saturating_sub(1) as isize;
        let next = (current as isize + delta).clamp(0, last);
        self.target = Some(next as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::persist::MemoryStorage;
    use crate::store::widget::{WidgetDraft, WidgetKind};

    fn widgets(ids: &[&str]) -> Vec<Widget> {
        ids.iter()
            .map(|id| WidgetDraft::from_kind(WidgetKind::Watchlist).into_widget(id.to_string()))
            .collect()
    }

    fn ids(widgets: &[Widget]) -> Vec<&str> {
        widgets.iter().map(|w| w.id.as_str()).collect()
    }

    #[test]
    fn test_array_move() {
        let mut v = vec![1, 2, 3, 4];
        array_move(&mut v, 0, 2);
        assert_eq!(v, vec![2, 3, 1, 4]);
        array_move(&mut v, 3, 0);
        assert_eq!(v, vec![4, 2, 3, 1]);
        array_move(&mut v, 9, 0);
        assert_eq!(v, vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_end_drag_moves_source_to_target() {
        let list = widgets(&["a", "b", "c"]);
        let mut ctl = ReorderController::new();
        ctl.begin_drag("a");
        let moved = ctl.end_drag(Some("c"), &list).unwrap();
        assert_eq!(ids(&moved), vec!["b", "c", "a"]);
        assert!(!ctl.is_dragging());
    }

    #[test]
    fn test_end_drag_noops() {
        let list = widgets(&["a", "b"]);
        let mut ctl = ReorderController::new();

        ctl.begin_drag("a");
        assert!(ctl.end_drag(None, &list).is_none());
        ctl.begin_drag("a");
        assert!(ctl.end_drag(Some("a"), &list).is_none());
        ctl.begin_drag("zzz");
        assert!(ctl.end_drag(Some("a"), &list).is_none());
        assert!(ctl.end_drag(Some("b"), &list).is_none());
    }

    #[test]
    fn test_keyboard_target_clamps() {
        let list = widgets(&["a", "b", "c"]);
        let mut ctl = ReorderController::new();
        ctl.begin_drag("b");
        assert_eq!(ctl.target_index(&list), Some(1));
        ctl.move_target(5, &list);
        assert_eq!(ctl.target_id(&list), Some("c"));
        ctl.move_target(-10, &list);
        assert_eq!(ctl.target_id(&list), Some("a"));
        ctl.cancel_drag();
        assert_eq!(ctl.target_index(&list), None);
    }

    #[test]
    fn test_drop_onto_commits_to_store() {
        let mut store = DashboardStore::open(Box::new(MemoryStorage::new()));
        let before = ids(store.widgets()).iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut ctl = ReorderController::new();
        ctl.begin_drag(before[2].clone());
        assert!(ctl.drop_onto(&mut store, Some(&before[0])).unwrap());
        assert_eq!(
            ids(store.widgets()),
            vec![before[2].as_str(), before[0].as_str(), before[1].as_str()]
        );
        assert!(!ctl.drop_onto(&mut store, None).unwrap());
    }
}
