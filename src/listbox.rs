//! Listbox: item list, selection model, scroll coupling.
//!
//! A listbox owns its items as plain data and a vertical scrollbar as a
//! child widget. Rows have a fixed height; the scrollbar value is the
//! pixel scroll offset of the content. Selection changes all funnel
//! through [`set_selected`] so every change emits exactly one
//! `SelectionChanged`.

use log::trace;

use crate::geometry::{Point, Rect};
use crate::input::{Key, Modifiers};
use crate::scrollbar;
use crate::tree::{WidgetId, WidgetTree};
use crate::widget::{ListBoxState, ListItem, Orientation, WidgetKind};

/// Width of the built-in vertical scrollbar.
pub const SCROLLBAR_THICKNESS: i32 = 12;

/// Create a listbox with its (initially hidden) scrollbar child.
pub fn create(tree: &mut WidgetTree) -> WidgetId {
    let list = tree.create(WidgetKind::ListBox(ListBoxState::new()));
    let bar = scrollbar::create(tree, Orientation::Vertical);
    tree.attach(list, bar);
    if let Some(node) = tree.get_mut(bar) {
        node.visible = false;
    }
    if let Some(WidgetKind::ListBox(state)) = tree.get_mut(list).map(|n| &mut n.kind) {
        state.scrollbar = Some(bar);
    }
    list
}

fn state(tree: &WidgetTree, id: WidgetId) -> &ListBoxState {
    match tree.get(id).map(|n| &n.kind) {
        Some(WidgetKind::ListBox(state)) => state,
        _ => panic!("widget {id:?} is not a listbox"),
    }
}

fn state_mut(tree: &mut WidgetTree, id: WidgetId) -> &mut ListBoxState {
    match tree.get_mut(id).map(|n| &mut n.kind) {
        Some(WidgetKind::ListBox(state)) => state,
        _ => panic!("widget {id:?} is not a listbox"),
    }
}

pub fn item_count(tree: &WidgetTree, id: WidgetId) -> usize {
    state(tree, id).items().len()
}

/// Panics when `index >= item count`.
pub fn item(tree: &WidgetTree, id: WidgetId, index: usize) -> &ListItem {
    let s = state(tree, id);
    assert!(index < s.items().len(), "listbox index {index} out of bounds");
    &s.items()[index]
}

/// Append an item. Returns its index.
pub fn add_item(tree: &mut WidgetTree, id: WidgetId, item: ListItem) -> usize {
    let index = {
        let s = state_mut(tree, id);
        s.items.push(item);
        s.items.len() - 1
    };
    update_layout(tree, id);
    index
}

/// Insert an item at `index`.
///
/// Panics when `index > item count`.
pub fn insert_item(tree: &mut WidgetTree, id: WidgetId, index: usize, item: ListItem) {
    {
        let s = state_mut(tree, id);
        assert!(index <= s.items.len(), "listbox insert index {index} out of bounds");
        s.items.insert(index, item);
        if let Some(f) = s.focused_index
            && f >= index
        {
            s.focused_index = Some(f + 1);
        }
    }
    update_layout(tree, id);
}

/// Remove and return the item at `index`.
///
/// Panics when `index >= item count`.
pub fn remove_item(tree: &mut WidgetTree, id: WidgetId, index: usize) -> ListItem {
    let removed = {
        let s = state_mut(tree, id);
        assert!(index < s.items.len(), "listbox index {index} out of bounds");
        let removed = s.items.remove(index);
        s.focused_index = match s.focused_index {
            Some(f) if f > index => Some(f - 1),
            Some(f) if f == index && s.items.is_empty() => None,
            Some(f) => Some(f.min(s.items.len() - 1)),
            None => None,
        };
        removed
    };
    update_layout(tree, id);
    removed
}

pub fn clear_items(tree: &mut WidgetTree, id: WidgetId) {
    {
        let s = state_mut(tree, id);
        s.items.clear();
        s.focused_index = None;
    }
    update_layout(tree, id);
}

/// Select or deselect one item. In single-select mode, selecting an item
/// deselects every other item first. Emits `SelectionChanged` per item
/// whose state actually changed.
///
/// Panics when `index >= item count`.
pub fn set_selected(tree: &mut WidgetTree, id: WidgetId, index: usize, selected: bool) {
    let (count, multi) = {
        let s = state(tree, id);
        (s.items.len(), s.multi_select)
    };
    assert!(index < count, "listbox index {index} out of bounds");

    if selected && !multi {
        for other in 0..count {
            if other != index {
                change_selected(tree, id, other, false);
            }
        }
    }
    change_selected(tree, id, index, selected);
}

fn change_selected(tree: &mut WidgetTree, id: WidgetId, index: usize, selected: bool) {
    let changed = {
        let s = state_mut(tree, id);
        let item = &mut s.items[index];
        let changed = item.selected != selected;
        item.selected = selected;
        changed
    };
    if changed {
        trace!("listbox {id:?} item {index} selected={selected}");
        tree.push_event(crate::event::Event::new(
            id,
            crate::event::EventData::SelectionChanged { index, selected },
        ));
    }
}

pub fn clear_selection(tree: &mut WidgetTree, id: WidgetId) {
    for index in 0..item_count(tree, id) {
        change_selected(tree, id, index, false);
    }
}

pub fn selected_indices(tree: &WidgetTree, id: WidgetId) -> Vec<usize> {
    state(tree, id)
        .items()
        .iter()
        .enumerate()
        .filter_map(|(i, item)| item.selected.then_some(i))
        .collect()
}

/// The built-in scrollbar child, which [`create`] always attaches.
pub fn scrollbar_of(tree: &WidgetTree, id: WidgetId) -> WidgetId {
    match state(tree, id).scrollbar() {
        Some(bar) => bar,
        None => panic!("listbox {id:?} has no scrollbar"),
    }
}

/// Total pixel height of all rows.
fn content_height(tree: &WidgetTree, id: WidgetId) -> i32 {
    let s = state(tree, id);
    s.items.len() as i32 * s.item_height
}

/// Client area in listbox-local coordinates.
fn local_client(tree: &WidgetTree, id: WidgetId) -> Rect {
    tree.global_to_local_rect(id, tree.client_rectangle(id))
}

/// Current pixel scroll offset, clamped so the last row sits at the
/// viewport bottom rather than scrolling past it.
pub fn scroll_offset(tree: &WidgetTree, id: WidgetId) -> i32 {
    let Some(bar) = state(tree, id).scrollbar() else {
        return 0;
    };
    let max_offset = (content_height(tree, id) - local_client(tree, id).height).max(0);
    scrollbar::value(tree, bar).min(max_offset)
}

/// Position the scrollbar at the client area's right edge and refresh its
/// range from the content height. The bar is shown only when the content
/// overflows the viewport.
pub fn update_layout(tree: &mut WidgetTree, id: WidgetId) {
    let Some(bar) = state(tree, id).scrollbar() else {
        return;
    };
    let client = local_client(tree, id);
    let content = content_height(tree, id);
    let overflow = content > client.height;

    if let Some(node) = tree.get_mut(bar) {
        node.visible = overflow;
    }
    tree.set_rectangle(
        bar,
        Rect::new(
            client.x + client.width - SCROLLBAR_THICKNESS,
            client.y,
            SCROLLBAR_THICKNESS,
            client.height,
        ),
    );

    let single = state(tree, id).item_height.max(1);
    scrollbar::set_steps(tree, bar, single, client.height.max(1));
    scrollbar::set_range(tree, bar, 0, (content - 1).max(0));
}

/// Row rectangle in global coordinates, offset by the scroll position.
/// The row spans the client width minus the scrollbar when it is shown.
pub(crate) fn item_display_rect(tree: &WidgetTree, id: WidgetId, index: usize) -> Rect {
    let s = state(tree, id);
    let height = s.item_height;
    let bar_shown = s
        .scrollbar()
        .and_then(|b| tree.get(b))
        .is_some_and(|n| n.visible);
    let client = tree.client_rectangle(id);
    let width = if bar_shown {
        (client.width - SCROLLBAR_THICKNESS).max(0)
    } else {
        client.width
    };
    Rect::new(
        client.x,
        client.y + index as i32 * height - scroll_offset(tree, id),
        width,
        height,
    )
}

/// Indices of the rows intersecting the viewport.
pub(crate) fn visible_range(tree: &WidgetTree, id: WidgetId) -> std::ops::Range<usize> {
    let s = state(tree, id);
    let count = s.items.len();
    let height = s.item_height.max(1);
    let offset = scroll_offset(tree, id);
    let viewport = local_client(tree, id).height;
    let first = (offset / height).max(0) as usize;
    let last = (((offset + viewport + height - 1) / height).max(0) as usize).min(count);
    first.min(count)..last
}

/// Row index under a global point, accounting for the scroll offset.
/// `None` outside the client area, past the last row, or over the
/// scrollbar.
pub fn index_from_point(tree: &WidgetTree, id: WidgetId, pos: Point) -> Option<usize> {
    let client = tree.client_rectangle(id);
    if !client.contains(pos) {
        return None;
    }
    let s = state(tree, id);
    let bar_shown = s
        .scrollbar()
        .and_then(|b| tree.get(b))
        .is_some_and(|n| n.visible);
    if bar_shown && pos.x >= client.right() - SCROLLBAR_THICKNESS {
        return None;
    }
    let height = s.item_height.max(1);
    let index = (pos.y - client.y + scroll_offset(tree, id)) / height;
    (index >= 0 && (index as usize) < s.items.len()).then_some(index as usize)
}

/// Scroll the minimum amount that brings row `index` fully into view.
///
/// Panics when `index >= item count`.
pub fn ensure_visible(tree: &mut WidgetTree, id: WidgetId, index: usize) {
    let (count, height) = {
        let s = state(tree, id);
        (s.items.len(), s.item_height)
    };
    assert!(index < count, "listbox index {index} out of bounds");
    let Some(bar) = state(tree, id).scrollbar() else {
        return;
    };

    let viewport = local_client(tree, id).height;
    let offset = scroll_offset(tree, id);
    let row_top = index as i32 * height;
    let row_bottom = row_top + height;

    if row_top < offset {
        scrollbar::set_value(tree, bar, row_top);
    } else if row_bottom > offset + viewport {
        scrollbar::set_value(tree, bar, row_bottom - viewport);
    }
}

fn select_exclusive(tree: &mut WidgetTree, id: WidgetId, index: usize) {
    for other in 0..item_count(tree, id) {
        change_selected(tree, id, other, other == index);
    }
}

/// Mouse-down over the rows: plain click selects exclusively, Ctrl-click
/// toggles (multi-select only), Shift-click extends a contiguous range
/// from the focus anchor in either direction (multi-select only).
pub(crate) fn handle_mouse_down(
    tree: &mut WidgetTree,
    id: WidgetId,
    pos: Point,
    modifiers: Modifiers,
) {
    let Some(index) = index_from_point(tree, id, pos) else {
        return;
    };
    let (multi, anchor) = {
        let s = state(tree, id);
        (s.multi_select, s.focused_index)
    };

    if multi && modifiers.ctrl {
        let selected = !state(tree, id).items()[index].selected;
        change_selected(tree, id, index, selected);
        state_mut(tree, id).focused_index = Some(index);
    } else if multi && modifiers.shift {
        let anchor = anchor.unwrap_or(index);
        let (lo, hi) = (anchor.min(index), anchor.max(index));
        for other in 0..item_count(tree, id) {
            change_selected(tree, id, other, (lo..=hi).contains(&other));
        }
        // The anchor stays put so further shift-clicks pivot around it.
        state_mut(tree, id).focused_index = Some(anchor);
    } else {
        select_exclusive(tree, id, index);
        state_mut(tree, id).focused_index = Some(index);
    }
}

/// Keyboard navigation: Up/Left and Down/Right move the focused row by
/// one, select it exclusively, and scroll it into view. Returns whether
/// the key was consumed.
pub(crate) fn handle_key(tree: &mut WidgetTree, id: WidgetId, key: Key) -> bool {
    let delta: i32 = match key {
        Key::Up | Key::Left => -1,
        Key::Down | Key::Right => 1,
        _ => return false,
    };
    let count = item_count(tree, id);
    if count == 0 {
        return false;
    }
    let next = match state(tree, id).focused_index() {
        Some(f) => (f as i32 + delta).clamp(0, count as i32 - 1) as usize,
        None => 0,
    };
    select_exclusive(tree, id, next);
    state_mut(tree, id).focused_index = Some(next);
    ensure_visible(tree, id, next);
    true
}

/// Wheel over the listbox scrolls through the child scrollbar.
pub(crate) fn handle_wheel(tree: &mut WidgetTree, id: WidgetId, delta: i32) {
    if let Some(bar) = state(tree, id).scrollbar() {
        scrollbar::handle_wheel(tree, bar, delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, EventData, EventKind};

    /// 100x100 listbox, 16 px rows: six rows and a bit fit the viewport.
    fn listbox(tree: &mut WidgetTree, items: usize) -> WidgetId {
        let id = create(tree);
        tree.set_rectangle(id, Rect::new(0, 0, 100, 100));
        for i in 0..items {
            add_item(tree, id, ListItem::new(format!("item {i}")));
        }
        tree.take_events();
        id
    }

    #[test]
    fn scrollbar_appears_only_on_overflow() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 3);
        let bar = scrollbar_of(&tree, id);
        assert!(!tree.get(bar).is_some_and(|n| n.visible));

        for i in 3..20 {
            add_item(&mut tree, id, ListItem::new(format!("item {i}")));
        }
        assert!(tree.get(bar).is_some_and(|n| n.visible));
        // Pinned to the right edge of the client area.
        let r = tree.get(bar).map(|n| n.rectangle());
        assert_eq!(r, Some(Rect::new(88, 0, SCROLLBAR_THICKNESS, 100)));
    }

    #[test]
    fn single_select_is_exclusive() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 5);

        set_selected(&mut tree, id, 1, true);
        set_selected(&mut tree, id, 3, true);
        assert_eq!(selected_indices(&tree, id), vec![3]);

        let kinds: Vec<EventKind> = tree.take_events().iter().map(Event::kind).collect();
        // 1 on, then 1 off + 3 on.
        assert_eq!(kinds, vec![EventKind::SelectionChanged; 3]);
    }

    #[test]
    fn multi_select_accumulates() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 5);
        state_mut(&mut tree, id).multi_select = true;

        set_selected(&mut tree, id, 1, true);
        set_selected(&mut tree, id, 3, true);
        assert_eq!(selected_indices(&tree, id), vec![1, 3]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn select_out_of_bounds_panics() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 2);
        set_selected(&mut tree, id, 2, true);
    }

    #[test]
    #[should_panic(expected = "listbox index 2 out of bounds")]
    fn item_out_of_bounds_panics() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 2);
        item(&tree, id, 2);
    }

    #[test]
    fn selection_changed_fires_only_on_change() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 3);

        set_selected(&mut tree, id, 0, true);
        tree.take_events();
        set_selected(&mut tree, id, 0, true);
        assert!(tree.take_events().is_empty());
    }

    #[test]
    fn click_selects_row_under_point() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 5);

        // Row 2 spans y 32..48.
        handle_mouse_down(&mut tree, id, Point::new(10, 35), Modifiers::default());
        assert_eq!(selected_indices(&tree, id), vec![2]);
        assert_eq!(state(&tree, id).focused_index(), Some(2));
    }

    #[test]
    fn ctrl_click_toggles_in_multi_select() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 5);
        state_mut(&mut tree, id).multi_select = true;
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };

        handle_mouse_down(&mut tree, id, Point::new(10, 5), Modifiers::default());
        handle_mouse_down(&mut tree, id, Point::new(10, 35), ctrl);
        assert_eq!(selected_indices(&tree, id), vec![0, 2]);

        handle_mouse_down(&mut tree, id, Point::new(10, 35), ctrl);
        assert_eq!(selected_indices(&tree, id), vec![0]);
    }

    #[test]
    fn shift_click_extends_range_both_directions() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 6);
        state_mut(&mut tree, id).multi_select = true;
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };

        handle_mouse_down(&mut tree, id, Point::new(10, 35), Modifiers::default()); // row 2
        handle_mouse_down(&mut tree, id, Point::new(10, 70), shift); // row 4
        assert_eq!(selected_indices(&tree, id), vec![2, 3, 4]);

        // Pivot below the same anchor.
        handle_mouse_down(&mut tree, id, Point::new(10, 5), shift); // row 0
        assert_eq!(selected_indices(&tree, id), vec![0, 1, 2]);
        assert_eq!(state(&tree, id).focused_index(), Some(2));
    }

    #[test]
    fn keyboard_moves_focus_and_scrolls() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 20);

        assert!(handle_key(&mut tree, id, Key::Down));
        assert_eq!(selected_indices(&tree, id), vec![0]);

        for _ in 0..9 {
            handle_key(&mut tree, id, Key::Down);
        }
        assert_eq!(state(&tree, id).focused_index(), Some(9));
        // Row 9 (144..160) must be fully inside the 100 px viewport.
        let offset = scroll_offset(&tree, id);
        assert!(offset <= 144 && 160 <= offset + 100, "offset {offset}");

        // Up at the top clamps.
        for _ in 0..20 {
            handle_key(&mut tree, id, Key::Up);
        }
        assert_eq!(state(&tree, id).focused_index(), Some(0));
        assert_eq!(scroll_offset(&tree, id), 0);

        assert!(!handle_key(&mut tree, id, Key::Home));
    }

    #[test]
    fn index_from_point_accounts_for_scroll() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 20);
        let bar = scrollbar_of(&tree, id);
        scrollbar::set_value(&mut tree, bar, 32); // two rows scrolled off

        assert_eq!(index_from_point(&tree, id, Point::new(10, 5)), Some(2));
        // Over the scrollbar: no row.
        assert_eq!(index_from_point(&tree, id, Point::new(95, 5)), None);
        // Outside the widget.
        assert_eq!(index_from_point(&tree, id, Point::new(10, 150)), None);
    }

    #[test]
    fn ensure_visible_scrolls_minimally() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 20);

        ensure_visible(&mut tree, id, 9); // rows 144..160, viewport 100
        assert_eq!(scroll_offset(&tree, id), 60);

        // Already visible: no movement.
        ensure_visible(&mut tree, id, 5);
        assert_eq!(scroll_offset(&tree, id), 60);

        ensure_visible(&mut tree, id, 3); // rows 48..64, above the viewport
        assert_eq!(scroll_offset(&tree, id), 48);
    }

    #[test]
    fn remove_item_adjusts_focus() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 3);
        state_mut(&mut tree, id).focused_index = Some(2);

        let removed = remove_item(&mut tree, id, 0);
        assert_eq!(removed.text, "item 0");
        assert_eq!(state(&tree, id).focused_index(), Some(1));
        assert_eq!(item_count(&tree, id), 2);
    }

    #[test]
    fn visible_range_tracks_offset() {
        let mut tree = WidgetTree::new();
        let id = listbox(&mut tree, 20);
        let bar = scrollbar_of(&tree, id);

        assert_eq!(visible_range(&tree, id), 0..7); // 100 px shows rows 0..6 plus a sliver
        scrollbar::set_value(&mut tree, bar, 40);
        assert_eq!(visible_range(&tree, id), 2..9);
    }
}
