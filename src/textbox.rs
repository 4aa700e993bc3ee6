//! Single-line text box editing.
//!
//! Caret and selection anchor are char indices into the text; the active
//! selection is the span between them, in either direction. Every edit
//! funnels through [`apply_edit`] so max-length truncation, caret
//! clamping, the `TextChanged` event, and the caret blink reset happen in
//! one place.

use std::time::Instant;

use crate::event::{Event, EventData};
use crate::geometry::Point;
use crate::input::{Key, Modifiers};
use crate::text::TextMeasurer;
use crate::tree::{WidgetId, WidgetTree};
use crate::widget::{TextBoxState, WidgetKind};

/// Create a text box widget.
pub fn create(tree: &mut WidgetTree) -> WidgetId {
    tree.create(WidgetKind::TextBox(TextBoxState::new()))
}

fn state(tree: &WidgetTree, id: WidgetId) -> &TextBoxState {
    match tree.get(id).map(|n| &n.kind) {
        Some(WidgetKind::TextBox(state)) => state,
        _ => panic!("widget {id:?} is not a textbox"),
    }
}

fn state_mut(tree: &mut WidgetTree, id: WidgetId) -> &mut TextBoxState {
    match tree.get_mut(id).map(|n| &mut n.kind) {
        Some(WidgetKind::TextBox(state)) => state,
        _ => panic!("widget {id:?} is not a textbox"),
    }
}

pub fn text(tree: &WidgetTree, id: WidgetId) -> &str {
    state(tree, id).text()
}

/// Selection as an ordered `(low, high)` char-index pair.
pub(crate) fn selection_range(state: &TextBoxState) -> (usize, usize) {
    let (a, b) = (state.selection_start(), state.caret_position());
    (a.min(b), a.max(b))
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Truncate to `max_length` chars (0 = unlimited).
fn enforce_max(state: &TextBoxState, text: String) -> String {
    if state.max_length > 0 && char_count(&text) > state.max_length {
        text.chars().take(state.max_length).collect()
    } else {
        text
    }
}

/// The single mutation point: store `text` (truncated), move caret and
/// anchor to `caret` (clamped), reset the blink phase, and emit
/// `TextChanged` when the text actually changed.
fn apply_edit(tree: &mut WidgetTree, id: WidgetId, text: String, caret: usize) {
    let changed = {
        let s = state_mut(tree, id);
        let text = enforce_max(s, text);
        let changed = s.text != text;
        let len = char_count(&text);
        s.text = text;
        s.caret = caret.min(len);
        s.selection_start = s.caret;
        s.caret_visible = true;
        s.blink_start = Instant::now();
        changed
    };
    if changed {
        tree.push_event(Event::new(id, EventData::TextChanged));
    }
}

/// Replace the whole text. The selection collapses; the caret keeps its
/// position, clamped to the new length.
pub fn set_text(tree: &mut WidgetTree, id: WidgetId, text: impl Into<String>) {
    let caret = state(tree, id).caret_position();
    apply_edit(tree, id, text.into(), caret);
}

/// Select `length` chars starting at `start`. Out-of-range arguments are
/// clamped to the text, not rejected. The caret lands at the selection
/// end.
pub fn select_text(tree: &mut WidgetTree, id: WidgetId, start: usize, length: usize) {
    let s = state_mut(tree, id);
    let len = char_count(&s.text);
    let start = start.min(len);
    let end = start.saturating_add(length).min(len);
    s.selection_start = start;
    s.caret = end;
    s.caret_visible = true;
    s.blink_start = Instant::now();
}

pub fn select_all(tree: &mut WidgetTree, id: WidgetId) {
    let len = char_count(state(tree, id).text());
    select_text(tree, id, 0, len);
}

pub fn selected_text(tree: &WidgetTree, id: WidgetId) -> String {
    let s = state(tree, id);
    let (lo, hi) = selection_range(s);
    s.text.chars().take(hi).skip(lo).collect()
}

/// Delete the selected span, collapsing the caret to its start. No-op
/// without a selection.
pub fn remove_selected_text(tree: &mut WidgetTree, id: WidgetId) {
    let (lo, hi) = selection_range(state(tree, id));
    if lo == hi {
        return;
    }
    let s = state(tree, id);
    let new_text: String = s
        .text
        .chars()
        .enumerate()
        .filter_map(|(i, c)| (i < lo || i >= hi).then_some(c))
        .collect();
    apply_edit(tree, id, new_text, lo);
}

fn remove_char_at(tree: &mut WidgetTree, id: WidgetId, index: usize) {
    let s = state(tree, id);
    if index >= char_count(&s.text) {
        return;
    }
    let new_text: String = s
        .text
        .chars()
        .enumerate()
        .filter_map(|(i, c)| (i != index).then_some(c))
        .collect();
    apply_edit(tree, id, new_text, index);
}

/// Type one printable char at the caret. A selection is replaced; in
/// overwrite mode the char under the caret is replaced. A full
/// `max_length` box swallows the char.
pub(crate) fn handle_char(tree: &mut WidgetTree, id: WidgetId, ch: char) {
    let had_selection = {
        let (lo, hi) = selection_range(state(tree, id));
        lo != hi
    };
    if had_selection {
        remove_selected_text(tree, id);
    }

    let s = state(tree, id);
    let caret = s.caret_position();
    let len = char_count(&s.text);
    let overwrite = !s.insert_mode && !had_selection && caret < len;

    let new_text: String = s
        .text
        .chars()
        .enumerate()
        .flat_map(|(i, c)| {
            if i == caret {
                if overwrite {
                    vec![ch]
                } else {
                    vec![ch, c]
                }
            } else {
                vec![c]
            }
        })
        .collect();
    let new_text = if caret == len {
        let mut t = new_text;
        t.push(ch);
        t
    } else {
        new_text
    };

    // At capacity in insert mode nothing fits; leave the caret alone.
    if !overwrite && s.max_length > 0 && len >= s.max_length {
        return;
    }
    apply_edit(tree, id, new_text, caret + 1);
}

/// Caret target for Ctrl+Left: skip separators leftward, then the whole
/// alphanumeric run they terminate.
fn word_left(chars: &[char], caret: usize) -> usize {
    let mut i = caret;
    while i > 0 && !chars[i - 1].is_alphanumeric() {
        i -= 1;
    }
    while i > 0 && chars[i - 1].is_alphanumeric() {
        i -= 1;
    }
    i
}

/// Caret target for Ctrl+Right: skip the current alphanumeric run, then
/// the separators after it.
fn word_right(chars: &[char], caret: usize) -> usize {
    let mut i = caret;
    while i < chars.len() && chars[i].is_alphanumeric() {
        i += 1;
    }
    while i < chars.len() && !chars[i].is_alphanumeric() {
        i += 1;
    }
    i
}

/// Move the caret to `target`; Shift extends the selection from the
/// current anchor, otherwise the selection collapses.
fn move_caret(tree: &mut WidgetTree, id: WidgetId, target: usize, extend: bool) {
    let s = state_mut(tree, id);
    let len = char_count(&s.text);
    s.caret = target.min(len);
    if !extend {
        s.selection_start = s.caret;
    }
    s.caret_visible = true;
    s.blink_start = Instant::now();
}

/// Editing and navigation keys. Returns whether the key was consumed.
pub(crate) fn handle_key(tree: &mut WidgetTree, id: WidgetId, key: Key, modifiers: Modifiers) -> bool {
    let (caret, len, chars) = {
        let s = state(tree, id);
        let chars: Vec<char> = s.text.chars().collect();
        (s.caret_position(), chars.len(), chars)
    };
    let extend = modifiers.shift;

    match key {
        Key::Left => {
            let target = if modifiers.ctrl {
                word_left(&chars, caret)
            } else {
                caret.saturating_sub(1)
            };
            move_caret(tree, id, target, extend);
        }
        Key::Right => {
            let target = if modifiers.ctrl {
                word_right(&chars, caret)
            } else {
                caret + 1
            };
            move_caret(tree, id, target, extend);
        }
        Key::Home => move_caret(tree, id, 0, extend),
        Key::End => move_caret(tree, id, len, extend),
        Key::Backspace => {
            let (lo, hi) = selection_range(state(tree, id));
            if lo != hi {
                remove_selected_text(tree, id);
            } else if caret > 0 {
                remove_char_at(tree, id, caret - 1);
            }
        }
        Key::Delete => {
            let (lo, hi) = selection_range(state(tree, id));
            if lo != hi {
                remove_selected_text(tree, id);
            } else {
                remove_char_at(tree, id, caret);
            }
        }
        Key::Insert => {
            let s = state_mut(tree, id);
            s.insert_mode = !s.insert_mode;
        }
        _ => return false,
    }
    true
}

/// Char boundary nearest to a global point, for click caret placement.
pub(crate) fn caret_from_point(
    tree: &WidgetTree,
    id: WidgetId,
    pos: Point,
    measurer: &dyn TextMeasurer,
) -> usize {
    let s = state(tree, id);
    let Some(font) = tree.get(id).and_then(|n| n.font) else {
        return s.caret_position();
    };
    let client = tree.client_rectangle(id);
    let x = pos.x - client.x;
    let display = s.display_text();
    let len = char_count(&display);

    let mut best = 0;
    let mut best_dist = i32::MAX;
    for i in 0..=len {
        let prefix: String = display.chars().take(i).collect();
        let w = measurer.measure(&prefix, font).width;
        let dist = (x - w).abs();
        if dist < best_dist {
            best = i;
            best_dist = dist;
        }
    }
    best
}

/// Click places the caret; Shift-click extends the selection to it.
pub(crate) fn handle_mouse_down(
    tree: &mut WidgetTree,
    id: WidgetId,
    pos: Point,
    modifiers: Modifiers,
    measurer: &dyn TextMeasurer,
) {
    let target = caret_from_point(tree, id, pos, measurer);
    move_caret(tree, id, target, modifiers.shift);
}

/// Advance the wall-clock blink phase: the caret is visible on even
/// periods since the last interaction.
pub(crate) fn update_blink(tree: &mut WidgetTree, id: WidgetId, now: Instant) {
    let s = state_mut(tree, id);
    let period = s.caret_blink_time;
    if period.is_zero() {
        s.caret_visible = true;
        return;
    }
    let phases = now.saturating_duration_since(s.blink_start).as_millis() / period.as_millis().max(1);
    s.caret_visible = phases % 2 == 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn textbox(tree: &mut WidgetTree, text: &str) -> WidgetId {
        let id = create(tree);
        set_text(tree, id, text);
        tree.take_events();
        id
    }

    #[test]
    fn set_text_fires_once_and_collapses_selection() {
        let mut tree = WidgetTree::new();
        let id = create(&mut tree);

        set_text(&mut tree, id, "hello");
        assert_eq!(text(&tree, id), "hello");
        assert_eq!(state(&tree, id).selection_length(), 0);
        assert_eq!(tree.take_events().len(), 1);

        // Same text: no event.
        set_text(&mut tree, id, "hello");
        assert!(tree.take_events().is_empty());
    }

    #[test]
    fn set_text_keeps_caret_clamped_to_new_length() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "hello world");
        move_caret(&mut tree, id, 8, false);

        set_text(&mut tree, id, "hi");
        assert_eq!(state(&tree, id).caret_position(), 2);

        set_text(&mut tree, id, "hello again");
        assert_eq!(state(&tree, id).caret_position(), 2);
    }

    #[test]
    fn max_length_truncates_by_chars() {
        let mut tree = WidgetTree::new();
        let id = create(&mut tree);
        state_mut(&mut tree, id).max_length = 4;

        set_text(&mut tree, id, "über-long");
        assert_eq!(text(&tree, id), "über");
    }

    #[test]
    fn select_text_clamps_instead_of_rejecting() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "hello");

        select_text(&mut tree, id, 2, 100);
        assert_eq!(selected_text(&tree, id), "llo");

        select_text(&mut tree, id, 99, 5);
        assert_eq!(selected_text(&tree, id), "");
        assert_eq!(state(&tree, id).caret_position(), 5);
    }

    #[test]
    fn typing_inserts_at_caret() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "ac");
        move_caret(&mut tree, id, 1, false);

        handle_char(&mut tree, id, 'b');
        assert_eq!(text(&tree, id), "abc");
        assert_eq!(state(&tree, id).caret_position(), 2);
    }

    #[test]
    fn typing_replaces_selection() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "hello world");
        select_text(&mut tree, id, 5, 6);

        handle_char(&mut tree, id, '!');
        assert_eq!(text(&tree, id), "hello!");
        assert_eq!(state(&tree, id).selection_length(), 0);
    }

    #[test]
    fn overwrite_mode_replaces_char_under_caret() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "abc");
        state_mut(&mut tree, id).insert_mode = false;
        move_caret(&mut tree, id, 1, false);

        handle_char(&mut tree, id, 'X');
        assert_eq!(text(&tree, id), "aXc");
        assert_eq!(state(&tree, id).caret_position(), 2);

        // At the end overwrite appends.
        move_caret(&mut tree, id, 3, false);
        handle_char(&mut tree, id, '!');
        assert_eq!(text(&tree, id), "aXc!");
    }

    #[test]
    fn full_box_swallows_insert() {
        let mut tree = WidgetTree::new();
        let id = create(&mut tree);
        state_mut(&mut tree, id).max_length = 3;
        set_text(&mut tree, id, "abc");
        tree.take_events();

        handle_char(&mut tree, id, 'd');
        assert_eq!(text(&tree, id), "abc");
        assert!(tree.take_events().is_empty());
    }

    #[test]
    fn backspace_and_delete() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "abc");
        move_caret(&mut tree, id, 2, false);

        handle_key(&mut tree, id, Key::Backspace, Modifiers::default());
        assert_eq!(text(&tree, id), "ac");
        assert_eq!(state(&tree, id).caret_position(), 1);

        handle_key(&mut tree, id, Key::Delete, Modifiers::default());
        assert_eq!(text(&tree, id), "a");

        // Delete at the end is a no-op.
        handle_key(&mut tree, id, Key::Delete, Modifiers::default());
        assert_eq!(text(&tree, id), "a");
    }

    #[test]
    fn backspace_removes_whole_selection() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "hello world");
        select_text(&mut tree, id, 5, 6);

        handle_key(&mut tree, id, Key::Backspace, Modifiers::default());
        assert_eq!(text(&tree, id), "hello");
        assert_eq!(state(&tree, id).caret_position(), 5);
    }

    #[test]
    fn ctrl_left_hops_word_starts() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "foo  bar-baz");
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };

        move_caret(&mut tree, id, 12, false);
        handle_key(&mut tree, id, Key::Left, ctrl);
        assert_eq!(state(&tree, id).caret_position(), 9);
        handle_key(&mut tree, id, Key::Left, ctrl);
        assert_eq!(state(&tree, id).caret_position(), 5);
        handle_key(&mut tree, id, Key::Left, ctrl);
        assert_eq!(state(&tree, id).caret_position(), 0);
        // Pinned at the start.
        handle_key(&mut tree, id, Key::Left, ctrl);
        assert_eq!(state(&tree, id).caret_position(), 0);
    }

    #[test]
    fn ctrl_right_hops_past_separators() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "foo  bar-baz");
        let ctrl = Modifiers {
            ctrl: true,
            ..Default::default()
        };

        move_caret(&mut tree, id, 0, false);
        handle_key(&mut tree, id, Key::Right, ctrl);
        assert_eq!(state(&tree, id).caret_position(), 5);
        handle_key(&mut tree, id, Key::Right, ctrl);
        assert_eq!(state(&tree, id).caret_position(), 9);
        handle_key(&mut tree, id, Key::Right, ctrl);
        assert_eq!(state(&tree, id).caret_position(), 12);
    }

    #[test]
    fn shift_arrows_grow_a_directionless_selection() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "abcdef");
        let shift = Modifiers {
            shift: true,
            ..Default::default()
        };
        move_caret(&mut tree, id, 3, false);

        handle_key(&mut tree, id, Key::Right, shift);
        handle_key(&mut tree, id, Key::Right, shift);
        assert_eq!(selected_text(&tree, id), "de");

        // Walking back through the anchor flips direction.
        for _ in 0..4 {
            handle_key(&mut tree, id, Key::Left, shift);
        }
        assert_eq!(selected_text(&tree, id), "bc");
        assert_eq!(state(&tree, id).caret_position(), 1);

        // Plain arrow collapses.
        handle_key(&mut tree, id, Key::Right, Modifiers::default());
        assert_eq!(state(&tree, id).selection_length(), 0);
    }

    #[test]
    fn home_end_jump() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "abcdef");
        move_caret(&mut tree, id, 3, false);

        handle_key(&mut tree, id, Key::Home, Modifiers::default());
        assert_eq!(state(&tree, id).caret_position(), 0);
        handle_key(&mut tree, id, Key::End, Modifiers::default());
        assert_eq!(state(&tree, id).caret_position(), 6);
    }

    #[test]
    fn insert_key_toggles_mode() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "");
        assert!(state(&tree, id).insert_mode);
        handle_key(&mut tree, id, Key::Insert, Modifiers::default());
        assert!(!state(&tree, id).insert_mode);
    }

    #[test]
    fn caret_from_point_picks_nearest_boundary() {
        use crate::geometry::Rect;
        use crate::style::FontId;
        use crate::text::FixedMeasure;

        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "abcd");
        tree.set_rectangle(id, Rect::new(0, 0, 100, 20));
        if let Some(node) = tree.get_mut(id) {
            node.font = Some(FontId(0));
        }
        let m = FixedMeasure::default(); // 8 px per char

        assert_eq!(caret_from_point(&tree, id, Point::new(0, 5), &m), 0);
        assert_eq!(caret_from_point(&tree, id, Point::new(11, 5), &m), 1);
        assert_eq!(caret_from_point(&tree, id, Point::new(13, 5), &m), 2);
        assert_eq!(caret_from_point(&tree, id, Point::new(500, 5), &m), 4);
    }

    #[test]
    fn blink_toggles_each_period() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "a");
        let start = state(&tree, id).blink_start;

        update_blink(&mut tree, id, start + Duration::from_millis(100));
        assert!(state(&tree, id).caret_visible());
        update_blink(&mut tree, id, start + Duration::from_millis(600));
        assert!(!state(&tree, id).caret_visible());
        update_blink(&mut tree, id, start + Duration::from_millis(1100));
        assert!(state(&tree, id).caret_visible());
    }

    #[test]
    fn interaction_resets_blink_to_visible() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "abc");
        let start = state(&tree, id).blink_start;
        update_blink(&mut tree, id, start + Duration::from_millis(600));
        assert!(!state(&tree, id).caret_visible());

        move_caret(&mut tree, id, 1, false);
        assert!(state(&tree, id).caret_visible());
    }

    #[test]
    fn password_masking_is_display_only() {
        let mut tree = WidgetTree::new();
        let id = textbox(&mut tree, "secret");
        state_mut(&mut tree, id).password_char = Some('*');

        assert_eq!(state(&tree, id).display_text(), "******");
        assert_eq!(text(&tree, id), "secret");
    }
}
