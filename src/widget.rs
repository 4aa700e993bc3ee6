//! Widget kinds and their per-kind state.
//!
//! Flat enum identity: the set of widget kinds is closed, so behavior is a
//! `match` in the dispatch and render paths instead of trait objects.
//! Composite widgets (scrollbar arrows/thumb, a listbox's scrollbar) are
//! ordinary child widgets in the tree, keyed back to their owner through
//! the parent link.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::tree::WidgetId;

/// Scrollbar axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Role of a scrollbar child widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollPart {
    /// Arrow button at the track start (left/top).
    Decrement,
    /// Arrow button at the track end (right/bottom).
    Increment,
    /// Draggable thumb.
    Thumb,
}

/// Active thumb drag, recorded on mouse-down over the thumb.
#[derive(Debug, Clone, Copy)]
pub struct ThumbDrag {
    /// Mouse coordinate along the scroll axis when the drag began.
    pub start_coord: i32,
    /// Scrollbar value when the drag began.
    pub start_value: i32,
}

/// Continuous value model of a scrollbar.
///
/// `value` stays in `[minimum, maximum]`; thumb-driven changes are further
/// clamped to `maximum - page_step + 1` so a full page never overflows the
/// track. Mutate through `scrollbar::set_value` / `set_thumb_value`.
#[derive(Debug, Clone)]
pub struct ScrollBarState {
    pub minimum: i32,
    pub maximum: i32,
    pub(crate) value: i32,
    pub single_step: i32,
    pub page_step: i32,
    pub orientation: Orientation,
    pub(crate) drag: Option<ThumbDrag>,
}

impl ScrollBarState {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            minimum: 0,
            maximum: 100,
            value: 0,
            single_step: 1,
            page_step: 10,
            orientation,
            drag: None,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    /// Value span. Zero for a degenerate range.
    pub fn range(&self) -> i32 {
        (self.maximum - self.minimum).max(0)
    }
}

/// One entry in a listbox. Items are plain data owned by the listbox state;
/// the owner is the widget the state lives on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    pub selected: bool,
    /// Free-form application tag.
    pub tag: i64,
}

impl ListItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            selected: false,
            tag: 0,
        }
    }
}

/// Selection model and scroll coupling of a listbox.
#[derive(Debug, Clone)]
pub struct ListBoxState {
    pub(crate) items: Vec<ListItem>,
    /// Allow more than one selected item (Ctrl/Shift click semantics).
    pub multi_select: bool,
    /// Anchor for keyboard navigation and shift-extension.
    pub(crate) focused_index: Option<usize>,
    /// Fixed row height in pixels.
    pub item_height: i32,
    /// Child vertical scrollbar, created alongside the listbox.
    pub(crate) scrollbar: Option<WidgetId>,
}

impl ListBoxState {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            multi_select: false,
            focused_index: None,
            item_height: 16,
            scrollbar: None,
        }
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused_index
    }

    pub fn scrollbar(&self) -> Option<WidgetId> {
        self.scrollbar
    }
}

impl Default for ListBoxState {
    fn default() -> Self {
        Self::new()
    }
}

/// Caret / selection state machine of a single-line text box.
///
/// `caret` and `selection_start` are char indices; the active selection is
/// the range between them, direction-agnostic. Mutate through the
/// `textbox` module so every edit funnels through `set_text`.
#[derive(Debug, Clone)]
pub struct TextBoxState {
    pub(crate) text: String,
    pub(crate) caret: usize,
    pub(crate) selection_start: usize,
    /// Maximum text length in chars; 0 = unlimited.
    pub max_length: usize,
    /// Display-only mask; the underlying text stays unmasked.
    pub password_char: Option<char>,
    /// False = overwrite mode: typing replaces the char at the caret.
    pub insert_mode: bool,
    pub(crate) caret_visible: bool,
    /// Wall-clock blink period.
    pub caret_blink_time: Duration,
    pub(crate) blink_start: Instant,
}

impl TextBoxState {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            caret: 0,
            selection_start: 0,
            max_length: 0,
            password_char: None,
            insert_mode: true,
            caret_visible: true,
            caret_blink_time: Duration::from_millis(500),
            blink_start: Instant::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret_position(&self) -> usize {
        self.caret
    }

    pub fn selection_start(&self) -> usize {
        self.selection_start
    }

    pub fn selection_length(&self) -> usize {
        self.caret.abs_diff(self.selection_start)
    }

    pub fn caret_visible(&self) -> bool {
        self.caret_visible
    }

    /// Text as shown: masked when a password char is set.
    pub fn display_text(&self) -> String {
        match self.password_char {
            Some(mask) => mask.to_string().repeat(self.text.chars().count()),
            None => self.text.clone(),
        }
    }
}

impl Default for TextBoxState {
    fn default() -> Self {
        Self::new()
    }
}

/// Widget identity plus kind-specific state.
#[derive(Debug, Clone)]
pub enum WidgetKind {
    /// Generic container: background, frame, children.
    Panel,
    /// Static text.
    Label { text: String },
    /// Clickable element with a text caption.
    Button { text: String },
    ScrollBar(ScrollBarState),
    /// Internal scrollbar child (arrow buttons, thumb).
    ScrollPart(ScrollPart),
    ListBox(ListBoxState),
    TextBox(TextBoxState),
}

impl WidgetKind {
    /// Short name for logs and diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            WidgetKind::Panel => "Panel",
            WidgetKind::Label { .. } => "Label",
            WidgetKind::Button { .. } => "Button",
            WidgetKind::ScrollBar(_) => "ScrollBar",
            WidgetKind::ScrollPart(_) => "ScrollPart",
            WidgetKind::ListBox(_) => "ListBox",
            WidgetKind::TextBox(_) => "TextBox",
        }
    }
}
