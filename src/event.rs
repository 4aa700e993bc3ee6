//! Event types dispatched to widgets and application handlers.
//!
//! Events are plain values. Widget-internal behavior (scrollbar drag,
//! listbox selection, textbox editing) reacts to them first; application
//! handlers registered on a `(widget, kind)` pair run after, multicast: a
//! handler returning `false` does not stop its siblings, it only flips the
//! advisory result honored by specific call sites (item drawing).

use crate::geometry::{Point, Size};
use crate::input::{Key, Modifiers, MouseButton};
use crate::tree::WidgetId;

/// Discriminant for handler registration and dispatch routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum EventKind {
    MouseEnter,
    MouseLeave,
    MouseMove,
    MouseDown,
    MouseUp,
    MouseWheel,
    MouseClick,
    MouseDoubleClick,
    KeyDown,
    KeyChar,
    KeyUp,
    Moved,
    Resized,
    Scroll,
    ValueChanged,
    TextChanged,
    SelectionChanged,
    DrawItem,
    Updating,
    Updated,
    Rendering,
    Rendered,
}

/// What kind of scroll interaction produced a `Scroll` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollEventKind {
    /// Arrow-button click or wheel notch: one `single_step`.
    SingleIncrement,
    SingleDecrement,
    /// Track click outside the thumb: one `page_step`.
    PageIncrement,
    PageDecrement,
    /// Thumb drag.
    ThumbTrack,
}

/// Event payload. Mouse positions are in global (screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventData {
    MouseEnter { pos: Point },
    MouseLeave,
    MouseMove { pos: Point },
    MouseDown { pos: Point, button: MouseButton },
    MouseUp { pos: Point, button: MouseButton },
    MouseWheel { pos: Point, delta: i32 },
    MouseClick { pos: Point, button: MouseButton },
    MouseDoubleClick { pos: Point, button: MouseButton },
    KeyDown { key: Key, modifiers: Modifiers },
    KeyChar { ch: char, modifiers: Modifiers },
    KeyUp { key: Key, modifiers: Modifiers },
    /// Widget position changed via `set_rectangle`.
    Moved { from: Point, to: Point },
    /// Widget size changed via `set_rectangle`.
    Resized { from: Size, to: Size },
    /// Scrollbar value changed through a user interaction.
    Scroll { kind: ScrollEventKind, old: i32, new: i32 },
    /// Scrollbar value changed through any `set_value` path.
    ValueChanged { old: i32, new: i32 },
    TextChanged,
    SelectionChanged { index: usize, selected: bool },
    /// A list item is about to be drawn. Advisory: a `false` handler result
    /// suppresses the item's default rendering.
    DrawItem { index: usize },
    Updating,
    Updated,
    Rendering,
    Rendered,
}

impl EventData {
    pub const fn kind(&self) -> EventKind {
        match self {
            EventData::MouseEnter { .. } => EventKind::MouseEnter,
            EventData::MouseLeave => EventKind::MouseLeave,
            EventData::MouseMove { .. } => EventKind::MouseMove,
            EventData::MouseDown { .. } => EventKind::MouseDown,
            EventData::MouseUp { .. } => EventKind::MouseUp,
            EventData::MouseWheel { .. } => EventKind::MouseWheel,
            EventData::MouseClick { .. } => EventKind::MouseClick,
            EventData::MouseDoubleClick { .. } => EventKind::MouseDoubleClick,
            EventData::KeyDown { .. } => EventKind::KeyDown,
            EventData::KeyChar { .. } => EventKind::KeyChar,
            EventData::KeyUp { .. } => EventKind::KeyUp,
            EventData::Moved { .. } => EventKind::Moved,
            EventData::Resized { .. } => EventKind::Resized,
            EventData::Scroll { .. } => EventKind::Scroll,
            EventData::ValueChanged { .. } => EventKind::ValueChanged,
            EventData::TextChanged => EventKind::TextChanged,
            EventData::SelectionChanged { .. } => EventKind::SelectionChanged,
            EventData::DrawItem { .. } => EventKind::DrawItem,
            EventData::Updating => EventKind::Updating,
            EventData::Updated => EventKind::Updated,
            EventData::Rendering => EventKind::Rendering,
            EventData::Rendered => EventKind::Rendered,
        }
    }
}

/// An event addressed to one widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    pub target: WidgetId,
    pub data: EventData,
}

impl Event {
    pub const fn new(target: WidgetId, data: EventData) -> Self {
        Self { target, data }
    }

    pub const fn kind(&self) -> EventKind {
        self.data.kind()
    }
}
