//! Retained-mode widget core: tree, event routing, and the three
//! state-machine widgets (scrollbar, listbox, textbox). Rendering, input
//! devices, fonts, and persistence are collaborator traits the host
//! implements.

pub mod event;
pub mod geometry;
pub mod input;
pub mod listbox;
pub mod reflect;
pub mod render;
pub mod scrollbar;
pub mod style;
pub mod system;
pub mod text;
pub mod textbox;
pub mod tree;
pub mod widget;

pub use event::{Event, EventData, EventKind, ScrollEventKind};
pub use geometry::{Edges, Point, Rect, Size};
pub use input::{InputState, Key, Modifiers, MouseButton};
pub use render::{DrawCommand, DrawList, Renderer};
pub use system::UiSystem;
pub use text::{FixedMeasure, TextMeasurer};
pub use tree::{WidgetId, WidgetNode, WidgetTree};
pub use widget::{ListItem, Orientation, WidgetKind};
