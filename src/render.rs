//! Renderer collaborator boundary and default widget drawing.
//!
//! The widget system draws through the [`Renderer`] trait; the host plugs
//! in its GPU backend. [`DrawList`] records commands instead of drawing,
//! which is what the tests and headless hosts use to assert on output.
//!
//! Drawing is defensive against partially-configured widgets: a missing
//! font skips text, a missing background image falls back to the solid
//! fill, absent frame/background draw nothing.

use crate::geometry::{Point, Rect};
use crate::style::{Color, FontId, TextureId};
use crate::text::TextMeasurer;
use crate::textbox;
use crate::tree::{WidgetId, WidgetTree};
use crate::widget::{Orientation, ScrollPart, WidgetKind};

/// Draw-call surface the embedding renderer must provide.
pub trait Renderer {
    /// Stroke a rectangle outline, one pixel wide.
    fn draw_rectangle(&mut self, rect: Rect, color: Color);
    fn fill_rectangle(&mut self, rect: Rect, color: Color);
    fn draw_line(&mut self, from: Point, to: Point, color: Color);
    fn draw_circle(&mut self, center: Point, radius: i32, color: Color);
    fn fill_circle(&mut self, center: Point, radius: i32, color: Color);
    fn draw_triangle(&mut self, a: Point, b: Point, c: Point, color: Color);
    fn fill_triangle(&mut self, a: Point, b: Point, c: Point, color: Color);
    /// Single-line text at `origin` (top-left of the line box).
    fn draw_text(&mut self, text: &str, origin: Point, font: FontId, color: Color);
    fn draw_image(&mut self, texture: TextureId, dest: Rect, alpha_blend: bool);
    /// `None` disables scissoring.
    fn set_scissor(&mut self, rect: Option<Rect>);
}

/// One recorded draw call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    StrokeRect { rect: Rect, color: Color },
    FillRect { rect: Rect, color: Color },
    Line { from: Point, to: Point, color: Color },
    Circle { center: Point, radius: i32, color: Color, filled: bool },
    Triangle { a: Point, b: Point, c: Point, color: Color, filled: bool },
    Text { text: String, origin: Point, font: FontId, color: Color },
    Image { texture: TextureId, dest: Rect, alpha_blend: bool },
    Scissor(Option<Rect>),
}

/// Collects draw commands from the widget tree.
/// Decouples widget logic from GPU renderers.
#[derive(Debug, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// All recorded text runs, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Active scissor rectangle at the command at `index`, if any.
    pub fn scissor_before(&self, index: usize) -> Option<Rect> {
        self.commands[..index]
            .iter()
            .rev()
            .find_map(|c| match c {
                DrawCommand::Scissor(r) => Some(*r),
                _ => None,
            })
            .flatten()
    }
}

impl Renderer for DrawList {
    fn draw_rectangle(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::StrokeRect { rect, color });
    }

    fn fill_rectangle(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn draw_line(&mut self, from: Point, to: Point, color: Color) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn draw_circle(&mut self, center: Point, radius: i32, color: Color) {
        self.commands.push(DrawCommand::Circle { center, radius, color, filled: false });
    }

    fn fill_circle(&mut self, center: Point, radius: i32, color: Color) {
        self.commands.push(DrawCommand::Circle { center, radius, color, filled: true });
    }

    fn draw_triangle(&mut self, a: Point, b: Point, c: Point, color: Color) {
        self.commands.push(DrawCommand::Triangle { a, b, c, color, filled: false });
    }

    fn fill_triangle(&mut self, a: Point, b: Point, c: Point, color: Color) {
        self.commands.push(DrawCommand::Triangle { a, b, c, color, filled: true });
    }

    fn draw_text(&mut self, text: &str, origin: Point, font: FontId, color: Color) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            origin,
            font,
            color,
        });
    }

    fn draw_image(&mut self, texture: TextureId, dest: Rect, alpha_blend: bool) {
        self.commands.push(DrawCommand::Image { texture, dest, alpha_blend });
    }

    fn set_scissor(&mut self, rect: Option<Rect>) {
        self.commands.push(DrawCommand::Scissor(rect));
    }
}

// ----------------------------------------------------------------------
// Default widget drawing
// ----------------------------------------------------------------------

/// Background fill/image and frame strokes shared by every kind.
pub(crate) fn draw_common(tree: &WidgetTree, id: WidgetId, renderer: &mut dyn Renderer) {
    let Some(node) = tree.get(id) else { return };
    let bounds = tree.displayed_rectangle(id);

    if let Some(bg) = node.background {
        match bg.image {
            Some(texture) => renderer.draw_image(texture, bounds, true),
            None => renderer.fill_rectangle(bounds, bg.color),
        }
    }
    if let Some(frame) = node.frame {
        // One stroke per pixel of thickness, walking inward.
        let mut r = bounds;
        for _ in 0..frame.width.max(0) {
            if r.is_empty() {
                break;
            }
            renderer.draw_rectangle(r, frame.color);
            r = Rect::new(r.x + 1, r.y + 1, r.width - 2, r.height - 2);
        }
    }
}

/// Caption text centered in the client area. No font, no text.
pub(crate) fn draw_caption(
    tree: &WidgetTree,
    id: WidgetId,
    text: &str,
    renderer: &mut dyn Renderer,
    measurer: &dyn TextMeasurer,
) {
    let Some(node) = tree.get(id) else { return };
    let Some(font) = node.font else { return };
    let client = tree.client_rectangle(id);
    let measured = measurer.measure(text, font);
    let origin = Point::new(
        client.x + (client.width - measured.width).max(0) / 2,
        client.y + (client.height - measured.height).max(0) / 2,
    );
    renderer.draw_text(text, origin, font, node.foreground);
}

/// Arrow-button and thumb drawing for scrollbar children.
pub(crate) fn draw_scroll_part(
    tree: &WidgetTree,
    id: WidgetId,
    part: ScrollPart,
    renderer: &mut dyn Renderer,
) {
    let Some(node) = tree.get(id) else { return };
    let bounds = tree.displayed_rectangle(id);
    if bounds.is_empty() {
        return;
    }
    let color = node.foreground;
    let horizontal = node
        .parent()
        .and_then(|p| tree.get(p))
        .is_some_and(|n| matches!(
            &n.kind,
            WidgetKind::ScrollBar(s) if s.orientation == Orientation::Horizontal
        ));
    match part {
        ScrollPart::Thumb => {
            // Body came from draw_common; add a grip line across the middle.
            let cx = bounds.x + bounds.width / 2;
            let cy = bounds.y + bounds.height / 2;
            if horizontal {
                renderer.draw_line(
                    Point::new(cx, bounds.y + 2),
                    Point::new(cx, bounds.bottom() - 3),
                    color,
                );
            } else {
                renderer.draw_line(
                    Point::new(bounds.x + 2, cy),
                    Point::new(bounds.right() - 3, cy),
                    color,
                );
            }
        }
        ScrollPart::Decrement | ScrollPart::Increment => {
            let (a, b, c) = arrow_points(bounds, horizontal, part == ScrollPart::Decrement);
            renderer.fill_triangle(a, b, c, color);
        }
    }
}

fn arrow_points(bounds: Rect, horizontal: bool, toward_start: bool) -> (Point, Point, Point) {
    let inset = Rect::new(
        bounds.x + bounds.width / 4,
        bounds.y + bounds.height / 4,
        (bounds.width / 2).max(1),
        (bounds.height / 2).max(1),
    );
    if horizontal {
        let tip_x = if toward_start { inset.x } else { inset.right() };
        let base_x = if toward_start { inset.right() } else { inset.x };
        (
            Point::new(tip_x, inset.y + inset.height / 2),
            Point::new(base_x, inset.y),
            Point::new(base_x, inset.bottom()),
        )
    } else {
        let tip_y = if toward_start { inset.y } else { inset.bottom() };
        let base_y = if toward_start { inset.bottom() } else { inset.y };
        (
            Point::new(inset.x + inset.width / 2, tip_y),
            Point::new(inset.x, base_y),
            Point::new(inset.right(), base_y),
        )
    }
}

/// One listbox row: selection fill plus the item text, at the row's
/// on-screen rectangle (already offset by the scroll position).
pub(crate) fn draw_list_item(
    tree: &WidgetTree,
    id: WidgetId,
    index: usize,
    row: Rect,
    renderer: &mut dyn Renderer,
) {
    let Some(node) = tree.get(id) else { return };
    let WidgetKind::ListBox(state) = &node.kind else {
        return;
    };
    let Some(item) = state.items().get(index) else {
        return;
    };

    if item.selected {
        renderer.fill_rectangle(row, [0.2, 0.4, 0.8, 1.0]);
    }
    if let Some(font) = node.font {
        let color = if item.selected {
            [1.0, 1.0, 1.0, 1.0]
        } else {
            node.foreground
        };
        renderer.draw_text(&item.text, Point::new(row.x + 2, row.y), font, color);
    }
}

/// Text, selection highlight, and caret for a text box.
pub(crate) fn draw_textbox(
    tree: &WidgetTree,
    id: WidgetId,
    focused: bool,
    renderer: &mut dyn Renderer,
    measurer: &dyn TextMeasurer,
) {
    let Some(node) = tree.get(id) else { return };
    let WidgetKind::TextBox(state) = &node.kind else {
        return;
    };
    let Some(font) = node.font else { return };
    let client = tree.client_rectangle(id);
    let display = state.display_text();

    if state.selection_length() > 0 {
        let (lo, hi) = textbox::selection_range(state);
        let prefix: String = display.chars().take(lo).collect();
        let span: String = display.chars().take(hi).skip(lo).collect();
        let x0 = client.x + measurer.measure(&prefix, font).width;
        let w = measurer.measure(&span, font).width;
        renderer.fill_rectangle(
            Rect::new(x0, client.y, w, client.height),
            [0.3, 0.5, 0.9, 0.5],
        );
    }

    renderer.draw_text(&display, Point::new(client.x, client.y), font, node.foreground);

    if focused && state.caret_visible() {
        let prefix: String = display.chars().take(state.caret_position()).collect();
        let caret_x = client.x + measurer.measure(&prefix, font).width;
        renderer.draw_line(
            Point::new(caret_x, client.y),
            Point::new(caret_x, client.bottom() - 1),
            node.foreground,
        );
    }
}

/// Kind-specific drawing (after `draw_common`). Listbox rows are drawn by
/// the system so the advisory draw-item event can veto each row.
pub(crate) fn draw_widget(
    tree: &WidgetTree,
    id: WidgetId,
    focused: bool,
    renderer: &mut dyn Renderer,
    measurer: &dyn TextMeasurer,
) {
    let Some(node) = tree.get(id) else { return };
    match &node.kind {
        WidgetKind::Panel | WidgetKind::ListBox(_) | WidgetKind::ScrollBar(_) => {}
        WidgetKind::Label { text } | WidgetKind::Button { text } => {
            let text = text.clone();
            draw_caption(tree, id, &text, renderer, measurer);
        }
        WidgetKind::ScrollPart(part) => draw_scroll_part(tree, id, *part, renderer),
        WidgetKind::TextBox(_) => draw_textbox(tree, id, focused, renderer, measurer),
    }
}
