//! Event dispatch and per-tick update.
//!
//! [`UiSystem`] owns the widget tree plus the dispatch state: hover,
//! capture, and focus. Once per tick the host hands it an input snapshot;
//! the system hit-tests, routes events in a fixed order, runs built-in
//! widget behavior, then multicasts to application handlers.
//!
//! Update order within one tick:
//!   1.  `Updating` / `Updated` recursion over the whole tree: pre event,
//!       children in forward order, post event, per widget
//!   2.  hit test at the cursor (capture overrides the dispatch target,
//!       hover keeps tracking the hit)
//!   3.  `MouseEnter` to the newly hovered widget
//!   4.  `MouseMove` when the cursor moved
//!   5.  `MouseDown` per pressed button; left press focuses the target
//!       and raises its z-order
//!   6.  `MouseWheel`, routed to the nearest scrollable ancestor
//!   7.  `MouseUp` per released button
//!   8.  `MouseLeave` to the previously hovered widget
//!   9.  capture released when any button went up
//!   10. keyboard events to the focused widget
//!   11. `MouseClick` / `MouseDoubleClick` from press/release pairing
//!   12. caret blink, pending widget events, deferred destruction
//!
//! Handlers are multicast per `(widget, kind)`; a `false` return does not
//! stop siblings, it only flips the advisory result that item drawing
//! honors. Handlers may mutate the system, register more handlers, or
//! destroy widgets; destruction is deferred to the end of the tick.

use std::collections::HashMap;
use std::mem;
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::event::{Event, EventData, EventKind};
use crate::geometry::{Point, Rect, Size};
use crate::input::{InputState, Modifiers, MouseButton};
use crate::render::{self, Renderer};
use crate::text::{FixedMeasure, TextMeasurer};
use crate::tree::{WidgetId, WidgetTree};
use crate::widget::{ScrollPart, WidgetKind};
use crate::{listbox, scrollbar, textbox};

/// Application event handler. The advisory `bool` result is honored by
/// specific dispatch sites (item drawing); `false` never stops siblings.
pub type EventHandler = Box<dyn FnMut(&mut UiSystem, &Event) -> bool>;

const fn button_index(button: MouseButton) -> usize {
    match button {
        MouseButton::Left => 0,
        MouseButton::Right => 1,
        MouseButton::Middle => 2,
    }
}

pub struct UiSystem {
    tree: WidgetTree,
    root: WidgetId,
    hover: Option<WidgetId>,
    capture: Option<WidgetId>,
    focus: Option<WidgetId>,
    /// Press target per button, for click pairing on release.
    press_targets: [Option<WidgetId>; 3],
    /// Last click per pairing: target, button, time.
    last_click: Option<(WidgetId, MouseButton, Instant)>,
    pub double_click_window: Duration,
    modifiers: Modifiers,
    handlers: HashMap<(WidgetId, EventKind), Vec<EventHandler>>,
    /// Widgets queued for destruction at the end of the tick.
    destroy_queue: Vec<WidgetId>,
    dispatch_depth: u32,
    measurer: Box<dyn TextMeasurer>,
}

impl UiSystem {
    /// Create a system with an empty root panel of the given size.
    pub fn new(size: Size) -> Self {
        let mut tree = WidgetTree::new();
        let root = tree.create(WidgetKind::Panel);
        tree.set_rectangle(root, Rect::new(0, 0, size.width, size.height));
        tree.take_events();
        Self {
            tree,
            root,
            hover: None,
            capture: None,
            focus: None,
            press_targets: [None; 3],
            last_click: None,
            double_click_window: Duration::from_millis(200),
            modifiers: Modifiers::default(),
            handlers: HashMap::new(),
            destroy_queue: Vec::new(),
            dispatch_depth: 0,
            measurer: Box::new(FixedMeasure::default()),
        }
    }

    pub fn tree(&self) -> &WidgetTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut WidgetTree {
        &mut self.tree
    }

    pub fn root(&self) -> WidgetId {
        self.root
    }

    pub fn hover(&self) -> Option<WidgetId> {
        self.hover
    }

    pub fn capture(&self) -> Option<WidgetId> {
        self.capture
    }

    pub fn focus(&self) -> Option<WidgetId> {
        self.focus
    }

    pub fn set_focus(&mut self, id: Option<WidgetId>) {
        self.focus = id.filter(|&w| self.tree.contains(w));
    }

    /// Route all mouse events to `id` until release. Capturing also
    /// focuses.
    pub fn set_capture(&mut self, id: WidgetId) {
        if self.tree.contains(id) {
            self.capture = Some(id);
            self.focus = Some(id);
        }
    }

    pub fn release_capture(&mut self) {
        self.capture = None;
    }

    /// Replace the text measurer (defaults to fixed-advance metrics).
    pub fn set_measurer(&mut self, measurer: Box<dyn TextMeasurer>) {
        self.measurer = measurer;
    }

    pub fn measurer(&self) -> &dyn TextMeasurer {
        self.measurer.as_ref()
    }

    /// Register a handler for one `(widget, kind)` pair. Handlers on the
    /// same pair run in registration order.
    pub fn on(
        &mut self,
        id: WidgetId,
        kind: EventKind,
        handler: impl FnMut(&mut UiSystem, &Event) -> bool + 'static,
    ) {
        self.handlers
            .entry((id, kind))
            .or_default()
            .push(Box::new(handler));
    }

    /// Queue `id` (and its subtree) for destruction at the end of the
    /// current tick; outside a tick it is destroyed immediately. Safe to
    /// call from handlers, including on the event's own target.
    pub fn destroy_widget(&mut self, id: WidgetId) {
        self.destroy_queue.push(id);
        if self.dispatch_depth == 0 {
            self.flush_destroyed();
        }
    }

    fn flush_destroyed(&mut self) {
        for id in mem::take(&mut self.destroy_queue) {
            if !self.tree.contains(id) {
                continue;
            }
            let removed = self.tree.collect_subtree(id);
            debug!("destroying {} widget(s) rooted at {id:?}", removed.len());
            if self.hover.is_some_and(|w| removed.contains(&w)) {
                self.hover = None;
            }
            if self.capture.is_some_and(|w| removed.contains(&w)) {
                self.capture = None;
            }
            if self.focus.is_some_and(|w| removed.contains(&w)) {
                self.focus = None;
            }
            if self.last_click.is_some_and(|(w, ..)| removed.contains(&w)) {
                self.last_click = None;
            }
            for slot in &mut self.press_targets {
                if slot.is_some_and(|w| removed.contains(&w)) {
                    *slot = None;
                }
            }
            self.handlers.retain(|(w, _), _| !removed.contains(w));
            self.tree.remove(id);
        }
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Run built-in widget behavior for `event`, then multicast it to the
    /// registered handlers. Returns the advisory result: `true` unless
    /// some handler returned `false`.
    pub fn dispatch(&mut self, event: Event) -> bool {
        if !self.tree.contains(event.target) {
            return true;
        }
        self.dispatch_depth += 1;
        self.builtin(&event);

        let key = (event.target, event.kind());
        let mut advisory = true;
        if self.handlers.contains_key(&key) {
            // Handlers are taken out for the duration of the call so they
            // can re-enter the system; ones registered meanwhile are
            // appended back in order.
            let mut taken = self.handlers.get_mut(&key).map(mem::take).unwrap_or_default();
            for handler in &mut taken {
                if !handler(self, &event) {
                    advisory = false;
                }
            }
            let slot = self.handlers.entry(key).or_default();
            let registered_during = mem::replace(slot, taken);
            slot.extend(registered_during);
        }

        self.dispatch_depth -= 1;
        if self.dispatch_depth == 0 && !self.destroy_queue.is_empty() {
            self.flush_destroyed();
        }
        advisory
    }

    /// Widget-internal reactions, before application handlers.
    fn builtin(&mut self, event: &Event) {
        let id = event.target;
        match event.data {
            EventData::MouseDown { pos, button: MouseButton::Left } => {
                match self.tree.get(id).map(|n| &n.kind) {
                    Some(WidgetKind::ScrollBar(_)) => {
                        scrollbar::handle_mouse_down(&mut self.tree, id, pos);
                    }
                    Some(WidgetKind::ScrollPart(part)) => {
                        let part = *part;
                        scrollbar::handle_mouse_down(&mut self.tree, id, pos);
                        if part == ScrollPart::Thumb {
                            self.set_capture(id);
                        }
                    }
                    Some(WidgetKind::ListBox(_)) => {
                        listbox::handle_mouse_down(&mut self.tree, id, pos, self.modifiers);
                    }
                    Some(WidgetKind::TextBox(_)) => {
                        textbox::handle_mouse_down(
                            &mut self.tree,
                            id,
                            pos,
                            self.modifiers,
                            self.measurer.as_ref(),
                        );
                    }
                    _ => {}
                }
            }
            EventData::MouseMove { pos } => {
                if matches!(
                    self.tree.get(id).map(|n| &n.kind),
                    Some(WidgetKind::ScrollPart(ScrollPart::Thumb))
                ) {
                    scrollbar::handle_mouse_move(&mut self.tree, id, pos);
                }
            }
            EventData::MouseUp { .. } => {
                if matches!(
                    self.tree.get(id).map(|n| &n.kind),
                    Some(WidgetKind::ScrollBar(_) | WidgetKind::ScrollPart(_))
                ) {
                    scrollbar::handle_mouse_up(&mut self.tree, id);
                }
            }
            EventData::MouseWheel { delta, .. } => {
                // Route to the nearest scrollable widget, self included.
                let mut current = Some(id);
                while let Some(w) = current {
                    match self.tree.get(w).map(|n| &n.kind) {
                        Some(WidgetKind::ListBox(_)) => {
                            listbox::handle_wheel(&mut self.tree, w, delta);
                            break;
                        }
                        Some(WidgetKind::ScrollBar(_) | WidgetKind::ScrollPart(_)) => {
                            scrollbar::handle_wheel(&mut self.tree, w, delta);
                            break;
                        }
                        _ => current = self.tree.get(w).and_then(|n| n.parent()),
                    }
                }
            }
            EventData::KeyDown { key, modifiers } => {
                match self.tree.get(id).map(|n| &n.kind) {
                    Some(WidgetKind::ListBox(_)) => {
                        listbox::handle_key(&mut self.tree, id, key);
                    }
                    Some(WidgetKind::TextBox(_)) => {
                        textbox::handle_key(&mut self.tree, id, key, modifiers);
                    }
                    _ => {}
                }
            }
            EventData::KeyChar { ch, .. } => {
                if matches!(self.tree.get(id).map(|n| &n.kind), Some(WidgetKind::TextBox(_))) {
                    textbox::handle_char(&mut self.tree, id, ch);
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Per-tick update
    // ------------------------------------------------------------------

    /// Process one input snapshot. `now` drives double-click pairing and
    /// the caret blink.
    pub fn update(&mut self, input: &InputState, now: Instant) {
        self.modifiers = input.modifiers();
        self.update_widget(self.root);

        let (mx, my) = input.mouse_pos();
        let pos = Point::new(mx, my);

        // Hit test; disabled widgets occlude but receive nothing.
        let hit = self
            .tree
            .hit_test(self.root, pos)
            .filter(|&w| self.tree.effective_enabled(w));

        // While captured, all mouse events go to the capture owner, but
        // hover (and Enter/Leave) keeps tracking the widget under the
        // cursor.
        let target = self.capture.or(hit);
        let prev_hover = self.hover;
        let new_hover = hit;

        if new_hover != prev_hover
            && let Some(entered) = new_hover
        {
            trace!("hover enter {entered:?}");
            self.dispatch(Event::new(entered, EventData::MouseEnter { pos }));
        }

        if input.mouse_moved()
            && let Some(target) = target
        {
            self.dispatch(Event::new(target, EventData::MouseMove { pos }));
        }

        for button in MouseButton::ALL {
            if !input.mouse_pressed(button) {
                continue;
            }
            self.press_targets[button_index(button)] = target;
            if let Some(target) = target {
                if button == MouseButton::Left {
                    self.focus = Some(target);
                    self.tree.move_to_front(target);
                }
                self.dispatch(Event::new(target, EventData::MouseDown { pos, button }));
            }
        }

        let wheel = input.wheel_delta();
        if wheel != 0
            && let Some(target) = target
        {
            self.dispatch(Event::new(target, EventData::MouseWheel { pos, delta: wheel }));
        }

        let mut clicks: Vec<(WidgetId, MouseButton)> = Vec::new();
        for button in MouseButton::ALL {
            if !input.mouse_released(button) {
                continue;
            }
            let pressed_on = self.press_targets[button_index(button)].take();
            if let Some(target) = target {
                self.dispatch(Event::new(target, EventData::MouseUp { pos, button }));
                // A click is a press and release on the same widget.
                if pressed_on == Some(target) {
                    clicks.push((target, button));
                }
            }
        }

        if new_hover != prev_hover {
            if let Some(left) = prev_hover {
                trace!("hover leave {left:?}");
                self.dispatch(Event::new(left, EventData::MouseLeave));
            }
            self.hover = new_hover;
        }

        if input.any_button_released() {
            self.capture = None;
        }

        // Keyboard goes to the focused widget.
        if let Some(focus) = self.focus {
            let modifiers = self.modifiers;
            for &key in input.keys_pressed() {
                self.dispatch(Event::new(focus, EventData::KeyDown { key, modifiers }));
                if !modifiers.ctrl
                    && !modifiers.alt
                    && let Some(ch) = key.to_char(modifiers.shift)
                {
                    self.dispatch(Event::new(focus, EventData::KeyChar { ch, modifiers }));
                }
            }
            for &key in input.keys_released() {
                self.dispatch(Event::new(focus, EventData::KeyUp { key, modifiers }));
            }
        }

        for (target, button) in clicks {
            // A release pairing with the previous click becomes the double
            // click; it does not also count as a single click.
            let paired = self.last_click.is_some_and(|(w, b, t)| {
                w == target && b == button && now.saturating_duration_since(t) <= self.double_click_window
            });
            if paired {
                self.dispatch(Event::new(target, EventData::MouseDoubleClick { pos, button }));
                self.last_click = None;
            } else {
                self.dispatch(Event::new(target, EventData::MouseClick { pos, button }));
                self.last_click = Some((target, button, now));
            }
        }

        if let Some(focus) = self.focus
            && matches!(self.tree.get(focus).map(|n| &n.kind), Some(WidgetKind::TextBox(_)))
        {
            textbox::update_blink(&mut self.tree, focus, now);
        }

        // Widget mutations above queued events (Scroll, ValueChanged,
        // TextChanged, Moved...); dispatch them, including any produced by
        // the handlers they trigger. Bounded in case a handler loops.
        for _ in 0..8 {
            let pending = self.tree.take_events();
            if pending.is_empty() {
                break;
            }
            for event in pending {
                self.dispatch(event);
            }
        }

        self.flush_destroyed();
    }

    /// `Updating`, children in forward order, `Updated`. Handlers may add
    /// or destroy widgets; the child list is snapshotted per node and
    /// stale ids are skipped.
    fn update_widget(&mut self, id: WidgetId) {
        if !self.tree.contains(id) {
            return;
        }
        self.dispatch(Event::new(id, EventData::Updating));
        let children: Vec<WidgetId> = self
            .tree
            .get(id)
            .map(|n| n.children().to_vec())
            .unwrap_or_default();
        for child in children {
            self.update_widget(child);
        }
        self.dispatch(Event::new(id, EventData::Updated));
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Draw the whole tree. Each widget dispatches `Rendering`, draws
    /// itself scissored to its own clip, recurses into children scissored
    /// to its client area, then dispatches `Rendered`. Listbox rows go
    /// through the advisory `DrawItem` event.
    pub fn render(&mut self, renderer: &mut dyn Renderer) {
        let bounds = self.tree.displayed_rectangle(self.root);
        self.render_widget(self.root, bounds, renderer);
        renderer.set_scissor(None);
    }

    fn render_widget(&mut self, id: WidgetId, inherited: Rect, renderer: &mut dyn Renderer) {
        let Some(node) = self.tree.get(id) else { return };
        if !node.visible {
            return;
        }
        let displayed = self.tree.displayed_rectangle(id);
        let clip = if node.popup {
            displayed
        } else {
            displayed.intersect(&inherited)
        };
        if clip.is_empty() {
            return;
        }
        self.dispatch(Event::new(id, EventData::Rendering));
        renderer.set_scissor(Some(clip));
        render::draw_common(&self.tree, id, renderer);
        let focused = self.focus == Some(id);
        render::draw_widget(&self.tree, id, focused, renderer, self.measurer.as_ref());

        if matches!(self.tree.get(id).map(|n| &n.kind), Some(WidgetKind::ListBox(_))) {
            for index in listbox::visible_range(&self.tree, id) {
                let draw = self.dispatch(Event::new(id, EventData::DrawItem { index }));
                if draw {
                    let row = listbox::item_display_rect(&self.tree, id, index);
                    render::draw_list_item(&self.tree, id, index, row, renderer);
                }
            }
        }

        // Children are confined to the content area, inside frame and
        // padding.
        let child_clip = clip.intersect(&self.tree.client_rectangle(id));
        let children: Vec<WidgetId> = self
            .tree
            .get(id)
            .map(|n| n.children().to_vec())
            .unwrap_or_default();
        for child in children {
            self.render_widget(child, child_clip, renderer);
        }
        self.dispatch(Event::new(id, EventData::Rendered));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::input::Key;
    use crate::render::DrawList;
    use crate::widget::ListItem;

    fn system() -> UiSystem {
        UiSystem::new(Size::new(400, 300))
    }

    fn panel(sys: &mut UiSystem, rect: Rect) -> WidgetId {
        let root = sys.root();
        let id = sys.tree_mut().create(WidgetKind::Panel);
        sys.tree_mut().set_rectangle(id, rect);
        sys.tree_mut().attach(root, id);
        id
    }

    fn record(sys: &mut UiSystem, id: WidgetId, kind: EventKind) -> Rc<RefCell<Vec<EventKind>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        sys.on(id, kind, move |_, e| {
            sink.borrow_mut().push(e.kind());
            true
        });
        log
    }

    fn tick(sys: &mut UiSystem, input: &mut InputState, now: Instant) {
        sys.update(input, now);
        input.begin_frame();
    }

    #[test]
    fn hover_enter_then_leave() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        let enters = record(&mut sys, a, EventKind::MouseEnter);
        let leaves = record(&mut sys, a, EventKind::MouseLeave);

        let mut input = InputState::new();
        let t0 = Instant::now();
        input.set_mouse_pos(50, 50);
        tick(&mut sys, &mut input, t0);
        assert_eq!(sys.hover(), Some(a));
        assert_eq!(enters.borrow().len(), 1);

        input.set_mouse_pos(300, 250);
        tick(&mut sys, &mut input, t0);
        assert_ne!(sys.hover(), Some(a));
        assert_eq!(leaves.borrow().len(), 1);
    }

    #[test]
    fn capture_overrides_dispatch_but_not_hover() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        let b = panel(&mut sys, Rect::new(200, 0, 100, 100));
        let a_moves = record(&mut sys, a, EventKind::MouseMove);
        let b_moves = record(&mut sys, b, EventKind::MouseMove);
        let b_enters = record(&mut sys, b, EventKind::MouseEnter);

        sys.set_capture(a);
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.set_mouse_pos(250, 50); // over b
        tick(&mut sys, &mut input, t0);

        // Moves go to the capture owner; hover transitions follow the
        // widget actually under the cursor.
        assert_eq!(a_moves.borrow().len(), 1);
        assert!(b_moves.borrow().is_empty());
        assert_eq!(b_enters.borrow().len(), 1);
        assert_eq!(sys.hover(), Some(b));
    }

    #[test]
    fn capture_clears_on_release_and_focuses() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));

        sys.set_capture(a);
        assert_eq!(sys.focus(), Some(a));

        let mut input = InputState::new();
        input.mouse_button_down(MouseButton::Left);
        tick(&mut sys, &mut input, Instant::now());
        assert_eq!(sys.capture(), Some(a));

        input.mouse_button_up(MouseButton::Left);
        tick(&mut sys, &mut input, Instant::now());
        assert_eq!(sys.capture(), None);
    }

    #[test]
    fn left_press_focuses_and_raises() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        let b = panel(&mut sys, Rect::new(50, 50, 100, 100));

        let mut input = InputState::new();
        input.set_mouse_pos(60, 60); // overlap: b on top
        input.mouse_button_down(MouseButton::Left);
        tick(&mut sys, &mut input, Instant::now());
        assert_eq!(sys.focus(), Some(b));

        // Raise a by clicking its exclusive region, then the overlap
        // belongs to a.
        input.mouse_button_up(MouseButton::Left);
        input.set_mouse_pos(10, 10);
        input.mouse_button_down(MouseButton::Left);
        tick(&mut sys, &mut input, Instant::now());
        assert_eq!(sys.focus(), Some(a));
        assert_eq!(sys.tree().hit_test(sys.root(), Point::new(60, 60)), Some(a));
    }

    #[test]
    fn disabled_widget_occludes_but_gets_nothing() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        let b = panel(&mut sys, Rect::new(0, 0, 100, 100)); // covers a
        if let Some(node) = sys.tree_mut().get_mut(b) {
            node.enabled = false;
        }
        let a_downs = record(&mut sys, a, EventKind::MouseDown);
        let b_downs = record(&mut sys, b, EventKind::MouseDown);

        let mut input = InputState::new();
        input.set_mouse_pos(50, 50);
        input.mouse_button_down(MouseButton::Left);
        tick(&mut sys, &mut input, Instant::now());

        assert!(a_downs.borrow().is_empty());
        assert!(b_downs.borrow().is_empty());
        assert_eq!(sys.hover(), None);
    }

    #[test]
    fn click_requires_press_and_release_on_same_widget() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        let clicks = record(&mut sys, a, EventKind::MouseClick);

        let mut input = InputState::new();
        let t0 = Instant::now();
        input.set_mouse_pos(50, 50);
        input.mouse_button_down(MouseButton::Left);
        tick(&mut sys, &mut input, t0);

        // Release over a different spot outside a: no click.
        input.set_mouse_pos(300, 250);
        input.mouse_button_up(MouseButton::Left);
        tick(&mut sys, &mut input, t0);
        assert!(clicks.borrow().is_empty());

        // Press and release in place: click.
        input.set_mouse_pos(50, 50);
        input.mouse_button_down(MouseButton::Left);
        tick(&mut sys, &mut input, t0);
        input.mouse_button_up(MouseButton::Left);
        tick(&mut sys, &mut input, t0);
        assert_eq!(clicks.borrow().len(), 1);
    }

    #[test]
    fn double_click_replaces_the_second_single() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        let singles = record(&mut sys, a, EventKind::MouseClick);
        let doubles = record(&mut sys, a, EventKind::MouseDoubleClick);

        let mut input = InputState::new();
        input.set_mouse_pos(50, 50);
        let t0 = Instant::now();

        let mut click = |sys: &mut UiSystem, input: &mut InputState, at: Instant| {
            input.mouse_button_down(MouseButton::Left);
            tick(sys, input, at);
            input.mouse_button_up(MouseButton::Left);
            tick(sys, input, at);
        };

        // Fast pair: one single, one double.
        click(&mut sys, &mut input, t0);
        click(&mut sys, &mut input, t0 + Duration::from_millis(150));
        assert_eq!((singles.borrow().len(), doubles.borrow().len()), (1, 1));

        // The double consumed the pairing state, so a prompt third click
        // is a fresh single.
        click(&mut sys, &mut input, t0 + Duration::from_millis(250));
        assert_eq!((singles.borrow().len(), doubles.borrow().len()), (2, 1));

        // A slow pair stays two singles.
        click(&mut sys, &mut input, t0 + Duration::from_millis(900));
        assert_eq!((singles.borrow().len(), doubles.borrow().len()), (3, 1));
    }

    #[test]
    fn destroy_from_handler_is_deferred_and_clears_refs() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        sys.on(a, EventKind::MouseDown, |sys, e| {
            sys.destroy_widget(e.target);
            // The target must still exist inside the tick.
            assert!(sys.tree().contains(e.target));
            true
        });

        let mut input = InputState::new();
        input.set_mouse_pos(50, 50);
        input.mouse_button_down(MouseButton::Left);
        tick(&mut sys, &mut input, Instant::now());

        assert!(!sys.tree().contains(a));
        assert_eq!(sys.focus(), None);
        assert_eq!(sys.hover(), None);
    }

    #[test]
    fn handlers_multicast_and_false_does_not_stop_siblings() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let sink = log.clone();
            sys.on(a, EventKind::MouseDown, move |_, _| {
                sink.borrow_mut().push(i);
                i != 1 // the middle handler votes false
            });
        }

        let advisory = sys.dispatch(Event::new(
            a,
            EventData::MouseDown {
                pos: Point::new(1, 1),
                button: MouseButton::Left,
            },
        ));
        assert!(!advisory);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn typing_into_focused_textbox() {
        let mut sys = system();
        let root = sys.root();
        let tb = textbox::create(sys.tree_mut());
        sys.tree_mut().set_rectangle(tb, Rect::new(0, 0, 200, 20));
        sys.tree_mut().attach(root, tb);
        sys.set_focus(Some(tb));

        let mut input = InputState::new();
        input.key_down(Key::H);
        input.key_down(Key::I);
        tick(&mut sys, &mut input, Instant::now());
        input.key_down(Key::Num1);
        tick(&mut sys, &mut input, Instant::now());

        assert_eq!(textbox::text(sys.tree(), tb), "hi1");
    }

    #[test]
    fn wheel_over_listbox_row_scrolls_it() {
        let mut sys = system();
        let root = sys.root();
        let lb = listbox::create(sys.tree_mut());
        sys.tree_mut().set_rectangle(lb, Rect::new(0, 0, 100, 100));
        sys.tree_mut().attach(root, lb);
        for i in 0..20 {
            listbox::add_item(sys.tree_mut(), lb, ListItem::new(format!("row {i}")));
        }
        let bar = listbox::scrollbar_of(sys.tree(), lb);
        let scrolls = record(&mut sys, bar, EventKind::Scroll);

        let mut input = InputState::new();
        input.set_mouse_pos(40, 40);
        input.scroll(-2); // toward the user: scroll down
        tick(&mut sys, &mut input, Instant::now());

        assert_eq!(listbox::scroll_offset(sys.tree(), lb), 32);
        assert_eq!(scrolls.borrow().len(), 1);
    }

    #[test]
    fn thumb_drag_through_full_update_loop() {
        let mut sys = system();
        let root = sys.root();
        let bar = scrollbar::create(sys.tree_mut(), crate::widget::Orientation::Horizontal);
        sys.tree_mut().set_rectangle(bar, Rect::new(0, 0, 110, 10));
        sys.tree_mut().attach(root, bar);
        scrollbar::set_steps(sys.tree_mut(), bar, 1, 10);

        let mut input = InputState::new();
        let t0 = Instant::now();
        // Press the thumb (sits at x 10..19), then drag right.
        input.set_mouse_pos(14, 5);
        input.mouse_button_down(MouseButton::Left);
        tick(&mut sys, &mut input, t0);
        let thumb = scrollbar::part_id(sys.tree(), bar, ScrollPart::Thumb);
        assert_eq!(sys.capture(), thumb);

        input.set_mouse_pos(59, 5);
        tick(&mut sys, &mut input, t0);
        let v = scrollbar::value(sys.tree(), bar);
        assert!((45..=50).contains(&v), "value {v}");

        input.mouse_button_up(MouseButton::Left);
        tick(&mut sys, &mut input, t0);
        assert_eq!(sys.capture(), None);
    }

    #[test]
    fn render_emits_brackets_scissors_and_draw_items() {
        let mut sys = system();
        let root = sys.root();
        let lb = listbox::create(sys.tree_mut());
        sys.tree_mut().set_rectangle(lb, Rect::new(10, 10, 100, 40));
        sys.tree_mut().attach(root, lb);
        for i in 0..3 {
            listbox::add_item(sys.tree_mut(), lb, ListItem::new(format!("row {i}")));
        }
        if let Some(node) = sys.tree_mut().get_mut(lb) {
            node.font = Some(crate::style::FontId(0));
        }
        let rendering = record(&mut sys, root, EventKind::Rendering);
        // Suppress the middle row.
        sys.on(lb, EventKind::DrawItem, |_, e| {
            !matches!(e.data, EventData::DrawItem { index: 1 })
        });

        let mut list = DrawList::new();
        sys.render(&mut list);

        assert_eq!(rendering.borrow().len(), 1);
        assert_eq!(list.texts(), vec!["row 0", "row 2"]);
        // Rows are drawn under the listbox's scissor rectangle.
        let text_at = list
            .commands
            .iter()
            .position(|c| matches!(c, crate::render::DrawCommand::Text { .. }));
        let scissor = text_at.and_then(|i| list.scissor_before(i));
        assert_eq!(scissor, Some(Rect::new(10, 10, 100, 40)));
    }

    #[test]
    fn update_brackets_with_updating_and_updated() {
        let mut sys = system();
        let root = sys.root();
        let begins = record(&mut sys, root, EventKind::Updating);
        let ends = record(&mut sys, root, EventKind::Updated);

        let mut input = InputState::new();
        tick(&mut sys, &mut input, Instant::now());
        assert_eq!((begins.borrow().len(), ends.borrow().len()), (1, 1));
    }

    #[test]
    fn update_brackets_nest_per_widget() {
        let mut sys = system();
        let a = panel(&mut sys, Rect::new(0, 0, 100, 100));
        let root = sys.root();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (label, id, kind) in [
            ("root+", root, EventKind::Updating),
            ("root-", root, EventKind::Updated),
            ("a+", a, EventKind::Updating),
            ("a-", a, EventKind::Updated),
        ] {
            let sink = log.clone();
            sys.on(id, kind, move |_, _| {
                sink.borrow_mut().push(label);
                true
            });
        }

        let mut input = InputState::new();
        tick(&mut sys, &mut input, Instant::now());
        assert_eq!(*log.borrow(), vec!["root+", "a+", "a-", "root-"]);
    }

    #[test]
    fn children_are_clipped_to_the_parent_client_area() {
        let mut sys = system();
        let parent = panel(&mut sys, Rect::new(10, 10, 100, 100));
        if let Some(node) = sys.tree_mut().get_mut(parent) {
            node.frame = Some(crate::style::FrameStyle {
                width: 4,
                color: [0.0, 0.0, 0.0, 1.0],
            });
        }
        let child = sys.tree_mut().create(WidgetKind::Panel);
        sys.tree_mut().set_rectangle(child, Rect::new(0, 0, 100, 100));
        sys.tree_mut().attach(parent, child);
        if let Some(node) = sys.tree_mut().get_mut(child) {
            node.background = Some(crate::style::Background::default());
        }
        let rendered = record(&mut sys, child, EventKind::Rendered);

        let mut list = DrawList::new();
        sys.render(&mut list);

        assert_eq!(rendered.borrow().len(), 1);
        // The child's fill lands inside the parent's frame band, not over
        // it: its scissor is the parent's bounds inset by the frame width.
        let fill_at = list
            .commands
            .iter()
            .rposition(|c| matches!(c, crate::render::DrawCommand::FillRect { .. }));
        let scissor = fill_at.and_then(|i| list.scissor_before(i));
        assert_eq!(scissor, Some(Rect::new(14, 14, 92, 92)));
    }
}
