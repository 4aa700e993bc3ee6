//! Scrollbar: continuous value model plus drag-to-value mapping.
//!
//! A scrollbar is a composite widget: the bar itself (the track) plus
//! three `ScrollPart` children — decrement button, increment button,
//! draggable thumb — whose geometry is derived from the value model on
//! every layout pass. Buttons are squares of the bar's thickness; the
//! track between them is the scrolling range.

use log::trace;

use crate::event::{Event, EventData, ScrollEventKind};
use crate::geometry::{Point, Rect};
use crate::tree::{WidgetId, WidgetTree};
use crate::widget::{Orientation, ScrollBarState, ScrollPart, ThumbDrag, WidgetKind};

/// Shortest thumb the layout will produce, so tiny pages stay grabbable.
const MIN_THUMB_LENGTH: i32 = 6;

/// Create a scrollbar widget with its three part children attached.
pub fn create(tree: &mut WidgetTree, orientation: Orientation) -> WidgetId {
    let bar = tree.create(WidgetKind::ScrollBar(ScrollBarState::new(orientation)));
    for part in [ScrollPart::Decrement, ScrollPart::Increment, ScrollPart::Thumb] {
        let child = tree.create(WidgetKind::ScrollPart(part));
        if let Some(node) = tree.get_mut(child) {
            node.background = Some(Default::default());
            node.foreground = [0.25, 0.25, 0.25, 1.0];
        }
        tree.attach(bar, child);
    }
    if let Some(node) = tree.get_mut(bar) {
        node.background = Some(crate::style::Background {
            color: [0.9, 0.9, 0.9, 1.0],
            image: None,
        });
    }
    bar
}

fn state(tree: &WidgetTree, id: WidgetId) -> &ScrollBarState {
    match tree.get(id).map(|n| &n.kind) {
        Some(WidgetKind::ScrollBar(state)) => state,
        _ => panic!("widget {id:?} is not a scrollbar"),
    }
}

fn state_mut(tree: &mut WidgetTree, id: WidgetId) -> &mut ScrollBarState {
    match tree.get_mut(id).map(|n| &mut n.kind) {
        Some(WidgetKind::ScrollBar(state)) => state,
        _ => panic!("widget {id:?} is not a scrollbar"),
    }
}

pub fn value(tree: &WidgetTree, id: WidgetId) -> i32 {
    state(tree, id).value()
}

pub fn orientation(tree: &WidgetTree, id: WidgetId) -> Orientation {
    state(tree, id).orientation
}

/// Set the value range. The current value is re-clamped into it.
pub fn set_range(tree: &mut WidgetTree, id: WidgetId, minimum: i32, maximum: i32) {
    assert!(minimum <= maximum, "scrollbar range inverted: {minimum}..{maximum}");
    {
        let s = state_mut(tree, id);
        s.minimum = minimum;
        s.maximum = maximum;
    }
    let v = state(tree, id).value();
    set_value(tree, id, v);
    update_layout(tree, id);
}

pub fn set_steps(tree: &mut WidgetTree, id: WidgetId, single_step: i32, page_step: i32) {
    let s = state_mut(tree, id);
    s.single_step = single_step.max(1);
    s.page_step = page_step.max(1);
    update_layout(tree, id);
}

/// Clamp into `[minimum, maximum]` and store. Emits `ValueChanged` when
/// the value actually changed. Returns the stored value.
pub fn set_value(tree: &mut WidgetTree, id: WidgetId, v: i32) -> i32 {
    let (old, new) = {
        let s = state_mut(tree, id);
        let old = s.value;
        s.value = v.clamp(s.minimum, s.maximum);
        (old, s.value)
    };
    if new != old {
        tree.push_event(Event::new(id, EventData::ValueChanged { old, new }));
        update_layout(tree, id);
    }
    new
}

/// Value change driven by the thumb: additionally clamped so a full page
/// never overflows the track (`maximum - page_step + 1` upper bound).
pub fn set_thumb_value(tree: &mut WidgetTree, id: WidgetId, v: i32) -> i32 {
    let limit = {
        let s = state(tree, id);
        (s.maximum - s.page_step + 1).max(s.minimum)
    };
    set_value(tree, id, v.min(limit))
}

/// Length of the track between the two buttons, in pixels.
pub fn scrolling_range(tree: &WidgetTree, id: WidgetId) -> i32 {
    let Some(node) = tree.get(id) else { return 0 };
    let r = node.rectangle();
    match state(tree, id).orientation {
        Orientation::Horizontal => (r.width - 2 * r.height).max(0),
        Orientation::Vertical => (r.height - 2 * r.width).max(0),
    }
}

/// Recompute the three part rectangles from the value model.
///
/// `page = page_step / range`, `ratio = (value - minimum) / range`;
/// thumb length is `scrolling_range * page`, thumb offset is
/// `min(scrolling_range * ratio, scrolling_range - length)` so rounding
/// never pushes the thumb past the track end.
pub fn update_layout(tree: &mut WidgetTree, id: WidgetId) {
    let Some(node) = tree.get(id) else { return };
    let bar = node.rectangle();
    let s = state(tree, id);
    let orientation = s.orientation;
    let range = s.range();
    let page_frac = if range > 0 {
        (s.page_step as f32 / range as f32).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let ratio = if range > 0 {
        (s.value - s.minimum) as f32 / range as f32
    } else {
        0.0
    };

    let (length, thickness) = match orientation {
        Orientation::Horizontal => (bar.width, bar.height),
        Orientation::Vertical => (bar.height, bar.width),
    };
    let button = thickness.min(length / 2);
    let track = (length - 2 * button).max(0);
    let thumb_len = ((track as f32 * page_frac).round() as i32)
        .clamp(MIN_THUMB_LENGTH.min(track), track);
    let thumb_off = ((track as f32 * ratio).round() as i32).min(track - thumb_len).max(0);

    let parts: Vec<(WidgetId, ScrollPart)> = node
        .children()
        .iter()
        .filter_map(|&c| match tree.get(c).map(|n| &n.kind) {
            Some(WidgetKind::ScrollPart(part)) => Some((c, *part)),
            _ => None,
        })
        .collect();

    for (child, part) in parts {
        let rect = match (orientation, part) {
            (Orientation::Horizontal, ScrollPart::Decrement) => Rect::new(0, 0, button, thickness),
            (Orientation::Horizontal, ScrollPart::Increment) => {
                Rect::new(length - button, 0, button, thickness)
            }
            (Orientation::Horizontal, ScrollPart::Thumb) => {
                Rect::new(button + thumb_off, 0, thumb_len, thickness)
            }
            (Orientation::Vertical, ScrollPart::Decrement) => Rect::new(0, 0, thickness, button),
            (Orientation::Vertical, ScrollPart::Increment) => {
                Rect::new(0, length - button, thickness, button)
            }
            (Orientation::Vertical, ScrollPart::Thumb) => {
                Rect::new(0, button + thumb_off, thickness, thumb_len)
            }
        };
        tree.set_rectangle(child, rect);
    }
}

/// Resolve an event target to its scrollbar: the bar itself, or the bar
/// owning a part child.
pub(crate) fn resolve(tree: &WidgetTree, target: WidgetId) -> Option<(WidgetId, Option<ScrollPart>)> {
    match tree.get(target).map(|n| (&n.kind, n.parent())) {
        Some((WidgetKind::ScrollBar(_), _)) => Some((target, None)),
        Some((WidgetKind::ScrollPart(part), Some(parent))) => Some((parent, Some(*part))),
        _ => None,
    }
}

fn apply_step(tree: &mut WidgetTree, id: WidgetId, delta: i32, kind: ScrollEventKind) {
    let old = value(tree, id);
    let new = set_value(tree, id, old + delta);
    if new != old {
        trace!("scrollbar {id:?} {kind:?}: {old} -> {new}");
        tree.push_event(Event::new(id, EventData::Scroll { kind, old, new }));
    }
}

/// Mouse-down on the bar or one of its parts.
pub(crate) fn handle_mouse_down(tree: &mut WidgetTree, target: WidgetId, pos: Point) {
    let Some((bar, part)) = resolve(tree, target) else {
        return;
    };
    match part {
        Some(ScrollPart::Decrement) => {
            let step = state(tree, bar).single_step;
            apply_step(tree, bar, -step, ScrollEventKind::SingleDecrement);
        }
        Some(ScrollPart::Increment) => {
            let step = state(tree, bar).single_step;
            apply_step(tree, bar, step, ScrollEventKind::SingleIncrement);
        }
        Some(ScrollPart::Thumb) => {
            let coord = axis_coord(tree, bar, pos);
            let s = state_mut(tree, bar);
            s.drag = Some(ThumbDrag {
                start_coord: coord,
                start_value: s.value,
            });
        }
        None => {
            // Track click: page toward the click, relative to the thumb.
            let local = axis_coord(tree, bar, pos);
            let Some(thumb) = part_rect(tree, bar, ScrollPart::Thumb) else {
                return;
            };
            let (thumb_start, thumb_end) = match state(tree, bar).orientation {
                Orientation::Horizontal => (thumb.x, thumb.right()),
                Orientation::Vertical => (thumb.y, thumb.bottom()),
            };
            let page = state(tree, bar).page_step;
            if local < thumb_start {
                apply_step(tree, bar, -page, ScrollEventKind::PageDecrement);
            } else if local >= thumb_end {
                apply_step(tree, bar, page, ScrollEventKind::PageIncrement);
            }
        }
    }
}

/// Mouse-move while the thumb is captured: pixel delta along the axis
/// mapped back to a value delta through the inverse ratio formula.
pub(crate) fn handle_mouse_move(tree: &mut WidgetTree, target: WidgetId, pos: Point) {
    let Some((bar, Some(ScrollPart::Thumb))) = resolve(tree, target) else {
        return;
    };
    let Some(drag) = state(tree, bar).drag else {
        return;
    };
    let track = scrolling_range(tree, bar);
    if track <= 0 {
        return;
    }
    let range = state(tree, bar).range();
    let coord = axis_coord(tree, bar, pos);
    let delta_px = coord - drag.start_coord;
    let delta_value = (delta_px as f32 * range as f32 / track as f32).round() as i32;

    let old = value(tree, bar);
    let new = set_thumb_value(tree, bar, drag.start_value + delta_value);
    if new != old {
        tree.push_event(Event::new(
            bar,
            EventData::Scroll {
                kind: ScrollEventKind::ThumbTrack,
                old,
                new,
            },
        ));
    }
}

/// Mouse-up anywhere ends a thumb drag.
pub(crate) fn handle_mouse_up(tree: &mut WidgetTree, target: WidgetId) {
    if let Some((bar, _)) = resolve(tree, target) {
        state_mut(tree, bar).drag = None;
    }
}

/// Wheel over the bar or a part: one single-step per notch. Positive
/// delta (away from the user) decrements.
pub(crate) fn handle_wheel(tree: &mut WidgetTree, target: WidgetId, delta: i32) {
    let Some((bar, _)) = resolve(tree, target) else {
        return;
    };
    if delta == 0 {
        return;
    }
    let step = state(tree, bar).single_step * delta.abs();
    if delta > 0 {
        apply_step(tree, bar, -step, ScrollEventKind::SingleDecrement);
    } else {
        apply_step(tree, bar, step, ScrollEventKind::SingleIncrement);
    }
}

/// Global mouse position projected onto the bar's scroll axis, local to
/// the bar.
fn axis_coord(tree: &WidgetTree, bar: WidgetId, pos: Point) -> i32 {
    let local = tree.global_to_local(bar, pos);
    match state(tree, bar).orientation {
        Orientation::Horizontal => local.x,
        Orientation::Vertical => local.y,
    }
}

/// Parent-relative rectangle of one part child.
pub(crate) fn part_rect(tree: &WidgetTree, bar: WidgetId, part: ScrollPart) -> Option<Rect> {
    let node = tree.get(bar)?;
    node.children().iter().find_map(|&c| {
        match tree.get(c).map(|n| (&n.kind, n.rectangle())) {
            Some((WidgetKind::ScrollPart(p), r)) if *p == part => Some(r),
            _ => None,
        }
    })
}

/// Id of one part child.
pub fn part_id(tree: &WidgetTree, bar: WidgetId, part: ScrollPart) -> Option<WidgetId> {
    let node = tree.get(bar)?;
    node.children().iter().copied().find(|&c| {
        matches!(tree.get(c).map(|n| &n.kind), Some(WidgetKind::ScrollPart(p)) if *p == part)
    })
}
