//! Field access by name, for editors and the persistence collaborator.
//!
//! Widgets expose an ordered, explicit descriptor list per kind — no
//! macro reflection. Reads hand out [`FieldValue`]s; writes go through
//! the same mutation paths the rest of the crate uses, so setting `rect`
//! clamps and reflows and setting a scrollbar `value` clamps and emits.

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::style::Color;
use crate::tree::{WidgetId, WidgetTree};
use crate::widget::WidgetKind;
use crate::{scrollbar, textbox};

/// A widget field, boxed for by-name transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Text(String),
    Color(Color),
    Rect(Rect),
}

/// Receiver for [`visit_fields`].
pub trait FieldVisitor {
    fn field(&mut self, name: &'static str, value: FieldValue);
}

impl<F: FnMut(&'static str, FieldValue)> FieldVisitor for F {
    fn field(&mut self, name: &'static str, value: FieldValue) {
        self(name, value)
    }
}

/// Fields every widget carries, in serialization order.
const COMMON_FIELDS: &[&str] = &[
    "name",
    "tag",
    "rect",
    "enabled",
    "visible",
    "transparent",
    "popup",
    "foreground",
];

/// Kind-specific fields, appended after the common ones.
fn kind_fields(kind: &WidgetKind) -> &'static [&'static str] {
    match kind {
        WidgetKind::Panel | WidgetKind::ScrollPart(_) => &[],
        WidgetKind::Label { .. } | WidgetKind::Button { .. } => &["text"],
        WidgetKind::ScrollBar(_) => &["minimum", "maximum", "value", "single_step", "page_step"],
        WidgetKind::ListBox(_) => &["multi_select", "item_height"],
        WidgetKind::TextBox(_) => &["text", "max_length", "insert_mode"],
    }
}

/// Ordered field names of `id`, common first.
pub fn field_names(tree: &WidgetTree, id: WidgetId) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = COMMON_FIELDS.to_vec();
    if let Some(node) = tree.get(id) {
        names.extend_from_slice(kind_fields(&node.kind));
    }
    names
}

/// Read one field. `None` for a stale id or unknown name.
pub fn get_field(tree: &WidgetTree, id: WidgetId, name: &str) -> Option<FieldValue> {
    let node = tree.get(id)?;
    let common = match name {
        "name" => Some(FieldValue::Text(node.name.clone())),
        "tag" => Some(FieldValue::Int(node.tag)),
        "rect" => Some(FieldValue::Rect(node.rectangle())),
        "enabled" => Some(FieldValue::Bool(node.enabled)),
        "visible" => Some(FieldValue::Bool(node.visible)),
        "transparent" => Some(FieldValue::Bool(node.transparent)),
        "popup" => Some(FieldValue::Bool(node.popup)),
        "foreground" => Some(FieldValue::Color(node.foreground)),
        _ => None,
    };
    if common.is_some() {
        return common;
    }
    match (&node.kind, name) {
        (WidgetKind::Label { text } | WidgetKind::Button { text }, "text") => {
            Some(FieldValue::Text(text.clone()))
        }
        (WidgetKind::ScrollBar(s), "minimum") => Some(FieldValue::Int(s.minimum.into())),
        (WidgetKind::ScrollBar(s), "maximum") => Some(FieldValue::Int(s.maximum.into())),
        (WidgetKind::ScrollBar(s), "value") => Some(FieldValue::Int(s.value().into())),
        (WidgetKind::ScrollBar(s), "single_step") => Some(FieldValue::Int(s.single_step.into())),
        (WidgetKind::ScrollBar(s), "page_step") => Some(FieldValue::Int(s.page_step.into())),
        (WidgetKind::ListBox(s), "multi_select") => Some(FieldValue::Bool(s.multi_select)),
        (WidgetKind::ListBox(s), "item_height") => Some(FieldValue::Int(s.item_height.into())),
        (WidgetKind::TextBox(s), "text") => Some(FieldValue::Text(s.text().to_string())),
        (WidgetKind::TextBox(s), "max_length") => Some(FieldValue::Int(s.max_length as i64)),
        (WidgetKind::TextBox(s), "insert_mode") => Some(FieldValue::Bool(s.insert_mode)),
        _ => None,
    }
}

/// Write one field. Returns `false` for a stale id, unknown name, or a
/// value of the wrong variant; the widget is untouched in those cases.
pub fn set_field(tree: &mut WidgetTree, id: WidgetId, name: &str, value: FieldValue) -> bool {
    if !tree.contains(id) {
        return false;
    }

    // Fields with behavior behind them use the real mutation paths.
    match (name, &value) {
        ("rect", FieldValue::Rect(r)) => {
            tree.set_rectangle(id, *r);
            return true;
        }
        ("value", FieldValue::Int(v)) => {
            if matches!(tree.get(id).map(|n| &n.kind), Some(WidgetKind::ScrollBar(_))) {
                scrollbar::set_value(tree, id, *v as i32);
                return true;
            }
        }
        ("minimum" | "maximum", FieldValue::Int(v)) => {
            if let Some(WidgetKind::ScrollBar(s)) = tree.get(id).map(|n| &n.kind) {
                let v = *v as i32;
                // Writing one bound may leapfrog the other; the other bound
                // gives way so the range stays well-formed.
                let (minimum, maximum) = if name == "minimum" {
                    (v, s.maximum.max(v))
                } else {
                    (s.minimum.min(v), v)
                };
                scrollbar::set_range(tree, id, minimum, maximum);
                return true;
            }
        }
        ("text", FieldValue::Text(t)) => {
            if matches!(tree.get(id).map(|n| &n.kind), Some(WidgetKind::TextBox(_))) {
                textbox::set_text(tree, id, t.clone());
                return true;
            }
        }
        _ => {}
    }

    let Some(node) = tree.get_mut(id) else {
        return false;
    };
    match (name, value) {
        ("name", FieldValue::Text(t)) => node.name = t,
        ("tag", FieldValue::Int(v)) => node.tag = v,
        ("enabled", FieldValue::Bool(b)) => node.enabled = b,
        ("visible", FieldValue::Bool(b)) => node.visible = b,
        ("transparent", FieldValue::Bool(b)) => node.transparent = b,
        ("popup", FieldValue::Bool(b)) => node.popup = b,
        ("foreground", FieldValue::Color(c)) => node.foreground = c,
        (name, value) => {
            return match (&mut node.kind, name, value) {
                (
                    WidgetKind::Label { text } | WidgetKind::Button { text },
                    "text",
                    FieldValue::Text(t),
                ) => {
                    *text = t;
                    true
                }
                (WidgetKind::ScrollBar(s), "single_step", FieldValue::Int(v)) => {
                    s.single_step = (v as i32).max(1);
                    true
                }
                (WidgetKind::ScrollBar(s), "page_step", FieldValue::Int(v)) => {
                    s.page_step = (v as i32).max(1);
                    true
                }
                (WidgetKind::ListBox(s), "multi_select", FieldValue::Bool(b)) => {
                    s.multi_select = b;
                    true
                }
                (WidgetKind::ListBox(s), "item_height", FieldValue::Int(v)) => {
                    s.item_height = (v as i32).max(1);
                    true
                }
                (WidgetKind::TextBox(s), "max_length", FieldValue::Int(v)) => {
                    s.max_length = v.max(0) as usize;
                    true
                }
                (WidgetKind::TextBox(s), "insert_mode", FieldValue::Bool(b)) => {
                    s.insert_mode = b;
                    true
                }
                _ => false,
            };
        }
    }
    true
}

/// Walk every field of `id` in descriptor order.
pub fn visit_fields(tree: &WidgetTree, id: WidgetId, visitor: &mut dyn FieldVisitor) {
    for name in field_names(tree, id) {
        if let Some(value) = get_field(tree, id, name) {
            visitor.field(name, value);
        }
    }
}
