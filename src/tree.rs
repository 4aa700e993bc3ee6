//! Arena-backed retained widget tree.
//!
//! All widgets live in one slotmap arena; the tree owns them. A node's
//! child list is the single choke point through which the parent
//! back-reference changes — `attach`, `insert_child`, `detach`, and
//! `clear_children` are the only writers of `parent`. Sibling order is
//! z-order: the last child renders on top and is hit-tested first.
//!
//! Rectangles are stored relative to the parent; global coordinates,
//! clip rectangles, and effective flags are computed on demand by
//! walking the ancestor chain.

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::event::{Event, EventData};
use crate::geometry::{Edges, Point, Rect, Size};
use crate::style::{Background, Color, FontId, FrameStyle};
use crate::widget::WidgetKind;
use crate::{listbox, scrollbar};

new_key_type! {
    /// Handle into the widget arena. Stable across insertions/removals.
    pub struct WidgetId;
}

/// One widget: identity, geometry, state flags, appearance, tree links.
#[derive(Debug, Clone)]
pub struct WidgetNode {
    /// Diagnostic name; not required to be unique.
    pub name: String,
    /// Free-form application tag.
    pub tag: i64,
    pub kind: WidgetKind,
    pub(crate) parent: Option<WidgetId>,
    pub(crate) children: SmallVec<[WidgetId; 8]>,
    /// Position + size relative to the parent's top-left.
    pub(crate) rect: Rect,
    pub min_size: Size,
    /// Per-axis maximum; `Size::MAX` = unbounded.
    pub max_size: Size,
    pub padding: Edges,
    /// Own flag; effective value ANDs the ancestor chain.
    pub enabled: bool,
    /// Own flag; effective value ANDs the ancestor chain.
    pub visible: bool,
    /// Excluded from hit-testing (events fall through).
    pub transparent: bool,
    /// Exempt from parent clip intersection (dropdowns, menus).
    pub popup: bool,
    pub frame: Option<FrameStyle>,
    pub background: Option<Background>,
    pub foreground: Color,
    /// Shared font handle; `None` skips text drawing and caret math.
    pub font: Option<FontId>,
}

impl WidgetNode {
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            name: String::new(),
            tag: 0,
            kind,
            parent: None,
            children: SmallVec::new(),
            rect: Rect::ZERO,
            min_size: Size::ZERO,
            max_size: Size::MAX,
            padding: Edges::ZERO,
            enabled: true,
            visible: true,
            transparent: false,
            popup: false,
            frame: None,
            background: None,
            foreground: [0.0, 0.0, 0.0, 1.0],
            font: None,
        }
    }

    pub fn parent(&self) -> Option<WidgetId> {
        self.parent
    }

    /// Ordered child list (z-order: last = topmost).
    pub fn children(&self) -> &[WidgetId] {
        &self.children
    }

    /// Rectangle relative to the parent. Set through
    /// [`WidgetTree::set_rectangle`] so size clamping and reflow run.
    pub fn rectangle(&self) -> Rect {
        self.rect
    }
}

pub struct WidgetTree {
    arena: SlotMap<WidgetId, WidgetNode>,
    /// Events produced by tree/widget mutations, drained by the dispatch
    /// loop each tick.
    pending: Vec<Event>,
}

impl WidgetTree {
    pub fn new() -> Self {
        Self {
            arena: SlotMap::with_key(),
            pending: Vec::new(),
        }
    }

    /// Create an orphan widget. Attach it with [`WidgetTree::attach`].
    pub fn create(&mut self, kind: WidgetKind) -> WidgetId {
        self.arena.insert(WidgetNode::new(kind))
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.arena.get(id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        self.arena.get_mut(id)
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.arena.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.pending.push(event);
    }

    /// Drain events produced since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending)
    }

    // ------------------------------------------------------------------
    // Tree structure
    // ------------------------------------------------------------------

    /// Append `child` to `parent`'s child list (topmost z-order slot),
    /// detaching it from any current parent first.
    ///
    /// Panics if either id is stale or the attachment would create a cycle.
    pub fn attach(&mut self, parent: WidgetId, child: WidgetId) {
        let count = self.child_count(parent);
        self.insert_child(parent, count, child);
    }

    /// Insert `child` at `index` in `parent`'s child list.
    ///
    /// Panics if `index > child count`, if either id is stale, or if the
    /// attachment would create a cycle.
    pub fn insert_child(&mut self, parent: WidgetId, index: usize, child: WidgetId) {
        assert!(self.contains(parent), "attach: stale parent id");
        assert!(self.contains(child), "attach: stale child id");
        assert!(
            !self.is_descendant(parent, child),
            "attach: cycle ({} into its own subtree)",
            self.debug_name(child),
        );

        self.detach(child);

        let count = self.child_count(parent);
        assert!(index <= count, "insert_child: index {index} out of {count}");
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.insert(index, child);
        }
        if let Some(node) = self.arena.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    /// Unlink `id` from its parent. The widget is orphaned, not destroyed.
    /// No-op for roots and orphans.
    pub fn detach(&mut self, id: WidgetId) {
        let Some(parent) = self.arena.get(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_node) = self.arena.get_mut(parent) {
            parent_node.children.retain(|c| *c != id);
        }
        if let Some(node) = self.arena.get_mut(id) {
            node.parent = None;
        }
    }

    /// Orphan all children of `id` (they stay in the arena).
    pub fn clear_children(&mut self, id: WidgetId) {
        let children: SmallVec<[WidgetId; 8]> = match self.arena.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            if let Some(node) = self.arena.get_mut(child) {
                node.parent = None;
            }
        }
    }

    /// Reparent: detach from the current parent, then attach to `parent`
    /// (or leave orphaned for `None`).
    pub fn set_parent(&mut self, id: WidgetId, parent: Option<WidgetId>) {
        match parent {
            Some(p) => self.attach(p, id),
            None => self.detach(id),
        }
    }

    /// Remove `id` and its whole subtree from the arena.
    pub fn remove(&mut self, id: WidgetId) {
        self.detach(id);
        for rid in self.collect_subtree(id) {
            self.arena.remove(rid);
        }
    }

    /// `id` plus all descendants, depth-first.
    pub fn collect_subtree(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut out = Vec::new();
        self.collect_subtree_into(id, &mut out);
        out
    }

    fn collect_subtree_into(&self, id: WidgetId, out: &mut Vec<WidgetId>) {
        if let Some(node) = self.arena.get(id) {
            out.push(id);
            for &child in &node.children {
                self.collect_subtree_into(child, out);
            }
        }
    }

    /// True if `id` equals `ancestor` or lies in its subtree.
    pub fn is_descendant(&self, id: WidgetId, ancestor: WidgetId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.arena.get(c).and_then(|n| n.parent);
        }
        false
    }

    pub fn child_count(&self, id: WidgetId) -> usize {
        self.arena.get(id).map_or(0, |n| n.children.len())
    }

    /// Promote `id` to the top of its parent's z-order, then do the same
    /// for each ancestor up to the root.
    pub fn move_to_front(&mut self, id: WidgetId) {
        let mut current = id;
        while let Some(parent) = self.arena.get(current).and_then(|n| n.parent) {
            if let Some(parent_node) = self.arena.get_mut(parent) {
                parent_node.children.retain(|c| *c != current);
                parent_node.children.push(current);
            }
            current = parent;
        }
    }

    fn debug_name(&self, id: WidgetId) -> String {
        match self.arena.get(id) {
            Some(n) if !n.name.is_empty() => n.name.clone(),
            Some(n) => n.kind.type_name().to_string(),
            None => format!("{id:?}"),
        }
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Store a new parent-relative rectangle, clamping the size into
    /// `[min_size, max_size]`. Emits `Moved` / `Resized` when the position
    /// or size actually changed, and reflows composite widgets either way.
    pub fn set_rectangle(&mut self, id: WidgetId, rect: Rect) {
        let Some(node) = self.arena.get_mut(id) else {
            return;
        };
        let clamped = Rect::new(
            rect.x,
            rect.y,
            rect.width.max(node.min_size.width).min(node.max_size.width),
            rect.height
                .max(node.min_size.height)
                .min(node.max_size.height),
        );
        let old = node.rect;
        node.rect = clamped;
        let reflow_kind = match &node.kind {
            WidgetKind::ScrollBar(_) => 1,
            WidgetKind::ListBox(_) => 2,
            _ => 0,
        };

        if old.position() != clamped.position() {
            self.push_event(Event::new(
                id,
                EventData::Moved {
                    from: old.position(),
                    to: clamped.position(),
                },
            ));
        }
        if old.size() != clamped.size() {
            self.push_event(Event::new(
                id,
                EventData::Resized {
                    from: old.size(),
                    to: clamped.size(),
                },
            ));
        }

        match reflow_kind {
            1 => scrollbar::update_layout(self, id),
            2 => listbox::update_layout(self, id),
            _ => {}
        }
    }

    /// Widget-local point to global (screen) coordinates: add the origin
    /// of this widget and every ancestor. O(depth).
    pub fn local_to_global(&self, id: WidgetId, p: Point) -> Point {
        let mut out = p;
        let mut current = Some(id);
        while let Some(c) = current {
            let Some(node) = self.arena.get(c) else { break };
            out = out.offset(node.rect.x, node.rect.y);
            current = node.parent;
        }
        out
    }

    pub fn global_to_local(&self, id: WidgetId, p: Point) -> Point {
        let origin = self.local_to_global(id, Point::ZERO);
        Point::new(p.x - origin.x, p.y - origin.y)
    }

    pub fn local_to_global_rect(&self, id: WidgetId, r: Rect) -> Rect {
        let origin = self.local_to_global(id, r.position());
        Rect::new(origin.x, origin.y, r.width, r.height)
    }

    pub fn global_to_local_rect(&self, id: WidgetId, r: Rect) -> Rect {
        let origin = self.global_to_local(id, r.position());
        Rect::new(origin.x, origin.y, r.width, r.height)
    }

    /// Full bounds in global coordinates, ignoring clipping.
    pub fn displayed_rectangle(&self, id: WidgetId) -> Rect {
        let size = self.arena.get(id).map_or(Size::ZERO, |n| n.rect.size());
        let origin = self.local_to_global(id, Point::ZERO);
        Rect::new(origin.x, origin.y, size.width, size.height)
    }

    /// Global rectangle outside of which this widget cannot be hit: own
    /// bounds intersected with the parent's clip. Popups and roots clip
    /// only to their own bounds. Rendering narrows further, confining
    /// children to the parent's client area.
    pub fn clip_rectangle(&self, id: WidgetId) -> Rect {
        let displayed = self.displayed_rectangle(id);
        let Some(node) = self.arena.get(id) else {
            return displayed;
        };
        match node.parent {
            Some(parent) if !node.popup => displayed.intersect(&self.clip_rectangle(parent)),
            _ => displayed,
        }
    }

    /// Content area in global coordinates: bounds inset by frame and
    /// padding. Children are clipped to this.
    pub fn client_rectangle(&self, id: WidgetId) -> Rect {
        let displayed = self.displayed_rectangle(id);
        let Some(node) = self.arena.get(id) else {
            return displayed;
        };
        let frame = node.frame.map_or(0, |f| f.width);
        displayed.inset(Edges::all(frame)).inset(node.padding)
    }

    // ------------------------------------------------------------------
    // Flags and hit-testing
    // ------------------------------------------------------------------

    /// Own flag ANDed down the ancestor chain.
    pub fn effective_enabled(&self, id: WidgetId) -> bool {
        let Some(node) = self.arena.get(id) else {
            return false;
        };
        node.enabled && node.parent.is_none_or(|p| self.effective_enabled(p))
    }

    /// Own flag ANDed down the ancestor chain.
    pub fn effective_visible(&self, id: WidgetId) -> bool {
        let Some(node) = self.arena.get(id) else {
            return false;
        };
        node.visible && node.parent.is_none_or(|p| self.effective_visible(p))
    }

    /// Hit test for one widget: visible, not transparent, and the point
    /// falls inside the clip rectangle (a widget fully clipped away by an
    /// ancestor cannot be hit).
    pub fn contains_point(&self, id: WidgetId, p: Point) -> bool {
        let Some(node) = self.arena.get(id) else {
            return false;
        };
        if node.transparent || !self.effective_visible(id) {
            return false;
        }
        self.clip_rectangle(id).contains(p)
    }

    /// Topmost widget under `p` in the subtree rooted at `root`, or `root`
    /// itself when only it contains the point. Children are tested
    /// back-to-front (last added = topmost); invisible subtrees are
    /// skipped entirely.
    pub fn hit_test(&self, root: WidgetId, p: Point) -> Option<WidgetId> {
        let node = self.arena.get(root)?;
        if !node.visible {
            return None;
        }
        for &child in node.children.iter().rev() {
            if let Some(hit) = self.hit_test(child, p) {
                return Some(hit);
            }
        }
        if self.contains_point(root, p) {
            return Some(root);
        }
        None
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new()
    }
}
