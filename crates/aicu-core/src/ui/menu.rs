// src/ui/menu.rs
//! Hierarchical menu model.
//!
//! All nodes live in one arena owned by [`MenuTree`] and refer to each other
//! by [`MenuId`]. The tree tracks which node is active; input always goes to
//! that node. Navigation returns a [`Redraw`] plan so the view repaints only
//! the rows that changed.

use core::ops::Range;

use alloc::vec::Vec;

use log::{debug, warn};

/// Identity of a node inside one [`MenuTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuId(usize);

impl MenuId {
    pub const ROOT: MenuId = MenuId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItemKind<A> {
    /// Handed to the owner of the tree when selected
    Action(A),
    /// Enters the child node
    Submenu(MenuId),
    /// Returns to the parent node
    Back,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem<A> {
    pub label: &'static str,
    pub kind: MenuItemKind<A>,
}

#[derive(Debug)]
pub struct MenuNode<A> {
    title: &'static str,
    items: Vec<MenuItem<A>>,
    parent: Option<MenuId>,
    selected: usize,
    scroll: usize,
}

impl<A> MenuNode<A> {
    fn new(title: &'static str) -> Self {
        Self {
            title,
            items: Vec::new(),
            parent: None,
            selected: 0,
            scroll: 0,
        }
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    pub fn items(&self) -> &[MenuItem<A>] {
        &self.items
    }

    pub fn parent(&self) -> Option<MenuId> {
        self.parent
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Item indices currently on screen.
    pub fn visible_range(&self, rows: usize) -> Range<usize> {
        self.scroll..(self.scroll + rows).min(self.items.len())
    }

    fn is_visible(&self, index: usize, rows: usize) -> bool {
        index >= self.scroll && index < self.scroll + rows
    }

    fn ensure_selected_visible(&mut self, rows: usize) {
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + rows {
            self.scroll = self.selected + 1 - rows;
        }
    }

    fn redraw_after_move(&self, old_selected: usize, old_scroll: usize, rows: usize) -> Redraw {
        if self.scroll != old_scroll {
            Redraw::Visible
        } else if self.selected != old_selected {
            Redraw::Rows {
                unselect: self.is_visible(old_selected, rows).then_some(old_selected),
                select: self.is_visible(self.selected, rows).then_some(self.selected),
            }
        } else {
            Redraw::None
        }
    }
}

/// What the view has to repaint after a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redraw {
    None,
    /// Everything, including header and controls
    Full,
    /// The scroll window moved: every visible row
    Visible,
    /// Only the rows whose selection state changed
    Rows {
        unselect: Option<usize>,
        select: Option<usize>,
    },
}

/// Result of [`MenuTree::select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuOutcome<A> {
    /// Nothing to select
    None,
    /// The selected item carries this action
    Action(A),
    /// Another node became active and has to be drawn in full
    Entered(MenuId),
}

pub struct MenuTree<A> {
    nodes: Vec<MenuNode<A>>,
    active: MenuId,
    visible_rows: usize,
}

impl<A: Clone> MenuTree<A> {
    /// Create a tree with an empty root node titled `root_title`.
    pub fn new(root_title: &'static str, visible_rows: usize) -> Self {
        let mut nodes = Vec::new();
        nodes.push(MenuNode::new(root_title));
        Self {
            nodes,
            active: MenuId::ROOT,
            visible_rows: visible_rows.max(1),
        }
    }

    pub fn root(&self) -> MenuId {
        MenuId::ROOT
    }

    /// Add a detached node; link it with [`add_submenu`](Self::add_submenu).
    pub fn add_menu(&mut self, title: &'static str) -> MenuId {
        self.nodes.push(MenuNode::new(title));
        MenuId(self.nodes.len() - 1)
    }

    pub fn add_action(&mut self, menu: MenuId, label: &'static str, action: A) -> &mut Self {
        self.push_item(menu, label, MenuItemKind::Action(action))
    }

    /// Append an item entering `child` and make `menu` its parent.
    pub fn add_submenu(&mut self, menu: MenuId, label: &'static str, child: MenuId) -> &mut Self {
        match self.nodes.get_mut(child.0) {
            Some(node) => node.parent = Some(menu),
            None => {
                warn!("Submenu {:?} does not exist", child);
                return self;
            }
        }
        self.push_item(menu, label, MenuItemKind::Submenu(child))
    }

    /// Insert a Back item at the top of `menu`.
    pub fn add_back(&mut self, menu: MenuId, label: &'static str) -> &mut Self {
        if let Some(node) = self.nodes.get_mut(menu.0) {
            node.items.insert(
                0,
                MenuItem {
                    label,
                    kind: MenuItemKind::Back,
                },
            );
        }
        self
    }

    fn push_item(&mut self, menu: MenuId, label: &'static str, kind: MenuItemKind<A>) -> &mut Self {
        match self.nodes.get_mut(menu.0) {
            Some(node) => node.items.push(MenuItem { label, kind }),
            None => warn!("Menu {:?} does not exist", menu),
        }
        self
    }

    pub fn node(&self, id: MenuId) -> Option<&MenuNode<A>> {
        self.nodes.get(id.0)
    }

    pub fn active(&self) -> MenuId {
        self.active
    }

    pub fn active_node(&self) -> &MenuNode<A> {
        &self.nodes[self.active.0]
    }

    fn active_node_mut(&mut self) -> &mut MenuNode<A> {
        &mut self.nodes[self.active.0]
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Make `id` the active node. Unknown ids fall back to the root.
    pub fn begin(&mut self, id: MenuId) -> Redraw {
        self.active = if id.0 < self.nodes.len() {
            id
        } else {
            warn!("Menu {:?} does not exist, opening root", id);
            MenuId::ROOT
        };
        debug!(" Menu '{}' active", self.active_node().title);
        Redraw::Full
    }

    /// Move the selection down, wrapping to the first item.
    pub fn next(&mut self) -> Redraw {
        let rows = self.visible_rows;
        let node = self.active_node_mut();
        if node.items.is_empty() {
            return Redraw::None;
        }
        let (old_selected, old_scroll) = (node.selected, node.scroll);

        node.selected += 1;
        if node.selected >= node.items.len() {
            node.selected = 0;
            node.scroll = 0;
        } else {
            node.ensure_selected_visible(rows);
        }
        node.redraw_after_move(old_selected, old_scroll, rows)
    }

    /// Move the selection up, wrapping to the last item.
    pub fn previous(&mut self) -> Redraw {
        let rows = self.visible_rows;
        let node = self.active_node_mut();
        if node.items.is_empty() {
            return Redraw::None;
        }
        let (old_selected, old_scroll) = (node.selected, node.scroll);

        if node.selected == 0 {
            node.selected = node.items.len() - 1;
            node.scroll = node.items.len().saturating_sub(rows);
        } else {
            node.selected -= 1;
            node.ensure_selected_visible(rows);
        }
        node.redraw_after_move(old_selected, old_scroll, rows)
    }

    /// Activate the selected item.
    pub fn select(&mut self) -> MenuOutcome<A> {
        let node = self.active_node();
        let Some(item) = node.items.get(node.selected) else {
            return MenuOutcome::None;
        };

        let target = match &item.kind {
            MenuItemKind::Action(action) => return MenuOutcome::Action(action.clone()),
            MenuItemKind::Submenu(child) => *child,
            MenuItemKind::Back => match node.parent {
                Some(parent) => parent,
                None => return MenuOutcome::None,
            },
        };

        self.begin(target);
        MenuOutcome::Entered(self.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Act {
        Open(u32),
    }

    /// Root with `n` actions and one submenu holding Back plus one action.
    fn tree(n: u32, rows: usize) -> (MenuTree<Act>, MenuId) {
        let mut tree = MenuTree::new("Main", rows);
        let sub = tree.add_menu("Sub");
        let root = tree.root();
        for i in 0..n {
            tree.add_action(root, "item", Act::Open(i));
        }
        tree.add_submenu(root, "Sub", sub);
        tree.add_action(sub, "inner", Act::Open(100)).add_back(sub, "Back");
        (tree, sub)
    }

    #[test]
    fn test_next_wraps_to_start() {
        let (mut tree, _) = tree(5, 3);
        let len = tree.active_node().items().len();
        for _ in 0..len {
            tree.next();
        }
        assert_eq!(tree.active_node().selected(), 0);
        assert_eq!(tree.active_node().scroll(), 0);
    }

    #[test]
    fn test_previous_wrap_scrolls_to_end() {
        let (mut tree, _) = tree(5, 3);
        assert_eq!(tree.previous(), Redraw::Visible);
        let node = tree.active_node();
        assert_eq!(node.selected(), 5);
        assert_eq!(node.scroll(), 3);
        assert_eq!(node.visible_range(3), 3..6);
    }

    #[test]
    fn test_redraw_plan_only_touches_changed_rows() {
        let (mut tree, _) = tree(5, 3);
        assert_eq!(
            tree.next(),
            Redraw::Rows {
                unselect: Some(0),
                select: Some(1)
            }
        );
        tree.next();
        // selecting index 3 scrolls the window by one
        assert_eq!(tree.next(), Redraw::Visible);
        assert_eq!(tree.active_node().scroll(), 1);
        assert_eq!(
            tree.previous(),
            Redraw::Rows {
                unselect: Some(3),
                select: Some(2)
            }
        );
    }

    #[test]
    fn test_select_action_returns_value() {
        let (mut tree, _) = tree(3, 4);
        tree.next();
        assert_eq!(tree.select(), MenuOutcome::Action(Act::Open(1)));
        assert_eq!(tree.active(), tree.root());
    }

    #[test]
    fn test_submenu_and_back() {
        let (mut tree, sub) = tree(2, 4);
        tree.previous();
        assert_eq!(tree.select(), MenuOutcome::Entered(sub));
        assert_eq!(tree.active(), sub);

        // Back was inserted at the top
        assert_eq!(tree.active_node().items()[0].kind, MenuItemKind::Back);
        assert_eq!(tree.select(), MenuOutcome::Entered(MenuId::ROOT));
        assert_eq!(tree.active(), MenuId::ROOT);
        // the root keeps its selection
        assert_eq!(tree.active_node().selected(), 2);
    }

    #[test]
    fn test_empty_menu_is_inert() {
        let mut tree: MenuTree<Act> = MenuTree::new("Empty", 3);
        assert_eq!(tree.next(), Redraw::None);
        assert_eq!(tree.previous(), Redraw::None);
        assert_eq!(tree.select(), MenuOutcome::None);
    }

    #[test]
    fn test_begin_unknown_menu_opens_root() {
        let (mut tree, _) = tree(1, 3);
        assert_eq!(tree.begin(MenuId(42)), Redraw::Full);
        assert_eq!(tree.active(), MenuId::ROOT);
    }
}
