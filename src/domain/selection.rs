//! Hierarchical selection model for export targets.
//!
//! Mirrors the UI's checkbox tree as an arena of nodes addressed by index,
//! with children stored as ordered id lists and parents in a reverse map —
//! no cyclic ownership. Server and Category nodes are structural only; only
//! checked, selectable DM and Channel leaves ever resolve to export targets.

use crate::domain::{AppError, ExportTarget, Result, TargetKind};

/// Index of a node inside a [`SelectionTree`] arena.
pub type NodeId = usize;

/// Kind of a node in the selection tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Direct-message leaf.
    Dm,
    /// Server (guild) parent.
    Server,
    /// Channel category parent.
    Category,
    /// Text channel leaf.
    Channel,
}

impl NodeKind {
    /// Whether this kind can be exported directly.
    #[must_use]
    pub const fn is_leaf(self) -> bool {
        matches!(self, Self::Dm | Self::Channel)
    }
}

/// Tri-state checkbox value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckState {
    /// Not selected.
    #[default]
    Unchecked,
    /// Fully selected.
    Checked,
    /// Some but not all selectable descendants selected.
    PartiallyChecked,
}

/// One entry of the selection tree.
#[derive(Debug, Clone)]
pub struct SelectionNode {
    /// Opaque stable identifier (remote channel/guild/category id).
    pub stable_id: String,
    /// Display name.
    pub name: String,
    /// Structural kind.
    pub kind: NodeKind,
    /// Current check state. Parent states are derived aggregates.
    pub check: CheckState,
    /// False for disabled/unavailable nodes; they never resolve.
    pub selectable: bool,
}

impl SelectionNode {
    /// Create a selectable, unchecked node.
    #[must_use]
    pub fn new(stable_id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            stable_id: stable_id.into(),
            name: name.into(),
            kind,
            check: CheckState::Unchecked,
            selectable: true,
        }
    }

    /// Mark the node unavailable.
    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.selectable = false;
        self
    }
}

/// Arena-backed selection tree.
///
/// Callers refreshing the tree from the remote API must rebuild it from
/// scratch (all nodes start unchecked); the tree never carries state across
/// a reconnect.
#[derive(Debug, Default)]
pub struct SelectionTree {
    nodes: Vec<SelectionNode>,
    children: Vec<Vec<NodeId>>,
    parent: Vec<Option<NodeId>>,
    roots: Vec<NodeId>,
}

impl SelectionTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a top-level node.
    pub fn add_root(&mut self, node: SelectionNode) -> NodeId {
        let id = self.push(node, None);
        self.roots.push(id);
        id
    }

    /// Add a child under `parent_id`, preserving insertion order.
    pub fn add_child(&mut self, parent_id: NodeId, node: SelectionNode) -> NodeId {
        let id = self.push(node, Some(parent_id));
        self.children[parent_id].push(id);
        id
    }

    fn push(&mut self, node: SelectionNode, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.parent.push(parent);
        id
    }

    /// Borrow a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SelectionNode {
        &self.nodes[id]
    }

    /// Number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn is_exportable_leaf(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        node.kind.is_leaf() && node.selectable
    }

    fn is_checkable_parent(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        matches!(node.kind, NodeKind::Server | NodeKind::Category) && node.selectable
    }

    fn has_selectable_leaf_descendants(&self, id: NodeId) -> bool {
        self.children[id].iter().any(|&child| {
            self.is_exportable_leaf(child) || self.has_selectable_leaf_descendants(child)
        })
    }

    /// Toggle a node to the desired checked state.
    ///
    /// Toggling a parent cascades to every selectable leaf descendant;
    /// toggling a leaf changes only that leaf. Either way, ancestor states
    /// are recomputed bottom-up as pure aggregates. Non-selectable nodes
    /// are ignored.
    pub fn toggle(&mut self, id: NodeId, desired: bool) {
        if !self.nodes[id].selectable {
            return;
        }
        let state = if desired {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        };

        if self.is_exportable_leaf(id) {
            self.nodes[id].check = state;
        } else if self.is_checkable_parent(id) {
            if !self.has_selectable_leaf_descendants(id) {
                self.nodes[id].check = CheckState::Unchecked;
                return;
            }
            self.set_descendant_leaf_state(id, state);
            self.recompute_subtree_parent_states(id);
        } else {
            return;
        }

        self.recompute_ancestor_states(self.parent[id]);
    }

    fn set_descendant_leaf_state(&mut self, id: NodeId, state: CheckState) {
        for idx in 0..self.children[id].len() {
            let child = self.children[id][idx];
            if self.is_exportable_leaf(child) {
                self.nodes[child].check = state;
            } else {
                self.set_descendant_leaf_state(child, state);
            }
        }
    }

    fn recompute_subtree_parent_states(&mut self, id: NodeId) {
        for idx in 0..self.children[id].len() {
            let child = self.children[id][idx];
            if self.is_checkable_parent(child) {
                self.recompute_subtree_parent_states(child);
            }
        }
        if self.is_checkable_parent(id) {
            self.nodes[id].check = self.derive_parent_state(id);
        }
    }

    fn recompute_ancestor_states(&mut self, from: Option<NodeId>) {
        let mut cursor = from;
        while let Some(id) = cursor {
            if self.is_checkable_parent(id) {
                self.nodes[id].check = self.derive_parent_state(id);
            }
            cursor = self.parent[id];
        }
    }

    fn derive_parent_state(&self, id: NodeId) -> CheckState {
        let mut states = Vec::new();
        for &child in &self.children[id] {
            if self.is_exportable_leaf(child)
                || (self.is_checkable_parent(child) && self.has_selectable_leaf_descendants(child))
            {
                states.push(self.nodes[child].check);
            }
        }
        if states.is_empty() {
            return CheckState::Unchecked;
        }
        if states.iter().all(|s| *s == CheckState::Checked) {
            return CheckState::Checked;
        }
        if states.iter().all(|s| *s == CheckState::Unchecked) {
            return CheckState::Unchecked;
        }
        CheckState::PartiallyChecked
    }

    /// Resolve the checked leaves into an ordered, deduplicated target list.
    ///
    /// # Errors
    /// Returns [`AppError::EmptySelection`] if no selectable leaf is checked.
    pub fn resolve(&self) -> Result<Vec<ExportTarget>> {
        let mut targets = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for &root in &self.roots {
            self.collect_checked(root, &mut targets, &mut seen);
        }

        if targets.is_empty() {
            return Err(AppError::EmptySelection);
        }
        Ok(targets)
    }

    fn collect_checked(
        &self,
        id: NodeId,
        targets: &mut Vec<ExportTarget>,
        seen: &mut std::collections::HashSet<String>,
    ) {
        if self.is_exportable_leaf(id) && self.nodes[id].check == CheckState::Checked {
            let node = &self.nodes[id];
            if seen.insert(node.stable_id.clone()) {
                targets.push(ExportTarget {
                    target_id: node.stable_id.clone(),
                    display_name: node.name.clone(),
                    parent_path: self.server_path(id),
                    kind: match node.kind {
                        NodeKind::Dm => TargetKind::Dm,
                        _ => TargetKind::Channel,
                    },
                });
            }
        }
        for &child in &self.children[id] {
            self.collect_checked(child, targets, seen);
        }
    }

    /// Server names on the path from root to `id`, outermost first.
    fn server_path(&self, id: NodeId) -> Vec<String> {
        let mut path = Vec::new();
        let mut cursor = self.parent[id];
        while let Some(ancestor) = cursor {
            if self.nodes[ancestor].kind == NodeKind::Server {
                path.push(self.nodes[ancestor].name.clone());
            }
            cursor = self.parent[ancestor];
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Server with one category (two channels) and one loose channel.
    fn sample_tree() -> (SelectionTree, NodeId, NodeId, Vec<NodeId>) {
        let mut tree = SelectionTree::new();
        let server = tree.add_root(SelectionNode::new("g1", "Guild", NodeKind::Server));
        let category = tree.add_child(server, SelectionNode::new("cat1", "Text", NodeKind::Category));
        let ch_general = tree.add_child(category, SelectionNode::new("c1", "general", NodeKind::Channel));
        let ch_random = tree.add_child(category, SelectionNode::new("c2", "random", NodeKind::Channel));
        let ch_loose = tree.add_child(server, SelectionNode::new("c3", "announcements", NodeKind::Channel));
        (tree, server, category, vec![ch_general, ch_random, ch_loose])
    }

    #[test]
    fn test_category_check_cascades_to_channels() {
        let (mut tree, server, category, channels) = sample_tree();

        tree.toggle(category, true);
        assert_eq!(tree.node(channels[0]).check, CheckState::Checked);
        assert_eq!(tree.node(channels[1]).check, CheckState::Checked);
        assert_eq!(tree.node(channels[2]).check, CheckState::Unchecked);
        assert_eq!(tree.node(category).check, CheckState::Checked);
        assert_eq!(tree.node(server).check, CheckState::PartiallyChecked);
    }

    #[test]
    fn test_uncheck_cascades_regardless_of_prior_state() {
        let (mut tree, server, category, channels) = sample_tree();

        // Mixed state: one channel checked inside the category.
        tree.toggle(channels[0], true);
        assert_eq!(tree.node(category).check, CheckState::PartiallyChecked);

        tree.toggle(category, false);
        assert_eq!(tree.node(channels[0]).check, CheckState::Unchecked);
        assert_eq!(tree.node(channels[1]).check, CheckState::Unchecked);
        assert_eq!(tree.node(category).check, CheckState::Unchecked);
        assert_eq!(tree.node(server).check, CheckState::Unchecked);
    }

    #[test]
    fn test_leaf_toggle_updates_ancestors_only() {
        let (mut tree, server, category, channels) = sample_tree();

        tree.toggle(channels[0], true);
        assert_eq!(tree.node(channels[1]).check, CheckState::Unchecked);
        assert_eq!(tree.node(category).check, CheckState::PartiallyChecked);
        assert_eq!(tree.node(server).check, CheckState::PartiallyChecked);

        tree.toggle(channels[1], true);
        tree.toggle(channels[2], true);
        assert_eq!(tree.node(server).check, CheckState::Checked);
    }

    #[test]
    fn test_resolve_orders_and_builds_paths() {
        let (mut tree, server, _, _channels) = sample_tree();
        let dm = tree.add_root(SelectionNode::new("d1", "Alice", NodeKind::Dm));

        tree.toggle(server, true);
        tree.toggle(dm, true);

        let targets = tree.resolve().unwrap();
        let ids: Vec<&str> = targets.iter().map(|t| t.target_id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3", "d1"]);
        assert_eq!(targets[0].parent_path, vec!["Guild".to_string()]);
        assert_eq!(targets[0].kind, TargetKind::Channel);
        assert!(targets[3].parent_path.is_empty());
        assert_eq!(targets[3].kind, TargetKind::Dm);
    }

    #[test]
    fn test_resolve_dedups_by_stable_id() {
        let mut tree = SelectionTree::new();
        let a = tree.add_root(SelectionNode::new("d1", "Alice", NodeKind::Dm));
        let b = tree.add_root(SelectionNode::new("d1", "Alice (dup)", NodeKind::Dm));
        tree.toggle(a, true);
        tree.toggle(b, true);

        let targets = tree.resolve().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].display_name, "Alice");
    }

    #[test]
    fn test_resolve_excludes_disabled_and_parents() {
        let (mut tree, server, category, channels) = sample_tree();
        let dead = tree.add_child(category, SelectionNode::new("c9", "locked", NodeKind::Channel).unavailable());

        tree.toggle(server, true);
        tree.toggle(dead, true); // ignored: not selectable

        let targets = tree.resolve().unwrap();
        assert!(targets.iter().all(|t| t.target_id != "c9"));
        assert!(targets.iter().all(|t| t.target_id != "g1"));
        assert_eq!(targets.len(), channels.len());
    }

    #[test]
    fn test_empty_selection_is_an_error() {
        let (tree, ..) = sample_tree();
        assert!(matches!(tree.resolve(), Err(AppError::EmptySelection)));
    }

    #[test]
    fn test_parent_without_selectable_leaves_stays_unchecked() {
        let mut tree = SelectionTree::new();
        let server = tree.add_root(SelectionNode::new("g1", "Empty", NodeKind::Server));
        let category = tree.add_child(server, SelectionNode::new("cat1", "Void", NodeKind::Category));
        tree.toggle(category, true);
        assert_eq!(tree.node(category).check, CheckState::Unchecked);
        assert_eq!(tree.node(server).check, CheckState::Unchecked);
    }
}
