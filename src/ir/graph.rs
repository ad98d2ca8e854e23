//! A single IR graph: a rooted ordered tree of [`IrNode`]s with a mutable
//! insertion cursor.

use crate::ir::graph_set::GraphId;
use crate::ir::node::{IrNode, NodeId, NodeKind};
use crate::surface::ast::SyntaxRef;

/// A rooted ordered tree of IR nodes, stored as an arena so that parent and
/// child links are plain indices rather than `Rc`/`RefCell` cycles.
#[derive(Debug)]
pub struct IrGraph {
    pub id: GraphId,
    /// The mint-generated name identifying this graph (becomes the emitted
    /// function's identifier for continuation graphs).
    pub name: Box<str>,
    nodes: Vec<IrNode>,
    pub root: Option<NodeId>,
    /// The insertion cursor. May be reassigned arbitrarily by callers but
    /// always denotes a node of this graph.
    pub cursor: Option<NodeId>,
}

impl IrGraph {
    pub fn new(id: GraphId, name: Box<str>) -> Self {
        Self {
            id,
            name,
            nodes: Vec::new(),
            root: None,
            cursor: None,
        }
    }

    pub fn node(&self, id: NodeId) -> &IrNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut IrNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// If the graph is empty, `node` becomes the root; otherwise it is
    /// appended as the last child of the cursor. The cursor advances to
    /// `node` either way.
    pub fn add_node(&mut self, mut node: IrNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.id = id;
        node.graph = self.id;

        if self.root.is_none() {
            log::trace!("graph {}: initializing root with {}", self.name, node.name);
            self.root = Some(id);
            self.cursor = Some(id);
            self.nodes.push(node);
            return id;
        }

        let parent = self.cursor.expect("cursor must be set once root exists");
        node.parent = Some(parent);
        log::trace!(
            "graph {}: adding {} under cursor {:?}",
            self.name,
            node.name,
            parent
        );
        self.nodes.push(node);
        self.nodes[parent.index()].children.push(id);
        self.cursor = Some(id);
        id
    }

    /// Detaches `old`'s parent's reference to `old` and attaches `new` in the
    /// same slot; `old`'s children are reparented under `new`. `old` itself
    /// is left detached (unreachable from the tree, still resident in the
    /// arena) — the Rust analogue of the prototype's `del old_node`.
    pub fn replace_node(&mut self, old: NodeId, mut new_node: IrNode) -> NodeId {
        let new_id = NodeId(self.nodes.len() as u32);
        new_node.id = new_id;
        new_node.graph = self.id;
        new_node.parent = self.node(old).parent;
        new_node.children = std::mem::take(&mut self.node_mut(old).children);

        if let Some(parent) = new_node.parent {
            let slot = self
                .node_mut(parent)
                .children
                .iter_mut()
                .find(|c| **c == old)
                .expect("old must be a child of its recorded parent");
            *slot = new_id;
        } else {
            self.root = Some(new_id);
        }

        for &child in &new_node.children.clone() {
            self.node_mut(child).parent = Some(new_id);
        }

        self.node_mut(old).parent = None;
        self.nodes.push(new_node);
        new_id
    }

    /// `child` must be a direct child of `parent`. `new` takes `child`'s
    /// slot under `parent`; `child` becomes `new`'s sole child.
    pub fn insert_between(&mut self, parent: NodeId, child: NodeId, mut new_node: IrNode) -> NodeId {
        debug_assert!(
            self.node(parent).children.contains(&child),
            "insert_between: {child:?} is not a child of {parent:?}"
        );

        let new_id = NodeId(self.nodes.len() as u32);
        new_node.id = new_id;
        new_node.graph = self.id;
        new_node.parent = Some(parent);
        new_node.children = vec![child];

        let slot = self
            .node_mut(parent)
            .children
            .iter_mut()
            .find(|c| **c == child)
            .expect("checked above");
        *slot = new_id;

        self.nodes.push(new_node);
        self.node_mut(child).parent = Some(new_id);
        new_id
    }

    /// Detaches `node` (and its descendants, which remain attached under it)
    /// from its parent.
    pub fn remove_node(&mut self, node: NodeId) {
        if let Some(parent) = self.node(node).parent {
            self.node_mut(parent).children.retain(|c| *c != node);
        } else {
            self.root = None;
        }
        self.node_mut(node).parent = None;
    }

    /// Every leaf in the subtree rooted at `from`, within this graph only
    /// (does not follow `Link`s — see [`crate::ir::graph_set::GraphSet::cross_graph_leaves`]).
    pub fn leaves(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(from, &mut out);
        out
    }

    fn collect_leaves(&self, node: NodeId, out: &mut Vec<NodeId>) {
        let n = self.node(node);
        if n.children.is_empty() {
            out.push(node);
            return;
        }
        for &child in &n.children {
            self.collect_leaves(child, out);
        }
    }

    /// Every node in the subtree rooted at `from`, parent before children,
    /// children visited in insertion order. Returned eagerly as a `Vec` so
    /// that passes can mutate the graph while iterating the result without
    /// fighting the borrow checker — restarting the traversal after a
    /// mutation is the caller's responsibility.
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_preorder(from, &mut out);
        out
    }

    fn walk_preorder(&self, node: NodeId, out: &mut Vec<NodeId>) {
        out.push(node);
        for &child in &self.node(node).children {
            self.walk_preorder(child, out);
        }
    }

    /// Every node in the subtree rooted at `from`, children before parent.
    pub fn postorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_postorder(from, &mut out);
        out
    }

    fn walk_postorder(&self, node: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.node(node).children {
            self.walk_postorder(child, out);
        }
        out.push(node);
    }

    /// Captures the subtree rooted at `from` as an owned, graph-independent
    /// snapshot — the read half of a deep copy. Split from the write half
    /// ([`Self::graft`]) so that copying *across* graphs (the common case:
    /// [`crate::ir::graph_set::GraphSet::copy_subtree`]) never needs two
    /// simultaneous mutable borrows into the same graph arena.
    pub fn snapshot(&self, from: NodeId) -> Snapshot {
        let n = self.node(from);
        Snapshot {
            kind: n.kind.clone(),
            syntax: n.syntax.clone(),
            children: n.children.iter().map(|&c| self.snapshot(c)).collect(),
        }
    }

    /// Grafts a [`Snapshot`] onto this graph as the last child of the
    /// current cursor (or as its root, if empty). Grafted copies receive
    /// fresh ids but share the snapshot's syntax-tree reference.
    pub fn graft(&mut self, snapshot: &Snapshot) -> NodeId {
        let id = self.add_node(IrNode::new(snapshot.kind.clone(), snapshot.syntax.clone()));
        for child in &snapshot.children {
            // Reset the cursor before each child: the previous child's own
            // descendants may have walked the cursor deep into its subtree.
            self.cursor = Some(id);
            self.graft(child);
        }
        id
    }
}

/// An owned, graph-independent copy of an IR subtree (see
/// [`IrGraph::snapshot`]/[`IrGraph::graft`]).
#[derive(Debug, Clone)]
pub struct Snapshot {
    kind: NodeKind,
    syntax: Option<SyntaxRef>,
    children: Vec<Snapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g() -> IrGraph {
        IrGraph::new(GraphId(0), "g".into())
    }

    #[test]
    fn add_node_sets_root_then_chains_children() {
        let mut graph = g();
        let root = graph.add_node(IrNode::new(NodeKind::Function, None));
        let a = graph.add_node(IrNode::new(NodeKind::Call, None));
        assert_eq!(graph.root, Some(root));
        assert_eq!(graph.node(root).children, vec![a]);
        assert_eq!(graph.node(a).parent, Some(root));
    }

    #[test]
    fn insert_between_splices_in_new_node() {
        let mut graph = g();
        let root = graph.add_node(IrNode::new(NodeKind::Function, None));
        let a = graph.add_node(IrNode::new(NodeKind::Call, None));
        let set_ptr = graph.insert_between(
            root,
            a,
            IrNode::new(
                NodeKind::SetEventPointer { link_id: "link_x".into() },
                None,
            ),
        );
        assert_eq!(graph.node(root).children, vec![set_ptr]);
        assert_eq!(graph.node(set_ptr).children, vec![a]);
        assert_eq!(graph.node(a).parent, Some(set_ptr));
    }

    #[test]
    fn remove_node_detaches_but_keeps_descendants() {
        let mut graph = g();
        let root = graph.add_node(IrNode::new(NodeKind::Function, None));
        let a = graph.add_node(IrNode::new(NodeKind::Call, None));
        graph.remove_node(a);
        assert!(graph.node(root).children.is_empty());
        assert_eq!(graph.node(a).parent, None);
    }

    #[test]
    fn leaves_of_linear_chain_is_the_tail() {
        let mut graph = g();
        let root = graph.add_node(IrNode::new(NodeKind::Function, None));
        let _a = graph.add_node(IrNode::new(NodeKind::Call, None));
        let b = graph.add_node(IrNode::new(NodeKind::Call, None));
        assert_eq!(graph.leaves(root), vec![b]);
    }

    #[test]
    fn preorder_and_postorder_agree_on_node_set() {
        let mut graph = g();
        let root = graph.add_node(IrNode::new(NodeKind::Function, None));
        graph.cursor = Some(root);
        let a = graph.add_node(IrNode::new(NodeKind::Call, None));
        graph.cursor = Some(root);
        let b = graph.add_node(IrNode::new(NodeKind::Call, None));

        let mut pre = graph.preorder(root);
        let mut post = graph.postorder(root);
        pre.sort();
        post.sort();
        assert_eq!(pre, post);
        assert_eq!(pre, vec![root, a, b]);
    }
}
