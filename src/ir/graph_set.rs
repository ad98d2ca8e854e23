//! The collection of all IR graphs produced during a compilation: the
//! original program graph plus every continuation graph produced while
//! splitting.

use std::collections::HashSet;
use std::fmt::Write as _;

use petgraph::algo::is_cyclic_directed;
use petgraph::dot::{Config, Dot};
use petgraph::graph::DiGraph;

use crate::error::{Cycle, Error};
use crate::ir::graph::IrGraph;
use crate::ir::node::NodeId;

/// Identifies one [`IrGraph`] within a [`GraphSet`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(pub u32);

impl GraphId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// An arena of [`IrGraph`]s. `Link` nodes are the only mechanism that
/// crosses graph boundaries, and their target is always the root of another
/// graph in this set.
#[derive(Debug, Default)]
pub struct GraphSet {
    graphs: Vec<IrGraph>,
}

impl GraphSet {
    pub fn new() -> Self {
        Self { graphs: Vec::new() }
    }

    pub fn new_graph(&mut self, name: Box<str>) -> GraphId {
        let id = GraphId(self.graphs.len() as u32);
        self.graphs.push(IrGraph::new(id, name));
        id
    }

    pub fn get(&self, id: GraphId) -> &IrGraph {
        &self.graphs[id.index()]
    }

    pub fn get_mut(&mut self, id: GraphId) -> &mut IrGraph {
        &mut self.graphs[id.index()]
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = GraphId> + '_ {
        (0..self.graphs.len()).map(|i| GraphId(i as u32))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IrGraph> {
        self.graphs.iter()
    }

    /// Deep-copies the subtree rooted at `src_node` (in `src_graph`) onto the
    /// last child of `dst_graph`'s cursor. Split into a read-only snapshot
    /// and a separate graft so that
    /// `src_graph` and `dst_graph` never need to be borrowed mutably at the
    /// same time, even though both live in the same `Vec`.
    pub fn copy_subtree(
        &mut self,
        src_graph: GraphId,
        src_node: NodeId,
        dst_graph: GraphId,
    ) -> NodeId {
        let snapshot = self.get(src_graph).snapshot(src_node);
        self.get_mut(dst_graph).graft(&snapshot)
    }

    /// Leaves reachable from `from` (in `graph`), following `Link` nodes
    /// transitively into their target graphs' roots. A leaf reached via more
    /// than one incoming `Link` — e.g. every arm of a `Branch` linking to the
    /// same trailing continuation — is reported once, in first-visit order.
    pub fn cross_graph_leaves(&self, graph: GraphId, from: NodeId) -> Vec<(GraphId, NodeId)> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_cross_graph_leaves(graph, from, &mut out, &mut seen);
        out
    }

    fn collect_cross_graph_leaves(
        &self,
        graph: GraphId,
        node: NodeId,
        out: &mut Vec<(GraphId, NodeId)>,
        seen: &mut HashSet<(GraphId, NodeId)>,
    ) {
        let g = self.get(graph);
        let n = g.node(node);

        if n.children.is_empty() {
            if seen.insert((graph, node)) {
                out.push((graph, node));
            }
            return;
        }

        for &child in &n.children {
            if let Some((target, _is_async, _)) = g.node(child).kind.as_link() {
                let target_root = self.get(target).root.expect("continuation graphs are never empty");
                self.collect_cross_graph_leaves(target, target_root, out, seen);
            } else {
                self.collect_cross_graph_leaves(graph, child, out, seen);
            }
        }
    }

    /// Checks that the relation induced by `Link` targets on graphs is
    /// acyclic. One petgraph node per `IrGraph`, one edge
    /// per `Link`.
    pub fn check_acyclic(&self) -> Result<(), Error> {
        let mut dep: DiGraph<GraphId, ()> = DiGraph::new();
        let indices: Vec<_> = self.ids().map(|gid| dep.add_node(gid)).collect();

        for (i, graph) in self.graphs.iter().enumerate() {
            for node_id in 0..graph.len() {
                let node = graph.node(NodeId(node_id as u32));
                if let Some((target, _, _)) = node.kind.as_link() {
                    dep.add_edge(indices[i], indices[target.index()], ());
                }
            }
        }

        if !is_cyclic_directed(&dep) {
            return Ok(());
        }

        let sccs = petgraph::algo::tarjan_scc(&dep);
        let cycles = sccs
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| Cycle {
                graphs: scc
                    .iter()
                    .map(|&idx| self.get(dep[idx]).name.to_string())
                    .collect(),
            })
            .collect::<Vec<_>>();

        Err(Error::RecursionDetected(cycles))
    }

    /// A Graphviz dot rendering of every graph, one node per [`IrNode`] and
    /// one edge per parent/child or `Link` relationship — a debugging aid,
    /// not part of the compiled output. Reuses [`petgraph`]'s own formatter
    /// rather than a dedicated rendering stack, since this is throwaway
    /// diagnostic output, not a deliverable.
    pub fn to_dot(&self) -> String {
        let mut dep: DiGraph<String, &'static str> = DiGraph::new();
        let mut indices = Vec::with_capacity(self.graphs.len());

        for graph in &self.graphs {
            let mut node_indices = Vec::with_capacity(graph.len());
            for i in 0..graph.len() {
                let node = graph.node(NodeId(i as u32));
                let label = format!("{}::{}", graph.name, node.kind.label());
                node_indices.push(dep.add_node(label));
            }
            indices.push(node_indices);
        }

        for (gi, graph) in self.graphs.iter().enumerate() {
            for i in 0..graph.len() {
                let node = graph.node(NodeId(i as u32));
                for &child in &node.children {
                    dep.add_edge(indices[gi][i], indices[gi][child.index()], "child");
                }
                if let Some((target, is_async, _)) = node.kind.as_link() {
                    let target_root = self.get(target).root.expect("continuation graphs are never empty");
                    dep.add_edge(
                        indices[gi][i],
                        indices[target.index()][target_root.index()],
                        if is_async { "async" } else { "sync" },
                    );
                }
            }
        }

        let mut buffer = String::new();
        write!(&mut buffer, "{}", Dot::with_config(&dep, &[Config::EdgeNoLabel])).expect("writing to a String never fails");
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::node::{IrNode, NodeKind};

    fn link_node(target: GraphId, is_async: bool, link_id: &str) -> IrNode {
        IrNode::new(
            NodeKind::Link {
                target,
                is_async,
                link_id: link_id.into(),
            },
            None,
        )
    }

    #[test]
    fn acyclic_forest_passes() {
        let mut set = GraphSet::new();
        let a = set.new_graph("a".into());
        let b = set.new_graph("b".into());
        set.get_mut(a).add_node(IrNode::new(NodeKind::Function, None));
        set.get_mut(a).add_node(link_node(b, true, "link_1"));
        set.get_mut(b)
            .add_node(IrNode::new(NodeKind::FunctionStub { function_name: "b".into() }, None));

        assert!(set.check_acyclic().is_ok());
    }

    #[test]
    fn cycle_is_detected() {
        let mut set = GraphSet::new();
        let a = set.new_graph("a".into());
        let b = set.new_graph("b".into());
        set.get_mut(a).add_node(IrNode::new(NodeKind::Function, None));
        set.get_mut(a).add_node(link_node(b, true, "link_1"));
        set.get_mut(b)
            .add_node(IrNode::new(NodeKind::FunctionStub { function_name: "b".into() }, None));
        set.get_mut(b).add_node(link_node(a, false, "link_2"));

        let err = set.check_acyclic().unwrap_err();
        assert!(matches!(err, Error::RecursionDetected(_)));
    }

    #[test]
    fn cross_graph_leaves_follow_links_and_dedupe() {
        let mut set = GraphSet::new();
        let a = set.new_graph("a".into());
        let cont = set.new_graph("cont".into());

        let root = set.get_mut(a).add_node(IrNode::new(NodeKind::Function, None));
        set.get_mut(a).cursor = Some(root);
        let branch = set.get_mut(a).add_node(IrNode::new(NodeKind::Branch { has_source_else: true }, None));
        set.get_mut(a).cursor = Some(branch);
        let block = set.get_mut(a).add_node(IrNode::new(NodeKind::Block, None));
        set.get_mut(a).cursor = Some(block);
        let arm1 = set
            .get_mut(a)
            .add_node(IrNode::new(NodeKind::Conditional { is_else: false }, None));
        set.get_mut(a).cursor = Some(block);
        let arm2 = set
            .get_mut(a)
            .add_node(IrNode::new(NodeKind::Conditional { is_else: true }, None));

        set.get_mut(a).cursor = Some(arm1);
        set.get_mut(a).add_node(link_node(cont, false, "link_1"));
        set.get_mut(a).cursor = Some(arm2);
        set.get_mut(a).add_node(link_node(cont, false, "link_2"));

        set.get_mut(cont)
            .add_node(IrNode::new(NodeKind::FunctionStub { function_name: "cont".into() }, None));

        let leaves = set.cross_graph_leaves(a, root);
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].0, cont);
    }
}
