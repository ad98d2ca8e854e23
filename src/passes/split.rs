//! Async splitting (pass 4): at every async node, moves its subtree into a
//! fresh continuation graph and replaces it with an asynchronous `Link`.
//!
//! An async node's subtree `S` comes from one of two places, depending on
//! whether pass 3 already touched this node:
//!
//! - If the async node was a leaf of some `Branch`'s body, pass 3 already
//!   gave it a single (synchronous) `Link` child pointing at the branch's
//!   hoisted tail — that child *is* `S`.
//! - Otherwise (the common straight-line case) the async node has no child
//!   yet; `S` is its own trailing siblings within its parent's children,
//!   exactly the tail pass 3 would hoist for a `Branch`. An async node with
//!   neither an existing child nor a sibling tail (the last statement of its
//!   block) still needs an async `Link` — to an empty continuation — since
//!   every `AsyncCall`/`AsyncAssign` must have as its sole child an
//!   asynchronous `Link`.

use crate::error::Error;
use crate::ident::IdentMint;
use crate::ir::graph_set::GraphId;
use crate::ir::node::{IrNode, NodeId, NodeKind};
use crate::ir::GraphSet;

/// Runs pass 4 to a fixed point across the whole graph set, including
/// continuation graphs it creates along the way (a hoisted subtree may
/// itself contain further async nodes to split).
pub fn split(gs: &mut GraphSet, mint: &mut IdentMint) -> Result<(), Error> {
    while let Some(work) = find_next_async(gs)? {
        split_one(gs, mint, work);
        // Structural mutation invalidates the prior traversal; restart.
    }
    reject_return_in_continuations(gs)
}

/// What pass 4 must do for the next not-yet-split async node it finds.
enum Work {
    /// The async node already has a (non-`Link`) child — hoist it.
    ExistingChild { graph: GraphId, node: NodeId, child: NodeId },
    /// The async node has no child, but a non-empty trailing tail within its
    /// parent — hoist the tail.
    SiblingTail { graph: GraphId, node: NodeId, tail: Vec<NodeId> },
    /// Nothing to hoist; still needs an async `Link` to an empty
    /// continuation.
    Empty { graph: GraphId, node: NodeId },
}

fn find_next_async(gs: &GraphSet) -> Result<Option<Work>, Error> {
    for graph_id in gs.ids() {
        let graph = gs.get(graph_id);
        let Some(root) = graph.root else { continue };
        for node_id in graph.postorder(root) {
            let node = graph.node(node_id);
            if !node.kind.is_async_boundary() {
                continue;
            }
            match node.children.as_slice() {
                [] => {
                    let parent = node
                        .parent
                        .expect("every non-root node has a parent, and async nodes are never the graph root");
                    let siblings = &graph.node(parent).children;
                    let pos = siblings
                        .iter()
                        .position(|&c| c == node_id)
                        .expect("node_id is recorded as one of parent's children");
                    let tail: Vec<NodeId> = siblings[pos + 1..].to_vec();
                    return Ok(Some(if tail.is_empty() {
                        Work::Empty { graph: graph_id, node: node_id }
                    } else {
                        Work::SiblingTail { graph: graph_id, node: node_id, tail }
                    }));
                }
                [only] => {
                    if matches!(graph.node(*only).kind.as_link(), Some((_, true, _))) {
                        continue; // already split in a previous iteration
                    }
                    return Ok(Some(Work::ExistingChild { graph: graph_id, node: node_id, child: *only }));
                }
                many => {
                    return Err(Error::invariant(format!(
                        "async node {node_id:?} has {} children on entry to pass 4, expected at most 1",
                        many.len()
                    )));
                }
            }
        }
    }
    Ok(None)
}

fn split_one(gs: &mut GraphSet, mint: &mut IdentMint, work: Work) {
    let (graph_id, node, tail): (GraphId, NodeId, Vec<NodeId>) = match work {
        Work::ExistingChild { graph, node, child } => (graph, node, vec![child]),
        Work::SiblingTail { graph, node, tail } => (graph, node, tail),
        Work::Empty { graph, node } => (graph, node, Vec::new()),
    };

    let stub_name = mint.fresh_function_name();
    let continuation = gs.new_graph(stub_name.clone());
    gs.get_mut(continuation)
        .add_node(IrNode::new(NodeKind::FunctionStub { function_name: stub_name }, None));
    let stub_root = gs.get(continuation).root.expect("just added the stub root above");

    for &t in &tail {
        gs.get_mut(continuation).cursor = Some(stub_root);
        gs.copy_subtree(graph_id, t, continuation);
    }
    for &t in &tail {
        gs.get_mut(graph_id).remove_node(t);
    }

    let link_id = mint.fresh_link_name();
    gs.get_mut(graph_id).cursor = Some(node);
    gs.get_mut(graph_id).add_node(IrNode::new(
        NodeKind::Link { target: continuation, is_async: true, link_id },
        None,
    ));
}

/// A continuation graph (any graph whose root is a `Function-stub`, i.e.
/// every graph but the entry graph) must not contain a `Return` — value
/// passing back through an await boundary has no designed mechanism yet.
fn reject_return_in_continuations(gs: &GraphSet) -> Result<(), Error> {
    for graph in gs.iter() {
        if !matches!(graph.node(graph.root.expect("populated")).kind, NodeKind::FunctionStub { .. }) {
            continue;
        }
        let root = graph.root.expect("populated");
        for node in graph.preorder(root) {
            if matches!(graph.node(node).kind, NodeKind::Return) {
                return Err(Error::unsupported(
                    "return statements inside a continuation are not supported",
                ));
            }
        }
    }
    Ok(())
}
