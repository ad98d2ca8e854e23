//! Branch linearization (pass 3): hoists the statements that follow a
//! `Branch` into a fresh continuation graph, then links every leaf of the
//! branch's body to that continuation.

use crate::error::Error;
use crate::ident::IdentMint;
use crate::ir::graph_set::GraphId;
use crate::ir::node::{IrNode, NodeId, NodeKind};
use crate::ir::GraphSet;

/// Runs pass 3 to a fixed point across the whole graph set. New graphs
/// created while linearizing one graph (its hoisted tail may itself contain
/// un-linearized branches) are appended to `gs` and visited in turn.
pub fn linearize(gs: &mut GraphSet, mint: &mut IdentMint) -> Result<(), Error> {
    let mut gi = 0;
    while gi < gs.len() {
        let graph_id = GraphId(gi as u32);
        loop {
            let Some((parent, branch, tail)) = find_branch_with_tail(gs, graph_id) else {
                break;
            };
            linearize_one(gs, mint, graph_id, parent, branch, &tail)?;
            // Structural mutation invalidates the prior traversal; restart.
        }
        gi += 1;
    }
    Ok(())
}

/// Finds the first (in postorder) node `P` with a `Branch` child `B`
/// followed by a non-empty tail, so that nested branches — whose own tails
/// live deeper in the tree — are linearized before their enclosing branch.
fn find_branch_with_tail(gs: &GraphSet, graph_id: GraphId) -> Option<(NodeId, NodeId, Vec<NodeId>)> {
    let graph = gs.get(graph_id);
    let root = graph.root?;
    for p in graph.postorder(root) {
        let children = &graph.node(p).children;
        let Some(branch_pos) = children.iter().position(|&c| matches!(graph.node(c).kind, NodeKind::Branch { .. })) else {
            continue;
        };
        let tail = children[branch_pos + 1..].to_vec();
        if !tail.is_empty() {
            return Some((p, children[branch_pos], tail));
        }
    }
    None
}

fn linearize_one(
    gs: &mut GraphSet,
    mint: &mut IdentMint,
    graph_id: GraphId,
    _parent: NodeId,
    branch: NodeId,
    tail: &[NodeId],
) -> Result<(), Error> {
    let stub_name = mint.fresh_function_name();
    let continuation = gs.new_graph(stub_name.clone());
    gs.get_mut(continuation)
        .add_node(IrNode::new(NodeKind::FunctionStub { function_name: stub_name }, None));
    let stub_root = gs
        .get(continuation)
        .root
        .expect("just added the stub root above");

    for &t in tail {
        gs.get_mut(continuation).cursor = Some(stub_root);
        gs.copy_subtree(graph_id, t, continuation);
    }

    let leaves = gs.cross_graph_leaves(graph_id, branch);
    for (leaf_graph, leaf_node) in leaves {
        let link_id = mint.fresh_link_name();
        gs.get_mut(leaf_graph).cursor = Some(leaf_node);
        gs.get_mut(leaf_graph).add_node(IrNode::new(
            NodeKind::Link { target: continuation, is_async: false, link_id },
            None,
        ));
    }

    for &t in tail {
        gs.get_mut(graph_id).remove_node(t);
    }

    Ok(())
}
