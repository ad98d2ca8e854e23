//! Continuation-pointer insertion (pass 5): before every asynchronous
//! `Link`, inserts a `SetEventPointer` node naming the continuation the host
//! must invoke.

use std::collections::HashSet;

use crate::error::Error;
use crate::ir::graph_set::GraphId;
use crate::ir::node::{IrNode, NodeId, NodeKind};
use crate::ir::GraphSet;

/// Runs pass 5 across every graph in the set. Must run after pass 4's
/// splitting and the acyclicity check — every `Link` the pipeline will ever
/// produce must already exist.
pub fn insert_pointers(gs: &mut GraphSet) -> Result<(), Error> {
    let mut done: HashSet<(GraphId, NodeId)> = HashSet::new();

    for gi in 0..gs.len() {
        let graph_id = GraphId(gi as u32);
        loop {
            let Some(link_node) = next_async_link(gs, graph_id, &done) else {
                break;
            };
            done.insert((graph_id, link_node));
            insert_one(gs, graph_id, link_node)?;
            // Restart the preorder traversal; `done` keeps already-handled
            // links from being reprocessed.
        }
    }
    Ok(())
}

fn next_async_link(gs: &GraphSet, graph_id: GraphId, done: &HashSet<(GraphId, NodeId)>) -> Option<NodeId> {
    let graph = gs.get(graph_id);
    let root = graph.root?;
    graph.preorder(root).into_iter().find(|&n| {
        !done.contains(&(graph_id, n)) && matches!(graph.node(n).kind.as_link(), Some((_, true, _)))
    })
}

fn insert_one(gs: &mut GraphSet, graph_id: GraphId, link_node: NodeId) -> Result<(), Error> {
    let node = gs.get(graph_id).node(link_node);
    let link_id: Box<str> = node
        .kind
        .as_link()
        .expect("next_async_link only returns Link nodes")
        .2
        .into();
    let async_node = node
        .parent
        .ok_or_else(|| Error::invariant("async Link has no parent"))?;
    let grandparent = gs
        .get(graph_id)
        .node(async_node)
        .parent
        .ok_or_else(|| Error::invariant("async node has no parent to insert a SetEventPointer before"))?;

    gs.get_mut(graph_id).insert_between(
        grandparent,
        async_node,
        IrNode::new(NodeKind::SetEventPointer { link_id }, None),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_set_event_pointer_immediately_before_async_node() {
        let mut gs = GraphSet::new();
        let g = gs.new_graph("f".into());
        let target = gs.new_graph("cont".into());
        gs.get_mut(target)
            .add_node(IrNode::new(NodeKind::FunctionStub { function_name: "cont".into() }, None));

        let root = gs.get_mut(g).add_node(IrNode::new(NodeKind::Function, None));
        gs.get_mut(g).cursor = Some(root);
        let call = gs.get_mut(g).add_node(IrNode::new(NodeKind::AsyncCall, None));
        gs.get_mut(g).cursor = Some(call);
        gs.get_mut(g).add_node(IrNode::new(
            NodeKind::Link { target, is_async: true, link_id: "link_x".into() },
            None,
        ));

        insert_pointers(&mut gs).unwrap();

        let set_ptr = gs.get(g).node(root).children[0];
        assert!(matches!(gs.get(g).node(set_ptr).kind, NodeKind::SetEventPointer { ref link_id } if &**link_id == "link_x"));
        assert_eq!(gs.get(g).node(set_ptr).children, vec![call]);
    }
}
