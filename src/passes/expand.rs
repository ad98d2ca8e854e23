//! Expansion (pass 2): gives every control-structure node a generated
//! `Block` child and recursively lowers its body into that block.

use crate::config::Options;
use crate::error::Error;
use crate::ir::graph::IrGraph;
use crate::ir::node::{IrNode, NodeId, NodeKind};
use crate::passes::lower::lower_block;
use crate::surface::ast::{IfArm, Stmt};

/// Expands every control-structure node reachable from `node`, recursing
/// depth-first so that newly lowered nested bodies are expanded in the same
/// pass.
pub fn expand_node(graph: &mut IrGraph, node: NodeId, options: &Options) -> Result<(), Error> {
    match graph.node(node).kind.clone() {
        NodeKind::Branch { .. } => expand_branch(graph, node, options)?,
        NodeKind::While | NodeKind::Repeat | NodeKind::ForNum | NodeKind::ForIn | NodeKind::Do => {
            expand_block_holder(graph, node, options)?
        }
        _ => {}
    }

    for child in graph.node(node).children.clone() {
        expand_node(graph, child, options)?;
    }
    Ok(())
}

/// Turns the `Branch`'s retained `If` syntax into an ordered run of
/// `Conditional` children under a generated `Block`, then recursively lowers
/// each arm's body under its `Conditional`.
fn expand_branch(graph: &mut IrGraph, branch: NodeId, options: &Options) -> Result<(), Error> {
    let syntax = graph
        .node(branch)
        .syntax
        .clone()
        .ok_or_else(|| Error::malformed("Branch node missing its retained If syntax"))?;
    let Stmt::If { arms } = syntax
        .as_stmt()
        .ok_or_else(|| Error::malformed("Branch node's syntax is not an If statement"))?
    else {
        return Err(Error::malformed("Branch node's syntax is not an If statement"));
    };

    let has_source_else = arms.last().is_some_and(|arm: &IfArm| arm.cond.is_none());
    graph.node_mut(branch).kind = NodeKind::Branch { has_source_else };

    graph.cursor = Some(branch);
    let block = graph.add_node(IrNode::new(NodeKind::Block, None));

    for arm in arms {
        graph.cursor = Some(block);
        let is_else = arm.cond.is_none();
        let conditional = graph.add_node(IrNode::new(
            NodeKind::Conditional { is_else },
            Some(crate::surface::ast::SyntaxRef::arm(arm.clone())),
        ));
        lower_block(&arm.body, graph, conditional, options)?;
    }

    if !has_source_else {
        graph.cursor = Some(block);
        graph.add_node(IrNode::new(NodeKind::ElseStub, None));
    }

    Ok(())
}

/// Loops and `Do` blocks share the same shape: one generated `Block` child
/// housing the recursively-lowered body. `Do` is categorized as pass-through
/// at lowering but still carries a nested body that must be expanded the
/// same way.
fn expand_block_holder(graph: &mut IrGraph, node: NodeId, options: &Options) -> Result<(), Error> {
    let syntax = graph
        .node(node)
        .syntax
        .clone()
        .ok_or_else(|| Error::malformed("loop/Do node missing its retained syntax"))?;
    let stmt = syntax
        .as_stmt()
        .ok_or_else(|| Error::malformed("loop/Do node's syntax is not a statement"))?;

    let body: &[Stmt] = match stmt {
        Stmt::While { body, .. }
        | Stmt::Repeat { body, .. }
        | Stmt::ForNum { body, .. }
        | Stmt::ForIn { body, .. } => body,
        Stmt::Do(body) => body,
        _ => return Err(Error::malformed("loop/Do node's syntax is not a loop or Do statement")),
    };

    graph.cursor = Some(node);
    let block = graph.add_node(IrNode::new(NodeKind::Block, None));
    lower_block(body, graph, block, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::graph_set::GraphId;
    use crate::surface::ast::Expr;

    fn opts() -> Options {
        Options::default()
    }

    #[test]
    fn if_without_else_gets_synthesized_else_stub() {
        let mut graph = IrGraph::new(GraphId(0), "g".into());
        let root = graph.add_node(IrNode::new(NodeKind::Function, None));
        let if_stmt = Stmt::If {
            arms: vec![IfArm { cond: Some(Expr::Bool(true)), body: vec![Stmt::Break] }],
        };
        graph.cursor = Some(root);
        let branch = graph.add_node(IrNode::new(
            NodeKind::Branch { has_source_else: false },
            Some(crate::surface::ast::SyntaxRef::stmt(if_stmt)),
        ));

        expand_node(&mut graph, branch, &opts()).unwrap();

        let block = graph.node(branch).children[0];
        let arm_kinds: Vec<_> = graph.node(block).children.iter().map(|&c| graph.node(c).kind.clone()).collect();
        assert!(matches!(arm_kinds[0], NodeKind::Conditional { is_else: false }));
        assert!(matches!(arm_kinds[1], NodeKind::ElseStub));
    }

    #[test]
    fn if_with_else_does_not_synthesize_extra_arm() {
        let mut graph = IrGraph::new(GraphId(0), "g".into());
        let root = graph.add_node(IrNode::new(NodeKind::Function, None));
        let if_stmt = Stmt::If {
            arms: vec![
                IfArm { cond: Some(Expr::Bool(true)), body: vec![] },
                IfArm { cond: None, body: vec![] },
            ],
        };
        graph.cursor = Some(root);
        let branch = graph.add_node(IrNode::new(
            NodeKind::Branch { has_source_else: false },
            Some(crate::surface::ast::SyntaxRef::stmt(if_stmt)),
        ));

        expand_node(&mut graph, branch, &opts()).unwrap();

        let block = graph.node(branch).children[0];
        assert_eq!(graph.node(block).children.len(), 2);
        assert!(matches!(graph.node(branch).kind, NodeKind::Branch { has_source_else: true }));
    }
}
