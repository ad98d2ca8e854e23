//! Lowering (pass 1): walks the surface syntax tree and produces the initial
//! IR graph.
//!
//! [`lower_block`] is also the routine the expander (pass 2, [`crate::passes::expand`])
//! calls to recursively lower a control structure's nested body — pass 1 is
//! simply its first, outermost invocation, over the entry function's body.

use crate::config::Options;
use crate::error::Error;
use crate::ir::graph::IrGraph;
use crate::ir::graph_set::GraphId;
use crate::ir::node::{IrNode, NodeId, NodeKind};
use crate::ir::GraphSet;
use crate::surface::ast::{Chunk, Expr, Stmt, SyntaxRef};

/// Lowers a whole program: locates its single top-level function, creates
/// its graph, and lowers its body. Returns the id of that graph.
pub fn lower_program(chunk: &Chunk, gs: &mut GraphSet, options: &Options) -> Result<GraphId, Error> {
    let mut functions = chunk.body.iter().filter(|s| matches!(s, Stmt::Function { .. }));
    let first = functions.next().ok_or_else(|| {
        Error::unsupported("input has no top-level function definition")
    })?;
    if functions.next().is_some() {
        return Err(Error::unsupported(
            "more than one top-level function definition",
        ));
    }
    if chunk.body.len() != 1 {
        return Err(Error::unsupported(
            "top-level chunk must contain exactly the one function definition",
        ));
    }

    let Stmt::Function { name, body, .. } = first else {
        unreachable!("filtered to Stmt::Function above");
    };

    let graph_id = gs.new_graph(name.clone().into_boxed_str());
    let graph = gs.get_mut(graph_id);
    let root = graph.add_node(IrNode::new(NodeKind::Function, Some(SyntaxRef::stmt(first.clone()))));
    lower_block(body, graph, root, options)?;
    Ok(graph_id)
}

/// Lowers `body` as the ordered children of `parent`, appending exactly one
/// IR node per recognized statement. Does not recurse into nested
/// control-structure bodies — that is the expander's job (pass 2).
pub fn lower_block(body: &[Stmt], graph: &mut IrGraph, parent: NodeId, options: &Options) -> Result<(), Error> {
    for stmt in body {
        graph.cursor = Some(parent);
        lower_stmt(stmt, graph, options)?;
    }
    Ok(())
}

fn lower_stmt(stmt: &Stmt, graph: &mut IrGraph, options: &Options) -> Result<(), Error> {
    match stmt {
        Stmt::Function { .. } => {
            return Err(Error::unsupported("nested function definitions are not supported"));
        }
        Stmt::LocalFunction { .. } => {
            return Err(Error::unsupported("local function declarations are not supported"));
        }
        Stmt::Method { .. } => {
            return Err(Error::unsupported("method definitions are not supported"));
        }
        Stmt::Invoke { .. } => {
            return Err(Error::unsupported("object-method invocations are not supported"));
        }
        Stmt::Call(expr) => {
            if let Some(inner) = await_payload(expr, options) {
                graph.add_node(IrNode::new(NodeKind::AsyncCall, Some(SyntaxRef::expr(inner.clone()))));
            } else {
                graph.add_node(IrNode::new(NodeKind::Call, Some(SyntaxRef::expr(expr.clone()))));
            }
        }
        Stmt::LocalAssign { names, values } => {
            let name = names.first().cloned().ok_or_else(|| {
                Error::malformed("LocalAssign with no target name")
            })?;
            let value = values.first().cloned().unwrap_or(Expr::Nil);
            let mut node = if let Some(inner) = await_payload(&value, options) {
                IrNode::new(NodeKind::AsyncAssign, Some(SyntaxRef::expr(inner.clone())))
            } else {
                IrNode::new(NodeKind::LocalAssign, Some(SyntaxRef::expr(value)))
            };
            node.name = name;
            graph.add_node(node);
        }
        Stmt::Assign { targets, values } => {
            let name = targets.first().cloned().ok_or_else(|| {
                Error::malformed("Assign with no target name")
            })?;
            let value = values.first().cloned().unwrap_or(Expr::Nil);
            let mut node = IrNode::new(NodeKind::GlobalAssign, Some(SyntaxRef::expr(value)));
            node.name = name;
            graph.add_node(node);
        }
        Stmt::Return(_) => {
            graph.add_node(IrNode::new(NodeKind::Return, Some(SyntaxRef::stmt(stmt.clone()))));
        }
        Stmt::Break => {
            graph.add_node(IrNode::new(NodeKind::Break, None));
        }
        Stmt::SemiColon => {
            graph.add_node(IrNode::new(NodeKind::Semicolon, None));
        }
        Stmt::If { .. } => {
            graph.add_node(IrNode::new(NodeKind::Branch { has_source_else: false }, Some(SyntaxRef::stmt(stmt.clone()))));
        }
        Stmt::While { .. } => {
            graph.add_node(IrNode::new(NodeKind::While, Some(SyntaxRef::stmt(stmt.clone()))));
        }
        Stmt::Repeat { .. } => {
            graph.add_node(IrNode::new(NodeKind::Repeat, Some(SyntaxRef::stmt(stmt.clone()))));
        }
        Stmt::ForNum { .. } => {
            graph.add_node(IrNode::new(NodeKind::ForNum, Some(SyntaxRef::stmt(stmt.clone()))));
        }
        Stmt::ForIn { .. } => {
            graph.add_node(IrNode::new(NodeKind::ForIn, Some(SyntaxRef::stmt(stmt.clone()))));
        }
        Stmt::Do(_) => {
            graph.add_node(IrNode::new(NodeKind::Do, Some(SyntaxRef::stmt(stmt.clone()))));
        }
        Stmt::Label(_) => {
            graph.add_node(IrNode::new(NodeKind::Label, Some(SyntaxRef::stmt(stmt.clone()))));
        }
        Stmt::Goto(_) => {
            graph.add_node(IrNode::new(NodeKind::Goto, Some(SyntaxRef::stmt(stmt.clone()))));
        }
    }
    Ok(())
}

/// If `expr` is a call to the distinguished `await` identifier, returns its
/// single argument — the inner call to run.
pub fn await_payload<'a>(expr: &'a Expr, options: &Options) -> Option<&'a Expr> {
    match expr {
        Expr::Call { func, args } if args.len() == 1 => match func.as_ref() {
            Expr::Name(name) if name == &options.await_name => Some(&args[0]),
            _ => None,
        },
        _ => None,
    }
}
