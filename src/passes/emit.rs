//! Emission (pass 6): walks the graph set and produces an output syntax
//! tree — the event-pointer table initialization plus one top-level
//! function per graph.
//!
//! Local-to-global assignment rewriting runs as a pre-pass over the whole
//! graph set before any function body is emitted, since a local assigned in
//! one graph may be read in a continuation graph that does not share its
//! lexical scope.

use std::collections::{HashMap, HashSet};

use crate::config::Options;
use crate::error::Error;
use crate::ir::graph_set::GraphId;
use crate::ir::node::{NodeId, NodeKind};
use crate::ir::GraphSet;
use crate::output::ast::{FunctionDecl, OutIfArm, OutStmt, Program, TableAssign};
use crate::surface::ast::{Expr, Stmt};

pub fn emit(gs: &GraphSet, options: &Options) -> Result<Program, Error> {
    let locals = collect_locals(gs);
    let async_links = collect_async_links(gs)?;

    let event_ptr_init = async_links
        .iter()
        .map(|(link_id, target_fn)| TableAssign {
            table: options.event_ptr_table.clone(),
            key: link_id.clone(),
            value: Expr::Name(target_fn.clone()),
        })
        .collect();
    let async_link_targets: HashMap<String, String> = async_links.into_iter().collect();

    let mut functions = Vec::with_capacity(gs.len());
    for gi in 0..gs.len() {
        functions.push(emit_function(gs, GraphId(gi as u32), &locals, &async_link_targets, options)?);
    }

    Ok(Program { event_ptr_init, functions })
}

/// Every name ever introduced by a `LocalAssign` or `AsyncAssign`, across
/// the whole graph set — the set of identifiers that must be rewritten to
/// `locals_table.name` wherever they are read.
fn collect_locals(gs: &GraphSet) -> HashSet<String> {
    let mut locals = HashSet::new();
    for graph in gs.iter() {
        for i in 0..graph.len() {
            let node = graph.node(NodeId(i as u32));
            if matches!(node.kind, NodeKind::LocalAssign | NodeKind::AsyncAssign) {
                locals.insert(node.name.clone());
            }
        }
    }
    locals
}

/// `(link identifier, target graph's function name)` for every asynchronous
/// `Link` in the graph set, visited graph by graph in creation order and
/// preorder within each graph — deterministic for a fixed seed.
fn collect_async_links(gs: &GraphSet) -> Result<Vec<(String, String)>, Error> {
    let mut out = Vec::new();
    for gi in 0..gs.len() {
        let graph_id = GraphId(gi as u32);
        let graph = gs.get(graph_id);
        let root = graph.root.expect("graph set only ever holds populated graphs");
        for node in graph.preorder(root) {
            if let Some((target, true, link_id)) = graph.node(node).kind.as_link() {
                out.push((link_id.to_string(), graph_function_name(gs, target)?));
            }
        }
    }
    Ok(out)
}

fn graph_function_name(gs: &GraphSet, g: GraphId) -> Result<String, Error> {
    let root = gs.get(g).root.expect("graph set only ever holds populated graphs");
    match &gs.get(g).node(root).kind {
        NodeKind::Function => {
            let stmt = gs
                .get(g)
                .node(root)
                .syntax
                .as_ref()
                .and_then(|s| s.as_stmt())
                .ok_or_else(|| Error::malformed("Function root missing its retained syntax"))?;
            match stmt {
                Stmt::Function { name, .. } => Ok(name.clone()),
                _ => Err(Error::malformed("Function root's syntax is not a Function statement")),
            }
        }
        NodeKind::FunctionStub { function_name } => Ok(function_name.to_string()),
        other => Err(Error::invariant(format!("graph root is {other:?}, expected Function or FunctionStub"))),
    }
}

fn emit_function(
    gs: &GraphSet,
    g: GraphId,
    locals: &HashSet<String>,
    async_link_targets: &HashMap<String, String>,
    options: &Options,
) -> Result<FunctionDecl, Error> {
    let root = gs.get(g).root.expect("graph set only ever holds populated graphs");
    let (name, params) = match &gs.get(g).node(root).kind {
        NodeKind::Function => {
            let stmt = gs
                .get(g)
                .node(root)
                .syntax
                .as_ref()
                .and_then(|s| s.as_stmt())
                .ok_or_else(|| Error::malformed("Function root missing its retained syntax"))?;
            match stmt {
                Stmt::Function { name, params, .. } => (name.clone(), params.clone()),
                _ => return Err(Error::malformed("Function root's syntax is not a Function statement")),
            }
        }
        NodeKind::FunctionStub { function_name } => (function_name.to_string(), Vec::new()),
        other => return Err(Error::invariant(format!("graph root is {other:?}, expected Function or FunctionStub"))),
    };

    let children = gs.get(g).node(root).children.clone();
    let mut body = Vec::new();
    emit_block(gs, g, &children, locals, async_link_targets, options, &mut body)?;
    Ok(FunctionDecl { name, params, body })
}

fn emit_block(
    gs: &GraphSet,
    g: GraphId,
    children: &[NodeId],
    locals: &HashSet<String>,
    async_link_targets: &HashMap<String, String>,
    options: &Options,
    out: &mut Vec<OutStmt>,
) -> Result<(), Error> {
    for &child in children {
        emit_one(gs, g, child, locals, async_link_targets, options, out)?;
    }
    Ok(())
}

fn emit_one(
    gs: &GraphSet,
    g: GraphId,
    node_id: NodeId,
    locals: &HashSet<String>,
    async_link_targets: &HashMap<String, String>,
    options: &Options,
    out: &mut Vec<OutStmt>,
) -> Result<(), Error> {
    let node = gs.get(g).node(node_id);
    let rewrite = |e: &Expr| rewrite_expr(e, locals, &options.locals_table);

    match &node.kind {
        NodeKind::LocalAssign => {
            let value = node.syntax.as_ref().and_then(|s| s.as_expr()).map(rewrite).unwrap_or(Expr::Nil);
            out.push(OutStmt::GlobalAssign { table: options.locals_table.clone(), name: node.name.clone(), value });
        }
        NodeKind::AsyncAssign => {
            let value = node.syntax.as_ref().and_then(|s| s.as_expr()).map(rewrite).unwrap_or(Expr::Nil);
            out.push(OutStmt::GlobalAssign { table: options.locals_table.clone(), name: node.name.clone(), value });
            // The async Link under this node is elided at the statement
            // level; do not recurse into it.
        }
        NodeKind::GlobalAssign => {
            let value = node.syntax.as_ref().and_then(|s| s.as_expr()).map(rewrite).unwrap_or(Expr::Nil);
            out.push(OutStmt::PassThrough(Stmt::Assign { targets: vec![node.name.clone()], values: vec![value] }));
        }
        NodeKind::Semicolon => out.push(OutStmt::PassThrough(Stmt::SemiColon)),
        NodeKind::Break => out.push(OutStmt::PassThrough(Stmt::Break)),
        NodeKind::Return => {
            let stmt = node.syntax.as_ref().and_then(|s| s.as_stmt());
            let values = match stmt {
                Some(Stmt::Return(values)) => values.iter().map(rewrite).collect(),
                _ => return Err(Error::malformed("Return node missing its retained syntax")),
            };
            out.push(OutStmt::PassThrough(Stmt::Return(values)));
        }
        NodeKind::Call => {
            let expr = node
                .syntax
                .as_ref()
                .and_then(|s| s.as_expr())
                .ok_or_else(|| Error::malformed("Call node missing its retained syntax"))?;
            out.push(OutStmt::PassThrough(Stmt::Call(rewrite(expr))));
        }
        NodeKind::AsyncCall => {
            let expr = node
                .syntax
                .as_ref()
                .and_then(|s| s.as_expr())
                .ok_or_else(|| Error::malformed("AsyncCall node missing its retained syntax"))?;
            out.push(OutStmt::PassThrough(Stmt::Call(rewrite(expr))));
            // Same elision as AsyncAssign above.
        }
        NodeKind::Do => {
            let block = *node
                .children
                .first()
                .ok_or_else(|| Error::invariant("Do node has no generated Block child"))?;
            let grandchildren = gs.get(g).node(block).children.clone();
            emit_block(gs, g, &grandchildren, locals, async_link_targets, options, out)?;
        }
        NodeKind::While => {
            let stmt = node.syntax.as_ref().and_then(|s| s.as_stmt());
            let Some(Stmt::While { cond, .. }) = stmt else {
                return Err(Error::malformed("While node missing its retained syntax"));
            };
            let cond = rewrite(cond);
            let block = *node
                .children
                .first()
                .ok_or_else(|| Error::invariant("While node has no generated Block child"))?;
            let mut body = Vec::new();
            emit_block(gs, g, &gs.get(g).node(block).children.clone(), locals, async_link_targets, options, &mut body)?;
            out.push(OutStmt::While { cond, body });
        }
        NodeKind::Repeat => {
            let stmt = node.syntax.as_ref().and_then(|s| s.as_stmt());
            let Some(Stmt::Repeat { cond, .. }) = stmt else {
                return Err(Error::malformed("Repeat node missing its retained syntax"));
            };
            let cond = rewrite(cond);
            let block = *node
                .children
                .first()
                .ok_or_else(|| Error::invariant("Repeat node has no generated Block child"))?;
            let mut body = Vec::new();
            emit_block(gs, g, &gs.get(g).node(block).children.clone(), locals, async_link_targets, options, &mut body)?;
            out.push(OutStmt::Repeat { body, cond });
        }
        NodeKind::ForNum => {
            let stmt = node.syntax.as_ref().and_then(|s| s.as_stmt());
            let Some(Stmt::ForNum { var, start, stop, step, .. }) = stmt else {
                return Err(Error::malformed("ForNum node missing its retained syntax"));
            };
            let (var, start, stop, step) = (var.clone(), rewrite(start), rewrite(stop), step.as_ref().map(rewrite));
            let block = *node
                .children
                .first()
                .ok_or_else(|| Error::invariant("ForNum node has no generated Block child"))?;
            let mut body = Vec::new();
            emit_block(gs, g, &gs.get(g).node(block).children.clone(), locals, async_link_targets, options, &mut body)?;
            out.push(OutStmt::ForNum { var, start, stop, step, body });
        }
        NodeKind::ForIn => {
            let stmt = node.syntax.as_ref().and_then(|s| s.as_stmt());
            let Some(Stmt::ForIn { vars, exprs, .. }) = stmt else {
                return Err(Error::malformed("ForIn node missing its retained syntax"));
            };
            let (vars, exprs) = (vars.clone(), exprs.iter().map(rewrite).collect());
            let block = *node
                .children
                .first()
                .ok_or_else(|| Error::invariant("ForIn node has no generated Block child"))?;
            let mut body = Vec::new();
            emit_block(gs, g, &gs.get(g).node(block).children.clone(), locals, async_link_targets, options, &mut body)?;
            out.push(OutStmt::ForIn { vars, exprs, body });
        }
        NodeKind::Branch { .. } => {
            let block = *node
                .children
                .first()
                .ok_or_else(|| Error::invariant("Branch node has no generated Block child"))?;
            let mut arms = Vec::new();
            for &arm_node in &gs.get(g).node(block).children.clone() {
                let arm = gs.get(g).node(arm_node);
                match &arm.kind {
                    NodeKind::Conditional { .. } => {
                        let cond = arm
                            .syntax
                            .as_ref()
                            .and_then(|s| s.as_arm())
                            .ok_or_else(|| Error::malformed("Conditional node missing its retained syntax"))?
                            .cond
                            .as_ref()
                            .map(rewrite);
                        let mut body = Vec::new();
                        emit_block(gs, g, &arm.children.clone(), locals, async_link_targets, options, &mut body)?;
                        arms.push(OutIfArm { cond, body });
                    }
                    NodeKind::ElseStub => {
                        // A synthesized else stub is itself the leaf pass 3
                        // attaches the tail continuation's `Link` to; emit
                        // that link as the arm's body instead of leaving it
                        // unreachable.
                        let mut body = Vec::new();
                        emit_block(gs, g, &arm.children.clone(), locals, async_link_targets, options, &mut body)?;
                        arms.push(OutIfArm { cond: None, body });
                    }
                    other => {
                        return Err(Error::invariant(format!(
                            "Branch's Block child contains {other:?}, expected Conditional or ElseStub"
                        )));
                    }
                }
            }
            out.push(OutStmt::If { arms });
        }
        NodeKind::Link { target, is_async: false, .. } => {
            out.push(OutStmt::Call(graph_function_name(gs, *target)?));
        }
        NodeKind::SetEventPointer { link_id } => {
            let target_function = async_link_targets
                .get(link_id.as_ref())
                .cloned()
                .ok_or_else(|| Error::invariant(format!("no async link registered for {link_id}")))?;
            out.push(OutStmt::SetEventPointer {
                table: options.event_ptr_table.clone(),
                link_id: link_id.to_string(),
                target_function,
            });
            let inner = node.children.clone();
            emit_block(gs, g, &inner, locals, async_link_targets, options, out)?;
        }
        NodeKind::Label | NodeKind::Goto => {
            return Err(Error::unsupported("label/goto statements are not supported by any pass"));
        }
        other => {
            return Err(Error::invariant(format!("unexpected node kind {other:?} as a statement")));
        }
    }

    // A plain pass-through statement that happened to be the leaf of a
    // Branch's arm may carry a trailing synchronous `Link` as its sole
    // child: emit it as the statement that follows. Control
    // nodes (Branch/loops/Do) and async nodes already account for their own
    // children above and must not be visited again here.
    if trails_into_sync_link(&node.kind) && !node.children.is_empty() {
        emit_block(gs, g, &node.children.clone(), locals, async_link_targets, options, out)?;
    }
    Ok(())
}

fn trails_into_sync_link(kind: &NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::LocalAssign
            | NodeKind::GlobalAssign
            | NodeKind::Semicolon
            | NodeKind::Break
            | NodeKind::Return
            | NodeKind::Call
            | NodeKind::Label
    )
}

/// Rewrites every identifier reference bound to a known local variable into
/// a `locals_table.name` access.
fn rewrite_expr(expr: &Expr, locals: &HashSet<String>, locals_table: &str) -> Expr {
    match expr {
        Expr::Name(name) if locals.contains(name) => Expr::Name(format!("{locals_table}.{name}")),
        Expr::Name(_) | Expr::Number(_) | Expr::Str(_) | Expr::Bool(_) | Expr::Nil => expr.clone(),
        Expr::BinOp { op, lhs, rhs } => Expr::BinOp {
            op: op.clone(),
            lhs: Box::new(rewrite_expr(lhs, locals, locals_table)),
            rhs: Box::new(rewrite_expr(rhs, locals, locals_table)),
        },
        Expr::Call { func, args } => Expr::Call {
            func: Box::new(rewrite_expr(func, locals, locals_table)),
            args: args.iter().map(|a| rewrite_expr(a, locals, locals_table)).collect(),
        },
        Expr::Invoke { object, method, args } => Expr::Invoke {
            object: Box::new(rewrite_expr(object, locals, locals_table)),
            method: method.clone(),
            args: args.iter().map(|a| rewrite_expr(a, locals, locals_table)).collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::graph_set::GraphSet;
    use crate::ir::node::IrNode;
    use crate::surface::ast::SyntaxRef;

    fn opts() -> Options {
        Options::default()
    }

    #[test]
    fn emits_one_function_for_a_single_graph() {
        let mut gs = GraphSet::new();
        let g = gs.new_graph("f".into());
        let root = gs.get_mut(g).add_node(IrNode::new(
            NodeKind::Function,
            Some(SyntaxRef::stmt(Stmt::Function { name: "f".into(), params: vec![], body: vec![] })),
        ));
        gs.get_mut(g).cursor = Some(root);
        gs.get_mut(g).add_node(IrNode::new(NodeKind::Break, None));

        let program = emit(&gs, &opts()).unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[0].name, "f");
        assert!(matches!(program.functions[0].body[0], OutStmt::PassThrough(Stmt::Break)));
    }

    #[test]
    fn local_assign_is_rewritten_to_locals_table() {
        let mut gs = GraphSet::new();
        let g = gs.new_graph("f".into());
        let root = gs.get_mut(g).add_node(IrNode::new(
            NodeKind::Function,
            Some(SyntaxRef::stmt(Stmt::Function { name: "f".into(), params: vec![], body: vec![] })),
        ));
        gs.get_mut(g).cursor = Some(root);
        let mut assign = IrNode::new(NodeKind::LocalAssign, Some(SyntaxRef::expr(Expr::Number(1.0))));
        assign.name = "v".into();
        gs.get_mut(g).add_node(assign);
        gs.get_mut(g).cursor = Some(root);
        let call = IrNode::new(NodeKind::Call, Some(SyntaxRef::expr(Expr::Call {
            func: Box::new(Expr::Name("bar".into())),
            args: vec![Expr::Name("v".into())],
        })));
        gs.get_mut(g).add_node(call);

        let program = emit(&gs, &opts()).unwrap();
        let OutStmt::GlobalAssign { table, name, .. } = &program.functions[0].body[0] else {
            panic!("expected GlobalAssign")
        };
        assert_eq!(table, "global.locals");
        assert_eq!(name, "v");

        let OutStmt::PassThrough(Stmt::Call(Expr::Call { args, .. })) = &program.functions[0].body[1] else {
            panic!("expected Call")
        };
        assert!(matches!(&args[0], Expr::Name(n) if n == "global.locals.v"));
    }
}
