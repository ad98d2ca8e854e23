//! The emitted syntax tree's shape: top-level assignment statements followed
//! by one top-level function declaration per graph. No in-band diagnostics.

use crate::surface::ast::Expr;

/// A compiled program: the event-pointer table initialization followed by
/// one function declaration per reachable graph, in emission order.
#[derive(Debug, Clone)]
pub struct Program {
    pub event_ptr_init: Vec<TableAssign>,
    pub functions: Vec<FunctionDecl>,
}

/// `T[key] <- value`.
#[derive(Debug, Clone)]
pub struct TableAssign {
    pub table: String,
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<OutStmt>,
}

/// The statement shapes produced by the emitter. Every pass-through variant
/// carries its original syntax unchanged; the rest are synthesized.
#[derive(Debug, Clone)]
pub enum OutStmt {
    /// An original syntax-tree statement, passed through unchanged except
    /// that local-variable references within it have already been rewritten
    /// to global-table accesses by name resolution.
    PassThrough(crate::surface::ast::Stmt),
    /// A `LocalAssign` rewritten into `locals_table.x <- value`.
    GlobalAssign { table: String, name: String, value: Expr },
    SetEventPointer { table: String, link_id: String, target_function: String },
    /// A synchronous `Link`: a direct call to the target graph's function.
    Call(String),
    /// `Branch` -> `if/elseif/else`.
    If { arms: Vec<OutIfArm> },
    While { cond: Expr, body: Vec<OutStmt> },
    Repeat { body: Vec<OutStmt>, cond: Expr },
    ForNum { var: String, start: Expr, stop: Expr, step: Option<Expr>, body: Vec<OutStmt> },
    ForIn { vars: Vec<String>, exprs: Vec<Expr>, body: Vec<OutStmt> },
}

#[derive(Debug, Clone)]
pub struct OutIfArm {
    pub cond: Option<Expr>,
    pub body: Vec<OutStmt>,
}
