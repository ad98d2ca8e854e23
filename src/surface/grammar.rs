//! A toy pest grammar for the surface language, just rich enough to build
//! [`crate::surface::ast::Chunk`] values for the CLI and end-to-end tests.
//! The real surface-language parser is out of scope here — callers with a
//! real frontend construct [`crate::surface::ast::Chunk`] directly.

use pest::Parser;
use pest::error::Error;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::surface::ast::{Block, Expr, IfArm, Stmt};

#[derive(Parser)]
#[grammar = "../grammar/surface.pest"]
struct SurfaceParser;

#[allow(clippy::result_large_err)]
pub fn parse(input: impl AsRef<str>) -> Result<Block, Error<Rule>> {
    let chunk = SurfaceParser::parse(Rule::Chunk, input.as_ref())?
        .next()
        .expect("Chunk rule always produces one pair");

    let block = chunk
        .into_inner()
        .find(|p| p.as_rule() == Rule::Block)
        .expect("Chunk always contains a Block");

    Ok(parse_block(block))
}

fn parse_block(pair: Pair<Rule>) -> Block {
    pair.into_inner().map(parse_stmt).collect()
}

fn parse_stmt(pair: Pair<Rule>) -> Stmt {
    let inner = pair.into_inner().next().expect("Stmt always wraps one alternative");
    match inner.as_rule() {
        Rule::FunctionStmt => {
            let mut p = inner.into_inner();
            let name = p.next().unwrap().as_str().to_string();
            let params = parse_params(p.next().unwrap());
            let body = parse_block(p.next().unwrap());
            Stmt::Function { name, params, body }
        }
        Rule::LocalFunctionStmt => {
            let mut p = inner.into_inner();
            let name = p.next().unwrap().as_str().to_string();
            let params = parse_params(p.next().unwrap());
            let body = parse_block(p.next().unwrap());
            Stmt::LocalFunction { name, params, body }
        }
        Rule::MethodStmt => {
            let mut p = inner.into_inner();
            let object = p.next().unwrap().as_str().to_string();
            let method = p.next().unwrap().as_str().to_string();
            let params = parse_params(p.next().unwrap());
            let body = parse_block(p.next().unwrap());
            Stmt::Method { object, method, params, body }
        }
        Rule::InvokeStmt => {
            let mut p = inner.into_inner();
            let object = Expr::Name(p.next().unwrap().as_str().to_string());
            let method = p.next().unwrap().as_str().to_string();
            let args = p.next().map(|a| a.into_inner().next().map(parse_expr_list).unwrap_or_default()).unwrap_or_default();
            Stmt::Invoke { object, method, args }
        }
        Rule::LocalAssignStmt => {
            let mut p = inner.into_inner();
            let names = parse_name_list(p.next().unwrap());
            let values = p.next().map(parse_expr_list).unwrap_or_default();
            Stmt::LocalAssign { names, values }
        }
        Rule::AssignStmt => {
            let mut p = inner.into_inner();
            let targets = parse_name_list(p.next().unwrap());
            let values = parse_expr_list(p.next().unwrap());
            Stmt::Assign { targets, values }
        }
        Rule::ReturnStmt => {
            let values = inner.into_inner().next().map(parse_expr_list).unwrap_or_default();
            Stmt::Return(values)
        }
        Rule::BreakStmt => Stmt::Break,
        Rule::SemiColonStmt => Stmt::SemiColon,
        Rule::DoStmt => Stmt::Do(parse_block(inner.into_inner().next().unwrap())),
        Rule::WhileStmt => {
            let mut p = inner.into_inner();
            let cond = parse_expr(p.next().unwrap());
            let body = parse_block(p.next().unwrap());
            Stmt::While { cond, body }
        }
        Rule::RepeatStmt => {
            let mut p = inner.into_inner();
            let body = parse_block(p.next().unwrap());
            let cond = parse_expr(p.next().unwrap());
            Stmt::Repeat { body, cond }
        }
        Rule::ForNumStmt => {
            let mut p: Vec<_> = inner.into_inner().collect();
            let var = p.remove(0).as_str().to_string();
            let body = parse_block(p.pop().unwrap());
            let step = if p.len() == 3 { Some(parse_expr(p.pop().unwrap())) } else { None };
            let stop = parse_expr(p.pop().unwrap());
            let start = parse_expr(p.pop().unwrap());
            Stmt::ForNum { var, start, stop, step, body }
        }
        Rule::ForInStmt => {
            let mut p = inner.into_inner();
            let vars = parse_name_list(p.next().unwrap());
            let exprs = parse_expr_list(p.next().unwrap());
            let body = parse_block(p.next().unwrap());
            Stmt::ForIn { vars, exprs, body }
        }
        Rule::IfStmt => parse_if(inner),
        Rule::LabelStmt => Stmt::Label(inner.into_inner().next().unwrap().as_str().to_string()),
        Rule::GotoStmt => Stmt::Goto(inner.into_inner().next().unwrap().as_str().to_string()),
        Rule::CallStmt => Stmt::Call(parse_expr(inner.into_inner().next().unwrap())),
        rule => unreachable!("unexpected statement rule {rule:?}"),
    }
}

/// `IfStmt = { "if" ~ IfArm ~ ("elseif" ~ IfArm)* ~ ("else" ~ Block)? ~ "end" }`
/// — the trailing `Block`, if present, is the `else` arm, flagged by
/// `cond: None`.
fn parse_if(pair: Pair<Rule>) -> Stmt {
    let mut arms = Vec::new();
    for child in pair.into_inner() {
        match child.as_rule() {
            Rule::IfArm => {
                let mut p = child.into_inner();
                let cond = Some(parse_expr(p.next().unwrap()));
                let body = parse_block(p.next().unwrap());
                arms.push(IfArm { cond, body });
            }
            Rule::Block => arms.push(IfArm { cond: None, body: parse_block(child) }),
            rule => unreachable!("unexpected if-arm rule {rule:?}"),
        }
    }
    Stmt::If { arms }
}

fn parse_params(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().next().map(parse_name_list).unwrap_or_default()
}

fn parse_name_list(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner().map(|p| p.as_str().to_string()).collect()
}

fn parse_expr_list(pair: Pair<Rule>) -> Vec<Expr> {
    pair.into_inner().map(parse_expr).collect()
}

/// `Expr = { Term ~ (BinOp ~ Term)* }` — left-associative, no precedence
/// climbing: good enough for the toy surface language, never for a real one.
fn parse_expr(pair: Pair<Rule>) -> Expr {
    let mut parts = pair.into_inner();
    let mut acc = parse_term(parts.next().unwrap());
    while let Some(op_pair) = parts.next() {
        let op = op_pair.as_str().to_string();
        let rhs = parse_term(parts.next().expect("BinOp always followed by a Term"));
        acc = Expr::BinOp { op, lhs: Box::new(acc), rhs: Box::new(rhs) };
    }
    acc
}

fn parse_term(pair: Pair<Rule>) -> Expr {
    let inner = pair.into_inner().next().expect("Term always wraps one alternative");
    match inner.as_rule() {
        Rule::CallExpr => {
            let mut p = inner.into_inner();
            let name = p.next().unwrap().as_str().to_string();
            let args = p.next().map(|a| a.into_inner().next().map(parse_expr_list).unwrap_or_default()).unwrap_or_default();
            Expr::Call { func: Box::new(Expr::Name(name)), args }
        }
        Rule::Literal => parse_literal(inner.into_inner().next().unwrap()),
        Rule::Name => Expr::Name(inner.as_str().to_string()),
        rule => unreachable!("unexpected term rule {rule:?}"),
    }
}

fn parse_literal(pair: Pair<Rule>) -> Expr {
    match pair.as_rule() {
        Rule::Number => Expr::Number(pair.as_str().parse().expect("Number rule matches a valid float")),
        Rule::Str => {
            let s = pair.as_str();
            Expr::Str(s[1..s.len() - 1].to_string())
        }
        Rule::True => Expr::Bool(true),
        Rule::False => Expr::Bool(false),
        Rule::Nil => Expr::Nil,
        rule => unreachable!("unexpected literal rule {rule:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_function() {
        let block = parse("function main() end").unwrap();
        assert_eq!(block.len(), 1);
        assert!(matches!(&block[0], Stmt::Function { name, params, body } if name == "main" && params.is_empty() && body.is_empty()));
    }

    #[test]
    fn parses_await_call_assignment() {
        let block = parse("function main() local x = await(call()) end").unwrap();
        let Stmt::Function { body, .. } = &block[0] else { panic!("expected Function") };
        assert_eq!(body.len(), 1);
        assert!(matches!(&body[0], Stmt::LocalAssign { names, .. } if names == &["x"]));
    }

    #[test]
    fn parses_if_elseif_else() {
        let block = parse("function main() if x then elseif y then else end end").unwrap();
        let Stmt::Function { body, .. } = &block[0] else { panic!("expected Function") };
        let Stmt::If { arms } = &body[0] else { panic!("expected If") };
        assert_eq!(arms.len(), 3);
        assert!(arms[0].cond.is_some());
        assert!(arms[1].cond.is_some());
        assert!(arms[2].cond.is_none());
    }

    #[test]
    fn parses_method_invocation_and_definition() {
        let block = parse("function f() obj:method() end").unwrap();
        let Stmt::Function { body, .. } = &block[0] else { panic!("expected Function") };
        assert!(matches!(&body[0], Stmt::Invoke { method, .. } if method == "method"));

        let block = parse("function obj:method() end").unwrap();
        assert!(matches!(&block[0], Stmt::Method { object, method, .. } if object == "obj" && method == "method"));
    }
}
