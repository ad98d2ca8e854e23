//! A minimal Display-based unparser for [`crate::output::ast::Program`].
//! A stand-in for the real surface-language unparser, which is out of scope
//! here — good enough to eyeball `compile`'s output from the CLI or a test
//! assertion.

use std::fmt;

use crate::output::ast::{FunctionDecl, OutIfArm, OutStmt, Program, TableAssign};
use crate::surface::ast::{Expr, Stmt};

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for assign in &self.event_ptr_init {
            writeln!(f, "{assign}")?;
        }
        if !self.event_ptr_init.is_empty() {
            writeln!(f)?;
        }
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{func}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TableAssign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} = {}", self.table, self.key, render_expr(&self.value))
    }
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function {}({})", self.name, self.params.join(", "))?;
        for stmt in &self.body {
            format_stmt(f, stmt, 1)?;
        }
        write!(f, "end")
    }
}

fn format_stmt(f: &mut fmt::Formatter<'_>, stmt: &OutStmt, indent: usize) -> fmt::Result {
    let pad = "  ".repeat(indent);
    match stmt {
        OutStmt::PassThrough(s) => writeln!(f, "{pad}{}", render_surface_stmt(s)),
        OutStmt::GlobalAssign { table, name, value } => {
            writeln!(f, "{pad}{table}.{name} = {}", render_expr(value))
        }
        OutStmt::SetEventPointer { table, link_id, target_function } => {
            writeln!(f, "{pad}{table}.{link_id} = {target_function}")
        }
        OutStmt::Call(target) => writeln!(f, "{pad}{target}()"),
        OutStmt::If { arms } => {
            for (i, arm) in arms.iter().enumerate() {
                match (&arm.cond, i) {
                    (Some(cond), 0) => writeln!(f, "{pad}if {} then", render_expr(cond))?,
                    (Some(cond), _) => writeln!(f, "{pad}elseif {} then", render_expr(cond))?,
                    (None, _) => writeln!(f, "{pad}else")?,
                }
                format_block(f, &arm.body, indent + 1)?;
            }
            writeln!(f, "{pad}end")
        }
        OutStmt::While { cond, body } => {
            writeln!(f, "{pad}while {} do", render_expr(cond))?;
            format_block(f, body, indent + 1)?;
            writeln!(f, "{pad}end")
        }
        OutStmt::Repeat { body, cond } => {
            writeln!(f, "{pad}repeat")?;
            format_block(f, body, indent + 1)?;
            writeln!(f, "{pad}until {}", render_expr(cond))
        }
        OutStmt::ForNum { var, start, stop, step, body } => {
            let step = step.as_ref().map(|s| format!(", {}", render_expr(s))).unwrap_or_default();
            writeln!(f, "{pad}for {var} = {}, {}{step} do", render_expr(start), render_expr(stop))?;
            format_block(f, body, indent + 1)?;
            writeln!(f, "{pad}end")
        }
        OutStmt::ForIn { vars, exprs, body } => {
            writeln!(
                f,
                "{pad}for {} in {} do",
                vars.join(", "),
                exprs.iter().map(render_expr).collect::<Vec<_>>().join(", ")
            )?;
            format_block(f, body, indent + 1)?;
            writeln!(f, "{pad}end")
        }
    }
}

fn format_block(f: &mut fmt::Formatter<'_>, body: &[OutStmt], indent: usize) -> fmt::Result {
    for stmt in body {
        format_stmt(f, stmt, indent)?;
    }
    Ok(())
}

fn render_surface_stmt(stmt: &Stmt) -> String {
    match stmt {
        Stmt::Call(e) => render_expr(e),
        Stmt::Return(values) => format!("return {}", values.iter().map(render_expr).collect::<Vec<_>>().join(", ")),
        Stmt::Break => "break".to_string(),
        Stmt::SemiColon => ";".to_string(),
        Stmt::Assign { targets, values } => format!(
            "{} = {}",
            targets.join(", "),
            values.iter().map(render_expr).collect::<Vec<_>>().join(", ")
        ),
        other => format!("<{other:?}>"),
    }
}

fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) => name.clone(),
        Expr::Number(n) => n.to_string(),
        Expr::Str(s) => format!("{s:?}"),
        Expr::Bool(b) => b.to_string(),
        Expr::Nil => "nil".to_string(),
        Expr::BinOp { op, lhs, rhs } => format!("{} {op} {}", render_expr(lhs), render_expr(rhs)),
        Expr::Call { func, args } => {
            format!("{}({})", render_expr(func), args.iter().map(render_expr).collect::<Vec<_>>().join(", "))
        }
        Expr::Invoke { object, method, args } => {
            format!("{}:{method}({})", render_expr(object), args.iter().map(render_expr).collect::<Vec<_>>().join(", "))
        }
    }
}
