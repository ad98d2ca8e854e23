//! Wires the six passes together into one compilation.

use crate::config::Options;
use crate::error::Error;
use crate::ident::IdentMint;
use crate::ir::GraphSet;
use crate::output::ast::Program;
use crate::passes::{emit, expand, linearize, lower, pointer, split};
use crate::surface::ast::Chunk;

/// The result of a single compilation: the emitted program plus, when
/// requested, a Graphviz dot dump of the fully-linked graph set just before
/// emission.
pub struct Compilation {
    pub program: Program,
    pub debug_graphs: Option<String>,
}

/// Runs the full six-pass pipeline over `chunk`: lowering, expansion, branch
/// linearization, async splitting, an acyclicity check, continuation-pointer
/// insertion, then emission. A fresh [`GraphSet`] and [`IdentMint`] are
/// created per call — nothing here survives across calls.
pub fn compile(chunk: &Chunk, options: &Options) -> Result<Compilation, Error> {
    let mut gs = GraphSet::new();
    let mut mint = IdentMint::new(options.seed);

    let entry = lower::lower_program(chunk, &mut gs, options)?;
    let root = gs
        .get(entry)
        .root
        .expect("lower_program always populates the entry graph's root");
    expand::expand_node(gs.get_mut(entry), root, options)?;

    linearize::linearize(&mut gs, &mut mint)?;
    split::split(&mut gs, &mut mint)?;

    // Splitting can only ever grow the Link forest, so this is the first
    // point at which every Link the pipeline will ever produce exists.
    gs.check_acyclic()?;

    pointer::insert_pointers(&mut gs)?;

    let debug_graphs = options.render_debug_graphs.then(|| gs.to_dot());
    let program = emit::emit(&gs, options)?;

    Ok(Compilation { program, debug_graphs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::grammar;

    fn opts() -> Options {
        Options::with_seed(1)
    }

    #[test]
    fn straight_line_program_with_no_await_produces_one_function() {
        let chunk = Chunk { body: vec![grammar::parse("function f() bar() end").unwrap().remove(0)] };
        let compilation = compile(&chunk, &opts()).unwrap();
        assert_eq!(compilation.program.functions.len(), 1);
        assert!(compilation.debug_graphs.is_none());
    }

    #[test]
    fn single_await_splits_into_two_functions() {
        let src = "function f() bar(); await(foo()); bar() end";
        let chunk = Chunk { body: vec![grammar::parse(src).unwrap().remove(0)] };
        let compilation = compile(&chunk, &opts()).unwrap();
        assert_eq!(compilation.program.functions.len(), 2);
        assert_eq!(compilation.program.event_ptr_init.len(), 1);
    }

    #[test]
    fn branch_with_await_in_one_arm_produces_three_functions() {
        let src = "function f() if c then await(foo()) else bar() end; bar() end";
        let chunk = Chunk { body: vec![grammar::parse(src).unwrap().remove(0)] };
        let compilation = compile(&chunk, &opts()).unwrap();
        assert_eq!(compilation.program.functions.len(), 3);
    }

    #[test]
    fn goto_is_rejected_as_unsupported() {
        let src = "function f() goto done ::done:: end";
        let chunk = Chunk { body: vec![grammar::parse(src).unwrap().remove(0)] };
        assert!(matches!(compile(&chunk, &opts()), Err(Error::UnsupportedConstruct(_))));
    }

    #[test]
    fn second_top_level_function_is_rejected() {
        let src1 = "function f() end";
        let src2 = "function g() end";
        let mut body = grammar::parse(src1).unwrap();
        body.extend(grammar::parse(src2).unwrap());
        let chunk = Chunk { body };
        assert!(matches!(compile(&chunk, &opts()), Err(Error::UnsupportedConstruct(_))));
    }

    #[test]
    fn deterministic_for_a_fixed_seed() {
        let src = "function f() bar(); await(foo()); bar() end";
        let chunk = Chunk { body: vec![grammar::parse(src).unwrap().remove(0)] };
        let a = compile(&chunk, &opts()).unwrap();
        let b = compile(&chunk, &opts()).unwrap();
        assert_eq!(a.program.functions[1].name, b.program.functions[1].name);
    }
}
