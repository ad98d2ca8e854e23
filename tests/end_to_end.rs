//! End-to-end scenarios exercised through the public `compile_source` entry
//! point.

use concurrent::{Options, compile_source};

fn opts() -> Options {
    Options::with_seed(1)
}

#[test]
fn straight_line_await_produces_two_functions_with_one_async_link() {
    let src = "function f() bar(); await(foo()); bar() end";
    let compilation = compile_source(src, &opts()).unwrap();
    assert_eq!(compilation.program.functions.len(), 2);
    assert_eq!(compilation.program.event_ptr_init.len(), 1);

    let rendered = compilation.program.to_string();
    assert!(rendered.contains("global.event_ptrs."));
}

#[test]
fn branch_with_await_in_one_arm_produces_three_functions() {
    let src = "function f() if c then await(foo()) else bar() end; bar() end";
    let compilation = compile_source(src, &opts()).unwrap();

    // A (entry, holds the branch), B (continuation after the await), C
    // (the trailing bar() continuation both arms link to).
    assert_eq!(compilation.program.functions.len(), 3);
    assert_eq!(compilation.program.event_ptr_init.len(), 1);

    let entry = &compilation.program.functions[0];
    assert_eq!(entry.name, "f");
}

#[test]
fn implicit_else_bug_fix_links_every_branch_leaf_to_the_tail_continuation() {
    // No explicit else arm; the trailing bar() must still be reachable
    // whichever way the branch falls.
    let src = "function f() local v = bar(); if v==1 then await(foo()) end; bar() end";
    let compilation = compile_source(src, &opts()).unwrap();
    assert!(compilation.program.functions.len() >= 2);
}

#[test]
fn three_chained_awaits_produce_one_function_per_await_plus_entry() {
    let src = "function f() await(a()); await(b()); await(c()) end";
    let compilation = compile_source(src, &opts()).unwrap();
    assert_eq!(compilation.program.functions.len(), 4);
    assert_eq!(compilation.program.event_ptr_init.len(), 3);
}

#[test]
fn goto_is_rejected() {
    let src = "function f() goto done ::done:: end";
    let err = compile_source(src, &opts()).unwrap_err();
    assert!(matches!(err, concurrent::Error::UnsupportedConstruct(_)));
}

#[test]
fn two_top_level_functions_is_rejected() {
    let src = "function f() end function g() end";
    let err = compile_source(src, &opts()).unwrap_err();
    assert!(matches!(err, concurrent::Error::UnsupportedConstruct(_)));
}

#[test]
fn method_definitions_are_rejected() {
    let src = "function f() obj:method() end";
    let err = compile_source(src, &opts()).unwrap_err();
    assert!(matches!(err, concurrent::Error::UnsupportedConstruct(_)));
}

#[test]
fn return_inside_an_await_chain_is_rejected() {
    let src = "function f() await(foo()); return 1 end";
    let err = compile_source(src, &opts()).unwrap_err();
    assert!(matches!(err, concurrent::Error::UnsupportedConstruct(_)));
}

#[test]
fn determinism_for_a_fixed_seed() {
    let src = "function f() bar(); await(foo()); bar() end";
    let a = compile_source(src, &opts()).unwrap();
    let b = compile_source(src, &opts()).unwrap();
    assert_eq!(a.program.functions[1].name, b.program.functions[1].name);
    assert_eq!(a.program.event_ptr_init[0].key, b.program.event_ptr_init[0].key);
}

#[test]
fn rendered_output_round_trips_pass_through_statements() {
    let src = "function f() break end";
    let compilation = compile_source(src, &opts()).unwrap();
    let rendered = compilation.program.to_string();
    assert!(rendered.contains("break"));
}

#[test]
fn nested_loop_with_await_splits_correctly() {
    let src = "function f() while cond() do await(foo()) end end";
    let compilation = compile_source(src, &opts()).unwrap();
    // The while loop's body continuation plus the entry function.
    assert_eq!(compilation.program.functions.len(), 2);
}
