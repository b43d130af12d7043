use crate::examples::calculator::{calculator, GRAMMAR};
use crate::Compiler;

#[test]
fn evaluates_arithmetic_expressions() {
    let compiler = calculator();

    assert_eq!(compiler.compile("1+2*(2+2)").unwrap(), "9");
    assert_eq!(compiler.compile("7%3").unwrap(), "1");
    assert_eq!(compiler.compile("(10-4)/2").unwrap(), "3");
}

#[test]
fn compiled_tables_are_reusable() {
    let compiler = calculator();

    assert_eq!(compiler.compile("2*3").unwrap(), "6");
    assert_eq!(compiler.compile("2*3").unwrap(), "6");
    assert_eq!(compiler.compile("1").unwrap(), "1");
}

#[test]
fn unknown_characters_fail_with_their_offset() {
    let compiler = calculator();

    match compiler.compile("1$2") {
        Ok(v) => panic!("compiled to {:?} instead of failing", v),
        Err(err) => assert_eq!(err.pointer, 1),
    }
}

#[test]
fn missing_table_entries_fail_at_the_offending_token() {
    let compiler = calculator();

    let err = compiler.compile("1+*2").unwrap_err();
    assert_eq!(err.pointer, 2);
    assert!(err.message.contains("Compilation error"), "{}", err.message);

    // truncated input: the end of input token hits a state without an action for it
    assert!(compiler.compile("1+").is_err());
}

#[test]
fn unregistered_actions_are_fatal_at_runtime() {
    let mut compiler: Compiler = Compiler::new(GRAMMAR).unwrap();
    compiler.register_action("forward", |values| values[0].clone());
    compiler.register_action("parent_exp", |values| values[1].clone());
    // bin_op is left unregistered

    assert_eq!(compiler.compile("4").unwrap(), "4");

    let err = compiler.compile("1+2").unwrap_err();
    assert!(err.message.contains("bin_op"), "{}", err.message);
}

#[test]
fn unnamed_productions_yield_empty_values() {
    let source = "
%token NUMBER [0-9]+
%%
s : n ;
n : NUMBER ;
";
    let compiler: Compiler = Compiler::new(source).unwrap();
    assert_eq!(compiler.compile("42").unwrap(), "");
}

#[test]
fn accept_dispatches_the_start_production_action() {
    let source = "
%token NUMBER [0-9]+
%%
s : NUMBER { tag } ;
";
    let mut compiler: Compiler = Compiler::new(source).unwrap();
    compiler.register_action("tag", |values| format!("<{}>", values[0]));
    assert_eq!(compiler.compile("42").unwrap(), "<42>");
}

#[test]
fn syntax_tree_capture() {
    let compiler = calculator();

    let tree = compiler.syntax_tree("1+2*3").unwrap();
    assert_eq!(tree.symbol, "exp");
    assert!(tree.contains("term"));
    assert!(tree.contains("factor"));
    assert!(tree.contains("NUMBER"));
    assert_eq!(tree.start, 0);
    assert_eq!(tree.end, 5);

    tree.print().unwrap();
}

#[test]
fn digit_identity_round_trip() {
    let source = "
%token NUMBER [0-9]+
%%
s : NUMBER { forward } ;
";
    let mut compiler: Compiler = Compiler::new(source).unwrap();
    compiler.register_action("forward", |values| values[0].clone());

    for input in ["0", "7", "00123", "999999999"] {
        assert_eq!(compiler.compile(input).unwrap(), input);
    }
}

#[test]
fn debug_summaries_render() {
    let compiler = calculator();

    let lexer = compiler.lexer_summary().unwrap();
    assert!(lexer.contains("NUMBER"));

    let parser = compiler.parser_summary().unwrap();
    assert!(parser.contains("exp -> "));
    assert!(parser.contains("$end"));

    let dot = compiler.dot_graph().unwrap();
    assert!(dot.starts_with("digraph G {"));
}
