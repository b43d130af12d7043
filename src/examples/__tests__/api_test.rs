use crate::examples::calculator::calculator;
use crate::grammar::Associativity;
use crate::{Compiler, GrammarError, TokenId};

#[test]
fn tokenize_exposes_the_lexeme_stream() {
    let compiler = calculator();

    let stream = compiler.tokenize("12+(3)").unwrap();
    let rendered: Vec<(&str, &str)> = stream
        .iter()
        .map(|l| {
            (
                compiler.tokens().name(l.token),
                std::str::from_utf8(&"12+(3)".as_bytes()[l.start..l.end]).unwrap(),
            )
        })
        .collect();

    assert_eq!(
        rendered,
        vec![
            ("NUMBER", "12"),
            ("'+'", "+"),
            ("'('", "("),
            ("NUMBER", "3"),
            ("')'", ")"),
            ("$end", ""),
        ]
    );
}

#[test]
fn tokenize_reports_lexer_errors() {
    let compiler = calculator();

    let err = compiler.tokenize("1@2").unwrap_err();
    assert_eq!(err.pointer, 1);
}

#[test]
fn grammar_renders_terminals_and_productions() {
    let compiler = calculator();

    let rendered = compiler.grammar().unwrap();
    assert!(rendered.contains("fragment {"), "{}", rendered);
    assert!(rendered.contains("NUMBER : /[0-9]+/"), "{}", rendered);
    assert!(rendered.contains("exp"), "{}", rendered);
    assert!(rendered.contains("{ bin_op }"), "{}", rendered);
}

#[test]
fn token_table_lookups() {
    let compiler = calculator();
    let tokens = compiler.tokens();

    let number = tokens.id_by_name("NUMBER").unwrap();
    assert!(tokens.is_terminal(number));
    assert_eq!(tokens[number].name(), "NUMBER");
    assert_eq!(
        tokens[number].terminal().unwrap().assoc,
        Associativity::Token
    );

    let exp = tokens.id_by_name("exp").unwrap();
    assert!(tokens.is_non_terminal(exp));
    assert_eq!(tokens[exp].non_terminal().unwrap().productions.len(), 3);

    assert!(tokens.id_by_name("missing").is_none());
}

#[test]
fn first_sets_are_exposed_by_name() {
    let compiler = calculator();
    let tokens = compiler.tokens();

    let number = tokens.id_by_name("NUMBER").unwrap();
    let lparen = tokens.id_by_name("'('").unwrap();

    for name in ["exp", "term", "factor"] {
        let first: Vec<TokenId> = compiler.first_set(name).unwrap().iter().copied().collect();
        assert_eq!(first, vec![number, lparen]);
    }

    // terminals have no FIRST set entry
    assert!(compiler.first_set("NUMBER").is_none());
}

#[test]
fn grammar_errors_carry_kind_and_position() {
    let err = Compiler::<String>::new("%token BAD [a-z\n%%\ns : BAD ;").unwrap_err();
    assert_eq!(err.what(), "RegexError");
    assert!(err.pointer().is_some());
    let display = format!("{}", err);
    assert!(display.starts_with("GrammarError:"), "{}", display);

    let err: GrammarError = Compiler::<String>::new("s : ;").unwrap_err();
    assert_eq!(err.what(), "GrammarSyntaxError");
}

#[test]
fn set_log_is_one_shot() {
    let compiler = calculator();
    assert!(compiler.set_log(crate::Log::Default("calc")).is_ok());
    assert!(compiler.set_log(crate::Log::Verbose("calc")).is_err());
}

#[test]
fn conflict_reports_render() {
    let source = "
%token X x
%%
s : a { f } | b { f } ;
a : X ;
b : X ;
";
    let compiler: Compiler = Compiler::new(source).unwrap();
    for conflict in compiler.conflicts() {
        let rendered = format!("{}", conflict);
        assert!(rendered.contains("conflict"), "{}", rendered);
    }
    assert!(!compiler.conflicts().is_empty());
}
