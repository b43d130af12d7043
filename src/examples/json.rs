use crate::Compiler;

/// Compact JSON grammar over alphanumeric strings.
///
/// Every reduction concatenates its lexemes back together, so compiling a compact JSON
/// document reproduces it unchanged; the test suite cross checks the result with
/// serde_json.
pub const GRAMMAR: &str = r#"
%token NUMBER [0-9]+
%token TRUE true
%token FALSE false
%token NULL null
%token WORD [a-zA-Z0-9_]+
%token QUOTE "

%%

json : value { forward } ;

value
    : string { forward }
    | NUMBER { forward }
    | TRUE { forward }
    | FALSE { forward }
    | NULL { forward }
    | object { forward }
    | array { forward }
    ;

string
    : QUOTE WORD QUOTE { concat }
    | QUOTE NUMBER QUOTE { concat }
    | QUOTE QUOTE { concat }
    ;

object
    : '{' members '}' { concat }
    | '{' '}' { concat }
    ;

members
    : members ',' member { concat }
    | member { forward }
    ;

member
    : string ':' value { concat }
    ;

array
    : '[' elements ']' { concat }
    | '[' ']' { concat }
    ;

elements
    : elements ',' value { concat }
    | value { forward }
    ;
"#;

/// Build the JSON normalizer with its concatenation actions registered.
pub fn json_grammar() -> Compiler {
    let mut compiler: Compiler = Compiler::new(GRAMMAR).unwrap();

    compiler.register_action("forward", |values| values[0].clone());
    compiler.register_action("concat", |values| values.concat());

    compiler
}
