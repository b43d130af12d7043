use crate::Compiler;

/// Arithmetic grammar with a dedicated action on number leaves, so reductions can emit
/// postfix instructions instead of evaluating.
pub const GRAMMAR: &str = r#"
%token NUMBER [0-9]+

%%

exp
    : exp '+' term { bin_op }
    | exp '-' term { bin_op }
    | term { forward }
    ;

term
    : term '*' factor { bin_op }
    | term '/' factor { bin_op }
    | term '%' factor { bin_op }
    | factor { forward }
    ;

factor
    : NUMBER { push_number }
    | '(' exp ')' { parent_exp }
    ;
"#;

/// Code generation demo: compile an expression to postfix instructions.
///
/// Every number becomes a `push` and every operator application an operation on the two
/// topmost stack slots, so `1+2*3` compiles to `push 1;push 2;push 3;mul;add;`.
pub fn stack_machine() -> Compiler {
    let mut compiler: Compiler = Compiler::new(GRAMMAR).unwrap();

    compiler.register_action("forward", |values| values[0].clone());
    compiler.register_action("parent_exp", |values| values[1].clone());
    compiler.register_action("push_number", |values| format!("push {};", values[0]));
    compiler.register_action("bin_op", |values| {
        let op = match values[1].as_str() {
            "+" => "add",
            "-" => "sub",
            "*" => "mul",
            "/" => "div",
            _ => "rem",
        };
        format!("{}{}{};", values[0], values[2], op)
    });

    compiler
}
