use crate::Compiler;

/// Arithmetic grammar with structural precedence: additive operators on `exp`,
/// multiplicative ones on `term` and parenthesized groups on `factor`.
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
    : NUMBER { forward }
    | '(' exp ')' { parent_exp }
    ;
"#;

/// Build the arithmetic compiler with its evaluation actions registered.
pub fn calculator() -> Compiler {
    let mut compiler: Compiler = Compiler::new(GRAMMAR).unwrap();

    compiler.register_action("forward", |values| values[0].clone());
    compiler.register_action("parent_exp", |values| values[1].clone());
    compiler.register_action("bin_op", |values| {
        let lhs: i64 = values[0].parse().unwrap();
        let rhs: i64 = values[2].parse().unwrap();
        let result = match values[1].as_str() {
            "+" => lhs + rhs,
            "-" => lhs - rhs,
            "*" => lhs * rhs,
            "/" => lhs / rhs,
            _ => lhs % rhs,
        };
        result.to_string()
    });

    compiler
}
