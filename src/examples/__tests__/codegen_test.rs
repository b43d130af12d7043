use crate::examples::stack_machine::stack_machine;
use crate::examples::typed_calculator::{typed_calculator, CalcValue};
use crate::ValueImpl;

#[test]
fn emits_postfix_instructions() {
    let compiler = stack_machine();

    assert_eq!(
        compiler.compile("1+2*3").unwrap(),
        "push 1;push 2;push 3;mul;add;"
    );
    assert_eq!(compiler.compile("8").unwrap(), "push 8;");
    assert_eq!(
        compiler.compile("(1-2)/3").unwrap(),
        "push 1;push 2;sub;push 3;div;"
    );
}

#[test]
fn typed_values_flow_through_the_stacks() {
    let compiler = typed_calculator();

    assert_eq!(
        compiler.compile("1+2*(2+2)").unwrap(),
        CalcValue::Number(9)
    );
    assert_eq!(compiler.compile("7%3").unwrap(), CalcValue::Number(1));
    assert_eq!(compiler.compile("(10-4)/2").unwrap(), CalcValue::Number(3));
}

#[test]
fn operator_lexemes_become_operator_values() {
    // shifted terminals go through ValueImpl::from_lexeme
    assert_eq!(CalcValue::from_lexeme("12"), CalcValue::Number(12));
    assert_eq!(CalcValue::from_lexeme("+"), CalcValue::Operator('+'));
    assert_eq!(CalcValue::from_lexeme(""), CalcValue::Empty);
}
