//! Ready made demo grammars used by the documentation and the test suite.

pub mod calculator;
pub mod json;
pub mod stack_machine;
pub mod typed_calculator;

#[cfg(test)]
mod __tests__;
