mod api_test;
mod calculator_test;
mod codegen_test;
mod json_test;
