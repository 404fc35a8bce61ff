//! Integration tests - schema files compiled end to end
//!
//! These tests load relation schemas from disk and check the joined headers
//! the compiler produces for every association kind.

mod report_output_tests;
mod schema_compilation_tests;
mod schema_file_tests;
