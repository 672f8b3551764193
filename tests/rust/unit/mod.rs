//! Unit tests - public API pieces exercised in isolation
//!
//! No engine round trips here beyond what a single `read_sql` call needs.

mod catalog_file_tests;
mod query_compile_tests;
