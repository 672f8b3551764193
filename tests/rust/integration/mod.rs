//! Integration tests - models materialized through an engine and parsed back
//!
//! Everything runs against `MemoryEngine`, so no database is required.

mod bridge_tests;
mod fixtures;
mod round_trip_tests;
