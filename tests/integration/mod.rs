//! Integration tests for Keel.

pub mod common;
pub mod completion_test;
pub mod dispatch_test;
pub mod providers_test;
