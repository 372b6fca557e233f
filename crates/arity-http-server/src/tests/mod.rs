//! Test modules for arity-http-server crate

pub mod handler_tests;
