//! Conformance procedures for the creation functions
//!
//! One property per function. Each declares what to draw and what to
//! forward; running the call on every backend and comparing with the
//! reference is left to [`check_backends`](crate::harness::check_backends).
