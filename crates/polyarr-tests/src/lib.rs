//! Conformance suite for polyarr backends
//!
//! Every creation function is driven with generated shapes, dtypes and
//! values, and each configured backend's result is compared with the
//! reference backend. The procedures themselves live in [`creation`]; the
//! rest of the crate is the machinery they share.

pub mod compare;
pub mod config;
pub mod creation;
pub mod exclusions;
pub mod harness;
pub mod properties;
pub mod strategies;

pub use config::{BackendId, HarnessConfig};
pub use harness::{check_backends, invoke, test_function, Arg, ConformanceError, ExecutionFlags, FunctionCase};

/// Route `log` output through `env_logger`; safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Macro to generate one test per backend
///
/// The body sees the backend as the type alias `B`.
#[macro_export]
macro_rules! backend_tests {
    ($test_name:ident, $body:block) => {
        mod $test_name {
            #[allow(unused_imports)]
            use super::*;

            #[test]
            fn cpu() {
                #[allow(dead_code)]
                type B = polyarr_cpu::CpuBackend;
                $body
            }

            #[test]
            fn flat() {
                #[allow(dead_code)]
                type B = polyarr_flat::FlatBackend;
                $body
            }

            #[test]
            fn parallel() {
                #[allow(dead_code)]
                type B = polyarr_flat::ParallelBackend;
                $body
            }
        }
    };
}
