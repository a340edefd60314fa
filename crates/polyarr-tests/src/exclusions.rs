//! Known unsupported (backend, operation, dtype) combinations
//!
//! Procedures consult this table once per backend before dispatching; a
//! match is an intentional exclusion, not a failure.

use crate::config::BackendId;
use polyarr_core::DType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpMatch {
    Any,
    Named(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DTypeMatch {
    Any,
    /// Matches when any of the case's dtypes is listed
    OneOf(&'static [DType]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exclusion {
    pub backend: BackendId,
    pub op: OpMatch,
    pub dtypes: DTypeMatch,
    pub reason: &'static str,
}

impl Exclusion {
    pub fn matches(&self, backend: BackendId, op: &str, dtypes: &[DType]) -> bool {
        let op_hit = match self.op {
            OpMatch::Any => true,
            OpMatch::Named(name) => name == op,
        };
        let dtype_hit = match self.dtypes {
            DTypeMatch::Any => true,
            DTypeMatch::OneOf(listed) => dtypes.iter().any(|d| listed.contains(d)),
        };
        self.backend == backend && op_hit && dtype_hit
    }
}

pub static EXCLUSIONS: &[Exclusion] = &[
    Exclusion {
        backend: BackendId::Parallel,
        op: OpMatch::Any,
        dtypes: DTypeMatch::OneOf(&[DType::UInt16, DType::UInt32]),
        reason: "parallel storage has no 16/32-bit unsigned integers",
    },
    Exclusion {
        backend: BackendId::Parallel,
        op: OpMatch::Named("from_dlpack"),
        dtypes: DTypeMatch::Any,
        reason: "parallel backend cannot import dlpack capsules",
    },
];

/// First table entry excluding this combination, if any.
pub fn find_exclusion(backend: BackendId, op: &str, dtypes: &[DType]) -> Option<&'static Exclusion> {
    EXCLUSIONS.iter().find(|e| e.matches(backend, op, dtypes))
}
