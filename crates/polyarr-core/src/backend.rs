//! Backend trait that combines all operations

use crate::array::Array;
use crate::ops::*;
use crate::{DType, Device, PolyarrError, Result};

/// A complete backend implementation
///
/// Backends implement [`CreationOps`] and describe which dtypes and devices
/// they carry; callers go through [`Backend::check`] before allocating.
pub trait Backend: CreationOps
where
    <Self as CreationOps>::Array: Array,
{
    /// Backend name for identification
    fn name() -> &'static str;

    /// Backend version
    fn version() -> &'static str;

    fn supports_dtype(_dtype: DType) -> bool {
        true
    }

    fn supports_device(device: Device) -> bool {
        matches!(device, Device::Cpu(0))
    }

    /// Reject dtypes and devices this backend cannot hold.
    fn check(dtype: DType, device: Device) -> Result<()> {
        if !Self::supports_dtype(dtype) {
            return Err(PolyarrError::UnsupportedDType {
                backend: Self::name(),
                dtype,
            });
        }
        if !Self::supports_device(device) {
            return Err(PolyarrError::UnsupportedDevice {
                backend: Self::name(),
                device,
            });
        }
        Ok(())
    }
}
