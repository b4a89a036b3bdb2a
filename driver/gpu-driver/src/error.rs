use gpu_registers::{AddressPolicy, NarrowingError, narrow};

#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
pub enum DriverError {
    #[error("value for {register} does not fit the register")]
    Narrowing {
        register: &'static str,
        #[source]
        source: NarrowingError,
    },
    #[error("the device has not been brought up")]
    NotInitialized,
    #[error("a previously launched kernel has not been waited on")]
    KernelInFlight,
    #[error("no kernel has been launched since the last wait")]
    NotLaunched,
    #[error("invalid kernel descriptor: {field} must be nonzero")]
    InvalidDescriptor { field: &'static str },
    #[error("{register} did not signal completion within {polls} polls")]
    Timeout { register: &'static str, polls: u32 },
}

/// Narrow `value` for the register named `register`.
pub(crate) const fn narrow_for(
    register: &'static str,
    value: u64,
    policy: AddressPolicy,
) -> Result<u32, DriverError> {
    match narrow(value, policy) {
        Ok(v) => Ok(v),
        Err(source) => Err(DriverError::Narrowing { register, source }),
    }
}
