use thiserror::Error;

/// Failure of one bootstrap stage.
///
/// Native status codes are carried as the raw integer the native API returned
/// so that the core stays independent of any particular backend crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KindleError {
    #[error("Invalid Handle: native call produced a null `{handle}`")]
    InvalidHandle { handle: &'static str },
    #[error("Capability Not Found: global `{interface}` was never advertised")]
    CapabilityNotFound { interface: &'static str },
    #[error("Instance Creation Failed: status {status}")]
    InstanceCreation { status: i32 },
    #[error("No Suitable Device: no physical device was enumerated")]
    NoSuitableDevice,
    #[error("Unsupported Feature: device lacks mandatory feature `{feature}`")]
    UnsupportedFeature { feature: &'static str },
    #[error("Device Creation Failed: status {status}")]
    DeviceCreation { status: i32 },
    #[error("Surface Creation Failed: status {status}")]
    SurfaceCreation { status: i32 },
    #[error("Swapchain Creation Failed: status {status}")]
    SwapchainCreation { status: i32 },
    #[error("Query Failed: {what} returned status {status}")]
    Query { what: &'static str, status: i32 },
    #[error("Connection Failed: {0}")]
    Connection(String),
    #[error("Protocol Error: {0}")]
    Protocol(String),
    #[error("Config Error: {0}")]
    Config(String),
}

impl KindleError {
    /// Native status code reported by the failing call, if there was one.
    pub fn status(&self) -> Option<i32> {
        match self {
            KindleError::InstanceCreation { status }
            | KindleError::DeviceCreation { status }
            | KindleError::SurfaceCreation { status }
            | KindleError::SwapchainCreation { status }
            | KindleError::Query { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type KindleResult<T> = Result<T, KindleError>;
