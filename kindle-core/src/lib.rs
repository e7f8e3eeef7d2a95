pub mod config;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod graphics;
pub mod handle;
pub mod pipeline;
pub mod registry;
pub mod swapchain;
pub mod windowing;

pub use config::BootstrapConfig;
pub use error::{KindleError, KindleResult};
pub use graphics::{ApplicationIdentity, Graphics, InstanceDescriptor, QueueRequest, Version};
pub use handle::{NativeHandle, Owned};
pub use pipeline::Presentation;
pub use windowing::Windowing;
