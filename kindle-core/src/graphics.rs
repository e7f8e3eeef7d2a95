use std::fmt;

use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use serde::Deserialize;

use crate::device::DeviceFeatures;
use crate::diagnostics::{DeviceProperties, ExtensionProperties, LayerProperties, QueueFamily};
use crate::swapchain::SwapchainDescriptor;
use crate::{KindleResult, NativeHandle, Owned};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationIdentity {
    pub name: String,
    pub version: Version,
    pub engine_name: String,
    pub engine_version: Version,
    pub api_version: Version,
}

pub struct InstanceDescriptor<'a> {
    pub application: &'a ApplicationIdentity,
    /// Platform surface extensions reported by [`Graphics::platform_extensions`].
    pub extensions: &'a [String],
    /// Request validation layers. Unavailable layers are skipped, not fatal.
    pub validation: bool,
}

/// Queues to create alongside a logical device.
#[derive(Clone, Debug, PartialEq)]
pub struct QueueRequest {
    pub family_index: u32,
    pub priorities: Vec<f32>,
}

impl QueueRequest {
    /// One queue from family 0.
    pub fn first_family() -> Self {
        Self {
            family_index: 0,
            priorities: vec![1.0],
        }
    }
}

/// A graphics API reached through native entry points.
///
/// Every creation call either returns an owned handle or the stage error
/// carrying the native status code.
pub trait Graphics {
    type Instance: NativeHandle;
    type PhysicalDevice: Copy + fmt::Debug;
    type Surface: NativeHandle;
    type Device: NativeHandle;
    type Swapchain: NativeHandle;

    /// Instance extensions needed to present to `display`.
    fn platform_extensions(&self, display: RawDisplayHandle) -> KindleResult<Vec<String>>;

    fn create_instance(&mut self, descriptor: &InstanceDescriptor) -> KindleResult<Owned<Self::Instance>>;

    fn enumerate_devices(&self, instance: &Self::Instance) -> KindleResult<Vec<Self::PhysicalDevice>>;

    fn device_features(&self, instance: &Self::Instance, device: Self::PhysicalDevice) -> DeviceFeatures;

    fn create_device(
        &mut self,
        instance: &Self::Instance,
        device: Self::PhysicalDevice,
        features: &DeviceFeatures,
        queues: &[QueueRequest],
    ) -> KindleResult<Owned<Self::Device>>;

    fn create_surface(
        &mut self,
        instance: &Self::Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> KindleResult<Owned<Self::Surface>>;

    fn create_swapchain(
        &mut self,
        instance: &Self::Instance,
        physical_device: Self::PhysicalDevice,
        device: &Self::Device,
        surface: &Self::Surface,
        descriptor: &SwapchainDescriptor,
    ) -> KindleResult<Owned<Self::Swapchain>>;

    /// Block until `device` has no outstanding queue work. The error is the
    /// native status code.
    fn wait_idle(&mut self, device: &Self::Device) -> Result<(), i32>;

    fn device_properties(&self, instance: &Self::Instance, device: Self::PhysicalDevice) -> DeviceProperties;

    fn queue_families(&self, instance: &Self::Instance, device: Self::PhysicalDevice) -> Vec<QueueFamily>;

    fn device_extensions(
        &self,
        instance: &Self::Instance,
        device: Self::PhysicalDevice,
    ) -> KindleResult<Vec<ExtensionProperties>>;

    fn instance_layers(&self) -> KindleResult<Vec<LayerProperties>>;

    fn instance_extensions(&self) -> KindleResult<Vec<ExtensionProperties>>;
}
