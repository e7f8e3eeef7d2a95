//! Read-only records produced by device and instance queries.

use std::fmt;

use crate::Version;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceType {
    Other,
    IntegratedGpu,
    DiscreteGpu,
    VirtualGpu,
    Cpu,
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceType::Other => "other",
            DeviceType::IntegratedGpu => "integrated gpu",
            DeviceType::DiscreteGpu => "discrete gpu",
            DeviceType::VirtualGpu => "virtual gpu",
            DeviceType::Cpu => "cpu",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceLimits {
    pub max_image_dimension_2d: u32,
    pub max_framebuffer_width: u32,
    pub max_framebuffer_height: u32,
    pub max_viewports: u32,
    pub max_color_attachments: u32,
    pub max_bound_descriptor_sets: u32,
    pub max_push_constants_size: u32,
    pub max_memory_allocation_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceProperties {
    pub name: String,
    pub device_type: DeviceType,
    pub api_version: Version,
    pub driver_version: u32,
    pub vendor_id: u32,
    pub device_id: u32,
    pub pipeline_cache_uuid: [u8; 16],
    pub limits: DeviceLimits,
}

impl DeviceProperties {
    pub fn pipeline_cache_uuid_hex(&self) -> String {
        self.pipeline_cache_uuid.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamily {
    pub index: u32,
    pub queue_count: u32,
    pub graphics: bool,
    pub compute: bool,
    pub transfer: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerProperties {
    pub name: String,
    pub spec_version: Version,
    pub implementation_version: u32,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionProperties {
    pub name: String,
    pub spec_version: u32,
}
