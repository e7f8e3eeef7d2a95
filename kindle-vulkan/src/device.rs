use ash::vk;
use kindle_core::device::DeviceFeatures;
use kindle_core::diagnostics::{DeviceLimits, DeviceProperties, DeviceType, QueueFamily};
use kindle_core::{KindleError, KindleResult, Owned, QueueRequest};
use log::{error, info};

use crate::instance::c_str_lossy;
use crate::{from_vk_version, VulkanDevice, VulkanGraphics, VulkanInstance};

impl VulkanGraphics {
    pub(crate) fn supported_features(&self, instance: &VulkanInstance, pdevice: vk::PhysicalDevice) -> DeviceFeatures {
        let features = unsafe { instance.get_physical_device_features(pdevice) };
        DeviceFeatures {
            geometry_shader: features.geometry_shader == vk::TRUE,
            tessellation_shader: features.tessellation_shader == vk::TRUE,
            multi_draw_indirect: features.multi_draw_indirect == vk::TRUE,
        }
    }

    pub(crate) fn new_device(
        &self,
        instance: &VulkanInstance,
        pdevice: vk::PhysicalDevice,
        features: &DeviceFeatures,
        queues: &[QueueRequest],
    ) -> KindleResult<Owned<VulkanDevice>> {
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queues
            .iter()
            .map(|q| vk::DeviceQueueCreateInfo {
                queue_family_index: q.family_index,
                p_queue_priorities: q.priorities.as_ptr(),
                queue_count: q.priorities.len() as u32,
                ..Default::default()
            })
            .collect();

        let enabled_features = vk::PhysicalDeviceFeatures {
            geometry_shader: features.geometry_shader.into(),
            tessellation_shader: features.tessellation_shader.into(),
            multi_draw_indirect: features.multi_draw_indirect.into(),
            ..Default::default()
        };

        let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

        let device_create_info = vk::DeviceCreateInfo {
            p_queue_create_infos: queue_create_infos.as_ptr(),
            queue_create_info_count: queue_create_infos.len() as u32,
            pp_enabled_extension_names: device_extension_names.as_ptr(),
            enabled_extension_count: device_extension_names.len() as u32,
            p_enabled_features: &enabled_features,
            ..Default::default()
        };

        let device = unsafe {
            instance.create_device(pdevice, &device_create_info, None).map_err(|e| {
                error!("Failed to create logical device: {:?}", e);
                KindleError::DeviceCreation { status: e.as_raw() }
            })?
        };

        info!("Vulkan Device created successfully");

        Owned::new(VulkanDevice(device), |device: VulkanDevice| unsafe {
            info!("Destroying Vulkan Device");
            device.destroy_device(None);
        })
    }

    pub(crate) fn properties(&self, instance: &VulkanInstance, pdevice: vk::PhysicalDevice) -> DeviceProperties {
        let props = unsafe { instance.get_physical_device_properties(pdevice) };
        let limits = &props.limits;
        DeviceProperties {
            name: c_str_lossy(props.device_name_as_c_str()),
            device_type: device_type(props.device_type),
            api_version: from_vk_version(props.api_version),
            driver_version: props.driver_version,
            vendor_id: props.vendor_id,
            device_id: props.device_id,
            pipeline_cache_uuid: props.pipeline_cache_uuid,
            limits: DeviceLimits {
                max_image_dimension_2d: limits.max_image_dimension2_d,
                max_framebuffer_width: limits.max_framebuffer_width,
                max_framebuffer_height: limits.max_framebuffer_height,
                max_viewports: limits.max_viewports,
                max_color_attachments: limits.max_color_attachments,
                max_bound_descriptor_sets: limits.max_bound_descriptor_sets,
                max_push_constants_size: limits.max_push_constants_size,
                max_memory_allocation_count: limits.max_memory_allocation_count,
            },
        }
    }

    pub(crate) fn families(&self, instance: &VulkanInstance, pdevice: vk::PhysicalDevice) -> Vec<QueueFamily> {
        let families = unsafe { instance.get_physical_device_queue_family_properties(pdevice) };
        families
            .iter()
            .enumerate()
            .map(|(index, q)| QueueFamily {
                index: index as u32,
                queue_count: q.queue_count,
                graphics: q.queue_flags.contains(vk::QueueFlags::GRAPHICS),
                compute: q.queue_flags.contains(vk::QueueFlags::COMPUTE),
                transfer: q.queue_flags.contains(vk::QueueFlags::TRANSFER),
            })
            .collect()
    }
}

fn device_type(ty: vk::PhysicalDeviceType) -> DeviceType {
    match ty {
        vk::PhysicalDeviceType::INTEGRATED_GPU => DeviceType::IntegratedGpu,
        vk::PhysicalDeviceType::DISCRETE_GPU => DeviceType::DiscreteGpu,
        vk::PhysicalDeviceType::VIRTUAL_GPU => DeviceType::VirtualGpu,
        vk::PhysicalDeviceType::CPU => DeviceType::Cpu,
        _ => DeviceType::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_types_map_onto_records() {
        assert_eq!(device_type(vk::PhysicalDeviceType::DISCRETE_GPU), DeviceType::DiscreteGpu);
        assert_eq!(device_type(vk::PhysicalDeviceType::CPU), DeviceType::Cpu);
        assert_eq!(device_type(vk::PhysicalDeviceType::from_raw(42)), DeviceType::Other);
    }
}
