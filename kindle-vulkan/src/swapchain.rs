use ash::vk;
use kindle_core::swapchain::{ColorSpace, PresentMode, SurfaceFormat, SwapchainDescriptor};
use kindle_core::{KindleError, KindleResult, Owned};
use log::{error, info, warn};

use crate::{VulkanDevice, VulkanGraphics, VulkanInstance, VulkanSwapchain};

pub(crate) fn vk_format(format: SurfaceFormat) -> vk::Format {
    match format {
        SurfaceFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
        SurfaceFormat::Rgba8Srgb => vk::Format::R8G8B8A8_SRGB,
        SurfaceFormat::Bgra8Unorm => vk::Format::B8G8R8A8_UNORM,
        SurfaceFormat::Bgra8Srgb => vk::Format::B8G8R8A8_SRGB,
    }
}

pub(crate) fn vk_color_space(color_space: ColorSpace) -> vk::ColorSpaceKHR {
    match color_space {
        ColorSpace::SrgbNonlinear => vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

pub(crate) fn vk_present_mode(mode: PresentMode) -> vk::PresentModeKHR {
    match mode {
        PresentMode::Immediate => vk::PresentModeKHR::IMMEDIATE,
        PresentMode::Mailbox => vk::PresentModeKHR::MAILBOX,
        PresentMode::Fifo => vk::PresentModeKHR::FIFO,
        PresentMode::FifoRelaxed => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

impl VulkanGraphics {
    pub(crate) fn new_swapchain(
        &self,
        instance: &VulkanInstance,
        pdevice: vk::PhysicalDevice,
        device: &VulkanDevice,
        surface_khr: vk::SurfaceKHR,
        descriptor: &SwapchainDescriptor,
    ) -> KindleResult<Owned<VulkanSwapchain>> {
        let surface_loader = ash::khr::surface::Instance::new(&self.entry, &instance.0);
        let capabilities = unsafe {
            surface_loader
                .get_physical_device_surface_capabilities(pdevice, surface_khr)
                .map_err(|e| {
                    error!("Failed to query surface capabilities: {:?}", e);
                    KindleError::SwapchainCreation { status: e.as_raw() }
                })?
        };

        let extent = vk::Extent2D {
            width: descriptor.extent.width,
            height: descriptor.extent.height,
        };
        // The parameters are used as given; mismatches are only reported.
        if descriptor.image_count < capabilities.min_image_count
            || (capabilities.max_image_count > 0 && descriptor.image_count > capabilities.max_image_count)
        {
            warn!(
                "Requested {} images, surface allows {}..={}",
                descriptor.image_count, capabilities.min_image_count, capabilities.max_image_count
            );
        }
        if capabilities.current_extent.width != u32::MAX && capabilities.current_extent != extent {
            warn!(
                "Requested extent {:?} differs from the surface's {:?}",
                extent, capabilities.current_extent
            );
        }

        let create_info = vk::SwapchainCreateInfoKHR {
            surface: surface_khr,
            min_image_count: descriptor.image_count,
            image_format: vk_format(descriptor.format),
            image_color_space: vk_color_space(descriptor.color_space),
            image_extent: extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: vk::SharingMode::EXCLUSIVE,
            pre_transform: capabilities.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode: vk_present_mode(descriptor.present_mode),
            clipped: vk::TRUE,
            ..Default::default()
        };

        let swapchain_loader = ash::khr::swapchain::Device::new(&instance.0, &device.0);
        let swapchain = unsafe {
            swapchain_loader.create_swapchain(&create_info, None).map_err(|e| {
                error!("Failed to create swapchain: {:?}", e);
                KindleError::SwapchainCreation { status: e.as_raw() }
            })?
        };

        info!("Vulkan Swapchain created successfully");

        Owned::new(VulkanSwapchain(swapchain), move |swapchain: VulkanSwapchain| unsafe {
            info!("Destroying Swapchain");
            swapchain_loader.destroy_swapchain(swapchain.0, None);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_descriptor_maps_to_rgba8_fifo() {
        assert_eq!(vk_format(SurfaceFormat::Rgba8Unorm), vk::Format::R8G8B8A8_UNORM);
        assert_eq!(vk_color_space(ColorSpace::SrgbNonlinear), vk::ColorSpaceKHR::SRGB_NONLINEAR);
        assert_eq!(vk_present_mode(PresentMode::Fifo), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn every_present_mode_is_distinct() {
        let modes = [
            PresentMode::Immediate,
            PresentMode::Mailbox,
            PresentMode::Fifo,
            PresentMode::FifoRelaxed,
        ]
        .map(vk_present_mode);
        for (i, a) in modes.iter().enumerate() {
            for b in &modes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
