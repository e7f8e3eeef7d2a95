pub mod instance;
mod surface;
mod device;
mod swapchain;

pub use instance::VulkanGraphics;

use std::ops::Deref;

use ash::vk::{self, Handle};
use kindle_core::{NativeHandle, Version};

/// Loaded instance function table.
pub struct VulkanInstance(pub ash::Instance);

/// Loaded device function table.
pub struct VulkanDevice(pub ash::Device);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VulkanSurface(pub vk::SurfaceKHR);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VulkanSwapchain(pub vk::SwapchainKHR);

macro_rules! vulkan_handle {
    ($($wrapper:ty => $inner:ty, |$this:ident| $raw:expr;)*) => {
        $(
            impl NativeHandle for $wrapper {
                fn is_null(&self) -> bool {
                    let $this = &self.0;
                    $raw == 0
                }
            }

            impl Deref for $wrapper {
                type Target = $inner;
                fn deref(&self) -> &$inner {
                    &self.0
                }
            }
        )*
    };
}

vulkan_handle! {
    VulkanInstance => ash::Instance, |i| i.handle().as_raw();
    VulkanDevice => ash::Device, |d| d.handle().as_raw();
    VulkanSurface => vk::SurfaceKHR, |s| s.as_raw();
    VulkanSwapchain => vk::SwapchainKHR, |s| s.as_raw();
}

pub(crate) fn to_vk_version(version: Version) -> u32 {
    vk::make_api_version(0, version.major, version.minor, version.patch)
}

pub(crate) fn from_vk_version(version: u32) -> Version {
    Version::new(
        vk::api_version_major(version),
        vk::api_version_minor(version),
        vk::api_version_patch(version),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_pack_like_vulkan() {
        assert_eq!(to_vk_version(Version::new(1, 0, 0)), vk::API_VERSION_1_0);
        assert_eq!(from_vk_version(vk::API_VERSION_1_3), Version::new(1, 3, 0));
    }

    #[test]
    fn null_handles_are_detected() {
        assert!(VulkanSurface(vk::SurfaceKHR::null()).is_null());
        assert!(!VulkanSwapchain(vk::SwapchainKHR::from_raw(1)).is_null());
    }

    #[test]
    fn null_surface_is_refused_ownership() {
        let err = kindle_core::Owned::new(VulkanSurface(vk::SurfaceKHR::null()), |_| unreachable!()).unwrap_err();
        assert!(matches!(err, kindle_core::KindleError::InvalidHandle { .. }));
    }
}
