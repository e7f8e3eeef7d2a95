use kindle_core::{KindleError, KindleResult, Owned};
use log::{error, info};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::{VulkanGraphics, VulkanInstance, VulkanSurface};

impl VulkanGraphics {
    pub(crate) fn new_surface(
        &self,
        instance: &VulkanInstance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> KindleResult<Owned<VulkanSurface>> {
        let surface_khr = unsafe {
            ash_window::create_surface(&self.entry, &instance.0, display, window, None).map_err(|e| {
                error!("Failed to create surface: {:?}", e);
                KindleError::SurfaceCreation { status: e.as_raw() }
            })?
        };

        info!("Vulkan Surface created successfully: {:?}", surface_khr);

        let surface_loader = ash::khr::surface::Instance::new(&self.entry, &instance.0);
        Owned::new(VulkanSurface(surface_khr), move |surface: VulkanSurface| unsafe {
            info!("Destroying Vulkan Surface");
            surface_loader.destroy_surface(surface.0, None);
        })
    }
}
