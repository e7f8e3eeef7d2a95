//! The bootstrap pipeline.
//!
//! Construction runs strictly in this order, each stage consuming handles
//! produced by the ones before it:
//!
//! connection (given) -> registry (transient) -> compositor [-> shell]
//! -> drawable surface -> instance -> graphics surface -> logical device
//! -> swapchain
//!
//! A failing stage returns early; every handle built so far is a local
//! [`Owned`] and is released in reverse order of construction on the way out.
//! A finished [`Presentation`] releases in the same reverse order once the
//! logical device is idle.

use log::{info, warn};

use crate::device::{self, DeviceFeatures};
use crate::diagnostics::{DeviceProperties, ExtensionProperties, LayerProperties, QueueFamily};
use crate::registry::{self, Capabilities, CapabilityRequest};
use crate::swapchain::{self, SwapchainDescriptor};
use crate::{BootstrapConfig, Graphics, KindleResult, Owned, Windowing};

/// A fully bootstrapped presentation target.
///
/// Fields are declared in reverse construction order so that dropping the
/// struct tears everything down newest first.
pub struct Presentation<W: Windowing, G: Graphics> {
    swapchain: Owned<G::Swapchain>,
    device: Owned<G::Device>,
    graphics_surface: Owned<G::Surface>,
    instance: Owned<G::Instance>,
    surface: Owned<W::Surface>,
    capabilities: Capabilities<W::Compositor, W::Shell>,
    connection: Owned<W::Connection>,
    graphics: G,
    windowing: W,
    physical_device: G::PhysicalDevice,
    features: DeviceFeatures,
    descriptor: SwapchainDescriptor,
    idle_retry_limit: Option<u32>,
}

impl<W: Windowing, G: Graphics> Presentation<W, G> {
    /// Runs every stage against an already open `connection`.
    pub fn bootstrap(
        mut windowing: W,
        mut graphics: G,
        connection: Owned<W::Connection>,
        config: &BootstrapConfig,
    ) -> KindleResult<Self> {
        config.validate()?;
        let request = CapabilityRequest::for_backend::<W>(config.require_shell);
        let capabilities = registry::bind_capabilities(&mut windowing, &connection, request)?;

        let surface = windowing.create_surface(capabilities.compositor())?;
        info!("Drawable surface created");

        let (display, _) = windowing.raw_handles(&connection, &surface)?;
        let instance = device::create_instance(&mut graphics, &config.application(), display, config.validation)?;

        let graphics_surface =
            swapchain::create_graphics_surface(&windowing, &mut graphics, &instance, &connection, &surface)?;
        info!("Graphics surface created");

        let devices = device::enumerate_devices(&graphics, &instance)?;
        let physical_device = device::select_device(&devices)?;
        let (device, features) = device::create_logical_device(&mut graphics, &instance, physical_device)?;
        info!("Logical device created on {:?}", physical_device);

        let descriptor = config.swapchain_descriptor();
        let swapchain = swapchain::create_swapchain(
            &mut graphics,
            &instance,
            physical_device,
            &device,
            &graphics_surface,
            &descriptor,
        )?;
        info!("Swapchain created");

        Ok(Self {
            swapchain,
            device,
            graphics_surface,
            instance,
            surface,
            capabilities,
            connection,
            graphics,
            windowing,
            physical_device,
            features,
            descriptor,
            idle_retry_limit: config.idle_retry_limit,
        })
    }

    /// Retries the idle query until it succeeds, or until the configured
    /// retry limit is exhausted. Returns whether the device reached idle.
    pub fn wait_idle(&mut self) -> bool {
        let mut failures = 0u32;
        loop {
            match self.graphics.wait_idle(&self.device) {
                Ok(()) => return true,
                Err(status) => {
                    failures += 1;
                    warn!("Device wait idle failed with status {} (attempt {})", status, failures);
                    if self.idle_retry_limit.is_some_and(|limit| failures >= limit) {
                        warn!("Giving up on device idle after {} attempts", failures);
                        return false;
                    }
                }
            }
        }
    }

    /// Waits for the device and tears everything down.
    pub fn shutdown(self) {
        drop(self);
    }

    pub fn connection(&self) -> &W::Connection {
        &self.connection
    }

    pub fn compositor(&self) -> &W::Compositor {
        self.capabilities.compositor()
    }

    pub fn shell(&self) -> Option<&W::Shell> {
        self.capabilities.shell()
    }

    pub fn surface(&self) -> &W::Surface {
        &self.surface
    }

    pub fn instance(&self) -> &G::Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> G::PhysicalDevice {
        self.physical_device
    }

    pub fn device(&self) -> &G::Device {
        &self.device
    }

    pub fn graphics_surface(&self) -> &G::Surface {
        &self.graphics_surface
    }

    pub fn swapchain(&self) -> &G::Swapchain {
        &self.swapchain
    }

    /// Features enabled on the logical device.
    pub fn features(&self) -> DeviceFeatures {
        self.features
    }

    pub fn swapchain_descriptor(&self) -> &SwapchainDescriptor {
        &self.descriptor
    }

    pub fn windowing(&self) -> &W {
        &self.windowing
    }

    pub fn physical_devices(&self) -> KindleResult<Vec<G::PhysicalDevice>> {
        self.graphics.enumerate_devices(&self.instance)
    }

    pub fn device_properties(&self, device: G::PhysicalDevice) -> DeviceProperties {
        self.graphics.device_properties(&self.instance, device)
    }

    pub fn queue_families(&self, device: G::PhysicalDevice) -> Vec<QueueFamily> {
        self.graphics.queue_families(&self.instance, device)
    }

    pub fn device_extensions(&self, device: G::PhysicalDevice) -> KindleResult<Vec<ExtensionProperties>> {
        self.graphics.device_extensions(&self.instance, device)
    }

    pub fn instance_layers(&self) -> KindleResult<Vec<LayerProperties>> {
        self.graphics.instance_layers()
    }

    pub fn instance_extensions(&self) -> KindleResult<Vec<ExtensionProperties>> {
        self.graphics.instance_extensions()
    }
}

impl<W: Windowing, G: Graphics> Drop for Presentation<W, G> {
    fn drop(&mut self) {
        info!("Shutting down presentation");
        self.wait_idle();
    }
}
