use log::info;
use serde::Deserialize;

use crate::{Graphics, KindleResult, Owned, Windowing};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceFormat {
    Rgba8Unorm,
    Rgba8Srgb,
    Bgra8Unorm,
    Bgra8Srgb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    SrgbNonlinear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentMode {
    Immediate,
    Mailbox,
    Fifo,
    FifoRelaxed,
}

/// Parameters of the one fixed-size swapchain created for the process.
///
/// Sharing mode (exclusive), composite alpha (opaque), pre-transform (the
/// surface's current one) and clipping (enabled) are not configurable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainDescriptor {
    pub extent: Extent2D,
    pub image_count: u32,
    pub format: SurfaceFormat,
    pub color_space: ColorSpace,
    pub present_mode: PresentMode,
}

/// Wraps the windowing-system `surface` for `instance`.
pub fn create_graphics_surface<W: Windowing, G: Graphics>(
    windowing: &W,
    graphics: &mut G,
    instance: &G::Instance,
    connection: &W::Connection,
    surface: &W::Surface,
) -> KindleResult<Owned<G::Surface>> {
    let (display, window) = windowing.raw_handles(connection, surface)?;
    graphics.create_surface(instance, display, window)
}

pub fn create_swapchain<G: Graphics>(
    graphics: &mut G,
    instance: &G::Instance,
    physical_device: G::PhysicalDevice,
    device: &G::Device,
    surface: &G::Surface,
    descriptor: &SwapchainDescriptor,
) -> KindleResult<Owned<G::Swapchain>> {
    info!(
        "Creating swapchain {}x{} with {} images, {:?}/{:?}, {:?}",
        descriptor.extent.width,
        descriptor.extent.height,
        descriptor.image_count,
        descriptor.format,
        descriptor.color_space,
        descriptor.present_mode,
    );
    graphics.create_swapchain(instance, physical_device, device, surface, descriptor)
}
