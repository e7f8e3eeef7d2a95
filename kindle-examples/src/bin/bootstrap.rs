use std::process::ExitCode;

use anyhow::Context;
use kindle_core::{BootstrapConfig, KindleError, Presentation, Windowing};
use kindle_vulkan::VulkanGraphics;
use kindle_wayland::WaylandClient;

fn exit_code(err: &KindleError) -> u8 {
    match err {
        KindleError::InvalidHandle { .. } => 2,
        KindleError::CapabilityNotFound { .. } => 3,
        KindleError::InstanceCreation { .. } => 4,
        KindleError::NoSuitableDevice => 5,
        KindleError::UnsupportedFeature { .. } => 6,
        KindleError::DeviceCreation { .. } => 7,
        KindleError::SurfaceCreation { .. } => 8,
        KindleError::SwapchainCreation { .. } => 9,
        KindleError::Query { .. } => 10,
        KindleError::Connection(_) => 11,
        KindleError::Protocol(_) => 12,
        KindleError::Config(_) => 13,
    }
}

fn print_report(presentation: &Presentation<WaylandClient, VulkanGraphics>) -> anyhow::Result<()> {
    for layer in presentation.instance_layers().context("listing instance layers")? {
        println!("layer {} ({}): {}", layer.name, layer.spec_version, layer.description);
    }
    for ext in presentation.instance_extensions().context("listing instance extensions")? {
        println!("instance extension {} v{}", ext.name, ext.spec_version);
    }

    for device in presentation.physical_devices().context("enumerating devices")? {
        let props = presentation.device_properties(device);
        println!("{}", props.api_version);
        println!("{}", props.driver_version);
        println!("{}", props.vendor_id);
        println!("{}", props.device_id);
        println!("{}", props.device_type);
        println!("{}", props.name);
        println!("{}", props.pipeline_cache_uuid_hex());
        println!("{:#?}", props.limits);
        if device == presentation.physical_device() {
            for family in presentation.queue_families(device) {
                println!("{:?}", family);
            }
            for ext in presentation.device_extensions(device).context("listing device extensions")? {
                println!("device extension {} v{}", ext.name, ext.spec_version);
            }
            println!("enabled {:?}", presentation.features());
        }
        println!("-------------------------------------------------------");
    }

    let desc = presentation.swapchain_descriptor();
    println!(
        "swapchain {}x{} x{} {:?} {:?}",
        desc.extent.width, desc.extent.height, desc.image_count, desc.format, desc.present_mode
    );
    Ok(())
}

fn run(config: &BootstrapConfig) -> Result<(), KindleError> {
    let mut windowing = WaylandClient::new();
    let graphics = VulkanGraphics::load()?;
    let connection = windowing.connect()?;
    let presentation = Presentation::bootstrap(windowing, graphics, connection, config)?;

    if let Err(e) = print_report(&presentation) {
        log::warn!("Diagnostics incomplete: {:#}", e);
    }

    presentation.shutdown();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Kindle bootstrap");

    let config = match std::env::args().nth(1) {
        Some(path) => BootstrapConfig::load(&path),
        None => Ok(BootstrapConfig::default()),
    };

    match config.and_then(|config| run(&config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}
