use std::ffi::{c_char, CStr, CString};

use ash::{vk, Entry};
use kindle_core::device::DeviceFeatures;
use kindle_core::diagnostics::{DeviceProperties, ExtensionProperties, LayerProperties, QueueFamily};
use kindle_core::swapchain::SwapchainDescriptor;
use kindle_core::{Graphics, InstanceDescriptor, KindleError, KindleResult, Owned, QueueRequest};
use log::{error, info, warn};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::{from_vk_version, to_vk_version, VulkanDevice, VulkanInstance, VulkanSurface, VulkanSwapchain};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan reached through the system loader.
pub struct VulkanGraphics {
    pub(crate) entry: Entry,
}

unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    let callback_data = unsafe { *p_callback_data };
    let message_id_number = callback_data.message_id_number;

    let message_id_name = if callback_data.p_message_id_name.is_null() {
        std::borrow::Cow::from("")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message_id_name).to_string_lossy() }
    };

    let message = if callback_data.p_message.is_null() {
        std::borrow::Cow::from("")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };

    let log_level = match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => log::Level::Debug,
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => log::Level::Info,
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::Level::Warn,
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => log::Level::Error,
        _ => log::Level::Info,
    };

    log::log!(
        log_level,
        "[Vulkan] {:?} [{} ({})]: {}",
        message_type,
        message_id_name,
        message_id_number,
        message
    );

    vk::FALSE
}

fn debug_messenger_info<'a>() -> vk::DebugUtilsMessengerCreateInfoEXT<'a> {
    vk::DebugUtilsMessengerCreateInfoEXT {
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        pfn_user_callback: Some(vulkan_debug_callback),
        ..Default::default()
    }
}

impl VulkanGraphics {
    /// Loads the Vulkan loader library.
    pub fn load() -> KindleResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| {
            error!("Failed to load Vulkan entry: {}", e);
            KindleError::InstanceCreation {
                status: vk::Result::ERROR_INITIALIZATION_FAILED.as_raw(),
            }
        })?;
        Ok(Self { entry })
    }

    fn layer_available(&self, name: &CStr) -> bool {
        let layers = unsafe { self.entry.enumerate_instance_layer_properties() }.unwrap_or_default();
        layers.iter().any(|l| l.layer_name_as_c_str().is_ok_and(|n| n == name))
    }

    fn extension_available(&self, name: &CStr) -> bool {
        let extensions = unsafe { self.entry.enumerate_instance_extension_properties(None) }.unwrap_or_default();
        extensions.iter().any(|e| e.extension_name_as_c_str().is_ok_and(|n| n == name))
    }

    fn new_instance(&self, descriptor: &InstanceDescriptor) -> KindleResult<Owned<VulkanInstance>> {
        let invalid = |_| KindleError::InstanceCreation {
            status: vk::Result::ERROR_INITIALIZATION_FAILED.as_raw(),
        };
        let app = descriptor.application;
        let app_name = CString::new(app.name.as_str()).map_err(invalid)?;
        let engine_name = CString::new(app.engine_name.as_str()).map_err(invalid)?;

        let app_info = vk::ApplicationInfo {
            p_application_name: app_name.as_ptr(),
            application_version: to_vk_version(app.version),
            p_engine_name: engine_name.as_ptr(),
            engine_version: to_vk_version(app.engine_version),
            api_version: to_vk_version(app.api_version),
            ..Default::default()
        };

        let mut extension_names = descriptor
            .extensions
            .iter()
            .map(|e| CString::new(e.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let mut layer_names: Vec<&CStr> = Vec::new();
        let mut debug_utils = false;
        if descriptor.validation {
            if self.layer_available(VALIDATION_LAYER) {
                layer_names.push(VALIDATION_LAYER);
            } else {
                warn!("{:?} not available, continuing without validation", VALIDATION_LAYER);
            }
            if self.extension_available(ash::ext::debug_utils::NAME) {
                extension_names.push(ash::ext::debug_utils::NAME.to_owned());
                debug_utils = true;
            }
        }

        let extension_ptrs: Vec<*const c_char> = extension_names.iter().map(|n| n.as_ptr()).collect();
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|n| n.as_ptr()).collect();

        let mut debug_create_info = debug_messenger_info();
        let mut create_info = vk::InstanceCreateInfo {
            p_application_info: &app_info,
            pp_enabled_extension_names: extension_ptrs.as_ptr(),
            enabled_extension_count: extension_ptrs.len() as u32,
            pp_enabled_layer_names: layer_ptrs.as_ptr(),
            enabled_layer_count: layer_ptrs.len() as u32,
            ..Default::default()
        };
        if debug_utils {
            create_info = create_info.push_next(&mut debug_create_info);
        }

        let instance = unsafe {
            self.entry.create_instance(&create_info, None).map_err(|e| {
                error!("Instance creation error: {:?}", e);
                KindleError::InstanceCreation { status: e.as_raw() }
            })?
        };

        let messenger = if debug_utils {
            let loader = ash::ext::debug_utils::Instance::new(&self.entry, &instance);
            match unsafe { loader.create_debug_utils_messenger(&debug_messenger_info(), None) } {
                Ok(messenger) => Some((loader, messenger)),
                Err(e) => {
                    warn!("Failed to create debug messenger: {:?}", e);
                    None
                }
            }
        } else {
            None
        };

        info!("Vulkan Instance created successfully");

        Owned::new(VulkanInstance(instance), move |instance: VulkanInstance| unsafe {
            if let Some((loader, messenger)) = messenger {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            info!("Destroying Vulkan Instance");
            instance.destroy_instance(None);
        })
    }
}

impl Graphics for VulkanGraphics {
    type Instance = VulkanInstance;
    type PhysicalDevice = vk::PhysicalDevice;
    type Surface = VulkanSurface;
    type Device = VulkanDevice;
    type Swapchain = VulkanSwapchain;

    fn platform_extensions(&self, display: RawDisplayHandle) -> KindleResult<Vec<String>> {
        let names = ash_window::enumerate_required_extensions(display).map_err(|e| {
            error!("No surface extensions for {:?}: {:?}", display, e);
            KindleError::InstanceCreation { status: e.as_raw() }
        })?;
        Ok(names
            .iter()
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
            .collect())
    }

    fn create_instance(&mut self, descriptor: &InstanceDescriptor) -> KindleResult<Owned<VulkanInstance>> {
        self.new_instance(descriptor)
    }

    fn enumerate_devices(&self, instance: &VulkanInstance) -> KindleResult<Vec<vk::PhysicalDevice>> {
        unsafe { instance.enumerate_physical_devices() }.map_err(|e| KindleError::Query {
            what: "vkEnumeratePhysicalDevices",
            status: e.as_raw(),
        })
    }

    fn device_features(&self, instance: &VulkanInstance, device: vk::PhysicalDevice) -> DeviceFeatures {
        self.supported_features(instance, device)
    }

    fn create_device(
        &mut self,
        instance: &VulkanInstance,
        device: vk::PhysicalDevice,
        features: &DeviceFeatures,
        queues: &[QueueRequest],
    ) -> KindleResult<Owned<VulkanDevice>> {
        self.new_device(instance, device, features, queues)
    }

    fn create_surface(
        &mut self,
        instance: &VulkanInstance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> KindleResult<Owned<VulkanSurface>> {
        self.new_surface(instance, display, window)
    }

    fn create_swapchain(
        &mut self,
        instance: &VulkanInstance,
        physical_device: vk::PhysicalDevice,
        device: &VulkanDevice,
        surface: &VulkanSurface,
        descriptor: &SwapchainDescriptor,
    ) -> KindleResult<Owned<VulkanSwapchain>> {
        self.new_swapchain(instance, physical_device, device, surface.0, descriptor)
    }

    fn wait_idle(&mut self, device: &VulkanDevice) -> Result<(), i32> {
        unsafe { device.device_wait_idle() }.map_err(|e| e.as_raw())
    }

    fn device_properties(&self, instance: &VulkanInstance, device: vk::PhysicalDevice) -> DeviceProperties {
        self.properties(instance, device)
    }

    fn queue_families(&self, instance: &VulkanInstance, device: vk::PhysicalDevice) -> Vec<QueueFamily> {
        self.families(instance, device)
    }

    fn device_extensions(
        &self,
        instance: &VulkanInstance,
        device: vk::PhysicalDevice,
    ) -> KindleResult<Vec<ExtensionProperties>> {
        let props = unsafe { instance.enumerate_device_extension_properties(device) }.map_err(|e| {
            KindleError::Query {
                what: "vkEnumerateDeviceExtensionProperties",
                status: e.as_raw(),
            }
        })?;
        Ok(props.iter().map(extension_record).collect())
    }

    fn instance_layers(&self) -> KindleResult<Vec<LayerProperties>> {
        let layers = unsafe { self.entry.enumerate_instance_layer_properties() }.map_err(|e| KindleError::Query {
            what: "vkEnumerateInstanceLayerProperties",
            status: e.as_raw(),
        })?;
        Ok(layers
            .iter()
            .map(|l| LayerProperties {
                name: c_str_lossy(l.layer_name_as_c_str()),
                spec_version: from_vk_version(l.spec_version),
                implementation_version: l.implementation_version,
                description: c_str_lossy(l.description_as_c_str()),
            })
            .collect())
    }

    fn instance_extensions(&self) -> KindleResult<Vec<ExtensionProperties>> {
        let props = unsafe { self.entry.enumerate_instance_extension_properties(None) }.map_err(|e| {
            KindleError::Query {
                what: "vkEnumerateInstanceExtensionProperties",
                status: e.as_raw(),
            }
        })?;
        Ok(props.iter().map(extension_record).collect())
    }
}

pub(crate) fn c_str_lossy(name: Result<&CStr, std::ffi::FromBytesUntilNulError>) -> String {
    name.map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}

fn extension_record(e: &vk::ExtensionProperties) -> ExtensionProperties {
    ExtensionProperties {
        name: c_str_lossy(e.extension_name_as_c_str()),
        spec_version: e.spec_version,
    }
}
