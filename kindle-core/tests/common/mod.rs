//! Instrumented in-memory backends.
//!
//! Every handle creation and release is appended to a shared trace so tests
//! can check ordering, and the graphics backend can be told to fail specific
//! native calls.

#![allow(dead_code)]

use std::cell::RefCell;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::rc::Rc;

use kindle_core::device::DeviceFeatures;
use kindle_core::diagnostics::{
    DeviceLimits, DeviceProperties, DeviceType, ExtensionProperties, LayerProperties, QueueFamily,
};
use kindle_core::registry::{Capability, CapabilityCollector};
use kindle_core::swapchain::SwapchainDescriptor;
use kindle_core::{
    Graphics, InstanceDescriptor, KindleError, KindleResult, NativeHandle, Owned, QueueRequest, Version,
    Windowing,
};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle(pub u64);

impl NativeHandle for Handle {
    fn is_null(&self) -> bool {
        self.0 == 0
    }
}

#[derive(Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<String>>>);

impl Trace {
    pub fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.filtered("create:")
    }

    pub fn released(&self) -> Vec<String> {
        self.filtered("release:")
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    fn filtered(&self, prefix: &str) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    /// Handles are released in strict last-in-first-out order, ignoring
    /// `transient` names that may be released out of band.
    pub fn assert_lifo(&self, transient: &[&str]) {
        let mut live: Vec<String> = Vec::new();
        for entry in self.entries() {
            if let Some(name) = entry.strip_prefix("create:") {
                if !transient.contains(&name) {
                    live.push(name.to_string());
                }
            } else if let Some(name) = entry.strip_prefix("release:") {
                if transient.contains(&name) {
                    continue;
                }
                assert_eq!(live.pop().as_deref(), Some(name), "out of order release in {:?}", self.entries());
            }
        }
        assert!(live.is_empty(), "never released: {:?}", live);
    }

    pub fn owned(&self, name: &'static str, raw: u64) -> KindleResult<Owned<Handle>> {
        let sink = self.clone();
        let handle = Owned::new(Handle(raw), move |_| sink.push(format!("release:{name}")))?;
        self.push(format!("create:{name}"));
        Ok(handle)
    }
}

pub struct MockWindowing {
    pub trace: Trace,
    pub advertised: Vec<&'static str>,
    pub surface_raw: u64,
}

impl MockWindowing {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            advertised: vec!["wl_shm", "wl_compositor", "wl_seat"],
            surface_raw: 0x5u64,
        }
    }
}

impl Windowing for MockWindowing {
    type Connection = Handle;
    type Registry = Handle;
    type Compositor = Handle;
    type Shell = Handle;
    type Surface = Handle;

    const COMPOSITOR_INTERFACE: &'static str = "wl_compositor";
    const SHELL_INTERFACE: &'static str = "xdg_wm_base";

    fn connect(&mut self) -> KindleResult<Owned<Handle>> {
        self.trace.owned("connection", 1)
    }

    fn registry(&mut self, _connection: &Handle) -> KindleResult<Owned<Handle>> {
        self.trace.owned("registry", 2)
    }

    fn roundtrip(
        &mut self,
        _connection: &Handle,
        _registry: &Handle,
        mut collector: CapabilityCollector<Handle, Handle>,
    ) -> KindleResult<CapabilityCollector<Handle, Handle>> {
        for interface in self.advertised.clone() {
            match collector.wants(interface) {
                Some(Capability::Compositor) => collector.bind_compositor(self.trace.owned("compositor", 3)?),
                Some(Capability::Shell) => collector.bind_shell(self.trace.owned("shell", 4)?),
                None => {}
            }
        }
        Ok(collector)
    }

    fn create_surface(&mut self, _compositor: &Handle) -> KindleResult<Owned<Handle>> {
        self.trace.owned("surface", self.surface_raw)
    }

    fn raw_handles(&self, _connection: &Handle, _surface: &Handle) -> KindleResult<(RawDisplayHandle, RawWindowHandle)> {
        Ok((
            RawDisplayHandle::Wayland(WaylandDisplayHandle::new(NonNull::<c_void>::dangling())),
            RawWindowHandle::Wayland(WaylandWindowHandle::new(NonNull::<c_void>::dangling())),
        ))
    }
}

pub fn full_features() -> DeviceFeatures {
    DeviceFeatures {
        geometry_shader: true,
        tessellation_shader: true,
        multi_draw_indirect: true,
    }
}

/// What the graphics backend saw, readable after it has been moved into a
/// presentation.
#[derive(Default)]
pub struct Observed {
    pub instance_extensions: Vec<String>,
    pub device_create_calls: u32,
    pub feature_queries: u32,
    pub enabled_features: Option<DeviceFeatures>,
    pub queues: Vec<QueueRequest>,
    pub swapchain: Option<SwapchainDescriptor>,
    pub idle_calls: u32,
}

pub struct MockGraphics {
    pub trace: Trace,
    pub observed: Rc<RefCell<Observed>>,
    pub devices: Vec<DeviceFeatures>,
    pub fail_instance: Option<i32>,
    pub fail_surface: Option<i32>,
    pub fail_device: Option<i32>,
    pub fail_swapchain: Option<i32>,
    /// Graphics object whose native call hands back a null handle.
    pub null_object: Option<&'static str>,
    /// Idle queries that fail before one succeeds.
    pub idle_failures: u32,
}

impl MockGraphics {
    pub fn new(trace: &Trace) -> Self {
        Self {
            trace: trace.clone(),
            observed: Rc::default(),
            devices: vec![full_features()],
            fail_instance: None,
            fail_surface: None,
            fail_device: None,
            fail_swapchain: None,
            null_object: None,
            idle_failures: 0,
        }
    }
}

impl MockGraphics {
    fn owned(&self, name: &'static str, raw: u64) -> KindleResult<Owned<Handle>> {
        let raw = if self.null_object == Some(name) { 0 } else { raw };
        self.trace.owned(name, raw)
    }
}

impl Graphics for MockGraphics {
    type Instance = Handle;
    type PhysicalDevice = usize;
    type Surface = Handle;
    type Device = Handle;
    type Swapchain = Handle;

    fn platform_extensions(&self, display: RawDisplayHandle) -> KindleResult<Vec<String>> {
        match display {
            RawDisplayHandle::Wayland(_) => Ok(vec!["VK_KHR_surface".into(), "VK_KHR_wayland_surface".into()]),
            _ => Err(KindleError::InstanceCreation { status: -7 }),
        }
    }

    fn create_instance(&mut self, descriptor: &InstanceDescriptor) -> KindleResult<Owned<Handle>> {
        self.observed.borrow_mut().instance_extensions = descriptor.extensions.to_vec();
        if let Some(status) = self.fail_instance {
            return Err(KindleError::InstanceCreation { status });
        }
        self.owned("instance", 10)
    }

    fn enumerate_devices(&self, _instance: &Handle) -> KindleResult<Vec<usize>> {
        Ok((0..self.devices.len()).collect())
    }

    fn device_features(&self, _instance: &Handle, device: usize) -> DeviceFeatures {
        self.observed.borrow_mut().feature_queries += 1;
        self.devices[device]
    }

    fn create_device(
        &mut self,
        _instance: &Handle,
        _device: usize,
        features: &DeviceFeatures,
        queues: &[QueueRequest],
    ) -> KindleResult<Owned<Handle>> {
        {
            let mut observed = self.observed.borrow_mut();
            observed.device_create_calls += 1;
            observed.enabled_features = Some(*features);
            observed.queues = queues.to_vec();
        }
        if let Some(status) = self.fail_device {
            return Err(KindleError::DeviceCreation { status });
        }
        self.owned("device", 11)
    }

    fn create_surface(
        &mut self,
        _instance: &Handle,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> KindleResult<Owned<Handle>> {
        if let Some(status) = self.fail_surface {
            return Err(KindleError::SurfaceCreation { status });
        }
        self.owned("graphics_surface", 12)
    }

    fn create_swapchain(
        &mut self,
        _instance: &Handle,
        _physical_device: usize,
        _device: &Handle,
        _surface: &Handle,
        descriptor: &SwapchainDescriptor,
    ) -> KindleResult<Owned<Handle>> {
        self.observed.borrow_mut().swapchain = Some(*descriptor);
        if let Some(status) = self.fail_swapchain {
            return Err(KindleError::SwapchainCreation { status });
        }
        self.owned("swapchain", 13)
    }

    fn wait_idle(&mut self, _device: &Handle) -> Result<(), i32> {
        self.observed.borrow_mut().idle_calls += 1;
        if self.idle_failures > 0 {
            self.idle_failures -= 1;
            self.trace.push("idle:err".into());
            return Err(-4);
        }
        self.trace.push("idle:ok".into());
        Ok(())
    }

    fn device_properties(&self, _instance: &Handle, device: usize) -> DeviceProperties {
        DeviceProperties {
            name: format!("Mock Device {device}"),
            device_type: DeviceType::DiscreteGpu,
            api_version: Version::new(1, 3, 0),
            driver_version: 1,
            vendor_id: 0x10de,
            device_id: device as u32,
            pipeline_cache_uuid: [0; 16],
            limits: DeviceLimits {
                max_image_dimension_2d: 16384,
                max_framebuffer_width: 16384,
                max_framebuffer_height: 16384,
                max_viewports: 16,
                max_color_attachments: 8,
                max_bound_descriptor_sets: 32,
                max_push_constants_size: 256,
                max_memory_allocation_count: 4096,
            },
        }
    }

    fn queue_families(&self, _instance: &Handle, _device: usize) -> Vec<QueueFamily> {
        vec![QueueFamily {
            index: 0,
            queue_count: 16,
            graphics: true,
            compute: true,
            transfer: true,
        }]
    }

    fn device_extensions(&self, _instance: &Handle, _device: usize) -> KindleResult<Vec<ExtensionProperties>> {
        Ok(vec![ExtensionProperties {
            name: "VK_KHR_swapchain".into(),
            spec_version: 70,
        }])
    }

    fn instance_layers(&self) -> KindleResult<Vec<LayerProperties>> {
        Ok(Vec::new())
    }

    fn instance_extensions(&self) -> KindleResult<Vec<ExtensionProperties>> {
        Ok(vec![ExtensionProperties {
            name: "VK_KHR_wayland_surface".into(),
            spec_version: 6,
        }])
    }
}
