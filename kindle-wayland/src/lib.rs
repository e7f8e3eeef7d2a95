//! Wayland client side of the bootstrap, on top of the system libwayland so
//! raw `wl_display`/`wl_surface` pointers can be handed to Vulkan.

mod discovery;

pub use discovery::Discovery;

use std::cell::RefCell;
use std::ffi::c_void;
use std::ops::Deref;
use std::ptr::NonNull;
use std::rc::Rc;

use kindle_core::registry::CapabilityCollector;
use kindle_core::{KindleError, KindleResult, NativeHandle, Owned, Windowing};
use log::{error, info};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, WaylandDisplayHandle, WaylandWindowHandle};
use wayland_client::protocol::{wl_compositor::WlCompositor, wl_registry::WlRegistry, wl_surface::WlSurface};
use wayland_client::{Connection, EventQueue, Proxy};
use wayland_protocols::xdg::shell::client::xdg_wm_base::XdgWmBase;

/// An open display connection.
pub struct WaylandConnection(pub Connection);

impl NativeHandle for WaylandConnection {
    fn is_null(&self) -> bool {
        self.0.backend().display_ptr().is_null()
    }
}

impl Deref for WaylandConnection {
    type Target = Connection;
    fn deref(&self) -> &Connection {
        &self.0
    }
}

/// A protocol object created on the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WlObject<P>(pub P);

impl<P: Proxy> NativeHandle for WlObject<P> {
    fn is_null(&self) -> bool {
        self.0.id().is_null()
    }
}

impl<P> Deref for WlObject<P> {
    type Target = P;
    fn deref(&self) -> &P {
        &self.0
    }
}

type SharedQueue = Rc<RefCell<Option<EventQueue<Discovery>>>>;

/// Windowing backend talking to the compositor named by `WAYLAND_DISPLAY`.
///
/// The event queue keeps its own reference to the connection, so it is
/// shared with the connection's release function and dropped there.
#[derive(Default)]
pub struct WaylandClient {
    queue: SharedQueue,
}

impl WaylandClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue_missing() -> KindleError {
        KindleError::Protocol("no registry has been created on this client".into())
    }
}

/// Drops every reference to the display so libwayland disconnects.
fn disconnect(queue: &SharedQueue, connection: Connection) {
    if let Err(e) = connection.flush() {
        error!("Failed to flush Wayland connection: {}", e);
    }
    queue.borrow_mut().take();
    drop(connection);
    info!("Disconnected from Wayland display");
}

impl Windowing for WaylandClient {
    type Connection = WaylandConnection;
    type Registry = WlObject<WlRegistry>;
    type Compositor = WlObject<WlCompositor>;
    type Shell = WlObject<XdgWmBase>;
    type Surface = WlObject<WlSurface>;

    const COMPOSITOR_INTERFACE: &'static str = "wl_compositor";
    const SHELL_INTERFACE: &'static str = "xdg_wm_base";

    fn connect(&mut self) -> KindleResult<Owned<WaylandConnection>> {
        let connection = Connection::connect_to_env().map_err(|e| {
            error!("Failed to connect to the Wayland display: {}", e);
            KindleError::Connection(e.to_string())
        })?;
        info!("Connected to Wayland display");
        let queue = Rc::clone(&self.queue);
        Owned::new(WaylandConnection(connection), move |connection: WaylandConnection| {
            disconnect(&queue, connection.0)
        })
    }

    fn registry(&mut self, connection: &WaylandConnection) -> KindleResult<Owned<WlObject<WlRegistry>>> {
        let queue = connection.new_event_queue();
        let registry = connection.display().get_registry(&queue.handle(), ());
        *self.queue.borrow_mut() = Some(queue);
        // wl_registry has no destructor request; dropping the proxy is all there is.
        Owned::new(WlObject(registry), drop)
    }

    fn roundtrip(
        &mut self,
        _connection: &WaylandConnection,
        _registry: &WlObject<WlRegistry>,
        collector: CapabilityCollector<WlObject<WlCompositor>, WlObject<XdgWmBase>>,
    ) -> KindleResult<CapabilityCollector<WlObject<WlCompositor>, WlObject<XdgWmBase>>> {
        let mut slot = self.queue.borrow_mut();
        let queue = slot.as_mut().ok_or_else(Self::queue_missing)?;
        let mut discovery = Discovery::new(collector);
        queue.roundtrip(&mut discovery).map_err(|e| {
            error!("Registry round trip failed: {}", e);
            KindleError::Protocol(e.to_string())
        })?;
        discovery.into_collector()
    }

    fn create_surface(&mut self, compositor: &WlObject<WlCompositor>) -> KindleResult<Owned<WlObject<WlSurface>>> {
        let qh = self
            .queue
            .borrow()
            .as_ref()
            .map(EventQueue::handle)
            .ok_or_else(Self::queue_missing)?;
        let surface = compositor.create_surface(&qh, ());
        Owned::new(WlObject(surface), |surface: WlObject<WlSurface>| {
            info!("Destroying Wayland surface");
            surface.destroy();
        })
    }

    fn raw_handles(
        &self,
        connection: &WaylandConnection,
        surface: &WlObject<WlSurface>,
    ) -> KindleResult<(RawDisplayHandle, RawWindowHandle)> {
        let display = NonNull::new(connection.backend().display_ptr().cast::<c_void>())
            .ok_or(KindleError::InvalidHandle { handle: "wl_display" })?;
        let window = NonNull::new(surface.id().as_ptr().cast::<c_void>())
            .ok_or(KindleError::InvalidHandle { handle: "wl_surface" })?;
        Ok((
            RawDisplayHandle::Wayland(WaylandDisplayHandle::new(display)),
            RawWindowHandle::Wayland(WaylandWindowHandle::new(window)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindle_core::registry::{Capability, CapabilityRequest};

    #[test]
    fn discovery_looks_for_core_and_xdg_globals() {
        let request = CapabilityRequest::for_backend::<WaylandClient>(false);
        assert_eq!(request.classify("wl_compositor"), Some(Capability::Compositor));
        assert_eq!(request.classify("xdg_wm_base"), Some(Capability::Shell));
        assert_eq!(request.classify("wl_shell"), None);
    }

    #[test]
    fn discovery_state_hands_its_collector_back() {
        let request = CapabilityRequest::for_backend::<WaylandClient>(false);
        let collector = Discovery::new(CapabilityCollector::new(request)).into_collector().unwrap();
        assert_eq!(collector.wants("wl_compositor"), Some(Capability::Compositor));
    }

    #[test]
    fn surface_requires_a_registry_first() {
        let client = WaylandClient::new();
        assert!(client.queue.borrow().is_none());
        assert!(matches!(WaylandClient::queue_missing(), KindleError::Protocol(_)));
    }

    // Needs a running compositor; returns early without one.
    #[test]
    fn releasing_the_connection_drops_the_event_queue() {
        let mut client = WaylandClient::new();
        let Ok(connection) = client.connect() else {
            return;
        };
        let registry = client.registry(&connection).unwrap();
        assert!(client.queue.borrow().is_some());

        drop(registry);
        connection.release();
        assert!(client.queue.borrow().is_none());
    }
}
