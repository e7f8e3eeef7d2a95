use kindle_core::registry::{Capability, CapabilityCollector};
use kindle_core::{KindleError, KindleResult, Owned};
use log::{debug, info, warn};
use wayland_client::protocol::{wl_compositor, wl_registry, wl_surface};
use wayland_client::{delegate_noop, Connection, Dispatch, QueueHandle};
use wayland_protocols::xdg::shell::client::xdg_wm_base;

use crate::WlObject;

type Collector = CapabilityCollector<WlObject<wl_compositor::WlCompositor>, WlObject<xdg_wm_base::XdgWmBase>>;

/// Highest protocol versions this crate speaks.
const COMPOSITOR_VERSION: u32 = 4;
const SHELL_VERSION: u32 = 1;

/// Event queue state. It carries the collector only for the duration of the
/// discovery round trip.
pub struct Discovery {
    collector: Option<Collector>,
}

impl Discovery {
    pub(crate) fn new(collector: Collector) -> Self {
        Self {
            collector: Some(collector),
        }
    }

    pub(crate) fn into_collector(mut self) -> KindleResult<Collector> {
        self.collector
            .take()
            .ok_or_else(|| KindleError::Protocol("discovery state lost its collector".into()))
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for Discovery {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        let wl_registry::Event::Global { name, interface, version } = event else {
            return;
        };
        debug!("Global {} advertised: {} v{}", name, interface, version);
        let Some(collector) = state.collector.as_mut() else {
            return;
        };

        match collector.wants(&interface) {
            Some(Capability::Compositor) => {
                let compositor =
                    registry.bind::<wl_compositor::WlCompositor, _, _>(name, version.min(COMPOSITOR_VERSION), qh, ());
                // wl_compositor has no destructor request.
                match Owned::new(WlObject(compositor), drop) {
                    Ok(compositor) => collector.bind_compositor(compositor),
                    Err(e) => warn!("{}", e),
                }
            }
            Some(Capability::Shell) => {
                let shell = registry.bind::<xdg_wm_base::XdgWmBase, _, _>(name, version.min(SHELL_VERSION), qh, ());
                let release = |shell: WlObject<xdg_wm_base::XdgWmBase>| {
                    info!("Destroying xdg_wm_base");
                    shell.destroy();
                };
                match Owned::new(WlObject(shell), release) {
                    Ok(shell) => collector.bind_shell(shell),
                    Err(e) => warn!("{}", e),
                }
            }
            None => {}
        }
    }
}

impl Dispatch<xdg_wm_base::XdgWmBase, ()> for Discovery {
    fn event(
        _: &mut Self,
        shell: &xdg_wm_base::XdgWmBase,
        event: xdg_wm_base::Event,
        _: &(),
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            shell.pong(serial);
        }
    }
}

delegate_noop!(Discovery: wl_compositor::WlCompositor);
delegate_noop!(Discovery: ignore wl_surface::WlSurface);
