//! Discovery of windowing-system globals.
//!
//! A registry is created from the connection, a single blocking round trip
//! collects bind requests for every advertised global we care about, and the
//! registry is released again. What comes out is an immutable
//! [`Capabilities`] set whose handles outlive the registry.

use log::{info, warn};

use crate::{KindleError, KindleResult, Owned, Windowing};

/// Which bound slot an advertised interface fills.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Compositor,
    Shell,
}

/// Interface names to look for during discovery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilityRequest {
    pub compositor: &'static str,
    pub shell: &'static str,
    pub shell_required: bool,
}

impl CapabilityRequest {
    pub fn for_backend<W: Windowing>(shell_required: bool) -> Self {
        Self {
            compositor: W::COMPOSITOR_INTERFACE,
            shell: W::SHELL_INTERFACE,
            shell_required,
        }
    }

    pub fn classify(&self, interface: &str) -> Option<Capability> {
        if interface == self.compositor {
            Some(Capability::Compositor)
        } else if interface == self.shell {
            Some(Capability::Shell)
        } else {
            None
        }
    }
}

/// Bound globals, released newest first whatever order the server
/// advertised them in.
struct Bound<C, S> {
    compositor: Option<Owned<C>>,
    shell: Option<Owned<S>>,
    order: Vec<Capability>,
}

impl<C, S> Bound<C, S> {
    fn empty() -> Self {
        Self {
            compositor: None,
            shell: None,
            order: Vec::new(),
        }
    }
}

impl<C, S> Drop for Bound<C, S> {
    fn drop(&mut self) {
        while let Some(capability) = self.order.pop() {
            match capability {
                Capability::Compositor => drop(self.compositor.take()),
                Capability::Shell => drop(self.shell.take()),
            }
        }
    }
}

/// Accumulates bound globals while the round trip is in flight.
///
/// Backends feed every advertised interface name through [`wants`] and hand
/// the bound handle back through [`bind_compositor`] / [`bind_shell`]. Only the
/// first advertisement of each interface is bound.
///
/// [`wants`]: CapabilityCollector::wants
/// [`bind_compositor`]: CapabilityCollector::bind_compositor
/// [`bind_shell`]: CapabilityCollector::bind_shell
pub struct CapabilityCollector<C, S> {
    request: CapabilityRequest,
    bound: Bound<C, S>,
}

impl<C, S> CapabilityCollector<C, S> {
    pub fn new(request: CapabilityRequest) -> Self {
        Self {
            request,
            bound: Bound::empty(),
        }
    }

    pub fn wants(&self, interface: &str) -> Option<Capability> {
        match self.request.classify(interface)? {
            Capability::Compositor if self.bound.compositor.is_none() => Some(Capability::Compositor),
            Capability::Shell if self.bound.shell.is_none() => Some(Capability::Shell),
            _ => None,
        }
    }

    pub fn bind_compositor(&mut self, compositor: Owned<C>) {
        info!("Bound {}", self.request.compositor);
        if self.bound.compositor.replace(compositor).is_none() {
            self.bound.order.push(Capability::Compositor);
        }
    }

    pub fn bind_shell(&mut self, shell: Owned<S>) {
        info!("Bound {}", self.request.shell);
        if self.bound.shell.replace(shell).is_none() {
            self.bound.order.push(Capability::Shell);
        }
    }

    /// Transition to the bound state. Anything already bound is released if a
    /// required interface is missing.
    pub fn finish(self) -> KindleResult<Capabilities<C, S>> {
        let CapabilityCollector { request, bound } = self;

        if bound.compositor.is_none() {
            return Err(KindleError::CapabilityNotFound {
                interface: request.compositor,
            });
        }
        if bound.shell.is_none() {
            if request.shell_required {
                return Err(KindleError::CapabilityNotFound {
                    interface: request.shell,
                });
            }
            warn!("{} not advertised, continuing without a shell", request.shell);
        }

        Ok(Capabilities { bound })
    }
}

/// Globals bound by discovery. Always holds a compositor.
pub struct Capabilities<C, S> {
    bound: Bound<C, S>,
}

impl<C, S> Capabilities<C, S> {
    pub fn compositor(&self) -> &C {
        self.bound
            .compositor
            .as_deref()
            .unwrap_or_else(|| unreachable!("capabilities are only built with a compositor"))
    }

    pub fn shell(&self) -> Option<&S> {
        self.bound.shell.as_deref()
    }

    /// Capabilities in the order they were bound.
    pub fn bind_order(&self) -> &[Capability] {
        &self.bound.order
    }
}

/// Runs the discovery round trip against `connection`.
pub fn bind_capabilities<W: Windowing>(
    windowing: &mut W,
    connection: &W::Connection,
    request: CapabilityRequest,
) -> KindleResult<Capabilities<W::Compositor, W::Shell>> {
    let registry = windowing.registry(connection)?;
    let collector = windowing.roundtrip(connection, &registry, CapabilityCollector::new(request))?;
    registry.release();
    collector.finish()
}
