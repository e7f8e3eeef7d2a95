use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

use crate::registry::CapabilityCollector;
use crate::{KindleResult, NativeHandle, Owned};

/// Client side of a windowing-system connection.
pub trait Windowing {
    type Connection: NativeHandle;
    type Registry: NativeHandle;
    type Compositor: NativeHandle;
    type Shell: NativeHandle;
    type Surface: NativeHandle;

    /// Interface name of the global that manufactures surfaces.
    const COMPOSITOR_INTERFACE: &'static str;
    /// Interface name of the global providing top-level window semantics.
    const SHELL_INTERFACE: &'static str;

    /// Open the connection. The pipeline itself expects an already open one.
    fn connect(&mut self) -> KindleResult<Owned<Self::Connection>>;

    fn registry(&mut self, connection: &Self::Connection) -> KindleResult<Owned<Self::Registry>>;

    /// Block until the server has advertised its globals and acknowledged every
    /// bind request queued through `collector`.
    fn roundtrip(
        &mut self,
        connection: &Self::Connection,
        registry: &Self::Registry,
        collector: CapabilityCollector<Self::Compositor, Self::Shell>,
    ) -> KindleResult<CapabilityCollector<Self::Compositor, Self::Shell>>;

    fn create_surface(&mut self, compositor: &Self::Compositor) -> KindleResult<Owned<Self::Surface>>;

    /// Raw handles the graphics backend needs to wrap `surface`.
    fn raw_handles(
        &self,
        connection: &Self::Connection,
        surface: &Self::Surface,
    ) -> KindleResult<(RawDisplayHandle, RawWindowHandle)>;
}
