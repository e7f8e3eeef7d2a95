use std::fmt;
use std::ops::Deref;

use log::trace;

use crate::{KindleError, KindleResult};

/// A value naming a native object that may come back null from its constructor.
pub trait NativeHandle {
    fn is_null(&self) -> bool;
}

impl<T> NativeHandle for *mut T {
    fn is_null(&self) -> bool {
        <*mut T>::is_null(*self)
    }
}

impl<T> NativeHandle for *const T {
    fn is_null(&self) -> bool {
        <*const T>::is_null(*self)
    }
}

/// Exclusive owner of one native handle.
///
/// The release function runs exactly once, either when the owner is dropped or
/// on an explicit [`Owned::release`]. Ownership only moves by moving the
/// `Owned` itself; there is no `Clone`.
pub struct Owned<H> {
    handle: Option<H>,
    release: Option<Box<dyn FnOnce(H)>>,
}

impl<H: NativeHandle> Owned<H> {
    /// Takes ownership of `handle`. A null handle is rejected and `release` is
    /// dropped without being called.
    pub fn new(handle: H, release: impl FnOnce(H) + 'static) -> KindleResult<Self> {
        if handle.is_null() {
            return Err(KindleError::InvalidHandle {
                handle: std::any::type_name::<H>(),
            });
        }
        Ok(Self {
            handle: Some(handle),
            release: Some(Box::new(release)),
        })
    }
}

impl<H> Owned<H> {
    pub fn get(&self) -> &H {
        // Only `release`/`into_inner` empty the slot, and both consume `self`.
        self.handle.as_ref().unwrap_or_else(|| unreachable!("owned handle already released"))
    }

    /// Releases the handle now instead of at end of scope.
    pub fn release(mut self) {
        self.release_now();
    }

    /// Gives up ownership without running the release function.
    pub fn into_inner(mut self) -> H {
        self.release = None;
        self.handle.take().unwrap_or_else(|| unreachable!("owned handle already released"))
    }

    fn release_now(&mut self) {
        if let (Some(handle), Some(release)) = (self.handle.take(), self.release.take()) {
            trace!("Releasing {}", std::any::type_name::<H>());
            release(handle);
        }
    }
}

impl<H> Deref for Owned<H> {
    type Target = H;
    fn deref(&self) -> &H {
        self.get()
    }
}

impl<H> Drop for Owned<H> {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl<H: fmt::Debug> fmt::Debug for Owned<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&self.handle).finish()
    }
}
