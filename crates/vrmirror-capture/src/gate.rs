//! Process-wide VR runtime connection.
//!
//! The runtime allows one connection per process, and shutting it down
//! invalidates everything obtained through it. Sources share one
//! [`RuntimeGate`]; at most one [`RuntimeLease`] exists at a time, and only
//! the lease holder ever shuts the runtime down.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;
use vrmirror_core::CaptureError;

use crate::backend::{MirrorBackend, RuntimeEvent};

pub struct RuntimeGate<B: MirrorBackend> {
    backend: B,
    held:    Cell<bool>,
}

impl<B: MirrorBackend> RuntimeGate<B> {
    pub fn new(backend: B) -> Rc<Self> {
        Rc::new(Self { backend, held: Cell::new(false) })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Is some session currently connected through this gate?
    pub fn is_held(&self) -> bool {
        self.held.get()
    }

    /// Connect to the runtime and take exclusive ownership of the connection.
    pub fn acquire(self: &Rc<Self>) -> Result<RuntimeLease<B>, CaptureError> {
        if self.held.get() {
            return Err(CaptureError::RuntimeBusy);
        }
        self.backend.connect()?;
        self.held.set(true);
        debug!("VR runtime connected");
        Ok(RuntimeLease { gate: Rc::clone(self), released: false })
    }
}

/// Ownership of the runtime connection. Shuts the runtime down exactly once,
/// on [`RuntimeLease::release`] or drop.
pub struct RuntimeLease<B: MirrorBackend> {
    gate:     Rc<RuntimeGate<B>>,
    released: bool,
}

impl<B: MirrorBackend> RuntimeLease<B> {
    pub fn system_available(&self) -> bool {
        !self.released && self.gate.backend.system_available()
    }

    pub fn poll_event(&self) -> Option<RuntimeEvent> {
        if self.released {
            return None;
        }
        self.gate.backend.poll_event()
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.gate.backend.shutdown();
        self.gate.held.set(false);
        debug!("VR runtime shut down");
    }
}

impl<B: MirrorBackend> Drop for RuntimeLease<B> {
    fn drop(&mut self) {
        self.release();
    }
}
