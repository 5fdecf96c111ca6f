//! Runtime and event loop integration.
//!
//! Transport threads (the wire protocol layer, the core's surface
//! notifications, signal handlers) never touch [`ShellEngine`] directly.
//! They push [`ShellInput`] values onto a shared [`InputQueue`]; the control
//! thread drains it with [`Runtime::poll`], which serializes everything onto
//! the engine and hands back the events it emitted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::shell::{ShellEngine, ShellEvent, ShellInput};

// ============================================================================
// Input Queue
// ============================================================================

/// Inputs waiting for the control thread
#[derive(Debug, Default)]
pub struct InputQueue {
    inputs: Mutex<VecDeque<ShellInput>>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // A pusher that panicked mid-push cannot leave a half-written VecDeque
    // behind, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<ShellInput>> {
        self.inputs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue an input for the control thread
    pub fn push(&self, input: ShellInput) {
        self.lock().push_back(input);
    }

    /// Take all pending inputs in arrival order
    pub fn take_all(&self) -> Vec<ShellInput> {
        self.lock().drain(..).collect()
    }

    pub fn has_inputs(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// ============================================================================
// Main Runtime
// ============================================================================

/// Serializes inputs from any thread onto a single engine.
///
/// Hosts should:
/// 1. Hand [`Runtime::queue`] clones to transport threads
/// 2. Call [`Runtime::poll`] from the control thread
/// 3. Forward the returned events to clients and the renderer
#[derive(Debug, Default)]
pub struct Runtime {
    queue: Arc<InputQueue>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle for producers on other threads
    pub fn queue(&self) -> Arc<InputQueue> {
        Arc::clone(&self.queue)
    }

    pub fn push(&self, input: ShellInput) {
        self.queue.push(input);
    }

    /// Drain pending inputs into the engine (non-blocking).
    pub fn poll(&self, engine: &mut ShellEngine) -> Vec<ShellEvent> {
        let inputs = self.queue.take_all();
        if !inputs.is_empty() {
            tracing::trace!("Dispatching {} queued input(s)", inputs.len());
        }
        for input in inputs {
            engine.handle(input);
        }
        engine.take_events()
    }

    pub fn has_inputs(&self) -> bool {
        self.queue.has_inputs()
    }
}

// ============================================================================
// Tests
// ============================================================================
