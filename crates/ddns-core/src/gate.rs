//! One-shot activation signal
//!
//! Lets the engine stay dormant until the control plane stores its first
//! valid configuration. The trigger side is cloneable and never blocks; only
//! the first `fire` counts. The waiter is consumed by `wait`, so the engine
//! can only be activated once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Create a connected trigger/waiter pair
pub fn activation_gate() -> (ActivationTrigger, ActivationWaiter) {
    let (tx, rx) = mpsc::channel(1);
    let trigger = ActivationTrigger {
        tx,
        fired: Arc::new(AtomicBool::new(false)),
    };
    (trigger, ActivationWaiter { rx })
}

/// Producer side, held by the configuration-accepting boundary
#[derive(Debug, Clone)]
pub struct ActivationTrigger {
    tx: mpsc::Sender<()>,
    fired: Arc<AtomicBool>,
}

impl ActivationTrigger {
    /// Signal activation
    ///
    /// Returns `true` only for the call that actually fired the gate.
    pub fn fire(&self) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        // Capacity one and a single send: this cannot be full.
        let _ = self.tx.try_send(());
        true
    }

    /// Whether the gate has fired
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

/// Consumer side, held by the engine
#[derive(Debug)]
pub struct ActivationWaiter {
    rx: mpsc::Receiver<()>,
}

impl ActivationWaiter {
    /// Wait for the first signal
    ///
    /// # Errors
    ///
    /// [`Error::Activation`] if every trigger is dropped without firing.
    pub async fn wait(mut self) -> Result<()> {
        match self.rx.recv().await {
            Some(()) => Ok(()),
            None => Err(Error::activation(
                "every activation trigger was dropped before firing",
            )),
        }
    }
}
