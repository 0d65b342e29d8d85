//! Shutdown coordination for the relay.
//!
//! The flag is level-triggered: a signal taken out after `trigger` has
//! already fired resolves immediately instead of waiting forever.

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// One subscriber's view of the shutdown flag.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolves once shutdown is triggered or every coordinator is dropped.
    pub async fn recv(mut self) {
        let _ = self.rx.wait_for(|stopping| *stopping).await;
    }
}
