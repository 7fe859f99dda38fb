//! Commit wake-up channel
//!
//! The fetch side fires the trigger after writing staging files; the commit
//! side sleeps on the signal. Capacity is one and firing never blocks:
//! firing while a wake-up is already pending collapses into that pending
//! wake-up, so a burst of fetch runs yields a single commit run that sees
//! all their files.

use tokio::sync::mpsc;
use tracing::debug;

/// Sending half, held by the fetch orchestrator
#[derive(Debug, Clone)]
pub struct CommitTrigger {
    tx: mpsc::Sender<()>,
}

/// Receiving half, held by the commit loop
#[derive(Debug)]
pub struct CommitSignal {
    rx: mpsc::Receiver<()>,
}

pub fn commit_trigger() -> (CommitTrigger, CommitSignal) {
    let (tx, rx) = mpsc::channel(1);
    (CommitTrigger { tx }, CommitSignal { rx })
}

impl CommitTrigger {
    /// Request a commit run; returns false when one is already pending
    pub fn fire(&self) -> bool {
        let fired = self.tx.try_send(()).is_ok();
        if !fired {
            debug!("commit already pending, trigger collapsed");
        }
        fired
    }
}

impl CommitSignal {
    /// Wait for the next wake-up; `None` when every trigger has been dropped
    pub async fn fired(&mut self) -> Option<()> {
        self.rx.recv().await
    }
}
