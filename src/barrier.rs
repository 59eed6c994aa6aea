use std::sync::Mutex;

use tokio::sync::watch;

/// One-shot rendezvous: the n-th `wait` releases every participant at once,
/// and the barrier stays open forever after. There is no second cycle; a
/// repeated synchronized start needs a fresh instance.
///
/// Used to line up throughput workers so the measured window starts with all
/// connections live instead of a ramp-up.
pub struct Barrier {
    remaining: Mutex<u32>,
    released_tx: watch::Sender<bool>,
    released_rx: watch::Receiver<bool>,
}

impl Barrier {
    pub fn new(count: u32) -> Self {
        let (released_tx, released_rx) = watch::channel(count == 0);
        Self {
            remaining: Mutex::new(count),
            released_tx,
            released_rx,
        }
    }

    /// Blocks until the last expected participant arrives. Calls made after
    /// the barrier has opened return immediately.
    pub async fn wait(&self) {
        let mut rx = self.released_rx.clone();
        {
            let mut remaining = self.remaining.lock().unwrap();
            match *remaining {
                0 => return, // already open
                1 => {
                    *remaining = 0;
                    let _ = self.released_tx.send(true);
                    return;
                }
                _ => *remaining -= 1,
            }
        }
        // The sender lives in self, so the channel cannot close under us.
        let _ = rx.wait_for(|released| *released).await;
    }
}
