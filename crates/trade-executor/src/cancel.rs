//! Cooperative cancellation for waits inside a trade.

use std::time::Duration;

use tokio::sync::watch;

use crate::error::TradeError;

/// Read side of a cancellation signal.
///
/// The default value never fires. Every sleep in the trade flow goes through
/// [`Cancellation::sleep`], so setting the signal ends the trade at its next
/// wait with `TradeError::Cancelled`.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    receiver: Option<watch::Receiver<bool>>,
}

/// Create a signal: send `true` on the sender to cancel.
pub fn cancellation() -> (watch::Sender<bool>, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (tx, Cancellation::new(rx))
}

impl Cancellation {
    pub fn new(receiver: watch::Receiver<bool>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.receiver.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// `Err(Cancelled)` if the signal has fired.
    pub fn check(&self) -> Result<(), TradeError> {
        if self.is_cancelled() {
            Err(TradeError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleep for `delay`, waking early with `Err(Cancelled)` if the signal fires.
    ///
    /// A dropped sender leaves the sleep running to completion.
    pub async fn sleep(&self, delay: Duration) -> Result<(), TradeError> {
        let Some(receiver) = &self.receiver else {
            tokio::time::sleep(delay).await;
            return Ok(());
        };

        let mut receiver = receiver.clone();
        if *receiver.borrow_and_update() {
            return Err(TradeError::Cancelled);
        }

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return Ok(()),
                changed = receiver.changed() => match changed {
                    Ok(()) => {
                        if *receiver.borrow_and_update() {
                            return Err(TradeError::Cancelled);
                        }
                    }
                    Err(_) => {
                        (&mut sleep).await;
                        return Ok(());
                    }
                },
            }
        }
    }
}
