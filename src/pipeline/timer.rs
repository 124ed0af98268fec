// One-shot completion timer; each session arms one when its engine starts.

use std::io;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Sender, select};

use super::session::{SessionEvent, SessionId};

/// One-shot timer that reports completion over a channel instead of running
/// teardown itself; the controller decides what the firing means.
#[derive(Debug)]
pub struct CompletionTimer {
    cancel: Option<Sender<()>>,
    delay: Duration,
}

impl CompletionTimer {
    pub fn arm(id: SessionId, delay: Duration, events: Sender<SessionEvent>) -> io::Result<Self> {
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);

        thread::Builder::new()
            .name(format!("completion-timer-{}", id.0))
            .spawn(move || {
                select! {
                    // sender dropped (or explicit send) means cancelled
                    recv(cancel_rx) -> _ => {}
                    recv(crossbeam_channel::after(delay)) -> _ => {
                        let _ = events.send(SessionEvent::Completed(id));
                    }
                }
            })?;

        Ok(Self { cancel: Some(cancel_tx), delay })
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_armed(&self) -> bool {
        self.cancel.is_some()
    }

    /// Returns true the first time only.
    pub fn cancel(&mut self) -> bool {
        // dropping the sender disconnects the channel and wakes the thread
        self.cancel.take().is_some()
    }
}

impl Drop for CompletionTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let _timer = CompletionTimer::arm(SessionId(7), Duration::from_millis(10), tx).unwrap();
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event, SessionEvent::Completed(SessionId(7)));
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut timer = CompletionTimer::arm(SessionId(1), Duration::from_millis(50), tx).unwrap();
        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert!(!timer.is_armed());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn dropping_cancels() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(CompletionTimer::arm(SessionId(2), Duration::from_millis(50), tx).unwrap());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
