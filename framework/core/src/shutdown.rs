use tokio::sync::broadcast::{self, error::TryRecvError, Receiver, Sender};

/// Why a run is being stopped before its scenarios have finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ShutdownReason {
    /// Ctrl-C or `SIGINT`.
    #[display("interrupt")]
    Interrupt,
    /// `SIGTERM`.
    #[display("terminate")]
    Terminate,
    /// A hook asked the run to stop early.
    #[display("stop requested")]
    Requested,
    /// The [ShutdownHandle] was dropped without an explicit shutdown.
    #[display("shutdown handle dropped")]
    HandleDropped,
}

#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    sender: Sender<ShutdownReason>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(1).0,
        }
    }

    pub fn shutdown(&self, reason: ShutdownReason) {
        if let Err(e) = self.sender.send(reason) {
            // Will fail if nobody is listening for a shutdown signal, in which case the log message
            // can be ignored.
            log::warn!("Failed to send shutdown signal: {e:?}");
        }
    }

    pub fn new_listener(&self) -> ShutdownListener {
        ShutdownListener::new(self.sender.subscribe())
    }
}

/// Receives the shutdown signal sent through a [ShutdownHandle].
///
/// Once a shutdown has been observed the listener remembers it, so repeated checks keep reporting
/// the same reason.
#[derive(Debug)]
pub struct ShutdownListener {
    receiver: Receiver<ShutdownReason>,
    received: Option<ShutdownReason>,
}

impl ShutdownListener {
    pub(crate) fn new(receiver: Receiver<ShutdownReason>) -> Self {
        Self {
            receiver,
            received: None,
        }
    }

    /// Point in time check if the shutdown signal has been received. If this returns true then no
    /// new work should be started.
    pub fn should_shutdown(&mut self) -> bool {
        self.received().is_some()
    }

    /// The reason for the shutdown, if one has been received.
    pub fn received(&mut self) -> Option<ShutdownReason> {
        while self.received.is_none() {
            match self.receiver.try_recv() {
                Ok(reason) => self.received = Some(reason),
                Err(TryRecvError::Closed) => self.received = Some(ShutdownReason::HandleDropped),
                // A lagged receiver has missed at least one shutdown, read the next one.
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) => break,
            }
        }

        self.received
    }
}

#[derive(derive_more::Error, derive_more::Display, Debug)]
pub struct ShutdownSignalError {
    msg: String,
}

impl Default for ShutdownSignalError {
    fn default() -> Self {
        Self {
            msg: "Execution cancelled by shutdown signal".to_string(),
        }
    }
}
