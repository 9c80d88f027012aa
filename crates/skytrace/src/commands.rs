//! # Session Commands
//!
//! The UI layer talks to the session through a bounded channel, drained at
//! the start of every tick (input sampling). Each command has a direct
//! method on [`SimSession`](crate::SimSession) as well.
//!
//! ```text
//! ┌──────────┐  CommandSender   ┌─────────┐  drain()  ┌────────────┐
//! │ UI layer │ ───────────────> │ channel │ ────────> │ SimSession │
//! └──────────┘                  └─────────┘           └────────────┘
//! ```

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// Default queue depth.
pub const COMMAND_CAPACITY: usize = 64;

/// Commands the UI layer can issue.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimCommand {
    /// Start replaying the loaded trajectory.
    RunReplay,
    /// Stop replay and resume live physics.
    StopReplay,
    /// Render ticks per replayed frame.
    SetReplaySpeed(u32),
    /// Pause or resume live physics.
    SetPaused(bool),
    /// Control noise parameters.
    SetNoise {
        /// Correlation time, seconds.
        correlation_time: f64,
        /// Standard deviation.
        std_dev: f64,
    },
}

/// Sending half, cheap to clone.
#[derive(Clone, Debug)]
pub struct CommandSender {
    sender: Sender<SimCommand>,
}

impl CommandSender {
    /// Queues a command without blocking.
    ///
    /// Returns `false` if the queue is full or the session is gone.
    #[inline]
    pub fn send(&self, command: SimCommand) -> bool {
        match self.sender.try_send(command) {
            Ok(()) => true,
            // Full: the UI is outrunning the render loop, drop it.
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => false,
        }
    }
}

/// The session's end of the channel.
#[derive(Debug)]
pub(crate) struct CommandQueue {
    sender: Sender<SimCommand>,
    receiver: Receiver<SimCommand>,
}

impl CommandQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    pub(crate) fn sender(&self) -> CommandSender {
        CommandSender { sender: self.sender.clone() }
    }

    /// Everything queued so far, oldest first.
    pub(crate) fn drain(&self) -> Vec<SimCommand> {
        self.receiver.try_iter().collect()
    }
}
