//! Phase-owned timers
//!
//! Two independent periodic sources drive the interview UI:
//!
//! - [`CountdownTimer`] - time box for the Questioning phase
//! - [`TipRotator`] - advisory messages cycled while a document is generated
//!
//! Each timer owns at most one [`PeriodicTask`]. Ticks carry the epoch of the
//! `start` that scheduled them; `stop` advances the epoch, so a tick already
//! queued in the channel when its owner stopped is ignored on arrival.

pub mod countdown;
pub mod periodic;
pub mod tip_rotator;

pub use countdown::{CountdownTick, CountdownTimer};
pub use periodic::{PeriodicTask, TickSender};
pub use tip_rotator::{TipRotator, DEFAULT_TIPS};

/// A tick delivered by a periodic task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    Countdown { epoch: u64 },
    Tip { epoch: u64 },
}
