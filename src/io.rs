//! Collaborator interfaces.
//!
//! The router never renders anything or talks to another controller itself:
//! it emits [`Signal`]s for an external feeder controller and requests
//! [`Feedback`] from whatever drives the buzzer and display.

use crate::axis::AxisId;

/// Notification for an external feeder controller. Fire and forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    /// The selector is about to move.
    SelectorBusy,
    /// The selector is in place.
    SelectorReady,
    /// Filament should be loaded by the external controller.
    LoadFilament,
    /// Filament should be unloaded by the external controller.
    UnloadFilament,
}

/// Messages shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notice {
    /// A channel is being selected.
    Selecting(u8),
    /// The requested channel already is the selected one.
    ToolAlreadySelected,
    /// The feeder is jammed; clear it with a load or unload.
    FeederJammed,
    /// The operation needs a selected channel.
    NoToolSelected,
    /// Loading gave up.
    LoadFailed,
    /// Unloading gave up.
    UnloadFailed,
    /// An axis did not reach its endstop.
    HomingFailed(AxisId),
}

/// Acknowledgement requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Feedback {
    /// Beep `n` times.
    Beep(u8),
    /// Short acknowledgement tone for operator mistakes.
    UserBeep,
    /// Show a message.
    Notice(Notice),
}

/// Questions the router may ask the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prompt {
    /// Filament is loaded and the selector must move: unload first?
    UnloadBeforeMove,
    /// Load the freshly selected channel?
    LoadSelected(u8),
}

/// Beeps preceding an operator prompt.
pub const BEEPS_PROMPT: u8 = 1;

/// Beeps after a failed load or unload.
pub const BEEPS_FAILURE: u8 = 3;

/// Beeps when an operation is refused because the feeder is jammed.
pub const BEEPS_JAMMED: u8 = 4;

/// One-way channel to an external feeder controller.
pub trait SignalChannel {
    /// Emit a signal.
    fn signal(&mut self, signal: Signal);
}

/// Operator feedback.
pub trait FeedbackSink {
    /// Request feedback.
    fn notify(&mut self, feedback: Feedback);

    /// Ask a yes/no question. Returns `true` on confirmation.
    fn confirm(&mut self, prompt: Prompt) -> bool;
}

/// Collaborator that ignores signals, stays silent and answers every prompt
/// with `answer`.
#[derive(Debug, Clone, Copy)]
pub struct Unattended {
    /// Answer given to every prompt.
    pub answer: bool,
}

impl SignalChannel for Unattended {
    fn signal(&mut self, _signal: Signal) {}
}

impl FeedbackSink for Unattended {
    fn notify(&mut self, _feedback: Feedback) {}

    fn confirm(&mut self, _prompt: Prompt) -> bool {
        self.answer
    }
}
