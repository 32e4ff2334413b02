//! Transport state.

use core::fmt;

use crate::config::units::Steps;

/// What the router is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    /// Waiting for a command.
    #[default]
    Idle,
    /// Homing an axis.
    Homing,
    /// Moving to a channel.
    Selecting,
    /// Feeding filament toward the printer.
    Loading,
    /// Pulling filament back.
    Unloading,
}

/// Externally visible transport state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportState {
    /// Waiting for a command.
    Idle,
    /// Homing an axis.
    Homing,
    /// Moving to a channel.
    Selecting,
    /// Feeding filament toward the printer.
    Loading,
    /// Pulling filament back.
    Unloading,
    /// A load or unload ran out of attempts. Sticky until a load or unload
    /// succeeds.
    Jammed,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Idle => "idle",
            TransportState::Homing => "homing",
            TransportState::Selecting => "selecting",
            TransportState::Loading => "loading",
            TransportState::Unloading => "unloading",
            TransportState::Jammed => "jammed",
        };
        f.write_str(name)
    }
}

/// Transport bookkeeping owned by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransportStatus {
    /// Current activity.
    pub activity: Activity,
    /// Sticky jam flag.
    pub jammed: bool,
    /// Selected channel.
    pub selected: Option<u8>,
}

impl TransportStatus {
    /// Externally visible state. A jam shows once the router is idle.
    pub fn state(&self) -> TransportState {
        match self.activity {
            Activity::Idle if self.jammed => TransportState::Jammed,
            Activity::Idle => TransportState::Idle,
            Activity::Homing => TransportState::Homing,
            Activity::Selecting => TransportState::Selecting,
            Activity::Loading => TransportState::Loading,
            Activity::Unloading => TransportState::Unloading,
        }
    }

    /// Whether an operation is running.
    #[inline]
    pub fn busy(&self) -> bool {
        self.activity != Activity::Idle
    }
}

/// Snapshot of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStatus {
    /// Position in steps.
    pub position: Steps,
    /// Position in the axis' physical unit.
    pub position_units: f32,
    /// Whether the axis is energized.
    pub enabled: bool,
    /// Whether a move is running.
    pub moving: bool,
    /// Endstop state at the time of the snapshot.
    pub endstop_triggered: bool,
}

/// Snapshot of the whole router, for status reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterSnapshot {
    /// Per-axis status, indexed by [`AxisId::index`](crate::axis::AxisId::index).
    pub axes: [AxisStatus; 3],
    /// Transport state.
    pub state: TransportState,
    /// Selected channel.
    pub selected: Option<u8>,
    /// Sticky jam flag.
    pub jammed: bool,
    /// Whether an operation is running.
    pub busy: bool,
}
