//! Axis identity.

use core::fmt;

/// One of the three motor-driven degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisId {
    /// Linear axis that lines the feeder up with a channel.
    Selector,
    /// Rotary axis that seats the chosen channel.
    Revolver,
    /// Axis pushing and pulling filament through the guide tube.
    Feeder,
}

impl AxisId {
    /// Every axis, in storage order.
    pub const ALL: [AxisId; 3] = [AxisId::Selector, AxisId::Revolver, AxisId::Feeder];

    /// Index into per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            AxisId::Selector => 0,
            AxisId::Revolver => 1,
            AxisId::Feeder => 2,
        }
    }

    /// Lowercase axis name.
    pub const fn name(self) -> &'static str {
        match self {
            AxisId::Selector => "selector",
            AxisId::Revolver => "revolver",
            AxisId::Feeder => "feeder",
        }
    }
}

impl fmt::Display for AxisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which axes a blocking wait covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisSelector {
    /// A single axis.
    Axis(AxisId),
    /// Every axis with a move in progress.
    AllPending,
}

impl AxisSelector {
    /// Whether `axis` is covered.
    #[inline]
    pub fn includes(self, axis: AxisId) -> bool {
        match self {
            AxisSelector::Axis(id) => id == axis,
            AxisSelector::AllPending => true,
        }
    }
}

impl From<AxisId> for AxisSelector {
    fn from(axis: AxisId) -> Self {
        AxisSelector::Axis(axis)
    }
}
