//! Router configuration - root configuration structure.

use serde::Deserialize;

use super::motor::MotorConfig;
use super::units::{Millimeters, Steps};

/// What to do when filament is still in the feeder path before the selector
/// has to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum UnloadPolicy {
    /// Ask the operator and unload only on confirmation.
    #[default]
    Ask,
    /// Unload without asking.
    Auto,
}

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Number of feed channels.
    #[serde(default = "default_tool_count")]
    pub tool_count: u8,

    /// Guide tube length between feeder and printer.
    #[serde(default)]
    pub bowden_length: Millimeters,

    /// Feeder motion is delegated to an external controller.
    #[serde(default)]
    pub external_control: bool,

    /// Policy when filament is loaded and the selector must move.
    #[serde(default)]
    pub unload_policy: UnloadPolicy,

    /// Offer to load right after a successful channel selection.
    #[serde(default)]
    pub offer_load_after_select: bool,

    /// Linear selector axis.
    pub selector: SelectorConfig,

    /// Rotary revolver axis.
    pub revolver: RevolverConfig,

    /// Feeder axis.
    pub feeder: FeederConfig,
}

/// Selector axis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Calibration constant.
    pub steps_per_mm: f32,

    /// Position of channel 0.
    #[serde(default)]
    pub offset: Millimeters,

    /// Distance between adjacent channels.
    pub spacing: Millimeters,

    /// Drive parameters.
    #[serde(default)]
    pub motor: MotorConfig,
}

/// Revolver axis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RevolverConfig {
    /// Steps for one full revolution.
    pub steps_per_revolution: u32,

    /// Angular position of channel 0, in steps from the endstop.
    #[serde(default)]
    pub offset: Steps,

    /// Angular distance between channels in steps (one tenth of a
    /// revolution when omitted).
    #[serde(default)]
    pub spacing: Option<Steps>,

    /// Position the revolver right before feeding instead of while selecting.
    #[serde(default)]
    pub reset_before_feed: bool,

    /// Home the revolver after a successful load.
    #[serde(default)]
    pub home_after_feed: bool,

    /// Drive parameters.
    #[serde(default)]
    pub motor: MotorConfig,
}

impl RevolverConfig {
    /// Effective channel spacing in steps.
    pub fn effective_spacing(&self) -> Steps {
        self.spacing
            .unwrap_or(Steps((self.steps_per_revolution / 10) as i32))
    }
}

/// Feeder axis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FeederConfig {
    /// Calibration constant.
    pub steps_per_mm: f32,

    /// Gentle step rate used while probing for filament and on the final
    /// approach (defaults to the motor's max speed).
    #[serde(default)]
    pub insert_speed: Option<super::units::StepsPerSec>,

    /// Extra feed after the guide tube length.
    #[serde(default)]
    pub reinforce_length: Millimeters,

    /// Retract before unloading (0 disables the retract/pushback pair).
    #[serde(default)]
    pub unload_retract: Millimeters,

    /// Pushback after the retract.
    #[serde(default)]
    pub unload_pushback: Millimeters,

    /// Settling delay after the pushback.
    #[serde(default)]
    pub pushback_delay_ms: u32,

    /// Probing attempts while loading.
    #[serde(default = "default_load_attempts")]
    pub load_attempts: u16,

    /// Withdrawal attempts while unloading.
    #[serde(default = "default_unload_attempts")]
    pub unload_attempts: u16,

    /// Feed increment while probing for filament.
    #[serde(default = "default_load_increment")]
    pub load_increment: Millimeters,

    /// Withdrawal increment while waiting for the endstop to release.
    #[serde(default = "default_unload_increment")]
    pub unload_increment: Millimeters,

    /// Counter-move performed when clearing a soft jam.
    #[serde(default = "default_jam_relief")]
    pub jam_relief: Millimeters,

    /// Drive parameters.
    #[serde(default)]
    pub motor: MotorConfig,
}

impl FeederConfig {
    /// Effective insertion speed.
    pub fn effective_insert_speed(&self) -> super::units::StepsPerSec {
        self.insert_speed.unwrap_or(self.motor.max_speed)
    }
}

/// Smallest supported channel count.
pub const MIN_TOOLS: u8 = 2;

/// Largest supported channel count.
pub const MAX_TOOLS: u8 = 12;

/// Channel count used when the configured one is unusable.
pub const DEFAULT_TOOL_COUNT: u8 = 5;

fn default_tool_count() -> u8 {
    DEFAULT_TOOL_COUNT
}

fn default_load_attempts() -> u16 {
    100
}

fn default_unload_attempts() -> u16 {
    200
}

fn default_load_increment() -> Millimeters {
    Millimeters(2.5)
}

fn default_unload_increment() -> Millimeters {
    Millimeters(20.0)
}

fn default_jam_relief() -> Millimeters {
    Millimeters(15.0)
}

impl RouterConfig {
    /// Absolute selector position of a channel.
    pub fn selector_position(&self, channel: u8) -> Millimeters {
        Millimeters(self.selector.offset.0 + channel as f32 * self.selector.spacing.0)
    }

    /// Absolute revolver position of a channel.
    pub fn revolver_position(&self, channel: u8) -> Steps {
        Steps(self.revolver.offset.0 + channel as i32 * self.revolver.effective_spacing().0)
    }

    /// Selector travel spanning every channel.
    pub fn selector_span(&self) -> Millimeters {
        self.selector_position(self.tool_count.saturating_sub(1))
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            tool_count: DEFAULT_TOOL_COUNT,
            bowden_length: Millimeters(600.0),
            external_control: false,
            unload_policy: UnloadPolicy::Ask,
            offer_load_after_select: false,
            selector: SelectorConfig {
                steps_per_mm: 100.0,
                offset: Millimeters(5.0),
                spacing: Millimeters(20.0),
                motor: MotorConfig::default(),
            },
            revolver: RevolverConfig {
                steps_per_revolution: 8640,
                offset: Steps(0),
                spacing: None,
                reset_before_feed: false,
                home_after_feed: false,
                motor: MotorConfig::default(),
            },
            feeder: FeederConfig {
                steps_per_mm: 136.0,
                insert_speed: None,
                reinforce_length: Millimeters(0.0),
                unload_retract: Millimeters(0.0),
                unload_pushback: Millimeters(0.0),
                pushback_delay_ms: 0,
                load_attempts: default_load_attempts(),
                unload_attempts: default_unload_attempts(),
                load_increment: default_load_increment(),
                unload_increment: default_unload_increment(),
                jam_relief: default_jam_relief(),
                motor: MotorConfig::default(),
            },
        }
    }
}
