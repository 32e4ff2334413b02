//! Filament transport state machine.
//!
//! [`Router`] owns the motion façade, the position store and the
//! collaborators, and sequences selector, revolver and feeder moves into
//! channel selection, loading and unloading.

use embedded_hal::delay::DelayNs;
use embedded_storage::Storage;

use crate::axis::{AxisDriver, AxisId, AxisSelector};
use crate::config::units::{Steps, Unit};
use crate::config::{RouterConfig, UnloadPolicy};
use crate::error::{Error, MotionError, Result, TransportError};
use crate::io::{
    Feedback, FeedbackSink, Notice, Prompt, Signal, SignalChannel, BEEPS_FAILURE, BEEPS_JAMMED,
    BEEPS_PROMPT,
};
use crate::motion::{InterruptPump, Motion};
use crate::persist::{PersistedRecord, PositionStore};

use super::retry::RetryPolicy;
use super::state::{Activity, AxisStatus, RouterSnapshot, TransportState, TransportStatus};

/// Share of the guide tube fed at full speed while loading; the rest is fed
/// at insertion speed.
const BULK_FEED_SHARE: f32 = 0.95;

/// Withdrawal pass while unloading, in guide tube lengths.
const WITHDRAW_TUBES: f32 = 3.0;

/// The filament router.
///
/// Every operation blocks the control context until its moves finish. The
/// [`InterruptPump`] must keep ticking meanwhile.
pub struct Router<'p, D, DELAY, S, IO>
where
    D: AxisDriver,
    DELAY: DelayNs,
    S: Storage,
    IO: SignalChannel + FeedbackSink,
{
    motion: Motion<'p, D, DELAY>,
    store: PositionStore<S>,
    io: IO,
    config: RouterConfig,
    status: TransportStatus,
}

impl<'p, D, DELAY, S, IO> Router<'p, D, DELAY, S, IO>
where
    D: AxisDriver,
    DELAY: DelayNs,
    S: Storage,
    IO: SignalChannel + FeedbackSink,
{
    /// Create the router and resume from the persisted record.
    ///
    /// Axis positions and the selected channel are restored from `store`;
    /// an unusable record is replaced by defaults and rewritten.
    ///
    /// # Errors
    ///
    /// Storage failures, or `Busy` if the pump is already moving an axis.
    pub fn new(
        pump: &'p InterruptPump<D>,
        delay: DELAY,
        config: RouterConfig,
        mut store: PositionStore<S>,
        io: IO,
    ) -> Result<Self> {
        let mut motion = Motion::new(pump, delay, &config);

        let record = store.restore()?;
        for axis in AxisId::ALL {
            motion.set_position(axis, record.position(axis))?;
        }
        let selected = record
            .selected
            .filter(|&channel| channel < config.tool_count);
        if let Some(channel) = selected {
            info!("resuming on channel {}", channel);
        }

        Ok(Self {
            motion,
            store,
            io,
            config,
            status: TransportStatus {
                selected,
                ..TransportStatus::default()
            },
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The motion façade.
    #[inline]
    pub fn motion(&self) -> &Motion<'p, D, DELAY> {
        &self.motion
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The collaborators.
    #[inline]
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// The collaborators, mutably.
    #[inline]
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// The position store.
    #[inline]
    pub fn store(&self) -> &PositionStore<S> {
        &self.store
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Selected channel.
    #[inline]
    pub fn selected(&self) -> Option<u8> {
        self.status.selected
    }

    /// Sticky jam flag.
    #[inline]
    pub fn is_jammed(&self) -> bool {
        self.status.jammed
    }

    /// Transport state.
    #[inline]
    pub fn state(&self) -> TransportState {
        self.status.state()
    }

    /// Whether an operation or a non-blocking move is running.
    pub fn busy(&self) -> bool {
        self.status.busy() || AxisId::ALL.iter().any(|&axis| self.motion.is_moving(axis))
    }

    /// Position of an axis in steps.
    #[inline]
    pub fn position(&self, axis: AxisId) -> Steps {
        self.motion.position(axis)
    }

    /// Position of an axis in millimeters (selector, feeder) or degrees
    /// (revolver).
    #[inline]
    pub fn position_units(&self, axis: AxisId) -> f32 {
        self.motion.position_units(axis)
    }

    /// Sample an axis' endstop.
    pub fn endstop_triggered(&self, axis: AxisId) -> Result<bool> {
        self.motion.endstop_triggered(axis)
    }

    /// Status of everything at once.
    pub fn snapshot(&self) -> Result<RouterSnapshot> {
        let mut axes = [AxisStatus {
            position: Steps(0),
            position_units: 0.0,
            enabled: false,
            moving: false,
            endstop_triggered: false,
        }; 3];
        for axis in AxisId::ALL {
            axes[axis.index()] = AxisStatus {
                position: self.motion.position(axis),
                position_units: self.motion.position_units(axis),
                enabled: self.motion.is_enabled(axis),
                moving: self.motion.is_moving(axis),
                endstop_triggered: self.motion.endstop_triggered(axis)?,
            };
        }

        Ok(RouterSnapshot {
            axes,
            state: self.status.state(),
            selected: self.status.selected,
            jammed: self.status.jammed,
            busy: self.busy(),
        })
    }

    // =========================================================================
    // Runtime tuning
    // =========================================================================

    /// Set an axis' max step rate (1..=10000 steps/s).
    pub fn set_max_speed(&mut self, axis: AxisId, speed: f32) -> Result<()> {
        self.motion.set_max_speed(axis, speed)
    }

    /// Set an axis' acceleration (200..=15000 steps/s²).
    pub fn set_acceleration(&mut self, axis: AxisId, acceleration: f32) -> Result<()> {
        self.motion.set_acceleration(axis, acceleration)
    }

    /// Energize or release one axis.
    pub fn set_enabled(&mut self, axis: AxisId, enabled: bool) -> Result<()> {
        self.motion.set_enabled(axis, enabled)
    }

    /// Energize or release every axis.
    pub fn set_all_enabled(&mut self, enabled: bool) -> Result<()> {
        self.motion.set_all_enabled(enabled)
    }

    /// Force an endstop state in software, or hand it back to the input.
    ///
    /// Used when an external controller reports the feeder state.
    pub fn set_endstop_override(&mut self, axis: AxisId, state: Option<bool>) {
        self.motion.set_endstop_override(axis, state);
    }

    // =========================================================================
    // Direct moves
    // =========================================================================

    /// Start a relative move without waiting.
    ///
    /// The axis is enabled first. Moves stop on the axis' endstop.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a zero-length move, `UnitMismatch` for
    /// millimeters on the revolver or degrees on a linear axis, `Busy` if the
    /// axis is already moving.
    pub fn prepare_relative(&mut self, axis: AxisId, amount: f32, unit: Unit) -> Result<()> {
        let delta = self.motion.to_steps(axis, amount, unit)?;
        self.prepare_delta(axis, delta)
    }

    /// Start an absolute move without waiting.
    ///
    /// # Errors
    ///
    /// As [`prepare_relative`](Self::prepare_relative); a target equal to
    /// the current position is a zero-length move.
    pub fn prepare_absolute(&mut self, axis: AxisId, target: f32, unit: Unit) -> Result<()> {
        let target = self.motion.to_steps(axis, target, unit)?;
        self.prepare_delta(axis, target - self.motion.position(axis))
    }

    fn prepare_delta(&mut self, axis: AxisId, delta: Steps) -> Result<()> {
        if delta.0 == 0 {
            return Err(MotionError::InvalidRequest.into());
        }
        self.motion.set_enabled(axis, true)?;
        self.motion.prepare_relative(axis, delta, false)
    }

    /// Wait for prepared moves.
    pub fn run_and_wait(&mut self, axes: impl Into<AxisSelector>) -> Result<()> {
        self.motion.run_and_wait(axes.into())
    }

    /// Move relative and wait.
    pub fn move_relative(&mut self, axis: AxisId, amount: f32, unit: Unit) -> Result<()> {
        self.prepare_relative(axis, amount, unit)?;
        self.run_and_wait(axis)
    }

    /// Move to an absolute position and wait.
    pub fn move_absolute(&mut self, axis: AxisId, target: f32, unit: Unit) -> Result<()> {
        self.prepare_absolute(axis, target, unit)?;
        self.run_and_wait(axis)
    }

    // =========================================================================
    // Homing
    // =========================================================================

    /// Home one axis.
    ///
    /// With `check_feeder_first`, filament in the feeder path is unloaded
    /// first (after confirmation, depending on the unload policy). Homing the
    /// selector or the revolver drops the selection.
    ///
    /// # Errors
    ///
    /// `Jammed` while the feeder is jammed, `Declined` if the operator
    /// refused the unload, `EndstopTimeout` if the endstop was not reached.
    pub fn home(&mut self, axis: AxisId, check_feeder_first: bool) -> Result<()> {
        self.refuse_if_jammed()?;
        self.run_as(Activity::Homing, |router| {
            router.home_inner(axis, check_feeder_first)
        })
    }

    /// Home the selector (checking the feeder first), then the revolver.
    pub fn home_all(&mut self) -> Result<()> {
        self.home(AxisId::Selector, true)?;
        self.home(AxisId::Revolver, false)
    }

    fn home_inner(&mut self, axis: AxisId, check_feeder_first: bool) -> Result<()> {
        self.motion.set_enabled(axis, true)?;
        if check_feeder_first && !self.config.external_control {
            self.clear_feeder_path()?;
        }
        let drops_selection = axis != AxisId::Feeder;
        if drops_selection && self.status.selected.take().is_some() {
            debug!("selection dropped by homing {}", axis);
        }

        if let Err(e) = self.motion.home(axis) {
            warn!("{} homing failed", axis);
            self.io.notify(Feedback::Notice(Notice::HomingFailed(axis)));
            if drops_selection {
                // The stored channel must not outlive an uncalibrated axis.
                let _ = self.persist();
            }
            return Err(e);
        }
        self.persist()
    }

    /// Home the revolver and return it to the selected channel.
    fn reseat_revolver(&mut self) -> Result<()> {
        let revolver = AxisId::Revolver;
        self.motion.set_enabled(revolver, true)?;
        if self.motion.has_endstop(revolver) {
            self.motion.home(revolver)?;
        }
        if let Some(channel) = self.status.selected {
            let target = self.config.revolver_position(channel);
            self.motion.move_to(revolver, target, true)?;
        }
        Ok(())
    }

    // =========================================================================
    // Channel selection
    // =========================================================================

    /// Move the selector (and revolver) to `channel`.
    ///
    /// Selecting the current channel moves nothing. Filament in the feeder
    /// path is unloaded first, after confirmation when the unload policy asks.
    ///
    /// # Errors
    ///
    /// `ChannelOutOfRange`, `Jammed` while the feeder is jammed, `Declined`
    /// if the operator refused the unload.
    pub fn select_channel(&mut self, channel: u8) -> Result<()> {
        let tool_count = self.config.tool_count;
        if channel >= tool_count {
            return Err(TransportError::ChannelOutOfRange {
                channel,
                tool_count,
            }
            .into());
        }
        self.refuse_if_jammed()?;
        self.run_as(Activity::Selecting, |router| router.select_inner(channel))
    }

    fn select_inner(&mut self, channel: u8) -> Result<()> {
        let external = self.config.external_control;
        if external {
            self.io.signal(Signal::SelectorBusy);
        }

        if self.status.selected == Some(channel) {
            debug!("channel {} already selected", channel);
            self.io.notify(Feedback::UserBeep);
            self.io.notify(Feedback::Notice(Notice::ToolAlreadySelected));
            if external {
                self.io.signal(Signal::SelectorReady);
            }
            return Ok(());
        }

        self.motion.set_enabled(AxisId::Selector, true)?;
        if !external {
            self.clear_feeder_path()?;
        }

        info!("selecting channel {}", channel);
        self.io.notify(Feedback::Notice(Notice::Selecting(channel)));

        let selector_target = self.motion.to_steps(
            AxisId::Selector,
            self.config.selector_position(channel).0,
            Unit::Millimeters,
        )?;
        self.prepare_to(AxisId::Selector, selector_target, false)?;
        let revolver = if self.config.revolver.reset_before_feed {
            Ok(())
        } else {
            let target = self.config.revolver_position(channel);
            self.motion
                .set_enabled(AxisId::Revolver, true)
                .and_then(|()| self.prepare_to(AxisId::Revolver, target, true))
        };
        // The selector may already be on its way.
        self.motion.run_and_wait(AxisSelector::AllPending)?;
        revolver?;

        self.status.selected = Some(channel);
        self.persist()?;

        if external {
            self.reseat_revolver()?;
            self.io.signal(Signal::SelectorReady);
        } else if self.config.offer_load_after_select {
            self.io.notify(Feedback::Beep(BEEPS_PROMPT));
            if self.io.confirm(Prompt::LoadSelected(channel)) {
                self.run_as(Activity::Loading, |router| router.load_inner(channel))?;
            }
        }
        Ok(())
    }

    fn prepare_to(&mut self, axis: AxisId, target: Steps, ignore_endstop: bool) -> Result<()> {
        if self.motion.position(axis) != target {
            self.motion.prepare_absolute(axis, target, ignore_endstop)?;
        }
        Ok(())
    }

    /// Unload if the feeder holds filament, asking first when the policy
    /// says so.
    fn clear_feeder_path(&mut self) -> Result<()> {
        if !self.motion.endstop_triggered(AxisId::Feeder)? {
            return Ok(());
        }

        match self.config.unload_policy {
            UnloadPolicy::Ask => {
                self.io.notify(Feedback::Beep(BEEPS_PROMPT));
                if !self.io.confirm(Prompt::UnloadBeforeMove) {
                    info!("unload declined");
                    return Err(TransportError::Declined.into());
                }
            }
            UnloadPolicy::Auto => info!("filament present, unloading first"),
        }
        self.run_as(Activity::Unloading, Self::unload_inner)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Feed filament from the selected channel up to the printer.
    ///
    /// Probes for filament in small increments at insertion speed, then feeds
    /// the guide tube length. A successful load clears a jam.
    ///
    /// # Errors
    ///
    /// `NoChannelSelected` without moving anything; `Jam` when the probing
    /// budget runs out, which leaves the router jammed.
    pub fn load_filament(&mut self) -> Result<()> {
        let channel = self.require_channel()?;
        self.run_as(Activity::Loading, |router| router.load_inner(channel))
    }

    fn load_inner(&mut self, channel: u8) -> Result<()> {
        if self.config.external_control {
            self.reseat_revolver()?;
            self.io.signal(Signal::LoadFilament);
            return self.persist();
        }

        let feeder = AxisId::Feeder;
        self.motion.set_enabled(feeder, true)?;
        if self.config.revolver.reset_before_feed {
            self.reseat_revolver()?;
        }

        let policy = RetryPolicy::load(self.config.feeder.load_attempts);
        let increment = self.feeder_steps(self.config.feeder.load_increment.0)?;
        let relief = self.feeder_steps(self.config.feeder.jam_relief.0)?;

        let detected = self.at_insert_speed(|router| {
            for attempt in policy.attempts() {
                if router.motion.endstop_triggered(feeder)? {
                    return Ok(true);
                }
                trace!("load attempt {}", attempt.number);
                router.nudge_feeder(increment)?;
                if attempt.backoff_due {
                    debug!("reseating after {} load attempts", attempt.number);
                    router.reseat_revolver()?;
                    router.nudge_feeder(Steps(-relief.0))?;
                }
            }
            router.motion.endstop_triggered(feeder)
        })?;
        if !detected {
            error!(
                "no filament detected on channel {} after {} attempts",
                channel, policy.max_attempts
            );
            return Err(self.enter_jam(Notice::LoadFailed, policy.max_attempts));
        }
        self.status.jammed = false;

        let bowden = self.config.bowden_length.0;
        self.feed(bowden * BULK_FEED_SHARE, true)?;
        self.at_insert_speed(|router| router.feed(bowden * (1.0 - BULK_FEED_SHARE), true))?;

        let reinforce = self.config.feeder.reinforce_length.0;
        if reinforce > 0.0 {
            self.reseat_revolver()?;
            self.feed(reinforce, true)?;
        }
        if self.config.revolver.home_after_feed && self.motion.has_endstop(AxisId::Revolver) {
            self.motion.home(AxisId::Revolver)?;
        }

        self.persist()?;
        info!("channel {} loaded", channel);
        Ok(())
    }

    // =========================================================================
    // Unloading
    // =========================================================================

    /// Pull filament back until the feeder endstop releases.
    ///
    /// A successful unload clears a jam and zeroes the feeder position.
    ///
    /// # Errors
    ///
    /// `NoChannelSelected` without moving anything; `Jam` when the
    /// withdrawal budget runs out, which leaves the router jammed.
    pub fn unload_filament(&mut self) -> Result<()> {
        self.require_channel()?;
        self.run_as(Activity::Unloading, Self::unload_inner)
    }

    fn unload_inner(&mut self) -> Result<()> {
        if self.config.external_control {
            self.reseat_revolver()?;
            self.io.signal(Signal::UnloadFilament);
            return self.persist();
        }

        let feeder = AxisId::Feeder;
        self.motion.set_enabled(feeder, true)?;
        if self.config.revolver.reset_before_feed {
            self.reseat_revolver()?;
        }

        let policy = RetryPolicy::unload(self.config.feeder.unload_attempts);
        let released = self.detecting_release(|router| router.withdraw(policy))?;
        if !released {
            error!(
                "filament still present after {} attempts",
                policy.max_attempts
            );
            return Err(self.enter_jam(Notice::UnloadFailed, policy.max_attempts));
        }
        self.status.jammed = false;

        self.motion.set_position(feeder, Steps(0))?;
        self.persist()?;
        info!("unloaded");
        Ok(())
    }

    /// Relieve tension, then pull back until the endstop releases.
    ///
    /// Runs with release detection on, so guarded reverse moves end as soon
    /// as the filament leaves the sensor. Always takes at least one
    /// increment.
    fn withdraw(&mut self, policy: RetryPolicy) -> Result<bool> {
        let feeder = AxisId::Feeder;
        let retract = self.config.feeder.unload_retract.0;
        let pushback = self.config.feeder.unload_pushback.0;
        let settle_ms = self.config.feeder.pushback_delay_ms;

        if retract != 0.0 {
            self.feed(-retract, false)?;
            if pushback != 0.0 {
                self.at_insert_speed(|router| router.feed(pushback, false))?;
                self.motion.delay_ms(settle_ms);
            }
        }

        self.feed(-(self.config.bowden_length.0 * WITHDRAW_TUBES), false)?;

        let increment = self.feeder_steps(self.config.feeder.unload_increment.0)?;
        let relief = self.feeder_steps(self.config.feeder.jam_relief.0)?;
        self.at_insert_speed(|router| {
            for attempt in policy.attempts() {
                trace!("unload attempt {}", attempt.number);
                router.nudge_feeder(Steps(-increment.0))?;
                if !router.motion.endstop_triggered(feeder)? {
                    return Ok(true);
                }
                if attempt.backoff_due {
                    debug!("reseating after {} unload attempts", attempt.number);
                    router.reseat_revolver()?;
                    router.nudge_feeder(relief)?;
                }
            }
            Ok(false)
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn run_as<R>(
        &mut self,
        activity: Activity,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let previous = core::mem::replace(&mut self.status.activity, activity);
        let result = f(self);
        self.status.activity = previous;
        result
    }

    fn refuse_if_jammed(&mut self) -> Result<()> {
        if self.status.jammed {
            warn!("feeder jammed, request refused");
            self.io.notify(Feedback::Beep(BEEPS_JAMMED));
            self.io.notify(Feedback::Notice(Notice::FeederJammed));
            return Err(TransportError::Jammed.into());
        }
        Ok(())
    }

    fn require_channel(&mut self) -> Result<u8> {
        match self.status.selected {
            Some(channel) => Ok(channel),
            None => {
                self.io.notify(Feedback::UserBeep);
                self.io.notify(Feedback::Notice(Notice::NoToolSelected));
                Err(TransportError::NoChannelSelected.into())
            }
        }
    }

    fn enter_jam(&mut self, notice: Notice, attempts: u16) -> Error {
        self.status.jammed = true;
        self.io.notify(Feedback::Beep(BEEPS_FAILURE));
        self.io.notify(Feedback::Notice(notice));
        TransportError::Jam { attempts }.into()
    }

    fn feeder_steps(&self, length: f32) -> Result<Steps> {
        self.motion.to_steps(AxisId::Feeder, length, Unit::Millimeters)
    }

    /// Feed `length` millimeters (negative pulls back). Lengths below one
    /// step are skipped.
    fn feed(&mut self, length: f32, ignore_endstop: bool) -> Result<()> {
        let steps = self.feeder_steps(length)?;
        if steps.0 == 0 {
            return Ok(());
        }
        self.motion.move_relative(AxisId::Feeder, steps, ignore_endstop)
    }

    fn nudge_feeder(&mut self, delta: Steps) -> Result<()> {
        if delta.0 == 0 {
            return Ok(());
        }
        self.motion.move_relative(AxisId::Feeder, delta, true)
    }

    fn at_insert_speed<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let speed = self.config.feeder.effective_insert_speed().0;
        let saved = self.motion.replace_max_speed(AxisId::Feeder, speed);
        let result = f(self);
        self.motion.replace_max_speed(AxisId::Feeder, saved);
        result
    }

    fn detecting_release<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let pump = self.motion.pump();
        pump.set_endstop_inverted(AxisId::Feeder, true);
        let result = f(self);
        pump.set_endstop_inverted(AxisId::Feeder, false);
        result
    }

    fn persist(&mut self) -> Result<()> {
        let record = PersistedRecord {
            positions: AxisId::ALL.map(|axis| self.motion.position(axis)),
            selected: self.status.selected,
            tool_count: self.config.tool_count,
        };
        self.store.save(&record).map_err(|e| {
            error!("failed to persist positions");
            e
        })
    }
}
