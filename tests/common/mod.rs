//! Host simulation of the router hardware.
//!
//! [`SimDriver`] tracks the physical position of an axis and derives its
//! endstop level from a [`Sensor`] model. [`SimClock`] turns the control
//! context's waits into interrupt ticks, so whole operations run
//! deterministically on one thread.

#![allow(dead_code)]

use embedded_hal::delay::DelayNs;

use filament_router::axis::AxisDriver;
use filament_router::error::MotorError;
use filament_router::io::{Feedback, FeedbackSink, Prompt, Signal, SignalChannel};
use filament_router::motion::Direction;
use filament_router::{
    parse_config, AxisId, InterruptPump, MemoryStorage, PositionStore, Router, RouterConfig,
};

/// Endstop model over the physical step position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sensor {
    Never,
    Always,
    AtOrBelow(i32),
    AtOrAbove(i32),
    /// Orbital flag: high for the first `width` steps of every revolution.
    Every { period: i32, width: i32 },
}

impl Sensor {
    pub fn level(&self, position: i32) -> bool {
        match *self {
            Sensor::Never => false,
            Sensor::Always => true,
            Sensor::AtOrBelow(limit) => position <= limit,
            Sensor::AtOrAbove(limit) => position >= limit,
            Sensor::Every { period, width } => position.rem_euclid(period) < width,
        }
    }
}

#[derive(Debug)]
pub struct SimDriver {
    pub position: i32,
    pub pulses: u32,
    pub enabled: bool,
    pub direction: Direction,
    pub sensor: Sensor,
}

impl SimDriver {
    pub fn new(sensor: Sensor) -> Self {
        Self {
            position: 0,
            pulses: 0,
            enabled: false,
            direction: Direction::Forward,
            sensor,
        }
    }

    pub fn at(mut self, position: i32) -> Self {
        self.position = position;
        self
    }
}

impl AxisDriver for SimDriver {
    fn pulse(&mut self) -> Result<(), MotorError> {
        self.pulses += 1;
        self.position += self.direction.sign();
        Ok(())
    }

    fn read_endstop(&mut self) -> Result<bool, MotorError> {
        Ok(self.sensor.level(self.position))
    }

    fn set_enabled(&mut self, enabled: bool) -> Result<(), MotorError> {
        self.enabled = enabled;
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), MotorError> {
        self.direction = direction;
        Ok(())
    }
}

/// Delay provider that advances simulated time by firing pump ticks.
pub struct SimClock<'p> {
    pump: &'p InterruptPump<SimDriver>,
    pending_ns: u64,
}

impl<'p> SimClock<'p> {
    pub fn new(pump: &'p InterruptPump<SimDriver>) -> Self {
        Self {
            pump,
            pending_ns: 0,
        }
    }
}

impl DelayNs for SimClock<'_> {
    fn delay_ns(&mut self, ns: u32) {
        let tick_ns = self.pump.tick_period_us() as u64 * 1_000;
        self.pending_ns += ns as u64;
        while self.pending_ns >= tick_ns {
            self.pump.on_tick();
            self.pending_ns -= tick_ns;
        }
    }
}

/// Collaborator that records everything and answers prompts with `answer`.
#[derive(Debug, Default)]
pub struct RecordingIo {
    pub answer: bool,
    pub signals: Vec<Signal>,
    pub feedback: Vec<Feedback>,
    pub prompts: Vec<Prompt>,
}

impl RecordingIo {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        self.signals.clear();
        self.feedback.clear();
        self.prompts.clear();
    }
}

impl SignalChannel for RecordingIo {
    fn signal(&mut self, signal: Signal) {
        self.signals.push(signal);
    }
}

impl FeedbackSink for RecordingIo {
    fn notify(&mut self, feedback: Feedback) {
        self.feedback.push(feedback);
    }

    fn confirm(&mut self, prompt: Prompt) -> bool {
        self.prompts.push(prompt);
        self.answer
    }
}

/// 10 steps/mm on both linear axes, one step per degree on the revolver.
pub const SIM_CONFIG: &str = r#"
tool_count = 5
bowden_length = 50.0
unload_policy = "auto"

[selector]
steps_per_mm = 10.0
offset = 5.0
spacing = 20.0

[selector.motor]
max_speed = 10000.0
acceleration = 15000.0
homing_speed = 5000.0

[revolver]
steps_per_revolution = 360

[revolver.motor]
max_speed = 10000.0
acceleration = 15000.0
homing_speed = 5000.0

[feeder]
steps_per_mm = 10.0
insert_speed = 5000.0
load_attempts = 10
unload_attempts = 10

[feeder.motor]
max_speed = 10000.0
acceleration = 15000.0
"#;

/// Feeder endstop position in steps: 10 mm into the feeder.
pub const FEEDER_SENSOR_AT: i32 = 100;

pub type SimPump = InterruptPump<SimDriver>;
pub type SimRouter<'p> = Router<'p, SimDriver, SimClock<'p>, MemoryStorage<64>, RecordingIo>;

pub fn sim_config() -> RouterConfig {
    parse_config(SIM_CONFIG).expect("simulation config parses")
}

/// Selector 30 mm away from its endstop, revolver on its flag, feeder empty.
pub fn sim_pump() -> SimPump {
    InterruptPump::new(
        SimDriver::new(Sensor::AtOrBelow(0)).at(300),
        SimDriver::new(Sensor::Every {
            period: 360,
            width: 5,
        }),
        SimDriver::new(Sensor::AtOrAbove(FEEDER_SENSOR_AT)),
    )
}

pub fn sim_router<'p>(pump: &'p SimPump, config: RouterConfig) -> SimRouter<'p> {
    sim_router_with(pump, config, MemoryStorage::new(), RecordingIo::answering(true))
}

pub fn sim_router_with<'p>(
    pump: &'p SimPump,
    config: RouterConfig,
    storage: MemoryStorage<64>,
    io: RecordingIo,
) -> SimRouter<'p> {
    Router::new(
        pump,
        SimClock::new(pump),
        config,
        PositionStore::new(storage),
        io,
    )
    .expect("router starts")
}

pub fn pulses(pump: &SimPump, axis: AxisId) -> u32 {
    pump.with_driver(axis, |driver| driver.pulses)
}

pub fn physical(pump: &SimPump, axis: AxisId) -> i32 {
    pump.with_driver(axis, |driver| driver.position)
}

pub fn set_sensor(pump: &SimPump, axis: AxisId, sensor: Sensor) {
    pump.with_driver(axis, |driver| driver.sensor = sensor);
}
