//! Unit tests for the pin-based axis driver.

use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};

use filament_router::axis::{AxisDriver, PinAxisDriver};
use filament_router::config::MechanicalConstraints;
use filament_router::motion::{Direction, InterruptPump, MovePlan};
use filament_router::{parse_config, AxisId, Steps};

type MockDriver = PinAxisDriver<PinMock, PinMock, PinMock, PinMock>;

struct Pins {
    step: PinMock,
    dir: PinMock,
    enable: PinMock,
    endstop: PinMock,
}

impl Pins {
    fn new(
        step: &[PinTransaction],
        dir: &[PinTransaction],
        enable: &[PinTransaction],
        endstop: &[PinTransaction],
    ) -> Self {
        Self {
            step: PinMock::new(step),
            dir: PinMock::new(dir),
            enable: PinMock::new(enable),
            endstop: PinMock::new(endstop),
        }
    }

    fn idle() -> Self {
        Self::new(&[], &[], &[], &[])
    }

    fn driver(&self) -> MockDriver {
        PinAxisDriver::builder()
            .step_pin(self.step.clone())
            .dir_pin(self.dir.clone())
            .enable_pin(self.enable.clone())
            .endstop_pin(self.endstop.clone())
            .build()
            .expect("all pins given")
    }

    fn done(mut self) {
        self.step.done();
        self.dir.done();
        self.enable.done();
        self.endstop.done();
    }
}

fn pulse() -> [PinTransaction; 2] {
    [
        PinTransaction::set(State::High),
        PinTransaction::set(State::Low),
    ]
}

/// Test pin levels for enable, direction, pulse and endstop.
#[test]
fn test_pin_levels() {
    let pins = Pins::new(
        &pulse(),
        &[PinTransaction::set(State::Low)],
        &[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ],
        &[PinTransaction::get(State::High)],
    );
    let mut driver = pins.driver();

    // Enable is active low by default.
    driver.set_enabled(true).unwrap();
    driver.set_direction(Direction::Reverse).unwrap();
    // Unchanged direction is not written again.
    driver.set_direction(Direction::Reverse).unwrap();
    driver.pulse().unwrap();
    assert_eq!(driver.read_endstop(), Ok(true));
    driver.set_enabled(false).unwrap();

    drop(driver);
    pins.done();
}

/// Test direction inversion and enable polarity taken from configuration.
#[test]
fn test_polarity_from_config() {
    let config = parse_config(
        r#"
[selector]
steps_per_mm = 80.0
offset = 5.0
spacing = 21.0

[revolver]
steps_per_revolution = 8640

[feeder]
steps_per_mm = 100.0

[feeder.motor]
invert_direction = true
"#,
    )
    .unwrap();
    let constraints = MechanicalConstraints::for_axis(&config, AxisId::Feeder);

    let pins = Pins::new(
        &[],
        &[
            PinTransaction::set(State::Low),
            PinTransaction::set(State::High),
        ],
        &[PinTransaction::set(State::High)],
        &[],
    );
    let mut driver: MockDriver = PinAxisDriver::builder()
        .step_pin(pins.step.clone())
        .dir_pin(pins.dir.clone())
        .enable_pin(pins.enable.clone())
        .endstop_pin(pins.endstop.clone())
        .from_constraints(&constraints)
        .enable_active_high(true)
        .build()
        .unwrap();

    driver.set_direction(Direction::Forward).unwrap();
    driver.set_direction(Direction::Reverse).unwrap();
    driver.set_enabled(true).unwrap();

    drop(driver);
    pins.done();
}

/// Test the interrupt pump pulsing real pins.
#[test]
fn test_pump_drives_pins() {
    let steps: Vec<PinTransaction> = (0..3).flat_map(|_| pulse()).collect();
    let feeder = Pins::new(
        &steps,
        &[PinTransaction::set(State::High)],
        &[PinTransaction::set(State::Low)],
        &[],
    );
    let selector = Pins::idle();
    let revolver = Pins::idle();

    let pump = InterruptPump::new(
        selector.driver(),
        revolver.driver(),
        feeder.driver(),
    );
    pump.set_enabled(AxisId::Feeder, true).unwrap();
    pump.begin_move(
        AxisId::Feeder,
        MovePlan::new(3, 1000.0, 1000.0).unwrap(),
        false,
    )
    .unwrap();

    while !pump.shared(AxisId::Feeder).is_done() {
        pump.on_tick();
    }
    assert_eq!(pump.shared(AxisId::Feeder).position(), Steps(3));

    drop(pump);
    feeder.done();
    selector.done();
    revolver.done();
}
