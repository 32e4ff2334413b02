//! Example: a full router session against simulated hardware.
//!
//! Homes the selector and revolver, selects a channel, loads filament up to
//! the feeder endstop, then unloads it again. Timer interrupts are simulated
//! by the delay provider: every wait fires the pump once per tick period.
//!
//! Run with: `cargo run --example simulated_router --features std`

use embedded_hal::delay::DelayNs;

use filament_router::{
    axis::AxisDriver,
    error::MotorError,
    io::{Feedback, FeedbackSink, Prompt, Signal, SignalChannel},
    parse_config, AxisId, Direction, InterruptPump, MemoryStorage, PositionStore, Result, Router,
};

const CONFIG: &str = r#"
tool_count = 5
bowden_length = 120.0

[selector]
steps_per_mm = 80.0
offset = 5.0
spacing = 21.0

[selector.motor]
max_speed = 12000.0
acceleration = 30000.0
homing_speed = 6000.0

[revolver]
steps_per_revolution = 1600

[revolver.motor]
max_speed = 8000.0
acceleration = 20000.0

[feeder]
steps_per_mm = 100.0
insert_speed = 4000.0

[feeder.motor]
max_speed = 20000.0
acceleration = 40000.0
"#;

/// Simulated axis: counts position and raises its endstop in a window.
struct SimAxis {
    position: i32,
    endstop: fn(i32) -> bool,
    direction: Direction,
}

impl SimAxis {
    fn new(position: i32, endstop: fn(i32) -> bool) -> Self {
        Self {
            position,
            endstop,
            direction: Direction::Forward,
        }
    }
}

impl AxisDriver for SimAxis {
    fn pulse(&mut self) -> core::result::Result<(), MotorError> {
        self.position += self.direction.sign();
        Ok(())
    }

    fn read_endstop(&mut self) -> core::result::Result<bool, MotorError> {
        Ok((self.endstop)(self.position))
    }

    fn set_enabled(&mut self, _enabled: bool) -> core::result::Result<(), MotorError> {
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> core::result::Result<(), MotorError> {
        self.direction = direction;
        Ok(())
    }
}

/// Delay provider standing in for the timer interrupt.
struct TickingDelay<'p> {
    pump: &'p InterruptPump<SimAxis>,
    pending_ns: u64,
}

impl DelayNs for TickingDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        let tick_ns = self.pump.tick_period_us() as u64 * 1_000;
        self.pending_ns += ns as u64;
        while self.pending_ns >= tick_ns {
            self.pump.on_tick();
            self.pending_ns -= tick_ns;
        }
    }
}

/// Prints everything the router reports and accepts every prompt.
struct Console;

impl SignalChannel for Console {
    fn signal(&mut self, signal: Signal) {
        println!("  signal: {signal:?}");
    }
}

impl FeedbackSink for Console {
    fn notify(&mut self, feedback: Feedback) {
        println!("  feedback: {feedback:?}");
    }

    fn confirm(&mut self, prompt: Prompt) -> bool {
        println!("  prompt: {prompt:?} -> yes");
        true
    }
}

fn main() -> Result<()> {
    println!("=== Simulated Router Session ===\n");

    let config = parse_config(CONFIG)?;
    println!(
        "Loaded config: {} channels, {} mm bowden",
        config.tool_count,
        config.bowden_length.value()
    );

    // Selector parked 40 mm out, revolver flag every turn, feeder
    // endstop 25 mm in.
    let pump = InterruptPump::new(
        SimAxis::new(3200, |p| p <= 0),
        SimAxis::new(400, |p| p.rem_euclid(1600) < 8),
        SimAxis::new(0, |p| p >= 2500),
    )
    .with_tick_period(10);

    let delay = TickingDelay {
        pump: &pump,
        pending_ns: 0,
    };
    let mut router = Router::new(
        &pump,
        delay,
        config,
        PositionStore::new(MemoryStorage::<64>::new()),
        Console,
    )?;

    println!("\nHoming selector and revolver...");
    router.home_all()?;
    report(&router);

    println!("\nSelecting channel 2...");
    router.select_channel(2)?;
    report(&router);

    println!("\nLoading filament...");
    router.load_filament()?;
    report(&router);

    println!("\nUnloading filament...");
    router.unload_filament()?;
    report(&router);

    let record = router.store().storage().as_bytes();
    println!("\nPersisted record: {:02x?}", &record[..filament_router::persist::RECORD_LEN]);

    println!("\n=== Session complete ===");
    Ok(())
}

fn report<D, DELAY, S, IO>(router: &Router<'_, D, DELAY, S, IO>)
where
    D: AxisDriver,
    DELAY: DelayNs,
    S: embedded_storage::Storage,
    IO: SignalChannel + FeedbackSink,
{
    println!(
        "  state: {}, channel: {:?}",
        router.state(),
        router.selected()
    );
    for axis in [AxisId::Selector, AxisId::Revolver, AxisId::Feeder] {
        println!(
            "  {:?}: {} steps ({:.2})",
            axis,
            router.position(axis).value(),
            router.position_units(axis)
        );
    }
}
