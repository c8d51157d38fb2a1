use super::{DrivePins, Voice};
use crate::gpio::PinBus;
use log::{debug, warn};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Steps before the head reverses; one full sweep of a 3.5" drive.
pub const MAX_STEPS: u32 = 80;

/// Pulse spacing while homing the head.
pub const RESEED_INTERVAL: Duration = Duration::from_micros(2500);

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Head position bookkeeping: steps taken in the current direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stepper {
    steps: u32,
    direction: bool,
}

impl Stepper {
    /// State right after homing: no steps taken, moving away from home.
    pub fn homed() -> Self {
        Self {
            steps: 0,
            direction: true,
        }
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn direction(&self) -> bool {
        self.direction
    }

    /// Counts one step. Returns the new direction when travel reverses.
    pub fn advance(&mut self) -> Option<bool> {
        self.steps += 1;
        if self.steps < MAX_STEPS {
            return None;
        }
        self.steps = 0;
        self.direction = !self.direction;
        Some(self.direction)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActuatorOptions {
    pub reseed_interval: Duration,
}

impl Default for ActuatorOptions {
    fn default() -> Self {
        Self {
            reseed_interval: RESEED_INTERVAL,
        }
    }
}

#[derive(Debug)]
struct Control {
    frequency: f64,
    /// Bumped on every frequency change; ends a period sleep early.
    generation: u64,
    alive: bool,
}

#[derive(Debug)]
struct Shared {
    control: Mutex<Control>,
    wake: Condvar,
}

/// One floppy drive driven by its own timing thread.
///
/// While the frequency is zero the thread blocks on a condition
/// variable; otherwise it emits one step pulse per period. A frequency
/// change cuts the current period short.
pub struct Drive {
    index: usize,
    pins: DrivePins,
    bus: Arc<dyn PinBus>,
    homed: Stepper,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Drive {
    /// Configures the pins and homes the head. The timing thread is not
    /// running yet; see [`Drive::start`].
    pub fn new(index: usize, pins: DrivePins, bus: Arc<dyn PinBus>, options: ActuatorOptions) -> Self {
        bus.make_output(pins.direction);
        bus.make_output(pins.step);
        let homed = reseed(bus.as_ref(), pins, options.reseed_interval);
        debug!("Drive {} homed ({:?})", index, pins);

        Self {
            index,
            pins,
            bus,
            homed,
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    frequency: 0.0,
                    generation: 0,
                    alive: true,
                }),
                wake: Condvar::new(),
            }),
            handle: None,
        }
    }

    /// Creates and starts a drive.
    pub fn spawn(
        index: usize,
        pins: DrivePins,
        bus: Arc<dyn PinBus>,
        options: ActuatorOptions,
    ) -> std::io::Result<Self> {
        let mut drive = Self::new(index, pins, bus, options);
        drive.start()?;
        Ok(drive)
    }

    /// Spawns the timing thread. Does nothing if it already runs or the
    /// drive has been shut down.
    pub fn start(&mut self) -> std::io::Result<()> {
        if self.handle.is_some() || !self.is_alive() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let bus = Arc::clone(&self.bus);
        let pins = self.pins;
        let stepper = self.homed;
        let handle = thread::Builder::new()
            .name(format!("drive-{}", self.index))
            .spawn(move || run_loop(&shared, bus.as_ref(), pins, stepper))?;
        self.handle = Some(handle);
        debug!("Drive {} started", self.index);
        Ok(())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn pins(&self) -> DrivePins {
        self.pins
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    fn is_alive(&self) -> bool {
        self.shared.control.lock().map(|c| c.alive).unwrap_or(false)
    }

    pub fn frequency(&self) -> f64 {
        self.shared
            .control
            .lock()
            .map(|c| c.frequency)
            .unwrap_or(0.0)
    }

    /// Silences the drive; the thread keeps running.
    pub fn stop(&self) {
        self.set_frequency(0.0);
    }

    /// Stops and joins the timing thread. Safe to call repeatedly and on
    /// a drive that was never started.
    pub fn shutdown(&mut self) {
        if let Ok(mut control) = self.shared.control.lock() {
            control.alive = false;
            control.frequency = 0.0;
        }
        self.shared.wake.notify_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Drive {} thread panicked", self.index);
            }
            debug!("Drive {} stopped", self.index);
        }
    }
}

impl Voice for Drive {
    fn set_frequency(&self, frequency: f64) {
        let frequency = if frequency.is_finite() && frequency > 0.0 {
            frequency
        } else {
            0.0
        };
        let Ok(mut control) = self.shared.control.lock() else {
            return;
        };
        if control.frequency == frequency {
            return;
        }
        control.frequency = frequency;
        control.generation = control.generation.wrapping_add(1);
        drop(control);
        self.shared.wake.notify_all();
    }
}

impl Drop for Drive {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Moves the head to its home end and leaves it pointing outwards.
fn reseed(bus: &dyn PinBus, pins: DrivePins, interval: Duration) -> Stepper {
    bus.clear(pins.direction);
    for _ in 0..MAX_STEPS {
        bus.pulse(pins.step);
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
    bus.set(pins.direction);
    Stepper::homed()
}

fn run_loop(shared: &Shared, bus: &dyn PinBus, pins: DrivePins, mut stepper: Stepper) {
    loop {
        bus.pulse(pins.step);
        if let Some(direction) = stepper.advance() {
            if direction {
                bus.set(pins.direction);
            } else {
                bus.clear(pins.direction);
            }
        }

        let Ok(control) = shared.control.lock() else {
            return;
        };
        let Ok(control) = shared
            .wake
            .wait_while(control, |c| c.alive && c.frequency == 0.0)
        else {
            return;
        };
        if !control.alive {
            break;
        }

        // Sleeps one period unless shutdown or a retune interrupts it.
        let period = Duration::from_nanos((NANOS_PER_SECOND / control.frequency) as u64);
        let generation = control.generation;
        let Ok((control, wait)) = shared
            .wake
            .wait_timeout_while(control, period, |c| c.alive && c.generation == generation)
        else {
            return;
        };
        if !control.alive {
            break;
        }
        if !wait.timed_out() && control.frequency == 0.0 {
            // Silenced mid-period: no pulse until the next note.
            let Ok(control) = shared
                .wake
                .wait_while(control, |c| c.alive && c.frequency == 0.0)
            else {
                return;
            };
            if !control.alive {
                break;
            }
        }
    }
}
