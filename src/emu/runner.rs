use std::io;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::{Chip8, Chip8Error, Chip8Result, KeypadHandle, ScreenHandle, TIMER_HZ, TimerClock};

pub const CPU_HZ: f32 = 700.0;

// Upper bound on a single Fx0A wait slice, so a stop request is noticed quickly.
const MAX_KEY_WAIT: Duration = Duration::from_millis(16);

/// Pacing for the execution loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    /// Fixed delay between instruction cycles. Zero runs unthrottled.
    pub cycle_delay: Duration,
    /// Wall-clock period of one delay/sound timer tick.
    pub timer_period: Duration,
}

impl RunnerConfig {
    /// Paces execution at `hz` instructions per second.
    ///
    /// Returns `None` unless `hz` is positive and finite.
    pub fn with_hz(hz: f32) -> Option<Self> {
        if !(hz.is_finite() && hz > 0.0) {
            return None;
        }

        let cycle_delay = Duration::try_from_secs_f32(1.0 / hz).ok()?;
        Some(Self {
            cycle_delay,
            ..Self::default()
        })
    }

    pub fn unthrottled() -> Self {
        Self {
            cycle_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn timer_period(mut self, period: Duration) -> Self {
        self.timer_period = period;
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cycle_delay: Duration::from_secs_f32(1.0 / CPU_HZ),
            timer_period: Duration::from_secs_f32(1.0 / TIMER_HZ),
        }
    }
}

/// Cooperative shutdown signal for a running machine.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        log::debug!("Stop requested");
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Drives a [`Chip8`]: paces instruction cycles, ages the timers by wall
/// clock, publishes frames and parks on Fx0A without spinning.
pub struct Chip8Runner {
    chip8: Chip8,
    config: RunnerConfig,
    timers: TimerClock,
    screen: ScreenHandle,
    stop: StopHandle,
}

impl Chip8Runner {
    pub fn new(chip8: Chip8, config: RunnerConfig) -> Self {
        let screen = ScreenHandle::new();
        screen.publish(chip8.screen());

        Self {
            chip8,
            config,
            timers: TimerClock::new(config.timer_period, Instant::now()),
            screen,
            stop: StopHandle::default(),
        }
    }

    /// Renderer-side view of the display.
    pub fn screen_handle(&self) -> ScreenHandle {
        self.screen.clone()
    }

    /// Input-source side of the keypad.
    pub fn keypad_handle(&self) -> KeypadHandle {
        self.chip8.keypad_handle()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Runs one cycle and everything that hangs off it.
    ///
    /// While the machine is blocked on Fx0A this waits up to the next timer
    /// tick for a key press rather than returning immediately.
    pub fn step(&mut self) -> Result<Chip8Result, Chip8Error> {
        let result = self.chip8.cpu_cycle()?;

        match result {
            Chip8Result::DisplayUpdated => {
                self.screen.publish(self.chip8.screen());
            }
            Chip8Result::WaitingForKey => {
                let timeout = if self.timers.period().is_zero() {
                    MAX_KEY_WAIT
                } else {
                    self.timers.until_next_tick(Instant::now()).min(MAX_KEY_WAIT)
                };
                self.chip8.keypad_mut().wait_for_press(timeout);
            }
            Chip8Result::Continue => {}
        }

        self.update_timers(Instant::now());
        Ok(result)
    }

    /// Applies every timer tick that has fallen due by `now`.
    pub fn update_timers(&mut self, now: Instant) {
        for _ in 0..self.timers.poll(now) {
            self.chip8.timers_cycle();
        }
    }

    /// Runs until stopped (`Ok`) or until a fatal error halts the machine.
    pub fn run(&mut self) -> Result<(), Chip8Error> {
        log::info!(
            "Starting execution (cycle delay {:?}, timer period {:?})",
            self.config.cycle_delay,
            self.config.timer_period
        );

        let mut next_cycle = Instant::now();

        while !self.stop.is_stopped() {
            let result = self
                .step()
                .inspect_err(|e| log::error!("Execution halted: {e}"))?;

            if result == Chip8Result::WaitingForKey || self.config.cycle_delay.is_zero() {
                // Don't try to make up for time spent waiting.
                next_cycle = Instant::now();
                continue;
            }

            next_cycle += self.config.cycle_delay;
            let now = Instant::now();
            if next_cycle > now {
                thread::sleep(next_cycle - now);
            } else {
                next_cycle = now;
            }
        }

        log::info!("Stopped at PC {:03X}", self.chip8.registers().pc);
        Ok(())
    }

    /// Moves the runner onto its own thread.
    ///
    /// Grab the screen, keypad and stop handles before calling this. The thread
    /// hands the machine back on a clean stop.
    pub fn spawn(mut self) -> io::Result<JoinHandle<Result<Chip8, Chip8Error>>> {
        thread::Builder::new()
            .name("chip8-cpu".to_string())
            .spawn(move || {
                self.run()?;
                Ok(self.chip8)
            })
    }

    pub fn chip8_ref(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }
}
