use std::{path::PathBuf, sync::Arc, thread::JoinHandle, time::Instant};

use anyhow::{Context, anyhow};
use clap::Parser;
use clap_num::maybe_hex;
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key, KeyCode, NamedKey},
    window::{Window, WindowId},
};

use chip8_vm::{
    emu::{
        CPU_HZ, Chip8, Chip8Error, Chip8Runner, DISPLAY_X, DISPLAY_Y, Display, KeypadHandle,
        RunnerConfig, ScreenHandle, StopHandle, load_program_file,
    },
    u4,
};

/// The rate at which pixels fade out (phosphor decay).
const DISPLAY_PHOSPHOR_RATE: f32 = 10.0;

/// Mapping from physical keyboard keys to CHIP-8 hex keypad (0x0-0xF).
const KEY_MAP: [KeyCode; 16] = [
    KeyCode::KeyX,   // 0x00
    KeyCode::Digit1, // 0x01
    KeyCode::Digit2, // 0x02
    KeyCode::Digit3, // 0x03
    KeyCode::KeyQ,   // 0x04
    KeyCode::KeyW,   // 0x05
    KeyCode::KeyE,   // 0x06
    KeyCode::KeyA,   // 0x07
    KeyCode::KeyS,   // 0x08
    KeyCode::KeyD,   // 0x09
    KeyCode::KeyZ,   // 0x0A
    KeyCode::KeyC,   // 0x0B
    KeyCode::Digit4, // 0x0C
    KeyCode::KeyR,   // 0x0D
    KeyCode::KeyF,   // 0x0E
    KeyCode::KeyV,   // 0x0F
];

type MachineThread = JoinHandle<Result<Chip8, Chip8Error>>;

struct App {
    pixels: Option<Pixels<'static>>,
    window: Option<Arc<Window>>,
    scale: u32,
    /// Stores the brightness of each pixel (0.0 to 1.0) to implement phosphor decay.
    display_float: Display<f32>,

    screen: ScreenHandle,
    keys: KeypadHandle,
    stop: StopHandle,
    machine: Option<MachineThread>,
    /// Used for delta time calculation.
    last_frame_instant: Instant,

    /// Stores the result of the application to be returned from main.
    exit_result: anyhow::Result<()>,
}

impl App {
    fn new(runner: Chip8Runner, scale: u32) -> anyhow::Result<Self> {
        let screen = runner.screen_handle();
        let keys = runner.keypad_handle();
        let stop = runner.stop_handle();
        let machine = runner
            .spawn()
            .context("Failed to spawn the CHIP-8 thread")?;

        Ok(Self {
            pixels: None,
            window: None,
            scale,
            display_float: [[0.0; DISPLAY_X]; DISPLAY_Y],

            screen,
            keys,
            stop,
            machine: Some(machine),
            last_frame_instant: Instant::now(),
            exit_result: Ok(()),
        })
    }

    fn process_display(&mut self, dt: f32) -> anyhow::Result<()> {
        let frame = self.screen.snapshot();
        let buff = self
            .pixels
            .as_mut()
            .context("Pixels surface not initialized")?
            .frame_mut();

        for (i, pxl) in buff.chunks_exact_mut(4).enumerate() {
            let x = i % DISPLAY_X;
            let y = i / DISPLAY_X;

            // Lit pixels jump to full brightness, unlit ones fade out over time.
            self.display_float[y][x] = if frame[y][x] {
                1.0
            } else {
                (self.display_float[y][x] - DISPLAY_PHOSPHOR_RATE * dt).max(0.0)
            };

            let rgba = [0, 0xff, 0, (self.display_float[y][x] * 255.0) as u8];
            pxl.copy_from_slice(&rgba);
        }

        Ok(())
    }

    /// Stops the machine thread and surfaces how it ended.
    fn shutdown(&mut self) -> anyhow::Result<()> {
        let Some(machine) = self.machine.take() else {
            return Ok(());
        };

        self.stop.stop();
        let chip8 = machine
            .join()
            .map_err(|_| anyhow!("CHIP-8 thread panicked"))?
            .context("Chip8 Execution error")?;

        log::info!("Final state: {}", chip8.registers());
        Ok(())
    }

    fn try_resumed(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window = {
            let size = LogicalSize::new(
                DISPLAY_X as u32 * self.scale,
                DISPLAY_Y as u32 * self.scale,
            );
            let min_size = LogicalSize::new(DISPLAY_X as u32, DISPLAY_Y as u32);

            Arc::new(
                event_loop
                    .create_window(
                        Window::default_attributes()
                            .with_title("chip8-vm")
                            .with_inner_size(size)
                            .with_min_inner_size(min_size),
                    )
                    .context("Failed to create window")?,
            )
        };

        self.window = Some(window.clone());
        self.pixels = {
            let window_size = window.inner_size();
            let surface_texture =
                SurfaceTexture::new(window_size.width, window_size.height, window.clone());

            let pixels = Pixels::new(DISPLAY_X as u32, DISPLAY_Y as u32, surface_texture)
                .context("Failed to create pixels surface")?;

            window.request_redraw();
            Some(pixels)
        };

        // Avoid large dt on first frame
        self.last_frame_instant = Instant::now();
        Ok(())
    }

    fn try_window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        event: WindowEvent,
    ) -> anyhow::Result<()> {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.pixels
                    .as_mut()
                    .context("Pixels surface not initialized")?
                    .resize_surface(size.width, size.height)
                    .context("Failed to resize pixels surface")?;
            }

            WindowEvent::RedrawRequested => {
                // The machine only stops on its own after a fatal error.
                if self.machine.as_ref().is_some_and(|m| m.is_finished()) {
                    self.shutdown()?;
                    event_loop.exit();
                    return Ok(());
                }

                let now = Instant::now();
                let dt = (now - self.last_frame_instant).as_secs_f32();
                self.last_frame_instant = now;

                self.process_display(dt)?;

                self.pixels
                    .as_ref()
                    .context("Pixels surface not initialized")?
                    .render()
                    .context("Pixels render error")?;

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(key) = KEY_MAP.iter().position(|&k| k == event.physical_key) {
                    let pressed = event.state == ElementState::Pressed;
                    self.keys.set_key(u4::new(key as u8), pressed);
                }
            }

            _ => (),
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.try_resumed(event_loop) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Err(e) = self.try_window_event(event_loop, event) {
            self.exit_result = Err(e);
            event_loop.exit();
        }
    }
}

/// CHIP-8 emulator written in Rust.
///
/// Keys 1-4, Q-R, A-F, Z-V map to CHIP-8 keys.
/// Escape is used to exit the emulator.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Path to the CHIP-8 ROM file
    rom_path: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = CPU_HZ, value_parser = parse_hz)]
    hz: f32,

    /// Run instructions back to back with no pacing delay
    #[arg(long, conflicts_with = "hz")]
    unthrottled: bool,

    /// Seed for the random number generator (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = maybe_hex::<u64>)]
    seed: Option<u64>,

    /// Window scale factor
    #[arg(long, default_value_t = 10)]
    scale: u32,

    /// Log every executed instruction with the register state
    #[arg(long)]
    trace: bool,
}

fn parse_hz(s: &str) -> Result<f32, String> {
    let hz: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if hz.is_finite() && hz > 0.0 {
        Ok(hz)
    } else {
        Err(format!("{hz} is not a positive instruction rate"))
    }
}

fn init_logger(trace: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if trace {
        builder.filter_module("chip8_vm", log::LevelFilter::Trace);
    }
    builder.init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.trace);

    let rom = load_program_file(&args.rom_path).context("Failed to read ROM file")?;

    let mut chip8 = match args.seed {
        Some(seed) => Chip8::with_seed(seed),
        None => Chip8::new(),
    };
    chip8
        .load(&rom)
        .context("Failed to load ROM into CHIP-8 memory")?;

    let config = if args.unthrottled {
        RunnerConfig::unthrottled()
    } else {
        RunnerConfig::with_hz(args.hz).context("Invalid instruction rate")?
    };

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(Chip8Runner::new(chip8, config), args.scale)
        .context("Failed to initialize application")?;
    let run_result = event_loop
        .run_app(&mut app)
        .context("Error occurred during event loop execution");

    // Always stop and join the machine thread, even if the window failed.
    let shutdown_result = app.shutdown();

    run_result?;
    app.exit_result?;
    shutdown_result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hz_must_be_positive() {
        assert_eq!(parse_hz("500"), Ok(500.0));
        assert!(parse_hz("0").is_err());
        assert!(parse_hz("-1").is_err());
        assert!(parse_hz("NaN").is_err());
        assert!(parse_hz("fast").is_err());
    }

    #[test]
    fn zero_hz_is_a_usage_error() {
        let err = Args::try_parse_from(["emu", "rom.ch8", "--hz", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
