use std::thread;
use std::time::{Duration, Instant};

use chip8_vm::{
    emu::{Chip8, Chip8Error, Chip8Runner, RunnerConfig},
    u4,
};

fn runner(program: &[u16], config: RunnerConfig) -> Chip8Runner {
    let bytes: Vec<u8> = program.iter().flat_map(|w| w.to_be_bytes()).collect();
    let mut chip8 = Chip8::with_seed(7);
    chip8.load(&bytes).unwrap();
    Chip8Runner::new(chip8, config)
}

#[test]
fn renderer_sees_frames_from_running_machine() {
    // LD V0, 8; LD I, 0; DRW V0, V0, 5; JP 0x206
    let runner = runner(&[0x6008, 0xA000, 0xD005, 0x1206], RunnerConfig::unthrottled());
    let screen = runner.screen_handle();
    let stop = runner.stop_handle();
    let machine = runner.spawn().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !screen.pixel(8, 8) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }

    stop.stop();
    let chip8 = machine.join().unwrap().unwrap();
    assert!(screen.pixel(8, 8));
    assert_eq!(screen.snapshot(), *chip8.screen().pixels());
    assert_eq!(chip8.registers().pc, 0x206);
}

#[test]
fn timers_keep_ageing_while_blocked_on_key() {
    // LD V0, 30; LD DT, V0; LD V1, K; LD V2, DT; JP 0x208
    let program = [0x601E, 0xF015, 0xF10A, 0xF207, 0x1208];
    let runner = runner(&program, RunnerConfig::unthrottled());
    let keys = runner.keypad_handle();
    let stop = runner.stop_handle();
    let machine = runner.spawn().unwrap();

    // 200ms is about 12 ticks at 60Hz.
    thread::sleep(Duration::from_millis(200));
    keys.press(u4::new(0x7));
    thread::sleep(Duration::from_millis(50));

    stop.stop();
    let chip8 = machine.join().unwrap().unwrap();
    let regs = chip8.registers();
    assert_eq!(regs.v[1], 0x7);
    assert!(regs.v[2] <= 25, "delay timer was {} on resume", regs.v[2]);
    assert_eq!(regs.pc, 0x208);
}

#[test]
fn stop_while_blocked_on_key() {
    let runner = runner(&[0xF00A], RunnerConfig::default());
    let stop = runner.stop_handle();
    let machine = runner.spawn().unwrap();

    thread::sleep(Duration::from_millis(50));
    let stop_requested = Instant::now();
    stop.stop();
    let chip8 = machine.join().unwrap().unwrap();

    assert!(stop_requested.elapsed() < Duration::from_secs(1));
    assert!(chip8.is_waiting_for_key());
    assert_eq!(chip8.registers().pc, 0x200);
}

#[test]
fn key_released_and_pressed_again_is_a_new_press() {
    // LD V0, K; LD V1, K; JP 0x204
    let runner = runner(&[0xF00A, 0xF10A, 0x1204], RunnerConfig::unthrottled());
    let keys = runner.keypad_handle();
    let stop = runner.stop_handle();
    let machine = runner.spawn().unwrap();

    thread::sleep(Duration::from_millis(30));
    keys.press(u4::new(0x4));
    thread::sleep(Duration::from_millis(30));
    keys.press(u4::new(0x4)); // still held, ignored
    thread::sleep(Duration::from_millis(30));
    keys.release(u4::new(0x4));
    keys.press(u4::new(0x4));
    thread::sleep(Duration::from_millis(30));

    stop.stop();
    let chip8 = machine.join().unwrap().unwrap();
    assert_eq!(chip8.registers().v[0], 0x4);
    assert_eq!(chip8.registers().v[1], 0x4);
    assert_eq!(chip8.registers().pc, 0x204);
}

#[test]
fn unknown_opcode_halts_the_thread() {
    let runner = runner(&[0x6001, 0x0000], RunnerConfig::unthrottled());
    let machine = runner.spawn().unwrap();

    let err = machine.join().unwrap().unwrap_err();
    assert!(matches!(
        err,
        Chip8Error::UnknownOpcode {
            opcode: 0x0000,
            address: 0x202
        }
    ));
}

#[test]
fn paced_execution_is_throttled() {
    // 20 x ADD V0, 1, then an unknown opcode to halt.
    let mut program = vec![0x7001; 20];
    program.push(0x0000);
    let runner = runner(&program, RunnerConfig::with_hz(50.0).unwrap());

    let start = Instant::now();
    let err = runner.spawn().unwrap().join().unwrap().unwrap_err();

    assert!(matches!(err, Chip8Error::UnknownOpcode { address: 0x228, .. }));
    assert!(start.elapsed() >= Duration::from_millis(350));
}

#[test]
fn oversized_program_is_rejected() {
    let mut chip8 = Chip8::new();
    let err = chip8.load(&vec![0; 4096 - 512 + 1]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Program is too large (3585 bytes), max size is 3584 bytes"
    );
    assert!(chip8.memory().as_bytes()[0x200..].iter().all(|&b| b == 0));
}
