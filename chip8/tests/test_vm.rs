use chip8::{constants::*, prelude::*};

const MAZE: &[u8] = include_bytes!("../programs/maze");

fn new_vm(program: &[u8]) -> Chip8Vm {
    let mut vm = Chip8Vm::new(Chip8Conf {
        rng_seed: Some(42),
        ..Default::default()
    });
    vm.load_bytecode(program).unwrap();
    vm
}

/// Host double that records what the VM handed it.
#[derive(Default)]
struct Recorder {
    cycle: usize,
    press_from: Option<usize>,
    draws: Vec<usize>,
    beeps: Vec<usize>,
}

impl Devices for Recorder {
    fn poll_keys(&mut self, keys: &mut Keypad) {
        self.cycle += 1;
        if let Some(from) = self.press_from {
            keys.set(KeyCode::Key0, self.cycle >= from);
        }
    }

    fn draw(&mut self, display: &DisplayBuffer) {
        assert!(display.is_dirty());
        self.draws.push(self.cycle);
    }

    fn beep(&mut self) {
        self.beeps.push(self.cycle);
    }
}

#[test]
fn test_maze_runs_to_completion() {
    let mut vm = new_vm(MAZE);

    vm.run_steps(2000).unwrap();

    // The program parks itself on `JP 0x218` when the maze is full.
    assert_eq!(vm.pc(), 0x218);
    assert_eq!(vm.register(1), 0x20);
    assert!(vm.display().pixels().iter().any(|px| *px));
    assert!(vm.is_display_dirty());

    let dump = vm.dump_display().unwrap();
    assert_eq!(dump.lines().count(), DISPLAY_HEIGHT);
    assert!(dump.lines().all(|line| line.len() == DISPLAY_WIDTH));
}

#[test]
fn test_maze_is_deterministic_with_seed() {
    let mut a = new_vm(MAZE);
    let mut b = new_vm(MAZE);
    a.run_steps(2000).unwrap();
    b.run_steps(2000).unwrap();

    assert_eq!(a.dump_display().unwrap(), b.dump_display().unwrap());
}

#[test]
#[rustfmt::skip]
fn test_host_cycle() {
    let mut vm = new_vm(&[
        0x60, 0x02, // 200: LD v0, 2
        0xF0, 0x18, // 202: LD ST, v0
        0x00, 0xE0, // 204: CLS
        0xE1, 0x9E, // 206: SKP v1
        0x12, 0x08, // 208: JP 0x208
        0x12, 0x0A, // 20A: JP 0x20A
    ]);
    let mut host = Recorder {
        press_from: Some(4),
        ..Default::default()
    };

    for _ in 0..6 {
        vm.cycle(&mut host).unwrap();
    }

    assert_eq!(host.draws, [3]);
    assert_eq!(host.beeps, [3]);
    assert!(!vm.is_display_dirty());
    // Key 0 was held by the host when SKP ran.
    assert_eq!(vm.pc(), 0x20A);
}

#[test]
#[rustfmt::skip]
fn test_timers_reach_zero_independently() {
    let mut vm = new_vm(&[
        0x60, 0x05, // 200: LD v0, 5
        0x61, 0x03, // 202: LD v1, 3
        0xF0, 0x15, // 204: LD DT, v0
        0x12, 0x06, // 206: JP 0x206
    ]);
    vm.run_steps(2).unwrap();

    // Counting includes the step that sets the timer.
    let mut steps = 0;
    loop {
        vm.step().unwrap();
        steps += 1;
        if vm.delay_timer() == 0 {
            break;
        }
    }
    assert_eq!(steps, 5);

    let mut vm = new_vm(&[
        0x61, 0x03, // 200: LD v1, 3
        0xF1, 0x18, // 202: LD ST, v1
        0x12, 0x04, // 204: JP 0x204
    ]);
    vm.step().unwrap();

    let beeps: Vec<bool> = (0..5).map(|_| vm.step().unwrap().beep).collect();
    assert_eq!(beeps, [false, false, true, false, false]);
    assert_eq!(vm.sound_timer(), 0);
}

#[test]
fn test_oversized_rom_refuses_to_step() {
    let mut vm = Chip8Vm::new(Chip8Conf::default());
    let rom = vec![0x12; MAX_PROGRAM_SIZE + 2];

    match vm.load_bytecode(&rom) {
        Err(Chip8Error::LargeProgram(size)) => assert_eq!(size, MAX_PROGRAM_SIZE + 2),
        other => panic!("unexpected load result: {other:?}"),
    }
    assert!(matches!(vm.step(), Err(Chip8Error::NotLoaded)));
}

#[test]
fn test_interrupt() {
    let mut vm = new_vm(MAZE);
    vm.run_steps(10).unwrap();
    vm.interrupt();

    assert!(vm.is_halted());
    assert_eq!(vm.run_steps(10).unwrap(), 0);
    assert!(matches!(vm.step(), Err(Chip8Error::Halted)));

    // Loading again brings the machine back up.
    vm.load_bytecode(MAZE).unwrap();
    assert!(!vm.is_halted());
    assert_eq!(vm.pc(), MEM_START);
}

#[test]
fn test_disassemble_maze() {
    let listing = Disassembler::new(MAZE).to_listing().unwrap();
    let lines: Vec<&str> = listing.lines().collect();

    assert_eq!(lines.len(), MAZE.len() / 2);
    assert_eq!(lines[0], "0x0200 A21E LD I, 0x21E");
    assert_eq!(lines[1], "0x0202 C201 RND v2, 1");
    assert_eq!(lines[4], "0x0208 D014 DRW v0, v1, 4");
    assert_eq!(lines[12], "0x0218 1218 JP 0x218");
}
