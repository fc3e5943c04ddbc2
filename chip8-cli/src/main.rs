//! Entrypoint for CLI
use std::{env, error::Error, fs, io, time::Instant};

use chip8::{prelude::*, IMPL_VERSION};
use log::{debug, info};

use crate::{
    clock::Clock,
    config::CliConf,
    error::AppError,
    host::{write_display, TerminalHost},
};

mod clock;
mod config;
mod error;
mod host;

static USAGE: &str = r#"
usage: chip8 CMD FILE [CONFIG]

commands:
    run     Run the target ROM file, with an optional YAML config
    dis     Disassemble the target ROM into readable assembly

examples:
    chip8 run maze.rom
    chip8 run breakout.rom breakout.yaml
    chip8 dis breakout.rom
"#;

fn run_bytecode(filepath: &str, config: Option<&str>) -> Result<(), AppError> {
    let conf = match config {
        Some(path) => CliConf::from_file(path)?,
        None => CliConf::default(),
    };
    info!("running {filepath} at {}Hz", conf.clock_frequency.0);

    let mut vm = Chip8Vm::new(conf.vm.clone());
    vm.load_rom(filepath)?;

    let stdout = io::stdout();
    let mut host = TerminalHost::new(stdout.lock(), conf.render, conf.held_keys.clone());
    let mut clock = Clock::new(conf.clock_frequency);

    let start = Instant::now();
    let mut steps = 0;
    loop {
        if conf.max_steps.map(|max| steps >= max).unwrap_or(false) {
            info!("step limit reached");
            break;
        }

        let pc = vm.pc();
        let step = vm.cycle(&mut host)?;
        steps += 1;

        if vm.is_halted() {
            info!("machine halted");
            debug!("{}", vm.dump_registers()?);
            break;
        }
        if conf.stop_on_idle && step.flow == Flow::Jump && vm.pc() == pc {
            info!("program is idle at 0x{pc:04X}");
            break;
        }

        clock.wait();
    }
    drop(host);

    info!(
        "{steps} steps in {}ms",
        start.elapsed().as_nanos() as f64 / 1000000.0
    ); // to millis

    write_display(&mut io::stdout(), vm.display())?;

    Ok(())
}

fn run_disassembler(filepath: &str) -> Result<(), AppError> {
    let bytecode = fs::read(filepath)?;
    print!("{}", Disassembler::new(&bytecode).to_listing()?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    simple_logger::SimpleLogger::new().env().init()?;

    match parse_args() {
        Some(Cmd::Run { filepath, config }) => run_bytecode(&filepath, config.as_deref())?,
        Some(Cmd::Dis { filepath }) => run_disassembler(&filepath)?,
        None => {
            print_usage();
            // FreeBSD EX_USAGE (64)
            std::process::exit(64)
        }
    }

    Ok(())
}

fn parse_args() -> Option<Cmd> {
    let mut args = env::args().skip(1);
    match args.next()?.as_str() {
        "run" => Some(Cmd::Run {
            filepath: args.next()?,
            config: args.next(),
        }),
        "dis" => Some(Cmd::Dis {
            filepath: args.next()?,
        }),
        _ => None,
    }
}

fn print_usage() {
    println!("Chip8 v{IMPL_VERSION}");
    println!("{USAGE}");
}

enum Cmd {
    /// Run file
    Run {
        filepath: String,
        config: Option<String>,
    },
    /// Disassemble
    Dis { filepath: String },
}
