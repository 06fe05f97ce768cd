use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tandem::bus::RomImage;
use tandem::db::{Command as DbCommand, Debugger};
use tandem::error::Result;
use tandem::sched::{Scheduler, SchedulerConfig, Which};

//===========================================================================//

#[derive(Parser)]
#[clap(author, about, long_about = None, version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs a LoROM cartridge image on both processors.
    Run {
        /// The cartridge image to load.
        rom: PathBuf,
        /// A debugger script to run instead of free-running.
        #[clap(long)]
        script: Option<PathBuf>,
        /// How many steps to free-run for when there is no script.
        #[clap(long, default_value_t = 1_000_000)]
        steps: u64,
    },
    /// Disassembles main CPU code starting at the reset vector.
    Disasm {
        /// The cartridge image to load.
        rom: PathBuf,
        /// How many instructions to disassemble.
        #[clap(long, default_value_t = 32)]
        count: u32,
    },
}

//===========================================================================//

fn main() -> ExitCode {
    let env = env_logger::Env::default().default_filter_or("warn");
    env_logger::Builder::from_env(env).init();
    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match command {
        Command::Run { rom, script: Some(script), .. } => {
            let source = fs::read_to_string(&script)?;
            let mut debugger = Debugger::new(load(&rom)?);
            debugger.run_script(&source, &mut out)?;
        }
        Command::Run { rom, script: None, steps } => {
            let mut debugger = Debugger::new(load(&rom)?);
            let scheduler = debugger.scheduler_mut();
            let taken = scheduler.run(steps, || false)?;
            writeln!(
                out,
                "ran {taken} steps over {} frames ({} master cycles)",
                scheduler.frame(),
                scheduler.clock()
            )?;
            debugger.execute(DbCommand::Regs, &mut out)?;
        }
        Command::Disasm { rom, count } => {
            let mut debugger = Debugger::new(load(&rom)?);
            let which = Which::Cpu;
            debugger.execute(DbCommand::Disasm { which, count }, &mut out)?;
        }
    }
    Ok(())
}

fn load(path: &Path) -> Result<Scheduler> {
    let image = RomImage::read_from(BufReader::new(File::open(path)?))?;
    match image.title() {
        Some(title) => info!("loaded {title:?} from {}", path.display()),
        None => warn!("{} has no cartridge header", path.display()),
    }
    if !image.checksum_matches_complement() {
        warn!("cartridge checksum does not match its complement");
    }
    Scheduler::from_rom(SchedulerConfig::default(), image.data())
}

//===========================================================================//
