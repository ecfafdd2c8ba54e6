use std::{
    io::{Read, Write},
    path::PathBuf,
};

use anyhow::{bail, Result};
use clap::Parser;
use log::*;
use um32::{
    session::{Event, Outcome},
    Machine, Session,
};

mod console;
use console::StdConsole;
mod program;

/// Run a universal machine program, with stdin and stdout as its console.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the program image (big-endian 32-bit words).
    program: PathBuf,
    /// Run the machine on its own thread, talking to it through messages.
    #[arg(long)]
    isolated: bool,
    /// Print how many instructions were executed when the machine stops.
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let program = program::load(&args.program)?;
    if args.isolated {
        run_isolated(program, args.stats)
    } else {
        run_direct(program, args.stats)
    }
}

fn run_direct(program: Vec<u32>, stats: bool) -> Result<()> {
    let mut machine = Machine::new(program);
    let mut console = StdConsole::new();
    let result = machine.run(&mut console);
    drop(console);
    if stats {
        eprintln!("executed instructions: {}", machine.get_cycles());
    }
    if let Err(fault) = result {
        error!("Machine faulted: {fault}");
        error!("{machine:?}");
        bail!(fault);
    }
    Ok(())
}

fn run_isolated(program: Vec<u32>, stats: bool) -> Result<()> {
    let session = Session::with_program(program)?;
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    while let Some(event) = session.next_event() {
        match event {
            Event::RequestInput => {
                stdout.flush()?;
                // Hand over whatever is ready; the machine won't ask again
                // until it has used all of it.
                let mut buf = [0u8; 4096];
                match stdin.read(&mut buf)? {
                    0 => session.end_input(),
                    count => session.supply_bytes(&buf[..count]),
                }
            }
            Event::Output(byte) => stdout.write_all(&[byte])?,
            Event::Halted { cycles } => {
                if stats {
                    eprintln!("executed instructions: {cycles}");
                }
            }
            Event::Faulted { fault, cycles } => {
                if stats {
                    eprintln!("executed instructions: {cycles}");
                }
                error!("Machine faulted: {fault}");
            }
        }
    }
    stdout.flush()?;
    match session.wait() {
        Outcome::Halted => Ok(()),
        Outcome::Faulted(fault) => bail!(fault),
        Outcome::Cancelled => bail!("machine was cancelled"),
    }
}
