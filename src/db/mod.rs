//! Facilities for scripting the emulator: a line-oriented command language
//! for stepping the processors, setting breakpoints, and poking at state.

mod lex;
mod parse;

pub use lex::{Token, tokenize};
pub use parse::Command;

use crate::bus::{Access, Trap};
use crate::error::{EmuError, Result};
use crate::sched::{Scheduler, Which};
use log::debug;
use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

//===========================================================================//

/// Parses a whole debugger script, returning each command together with its
/// one-based line number.  Fails on the first line that does not parse.
pub fn parse_script(source: &str) -> Result<Vec<(usize, Command)>> {
    let mut commands = Vec::new();
    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        match Command::parse_line(line) {
            Ok(Some(command)) => commands.push((line_number, command)),
            Ok(None) => {}
            Err(message) => {
                return Err(EmuError::Script { line: line_number, message });
            }
        }
    }
    Ok(commands)
}

//===========================================================================//

/// Runs debugger commands against a scheduler.
pub struct Debugger {
    scheduler: Scheduler,
    hit: Rc<Cell<Option<(Which, u32)>>>,
}

impl Debugger {
    /// Creates a debugger driving the given scheduler.
    pub fn new(scheduler: Scheduler) -> Debugger {
        Debugger { scheduler, hit: Rc::new(Cell::new(None)) }
    }

    /// Returns the scheduler being driven.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the scheduler being driven, for modification.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Parses and runs a whole script, writing any output to `out`.  A
    /// failure on any line is reported as a script error for that line.
    pub fn run_script(
        &mut self,
        source: &str,
        out: &mut dyn Write,
    ) -> Result<()> {
        for (line, command) in parse_script(source)? {
            debug!("script line {line}: {command:?}");
            self.execute(command, out).map_err(|error| match error {
                EmuError::Script { .. } => error,
                other => EmuError::Script { line, message: other.to_string() },
            })?;
        }
        Ok(())
    }

    /// Runs one command, writing any output to `out`.
    pub fn execute(
        &mut self,
        command: Command,
        out: &mut dyn Write,
    ) -> Result<()> {
        match command {
            Command::Step { which, count } => {
                for _ in 0..count {
                    match which {
                        Some(which) => {
                            self.scheduler.step_one(which)?;
                        }
                        None => {
                            self.scheduler.step_both()?;
                        }
                    }
                    if self.report_break(out)? {
                        break;
                    }
                }
            }
            Command::Run { count } => {
                let hit = Rc::clone(&self.hit);
                let stop = || hit.get().is_some();
                let steps = self.scheduler.run(u64::from(count), stop)?;
                if !self.report_break(out)? {
                    writeln!(out, "ran {steps} steps")?;
                }
            }
            Command::Break { which, address, count } => {
                let hit = Rc::clone(&self.hit);
                let target = u64::from(count);
                let trap: Trap = Box::new(move |access, _, applied| {
                    if access == Access::Apply && applied == target {
                        hit.set(Some((which, address)));
                    }
                });
                self.scheduler.processor_mut(which).set_trap(address, trap)?;
            }
            Command::Set { which, register, value } => {
                self.scheduler
                    .processor_mut(which)
                    .set_register_debug(register, value)?;
            }
            Command::Write { which, address, value } => {
                let processor = self.scheduler.processor_mut(which);
                processor.write_byte(address, value)?;
            }
            Command::Regs => {
                for which in [Which::Cpu, Which::Spc] {
                    let processor = self.scheduler.processor(which);
                    write!(out, "{which}: PC={:06x}", processor.pc())?;
                    for (name, value) in processor.registers() {
                        write!(out, " {name}={value:04x}")?;
                    }
                    writeln!(out)?;
                }
            }
            Command::Disasm { which, count } => {
                let processor = self.scheduler.processor(which);
                let mut address = processor.pc();
                for _ in 0..count {
                    let (size, text) = processor.disassemble(address)?;
                    writeln!(out, "{address:06x}  {text}")?;
                    address = next_address(which, address, size as u32);
                }
            }
        }
        Ok(())
    }

    fn report_break(&self, out: &mut dyn Write) -> Result<bool> {
        match self.hit.take() {
            Some((which, address)) => {
                writeln!(out, "break {which} ${address:06x}")?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Steps past an instruction of `size` bytes.  The main CPU's program
/// counter wraps within its bank.
fn next_address(which: Which, address: u32, size: u32) -> u32 {
    match which {
        Which::Cpu => {
            (address & 0xff_0000) | (address.wrapping_add(size) & 0xffff)
        }
        Which::Spc => address.wrapping_add(size) & 0xffff,
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{Debugger, next_address, parse_script};
    use crate::error::EmuError;
    use crate::proc::Processor;
    use crate::sched::{Scheduler, SchedulerConfig, Which};

    fn nop_rom() -> Vec<u8> {
        let mut rom = vec![0xea; 0x8000];
        rom[0x7ffc] = 0x00;
        rom[0x7ffd] = 0x80;
        rom
    }

    fn debugger() -> Debugger {
        let config = SchedulerConfig::default();
        Debugger::new(Scheduler::from_rom(config, &nop_rom()).unwrap())
    }

    fn run(debugger: &mut Debugger, script: &str) -> String {
        let mut out = Vec::new();
        debugger.run_script(script, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn script_line_numbers() {
        let script = "# header\n\nregs\nstep cpu 2\n";
        let commands = parse_script(script).unwrap();
        let lines: Vec<usize> =
            commands.iter().map(|&(line, _)| line).collect();
        assert_eq!(lines, vec![3, 4]);
        match parse_script("regs\nstep\nfrobnicate\n") {
            Err(EmuError::Script { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn step_and_show_registers() {
        let mut debugger = debugger();
        let output = run(&mut debugger, "step cpu 3\nregs\n");
        assert!(output.contains("cpu: PC=008003"), "{output}");
        assert!(output.contains("spc: PC=00ffc0"), "{output}");
    }

    #[test]
    fn set_register() {
        let mut debugger = debugger();
        let output = run(&mut debugger, "set cpu a=1234\nregs\n");
        assert!(output.contains(" A=1234"), "{output}");
        assert_eq!(debugger.scheduler().cpu().state().reg_a.0, 0x1234);
    }

    #[test]
    fn breakpoint_stops_run() {
        let mut debugger = debugger();
        let output = run(&mut debugger, "break cpu 8002\nrun 1000\n");
        assert_eq!(output, "break cpu $008002\n");
        assert_eq!(debugger.scheduler().cpu().state().pc.0, 0x8003);
    }

    #[test]
    fn breakpoint_with_count() {
        let mut debugger = debugger();
        let output = run(&mut debugger, "break spc ffc0 2\nstep spc 5\n");
        assert_eq!(output, "");
        assert_eq!(debugger.scheduler().spc().state().pc.0, 0xffc7);
        let mut debugger = self::debugger();
        let output = run(&mut debugger, "break spc ffc1\nstep spc 5\n");
        assert_eq!(output, "break spc $00ffc1\n");
        assert_eq!(debugger.scheduler().spc().state().pc.0, 0xffc2);
    }

    #[test]
    fn disassembly_listing() {
        let mut debugger = debugger();
        let output = run(&mut debugger, "disasm cpu 2\n");
        assert_eq!(output, "008000  NOP\n008001  NOP\n");
    }

    #[test]
    fn runtime_failures_carry_line() {
        let mut debugger = debugger();
        let mut out = Vec::new();
        let script = "regs\nwrite cpu 8000=00\n";
        match debugger.run_script(script, &mut out) {
            Err(EmuError::Script { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("not writable"), "{message}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn oversized_values_are_rejected() {
        let scripts = [
            ("write spc 10002=ab", "out of bounds"),
            ("set spc a=1234", "does not fit"),
            ("break spc 1ffc0", "out of bounds"),
            ("write cpu 1000000=00", "out of bounds"),
            ("set cpu b=100", "does not fit"),
            ("set cpu e=2", "does not fit"),
        ];
        for (script, expected) in scripts {
            let mut debugger = debugger();
            let mut out = Vec::new();
            match debugger.run_script(script, &mut out) {
                Err(EmuError::Script { line, message }) => {
                    assert_eq!(line, 1);
                    assert!(message.contains(expected), "{message}");
                }
                other => panic!("{script:?} gave {other:?}"),
            }
            let spc = debugger.scheduler().spc();
            assert_eq!(spc.state().a.0, 0);
            assert_eq!(spc.application_count(0xffc0), 0);
        }
    }

    #[test]
    fn addresses_wrap() {
        assert_eq!(next_address(Which::Cpu, 0x00_fffe, 3), 0x00_0001);
        assert_eq!(next_address(Which::Spc, 0xffff, 2), 0x0001);
    }
}

//===========================================================================//
