//! Steps the main CPU and the coprocessor against one master clock, and
//! drives the per-scanline work (HDMA, vblank and NMI) between their
//! instructions.

use crate::bus::{
    ApuPorts, CpuIo, CpuMemory, SpcIo, SpcMemory, map_cpu_bus, map_lorom,
    map_ppu_latches, map_spc_bus,
};
use crate::error::Result;
use crate::proc::{Cpu, Processor, Spc};
use log::{debug, trace};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

//===========================================================================//

/// Timing parameters, in master-clock cycles.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SchedulerConfig {
    /// Master cycles per CPU cycle.
    pub cpu_divider: u64,
    /// Master cycles per coprocessor cycle.
    pub spc_divider: u64,
    /// Master cycles per scanline.
    pub cycles_per_line: u64,
    /// Scanlines per frame.
    pub lines_per_frame: u16,
    /// The first scanline of vertical blank.
    pub vblank_line: u16,
}

impl Default for SchedulerConfig {
    fn default() -> SchedulerConfig {
        SchedulerConfig {
            cpu_divider: 8,
            spc_divider: 16,
            cycles_per_line: 1364,
            lines_per_frame: 262,
            vblank_line: 225,
        }
    }
}

//===========================================================================//

/// Names one of the two processors.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Which {
    /// The main CPU.
    Cpu,
    /// The sound coprocessor.
    Spc,
}

impl fmt::Display for Which {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Which::Cpu => f.write_str("cpu"),
            Which::Spc => f.write_str("spc"),
        }
    }
}

impl FromStr for Which {
    type Err = String;

    fn from_str(name: &str) -> std::result::Result<Which, String> {
        match name.to_ascii_lowercase().as_str() {
            "cpu" => Ok(Which::Cpu),
            "spc" | "apu" => Ok(Which::Spc),
            _ => Err(format!("unknown processor {name:?}")),
        }
    }
}

//===========================================================================//

/// A collaborator that runs once at the start of every scanline, after the
/// scheduler's own HDMA and vblank work for that line.
pub trait ScanlineHook {
    /// Called with the scanline number and the main CPU's bus.
    fn scanline(&mut self, line: u16, memory: &CpuMemory) -> Result<()>;
}

//===========================================================================//

/// Two processors, each with its own bus, interleaved deterministically on
/// one thread.  Each processor has a master-clock timestamp at which it is
/// next due; the one due first runs next, with the CPU winning ties.
pub struct Scheduler {
    config: SchedulerConfig,
    cpu: Cpu,
    spc: Spc,
    cpu_io: Rc<CpuIo>,
    cpu_due: u64,
    spc_due: u64,
    clock: u64,
    next_line: u16,
    next_line_at: u64,
    frame: u64,
    hook: Option<Box<dyn ScanlineHook>>,
}

impl Scheduler {
    /// Creates a scheduler over two processors that have already been
    /// reset.  `cpu_io` must be the state behind the CPU bus's registers.
    pub fn new(
        config: SchedulerConfig,
        cpu: Cpu,
        spc: Spc,
        cpu_io: Rc<CpuIo>,
    ) -> Scheduler {
        Scheduler {
            config,
            cpu,
            spc,
            cpu_io,
            cpu_due: 0,
            spc_due: 0,
            clock: 0,
            next_line: 0,
            next_line_at: 0,
            frame: 0,
            hook: None,
        }
    }

    /// Builds both buses around a LoROM cartridge image, connects them
    /// through the APU ports, and resets both processors.
    pub fn from_rom(config: SchedulerConfig, rom: &[u8]) -> Result<Scheduler> {
        let cpu_io = Rc::new(CpuIo::default());
        let spc_io = Rc::new(SpcIo::default());
        let ports = Rc::new(ApuPorts::default());

        let mut cpu_memory = CpuMemory::new("CPU");
        map_cpu_bus(&mut cpu_memory, &cpu_io, &ports)?;
        map_ppu_latches(&mut cpu_memory)?;
        map_lorom(&mut cpu_memory, rom)?;
        cpu_memory.finalize();

        let mut spc_memory = SpcMemory::new("SPC");
        map_spc_bus(&mut spc_memory, &spc_io, &ports)?;
        spc_memory.finalize();

        let mut cpu = Cpu::new(cpu_memory);
        cpu.reset()?;
        let mut spc = Spc::new(spc_memory, spc_io);
        spc.reset()?;
        Ok(Scheduler::new(config, cpu, spc, cpu_io))
    }

    /// Installs the collaborator called at the start of each scanline.
    pub fn set_hook(&mut self, hook: Box<dyn ScanlineHook>) {
        self.hook = Some(hook);
    }

    /// Returns the timing parameters.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the main CPU.
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Returns the main CPU for modification.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Returns the coprocessor.
    pub fn spc(&self) -> &Spc {
        &self.spc
    }

    /// Returns the coprocessor for modification.
    pub fn spc_mut(&mut self) -> &mut Spc {
        &mut self.spc
    }

    /// Returns the state behind the CPU's I/O registers.
    pub fn cpu_io(&self) -> &Rc<CpuIo> {
        &self.cpu_io
    }

    /// Returns one processor through its debugger-facing interface.
    pub fn processor(&self, which: Which) -> &dyn Processor {
        match which {
            Which::Cpu => &self.cpu,
            Which::Spc => &self.spc,
        }
    }

    /// Returns one processor through its debugger-facing interface, for
    /// modification.
    pub fn processor_mut(&mut self, which: Which) -> &mut dyn Processor {
        match which {
            Which::Cpu => &mut self.cpu,
            Which::Spc => &mut self.spc,
        }
    }

    /// Returns the master-clock time at which the most recent step began.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Returns the master-clock time at which `which` is next due to run.
    pub fn due(&self, which: Which) -> u64 {
        match which {
            Which::Cpu => self.cpu_due,
            Which::Spc => self.spc_due,
        }
    }

    /// Returns the number of frames started so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns the current scanline.  Before the first step this is the
    /// last line of the previous frame.
    pub fn scanline(&self) -> u16 {
        let lines = self.config.lines_per_frame;
        (self.next_line + lines - 1) % lines
    }

    /// Steps whichever processor is due first, returning which one ran and
    /// how many of its own cycles the step took.
    pub fn step_both(&mut self) -> Result<(Which, u32)> {
        loop {
            let which = if self.cpu_due <= self.spc_due {
                Which::Cpu
            } else {
                Which::Spc
            };
            let due = self.due(which);
            if self.next_line_at <= due {
                self.begin_scanline()?;
                continue;
            }
            return Ok((which, self.run_processor(which, due)?));
        }
    }

    /// Steps one instruction (or one DMA unit) of the chosen processor,
    /// advancing the clock as though it had been scheduled normally.
    pub fn step_one(&mut self, which: Which) -> Result<u32> {
        loop {
            let due = self.due(which);
            if self.next_line_at <= due {
                self.begin_scanline()?;
                continue;
            }
            return self.run_processor(which, due);
        }
    }

    /// Runs up to `max_steps` steps of either processor, stopping early
    /// once `stop` returns true after a step.  Returns the number of steps
    /// taken.
    pub fn run(
        &mut self,
        max_steps: u64,
        mut stop: impl FnMut() -> bool,
    ) -> Result<u64> {
        for step in 0..max_steps {
            self.step_both()?;
            if stop() {
                return Ok(step + 1);
            }
        }
        Ok(max_steps)
    }

    fn run_processor(&mut self, which: Which, due: u64) -> Result<u32> {
        self.clock = self.clock.max(due);
        let cycles = match which {
            Which::Cpu => self.cpu.step()?,
            Which::Spc => self.spc.step()?,
        };
        let divider = match which {
            Which::Cpu => self.config.cpu_divider,
            Which::Spc => self.config.spc_divider,
        };
        let elapsed = u64::from(cycles) * divider;
        match which {
            Which::Cpu => self.cpu_due = due + elapsed,
            Which::Spc => self.spc_due = due + elapsed,
        }
        Ok(cycles)
    }

    fn begin_scanline(&mut self) -> Result<()> {
        let line = self.next_line;
        let mut stall = 0;
        if line == 0 {
            self.frame += 1;
            debug!("frame {} begins", self.frame);
            self.cpu_io.set_vblank(false);
            self.cpu_io.set_nmi_flag(false);
            stall += self.cpu.hdma_init()?;
        }
        if line < self.config.vblank_line {
            stall += self.cpu.hdma_line()?;
        } else if line == self.config.vblank_line {
            self.cpu_io.set_vblank(true);
            self.cpu_io.set_nmi_flag(true);
            if self.cpu_io.nmi_enabled() {
                stall += self.cpu.nmi()?;
            }
        }
        if stall > 0 {
            trace!("scanline {line}: CPU stalled {stall} cycles");
            let start = self.cpu_due.max(self.next_line_at);
            self.cpu_due = start + u64::from(stall) * self.config.cpu_divider;
        }
        if let Some(hook) = self.hook.as_mut() {
            hook.scanline(line, self.cpu.memory())?;
        }
        self.next_line = (line + 1) % self.config.lines_per_frame;
        self.next_line_at += self.config.cycles_per_line;
        Ok(())
    }
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{SchedulerConfig, Which};

    #[test]
    fn default_timing() {
        let config = SchedulerConfig::default();
        assert_eq!(config.cpu_divider, 8);
        assert_eq!(config.spc_divider, 16);
        assert_eq!(config.cycles_per_line, 1364);
        assert_eq!(config.lines_per_frame, 262);
        assert_eq!(config.vblank_line, 225);
    }

    #[test]
    fn processor_names() {
        assert_eq!("CPU".parse::<Which>(), Ok(Which::Cpu));
        assert_eq!("spc".parse::<Which>(), Ok(Which::Spc));
        assert!("ppu".parse::<Which>().is_err());
        assert_eq!(Which::Spc.to_string(), "spc");
    }
}

//===========================================================================//
