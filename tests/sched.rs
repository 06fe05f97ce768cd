use std::cell::RefCell;
use std::rc::Rc;
use tandem::bus::CpuMemory;
use tandem::error::Result;
use tandem::proc::Processor;
use tandem::sched::{ScanlineHook, Scheduler, SchedulerConfig, Which};
use tandem::value::Long;

//===========================================================================//

fn nop_rom() -> Vec<u8> {
    let mut rom = vec![0xea; 0x8000];
    rom[0x7ffc] = 0x00;
    rom[0x7ffd] = 0x80;
    rom
}

fn make_scheduler() -> Scheduler {
    Scheduler::from_rom(SchedulerConfig::default(), &nop_rom()).unwrap()
}

fn run_to_line(scheduler: &mut Scheduler, line: u16) {
    for _ in 0..1_000_000 {
        scheduler.step_both().unwrap();
        if scheduler.scanline() == line {
            return;
        }
    }
    panic!("never reached scanline {line}");
}

struct Recorder(Rc<RefCell<Vec<u16>>>);

impl ScanlineHook for Recorder {
    fn scanline(&mut self, line: u16, _memory: &CpuMemory) -> Result<()> {
        self.0.borrow_mut().push(line);
        Ok(())
    }
}

//===========================================================================//

#[test]
fn starts_before_the_first_line() {
    let scheduler = make_scheduler();
    assert_eq!(scheduler.frame(), 0);
    assert_eq!(scheduler.scanline(), 261);
    assert_eq!(scheduler.clock(), 0);
    assert_eq!(scheduler.cpu().pc(), 0x8000);
    assert_eq!(scheduler.spc().pc(), 0xffc0);
}

#[test]
fn cpu_wins_ties() {
    let mut scheduler = make_scheduler();
    let mut order = Vec::new();
    for _ in 0..5 {
        order.push(scheduler.step_both().unwrap());
    }
    assert_eq!(
        order,
        vec![
            (Which::Cpu, 2),
            (Which::Spc, 2),
            (Which::Cpu, 2),
            (Which::Cpu, 2),
            (Which::Spc, 2),
        ]
    );
    assert_eq!(scheduler.due(Which::Cpu), 48);
    assert_eq!(scheduler.due(Which::Spc), 64);
    assert_eq!(scheduler.frame(), 1);
    assert_eq!(scheduler.scanline(), 0);
}

#[test]
fn stepping_one_processor_leaves_the_other() {
    let mut scheduler = make_scheduler();
    for _ in 0..3 {
        scheduler.step_one(Which::Spc).unwrap();
    }
    assert_eq!(scheduler.due(Which::Cpu), 0);
    assert_eq!(scheduler.due(Which::Spc), 3 * 2 * 16);
    assert_eq!(scheduler.cpu().pc(), 0x8000);
}

#[test]
fn hook_sees_every_line() {
    let mut scheduler = make_scheduler();
    let lines = Rc::new(RefCell::new(Vec::new()));
    scheduler.set_hook(Box::new(Recorder(lines.clone())));
    run_to_line(&mut scheduler, 3);
    assert_eq!(*lines.borrow(), vec![0, 1, 2, 3]);
}

#[test]
fn vblank_and_next_frame() {
    let mut scheduler = make_scheduler();
    run_to_line(&mut scheduler, 224);
    assert!(!scheduler.cpu_io().vblank());
    run_to_line(&mut scheduler, 225);
    assert!(scheduler.cpu_io().vblank());
    // NMI is disabled, so the CPU is still walking through its NOPs.
    assert_eq!(scheduler.cpu().get_register("S").unwrap(), 0x01ff);

    run_to_line(&mut scheduler, 0);
    assert_eq!(scheduler.frame(), 2);
    assert!(!scheduler.cpu_io().vblank());
}

#[test]
fn vblank_delivers_enabled_nmi() {
    let mut scheduler = make_scheduler();
    // NMITIMEN: enable the vblank NMI.
    scheduler.cpu_mut().write_byte(0x4200, 0x80).unwrap();
    assert!(scheduler.cpu_io().nmi_enabled());
    run_to_line(&mut scheduler, 225);
    let cpu = scheduler.cpu();
    assert_eq!(cpu.get_register("S").unwrap(), 0x01fc);
    assert!((0xeaea..=0xeaec).contains(&cpu.pc()), "{:06x}", cpu.pc());
    let pushed_p = cpu.memory().inspect(Long::new(0x01fd)).unwrap();
    assert_eq!(pushed_p.0 & 0x10, 0); // B clear
}

#[test]
fn run_stops_when_asked() {
    let mut scheduler = make_scheduler();
    let mut calls = 0;
    let taken = scheduler
        .run(100, || {
            calls += 1;
            calls == 7
        })
        .unwrap();
    assert_eq!(taken, 7);
    assert_eq!(scheduler.run(10, || false).unwrap(), 10);
}

//===========================================================================//
