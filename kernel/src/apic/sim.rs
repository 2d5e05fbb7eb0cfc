//! Simulated hardware for host-side tests.
//!
//! Every fake created from one [`Sim`] appends to a shared trace, so tests can check
//! the order of MSR writes, mappings, handler registrations, register writes and port
//! writes across components.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt,
    rc::Rc,
};

use x86_64::{structures::paging::PageTableFlags, PhysAddr, VirtAddr};

use super::{
    enable::ModelSpecific,
    handlers::DiagnosticSink,
    registers::{ApicRegister, RegisterBlock},
    ApicError, BootHardware,
};
use crate::{
    constants::{
        apic::APIC_BASE_MSR,
        ports::{PIT_CHANNEL_2, PIT_MODE_CMD, SYSTEM_CONTROL_B},
    },
    devices::ports::PortIo,
    interrupts::{HandlerEntry, InterruptDispatch},
    memory::mmio::PageMap,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    MsrWrite(u32, u64),
    Map {
        phys: u64,
        virt: u64,
        flags: PageTableFlags,
    },
    Register(u8, HandlerEntry),
    Reg(ApicRegister, u32),
    PortWrite(u16, u8),
}

type Trace = Rc<RefCell<Vec<Event>>>;

pub struct Sim {
    trace: Trace,
}

impl Sim {
    pub fn new() -> Self {
        Sim {
            trace: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.trace.borrow().clone()
    }

    pub fn registers(&self) -> SimulatedRegisters {
        SimulatedRegisters::with_trace(self.trace.clone())
    }

    pub fn msrs(&self) -> FakeMsrs {
        let mut values = BTreeMap::new();
        // BSP flag set, APIC disabled
        values.insert(APIC_BASE_MSR, 0xFEE0_0100);
        FakeMsrs {
            values,
            trace: self.trace.clone(),
        }
    }

    pub fn mapper(&self) -> FakeMapper {
        FakeMapper {
            fail: false,
            trace: self.trace.clone(),
        }
    }

    pub fn dispatch(&self) -> FakeDispatch {
        FakeDispatch {
            trace: self.trace.clone(),
        }
    }

    /// PIT whose OUT2 status reads set on the `polls`-th poll after the divisor
    /// is loaded.
    pub fn pit(&self, polls: usize) -> FakePit {
        FakePit {
            port_b: 0,
            divisor_bytes: 0,
            polls_until_elapsed: polls,
            polls: 0,
            elapsed: false,
            trace: self.trace.clone(),
        }
    }

    pub fn hardware(
        &self,
        polls: usize,
    ) -> BootHardware<FakeMsrs, FakeMapper, FakeDispatch, FakePit> {
        BootHardware {
            msrs: self.msrs(),
            mapper: self.mapper(),
            dispatch: self.dispatch(),
            ports: self.pit(polls),
        }
    }
}

/// Plain register file: every register reads back the last value written.
pub struct SimulatedRegisters {
    file: [Cell<u32>; ApicRegister::ALL.len()],
    trace: Trace,
}

impl SimulatedRegisters {
    pub fn new() -> Self {
        Self::with_trace(Rc::new(RefCell::new(Vec::new())))
    }

    fn with_trace(trace: Trace) -> Self {
        SimulatedRegisters {
            file: Default::default(),
            trace,
        }
    }

    /// Sets a register as the hardware would, without recording a write.
    pub fn preset(&self, reg: ApicRegister, value: u32) {
        self.file[reg.index()].set(value);
    }

    pub fn write_count(&self) -> usize {
        self.trace
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Reg(..)))
            .count()
    }

    pub fn writes_to(&self, reg: ApicRegister) -> usize {
        self.trace
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::Reg(r, _) if *r == reg))
            .count()
    }

    pub fn clear_trace(&self) {
        self.trace.borrow_mut().clear();
    }
}

impl RegisterBlock for SimulatedRegisters {
    fn read(&self, reg: ApicRegister) -> u32 {
        self.file[reg.index()].get()
    }

    fn write(&self, reg: ApicRegister, value: u32) {
        self.file[reg.index()].set(value);
        self.trace.borrow_mut().push(Event::Reg(reg, value));
    }
}

pub struct FakeMsrs {
    values: BTreeMap<u32, u64>,
    trace: Trace,
}

impl FakeMsrs {
    pub fn set(&mut self, index: u32, value: u64) {
        self.values.insert(index, value);
    }

    pub fn get(&self, index: u32) -> u64 {
        self.values.get(&index).copied().unwrap_or(0)
    }
}

impl ModelSpecific for FakeMsrs {
    fn read_msr(&mut self, index: u32) -> u64 {
        self.get(index)
    }

    fn write_msr(&mut self, index: u32, value: u64) {
        self.values.insert(index, value);
        self.trace.borrow_mut().push(Event::MsrWrite(index, value));
    }
}

pub struct FakeMapper {
    fail: bool,
    trace: Trace,
}

impl FakeMapper {
    pub fn fail(&mut self) {
        self.fail = true;
    }
}

impl PageMap for FakeMapper {
    fn map(
        &mut self,
        phys: PhysAddr,
        virt: VirtAddr,
        flags: PageTableFlags,
    ) -> Result<(), ApicError> {
        if self.fail {
            return Err(ApicError::MapFailed);
        }
        self.trace.borrow_mut().push(Event::Map {
            phys: phys.as_u64(),
            virt: virt.as_u64(),
            flags,
        });
        Ok(())
    }
}

pub struct FakeDispatch {
    trace: Trace,
}

impl FakeDispatch {
    pub fn vectors(&self) -> Vec<u8> {
        self.trace
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Register(vector, _) => Some(*vector),
                _ => None,
            })
            .collect()
    }
}

impl InterruptDispatch for FakeDispatch {
    fn register(&mut self, vector: u8, entry: HandlerEntry) {
        self.trace.borrow_mut().push(Event::Register(vector, entry));
    }
}

/// Port B plus PIT channel 2, enough to run one calibration window.
pub struct FakePit {
    port_b: u8,
    divisor_bytes: u8,
    polls_until_elapsed: usize,
    polls: usize,
    elapsed: bool,
    trace: Trace,
}

impl FakePit {
    pub fn set_port_b(&mut self, value: u8) {
        self.port_b = value;
    }

    pub fn port_b(&self) -> u8 {
        self.port_b
    }

    /// Status reads between loading the divisor and the first read showing OUT2.
    pub fn status_polls(&self) -> usize {
        self.polls
    }
}

impl PortIo for FakePit {
    fn read_u8(&mut self, port: u16) -> u8 {
        match port {
            SYSTEM_CONTROL_B => {
                if self.divisor_bytes == 2 && !self.elapsed {
                    self.polls += 1;
                    self.elapsed = self.polls >= self.polls_until_elapsed;
                }
                if self.elapsed {
                    self.port_b | 0x20
                } else {
                    self.port_b & !0x20
                }
            }
            _ => 0,
        }
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        match port {
            SYSTEM_CONTROL_B => self.port_b = value & !0x20,
            PIT_MODE_CMD => self.divisor_bytes = 0,
            PIT_CHANNEL_2 => self.divisor_bytes = (self.divisor_bytes + 1).min(2),
            _ => {}
        }
        self.trace.borrow_mut().push(Event::PortWrite(port, value));
    }
}

/// Collects emitted lines.
pub struct RecordingSink {
    lines: RefCell<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink {
            lines: RefCell::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, line: fmt::Arguments) {
        self.lines.borrow_mut().push(std::fmt::format(line));
    }
}
