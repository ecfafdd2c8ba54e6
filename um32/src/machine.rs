use std::fmt::{Debug, Formatter, Result as FmtResult};

use log::*;

use crate::{
    instruction::{opcode, Operation, Register},
    parse_image, ArithmeticError, Arena, Console, Fault, FaultKind, ImageError, PROGRAM_HANDLE,
};

pub const REGISTER_COUNT: usize = 8;
/// What Input stores once the console says there's no more input.
pub const END_OF_INPUT: u32 = 0xFFFF_FFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
    Faulted,
}

pub struct Machine {
    /// All the arrays, including the program itself.
    arena: Arena,
    /// The eight general purpose registers.
    registers: [u32; REGISTER_COUNT],
    /// The program counter. A word offset into the program array.
    pc: u32,
    state: State,
    /// Kept so that stepping a dead machine keeps reporting how it died.
    fault: Option<Fault>,
    /// How many instructions have been fetched.
    cycles: u64,
}

impl Debug for Machine {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        write!(fmt, "PC:{:08X}", self.pc)?;
        for (index, value) in self.registers.iter().enumerate() {
            write!(fmt, " R{index}:{value:08X}")?;
        }
        write!(fmt, " {:?}", self.state)
    }
}

impl Machine {
    /// Make a machine that's about to run `program` from the top.
    pub fn new(program: Vec<u32>) -> Machine {
        return Machine {
            arena: Arena::new(program),
            registers: [0; REGISTER_COUNT],
            pc: 0,
            state: State::Running,
            fault: None,
            cycles: 0,
        };
    }

    pub fn from_image(bytes: &[u8]) -> Result<Machine, ImageError> {
        Ok(Machine::new(parse_image(bytes)?))
    }

    /// Run until the program halts or something goes wrong.
    pub fn run<C: Console>(&mut self, console: &mut C) -> Result<(), Fault> {
        while self.step(console)? == State::Running {}
        Ok(())
    }

    /// Fetch, decode, and execute one instruction.
    ///
    /// Returns the state the machine is in afterwards: `Running` or
    /// `Halted`. A fault is returned as an error, and the machine stays
    /// faulted from then on. Either way, a failed instruction changes
    /// nothing but the cycle count.
    pub fn step<C: Console>(&mut self, console: &mut C) -> Result<State, Fault> {
        match self.state {
            State::Running => (),
            State::Halted => return Ok(State::Halted),
            State::Faulted => {
                if let Some(fault) = &self.fault {
                    return Err(fault.clone());
                }
            }
        }
        self.cycles += 1;
        let word = match self.arena.read_word(PROGRAM_HANDLE, self.pc) {
            Ok(word) => word,
            Err(error) => return Err(self.enter_fault(error.into(), None)),
        };
        match self.execute(word, console) {
            Ok(state) => Ok(state),
            Err(kind) => Err(self.enter_fault(kind, Some(opcode(word)))),
        }
    }

    fn enter_fault(&mut self, kind: FaultKind, opcode: Option<u32>) -> Fault {
        let fault = Fault {
            kind,
            opcode,
            pc: self.pc,
        };
        debug!("Faulted after {} cycles: {fault}", self.cycles);
        self.state = State::Faulted;
        self.fault = Some(fault.clone());
        fault
    }

    fn execute<C: Console>(&mut self, word: u32, console: &mut C) -> Result<State, FaultKind> {
        let operation = Operation::decode(word)?;
        trace!("{:08X}: {operation}", self.pc);
        let r = self.registers;
        match operation {
            Operation::ConditionalMove { a, b, c } => {
                if r[c] != 0 {
                    self.registers[a] = r[b];
                }
            }
            Operation::ArrayIndex { a, b, c } => {
                self.registers[a] = self.arena.read_word(r[b], r[c])?;
            }
            Operation::ArrayAmendment { a, b, c } => {
                self.arena.write_word(r[a], r[b], r[c])?;
            }
            Operation::Addition { a, b, c } => {
                self.registers[a] = r[b].wrapping_add(r[c]);
            }
            Operation::Multiplication { a, b, c } => {
                self.registers[a] = r[b].wrapping_mul(r[c]);
            }
            Operation::Division { a, b, c } => {
                let divisor = r[c];
                if divisor == 0 {
                    return Err(ArithmeticError::DivisionByZero.into());
                }
                self.registers[a] = r[b] / divisor;
            }
            Operation::NotAnd { a, b, c } => {
                self.registers[a] = !(r[b] & r[c]);
            }
            Operation::Halt => {
                info!("Halted after {} cycles", self.cycles);
                self.state = State::Halted;
                return Ok(State::Halted);
            }
            Operation::Allocation { b, c } => {
                self.registers[b] = self.arena.allocate(r[c])?;
            }
            Operation::Abandonment { c } => {
                self.arena.free(r[c])?;
            }
            Operation::Output { c } => {
                let value = r[c];
                if value > 0xFF {
                    warn!(
                        "Output of {value:#X} at {:08X} doesn't fit in a byte, sending the low 8 bits",
                        self.pc
                    );
                }
                console.accept_byte(value as u8)?;
            }
            Operation::Input { c } => {
                self.registers[c] = match console.request_byte()? {
                    Some(byte) => byte as u32,
                    None => END_OF_INPUT,
                };
            }
            Operation::LoadProgram { b, c } => {
                let destination = r[c];
                self.arena.load_as_program(r[b])?;
                self.pc = destination;
                return Ok(State::Running);
            }
            Operation::Orthography { a, value } => {
                self.registers[a] = value;
            }
        }
        self.pc = self.pc.wrapping_add(1);
        Ok(State::Running)
    }

    // Ways to inspect the state of the machine, for hosts and tests.
    pub fn get_pc(&self) -> u32 {
        self.pc
    }
    pub fn get_register(&self, index: Register) -> u32 {
        self.registers[index]
    }
    pub fn get_registers(&self) -> &[u32; REGISTER_COUNT] {
        &self.registers
    }
    pub fn get_state(&self) -> State {
        self.state
    }
    pub fn get_fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }
    pub fn get_cycles(&self) -> u64 {
        self.cycles
    }
    pub fn get_arena(&self) -> &Arena {
        &self.arena
    }
    // Programs can't do these, so we'll feature gate them.
    #[cfg(feature = "override-registers")]
    pub fn set_pc(&mut self, nu: u32) {
        self.pc = nu
    }
    #[cfg(feature = "override-registers")]
    pub fn set_register(&mut self, index: Register, nu: u32) {
        self.registers[index] = nu
    }
}
