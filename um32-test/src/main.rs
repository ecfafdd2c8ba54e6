use anyhow::{bail, Result};
use log::*;
use um32::{Console, Machine, Operation, Operation::*, ProtocolError, ScriptedConsole, State};

/// What the self-test prints if every instruction behaves.
const EXPECTED: &[u8] = b"ABCDEFGHIJ\n";
const INPUT: &[u8] = b"I";

struct TracingConsole {
    inner: ScriptedConsole,
}

impl Console for TracingConsole {
    fn request_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        let byte = self.inner.request_byte()?;
        match byte {
            Some(byte) => println!("Read: --> {byte:02X}"),
            None => println!("Read: --> end of input"),
        }
        Ok(byte)
    }
    fn accept_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        println!("Write: <-- {byte:02X}");
        self.inner.accept_byte(byte)
    }
}

/// Build `value` in register `a` out of two halves, using `scratch`.
fn load_word(a: usize, scratch: usize, value: u32) -> [Operation; 5] {
    [
        Orthography {
            a,
            value: value >> 16,
        },
        Orthography {
            a: scratch,
            value: 0x10000,
        },
        Multiplication { a, b: a, c: scratch },
        Orthography {
            a: scratch,
            value: value & 0xFFFF,
        },
        Addition { a, b: a, c: scratch },
    ]
}

/// Every check prints one letter, which only comes out right if the
/// instruction did what it should. Expects r1 = 0xFFFFFFFF and
/// r4 = 0x80000000 going in; r0 must stay zero throughout.
fn functional_test() -> Vec<u32> {
    let mut program = vec![
        // A: addition wraps
        Orthography { a: 2, value: 0x42 },
        Addition { a: 3, b: 1, c: 2 },
        Output { c: 3 },
        // B: multiplication wraps
        Orthography { a: 2, value: 2 },
        Multiplication { a: 3, b: 4, c: 2 },
        Orthography { a: 2, value: 0x42 },
        Addition { a: 3, b: 3, c: 2 },
        Output { c: 3 },
        // C: division rounds down
        Orthography { a: 2, value: 475 },
        Orthography { a: 5, value: 7 },
        Division { a: 3, b: 2, c: 5 },
        Output { c: 3 },
        // D: not-and twice is and
        Orthography { a: 2, value: 0x44 },
        NotAnd { a: 3, b: 2, c: 2 },
        NotAnd { a: 3, b: 3, c: 3 },
        Output { c: 3 },
        // E, F: conditional move
        Orthography { a: 3, value: b'E' as u32 },
        Orthography { a: 2, value: b'X' as u32 },
        ConditionalMove { a: 3, b: 2, c: 0 },
        Output { c: 3 },
        Orthography { a: 6, value: 1 },
        Orthography { a: 2, value: b'F' as u32 },
        ConditionalMove { a: 3, b: 2, c: 6 },
        Output { c: 3 },
        // G: arrays hold what's put in them
        Orthography { a: 2, value: 4 },
        Allocation { b: 6, c: 2 },
        Orthography { a: 2, value: 3 },
        Orthography { a: 3, value: b'G' as u32 },
        ArrayAmendment { a: 6, b: 2, c: 3 },
        Orthography { a: 3, value: 0 },
        ArrayIndex { a: 3, b: 6, c: 2 },
        Output { c: 3 },
        // H: the abandoned handle (1) comes right back
        Abandonment { c: 6 },
        Orthography { a: 2, value: 9 },
        Allocation { b: 5, c: 2 },
        Orthography { a: 2, value: b'G' as u32 },
        Addition { a: 3, b: 5, c: 2 },
        Output { c: 3 },
        // I, J: input, then end of input (all ones)
        Input { c: 3 },
        Output { c: 3 },
        Input { c: 3 },
        Orthography { a: 2, value: b'K' as u32 },
        Addition { a: 3, b: 3, c: 2 },
        Output { c: 3 },
        // \n: printed by a freshly loaded program
        Orthography { a: 7, value: b'\n' as u32 },
        Orthography { a: 2, value: 2 },
        Allocation { b: 6, c: 2 },
    ];
    program.extend(load_word(2, 3, Output { c: 7 }.encode()));
    program.push(ArrayAmendment { a: 6, b: 0, c: 2 });
    program.extend(load_word(2, 3, Halt.encode()));
    program.push(Orthography { a: 3, value: 1 });
    program.push(ArrayAmendment { a: 6, b: 3, c: 2 });
    program.push(LoadProgram { b: 6, c: 0 });
    program.into_iter().map(Operation::encode).collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let mut machine = Machine::new(functional_test());
    machine.set_register(1, 0xFFFF_FFFF);
    machine.set_register(4, 0x8000_0000);
    let mut console = TracingConsole {
        inner: ScriptedConsole::new(INPUT),
    };
    loop {
        debug!("{machine:?}");
        match machine.step(&mut console) {
            Ok(State::Running) => (),
            Ok(_) => break,
            Err(fault) => {
                error!("{machine:?}");
                bail!("self-test faulted: {fault}");
            }
        }
    }
    let output = console.inner.output();
    println!(
        "Machine halted after {} cycles and printed {:?}",
        machine.get_cycles(),
        String::from_utf8_lossy(output)
    );
    if output != EXPECTED {
        bail!(
            "expected {:?}",
            String::from_utf8_lossy(EXPECTED)
        );
    }
    println!("Every instruction checks out.");
    Ok(())
}
