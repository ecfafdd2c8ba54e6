#![allow(dead_code)]

use um32::{Fault, Machine, Operation, ScriptedConsole};

pub fn assemble(program: &[Operation]) -> Vec<u32> {
    program.iter().map(|op| op.encode()).collect()
}

/// Run `program` to completion against `input`, handing back the machine,
/// how it stopped, and everything it printed.
pub fn run(program: &[Operation], input: &[u8]) -> (Machine, Result<(), Fault>, Vec<u8>) {
    run_words(assemble(program), input)
}

pub fn run_words(program: Vec<u32>, input: &[u8]) -> (Machine, Result<(), Fault>, Vec<u8>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut machine = Machine::new(program);
    let mut console = ScriptedConsole::new(input);
    let result = machine.run(&mut console);
    (machine, result, console.into_output())
}

/// Load an arbitrary 32-bit value into register `a` using only Orthography
/// and arithmetic, clobbering register 7.
pub fn load_word(a: usize, value: u32) -> Vec<Operation> {
    use Operation::*;
    vec![
        Orthography {
            a,
            value: value >> 16,
        },
        Orthography { a: 7, value: 0x10000 },
        Multiplication { a, b: a, c: 7 },
        Orthography {
            a: 7,
            value: value & 0xFFFF,
        },
        Addition { a, b: a, c: 7 },
    ]
}
