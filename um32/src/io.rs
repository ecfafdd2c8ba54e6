use std::collections::VecDeque;

use crate::ProtocolError;

/// Where the machine gets its input bytes and sends its output bytes.
///
/// These are the only two places the machine ever waits on anything. An
/// implementation may block for as long as it likes.
pub trait Console {
    /// Wait for the next input byte. `None` means input is over for good.
    fn request_byte(&mut self) -> Result<Option<u8>, ProtocolError>;
    /// Wait until `byte` has been taken by whoever is listening.
    fn accept_byte(&mut self, byte: u8) -> Result<(), ProtocolError>;
}

impl<C: Console + ?Sized> Console for &mut C {
    fn request_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        (**self).request_byte()
    }
    fn accept_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        (**self).accept_byte(byte)
    }
}

/// A console with all of its input known up front, which collects output
/// into a buffer. Input ends once the script runs out.
#[derive(Clone, Debug, Default)]
pub struct ScriptedConsole {
    input: VecDeque<u8>,
    output: Vec<u8>,
    requests: usize,
}

impl ScriptedConsole {
    pub fn new(input: impl Into<Vec<u8>>) -> ScriptedConsole {
        ScriptedConsole {
            input: input.into().into(),
            output: Vec::new(),
            requests: 0,
        }
    }
    pub fn output(&self) -> &[u8] {
        &self.output
    }
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }
    /// How many times the machine has asked for input, including asks that
    /// got end-of-stream.
    pub fn requests(&self) -> usize {
        self.requests
    }
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Console for ScriptedConsole {
    fn request_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        self.requests += 1;
        Ok(self.input.pop_front())
    }
    fn accept_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        self.output.push(byte);
        Ok(())
    }
}
