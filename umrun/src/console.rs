use std::io::{Read, Stdin, Stdout, Write};

use um32::{Console, ProtocolError};

/// The machine's console, hooked straight up to our stdin and stdout.
pub struct StdConsole {
    stdin: Stdin,
    stdout: Stdout,
}

impl StdConsole {
    pub fn new() -> StdConsole {
        StdConsole {
            stdin: std::io::stdin(),
            stdout: std::io::stdout(),
        }
    }
}

impl Console for StdConsole {
    fn request_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        // Whatever the program printed as a prompt should be visible before
        // we sit here waiting for an answer.
        self.stdout.flush()?;
        let mut buf = [0u8];
        match self.stdin.lock().read(&mut buf)? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
    fn accept_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        self.stdout.lock().write_all(&[byte])?;
        Ok(())
    }
}

impl Drop for StdConsole {
    fn drop(&mut self) {
        let _ = self.stdout.flush();
    }
}
