//! Running a machine on its own thread, and talking to it through messages.
//!
//! The host starts a [`Session`], then reads [`Event`]s off of it: the
//! machine asking for input, bytes of output, and finally how it stopped.
//! Input goes the other way, one byte (or the end of input) at a time. Each
//! session owns its machine outright, so a wedged or faulted program can't
//! take anything else down with it.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender, TryRecvError},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::*;

use crate::{parse_image, Console, Fault, Machine, ProtocolError, SessionError, State};

/// Something the machine wants the host to know about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// An Input instruction is waiting for the host to supply something.
    RequestInput,
    Output(u8),
    Halted { cycles: u64 },
    Faulted { fault: Fault, cycles: u64 },
}

/// How a session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Halted,
    Faulted(Fault),
    Cancelled,
}

enum HostInput {
    Value(u32),
    Bytes(Vec<u8>),
    End,
    Cancel,
}

/// The machine's side of the session.
struct ChannelConsole {
    events: Sender<Event>,
    input: Receiver<HostInput>,
    /// Bytes the host sent in bulk that haven't been read yet.
    pending: VecDeque<u8>,
}

impl Console for ChannelConsole {
    /// Input the host already sent is used without asking again.
    fn request_byte(&mut self) -> Result<Option<u8>, ProtocolError> {
        let mut asked = false;
        loop {
            if let Some(byte) = self.pending.pop_front() {
                return Ok(Some(byte));
            }
            let input = match self.input.try_recv() {
                Ok(input) => input,
                Err(TryRecvError::Disconnected) => return Err(ProtocolError::Disconnected),
                Err(TryRecvError::Empty) => {
                    if !asked {
                        self.events
                            .send(Event::RequestInput)
                            .map_err(|_| ProtocolError::Disconnected)?;
                        asked = true;
                    }
                    self.input.recv().map_err(|_| ProtocolError::Disconnected)?
                }
            };
            match input {
                HostInput::Value(value) => {
                    return u8::try_from(value)
                        .map(Some)
                        .map_err(|_| ProtocolError::ByteOutOfRange { value })
                }
                HostInput::Bytes(bytes) => self.pending.extend(bytes),
                HostInput::End => return Ok(None),
                // The worker checks the cancel flag before reporting this as
                // a fault.
                HostInput::Cancel => return Err(ProtocolError::Disconnected),
            }
        }
    }
    fn accept_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        self.events
            .send(Event::Output(byte))
            .map_err(|_| ProtocolError::Disconnected)
    }
}

pub struct Session {
    events: Receiver<Event>,
    input: Sender<HostInput>,
    cancelled: Arc<AtomicBool>,
    worker: Option<JoinHandle<Outcome>>,
}

impl Session {
    /// Parse `image` and start running it right away.
    pub fn start(image: &[u8]) -> Result<Session, SessionError> {
        Session::with_program(parse_image(image)?)
    }

    pub fn with_program(program: Vec<u32>) -> Result<Session, SessionError> {
        let (event_sender, events) = channel();
        let (input, input_receiver) = channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let machine = Machine::new(program);
        let console = ChannelConsole {
            events: event_sender,
            input: input_receiver,
            pending: VecDeque::new(),
        };
        let worker_cancelled = cancelled.clone();
        let worker = thread::Builder::new()
            .name("um32-machine".to_string())
            .spawn(move || drive(machine, console, worker_cancelled))
            .map_err(SessionError::Spawn)?;
        Ok(Session {
            events,
            input,
            cancelled,
            worker: Some(worker),
        })
    }

    /// Wait for the next event. `None` once the machine has stopped and
    /// every event it sent has been read.
    pub fn next_event(&self) -> Option<Event> {
        self.events.recv().ok()
    }

    /// Like [`Session::next_event`], but doesn't wait. `None` if there's
    /// nothing to read yet.
    pub fn try_next_event(&self) -> Option<Event> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn supply_input(&self, byte: u8) {
        self.send(HostInput::Value(byte as u32));
    }

    /// Hand over a run of bytes at once. Input instructions use them up in
    /// order before asking for more.
    pub fn supply_bytes(&self, bytes: &[u8]) {
        self.send(HostInput::Bytes(bytes.to_vec()));
    }

    /// Tell the machine there will never be any more input.
    pub fn end_input(&self) {
        self.send(HostInput::End);
    }

    /// Hand over a value that's supposed to be a byte. If it isn't, the
    /// machine faults when it reads it.
    pub fn supply_raw(&self, value: u32) {
        self.send(HostInput::Value(value));
    }

    /// Stop the machine before its next instruction. Anything it was waiting
    /// on is abandoned.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.send(HostInput::Cancel);
    }

    /// Wait for the machine to stop, and find out how it went.
    pub fn wait(mut self) -> Outcome {
        match self.worker.take() {
            Some(worker) => match worker.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            },
            None => Outcome::Cancelled,
        }
    }

    fn send(&self, input: HostInput) {
        if self.input.send(input).is_err() {
            debug!("Machine has already stopped, dropping input");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.cancel();
            let _ = worker.join();
        }
    }
}

fn drive(mut machine: Machine, mut console: ChannelConsole, cancelled: Arc<AtomicBool>) -> Outcome {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            info!("Cancelled after {} cycles", machine.get_cycles());
            return Outcome::Cancelled;
        }
        match machine.step(&mut console) {
            Ok(State::Running) => (),
            Ok(_) => {
                let _ = console.events.send(Event::Halted {
                    cycles: machine.get_cycles(),
                });
                return Outcome::Halted;
            }
            Err(_) if cancelled.load(Ordering::SeqCst) => {
                info!("Cancelled after {} cycles", machine.get_cycles());
                return Outcome::Cancelled;
            }
            Err(fault) => {
                let _ = console.events.send(Event::Faulted {
                    fault: fault.clone(),
                    cycles: machine.get_cycles(),
                });
                return Outcome::Faulted(fault);
            }
        }
    }
}
