mod common;

use common::*;
use um32::{
    encode_image,
    session::{Event, Outcome},
    ArithmeticError, FaultKind, ImageError, Operation::*, ProtocolError, Session, SessionError,
};

fn start(program: &[um32::Operation]) -> Session {
    let _ = env_logger::builder().is_test(true).try_init();
    Session::start(&encode_image(&assemble(program))).unwrap()
}

#[test]
fn hello_through_a_session() {
    let session = start(&[Orthography { a: 0, value: 72 }, Output { c: 0 }, Halt]);
    assert_eq!(session.next_event(), Some(Event::Output(72)));
    assert_eq!(session.next_event(), Some(Event::Halted { cycles: 3 }));
    assert_eq!(session.next_event(), None);
    assert_eq!(session.wait(), Outcome::Halted);
}

#[test]
fn input_is_requested_then_supplied() {
    let session = start(&[Input { c: 1 }, Output { c: 1 }, Input { c: 2 }, Halt]);
    assert_eq!(session.next_event(), Some(Event::RequestInput));
    session.supply_input(b'q');
    assert_eq!(session.next_event(), Some(Event::Output(b'q')));
    assert_eq!(session.next_event(), Some(Event::RequestInput));
    session.end_input();
    assert_eq!(session.next_event(), Some(Event::Halted { cycles: 4 }));
    assert_eq!(session.wait(), Outcome::Halted);
}

#[test]
fn input_can_be_supplied_ahead_of_time() {
    let session = start(&[
        Input { c: 1 },
        Output { c: 1 },
        Input { c: 2 },
        Output { c: 2 },
        Input { c: 3 },
        Halt,
    ]);
    assert_eq!(session.next_event(), Some(Event::RequestInput));
    session.supply_bytes(b"ab");
    session.end_input();
    // Nothing more gets asked for while there's input waiting.
    assert_eq!(session.next_event(), Some(Event::Output(b'a')));
    assert_eq!(session.next_event(), Some(Event::Output(b'b')));
    assert_eq!(session.next_event(), Some(Event::Halted { cycles: 6 }));
    assert_eq!(session.next_event(), None);
    assert_eq!(session.wait(), Outcome::Halted);
}

#[test]
fn values_that_arent_bytes_are_a_protocol_error() {
    let session = start(&[Input { c: 1 }, Halt]);
    assert_eq!(session.next_event(), Some(Event::RequestInput));
    session.supply_raw(256);
    let expected = ProtocolError::ByteOutOfRange { value: 256 };
    match session.next_event() {
        Some(Event::Faulted { fault, cycles }) => {
            assert_eq!(fault.kind, FaultKind::Protocol(expected.clone()));
            assert_eq!((fault.opcode, fault.pc), (Some(11), 0));
            assert_eq!(cycles, 1);
        }
        other => panic!("expected a fault, got {other:?}"),
    }
    match session.wait() {
        Outcome::Faulted(fault) => assert_eq!(fault.kind, FaultKind::Protocol(expected)),
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[test]
fn faults_are_reported_once() {
    let session = start(&[Orthography { a: 1, value: 1 }, Division { a: 0, b: 1, c: 2 }]);
    match session.next_event() {
        Some(Event::Faulted { fault, cycles }) => {
            assert_eq!(
                fault.kind,
                FaultKind::Arithmetic(ArithmeticError::DivisionByZero)
            );
            assert_eq!(cycles, 2);
        }
        other => panic!("expected a fault, got {other:?}"),
    }
    assert_eq!(session.next_event(), None);
    assert!(matches!(session.wait(), Outcome::Faulted(_)));
}

#[test]
fn cancelling_a_runaway_loop() {
    let session = start(&[LoadProgram { b: 0, c: 0 }]);
    session.cancel();
    assert_eq!(session.wait(), Outcome::Cancelled);
}

#[test]
fn cancelling_while_waiting_for_input() {
    let session = start(&[Input { c: 0 }, Halt]);
    assert_eq!(session.next_event(), Some(Event::RequestInput));
    session.cancel();
    assert_eq!(session.wait(), Outcome::Cancelled);
}

#[test]
fn dropping_a_session_stops_it() {
    let session = start(&[Input { c: 0 }, Halt]);
    assert_eq!(session.next_event(), Some(Event::RequestInput));
    drop(session);
}

#[test]
fn ragged_images_never_start() {
    assert!(matches!(
        Session::start(&[0xD0, 0, 0]),
        Err(SessionError::Image(ImageError::Truncated { len: 3 }))
    ));
}
