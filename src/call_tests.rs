//! Routine calls, returns and the two variable 0 conventions
use crate::config::{InterpreterConfig, StackSemantics};
use crate::error::ZError;
use crate::interpreter::Interpreter;
use crate::io_device::HeadlessDevice;
use crate::test_utils::{StoryBuilder, INITIAL_PC};
use test_log::test;

fn interpreter_with(story: StoryBuilder, stack_semantics: StackSemantics) -> Interpreter {
    let config = InterpreterConfig {
        stack_semantics,
        ..Default::default()
    };
    Interpreter::new(
        story.build(),
        Box::new(HeadlessDevice::new(Vec::<String>::new())),
        config,
    )
    .unwrap()
}

fn interpreter(story: StoryBuilder) -> Interpreter {
    interpreter_with(story, StackSemantics::Standard)
}

fn step(zvm: &mut Interpreter, count: usize) {
    for _ in 0..count {
        zvm.interpret().unwrap();
    }
}

#[test]
fn test_call_and_return() {
    let story = StoryBuilder::new()
        // call 0x1100 #33 -> sp; quit
        .code(&[0xE0, 0x1F, 0x08, 0x80, 0x33, 0x00, 0xBA])
        // two locals; add L01 L02 -> sp; ret_popped
        .routine(0x1100, &[0x11, 0x22], &[0x74, 0x01, 0x02, 0x00, 0xB8]);
    let mut zvm = interpreter(story);

    step(&mut zvm, 1);
    assert_eq!(zvm.stack.len(), 2);
    let frame = zvm.stack.top().unwrap();
    assert_eq!(frame.locals(), &[0x33, 0x22]);
    assert_eq!(frame.return_address, INITIAL_PC as u32 + 5);
    assert_eq!(zvm.pc, 0x1105);

    zvm.interpret_all().unwrap();
    assert!(zvm.quitted());
    assert_eq!(zvm.stack.len(), 1);
    assert_eq!(zvm.stack.top().unwrap().stack(), &[0x55]);
    assert_eq!(zvm.pc, INITIAL_PC as u32 + 7);
}

#[test]
fn test_surplus_arguments_are_dropped() {
    let story = StoryBuilder::new()
        // call 0x1100 #1 #2 #3 -> g10
        .code(&[0xE0, 0x15, 0x08, 0x80, 0x01, 0x02, 0x03, 0x10])
        .routine(0x1100, &[0x00], &[0xAB, 0x01]);
    let mut zvm = interpreter(story);
    step(&mut zvm, 1);
    assert_eq!(zvm.stack.top().unwrap().locals(), &[0x01]);
    // ret L01
    step(&mut zvm, 1);
    assert_eq!(zvm.read_variable(0x10).unwrap(), 1);
}

#[test]
fn test_call_zero_returns_false() {
    let story = StoryBuilder::new()
        .global(0x10, 9)
        .code(&[0xE0, 0x3F, 0x00, 0x00, 0x10]);
    let mut zvm = interpreter(story);
    step(&mut zvm, 1);
    assert_eq!(zvm.read_variable(0x10).unwrap(), 0);
    assert_eq!(zvm.stack.len(), 1);
    assert_eq!(zvm.pc, INITIAL_PC as u32 + 5);
}

#[test]
fn test_call_with_too_many_locals() {
    let story = StoryBuilder::new()
        .code(&[0xE0, 0x3F, 0x08, 0x80, 0x10])
        .at(0x1100, &[16]);
    let mut zvm = interpreter(story);
    let err = zvm.interpret().unwrap_err();
    assert!(matches!(err, ZError::TooManyLocals { count: 16, .. }), "{err}");
}

#[test]
fn test_return_from_main_is_fatal() {
    let mut zvm = interpreter(StoryBuilder::new().code(&[0xB0]));
    let err = zvm.interpret().unwrap_err();
    assert!(matches!(err, ZError::CallStackUnderflow), "{err}");
}

// push #5; push #7; add sp sp -> g11
const ADD_TWICE: &[u8] = &[0xE8, 0x7F, 0x05, 0xE8, 0x7F, 0x07, 0x74, 0x00, 0x00, 0x11];

#[test]
fn test_standard_stack_pops_operands() {
    let mut zvm = interpreter(StoryBuilder::new().code(ADD_TWICE));
    step(&mut zvm, 3);
    assert_eq!(zvm.read_variable(0x11).unwrap(), 12);
    assert!(zvm.stack.top().unwrap().stack().is_empty());
}

#[test]
fn test_legacy_stack_peeks_operands() {
    let mut zvm = interpreter_with(StoryBuilder::new().code(ADD_TWICE), StackSemantics::Legacy);
    step(&mut zvm, 3);
    assert_eq!(zvm.read_variable(0x11).unwrap(), 14);
    assert_eq!(zvm.stack.top().unwrap().stack(), &[5, 7]);
}

// push #5; push #7; pull g10
const PULL: &[u8] = &[0xE8, 0x7F, 0x05, 0xE8, 0x7F, 0x07, 0xE9, 0x7F, 0x10];

#[test]
fn test_pull_stores_into_variable() {
    let mut zvm = interpreter(StoryBuilder::new().global(0x10, 1).code(PULL));
    step(&mut zvm, 3);
    assert_eq!(zvm.read_variable(0x10).unwrap(), 7);
    assert_eq!(zvm.stack.top().unwrap().stack(), &[5]);
}

#[test]
fn test_legacy_pull_discards() {
    let mut zvm = interpreter_with(
        StoryBuilder::new().global(0x10, 1).code(PULL),
        StackSemantics::Legacy,
    );
    step(&mut zvm, 3);
    assert_eq!(zvm.read_variable(0x10).unwrap(), 1);
    assert_eq!(zvm.stack.top().unwrap().stack(), &[5]);
}

#[test]
fn test_indirect_stack_references() {
    // push #5; store sp #9; inc sp
    let code = &[0xE8, 0x7F, 0x05, 0x0D, 0x00, 0x09, 0x95, 0x00];
    let mut zvm = interpreter(StoryBuilder::new().code(code));
    step(&mut zvm, 3);
    assert_eq!(zvm.stack.top().unwrap().stack(), &[10]);

    // legacy: store pushes, inc still works on the top in place
    let mut zvm = interpreter_with(StoryBuilder::new().code(code), StackSemantics::Legacy);
    step(&mut zvm, 3);
    assert_eq!(zvm.stack.top().unwrap().stack(), &[5, 10]);
}

#[test]
fn test_pop_empty_stack_is_fatal() {
    // pop
    let mut zvm = interpreter(StoryBuilder::new().code(&[0xB9]));
    let err = zvm.interpret().unwrap_err();
    assert!(matches!(err, ZError::StackUnderflow(_)), "{err}");
}

#[test]
fn test_locals_out_of_range() {
    // call 0x1100; the routine has one local and loads L03
    let story = StoryBuilder::new()
        .code(&[0xE0, 0x3F, 0x08, 0x80, 0x10])
        .routine(0x1100, &[0], &[0x9E, 0x03, 0x10]);
    let mut zvm = interpreter(story);
    step(&mut zvm, 1);
    let err = zvm.interpret().unwrap_err();
    assert!(matches!(err, ZError::LocalOutOfRange { var: 3, .. }), "{err}");
}
