//! Constant dispatch tables, one per operand class, indexed by opcode number.
//!
//! Handlers are plain functions over an explicit `&mut Interpreter`. Operands
//! arrive already resolved (variables read), and handlers that store or branch
//! read those bytes from the pc themselves.

use crate::error::Result;
use crate::instruction::OperandCount;
use crate::interpreter::Interpreter;

pub type ZeroOpHandler = fn(&mut Interpreter) -> Result<()>;
pub type OneOpHandler = fn(&mut Interpreter, u16) -> Result<()>;
pub type TwoOpHandler = fn(&mut Interpreter, u16, u16) -> Result<()>;
pub type VarOpHandler = fn(&mut Interpreter, &[u16]) -> Result<()>;

pub struct Opcode<H> {
    pub name: &'static str,
    pub handler: H,
}

const fn zero(name: &'static str, handler: ZeroOpHandler) -> Option<Opcode<ZeroOpHandler>> {
    Some(Opcode { name, handler })
}

const fn one(name: &'static str, handler: OneOpHandler) -> Option<Opcode<OneOpHandler>> {
    Some(Opcode { name, handler })
}

const fn two(name: &'static str, handler: TwoOpHandler) -> Option<Opcode<TwoOpHandler>> {
    Some(Opcode { name, handler })
}

const fn var(name: &'static str, handler: VarOpHandler) -> Option<Opcode<VarOpHandler>> {
    Some(Opcode { name, handler })
}

pub static ZERO_OP: [Option<Opcode<ZeroOpHandler>>; 16] = [
    zero("rtrue", Interpreter::op_rtrue),
    zero("rfalse", Interpreter::op_rfalse),
    zero("print", Interpreter::op_print),
    zero("print_ret", Interpreter::op_print_ret),
    zero("nop", Interpreter::op_nop),
    zero("save", Interpreter::op_save),
    zero("restore", Interpreter::op_restore),
    zero("restart", Interpreter::op_restart),
    zero("ret_popped", Interpreter::op_ret_popped),
    zero("pop", Interpreter::op_pop),
    zero("quit", Interpreter::op_quit),
    zero("new_line", Interpreter::op_new_line),
    zero("show_status", Interpreter::op_show_status),
    zero("verify", Interpreter::op_verify),
    None,
    None,
];

pub static ONE_OP: [Option<Opcode<OneOpHandler>>; 16] = [
    one("jz", Interpreter::op_jz),
    one("get_sibling", Interpreter::op_get_sibling),
    one("get_child", Interpreter::op_get_child),
    one("get_parent", Interpreter::op_get_parent),
    one("get_prop_len", Interpreter::op_get_prop_len),
    one("inc", Interpreter::op_inc),
    one("dec", Interpreter::op_dec),
    one("print_addr", Interpreter::op_print_addr),
    None,
    one("remove_obj", Interpreter::op_remove_obj),
    one("print_obj", Interpreter::op_print_obj),
    one("ret", Interpreter::op_ret),
    one("jump", Interpreter::op_jump),
    one("print_paddr", Interpreter::op_print_paddr),
    one("load", Interpreter::op_load),
    one("not", Interpreter::op_not),
];

/// `je` compares its first operand against up to three others, so it takes
/// the whole operand list even though it is encoded as 2OP:1
pub static JE: Opcode<VarOpHandler> = Opcode {
    name: "je",
    handler: Interpreter::op_je,
};

pub const JE_OPCODE: u8 = 0x01;

pub static TWO_OP: [Option<Opcode<TwoOpHandler>>; 32] = [
    None,
    None, // je
    two("jl", Interpreter::op_jl),
    two("jg", Interpreter::op_jg),
    two("dec_chk", Interpreter::op_dec_chk),
    two("inc_chk", Interpreter::op_inc_chk),
    two("jin", Interpreter::op_jin),
    two("test", Interpreter::op_test),
    two("or", Interpreter::op_or),
    two("and", Interpreter::op_and),
    two("test_attr", Interpreter::op_test_attr),
    two("set_attr", Interpreter::op_set_attr),
    two("clear_attr", Interpreter::op_clear_attr),
    two("store", Interpreter::op_store),
    two("insert_obj", Interpreter::op_insert_obj),
    two("loadw", Interpreter::op_loadw),
    two("loadb", Interpreter::op_loadb),
    two("get_prop", Interpreter::op_get_prop),
    two("get_prop_addr", Interpreter::op_get_prop_addr),
    two("get_next_prop", Interpreter::op_get_next_prop),
    two("add", Interpreter::op_add),
    two("sub", Interpreter::op_sub),
    two("mul", Interpreter::op_mul),
    two("div", Interpreter::op_div),
    two("mod", Interpreter::op_mod),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

pub static VAR_OP: [Option<Opcode<VarOpHandler>>; 32] = [
    var("call", Interpreter::op_call),
    var("storew", Interpreter::op_storew),
    var("storeb", Interpreter::op_storeb),
    var("put_prop", Interpreter::op_put_prop),
    var("sread", Interpreter::op_sread),
    var("print_char", Interpreter::op_print_char),
    var("print_num", Interpreter::op_print_num),
    var("random", Interpreter::op_random),
    var("push", Interpreter::op_push),
    var("pull", Interpreter::op_pull),
    var("split_window", Interpreter::op_split_window),
    var("set_window", Interpreter::op_set_window),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    var("output_stream", Interpreter::op_output_stream),
    var("input_stream", Interpreter::op_input_stream),
    var("sound_effect", Interpreter::op_sound_effect),
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
];

fn lookup<H>(table: &'static [Option<Opcode<H>>], opcode: u8) -> Option<&'static Opcode<H>> {
    table.get(opcode as usize).and_then(Option::as_ref)
}

pub fn zero_op(opcode: u8) -> Option<&'static Opcode<ZeroOpHandler>> {
    lookup(&ZERO_OP, opcode)
}

pub fn one_op(opcode: u8) -> Option<&'static Opcode<OneOpHandler>> {
    lookup(&ONE_OP, opcode)
}

pub fn two_op(opcode: u8) -> Option<&'static Opcode<TwoOpHandler>> {
    lookup(&TWO_OP, opcode)
}

pub fn var_op(opcode: u8) -> Option<&'static Opcode<VarOpHandler>> {
    lookup(&VAR_OP, opcode)
}

/// Mnemonic for an opcode, or "illegal" when the slot is empty in v3
pub fn name(class: OperandCount, opcode: u8) -> &'static str {
    let found = match class {
        OperandCount::OP0 => zero_op(opcode).map(|op| op.name),
        OperandCount::OP1 => one_op(opcode).map(|op| op.name),
        OperandCount::OP2 if opcode == JE_OPCODE => Some(JE.name),
        OperandCount::OP2 => two_op(opcode).map(|op| op.name),
        OperandCount::VAR => var_op(opcode).map(|op| op.name),
    };
    found.unwrap_or("illegal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_names() {
        assert_eq!(name(OperandCount::OP0, 0x00), "rtrue");
        assert_eq!(name(OperandCount::OP0, 0x0E), "illegal");
        assert_eq!(name(OperandCount::OP1, 0x0F), "not");
        assert_eq!(name(OperandCount::OP1, 0x08), "illegal");
        assert_eq!(name(OperandCount::OP2, 0x01), "je");
        assert_eq!(name(OperandCount::OP2, 0x18), "mod");
        assert_eq!(name(OperandCount::OP2, 0x19), "illegal");
        assert_eq!(name(OperandCount::VAR, 0x13), "output_stream");
        assert_eq!(name(OperandCount::VAR, 0x1F), "illegal");
    }

    #[test]
    fn test_tables_cover_the_v3_set() {
        assert_eq!(ZERO_OP.iter().flatten().count(), 14);
        assert_eq!(ONE_OP.iter().flatten().count(), 15);
        assert_eq!(TWO_OP.iter().flatten().count() + 1, 24);
        assert_eq!(VAR_OP.iter().flatten().count(), 15);
    }
}
