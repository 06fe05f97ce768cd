//! The 65C816's opcode tables.  Cycle counts are the minimums from the
//! published timing table, with 8-bit registers in emulation mode; cycle
//! remarks add the rest.

use super::CpuCore;
use super::modes::CpuMode::{self, *};
use super::ops::*;
use super::state::{
    PROC_FLAG_C, PROC_FLAG_D, PROC_FLAG_I, PROC_FLAG_N, PROC_FLAG_V,
    PROC_FLAG_Z, REG_A, REG_D, REG_DBR, REG_P, REG_PBR, REG_S, REG_X, REG_Y,
    REG_Z,
};
use crate::proc::{Instruction, Opcode, OpcodeTable, Operator};

//===========================================================================//

fn op<O>(code: u8, cycles: u8, mode: CpuMode) -> Box<dyn Instruction<CpuCore>>
where
    O: Operator<CpuCore> + 'static,
{
    Box::new(Opcode::<CpuMode, O>::new::<CpuCore>(code, cycles, mode))
}

//===========================================================================//

/// Builds the table used when both the accumulator and the index registers
/// are 8 bits wide.  Every opcode has an entry.
pub fn base_table() -> OpcodeTable<CpuCore> {
    OpcodeTable::from_instructions(vec![
        op::<Brk>(0x00, 7, Immediate8),
        op::<Ora>(0x01, 6, DirectIndexedIndirect),
        op::<Cop>(0x02, 7, Immediate8),
        op::<Ora>(0x03, 4, StackRelative),
        op::<Tsb>(0x04, 5, Direct),
        op::<Ora>(0x05, 3, Direct),
        op::<Asl>(0x06, 5, Direct),
        op::<Ora>(0x07, 6, DirectIndirectLong),
        op::<Push<REG_P>>(0x08, 3, Implied),
        op::<Ora>(0x09, 2, Immediate8),
        op::<Asl>(0x0a, 2, Accumulator),
        op::<Push<REG_D>>(0x0b, 4, Implied),
        op::<Tsb>(0x0c, 6, Absolute),
        op::<Ora>(0x0d, 4, Absolute),
        op::<Asl>(0x0e, 6, Absolute),
        op::<Ora>(0x0f, 5, AbsoluteLong),
        op::<Branch<PROC_FLAG_N, false>>(0x10, 2, Relative8),
        op::<Ora>(0x11, 5, DirectIndirectIndexed { cross: true }),
        op::<Ora>(0x12, 5, DirectIndirect),
        op::<Ora>(0x13, 7, StackRelativeIndirectIndexed),
        op::<Trb>(0x14, 5, Direct),
        op::<Ora>(0x15, 4, DirectX),
        op::<Asl>(0x16, 6, DirectX),
        op::<Ora>(0x17, 6, DirectIndirectLongIndexed),
        op::<SetFlag<PROC_FLAG_C, false>>(0x18, 2, Implied),
        op::<Ora>(0x19, 4, AbsoluteY { cross: true }),
        op::<Inc>(0x1a, 2, Accumulator),
        op::<Transfer<REG_A, REG_S>>(0x1b, 2, Implied),
        op::<Trb>(0x1c, 6, Absolute),
        op::<Ora>(0x1d, 4, AbsoluteX { cross: true }),
        op::<Asl>(0x1e, 7, AbsoluteX { cross: false }),
        op::<Ora>(0x1f, 5, AbsoluteLongX),
        op::<Jsr>(0x20, 6, AbsoluteProgram),
        op::<And>(0x21, 6, DirectIndexedIndirect),
        op::<Jsl>(0x22, 8, AbsoluteLong),
        op::<And>(0x23, 4, StackRelative),
        op::<Bit>(0x24, 3, Direct),
        op::<And>(0x25, 3, Direct),
        op::<Rol>(0x26, 5, Direct),
        op::<And>(0x27, 6, DirectIndirectLong),
        op::<Pull<REG_P>>(0x28, 4, Implied),
        op::<And>(0x29, 2, Immediate8),
        op::<Rol>(0x2a, 2, Accumulator),
        op::<Pull<REG_D>>(0x2b, 5, Implied),
        op::<Bit>(0x2c, 4, Absolute),
        op::<And>(0x2d, 4, Absolute),
        op::<Rol>(0x2e, 6, Absolute),
        op::<And>(0x2f, 5, AbsoluteLong),
        op::<Branch<PROC_FLAG_N, true>>(0x30, 2, Relative8),
        op::<And>(0x31, 5, DirectIndirectIndexed { cross: true }),
        op::<And>(0x32, 5, DirectIndirect),
        op::<And>(0x33, 7, StackRelativeIndirectIndexed),
        op::<Bit>(0x34, 4, DirectX),
        op::<And>(0x35, 4, DirectX),
        op::<Rol>(0x36, 6, DirectX),
        op::<And>(0x37, 6, DirectIndirectLongIndexed),
        op::<SetFlag<PROC_FLAG_C, true>>(0x38, 2, Implied),
        op::<And>(0x39, 4, AbsoluteY { cross: true }),
        op::<Dec>(0x3a, 2, Accumulator),
        op::<Transfer<REG_S, REG_A>>(0x3b, 2, Implied),
        op::<Bit>(0x3c, 4, AbsoluteX { cross: true }),
        op::<And>(0x3d, 4, AbsoluteX { cross: true }),
        op::<Rol>(0x3e, 7, AbsoluteX { cross: false }),
        op::<And>(0x3f, 5, AbsoluteLongX),
        op::<Rti>(0x40, 6, Implied),
        op::<Eor>(0x41, 6, DirectIndexedIndirect),
        op::<Wdm>(0x42, 2, Immediate8),
        op::<Eor>(0x43, 4, StackRelative),
        op::<MoveBlock<true>>(0x44, 7, BlockMove),
        op::<Eor>(0x45, 3, Direct),
        op::<Lsr>(0x46, 5, Direct),
        op::<Eor>(0x47, 6, DirectIndirectLong),
        op::<Push<REG_A>>(0x48, 3, Implied),
        op::<Eor>(0x49, 2, Immediate8),
        op::<Lsr>(0x4a, 2, Accumulator),
        op::<Push<REG_PBR>>(0x4b, 3, Implied),
        op::<Jmp>(0x4c, 3, AbsoluteProgram),
        op::<Eor>(0x4d, 4, Absolute),
        op::<Lsr>(0x4e, 6, Absolute),
        op::<Eor>(0x4f, 5, AbsoluteLong),
        op::<Branch<PROC_FLAG_V, false>>(0x50, 2, Relative8),
        op::<Eor>(0x51, 5, DirectIndirectIndexed { cross: true }),
        op::<Eor>(0x52, 5, DirectIndirect),
        op::<Eor>(0x53, 7, StackRelativeIndirectIndexed),
        op::<MoveBlock<false>>(0x54, 7, BlockMove),
        op::<Eor>(0x55, 4, DirectX),
        op::<Lsr>(0x56, 6, DirectX),
        op::<Eor>(0x57, 6, DirectIndirectLongIndexed),
        op::<SetFlag<PROC_FLAG_I, false>>(0x58, 2, Implied),
        op::<Eor>(0x59, 4, AbsoluteY { cross: true }),
        op::<Push<REG_Y>>(0x5a, 3, Implied),
        op::<Transfer<REG_A, REG_D>>(0x5b, 2, Implied),
        op::<Jml>(0x5c, 4, AbsoluteLong),
        op::<Eor>(0x5d, 4, AbsoluteX { cross: true }),
        op::<Lsr>(0x5e, 7, AbsoluteX { cross: false }),
        op::<Eor>(0x5f, 5, AbsoluteLongX),
        op::<Rts>(0x60, 6, Implied),
        op::<Adc>(0x61, 6, DirectIndexedIndirect),
        op::<Per>(0x62, 6, Relative16),
        op::<Adc>(0x63, 4, StackRelative),
        op::<Store<REG_Z>>(0x64, 3, Direct),
        op::<Adc>(0x65, 3, Direct),
        op::<Ror>(0x66, 5, Direct),
        op::<Adc>(0x67, 6, DirectIndirectLong),
        op::<Pull<REG_A>>(0x68, 4, Implied),
        op::<Adc>(0x69, 2, Immediate8),
        op::<Ror>(0x6a, 2, Accumulator),
        op::<Rtl>(0x6b, 6, Implied),
        op::<Jmp>(0x6c, 5, AbsoluteIndirect),
        op::<Adc>(0x6d, 4, Absolute),
        op::<Ror>(0x6e, 6, Absolute),
        op::<Adc>(0x6f, 5, AbsoluteLong),
        op::<Branch<PROC_FLAG_V, true>>(0x70, 2, Relative8),
        op::<Adc>(0x71, 5, DirectIndirectIndexed { cross: true }),
        op::<Adc>(0x72, 5, DirectIndirect),
        op::<Adc>(0x73, 7, StackRelativeIndirectIndexed),
        op::<Store<REG_Z>>(0x74, 4, DirectX),
        op::<Adc>(0x75, 4, DirectX),
        op::<Ror>(0x76, 6, DirectX),
        op::<Adc>(0x77, 6, DirectIndirectLongIndexed),
        op::<SetFlag<PROC_FLAG_I, true>>(0x78, 2, Implied),
        op::<Adc>(0x79, 4, AbsoluteY { cross: true }),
        op::<Pull<REG_Y>>(0x7a, 4, Implied),
        op::<Transfer<REG_D, REG_A>>(0x7b, 2, Implied),
        op::<Jmp>(0x7c, 6, AbsoluteIndexedIndirect),
        op::<Adc>(0x7d, 4, AbsoluteX { cross: true }),
        op::<Ror>(0x7e, 7, AbsoluteX { cross: false }),
        op::<Adc>(0x7f, 5, AbsoluteLongX),
        op::<Bra>(0x80, 3, Relative8),
        op::<Store<REG_A>>(0x81, 6, DirectIndexedIndirect),
        op::<Brl>(0x82, 4, Relative16),
        op::<Store<REG_A>>(0x83, 4, StackRelative),
        op::<Store<REG_Y>>(0x84, 3, Direct),
        op::<Store<REG_A>>(0x85, 3, Direct),
        op::<Store<REG_X>>(0x86, 3, Direct),
        op::<Store<REG_A>>(0x87, 6, DirectIndirectLong),
        op::<DecIndex<REG_Y>>(0x88, 2, Implied),
        op::<Bit>(0x89, 2, Immediate8),
        op::<Transfer<REG_X, REG_A>>(0x8a, 2, Implied),
        op::<Push<REG_DBR>>(0x8b, 3, Implied),
        op::<Store<REG_Y>>(0x8c, 4, Absolute),
        op::<Store<REG_A>>(0x8d, 4, Absolute),
        op::<Store<REG_X>>(0x8e, 4, Absolute),
        op::<Store<REG_A>>(0x8f, 5, AbsoluteLong),
        op::<Branch<PROC_FLAG_C, false>>(0x90, 2, Relative8),
        op::<Store<REG_A>>(0x91, 6, DirectIndirectIndexed { cross: false }),
        op::<Store<REG_A>>(0x92, 5, DirectIndirect),
        op::<Store<REG_A>>(0x93, 7, StackRelativeIndirectIndexed),
        op::<Store<REG_Y>>(0x94, 4, DirectX),
        op::<Store<REG_A>>(0x95, 4, DirectX),
        op::<Store<REG_X>>(0x96, 4, DirectY),
        op::<Store<REG_A>>(0x97, 6, DirectIndirectLongIndexed),
        op::<Transfer<REG_Y, REG_A>>(0x98, 2, Implied),
        op::<Store<REG_A>>(0x99, 5, AbsoluteY { cross: false }),
        op::<Transfer<REG_X, REG_S>>(0x9a, 2, Implied),
        op::<Transfer<REG_X, REG_Y>>(0x9b, 2, Implied),
        op::<Store<REG_Z>>(0x9c, 4, Absolute),
        op::<Store<REG_A>>(0x9d, 5, AbsoluteX { cross: false }),
        op::<Store<REG_Z>>(0x9e, 5, AbsoluteX { cross: false }),
        op::<Store<REG_A>>(0x9f, 5, AbsoluteLongX),
        op::<Load<REG_Y>>(0xa0, 2, Immediate8),
        op::<Load<REG_A>>(0xa1, 6, DirectIndexedIndirect),
        op::<Load<REG_X>>(0xa2, 2, Immediate8),
        op::<Load<REG_A>>(0xa3, 4, StackRelative),
        op::<Load<REG_Y>>(0xa4, 3, Direct),
        op::<Load<REG_A>>(0xa5, 3, Direct),
        op::<Load<REG_X>>(0xa6, 3, Direct),
        op::<Load<REG_A>>(0xa7, 6, DirectIndirectLong),
        op::<Transfer<REG_A, REG_Y>>(0xa8, 2, Implied),
        op::<Load<REG_A>>(0xa9, 2, Immediate8),
        op::<Transfer<REG_A, REG_X>>(0xaa, 2, Implied),
        op::<Pull<REG_DBR>>(0xab, 4, Implied),
        op::<Load<REG_Y>>(0xac, 4, Absolute),
        op::<Load<REG_A>>(0xad, 4, Absolute),
        op::<Load<REG_X>>(0xae, 4, Absolute),
        op::<Load<REG_A>>(0xaf, 5, AbsoluteLong),
        op::<Branch<PROC_FLAG_C, true>>(0xb0, 2, Relative8),
        op::<Load<REG_A>>(0xb1, 5, DirectIndirectIndexed { cross: true }),
        op::<Load<REG_A>>(0xb2, 5, DirectIndirect),
        op::<Load<REG_A>>(0xb3, 7, StackRelativeIndirectIndexed),
        op::<Load<REG_Y>>(0xb4, 4, DirectX),
        op::<Load<REG_A>>(0xb5, 4, DirectX),
        op::<Load<REG_X>>(0xb6, 4, DirectY),
        op::<Load<REG_A>>(0xb7, 6, DirectIndirectLongIndexed),
        op::<SetFlag<PROC_FLAG_V, false>>(0xb8, 2, Implied),
        op::<Load<REG_A>>(0xb9, 4, AbsoluteY { cross: true }),
        op::<Transfer<REG_S, REG_X>>(0xba, 2, Implied),
        op::<Transfer<REG_Y, REG_X>>(0xbb, 2, Implied),
        op::<Load<REG_Y>>(0xbc, 4, AbsoluteX { cross: true }),
        op::<Load<REG_A>>(0xbd, 4, AbsoluteX { cross: true }),
        op::<Load<REG_X>>(0xbe, 4, AbsoluteY { cross: true }),
        op::<Load<REG_A>>(0xbf, 5, AbsoluteLongX),
        op::<Compare<REG_Y>>(0xc0, 2, Immediate8),
        op::<Compare<REG_A>>(0xc1, 6, DirectIndexedIndirect),
        op::<Rep>(0xc2, 3, Immediate8),
        op::<Compare<REG_A>>(0xc3, 4, StackRelative),
        op::<Compare<REG_Y>>(0xc4, 3, Direct),
        op::<Compare<REG_A>>(0xc5, 3, Direct),
        op::<Dec>(0xc6, 5, Direct),
        op::<Compare<REG_A>>(0xc7, 6, DirectIndirectLong),
        op::<IncIndex<REG_Y>>(0xc8, 2, Implied),
        op::<Compare<REG_A>>(0xc9, 2, Immediate8),
        op::<DecIndex<REG_X>>(0xca, 2, Implied),
        op::<Wai>(0xcb, 3, Implied),
        op::<Compare<REG_Y>>(0xcc, 4, Absolute),
        op::<Compare<REG_A>>(0xcd, 4, Absolute),
        op::<Dec>(0xce, 6, Absolute),
        op::<Compare<REG_A>>(0xcf, 5, AbsoluteLong),
        op::<Branch<PROC_FLAG_Z, false>>(0xd0, 2, Relative8),
        op::<Compare<REG_A>>(0xd1, 5, DirectIndirectIndexed { cross: true }),
        op::<Compare<REG_A>>(0xd2, 5, DirectIndirect),
        op::<Compare<REG_A>>(0xd3, 7, StackRelativeIndirectIndexed),
        op::<Pei>(0xd4, 6, DirectPointer),
        op::<Compare<REG_A>>(0xd5, 4, DirectX),
        op::<Dec>(0xd6, 6, DirectX),
        op::<Compare<REG_A>>(0xd7, 6, DirectIndirectLongIndexed),
        op::<SetFlag<PROC_FLAG_D, false>>(0xd8, 2, Implied),
        op::<Compare<REG_A>>(0xd9, 4, AbsoluteY { cross: true }),
        op::<Push<REG_X>>(0xda, 3, Implied),
        op::<Stp>(0xdb, 3, Implied),
        op::<Jml>(0xdc, 6, AbsoluteIndirectLong),
        op::<Compare<REG_A>>(0xdd, 4, AbsoluteX { cross: true }),
        op::<Dec>(0xde, 7, AbsoluteX { cross: false }),
        op::<Compare<REG_A>>(0xdf, 5, AbsoluteLongX),
        op::<Compare<REG_X>>(0xe0, 2, Immediate8),
        op::<Sbc>(0xe1, 6, DirectIndexedIndirect),
        op::<Sep>(0xe2, 3, Immediate8),
        op::<Sbc>(0xe3, 4, StackRelative),
        op::<Compare<REG_X>>(0xe4, 3, Direct),
        op::<Sbc>(0xe5, 3, Direct),
        op::<Inc>(0xe6, 5, Direct),
        op::<Sbc>(0xe7, 6, DirectIndirectLong),
        op::<IncIndex<REG_X>>(0xe8, 2, Implied),
        op::<Sbc>(0xe9, 2, Immediate8),
        op::<Nop>(0xea, 2, Implied),
        op::<Xba>(0xeb, 3, Implied),
        op::<Compare<REG_X>>(0xec, 4, Absolute),
        op::<Sbc>(0xed, 4, Absolute),
        op::<Inc>(0xee, 6, Absolute),
        op::<Sbc>(0xef, 5, AbsoluteLong),
        op::<Branch<PROC_FLAG_Z, true>>(0xf0, 2, Relative8),
        op::<Sbc>(0xf1, 5, DirectIndirectIndexed { cross: true }),
        op::<Sbc>(0xf2, 5, DirectIndirect),
        op::<Sbc>(0xf3, 7, StackRelativeIndirectIndexed),
        op::<Pea>(0xf4, 5, Immediate16),
        op::<Sbc>(0xf5, 4, DirectX),
        op::<Inc>(0xf6, 6, DirectX),
        op::<Sbc>(0xf7, 6, DirectIndirectLongIndexed),
        op::<SetFlag<PROC_FLAG_D, true>>(0xf8, 2, Implied),
        op::<Sbc>(0xf9, 4, AbsoluteY { cross: true }),
        op::<Pull<REG_X>>(0xfa, 4, Implied),
        op::<Xce>(0xfb, 2, Implied),
        op::<Jsr>(0xfc, 8, AbsoluteIndexedIndirect),
        op::<Sbc>(0xfd, 4, AbsoluteX { cross: true }),
        op::<Inc>(0xfe, 7, AbsoluteX { cross: false }),
        op::<Sbc>(0xff, 5, AbsoluteLongX),
    ])
}

/// Builds the overrides for a 16-bit accumulator: the immediate forms of
/// the accumulator instructions take a two-byte operand.
pub fn wide_accumulator_table() -> OpcodeTable<CpuCore> {
    OpcodeTable::from_instructions(vec![
        op::<Ora>(0x09, 2, Immediate16),
        op::<And>(0x29, 2, Immediate16),
        op::<Eor>(0x49, 2, Immediate16),
        op::<Adc>(0x69, 2, Immediate16),
        op::<Bit>(0x89, 2, Immediate16),
        op::<Load<REG_A>>(0xa9, 2, Immediate16),
        op::<Compare<REG_A>>(0xc9, 2, Immediate16),
        op::<Sbc>(0xe9, 2, Immediate16),
    ])
}

/// Builds the overrides for 16-bit index registers: the immediate forms of
/// the index instructions take a two-byte operand.
pub fn wide_index_table() -> OpcodeTable<CpuCore> {
    OpcodeTable::from_instructions(vec![
        op::<Load<REG_Y>>(0xa0, 2, Immediate16),
        op::<Load<REG_X>>(0xa2, 2, Immediate16),
        op::<Compare<REG_Y>>(0xc0, 2, Immediate16),
        op::<Compare<REG_X>>(0xe0, 2, Immediate16),
    ])
}

//===========================================================================//
