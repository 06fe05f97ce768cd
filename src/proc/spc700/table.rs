//! The SPC700's opcode table.  Cycle counts are those of the published
//! timing table for a branch not taken.

use super::SpcCore;
use super::modes::SpcArg::{self, *};
use super::modes::SpcMode;
use super::ops::*;
use super::state::{
    PSW_FLAG_C, PSW_FLAG_I, PSW_FLAG_N, PSW_FLAG_P, PSW_FLAG_V, PSW_FLAG_Z,
};
use crate::proc::{Instruction, Opcode, OpcodeTable, Operator};

//===========================================================================//

fn op<O>(code: u8, cycles: u8, mode: SpcMode) -> Box<dyn Instruction<SpcCore>>
where
    O: Operator<SpcCore> + 'static,
{
    Box::new(Opcode::<SpcMode, O>::new::<SpcCore>(code, cycles, mode))
}

const fn unary(dst: SpcArg) -> SpcMode {
    SpcMode::unary(dst)
}

const fn pair(dst: SpcArg, src: SpcArg) -> SpcMode {
    SpcMode::new(dst, src)
}

//===========================================================================//

/// Builds the SPC700's opcode table.  Every opcode has an entry.
pub fn opcode_table() -> OpcodeTable<SpcCore> {
    OpcodeTable::from_instructions(vec![
        op::<Nop>(0x00, 2, SpcMode::IMPLIED),
        op::<Tcall>(0x01, 8, unary(Table(0))),
        op::<SetBit<true>>(0x02, 4, unary(DirectBit(0))),
        op::<BranchBit<true>>(0x03, 5, pair(DirectBit(0), Relative)),
        op::<Or>(0x04, 3, pair(A, Direct)),
        op::<Or>(0x05, 4, pair(A, Absolute)),
        op::<Or>(0x06, 3, pair(A, IndirectX)),
        op::<Or>(0x07, 6, pair(A, DirectXIndirect)),
        op::<Or>(0x08, 2, pair(A, Immediate)),
        op::<Or>(0x09, 6, pair(Direct, Direct)),
        op::<Or1>(0x0a, 5, pair(Carry, MemoryBit)),
        op::<Asl>(0x0b, 4, unary(Direct)),
        op::<Asl>(0x0c, 5, unary(Absolute)),
        op::<Push>(0x0d, 4, unary(Psw)),
        op::<TestBits<true>>(0x0e, 6, unary(Absolute)),
        op::<Brk>(0x0f, 8, SpcMode::IMPLIED),
        op::<Branch<PSW_FLAG_N, false>>(0x10, 2, unary(Relative)),
        op::<Tcall>(0x11, 8, unary(Table(1))),
        op::<SetBit<false>>(0x12, 4, unary(DirectBit(0))),
        op::<BranchBit<false>>(0x13, 5, pair(DirectBit(0), Relative)),
        op::<Or>(0x14, 4, pair(A, DirectX)),
        op::<Or>(0x15, 5, pair(A, AbsoluteX)),
        op::<Or>(0x16, 5, pair(A, AbsoluteY)),
        op::<Or>(0x17, 6, pair(A, DirectIndirectY)),
        op::<Or>(0x18, 5, pair(Direct, Immediate)),
        op::<Or>(0x19, 5, pair(IndirectX, IndirectY)),
        op::<Decw>(0x1a, 6, unary(Direct)),
        op::<Asl>(0x1b, 5, unary(DirectX)),
        op::<Asl>(0x1c, 2, unary(A)),
        op::<Dec>(0x1d, 2, unary(X)),
        op::<Cmp>(0x1e, 4, pair(X, Absolute)),
        op::<Jmp>(0x1f, 6, unary(AbsoluteXIndirect)),
        op::<SetFlag<PSW_FLAG_P, false>>(0x20, 2, SpcMode::IMPLIED),
        op::<Tcall>(0x21, 8, unary(Table(2))),
        op::<SetBit<true>>(0x22, 4, unary(DirectBit(1))),
        op::<BranchBit<true>>(0x23, 5, pair(DirectBit(1), Relative)),
        op::<And>(0x24, 3, pair(A, Direct)),
        op::<And>(0x25, 4, pair(A, Absolute)),
        op::<And>(0x26, 3, pair(A, IndirectX)),
        op::<And>(0x27, 6, pair(A, DirectXIndirect)),
        op::<And>(0x28, 2, pair(A, Immediate)),
        op::<And>(0x29, 6, pair(Direct, Direct)),
        op::<Or1>(0x2a, 5, pair(Carry, NegatedMemoryBit)),
        op::<Rol>(0x2b, 4, unary(Direct)),
        op::<Rol>(0x2c, 5, unary(Absolute)),
        op::<Push>(0x2d, 4, unary(A)),
        op::<Cbne>(0x2e, 5, pair(Direct, Relative)),
        op::<Bra>(0x2f, 2, unary(Relative)),
        op::<Branch<PSW_FLAG_N, true>>(0x30, 2, unary(Relative)),
        op::<Tcall>(0x31, 8, unary(Table(3))),
        op::<SetBit<false>>(0x32, 4, unary(DirectBit(1))),
        op::<BranchBit<false>>(0x33, 5, pair(DirectBit(1), Relative)),
        op::<And>(0x34, 4, pair(A, DirectX)),
        op::<And>(0x35, 5, pair(A, AbsoluteX)),
        op::<And>(0x36, 5, pair(A, AbsoluteY)),
        op::<And>(0x37, 6, pair(A, DirectIndirectY)),
        op::<And>(0x38, 5, pair(Direct, Immediate)),
        op::<And>(0x39, 5, pair(IndirectX, IndirectY)),
        op::<Incw>(0x3a, 6, unary(Direct)),
        op::<Rol>(0x3b, 5, unary(DirectX)),
        op::<Rol>(0x3c, 2, unary(A)),
        op::<Inc>(0x3d, 2, unary(X)),
        op::<Cmp>(0x3e, 3, pair(X, Direct)),
        op::<Call>(0x3f, 8, unary(Absolute)),
        op::<SetFlag<PSW_FLAG_P, true>>(0x40, 2, SpcMode::IMPLIED),
        op::<Tcall>(0x41, 8, unary(Table(4))),
        op::<SetBit<true>>(0x42, 4, unary(DirectBit(2))),
        op::<BranchBit<true>>(0x43, 5, pair(DirectBit(2), Relative)),
        op::<Eor>(0x44, 3, pair(A, Direct)),
        op::<Eor>(0x45, 4, pair(A, Absolute)),
        op::<Eor>(0x46, 3, pair(A, IndirectX)),
        op::<Eor>(0x47, 6, pair(A, DirectXIndirect)),
        op::<Eor>(0x48, 2, pair(A, Immediate)),
        op::<Eor>(0x49, 6, pair(Direct, Direct)),
        op::<And1>(0x4a, 4, pair(Carry, MemoryBit)),
        op::<Lsr>(0x4b, 4, unary(Direct)),
        op::<Lsr>(0x4c, 5, unary(Absolute)),
        op::<Push>(0x4d, 4, unary(X)),
        op::<TestBits<false>>(0x4e, 6, unary(Absolute)),
        op::<Pcall>(0x4f, 6, unary(HighPage)),
        op::<Branch<PSW_FLAG_V, false>>(0x50, 2, unary(Relative)),
        op::<Tcall>(0x51, 8, unary(Table(5))),
        op::<SetBit<false>>(0x52, 4, unary(DirectBit(2))),
        op::<BranchBit<false>>(0x53, 5, pair(DirectBit(2), Relative)),
        op::<Eor>(0x54, 4, pair(A, DirectX)),
        op::<Eor>(0x55, 5, pair(A, AbsoluteX)),
        op::<Eor>(0x56, 5, pair(A, AbsoluteY)),
        op::<Eor>(0x57, 6, pair(A, DirectIndirectY)),
        op::<Eor>(0x58, 5, pair(Direct, Immediate)),
        op::<Eor>(0x59, 5, pair(IndirectX, IndirectY)),
        op::<Cmpw>(0x5a, 4, pair(Ya, Direct)),
        op::<Lsr>(0x5b, 5, unary(DirectX)),
        op::<Lsr>(0x5c, 2, unary(A)),
        op::<Mov>(0x5d, 2, pair(X, A)),
        op::<Cmp>(0x5e, 4, pair(Y, Absolute)),
        op::<Jmp>(0x5f, 3, unary(Absolute)),
        op::<SetFlag<PSW_FLAG_C, false>>(0x60, 2, SpcMode::IMPLIED),
        op::<Tcall>(0x61, 8, unary(Table(6))),
        op::<SetBit<true>>(0x62, 4, unary(DirectBit(3))),
        op::<BranchBit<true>>(0x63, 5, pair(DirectBit(3), Relative)),
        op::<Cmp>(0x64, 3, pair(A, Direct)),
        op::<Cmp>(0x65, 4, pair(A, Absolute)),
        op::<Cmp>(0x66, 3, pair(A, IndirectX)),
        op::<Cmp>(0x67, 6, pair(A, DirectXIndirect)),
        op::<Cmp>(0x68, 2, pair(A, Immediate)),
        op::<Cmp>(0x69, 6, pair(Direct, Direct)),
        op::<And1>(0x6a, 4, pair(Carry, NegatedMemoryBit)),
        op::<Ror>(0x6b, 4, unary(Direct)),
        op::<Ror>(0x6c, 5, unary(Absolute)),
        op::<Push>(0x6d, 4, unary(Y)),
        op::<Dbnz>(0x6e, 5, pair(Direct, Relative)),
        op::<Ret>(0x6f, 5, SpcMode::IMPLIED),
        op::<Branch<PSW_FLAG_V, true>>(0x70, 2, unary(Relative)),
        op::<Tcall>(0x71, 8, unary(Table(7))),
        op::<SetBit<false>>(0x72, 4, unary(DirectBit(3))),
        op::<BranchBit<false>>(0x73, 5, pair(DirectBit(3), Relative)),
        op::<Cmp>(0x74, 4, pair(A, DirectX)),
        op::<Cmp>(0x75, 5, pair(A, AbsoluteX)),
        op::<Cmp>(0x76, 5, pair(A, AbsoluteY)),
        op::<Cmp>(0x77, 6, pair(A, DirectIndirectY)),
        op::<Cmp>(0x78, 5, pair(Direct, Immediate)),
        op::<Cmp>(0x79, 5, pair(IndirectX, IndirectY)),
        op::<Addw>(0x7a, 5, pair(Ya, Direct)),
        op::<Ror>(0x7b, 5, unary(DirectX)),
        op::<Ror>(0x7c, 2, unary(A)),
        op::<Mov>(0x7d, 2, pair(A, X)),
        op::<Cmp>(0x7e, 3, pair(Y, Direct)),
        op::<Ret1>(0x7f, 6, SpcMode::IMPLIED),
        op::<SetFlag<PSW_FLAG_C, true>>(0x80, 2, SpcMode::IMPLIED),
        op::<Tcall>(0x81, 8, unary(Table(8))),
        op::<SetBit<true>>(0x82, 4, unary(DirectBit(4))),
        op::<BranchBit<true>>(0x83, 5, pair(DirectBit(4), Relative)),
        op::<Adc>(0x84, 3, pair(A, Direct)),
        op::<Adc>(0x85, 4, pair(A, Absolute)),
        op::<Adc>(0x86, 3, pair(A, IndirectX)),
        op::<Adc>(0x87, 6, pair(A, DirectXIndirect)),
        op::<Adc>(0x88, 2, pair(A, Immediate)),
        op::<Adc>(0x89, 6, pair(Direct, Direct)),
        op::<Eor1>(0x8a, 5, pair(Carry, MemoryBit)),
        op::<Dec>(0x8b, 4, unary(Direct)),
        op::<Dec>(0x8c, 5, unary(Absolute)),
        op::<Mov>(0x8d, 2, pair(Y, Immediate)),
        op::<Pop>(0x8e, 4, unary(Psw)),
        op::<Mov>(0x8f, 5, pair(Direct, Immediate)),
        op::<Branch<PSW_FLAG_C, false>>(0x90, 2, unary(Relative)),
        op::<Tcall>(0x91, 8, unary(Table(9))),
        op::<SetBit<false>>(0x92, 4, unary(DirectBit(4))),
        op::<BranchBit<false>>(0x93, 5, pair(DirectBit(4), Relative)),
        op::<Adc>(0x94, 4, pair(A, DirectX)),
        op::<Adc>(0x95, 5, pair(A, AbsoluteX)),
        op::<Adc>(0x96, 5, pair(A, AbsoluteY)),
        op::<Adc>(0x97, 6, pair(A, DirectIndirectY)),
        op::<Adc>(0x98, 5, pair(Direct, Immediate)),
        op::<Adc>(0x99, 5, pair(IndirectX, IndirectY)),
        op::<Subw>(0x9a, 5, pair(Ya, Direct)),
        op::<Dec>(0x9b, 5, unary(DirectX)),
        op::<Dec>(0x9c, 2, unary(A)),
        op::<Mov>(0x9d, 2, pair(X, Sp)),
        op::<Div>(0x9e, 12, pair(Ya, X)),
        op::<Xcn>(0x9f, 5, unary(A)),
        op::<SetFlag<PSW_FLAG_I, true>>(0xa0, 3, SpcMode::IMPLIED),
        op::<Tcall>(0xa1, 8, unary(Table(10))),
        op::<SetBit<true>>(0xa2, 4, unary(DirectBit(5))),
        op::<BranchBit<true>>(0xa3, 5, pair(DirectBit(5), Relative)),
        op::<Sbc>(0xa4, 3, pair(A, Direct)),
        op::<Sbc>(0xa5, 4, pair(A, Absolute)),
        op::<Sbc>(0xa6, 3, pair(A, IndirectX)),
        op::<Sbc>(0xa7, 6, pair(A, DirectXIndirect)),
        op::<Sbc>(0xa8, 2, pair(A, Immediate)),
        op::<Sbc>(0xa9, 6, pair(Direct, Direct)),
        op::<Mov1>(0xaa, 4, pair(Carry, MemoryBit)),
        op::<Inc>(0xab, 4, unary(Direct)),
        op::<Inc>(0xac, 5, unary(Absolute)),
        op::<Cmp>(0xad, 2, pair(Y, Immediate)),
        op::<Pop>(0xae, 4, unary(A)),
        op::<Mov>(0xaf, 4, pair(IndirectXIncrement, A)),
        op::<Branch<PSW_FLAG_C, true>>(0xb0, 2, unary(Relative)),
        op::<Tcall>(0xb1, 8, unary(Table(11))),
        op::<SetBit<false>>(0xb2, 4, unary(DirectBit(5))),
        op::<BranchBit<false>>(0xb3, 5, pair(DirectBit(5), Relative)),
        op::<Sbc>(0xb4, 4, pair(A, DirectX)),
        op::<Sbc>(0xb5, 5, pair(A, AbsoluteX)),
        op::<Sbc>(0xb6, 5, pair(A, AbsoluteY)),
        op::<Sbc>(0xb7, 6, pair(A, DirectIndirectY)),
        op::<Sbc>(0xb8, 5, pair(Direct, Immediate)),
        op::<Sbc>(0xb9, 5, pair(IndirectX, IndirectY)),
        op::<Movw>(0xba, 5, pair(Ya, Direct)),
        op::<Inc>(0xbb, 5, unary(DirectX)),
        op::<Inc>(0xbc, 2, unary(A)),
        op::<Mov>(0xbd, 2, pair(Sp, X)),
        op::<Das>(0xbe, 3, unary(A)),
        op::<Mov>(0xbf, 4, pair(A, IndirectXIncrement)),
        op::<SetFlag<PSW_FLAG_I, false>>(0xc0, 3, SpcMode::IMPLIED),
        op::<Tcall>(0xc1, 8, unary(Table(12))),
        op::<SetBit<true>>(0xc2, 4, unary(DirectBit(6))),
        op::<BranchBit<true>>(0xc3, 5, pair(DirectBit(6), Relative)),
        op::<Mov>(0xc4, 4, pair(Direct, A)),
        op::<Mov>(0xc5, 5, pair(Absolute, A)),
        op::<Mov>(0xc6, 4, pair(IndirectX, A)),
        op::<Mov>(0xc7, 7, pair(DirectXIndirect, A)),
        op::<Cmp>(0xc8, 2, pair(X, Immediate)),
        op::<Mov>(0xc9, 5, pair(Absolute, X)),
        op::<Mov1>(0xca, 6, pair(MemoryBit, Carry)),
        op::<Mov>(0xcb, 4, pair(Direct, Y)),
        op::<Mov>(0xcc, 5, pair(Absolute, Y)),
        op::<Mov>(0xcd, 2, pair(X, Immediate)),
        op::<Pop>(0xce, 4, unary(X)),
        op::<Mul>(0xcf, 9, unary(Ya)),
        op::<Branch<PSW_FLAG_Z, false>>(0xd0, 2, unary(Relative)),
        op::<Tcall>(0xd1, 8, unary(Table(13))),
        op::<SetBit<false>>(0xd2, 4, unary(DirectBit(6))),
        op::<BranchBit<false>>(0xd3, 5, pair(DirectBit(6), Relative)),
        op::<Mov>(0xd4, 5, pair(DirectX, A)),
        op::<Mov>(0xd5, 6, pair(AbsoluteX, A)),
        op::<Mov>(0xd6, 6, pair(AbsoluteY, A)),
        op::<Mov>(0xd7, 7, pair(DirectIndirectY, A)),
        op::<Mov>(0xd8, 4, pair(Direct, X)),
        op::<Mov>(0xd9, 5, pair(DirectY, X)),
        op::<Movw>(0xda, 5, pair(Direct, Ya)),
        op::<Mov>(0xdb, 5, pair(DirectX, Y)),
        op::<Dec>(0xdc, 2, unary(Y)),
        op::<Mov>(0xdd, 2, pair(A, Y)),
        op::<Cbne>(0xde, 6, pair(DirectX, Relative)),
        op::<Daa>(0xdf, 3, unary(A)),
        op::<Clrv>(0xe0, 2, SpcMode::IMPLIED),
        op::<Tcall>(0xe1, 8, unary(Table(14))),
        op::<SetBit<true>>(0xe2, 4, unary(DirectBit(7))),
        op::<BranchBit<true>>(0xe3, 5, pair(DirectBit(7), Relative)),
        op::<Mov>(0xe4, 3, pair(A, Direct)),
        op::<Mov>(0xe5, 4, pair(A, Absolute)),
        op::<Mov>(0xe6, 3, pair(A, IndirectX)),
        op::<Mov>(0xe7, 6, pair(A, DirectXIndirect)),
        op::<Mov>(0xe8, 2, pair(A, Immediate)),
        op::<Mov>(0xe9, 4, pair(X, Absolute)),
        op::<Not1>(0xea, 5, unary(MemoryBit)),
        op::<Mov>(0xeb, 3, pair(Y, Direct)),
        op::<Mov>(0xec, 4, pair(Y, Absolute)),
        op::<Notc>(0xed, 3, SpcMode::IMPLIED),
        op::<Pop>(0xee, 4, unary(Y)),
        op::<Halt<0xef>>(0xef, 3, SpcMode::IMPLIED),
        op::<Branch<PSW_FLAG_Z, true>>(0xf0, 2, unary(Relative)),
        op::<Tcall>(0xf1, 8, unary(Table(15))),
        op::<SetBit<false>>(0xf2, 4, unary(DirectBit(7))),
        op::<BranchBit<false>>(0xf3, 5, pair(DirectBit(7), Relative)),
        op::<Mov>(0xf4, 4, pair(A, DirectX)),
        op::<Mov>(0xf5, 5, pair(A, AbsoluteX)),
        op::<Mov>(0xf6, 5, pair(A, AbsoluteY)),
        op::<Mov>(0xf7, 6, pair(A, DirectIndirectY)),
        op::<Mov>(0xf8, 3, pair(X, Direct)),
        op::<Mov>(0xf9, 4, pair(X, DirectY)),
        op::<Mov>(0xfa, 5, pair(Direct, Direct)),
        op::<Mov>(0xfb, 4, pair(Y, DirectX)),
        op::<Inc>(0xfc, 2, unary(Y)),
        op::<Mov>(0xfd, 2, pair(Y, A)),
        op::<Dbnz>(0xfe, 4, pair(Y, Relative)),
        op::<Halt<0xff>>(0xff, 3, SpcMode::IMPLIED),
    ])
}

//===========================================================================//
