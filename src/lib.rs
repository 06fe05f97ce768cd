//! Cycle-counted emulation of the SNES main CPU (65C816) and its SPC700
//! sound coprocessor, each running over its own address-mapped bus.

#![warn(missing_docs)]

pub mod bus;
pub mod db;
pub mod dma;
pub mod error;
pub mod proc;
pub mod sched;
pub mod value;
