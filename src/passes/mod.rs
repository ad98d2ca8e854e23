//! The six-pass compilation pipeline.

pub mod emit;
pub mod expand;
pub mod linearize;
pub mod lower;
pub mod pointer;
pub mod split;
