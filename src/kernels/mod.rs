//! Elementwise kernels for the CPU strategies

pub mod array;
pub mod cpu;

pub use cpu::{array_ops, fused, looped, parallel};
