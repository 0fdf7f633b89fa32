//! CPU implementations of each workload, one function per execution style

use rayon::prelude::*;
use rayon::ThreadPool;

use super::array;
use crate::element::Element;
use crate::workload::{BenchInput, Workload};

#[inline(always)]
fn discriminant<T: Element>(a: T, b: T, c: T) -> T {
    (b * b - T::from_f64(4.0) * a * c).sqrt()
}

/// Zero-initialised output filled by an explicit indexed loop
#[allow(clippy::needless_range_loop)]
pub fn looped<T: Element>(input: &BenchInput<T>) -> Vec<T> {
    let len = input.len();
    let mut results = vec![T::ZERO; len];
    match input.workload() {
        Workload::Sine => {
            let x = input.column(0);
            for idx in 0..len {
                results[idx] = x[idx].sin();
            }
        }
        Workload::Discriminant => {
            let (a, b, c) = (input.column(0), input.column(1), input.column(2));
            for idx in 0..len {
                results[idx] = discriminant(a[idx], b[idx], c[idx]);
            }
        }
    }
    results
}

/// Operator-at-a-time evaluation with a temporary per operator
pub fn array_ops<T: Element>(input: &BenchInput<T>) -> Vec<T> {
    match input.workload() {
        Workload::Sine => array::sin(input.column(0)),
        Workload::Discriminant => {
            let b2 = array::square(input.column(1));
            let ac = array::mul(input.column(0), input.column(2));
            let four_ac = array::scale(&ac, T::from_f64(4.0));
            array::sqrt(&array::sub(&b2, &four_ac))
        }
    }
}

/// Single pass over the zipped columns
pub fn fused<T: Element>(input: &BenchInput<T>) -> Vec<T> {
    match input.workload() {
        Workload::Sine => input.column(0).iter().map(|&x| x.sin()).collect(),
        Workload::Discriminant => input
            .column(0)
            .iter()
            .zip(input.column(1))
            .zip(input.column(2))
            .map(|((&a, &b), &c)| discriminant(a, b, c))
            .collect(),
    }
}

/// Single pass split across the pool's workers
pub fn parallel<T: Element>(pool: &ThreadPool, input: &BenchInput<T>) -> Vec<T> {
    pool.install(|| match input.workload() {
        Workload::Sine => input.column(0).par_iter().map(|&x| x.sin()).collect(),
        Workload::Discriminant => input
            .column(0)
            .par_iter()
            .zip(input.column(1).par_iter())
            .zip(input.column(2).par_iter())
            .map(|((&a, &b), &c)| discriminant(a, b, c))
            .collect(),
    })
}
