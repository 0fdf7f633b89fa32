//! Whole-array primitives.
//!
//! Each operation walks the full input and allocates a fresh output, the way
//! an array library evaluates `sqrt(b**2 - 4*a*c)` one operator at a time.

use crate::element::Element;

/// Apply `f` to every element
pub fn map<T: Element>(values: &[T], f: impl Fn(T) -> T) -> Vec<T> {
    values.iter().map(|&v| f(v)).collect()
}

/// Combine two equally sized arrays elementwise
pub fn zip_with<T: Element>(lhs: &[T], rhs: &[T], f: impl Fn(T, T) -> T) -> Vec<T> {
    debug_assert_eq!(lhs.len(), rhs.len());
    lhs.iter().zip(rhs).map(|(&l, &r)| f(l, r)).collect()
}

pub fn mul<T: Element>(lhs: &[T], rhs: &[T]) -> Vec<T> {
    zip_with(lhs, rhs, |l, r| l * r)
}

pub fn sub<T: Element>(lhs: &[T], rhs: &[T]) -> Vec<T> {
    zip_with(lhs, rhs, |l, r| l - r)
}

pub fn scale<T: Element>(values: &[T], factor: T) -> Vec<T> {
    map(values, |v| v * factor)
}

pub fn square<T: Element>(values: &[T]) -> Vec<T> {
    map(values, |v| v * v)
}

pub fn sqrt<T: Element>(values: &[T]) -> Vec<T> {
    map(values, T::sqrt)
}

pub fn sin<T: Element>(values: &[T]) -> Vec<T> {
    map(values, T::sin)
}
