//! The elementwise formulas being benchmarked and their input generators

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::error::{length_mismatch, BenchError, BenchResult};

/// Elementwise formula under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workload {
    /// `y = sin(x)` over a counting sequence
    Sine,
    /// `y = sqrt(b^2 - 4ac)` over three random arrays
    Discriminant,
}

impl Workload {
    pub fn name(self) -> &'static str {
        match self {
            Workload::Sine => "sine",
            Workload::Discriminant => "discriminant",
        }
    }

    /// Number of input columns
    pub fn arity(self) -> usize {
        match self {
            Workload::Sine => 1,
            Workload::Discriminant => 3,
        }
    }

    /// Column names as bound in the GPU kernels
    pub fn column_names(self) -> &'static [&'static str] {
        match self {
            Workload::Sine => &["x"],
            Workload::Discriminant => &["a", "b", "c"],
        }
    }

    /// Build the input for a run.
    ///
    /// Sine uses `0, 1, .., size - 1`. Discriminant samples `a` and `c` from
    /// `[0, 1)` and `b` from `[10, 11)`, so the radicand stays positive.
    pub fn generate<T: Element>(self, size: usize, seed: Option<u64>) -> BenchResult<BenchInput<T>> {
        if size == 0 {
            return Err(BenchError::Config("input size must be positive".to_string()));
        }

        let columns = match self {
            Workload::Sine => vec![(0..size).map(|i| T::from_f64(i as f64)).collect()],
            Workload::Discriminant => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let mut sample = |offset: f64| -> Vec<T> {
                    (0..size)
                        .map(|_| T::from_f64(rng.gen::<f64>() + offset))
                        .collect()
                };
                let a = sample(0.0);
                let b = sample(10.0);
                let c = sample(0.0);
                vec![a, b, c]
            }
        };

        BenchInput::new(self, columns)
    }

    /// Scalar evaluation of one element in `f64`
    pub fn evaluate(self, args: &[f64]) -> f64 {
        match self {
            Workload::Sine => args[0].sin(),
            Workload::Discriminant => {
                let (a, b, c) = (args[0], args[1], args[2]);
                (b * b - 4.0 * a * c).sqrt()
            }
        }
    }

    /// Reference output computed in double precision
    pub fn reference<T: Element>(self, input: &BenchInput<T>) -> Vec<f64> {
        let mut args = vec![0.0; self.arity()];
        (0..input.len())
            .map(|i| {
                for (slot, column) in args.iter_mut().zip(input.columns()) {
                    *slot = column[i].to_f64();
                }
                self.evaluate(&args)
            })
            .collect()
    }

    /// WGSL expression over the bound column names
    pub fn wgsl_expression<T: Element>(self) -> String {
        match self {
            Workload::Sine => "sin(x)".to_string(),
            Workload::Discriminant => format!("sqrt(b * b - {} * a * c)", T::wgsl_literal(4.0)),
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only input shared by every candidate in a run
#[derive(Debug, Clone)]
pub struct BenchInput<T: Element> {
    workload: Workload,
    columns: Vec<Vec<T>>,
}

impl<T: Element> BenchInput<T> {
    /// Wrap explicit columns. All columns must have the same, positive length.
    pub fn new(workload: Workload, columns: Vec<Vec<T>>) -> BenchResult<Self> {
        if columns.len() != workload.arity() {
            return Err(BenchError::ShapeMismatch {
                strategy: workload.name().to_string(),
                expected: format!("{} input columns", workload.arity()),
                actual: format!("{} input columns", columns.len()),
            });
        }
        let len = columns[0].len();
        if len == 0 {
            return Err(BenchError::ShapeMismatch {
                strategy: workload.name().to_string(),
                expected: "at least one element".to_string(),
                actual: "0 elements".to_string(),
            });
        }
        if let Some(bad) = columns.iter().find(|c| c.len() != len) {
            return Err(length_mismatch(workload.name(), len, bad.len()));
        }
        Ok(Self { workload, columns })
    }

    pub fn workload(&self) -> Workload {
        self.workload
    }

    pub fn len(&self) -> usize {
        self.columns[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Vec<T>] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> &[T] {
        &self.columns[index]
    }

    /// Total bytes across all columns
    pub fn size_bytes(&self) -> usize {
        self.columns.len() * self.len() * T::DTYPE.size_of()
    }
}
