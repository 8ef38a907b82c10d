//! Parameter grids the workers sample order volumes and prices from.

use rand::Rng;
use rust_decimal::Decimal;

use crate::config::RangeSpec;

/// Ordered set of decimal values stepped from `min` to `max` inclusive.
///
/// Built once per run with exact decimal arithmetic and shared read-only by
/// every worker. The current value is appended before the bound check, so a
/// grid always holds at least one element, even when `min == max`.
#[derive(Debug, Clone)]
pub struct ParameterGrid {
    values: Vec<Decimal>,
}

impl ParameterGrid {
    /// Build the grid for a validated range (`step > 0`, `min <= max`).
    pub fn build(range: RangeSpec) -> Self {
        let mut values = Vec::new();
        let mut current = range.min;
        loop {
            values.push(current);
            current += range.step;
            if current > range.max {
                break;
            }
        }
        Self { values }
    }

    pub fn values(&self) -> &[Decimal] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Uniformly pick one value.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Decimal {
        self.values[rng.gen_range(0..self.values.len())]
    }
}
