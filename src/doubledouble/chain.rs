//! Chained double-double operations over slices.
//!
//! `sum` and `product` form one dependent chain, so their run time measures
//! operation latency. The in-place routines touch every element
//! independently and measure throughput.

use super::{DoubleDouble, dd_add, dd_mul};

/// Adds all values in order, starting from zero.
pub fn sum(values: &[DoubleDouble]) -> DoubleDouble {
    values.iter().fold(DoubleDouble::zero(), |acc, &x| dd_add(acc, x))
}

/// Multiplies all values in order, starting from one.
pub fn product(values: &[DoubleDouble]) -> DoubleDouble {
    values
        .iter()
        .fold(DoubleDouble::from(1.0), |acc, &x| dd_mul(acc, x))
}

/// `values[i] += addend` for every element.
pub fn add_assign_all(values: &mut [DoubleDouble], addend: DoubleDouble) {
    for x in values.iter_mut() {
        *x = dd_add(*x, addend);
    }
}

/// `values[i] *= multiplier` for every element.
pub fn mul_assign_all(values: &mut [DoubleDouble], multiplier: DoubleDouble) {
    for x in values.iter_mut() {
        *x = dd_mul(*x, multiplier);
    }
}
