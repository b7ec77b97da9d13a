//! Reference matrix operations.
//!
//! These provide the correctness baseline the blocked driver and the
//! microkernels are tested against.

pub mod naive;
