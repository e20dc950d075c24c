//! Core positioning algorithms

pub mod multilateration;

pub use multilateration::{MultilaterationSolver, Solution, SolveError};
