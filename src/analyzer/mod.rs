//! The three axis analyzers (spec.md S4.2-S4.4). Each exposes a single
//! `analyze` entry point over a [`crate::tree::SyntaxTree`] and produces a
//! report that is both an external payload and the source of a raw axis
//! magnitude via `.score()`.

pub mod bread;
pub mod cheese;
pub mod ham;
