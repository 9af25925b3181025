#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(
    clippy::needless_return,
    clippy::missing_docs_in_private_items,
    clippy::non_ascii_literal
)]

//! Keycalc, the engine behind a keypad calculator.
//!
//! Keys are fed to an [`Engine`](struct.Engine.html) one at a time, either
//! operands or operation symbols, and the engine records them in a program.
//! Asking for the current state replays the whole program and gives back the
//! result, whether an operation is still waiting for an operand, and an infix
//! description of what was entered:
//!
//! ```
//! use keycalc::Engine;
//!
//! let mut engine = Engine::new();
//! engine.set_operand(4.0);
//! engine.perform_operation("√");
//! engine.perform_operation("+");
//! engine.set_operand(3.0);
//!
//! let evaluation = engine.evaluate();
//! assert_eq!(evaluation.result, Some(3.0));
//! assert!(evaluation.is_pending);
//! assert_eq!(evaluation.description, "√(4)+3");
//! ```
//!
//! Because the program is the only state, undo is just dropping the last
//! entry:
//!
//! ```
//! use keycalc::Engine;
//!
//! let mut engine = Engine::new();
//! engine.set_operand(9.0);
//! engine.perform_operation("√");
//! assert_eq!(engine.undo().map(|e| e.description), Some("9".to_string()));
//! assert_eq!(engine.undo().map(|e| e.result), Some(None));
//! assert_eq!(engine.undo(), None);
//! ```
//!
//! # Keys
//!
//! The operation symbols understood by the engine are listed in
//! [`OPERATIONS`](struct.OPERATIONS.html):
//!
//! - constants: `π`, `e`;
//! - unary operations: `√`, `1/x`, `%`, `cos`, `sin`, `tan`, `±`;
//! - binary operations: `×`, `÷`, `+`, `−` (the minus sign, U+2212);
//! - `Ran`, a uniform draw in `[0, 1)`, made again on every replay;
//! - `=`.
//!
//! Any other symbol is ignored. There is no precedence between binary
//! operations: they are combined in the order they were entered, so `2+3×4`
//! is `20`. Division by zero and friends follow `f64` semantics and show up
//! as infinities or `NaN`.
//!
//! # Technical details
//!
//! Nothing is parsed. The engine keeps a list of [`Token`](enum.Token.html)s
//! and an accumulator model is replayed over it on demand. Variables are
//! bound per engine and resolved at evaluation time, missing ones being `0`.
//! The program can be flattened to numbers and strings with
//! [`Engine::program`](struct.Engine.html#method.program) and saved in any
//! [`KeyValueStore`](trait.KeyValueStore.html).

#[macro_use]
extern crate lazy_static;

mod engine;
mod error;
mod format;
mod graph;
mod operation;
mod store;
mod token;

pub use engine::{Engine, Evaluation};
pub use error::Error;
pub use format::{NumberFormat, NumberFormatter};
pub use operation::{Operation, OPERATIONS};
pub use store::{KeyValueStore, MemoryStore};
pub use token::{Literal, Primitive, Token};
