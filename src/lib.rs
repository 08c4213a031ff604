//! A walk-path driven JSON transformation engine: a selector language for
//! addressing nodes in a JSON document (`walk`), the plumbing that threads
//! state between steps (`namespace`, `template`), the merge that orders
//! matches from several walks (`scheduler`), the mutating operations that
//! act on what a walk finds (`ops`), and the option-set driven CLI that
//! wires all of it to a command line (`cli`, `driver`).

pub mod cli;
pub mod driver;
pub mod error;
pub mod json;
pub mod namespace;
pub mod ops;
pub mod scheduler;
pub mod template;
pub mod terminal;
pub mod walk;
