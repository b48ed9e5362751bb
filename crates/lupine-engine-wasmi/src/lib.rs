//! Wasmi backend for lupine.
//!
//! Implements the `lupine-engine` contract on top of the wasmi
//! interpreter. Pure Rust, no JIT — the backend of choice where the
//! wasmtime compiler cannot run (constrained targets, wasm-in-wasm).

mod engine;

pub use engine::{WasmiEngine, WasmiFunction};
