//! Wasmtime backend for lupine.
//!
//! Implements the `lupine-engine` contract on top of the wasmtime
//! compiler-based runtime. This is the default backend for native builds.

mod engine;

pub use engine::{WasmtimeEngine, WasmtimeFunction};
