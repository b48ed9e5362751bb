//! Engine contract for lupine.
//!
//! This crate defines the backend-agnostic surface of the plugin host:
//! the [`WasmEngine`] and [`WasmFunction`] traits, the [`CapabilityBridge`]
//! shape consumed at instantiation, and the error taxonomy shared by every
//! backend. Backend crates (`lupine-engine-wasmtime`, `lupine-engine-wasmi`)
//! implement the traits; callers depend only on this contract.

mod bridge;
mod engine;
mod error;

pub use bridge::{CapabilityBridge, HostFn, HostFunction, HostModule};
pub use engine::{WasmEngine, WasmFunction};
pub use error::{HostFnError, InstantiationError, InvocationError, LoadError};
