//! Behavioral tests for the active engine backend via `DefaultEngine`.
//!
//! Plugins are authored as WAT, compiled with the `wat` crate, and written
//! to a temp dir so construction exercises the real load-from-path flow.

use std::path::PathBuf;

use lupine::{
  CapabilityBridge, DefaultEngine, HostFnError, HostModule, InstantiationError, InvocationError,
  LoadError, WasmEngine, WasmFunction,
};

const MATH_PLUGIN: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "add") (param i32 i32) (result i32)
    (i32.add (local.get 0) (local.get 1)))
  (func (export "noop") (param i32))
  (func (export "crash") unreachable))
"#;

const COUNTER_PLUGIN: &str = r#"
(module
  (memory 1)
  (func (export "bump") (result i32)
    (i32.store (i32.const 0)
      (i32.add (i32.load (i32.const 0)) (i32.const 1)))
    (i32.load (i32.const 0))))
"#;

const IMPORTING_PLUGIN: &str = r#"
(module
  (import "env" "offset" (func $offset (result i32)))
  (func (export "plus_offset") (param i32) (result i32)
    (i32.add (local.get 0) (call $offset))))
"#;

fn write_plugin(wat: &str) -> (tempfile::TempDir, PathBuf) {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let path = dir.path().join("plugin.wasm");
  let bytes = wat::parse_str(wat).expect("failed to compile wat fixture");
  std::fs::write(&path, bytes).expect("failed to write plugin");
  (dir, path)
}

#[test]
fn resolves_function_exports_by_exact_name() {
  let (_dir, path) = write_plugin(MATH_PLUGIN);
  let engine =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect("failed to construct engine");

  assert!(engine.function("add").is_some());
  assert!(engine.function("noop").is_some());
  assert!(engine.function("missing").is_none());
  // exact match only
  assert!(engine.function("Add").is_none());
}

#[test]
fn non_function_export_resolves_to_none() {
  let (_dir, path) = write_plugin(MATH_PLUGIN);
  let engine =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect("failed to construct engine");

  // "memory" exists in the export table but is not of function kind
  assert!(engine.function("memory").is_none());
}

#[test]
fn invokes_with_positional_i32_arguments() {
  let (_dir, path) = write_plugin(MATH_PLUGIN);
  let engine =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect("failed to construct engine");

  let add = engine.function("add").expect("add should be exported");
  assert_eq!(add.invoke(&[2, 3]).expect("add should succeed"), vec![5]);

  let noop = engine.function("noop").expect("noop should be exported");
  assert_eq!(noop.invoke(&[7]).expect("noop should succeed"), Vec::<i32>::new());
}

#[test]
fn arity_mismatch_fails_without_calling() {
  let (_dir, path) = write_plugin(MATH_PLUGIN);
  let engine =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect("failed to construct engine");

  let add = engine.function("add").expect("add should be exported");
  let err = add.invoke(&[2]).expect_err("arity mismatch should fail");
  assert!(matches!(
    err,
    InvocationError::SignatureMismatch {
      expected: 2,
      actual: 1
    }
  ));
}

#[test]
fn trap_fails_that_call_only() {
  let (_dir, path) = write_plugin(MATH_PLUGIN);
  let engine =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect("failed to construct engine");

  let crash = engine.function("crash").expect("crash should be exported");
  let err = crash.invoke(&[]).expect_err("unreachable should trap");
  assert!(matches!(err, InvocationError::Trap { .. }));

  // the engine stays usable for other exports
  let add = engine.function("add").expect("add should still resolve");
  assert_eq!(add.invoke(&[1, 1]).expect("add should still work"), vec![2]);
}

#[test]
fn truncated_bytes_fail_as_load_error() {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let path = dir.path().join("plugin.wasm");
  std::fs::write(&path, b"\0as").expect("failed to write bytes");

  let err = DefaultEngine::new(&path, CapabilityBridge::empty())
    .expect_err("truncated header should fail");
  assert!(matches!(
    err,
    InstantiationError::Load(LoadError::Parse { .. })
  ));
}

#[test]
fn missing_file_fails_as_load_error() {
  let dir = tempfile::tempdir().expect("failed to create temp dir");
  let path = dir.path().join("nope.wasm");

  let err =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect_err("missing file should fail");
  assert!(matches!(err, InstantiationError::Load(LoadError::Io { .. })));
}

#[test]
fn unsatisfied_import_fails_at_construction() {
  let (_dir, path) = write_plugin(IMPORTING_PLUGIN);

  let err = DefaultEngine::new(&path, CapabilityBridge::empty())
    .expect_err("missing host import should fail");
  assert!(matches!(err, InstantiationError::Link { .. }));
}

#[test]
fn bridge_import_satisfies_module() {
  let (_dir, path) = write_plugin(IMPORTING_PLUGIN);
  let bridge = CapabilityBridge::empty()
    .host_module(HostModule::new("env").func("offset", 0, 1, |_| Ok(vec![100])));

  let engine = DefaultEngine::new(&path, bridge).expect("failed to construct engine");
  let plus = engine
    .function("plus_offset")
    .expect("plus_offset should be exported");
  assert_eq!(plus.invoke(&[23]).expect("call should succeed"), vec![123]);
}

#[test]
fn host_function_error_surfaces_as_trap() {
  let (_dir, path) = write_plugin(IMPORTING_PLUGIN);
  let bridge = CapabilityBridge::empty().host_module(
    HostModule::new("env").func("offset", 0, 1, |_| Err(HostFnError::new("capability denied"))),
  );

  let engine = DefaultEngine::new(&path, bridge).expect("failed to construct engine");
  let plus = engine
    .function("plus_offset")
    .expect("plus_offset should be exported");
  let err = plus.invoke(&[1]).expect_err("host error should trap");
  assert!(matches!(err, InvocationError::Trap { .. }));
}

#[test]
fn runtime_context_is_shared_across_calls() {
  let (_dir, path) = write_plugin(COUNTER_PLUGIN);
  let engine =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect("failed to construct engine");

  let bump = engine.function("bump").expect("bump should be exported");
  assert_eq!(bump.invoke(&[]).expect("first call"), vec![1]);
  assert_eq!(bump.invoke(&[]).expect("second call"), vec![2]);
}

#[test]
fn two_handles_observe_the_same_state() {
  let (_dir, path) = write_plugin(COUNTER_PLUGIN);
  let engine =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect("failed to construct engine");

  let first = engine.function("bump").expect("bump should be exported");
  let second = engine.function("bump").expect("bump should be exported");

  assert_eq!(first.invoke(&[]).expect("first handle"), vec![1]);
  assert_eq!(second.invoke(&[]).expect("second handle"), vec![2]);
  assert_eq!(first.invoke(&[]).expect("first handle again"), vec![3]);
}

#[test]
fn start_trap_fails_construction() {
  let (_dir, path) = write_plugin("(module (func $boom unreachable) (start $boom))");

  let err =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect_err("start trap should fail");
  assert!(matches!(err, InstantiationError::Start { .. }));
}

#[test]
fn non_i32_signature_is_rejected() {
  let (_dir, path) = write_plugin(
    r#"(module (func (export "half") (param f64) (result f64) (local.get 0)))"#,
  );
  let engine =
    DefaultEngine::new(&path, CapabilityBridge::empty()).expect("failed to construct engine");

  let half = engine.function("half").expect("half should be exported");
  let err = half.invoke(&[4]).expect_err("f64 signature should be rejected");
  assert!(matches!(err, InvocationError::UnsupportedType { .. }));
}
