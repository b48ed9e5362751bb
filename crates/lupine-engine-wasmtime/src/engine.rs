//! Engine implementation on wasmtime.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use lupine_engine::{
  CapabilityBridge, InstantiationError, InvocationError, LoadError, WasmEngine, WasmFunction,
};
use tracing::{debug, info};
use wasmtime::{Engine, Func, FuncType, Instance, Linker, Module, Store, Val, ValType};

/// A plugin engine backed by wasmtime.
///
/// Holds the instantiated module and its store for the engine's lifetime.
/// The store is shared with every [`WasmtimeFunction`] handed out; a mutex
/// serializes calls so at most one invocation runs at a time.
pub struct WasmtimeEngine {
  store: Arc<Mutex<Store<()>>>,
  instance: Instance,
}

/// A callable handle to one exported function of a [`WasmtimeEngine`].
pub struct WasmtimeFunction {
  store: Arc<Mutex<Store<()>>>,
  func: Func,
}

impl std::fmt::Debug for WasmtimeEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WasmtimeEngine").finish_non_exhaustive()
  }
}

impl WasmEngine for WasmtimeEngine {
  type Function = WasmtimeFunction;

  fn new(path: &Path, bridge: CapabilityBridge) -> Result<Self, InstantiationError> {
    let engine = Engine::default();
    let module = load_module(&engine, path)?;
    let mut store = Store::new(&engine, ());

    let mut linker = Linker::new(&engine);
    register_bridge(&engine, &mut linker, &bridge)?;

    // Split linking from instantiation so unsatisfied imports and start
    // traps report as distinct failures.
    let pre = linker
      .instantiate_pre(&module)
      .map_err(|e| InstantiationError::Link {
        message: format!("{e:#}"),
      })?;
    let instance = pre
      .instantiate(&mut store)
      .map_err(|e| InstantiationError::Start {
        message: format!("{e:#}"),
      })?;

    info!(
      path = %path.display(),
      exports = module.exports().len(),
      "plugin instantiated"
    );

    Ok(Self {
      store: Arc::new(Mutex::new(store)),
      instance,
    })
  }

  fn function(&self, name: &str) -> Option<WasmtimeFunction> {
    // `None` strictly means absence; lookup does not mutate, so recover
    // the guard even after a poisoning panic and let invoke report it
    let mut store = self.store.lock().unwrap_or_else(|p| p.into_inner());
    let func = self.instance.get_export(&mut *store, name)?.into_func()?;
    debug!(name, "export resolved");
    Some(WasmtimeFunction {
      store: self.store.clone(),
      func,
    })
  }
}

impl WasmFunction for WasmtimeFunction {
  fn invoke(&self, args: &[i32]) -> Result<Vec<i32>, InvocationError> {
    let mut store = self.store.lock().map_err(|_| InvocationError::Trap {
      message: "runtime context poisoned by a previous trap".to_string(),
    })?;

    let ty = self.func.ty(&*store);
    check_signature(&ty, args.len())?;

    let params: Vec<Val> = args.iter().map(|&a| Val::I32(a)).collect();
    let mut results = vec![Val::I32(0); ty.results().len()];
    self
      .func
      .call(&mut *store, &params, &mut results)
      .map_err(|e| InvocationError::Trap {
        // alternate format renders the whole cause chain, so a host
        // function's error text survives the wasmtime trap wrapper
        message: format!("{e:#}"),
      })?;

    // check_signature guarantees every declared result is i32
    Ok(results.iter().map(|v| v.unwrap_i32()).collect())
  }
}

/// Read and parse the module at `path`. All-or-nothing; unreadable files
/// and malformed binaries are distinct failures.
fn load_module(engine: &Engine, path: &Path) -> Result<Module, LoadError> {
  let bytes = fs::read(path).map_err(|source| LoadError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let module = Module::new(engine, &bytes).map_err(|e| LoadError::Parse {
    message: format!("{e:#}"),
  })?;
  debug!(path = %path.display(), size = bytes.len(), "module parsed");
  Ok(module)
}

/// Register every bridge host function into the linker with an i32-only
/// signature. Host errors trap the calling module.
fn register_bridge(
  engine: &Engine,
  linker: &mut Linker<()>,
  bridge: &CapabilityBridge,
) -> Result<(), InstantiationError> {
  for host_module in bridge.modules() {
    for host_fn in host_module.functions() {
      let ty = FuncType::new(
        engine,
        vec![ValType::I32; host_fn.params()],
        vec![ValType::I32; host_fn.results()],
      );
      let callback = host_fn.callback();
      linker
        .func_new(
          host_module.name(),
          host_fn.name(),
          ty,
          move |_caller, params, results| {
            let args: Vec<i32> = params.iter().map(|v| v.unwrap_i32()).collect();
            let returned = callback(&args).map_err(wasmtime::Error::msg)?;
            if returned.len() != results.len() {
              return Err(wasmtime::Error::msg(format!(
                "host function returned {} value(s), declared {}",
                returned.len(),
                results.len()
              )));
            }
            for (slot, value) in results.iter_mut().zip(returned) {
              *slot = Val::I32(value);
            }
            Ok(())
          },
        )
        .map_err(|e| InstantiationError::Link {
          message: e.to_string(),
        })?;
    }
  }
  Ok(())
}

/// Reject calls whose arity or types fall outside the declared i32-only
/// signature before touching the runtime.
fn check_signature(ty: &FuncType, arity: usize) -> Result<(), InvocationError> {
  if ty.params().len() != arity {
    return Err(InvocationError::SignatureMismatch {
      expected: ty.params().len(),
      actual: arity,
    });
  }
  if !ty.params().all(|p| matches!(p, ValType::I32)) {
    return Err(InvocationError::UnsupportedType {
      message: "function declares a non-i32 parameter".to_string(),
    });
  }
  if !ty.results().all(|r| matches!(r, ValType::I32)) {
    return Err(InvocationError::UnsupportedType {
      message: "function declares a non-i32 result".to_string(),
    });
  }
  Ok(())
}
