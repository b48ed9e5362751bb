//! Engine implementation on the wasmi interpreter.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use lupine_engine::{
  CapabilityBridge, InstantiationError, InvocationError, LoadError, WasmEngine, WasmFunction,
};
use tracing::{debug, info};
use wasmi::core::ValType;
use wasmi::{Engine, Func, FuncType, Instance, Linker, Module, Store, Val};

/// A plugin engine backed by the wasmi interpreter.
///
/// Same contract as the wasmtime backend: one module, one instance, one
/// store, calls serialized by a mutex shared with every handle.
pub struct WasmiEngine {
  store: Arc<Mutex<Store<()>>>,
  instance: Instance,
}

/// A callable handle to one exported function of a [`WasmiEngine`].
pub struct WasmiFunction {
  store: Arc<Mutex<Store<()>>>,
  func: Func,
}

impl std::fmt::Debug for WasmiEngine {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WasmiEngine").finish_non_exhaustive()
  }
}

impl WasmEngine for WasmiEngine {
  type Function = WasmiFunction;

  fn new(path: &Path, bridge: CapabilityBridge) -> Result<Self, InstantiationError> {
    let engine = Engine::default();
    let module = load_module(&engine, path)?;
    let mut store = Store::new(&engine, ());

    let mut linker = Linker::new(&engine);
    register_bridge(&mut linker, &bridge)?;

    // wasmi splits instantiation from running the start function, which
    // maps directly onto the Link/Start failure distinction.
    let pre = linker
      .instantiate(&mut store, &module)
      .map_err(|e| InstantiationError::Link {
        message: e.to_string(),
      })?;
    let instance = pre
      .start(&mut store)
      .map_err(|e| InstantiationError::Start {
        message: e.to_string(),
      })?;

    info!(path = %path.display(), "plugin instantiated");

    Ok(Self {
      store: Arc::new(Mutex::new(store)),
      instance,
    })
  }

  fn function(&self, name: &str) -> Option<WasmiFunction> {
    // `None` strictly means absence; lookup does not mutate, so recover
    // the guard even after a poisoning panic and let invoke report it
    let store = self.store.lock().unwrap_or_else(|p| p.into_inner());
    let func = self.instance.get_export(&*store, name)?.into_func()?;
    debug!(name, "export resolved");
    Some(WasmiFunction {
      store: self.store.clone(),
      func,
    })
  }
}

impl WasmFunction for WasmiFunction {
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
        message: e.to_string(),
      })?;

    // check_signature guarantees every declared result is i32
    Ok(results.iter().filter_map(|v| v.i32()).collect())
  }
}

/// Read and parse the module at `path`.
fn load_module(engine: &Engine, path: &Path) -> Result<Module, LoadError> {
  let bytes = fs::read(path).map_err(|source| LoadError::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let module = Module::new(engine, &bytes[..]).map_err(|e| LoadError::Parse {
    message: e.to_string(),
  })?;
  debug!(path = %path.display(), size = bytes.len(), "module parsed");
  Ok(module)
}

/// Register every bridge host function into the linker with an i32-only
/// signature. Host errors trap the calling module.
fn register_bridge(
  linker: &mut Linker<()>,
  bridge: &CapabilityBridge,
) -> Result<(), InstantiationError> {
  for host_module in bridge.modules() {
    for host_fn in host_module.functions() {
      let ty = FuncType::new(
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
            // params are declared i32 at registration
            let args: Vec<i32> = params.iter().filter_map(|v| v.i32()).collect();
            let returned = callback(&args).map_err(|e| wasmi::Error::new(e.to_string()))?;
            if returned.len() != results.len() {
              return Err(wasmi::Error::new(format!(
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
/// signature before entering the interpreter.
fn check_signature(ty: &FuncType, arity: usize) -> Result<(), InvocationError> {
  if ty.params().len() != arity {
    return Err(InvocationError::SignatureMismatch {
      expected: ty.params().len(),
      actual: arity,
    });
  }
  if !ty.params().iter().all(|p| matches!(p, ValType::I32)) {
    return Err(InvocationError::UnsupportedType {
      message: "function declares a non-i32 parameter".to_string(),
    });
  }
  if !ty.results().iter().all(|r| matches!(r, ValType::I32)) {
    return Err(InvocationError::UnsupportedType {
      message: "function declares a non-i32 result".to_string(),
    });
  }
  Ok(())
}
