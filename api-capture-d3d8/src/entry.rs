//! Exported entry surface of the substituted `d3d8.dll`.
//!
//! The dynamic loader finds this library instead of the genuine one; the
//! single exported symbol below loads the real implementation on first use,
//! opens the trace, and hands the application a recording wrapper that is
//! indistinguishable from the object it fronts.
//!
//! Init order: load the real library, open the trace document, wrap the
//! first object. Teardown on process detach closes the document; the real
//! library stays mapped until the process ends.

use std::ffi::c_void;
use std::ptr;
use std::sync::{Arc, OnceLock};

use api_capture_core::trace::FileSink;
use api_capture_core::{CaptureContext, CaptureError, TraceDirect3D8, Value};

use crate::com::export::{export, ExportTable};
use crate::com::raw::RawDirect3D8;
use crate::config::{CaptureConfig, FailurePolicy};
use crate::proxy::{load_once, RealModule};

struct ProcessState {
    config: CaptureConfig,
    ctx: Arc<CaptureContext>,
    module: RealModule,
    exports: Arc<ExportTable>,
}

static PROCESS: OnceLock<Result<ProcessState, CaptureError>> = OnceLock::new();

fn process_state() -> Result<&'static ProcessState, CaptureError> {
    load_once(&PROCESS, init_process)
}

fn init_process() -> Result<ProcessState, CaptureError> {
    // The host application owns no logger; give diagnostics a default one.
    let _ = env_logger::try_init();

    let config = CaptureConfig::from_env();
    let module = RealModule::load(&config)?;

    let trace_path = config.resolve_trace_path();
    let sink = FileSink::create(&trace_path)?;
    let ctx = CaptureContext::new(Box::new(sink));
    ctx.open()?;
    log::info!("capturing to {}", trace_path.display());

    Ok(ProcessState {
        config,
        ctx,
        module,
        exports: ExportTable::new(),
    })
}

fn failure_policy() -> FailurePolicy {
    match PROCESS.get() {
        Some(Ok(state)) => state.config.failure_policy,
        // Initialization never produced a config; read the policy directly.
        _ => CaptureConfig::from_env().failure_policy,
    }
}

unsafe fn create_direct3d8(sdk_version: u32) -> Result<*mut c_void, CaptureError> {
    let state = process_state()?;

    let mut call = state.ctx.recorder().begin_call("Direct3DCreate8");
    call.arg("SDKVersion", Value::UInt(sdk_version.into()));

    let raw = state.module.direct3d_create8(sdk_version);
    if raw.is_null() {
        // The real entry point failed; the application observes exactly
        // that.
        call.ret(Value::Null);
        return Ok(ptr::null_mut());
    }

    let adapter = Arc::new(RawDirect3D8::from_ptr(raw));
    let wrapper = TraceDirect3D8::wrap_reuse(&state.ctx, adapter);
    call.ret(Value::Handle(wrapper.object_id()));
    Ok(export(&state.exports, wrapper))
}

/// The substituted `Direct3DCreate8`.
///
/// Signature and calling convention match the genuine export, so existing
/// applications load this library unmodified.
///
/// # Safety
/// Called by the application exactly like the real entry point.
#[no_mangle]
pub unsafe extern "system" fn Direct3DCreate8(sdk_version: u32) -> *mut c_void {
    match create_direct3d8(sdk_version) {
        Ok(object) => object,
        Err(e) => {
            log::error!("Direct3DCreate8: {e}");
            match failure_policy() {
                FailurePolicy::Abort => std::process::abort(),
                FailurePolicy::Error => ptr::null_mut(),
            }
        }
    }
}

#[cfg(target_os = "windows")]
#[no_mangle]
extern "system" fn DllMain(_instance: *mut c_void, reason: u32, _reserved: *mut c_void) -> i32 {
    const DLL_PROCESS_DETACH: u32 = 0;
    if reason == DLL_PROCESS_DETACH {
        if let Some(Ok(state)) = PROCESS.get() {
            if let Err(e) = state.ctx.close() {
                log::error!("failed to finalize trace: {e}");
            }
        }
    }
    1
}
