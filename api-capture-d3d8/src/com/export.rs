//! Outbound projection: recording wrappers exposed back to the application
//! as genuine COM objects.
//!
//! Each live wrapper gets exactly one export object, so the pointer the
//! application compares is as stable as the wrapper identity underneath —
//! re-querying an interface yields the same address. The export object is
//! a `repr(C)` box whose first field is the vtable pointer; the remaining
//! fields are invisible to the application.
//!
//! Vtable slots for methods the capture layer does not model are filled
//! with stubs that log and abort: a corrupted trace is worse than a loud
//! crash.

use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

use parking_lot::Mutex;

use api_capture_core::models::d3d8::{
    BackBufferType, BehaviorFlags, ClearFlags, D3dRect, DevType, Format, HResult, LockFlags,
    Matrix, Point, Rect, RenderState, TransformState,
};
use api_capture_core::{
    AnyInterface, Direct3D8, Direct3DDevice8, Direct3DSurface8, Direct3DSwapChain8, Guid,
    TraceDevice8, TraceDirect3D8, TraceSurface8, TraceSwapChain8, Unknown,
};

use super::raw::RawSurface8;
use super::types::{
    D3DADAPTER_IDENTIFIER8, D3DDISPLAYMODE, D3DLOCKED_RECT, D3DPRESENT_PARAMETERS, D3DRECT,
    D3DSURFACE_DESC, D3DVIEWPORT8, POINT, RECT,
};
use super::vtbl::{
    IDirect3D8Vtbl, IDirect3DDevice8Vtbl, IDirect3DSurface8Vtbl, IDirect3DSwapChain8Vtbl,
    D3DMATRIX,
};

/// Distinguishes our export objects from foreign interface pointers the
/// application may hand back in.
const EXPORT_MAGIC: u32 = 0xD8CA_97F3;

/// One export object per live wrapper, keyed by the wrapper's stable trace
/// id. Entries leave the table when the wrapper dies.
#[derive(Default)]
pub struct ExportTable {
    entries: Mutex<HashMap<u64, usize>>,
}

impl ExportTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn get_or_insert_with(&self, object_id: u64, create: impl FnOnce() -> *mut c_void) -> *mut c_void {
        let mut entries = self.entries.lock();
        if let Some(&existing) = entries.get(&object_id) {
            return existing as *mut c_void;
        }
        let created = create();
        entries.insert(object_id, created as usize);
        created
    }

    fn remove(&self, object_id: u64) {
        self.entries.lock().remove(&object_id);
    }

    /// Number of live export objects.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The `repr(C)` box standing behind every exported interface pointer. The
/// application only ever sees the vtable pointer in front.
#[repr(C)]
pub struct ExportObject<W: 'static, V: 'static> {
    vtbl: &'static V,
    magic: u32,
    wrapper: Arc<W>,
    exports: Arc<ExportTable>,
}

/// Ties a wrapper type to its vtable so the export machinery can be written
/// once.
pub trait Exportable: Unknown + Sized + 'static {
    type Vtbl: 'static;

    /// The one static vtable every export object of this type points at.
    /// A stable address: the import path compares against it.
    fn vtbl() -> &'static Self::Vtbl;

    fn export_object_id(&self) -> u64;
    fn export_ref_count(&self) -> u32;
}

impl Exportable for TraceDirect3D8 {
    type Vtbl = IDirect3D8Vtbl;

    fn vtbl() -> &'static IDirect3D8Vtbl {
        &DIRECT3D8_VTBL
    }

    fn export_object_id(&self) -> u64 {
        self.object_id()
    }

    fn export_ref_count(&self) -> u32 {
        self.ref_count()
    }
}

impl Exportable for TraceDevice8 {
    type Vtbl = IDirect3DDevice8Vtbl;

    fn vtbl() -> &'static IDirect3DDevice8Vtbl {
        &DEVICE8_VTBL
    }

    fn export_object_id(&self) -> u64 {
        self.object_id()
    }

    fn export_ref_count(&self) -> u32 {
        self.ref_count()
    }
}

impl Exportable for TraceSwapChain8 {
    type Vtbl = IDirect3DSwapChain8Vtbl;

    fn vtbl() -> &'static IDirect3DSwapChain8Vtbl {
        &SWAP_CHAIN8_VTBL
    }

    fn export_object_id(&self) -> u64 {
        self.object_id()
    }

    fn export_ref_count(&self) -> u32 {
        self.ref_count()
    }
}

impl Exportable for TraceSurface8 {
    type Vtbl = IDirect3DSurface8Vtbl;

    fn vtbl() -> &'static IDirect3DSurface8Vtbl {
        &SURFACE8_VTBL
    }

    fn export_object_id(&self) -> u64 {
        self.object_id()
    }

    fn export_ref_count(&self) -> u32 {
        self.ref_count()
    }
}

/// The stable COM pointer for `wrapper`, creating the export object on
/// first use.
pub fn export<W: Exportable>(exports: &Arc<ExportTable>, wrapper: Arc<W>) -> *mut c_void {
    exports.get_or_insert_with(wrapper.export_object_id(), || {
        Box::into_raw(Box::new(ExportObject {
            vtbl: W::vtbl(),
            magic: EXPORT_MAGIC,
            wrapper,
            exports: Arc::clone(exports),
        })) as *mut c_void
    })
}

unsafe fn export_ref<'a, W: Exportable>(this: *mut c_void) -> &'a ExportObject<W, W::Vtbl> {
    &*(this as *const ExportObject<W, W::Vtbl>)
}

/// Project a wrapper-space interface out to a COM pointer. Opaque handles
/// pass through as the raw pointer they always were.
fn export_any(exports: &Arc<ExportTable>, obj: AnyInterface) -> *mut c_void {
    match obj {
        AnyInterface::Direct3D8(o) => export_dyn::<TraceDirect3D8>(exports, o.as_any()),
        AnyInterface::Device8(o) => export_dyn::<TraceDevice8>(exports, o.as_any()),
        AnyInterface::SwapChain8(o) => export_dyn::<TraceSwapChain8>(exports, o.as_any()),
        AnyInterface::Surface8(o) => export_dyn::<TraceSurface8>(exports, o.as_any()),
        AnyInterface::Opaque(handle) => handle as *mut c_void,
    }
}

fn export_dyn<W: Exportable + Send + Sync>(
    exports: &Arc<ExportTable>,
    any: Arc<dyn std::any::Any + Send + Sync>,
) -> *mut c_void {
    match any.downcast::<W>() {
        Ok(wrapper) => export(exports, wrapper),
        Err(_) => {
            // Not one of ours; nothing sensible to project.
            log::error!("interface object is not a capture wrapper");
            ptr::null_mut()
        }
    }
}

/// Translate an application-supplied surface pointer back into the trait
/// world: our own export objects become their wrappers, anything else is
/// treated as a raw real surface and adapted directly.
unsafe fn import_surface(ptr_in: *mut c_void) -> Option<Arc<dyn Direct3DSurface8>> {
    if ptr_in.is_null() {
        return None;
    }
    let candidate = export_ref::<TraceSurface8>(ptr_in);
    if candidate.magic == EXPORT_MAGIC && ptr::eq(candidate.vtbl, &SURFACE8_VTBL) {
        Some(Arc::clone(&candidate.wrapper) as Arc<dyn Direct3DSurface8>)
    } else {
        Some(Arc::new(RawSurface8::from_ptr(ptr_in)) as Arc<dyn Direct3DSurface8>)
    }
}

unsafe fn opt_rect(ptr_in: *const RECT) -> Option<Rect> {
    if ptr_in.is_null() {
        None
    } else {
        Some((*ptr_in).to_model())
    }
}

fn abort_unmodeled(interface: &str) -> ! {
    log::error!("{interface}: call into an unmodeled vtable slot");
    std::process::abort();
}

// --- Shared IUnknown shims ---

unsafe extern "system" fn qi_shim<W: Exportable>(
    this: *mut c_void,
    riid: *const Guid,
    out: *mut *mut c_void,
) -> i32 {
    if riid.is_null() || out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<W>(this);
    match export_obj.wrapper.query_interface(&*riid) {
        Ok(obj) => {
            *out = export_any(&export_obj.exports, obj);
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn add_ref_shim<W: Exportable>(this: *mut c_void) -> u32 {
    export_ref::<W>(this).wrapper.add_ref()
}

unsafe extern "system" fn release_shim<W: Exportable>(this: *mut c_void) -> u32 {
    let (count, dead) = {
        let export_obj = export_ref::<W>(this);
        let count = export_obj.wrapper.release();
        let dead = export_obj.wrapper.export_ref_count() == 0;
        if dead {
            export_obj
                .exports
                .remove(export_obj.wrapper.export_object_id());
        }
        (count, dead)
    };
    if dead {
        drop(Box::from_raw(this as *mut ExportObject<W, W::Vtbl>));
    }
    count
}

// --- IDirect3D8 shims ---

unsafe extern "system" fn d3d_unmodeled(_this: *mut c_void) -> i32 {
    abort_unmodeled("IDirect3D8")
}

unsafe extern "system" fn d3d_get_adapter_count(this: *mut c_void) -> u32 {
    export_ref::<TraceDirect3D8>(this).wrapper.get_adapter_count()
}

unsafe extern "system" fn d3d_get_adapter_identifier(
    this: *mut c_void,
    adapter: u32,
    flags: u32,
    out: *mut D3DADAPTER_IDENTIFIER8,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    let export_obj = export_ref::<TraceDirect3D8>(this);
    match export_obj.wrapper.get_adapter_identifier(adapter, flags) {
        Ok(identifier) => {
            let mut ffi = D3DADAPTER_IDENTIFIER8::default();
            copy_c_string(&mut ffi.driver, &identifier.driver);
            copy_c_string(&mut ffi.description, &identifier.description);
            ffi.vendor_id = identifier.vendor_id;
            ffi.device_id = identifier.device_id;
            ffi.sub_sys_id = identifier.sub_sys_id;
            ffi.revision = identifier.revision;
            *out = ffi;
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn d3d_get_adapter_mode_count(this: *mut c_void, adapter: u32) -> u32 {
    export_ref::<TraceDirect3D8>(this)
        .wrapper
        .get_adapter_mode_count(adapter)
}

unsafe extern "system" fn d3d_enum_adapter_modes(
    this: *mut c_void,
    adapter: u32,
    mode: u32,
    out: *mut D3DDISPLAYMODE,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    match export_ref::<TraceDirect3D8>(this)
        .wrapper
        .enum_adapter_modes(adapter, mode)
    {
        Ok(display_mode) => {
            *out = D3DDISPLAYMODE {
                width: display_mode.width,
                height: display_mode.height,
                refresh_rate: display_mode.refresh_rate,
                format: display_mode.format.0,
            };
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn d3d_get_adapter_display_mode(
    this: *mut c_void,
    adapter: u32,
    out: *mut D3DDISPLAYMODE,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    match export_ref::<TraceDirect3D8>(this)
        .wrapper
        .get_adapter_display_mode(adapter)
    {
        Ok(display_mode) => {
            *out = D3DDISPLAYMODE {
                width: display_mode.width,
                height: display_mode.height,
                refresh_rate: display_mode.refresh_rate,
                format: display_mode.format.0,
            };
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn d3d_check_device_type(
    this: *mut c_void,
    adapter: u32,
    check_type: u32,
    display_format: u32,
    back_buffer_format: u32,
    windowed: i32,
) -> i32 {
    export_ref::<TraceDirect3D8>(this)
        .wrapper
        .check_device_type(
            adapter,
            DevType(check_type),
            Format(display_format),
            Format(back_buffer_format),
            windowed != 0,
        )
        .0
}

unsafe extern "system" fn d3d_check_device_format(
    this: *mut c_void,
    adapter: u32,
    device_type: u32,
    adapter_format: u32,
    usage: u32,
    resource_type: u32,
    check_format: u32,
) -> i32 {
    export_ref::<TraceDirect3D8>(this)
        .wrapper
        .check_device_format(
            adapter,
            DevType(device_type),
            Format(adapter_format),
            usage,
            api_capture_core::models::d3d8::ResourceType(resource_type),
            Format(check_format),
        )
        .0
}

unsafe extern "system" fn d3d_create_device(
    this: *mut c_void,
    adapter: u32,
    device_type: u32,
    focus_window: *mut c_void,
    behavior_flags: u32,
    params: *mut D3DPRESENT_PARAMETERS,
    out: *mut *mut c_void,
) -> i32 {
    if params.is_null() || out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<TraceDirect3D8>(this);
    let mut model = (*params).to_model();
    match export_obj.wrapper.create_device(
        adapter,
        DevType(device_type),
        focus_window as u64,
        BehaviorFlags::from_bits_retain(behavior_flags),
        &mut model,
    ) {
        Ok(device) => {
            *params = D3DPRESENT_PARAMETERS::from_model(&model);
            *out = export_dyn::<TraceDevice8>(&export_obj.exports, device.as_any());
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

static DIRECT3D8_VTBL: IDirect3D8Vtbl = IDirect3D8Vtbl {
    query_interface: qi_shim::<TraceDirect3D8>,
    add_ref: add_ref_shim::<TraceDirect3D8>,
    release: release_shim::<TraceDirect3D8>,
    _register_software_device: d3d_unmodeled,
    get_adapter_count: d3d_get_adapter_count,
    get_adapter_identifier: d3d_get_adapter_identifier,
    get_adapter_mode_count: d3d_get_adapter_mode_count,
    enum_adapter_modes: d3d_enum_adapter_modes,
    get_adapter_display_mode: d3d_get_adapter_display_mode,
    check_device_type: d3d_check_device_type,
    check_device_format: d3d_check_device_format,
    _check_multi_sample_to_monitor: [d3d_unmodeled; 4],
    create_device: d3d_create_device,
};

// --- IDirect3DDevice8 shims ---

unsafe extern "system" fn device_unmodeled(_this: *mut c_void) -> i32 {
    abort_unmodeled("IDirect3DDevice8")
}

unsafe extern "system" fn device_test_cooperative_level(this: *mut c_void) -> i32 {
    export_ref::<TraceDevice8>(this)
        .wrapper
        .test_cooperative_level()
        .0
}

unsafe extern "system" fn device_get_available_texture_mem(this: *mut c_void) -> u32 {
    export_ref::<TraceDevice8>(this)
        .wrapper
        .get_available_texture_mem()
}

unsafe extern "system" fn device_get_direct3d(this: *mut c_void, out: *mut *mut c_void) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<TraceDevice8>(this);
    match export_obj.wrapper.get_direct3d() {
        Ok(d3d) => {
            *out = export_dyn::<TraceDirect3D8>(&export_obj.exports, d3d.as_any());
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_get_display_mode(
    this: *mut c_void,
    out: *mut D3DDISPLAYMODE,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    match export_ref::<TraceDevice8>(this).wrapper.get_display_mode() {
        Ok(mode) => {
            *out = D3DDISPLAYMODE {
                width: mode.width,
                height: mode.height,
                refresh_rate: mode.refresh_rate,
                format: mode.format.0,
            };
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_create_additional_swap_chain(
    this: *mut c_void,
    params: *mut D3DPRESENT_PARAMETERS,
    out: *mut *mut c_void,
) -> i32 {
    if params.is_null() || out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<TraceDevice8>(this);
    let mut model = (*params).to_model();
    match export_obj.wrapper.create_additional_swap_chain(&mut model) {
        Ok(chain) => {
            *params = D3DPRESENT_PARAMETERS::from_model(&model);
            *out = export_dyn::<TraceSwapChain8>(&export_obj.exports, chain.as_any());
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_reset(
    this: *mut c_void,
    params: *mut D3DPRESENT_PARAMETERS,
) -> i32 {
    if params.is_null() {
        return HResult::INVALID_CALL.0;
    }
    let mut model = (*params).to_model();
    let result = export_ref::<TraceDevice8>(this).wrapper.reset(&mut model);
    *params = D3DPRESENT_PARAMETERS::from_model(&model);
    result.0
}

unsafe extern "system" fn device_present(
    this: *mut c_void,
    source: *const RECT,
    dest: *const RECT,
    window_override: *mut c_void,
    _dirty_region: *const c_void,
) -> i32 {
    export_ref::<TraceDevice8>(this)
        .wrapper
        .present(opt_rect(source), opt_rect(dest), window_override as u64)
        .0
}

unsafe extern "system" fn device_get_back_buffer(
    this: *mut c_void,
    back_buffer: u32,
    kind: u32,
    out: *mut *mut c_void,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<TraceDevice8>(this);
    match export_obj
        .wrapper
        .get_back_buffer(back_buffer, BackBufferType(kind))
    {
        Ok(surface) => {
            *out = export_dyn::<TraceSurface8>(&export_obj.exports, surface.as_any());
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_create_render_target(
    this: *mut c_void,
    width: u32,
    height: u32,
    format: u32,
    multi_sample: u32,
    lockable: i32,
    out: *mut *mut c_void,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<TraceDevice8>(this);
    match export_obj.wrapper.create_render_target(
        width,
        height,
        Format(format),
        multi_sample,
        lockable != 0,
    ) {
        Ok(surface) => {
            *out = export_dyn::<TraceSurface8>(&export_obj.exports, surface.as_any());
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_create_image_surface(
    this: *mut c_void,
    width: u32,
    height: u32,
    format: u32,
    out: *mut *mut c_void,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<TraceDevice8>(this);
    match export_obj
        .wrapper
        .create_image_surface(width, height, Format(format))
    {
        Ok(surface) => {
            *out = export_dyn::<TraceSurface8>(&export_obj.exports, surface.as_any());
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_copy_rects(
    this: *mut c_void,
    source: *mut c_void,
    source_rects: *const RECT,
    rect_count: u32,
    dest: *mut c_void,
    dest_points: *const POINT,
) -> i32 {
    let (Some(source), Some(dest)) = (import_surface(source), import_surface(dest)) else {
        return HResult::INVALID_CALL.0;
    };
    let rects: Vec<Rect> = slice_of(source_rects, rect_count)
        .iter()
        .map(|r| r.to_model())
        .collect();
    let points: Vec<Point> = slice_of(dest_points, rect_count)
        .iter()
        .map(|p| Point { x: p.x, y: p.y })
        .collect();
    export_ref::<TraceDevice8>(this)
        .wrapper
        .copy_rects(&source, &rects, &dest, &points)
        .0
}

unsafe extern "system" fn device_get_front_buffer(this: *mut c_void, dest: *mut c_void) -> i32 {
    let Some(dest) = import_surface(dest) else {
        return HResult::INVALID_CALL.0;
    };
    export_ref::<TraceDevice8>(this)
        .wrapper
        .get_front_buffer(&dest)
        .0
}

unsafe extern "system" fn device_set_render_target(
    this: *mut c_void,
    render_target: *mut c_void,
    new_z_stencil: *mut c_void,
) -> i32 {
    export_ref::<TraceDevice8>(this)
        .wrapper
        .set_render_target(import_surface(render_target), import_surface(new_z_stencil))
        .0
}

unsafe extern "system" fn device_get_render_target(
    this: *mut c_void,
    out: *mut *mut c_void,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<TraceDevice8>(this);
    match export_obj.wrapper.get_render_target() {
        Ok(surface) => {
            *out = export_dyn::<TraceSurface8>(&export_obj.exports, surface.as_any());
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_begin_scene(this: *mut c_void) -> i32 {
    export_ref::<TraceDevice8>(this).wrapper.begin_scene().0
}

unsafe extern "system" fn device_end_scene(this: *mut c_void) -> i32 {
    export_ref::<TraceDevice8>(this).wrapper.end_scene().0
}

unsafe extern "system" fn device_clear(
    this: *mut c_void,
    count: u32,
    rects: *const D3DRECT,
    flags: u32,
    color: u32,
    z: f32,
    stencil: u32,
) -> i32 {
    let rects: Vec<D3dRect> = slice_of(rects, count)
        .iter()
        .map(|r| D3dRect {
            x1: r.x1,
            y1: r.y1,
            x2: r.x2,
            y2: r.y2,
        })
        .collect();
    export_ref::<TraceDevice8>(this)
        .wrapper
        .clear(&rects, ClearFlags::from_bits_retain(flags), color, z, stencil)
        .0
}

unsafe extern "system" fn device_set_transform(
    this: *mut c_void,
    state: u32,
    matrix: *const D3DMATRIX,
) -> i32 {
    if matrix.is_null() {
        return HResult::INVALID_CALL.0;
    }
    export_ref::<TraceDevice8>(this)
        .wrapper
        .set_transform(TransformState(state), &Matrix(*matrix))
        .0
}

unsafe extern "system" fn device_get_transform(
    this: *mut c_void,
    state: u32,
    out: *mut D3DMATRIX,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    match export_ref::<TraceDevice8>(this)
        .wrapper
        .get_transform(TransformState(state))
    {
        Ok(matrix) => {
            *out = matrix.0;
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_set_viewport(
    this: *mut c_void,
    viewport: *const D3DVIEWPORT8,
) -> i32 {
    if viewport.is_null() {
        return HResult::INVALID_CALL.0;
    }
    export_ref::<TraceDevice8>(this)
        .wrapper
        .set_viewport(&(*viewport).to_model())
        .0
}

unsafe extern "system" fn device_get_viewport(
    this: *mut c_void,
    out: *mut D3DVIEWPORT8,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    match export_ref::<TraceDevice8>(this).wrapper.get_viewport() {
        Ok(viewport) => {
            *out = D3DVIEWPORT8::from_model(&viewport);
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn device_set_render_state(
    this: *mut c_void,
    state: u32,
    value: u32,
) -> i32 {
    export_ref::<TraceDevice8>(this)
        .wrapper
        .set_render_state(RenderState(state), value)
        .0
}

unsafe extern "system" fn device_get_render_state(
    this: *mut c_void,
    state: u32,
    out: *mut u32,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    match export_ref::<TraceDevice8>(this)
        .wrapper
        .get_render_state(RenderState(state))
    {
        Ok(value) => {
            *out = value;
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

static DEVICE8_VTBL: IDirect3DDevice8Vtbl = IDirect3DDevice8Vtbl {
    query_interface: qi_shim::<TraceDevice8>,
    add_ref: add_ref_shim::<TraceDevice8>,
    release: release_shim::<TraceDevice8>,
    test_cooperative_level: device_test_cooperative_level,
    get_available_texture_mem: device_get_available_texture_mem,
    _resource_manager_discard_bytes: device_unmodeled,
    get_direct3d: device_get_direct3d,
    _get_device_caps: device_unmodeled,
    get_display_mode: device_get_display_mode,
    _creation_parameters_to_show_cursor: [device_unmodeled; 4],
    create_additional_swap_chain: device_create_additional_swap_chain,
    reset: device_reset,
    present: device_present,
    get_back_buffer: device_get_back_buffer,
    _raster_status_to_gamma_ramp: [device_unmodeled; 3],
    _create_texture_to_index_buffer: [device_unmodeled; 5],
    create_render_target: device_create_render_target,
    _create_depth_stencil_surface: device_unmodeled,
    create_image_surface: device_create_image_surface,
    copy_rects: device_copy_rects,
    _update_texture: device_unmodeled,
    get_front_buffer: device_get_front_buffer,
    set_render_target: device_set_render_target,
    get_render_target: device_get_render_target,
    _get_depth_stencil_surface: device_unmodeled,
    begin_scene: device_begin_scene,
    end_scene: device_end_scene,
    clear: device_clear,
    set_transform: device_set_transform,
    get_transform: device_get_transform,
    _multiply_transform: device_unmodeled,
    set_viewport: device_set_viewport,
    get_viewport: device_get_viewport,
    _material_to_clip_plane: [device_unmodeled; 8],
    set_render_state: device_set_render_state,
    get_render_state: device_get_render_state,
    _state_block_to_delete_patch: [device_unmodeled; 45],
};

// --- IDirect3DSwapChain8 shims ---

unsafe extern "system" fn swap_chain_present(
    this: *mut c_void,
    source: *const RECT,
    dest: *const RECT,
    window_override: *mut c_void,
    _dirty_region: *const c_void,
) -> i32 {
    export_ref::<TraceSwapChain8>(this)
        .wrapper
        .present(opt_rect(source), opt_rect(dest), window_override as u64)
        .0
}

unsafe extern "system" fn swap_chain_get_back_buffer(
    this: *mut c_void,
    back_buffer: u32,
    kind: u32,
    out: *mut *mut c_void,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    *out = ptr::null_mut();
    let export_obj = export_ref::<TraceSwapChain8>(this);
    match export_obj
        .wrapper
        .get_back_buffer(back_buffer, BackBufferType(kind))
    {
        Ok(surface) => {
            *out = export_dyn::<TraceSurface8>(&export_obj.exports, surface.as_any());
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

static SWAP_CHAIN8_VTBL: IDirect3DSwapChain8Vtbl = IDirect3DSwapChain8Vtbl {
    query_interface: qi_shim::<TraceSwapChain8>,
    add_ref: add_ref_shim::<TraceSwapChain8>,
    release: release_shim::<TraceSwapChain8>,
    present: swap_chain_present,
    get_back_buffer: swap_chain_get_back_buffer,
};

// --- IDirect3DSurface8 shims ---

unsafe extern "system" fn surface_unmodeled(_this: *mut c_void) -> i32 {
    abort_unmodeled("IDirect3DSurface8")
}

unsafe extern "system" fn surface_get_desc(this: *mut c_void, out: *mut D3DSURFACE_DESC) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    match export_ref::<TraceSurface8>(this).wrapper.get_desc() {
        Ok(desc) => {
            *out = D3DSURFACE_DESC {
                format: desc.format.0,
                resource_type: desc.resource_type.0,
                usage: desc.usage,
                pool: desc.pool.0,
                size: desc.size,
                multi_sample_type: desc.multi_sample_type,
                width: desc.width,
                height: desc.height,
            };
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn surface_lock_rect(
    this: *mut c_void,
    out: *mut D3DLOCKED_RECT,
    rect: *const RECT,
    flags: u32,
) -> i32 {
    if out.is_null() {
        return HResult::INVALID_CALL.0;
    }
    match export_ref::<TraceSurface8>(this)
        .wrapper
        .lock_rect(opt_rect(rect), LockFlags::from_bits_retain(flags))
    {
        Ok(locked) => {
            *out = D3DLOCKED_RECT {
                pitch: locked.pitch,
                p_bits: locked.bits as *mut c_void,
            };
            HResult::OK.0
        }
        Err(hr) => hr.0,
    }
}

unsafe extern "system" fn surface_unlock_rect(this: *mut c_void) -> i32 {
    export_ref::<TraceSurface8>(this).wrapper.unlock_rect().0
}

static SURFACE8_VTBL: IDirect3DSurface8Vtbl = IDirect3DSurface8Vtbl {
    query_interface: qi_shim::<TraceSurface8>,
    add_ref: add_ref_shim::<TraceSurface8>,
    release: release_shim::<TraceSurface8>,
    _get_device_to_get_container: [surface_unmodeled; 5],
    get_desc: surface_get_desc,
    lock_rect: surface_lock_rect,
    unlock_rect: surface_unlock_rect,
};

unsafe fn slice_of<'a, T>(ptr_in: *const T, count: u32) -> &'a [T] {
    if ptr_in.is_null() || count == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(ptr_in, count as usize)
    }
}

fn copy_c_string(dest: &mut [u8], src: &str) {
    let bytes = src.as_bytes();
    let len = bytes.len().min(dest.len().saturating_sub(1));
    dest[..len].copy_from_slice(&bytes[..len]);
    dest[len] = 0;
}
