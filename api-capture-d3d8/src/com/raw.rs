//! Inbound adapters: raw COM interface pointers presented as the core
//! trait contracts.
//!
//! An adapter is a non-owning alias of the real object — reference counts
//! move only through the forwarded `add_ref`/`release` calls, never through
//! `Arc` clones or drops, so counts observed by the application stay
//! exactly what the real library produced.

use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

use api_capture_core::models::d3d8::{
    AdapterIdentifier, BackBufferType, BehaviorFlags, ClearFlags, D3dRect, DevType, DisplayMode,
    Format, HResult, LockFlags, LockedRect, Matrix, Point, PresentParameters, Rect, RenderState,
    ResourceType, SurfaceDesc, TransformState, Viewport, WindowHandle,
};
use api_capture_core::{
    AnyInterface, Direct3D8, Direct3DDevice8, Direct3DSurface8, Direct3DSwapChain8, Guid,
    InterfaceTag, Unknown,
};

use super::types::{
    opt_rect_ptr, D3DADAPTER_IDENTIFIER8, D3DDISPLAYMODE, D3DLOCKED_RECT, D3DPRESENT_PARAMETERS,
    D3DRECT, D3DSURFACE_DESC, D3DVIEWPORT8, POINT, RECT,
};
use super::vtbl::{
    vtable, IDirect3D8Vtbl, IDirect3DDevice8Vtbl, IDirect3DSurface8Vtbl, IDirect3DSwapChain8Vtbl,
    QueryInterfaceFn,
};

/// Build the adapter for a freshly produced interface pointer, picking the
/// variant by interface id. Interfaces the capture layer does not model
/// stay raw.
///
/// # Safety
/// `ptr` must be a live interface pointer of the type `iid` names (or
/// null).
pub unsafe fn wrap_raw_interface(iid: &Guid, ptr: *mut c_void) -> AnyInterface {
    if ptr.is_null() {
        return AnyInterface::Opaque(0);
    }
    match InterfaceTag::from_iid(iid) {
        Some(InterfaceTag::Direct3D8) => {
            AnyInterface::Direct3D8(Arc::new(RawDirect3D8::from_ptr(ptr)))
        }
        Some(InterfaceTag::Device8) => AnyInterface::Device8(Arc::new(RawDevice8::from_ptr(ptr))),
        Some(InterfaceTag::SwapChain8) => {
            AnyInterface::SwapChain8(Arc::new(RawSwapChain8::from_ptr(ptr)))
        }
        Some(InterfaceTag::Surface8) => {
            AnyInterface::Surface8(Arc::new(RawSurface8::from_ptr(ptr)))
        }
        None => AnyInterface::Opaque(ptr as u64),
    }
}

unsafe fn forward_query_interface(
    this: *mut c_void,
    qi: QueryInterfaceFn,
    iid: &Guid,
) -> Result<AnyInterface, HResult> {
    let mut out: *mut c_void = ptr::null_mut();
    let hr = qi(this, iid, &mut out);
    if hr < 0 {
        return Err(HResult(hr));
    }
    Ok(wrap_raw_interface(iid, out))
}

fn check(hr: i32) -> Result<(), HResult> {
    if hr >= 0 {
        Ok(())
    } else {
        Err(HResult(hr))
    }
}

/// The raw pointer behind a surface argument that has already been
/// translated to real space.
fn surface_ptr(surface: &Arc<dyn Direct3DSurface8>) -> *mut c_void {
    surface.raw_handle() as *mut c_void
}

macro_rules! raw_adapter {
    ($(#[$attr:meta])* $name:ident, $vtbl:ty) => {
        $(#[$attr])*
        pub struct $name {
            ptr: *mut c_void,
        }

        // SAFETY: the adapter only carries the pointer; the real library's
        // own thread-safety contract is inherited unchanged by the calls
        // made through it.
        unsafe impl Send for $name {}
        unsafe impl Sync for $name {}

        impl $name {
            /// # Safety
            /// `ptr` must be a live interface pointer of the matching type
            /// and stay valid for the adapter's lifetime.
            pub unsafe fn from_ptr(ptr: *mut c_void) -> Self {
                debug_assert!(!ptr.is_null());
                Self { ptr }
            }

            fn vt(&self) -> &$vtbl {
                unsafe { vtable::<$vtbl>(self.ptr) }
            }
        }

        impl Unknown for $name {
            fn raw_handle(&self) -> u64 {
                self.ptr as u64
            }

            fn as_any(self: Arc<Self>) -> Arc<dyn std::any::Any + Send + Sync> {
                self
            }

            fn add_ref(&self) -> u32 {
                unsafe { (self.vt().add_ref)(self.ptr) }
            }

            fn release(&self) -> u32 {
                unsafe { (self.vt().release)(self.ptr) }
            }

            fn query_interface(&self, iid: &Guid) -> Result<AnyInterface, HResult> {
                unsafe { forward_query_interface(self.ptr, self.vt().query_interface, iid) }
            }
        }
    };
}

raw_adapter! {
    /// Adapter over a genuine `IDirect3D8*`.
    RawDirect3D8, IDirect3D8Vtbl
}

raw_adapter! {
    /// Adapter over a genuine `IDirect3DDevice8*`.
    RawDevice8, IDirect3DDevice8Vtbl
}

raw_adapter! {
    /// Adapter over a genuine `IDirect3DSwapChain8*`.
    RawSwapChain8, IDirect3DSwapChain8Vtbl
}

raw_adapter! {
    /// Adapter over a genuine `IDirect3DSurface8*`.
    RawSurface8, IDirect3DSurface8Vtbl
}

impl Direct3D8 for RawDirect3D8 {
    fn get_adapter_count(&self) -> u32 {
        unsafe { (self.vt().get_adapter_count)(self.ptr) }
    }

    fn get_adapter_identifier(
        &self,
        adapter: u32,
        flags: u32,
    ) -> Result<AdapterIdentifier, HResult> {
        let mut identifier = D3DADAPTER_IDENTIFIER8::default();
        check(unsafe {
            (self.vt().get_adapter_identifier)(self.ptr, adapter, flags, &mut identifier)
        })?;
        Ok(identifier.to_model())
    }

    fn get_adapter_mode_count(&self, adapter: u32) -> u32 {
        unsafe { (self.vt().get_adapter_mode_count)(self.ptr, adapter) }
    }

    fn enum_adapter_modes(&self, adapter: u32, mode: u32) -> Result<DisplayMode, HResult> {
        let mut out = D3DDISPLAYMODE::default();
        check(unsafe { (self.vt().enum_adapter_modes)(self.ptr, adapter, mode, &mut out) })?;
        Ok(out.to_model())
    }

    fn get_adapter_display_mode(&self, adapter: u32) -> Result<DisplayMode, HResult> {
        let mut out = D3DDISPLAYMODE::default();
        check(unsafe { (self.vt().get_adapter_display_mode)(self.ptr, adapter, &mut out) })?;
        Ok(out.to_model())
    }

    fn check_device_type(
        &self,
        adapter: u32,
        check_type: DevType,
        display_format: Format,
        back_buffer_format: Format,
        windowed: bool,
    ) -> HResult {
        HResult(unsafe {
            (self.vt().check_device_type)(
                self.ptr,
                adapter,
                check_type.0,
                display_format.0,
                back_buffer_format.0,
                windowed as i32,
            )
        })
    }

    fn check_device_format(
        &self,
        adapter: u32,
        device_type: DevType,
        adapter_format: Format,
        usage: u32,
        resource_type: ResourceType,
        check_format: Format,
    ) -> HResult {
        HResult(unsafe {
            (self.vt().check_device_format)(
                self.ptr,
                adapter,
                device_type.0,
                adapter_format.0,
                usage,
                resource_type.0,
                check_format.0,
            )
        })
    }

    fn create_device(
        &self,
        adapter: u32,
        device_type: DevType,
        focus_window: WindowHandle,
        behavior_flags: BehaviorFlags,
        params: &mut PresentParameters,
    ) -> Result<Arc<dyn Direct3DDevice8>, HResult> {
        let mut ffi_params = D3DPRESENT_PARAMETERS::from_model(params);
        let mut device: *mut c_void = ptr::null_mut();
        let hr = unsafe {
            (self.vt().create_device)(
                self.ptr,
                adapter,
                device_type.0,
                focus_window as *mut c_void,
                behavior_flags.bits(),
                &mut ffi_params,
                &mut device,
            )
        };
        *params = ffi_params.to_model();
        check(hr)?;
        if device.is_null() {
            return Err(HResult::INVALID_CALL);
        }
        Ok(Arc::new(unsafe { RawDevice8::from_ptr(device) }))
    }
}

impl Direct3DDevice8 for RawDevice8 {
    fn test_cooperative_level(&self) -> HResult {
        HResult(unsafe { (self.vt().test_cooperative_level)(self.ptr) })
    }

    fn get_available_texture_mem(&self) -> u32 {
        unsafe { (self.vt().get_available_texture_mem)(self.ptr) }
    }

    fn get_direct3d(&self) -> Result<Arc<dyn Direct3D8>, HResult> {
        let mut out: *mut c_void = ptr::null_mut();
        check(unsafe { (self.vt().get_direct3d)(self.ptr, &mut out) })?;
        if out.is_null() {
            return Err(HResult::INVALID_CALL);
        }
        Ok(Arc::new(unsafe { RawDirect3D8::from_ptr(out) }))
    }

    fn get_display_mode(&self) -> Result<DisplayMode, HResult> {
        let mut out = D3DDISPLAYMODE::default();
        check(unsafe { (self.vt().get_display_mode)(self.ptr, &mut out) })?;
        Ok(out.to_model())
    }

    fn create_additional_swap_chain(
        &self,
        params: &mut PresentParameters,
    ) -> Result<Arc<dyn Direct3DSwapChain8>, HResult> {
        let mut ffi_params = D3DPRESENT_PARAMETERS::from_model(params);
        let mut chain: *mut c_void = ptr::null_mut();
        let hr = unsafe {
            (self.vt().create_additional_swap_chain)(self.ptr, &mut ffi_params, &mut chain)
        };
        *params = ffi_params.to_model();
        check(hr)?;
        if chain.is_null() {
            return Err(HResult::INVALID_CALL);
        }
        Ok(Arc::new(unsafe { RawSwapChain8::from_ptr(chain) }))
    }

    fn reset(&self, params: &mut PresentParameters) -> HResult {
        let mut ffi_params = D3DPRESENT_PARAMETERS::from_model(params);
        let hr = unsafe { (self.vt().reset)(self.ptr, &mut ffi_params) };
        *params = ffi_params.to_model();
        HResult(hr)
    }

    fn present(
        &self,
        source_rect: Option<Rect>,
        dest_rect: Option<Rect>,
        dest_window_override: WindowHandle,
    ) -> HResult {
        let source = source_rect.as_ref().map(RECT::from_model);
        let dest = dest_rect.as_ref().map(RECT::from_model);
        HResult(unsafe {
            (self.vt().present)(
                self.ptr,
                opt_rect_ptr(&source),
                opt_rect_ptr(&dest),
                dest_window_override as *mut c_void,
                ptr::null(),
            )
        })
    }

    fn get_back_buffer(
        &self,
        back_buffer: u32,
        kind: BackBufferType,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut out: *mut c_void = ptr::null_mut();
        check(unsafe { (self.vt().get_back_buffer)(self.ptr, back_buffer, kind.0, &mut out) })?;
        if out.is_null() {
            return Err(HResult::INVALID_CALL);
        }
        Ok(Arc::new(unsafe { RawSurface8::from_ptr(out) }))
    }

    fn create_render_target(
        &self,
        width: u32,
        height: u32,
        format: Format,
        multi_sample: u32,
        lockable: bool,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut out: *mut c_void = ptr::null_mut();
        check(unsafe {
            (self.vt().create_render_target)(
                self.ptr,
                width,
                height,
                format.0,
                multi_sample,
                lockable as i32,
                &mut out,
            )
        })?;
        if out.is_null() {
            return Err(HResult::INVALID_CALL);
        }
        Ok(Arc::new(unsafe { RawSurface8::from_ptr(out) }))
    }

    fn create_image_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut out: *mut c_void = ptr::null_mut();
        check(unsafe {
            (self.vt().create_image_surface)(self.ptr, width, height, format.0, &mut out)
        })?;
        if out.is_null() {
            return Err(HResult::INVALID_CALL);
        }
        Ok(Arc::new(unsafe { RawSurface8::from_ptr(out) }))
    }

    fn copy_rects(
        &self,
        source: &Arc<dyn Direct3DSurface8>,
        source_rects: &[Rect],
        dest: &Arc<dyn Direct3DSurface8>,
        dest_points: &[Point],
    ) -> HResult {
        let rects: Vec<RECT> = source_rects.iter().map(RECT::from_model).collect();
        let points: Vec<POINT> = dest_points.iter().map(POINT::from_model).collect();
        HResult(unsafe {
            (self.vt().copy_rects)(
                self.ptr,
                surface_ptr(source),
                if rects.is_empty() {
                    ptr::null()
                } else {
                    rects.as_ptr()
                },
                rects.len() as u32,
                surface_ptr(dest),
                if points.is_empty() {
                    ptr::null()
                } else {
                    points.as_ptr()
                },
            )
        })
    }

    fn get_front_buffer(&self, dest: &Arc<dyn Direct3DSurface8>) -> HResult {
        HResult(unsafe { (self.vt().get_front_buffer)(self.ptr, surface_ptr(dest)) })
    }

    fn set_render_target(
        &self,
        render_target: Option<Arc<dyn Direct3DSurface8>>,
        new_z_stencil: Option<Arc<dyn Direct3DSurface8>>,
    ) -> HResult {
        let rt = render_target
            .as_ref()
            .map(surface_ptr)
            .unwrap_or(ptr::null_mut());
        let zs = new_z_stencil
            .as_ref()
            .map(surface_ptr)
            .unwrap_or(ptr::null_mut());
        HResult(unsafe { (self.vt().set_render_target)(self.ptr, rt, zs) })
    }

    fn get_render_target(&self) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut out: *mut c_void = ptr::null_mut();
        check(unsafe { (self.vt().get_render_target)(self.ptr, &mut out) })?;
        if out.is_null() {
            return Err(HResult::INVALID_CALL);
        }
        Ok(Arc::new(unsafe { RawSurface8::from_ptr(out) }))
    }

    fn begin_scene(&self) -> HResult {
        HResult(unsafe { (self.vt().begin_scene)(self.ptr) })
    }

    fn end_scene(&self) -> HResult {
        HResult(unsafe { (self.vt().end_scene)(self.ptr) })
    }

    fn clear(
        &self,
        rects: &[D3dRect],
        flags: ClearFlags,
        color: u32,
        z: f32,
        stencil: u32,
    ) -> HResult {
        let ffi_rects: Vec<D3DRECT> = rects
            .iter()
            .map(|r| D3DRECT {
                x1: r.x1,
                y1: r.y1,
                x2: r.x2,
                y2: r.y2,
            })
            .collect();
        HResult(unsafe {
            (self.vt().clear)(
                self.ptr,
                ffi_rects.len() as u32,
                if ffi_rects.is_empty() {
                    ptr::null()
                } else {
                    ffi_rects.as_ptr()
                },
                flags.bits(),
                color,
                z,
                stencil,
            )
        })
    }

    fn set_transform(&self, state: TransformState, matrix: &Matrix) -> HResult {
        HResult(unsafe { (self.vt().set_transform)(self.ptr, state.0, &matrix.0) })
    }

    fn get_transform(&self, state: TransformState) -> Result<Matrix, HResult> {
        let mut out = [[0.0f32; 4]; 4];
        check(unsafe { (self.vt().get_transform)(self.ptr, state.0, &mut out) })?;
        Ok(Matrix(out))
    }

    fn set_viewport(&self, viewport: &Viewport) -> HResult {
        let ffi = D3DVIEWPORT8::from_model(viewport);
        HResult(unsafe { (self.vt().set_viewport)(self.ptr, &ffi) })
    }

    fn get_viewport(&self) -> Result<Viewport, HResult> {
        let mut out = D3DVIEWPORT8::default();
        check(unsafe { (self.vt().get_viewport)(self.ptr, &mut out) })?;
        Ok(out.to_model())
    }

    fn set_render_state(&self, state: RenderState, value: u32) -> HResult {
        HResult(unsafe { (self.vt().set_render_state)(self.ptr, state.0, value) })
    }

    fn get_render_state(&self, state: RenderState) -> Result<u32, HResult> {
        let mut out = 0u32;
        check(unsafe { (self.vt().get_render_state)(self.ptr, state.0, &mut out) })?;
        Ok(out)
    }
}

impl Direct3DSwapChain8 for RawSwapChain8 {
    fn present(
        &self,
        source_rect: Option<Rect>,
        dest_rect: Option<Rect>,
        dest_window_override: WindowHandle,
    ) -> HResult {
        let source = source_rect.as_ref().map(RECT::from_model);
        let dest = dest_rect.as_ref().map(RECT::from_model);
        HResult(unsafe {
            (self.vt().present)(
                self.ptr,
                opt_rect_ptr(&source),
                opt_rect_ptr(&dest),
                dest_window_override as *mut c_void,
                ptr::null(),
            )
        })
    }

    fn get_back_buffer(
        &self,
        back_buffer: u32,
        kind: BackBufferType,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut out: *mut c_void = ptr::null_mut();
        check(unsafe { (self.vt().get_back_buffer)(self.ptr, back_buffer, kind.0, &mut out) })?;
        if out.is_null() {
            return Err(HResult::INVALID_CALL);
        }
        Ok(Arc::new(unsafe { RawSurface8::from_ptr(out) }))
    }
}

impl Direct3DSurface8 for RawSurface8 {
    fn get_desc(&self) -> Result<SurfaceDesc, HResult> {
        let mut out = D3DSURFACE_DESC::default();
        check(unsafe { (self.vt().get_desc)(self.ptr, &mut out) })?;
        Ok(out.to_model())
    }

    fn lock_rect(&self, rect: Option<Rect>, flags: LockFlags) -> Result<LockedRect, HResult> {
        let ffi_rect = rect.as_ref().map(RECT::from_model);
        let mut out = D3DLOCKED_RECT::default();
        check(unsafe {
            (self.vt().lock_rect)(self.ptr, &mut out, opt_rect_ptr(&ffi_rect), flags.bits())
        })?;
        Ok(out.to_model())
    }

    fn unlock_rect(&self) -> HResult {
        HResult(unsafe { (self.vt().unlock_rect)(self.ptr) })
    }
}
