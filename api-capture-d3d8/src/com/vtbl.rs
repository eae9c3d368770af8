//! `repr(C)` vtable layouts for the wrapped interfaces.
//!
//! Slot order is the one `d3d8.h` declares and must never change. Slots the
//! capture layer does not model are typed [`ReservedSlot`]: the inbound
//! adapters never call them, and the outbound projection fills them with
//! abort stubs. Comments name the skipped methods so the layout stays
//! auditable.

#![allow(clippy::type_complexity)]

use std::ffi::c_void;

use api_capture_core::Guid;

use super::types::{
    BOOL, D3DADAPTER_IDENTIFIER8, D3DDISPLAYMODE, D3DLOCKED_RECT, D3DPRESENT_PARAMETERS, D3DRECT,
    D3DSURFACE_DESC, D3DVIEWPORT8, POINT, RECT,
};

pub type D3DMATRIX = [[f32; 4]; 4];

pub type QueryInterfaceFn =
    unsafe extern "system" fn(*mut c_void, *const Guid, *mut *mut c_void) -> i32;
pub type AddRefFn = unsafe extern "system" fn(*mut c_void) -> u32;
pub type ReleaseFn = unsafe extern "system" fn(*mut c_void) -> u32;

/// Placeholder for a vtable slot the capture layer does not model. Same
/// size and alignment as any method pointer; never invoked by the inbound
/// adapters.
pub type ReservedSlot = unsafe extern "system" fn(*mut c_void) -> i32;

#[repr(C)]
pub struct IDirect3D8Vtbl {
    pub query_interface: QueryInterfaceFn,
    pub add_ref: AddRefFn,
    pub release: ReleaseFn,
    /// RegisterSoftwareDevice
    pub _register_software_device: ReservedSlot,
    pub get_adapter_count: unsafe extern "system" fn(*mut c_void) -> u32,
    pub get_adapter_identifier:
        unsafe extern "system" fn(*mut c_void, u32, u32, *mut D3DADAPTER_IDENTIFIER8) -> i32,
    pub get_adapter_mode_count: unsafe extern "system" fn(*mut c_void, u32) -> u32,
    pub enum_adapter_modes:
        unsafe extern "system" fn(*mut c_void, u32, u32, *mut D3DDISPLAYMODE) -> i32,
    pub get_adapter_display_mode:
        unsafe extern "system" fn(*mut c_void, u32, *mut D3DDISPLAYMODE) -> i32,
    pub check_device_type:
        unsafe extern "system" fn(*mut c_void, u32, u32, u32, u32, BOOL) -> i32,
    pub check_device_format:
        unsafe extern "system" fn(*mut c_void, u32, u32, u32, u32, u32, u32) -> i32,
    /// CheckDeviceMultiSampleType, CheckDepthStencilMatch, GetDeviceCaps,
    /// GetAdapterMonitor
    pub _check_multi_sample_to_monitor: [ReservedSlot; 4],
    pub create_device: unsafe extern "system" fn(
        *mut c_void,
        u32,
        u32,
        *mut c_void,
        u32,
        *mut D3DPRESENT_PARAMETERS,
        *mut *mut c_void,
    ) -> i32,
}

#[repr(C)]
pub struct IDirect3DDevice8Vtbl {
    pub query_interface: QueryInterfaceFn,
    pub add_ref: AddRefFn,
    pub release: ReleaseFn,
    pub test_cooperative_level: unsafe extern "system" fn(*mut c_void) -> i32,
    pub get_available_texture_mem: unsafe extern "system" fn(*mut c_void) -> u32,
    /// ResourceManagerDiscardBytes
    pub _resource_manager_discard_bytes: ReservedSlot,
    pub get_direct3d: unsafe extern "system" fn(*mut c_void, *mut *mut c_void) -> i32,
    /// GetDeviceCaps
    pub _get_device_caps: ReservedSlot,
    pub get_display_mode: unsafe extern "system" fn(*mut c_void, *mut D3DDISPLAYMODE) -> i32,
    /// GetCreationParameters, SetCursorProperties, SetCursorPosition,
    /// ShowCursor
    pub _creation_parameters_to_show_cursor: [ReservedSlot; 4],
    pub create_additional_swap_chain: unsafe extern "system" fn(
        *mut c_void,
        *mut D3DPRESENT_PARAMETERS,
        *mut *mut c_void,
    ) -> i32,
    pub reset: unsafe extern "system" fn(*mut c_void, *mut D3DPRESENT_PARAMETERS) -> i32,
    pub present: unsafe extern "system" fn(
        *mut c_void,
        *const RECT,
        *const RECT,
        *mut c_void,
        *const c_void,
    ) -> i32,
    pub get_back_buffer:
        unsafe extern "system" fn(*mut c_void, u32, u32, *mut *mut c_void) -> i32,
    /// GetRasterStatus, SetGammaRamp, GetGammaRamp
    pub _raster_status_to_gamma_ramp: [ReservedSlot; 3],
    /// CreateTexture, CreateVolumeTexture, CreateCubeTexture,
    /// CreateVertexBuffer, CreateIndexBuffer
    pub _create_texture_to_index_buffer: [ReservedSlot; 5],
    pub create_render_target: unsafe extern "system" fn(
        *mut c_void,
        u32,
        u32,
        u32,
        u32,
        BOOL,
        *mut *mut c_void,
    ) -> i32,
    /// CreateDepthStencilSurface
    pub _create_depth_stencil_surface: ReservedSlot,
    pub create_image_surface:
        unsafe extern "system" fn(*mut c_void, u32, u32, u32, *mut *mut c_void) -> i32,
    pub copy_rects: unsafe extern "system" fn(
        *mut c_void,
        *mut c_void,
        *const RECT,
        u32,
        *mut c_void,
        *const POINT,
    ) -> i32,
    /// UpdateTexture
    pub _update_texture: ReservedSlot,
    pub get_front_buffer: unsafe extern "system" fn(*mut c_void, *mut c_void) -> i32,
    pub set_render_target:
        unsafe extern "system" fn(*mut c_void, *mut c_void, *mut c_void) -> i32,
    pub get_render_target: unsafe extern "system" fn(*mut c_void, *mut *mut c_void) -> i32,
    /// GetDepthStencilSurface
    pub _get_depth_stencil_surface: ReservedSlot,
    pub begin_scene: unsafe extern "system" fn(*mut c_void) -> i32,
    pub end_scene: unsafe extern "system" fn(*mut c_void) -> i32,
    pub clear: unsafe extern "system" fn(
        *mut c_void,
        u32,
        *const D3DRECT,
        u32,
        u32,
        f32,
        u32,
    ) -> i32,
    pub set_transform: unsafe extern "system" fn(*mut c_void, u32, *const D3DMATRIX) -> i32,
    pub get_transform: unsafe extern "system" fn(*mut c_void, u32, *mut D3DMATRIX) -> i32,
    /// MultiplyTransform
    pub _multiply_transform: ReservedSlot,
    pub set_viewport: unsafe extern "system" fn(*mut c_void, *const D3DVIEWPORT8) -> i32,
    pub get_viewport: unsafe extern "system" fn(*mut c_void, *mut D3DVIEWPORT8) -> i32,
    /// SetMaterial, GetMaterial, SetLight, GetLight, LightEnable,
    /// GetLightEnable, SetClipPlane, GetClipPlane
    pub _material_to_clip_plane: [ReservedSlot; 8],
    pub set_render_state: unsafe extern "system" fn(*mut c_void, u32, u32) -> i32,
    pub get_render_state: unsafe extern "system" fn(*mut c_void, u32, *mut u32) -> i32,
    /// BeginStateBlock through DeletePatch: the state block, clip status,
    /// texture stage, palette, draw, shader, stream, and patch methods.
    pub _state_block_to_delete_patch: [ReservedSlot; 45],
}

#[repr(C)]
pub struct IDirect3DSwapChain8Vtbl {
    pub query_interface: QueryInterfaceFn,
    pub add_ref: AddRefFn,
    pub release: ReleaseFn,
    pub present: unsafe extern "system" fn(
        *mut c_void,
        *const RECT,
        *const RECT,
        *mut c_void,
        *const c_void,
    ) -> i32,
    pub get_back_buffer:
        unsafe extern "system" fn(*mut c_void, u32, u32, *mut *mut c_void) -> i32,
}

#[repr(C)]
pub struct IDirect3DSurface8Vtbl {
    pub query_interface: QueryInterfaceFn,
    pub add_ref: AddRefFn,
    pub release: ReleaseFn,
    /// GetDevice, SetPrivateData, GetPrivateData, FreePrivateData,
    /// GetContainer
    pub _get_device_to_get_container: [ReservedSlot; 5],
    pub get_desc: unsafe extern "system" fn(*mut c_void, *mut D3DSURFACE_DESC) -> i32,
    pub lock_rect: unsafe extern "system" fn(
        *mut c_void,
        *mut D3DLOCKED_RECT,
        *const RECT,
        u32,
    ) -> i32,
    pub unlock_rect: unsafe extern "system" fn(*mut c_void) -> i32,
}

/// Read an interface pointer's vtable.
///
/// # Safety
/// `this` must be a live COM interface pointer whose vtable has (at least)
/// the layout of `V`.
pub unsafe fn vtable<'a, V>(this: *mut c_void) -> &'a V {
    &**(this as *const *const V)
}
