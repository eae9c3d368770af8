//! The wrapped Direct3D 8 interface contracts.
//!
//! One trait per interface, method order following the real vtable layout.
//! The raw FFI adapters implement these over genuine COM objects; the
//! recording wrappers implement them again on top, so either side of the
//! interception boundary satisfies the same contract.
//!
//! Methods that can only fail return a bare [`HResult`]; methods producing a
//! value return `Result` with the failure code as the error. Object-valued
//! results carry the reference the real call transferred to the caller.

use std::sync::Arc;

use crate::models::d3d8::{
    AdapterIdentifier, BackBufferType, BehaviorFlags, ClearFlags, D3dRect, DevType, DisplayMode,
    Format, HResult, LockFlags, LockedRect, Matrix, Point, PresentParameters, Rect, RenderState,
    ResourceType, SurfaceDesc, TransformState, Viewport, WindowHandle,
};

use super::Unknown;

/// `IDirect3D8`, the top-level object returned by the module entry point.
pub trait Direct3D8: Unknown {
    fn get_adapter_count(&self) -> u32;

    fn get_adapter_identifier(
        &self,
        adapter: u32,
        flags: u32,
    ) -> Result<AdapterIdentifier, HResult>;

    fn get_adapter_mode_count(&self, adapter: u32) -> u32;

    fn enum_adapter_modes(&self, adapter: u32, mode: u32) -> Result<DisplayMode, HResult>;

    fn get_adapter_display_mode(&self, adapter: u32) -> Result<DisplayMode, HResult>;

    fn check_device_type(
        &self,
        adapter: u32,
        check_type: DevType,
        display_format: Format,
        back_buffer_format: Format,
        windowed: bool,
    ) -> HResult;

    fn check_device_format(
        &self,
        adapter: u32,
        device_type: DevType,
        adapter_format: Format,
        usage: u32,
        resource_type: ResourceType,
        check_format: Format,
    ) -> HResult;

    /// `pPresentationParameters` is read and written back: the driver may
    /// rewrite fields such as the back buffer size.
    fn create_device(
        &self,
        adapter: u32,
        device_type: DevType,
        focus_window: WindowHandle,
        behavior_flags: BehaviorFlags,
        params: &mut PresentParameters,
    ) -> Result<Arc<dyn Direct3DDevice8>, HResult>;
}

/// `IDirect3DDevice8`.
pub trait Direct3DDevice8: Unknown {
    fn test_cooperative_level(&self) -> HResult;

    fn get_available_texture_mem(&self) -> u32;

    fn get_direct3d(&self) -> Result<Arc<dyn Direct3D8>, HResult>;

    fn get_display_mode(&self) -> Result<DisplayMode, HResult>;

    fn create_additional_swap_chain(
        &self,
        params: &mut PresentParameters,
    ) -> Result<Arc<dyn Direct3DSwapChain8>, HResult>;

    fn reset(&self, params: &mut PresentParameters) -> HResult;

    fn present(
        &self,
        source_rect: Option<Rect>,
        dest_rect: Option<Rect>,
        dest_window_override: WindowHandle,
    ) -> HResult;

    fn get_back_buffer(
        &self,
        back_buffer: u32,
        kind: BackBufferType,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult>;

    fn create_render_target(
        &self,
        width: u32,
        height: u32,
        format: Format,
        multi_sample: u32,
        lockable: bool,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult>;

    fn create_image_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult>;

    fn copy_rects(
        &self,
        source: &Arc<dyn Direct3DSurface8>,
        source_rects: &[Rect],
        dest: &Arc<dyn Direct3DSurface8>,
        dest_points: &[Point],
    ) -> HResult;

    fn get_front_buffer(&self, dest: &Arc<dyn Direct3DSurface8>) -> HResult;

    fn set_render_target(
        &self,
        render_target: Option<Arc<dyn Direct3DSurface8>>,
        new_z_stencil: Option<Arc<dyn Direct3DSurface8>>,
    ) -> HResult;

    fn get_render_target(&self) -> Result<Arc<dyn Direct3DSurface8>, HResult>;

    fn begin_scene(&self) -> HResult;

    fn end_scene(&self) -> HResult;

    fn clear(
        &self,
        rects: &[D3dRect],
        flags: ClearFlags,
        color: u32,
        z: f32,
        stencil: u32,
    ) -> HResult;

    fn set_transform(&self, state: TransformState, matrix: &Matrix) -> HResult;

    fn get_transform(&self, state: TransformState) -> Result<Matrix, HResult>;

    fn set_viewport(&self, viewport: &Viewport) -> HResult;

    fn get_viewport(&self) -> Result<Viewport, HResult>;

    fn set_render_state(&self, state: RenderState, value: u32) -> HResult;

    fn get_render_state(&self, state: RenderState) -> Result<u32, HResult>;
}

/// `IDirect3DSwapChain8`.
pub trait Direct3DSwapChain8: Unknown {
    fn present(
        &self,
        source_rect: Option<Rect>,
        dest_rect: Option<Rect>,
        dest_window_override: WindowHandle,
    ) -> HResult;

    fn get_back_buffer(
        &self,
        back_buffer: u32,
        kind: BackBufferType,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult>;
}

/// `IDirect3DSurface8`.
pub trait Direct3DSurface8: Unknown {
    fn get_desc(&self) -> Result<SurfaceDesc, HResult>;

    /// The returned mapping is reported by address only; locked memory is
    /// never shadowed or copied by the capture layer.
    fn lock_rect(&self, rect: Option<Rect>, flags: LockFlags) -> Result<LockedRect, HResult>;

    fn unlock_rect(&self) -> HResult;
}
