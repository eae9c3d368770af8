//! `repr(C)` shapes of the Direct3D 8 structures that cross the ABI
//! boundary, and their conversions to the core data model.
//!
//! Field order and widths follow `d3d8.h` exactly; nothing here may be
//! reordered.

use std::ffi::c_void;

use api_capture_core::models::d3d8::{
    AdapterIdentifier, DisplayMode, Format, LockedRect, Point, PresentParameters, Rect,
    SurfaceDesc, SwapEffect, Viewport,
};

pub type BOOL = i32;

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct RECT {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RECT {
    pub fn from_model(rect: &Rect) -> Self {
        Self {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        }
    }

    pub fn to_model(self) -> Rect {
        Rect {
            left: self.left,
            top: self.top,
            right: self.right,
            bottom: self.bottom,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct POINT {
    pub x: i32,
    pub y: i32,
}

impl POINT {
    pub fn from_model(point: &Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct D3DRECT {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct D3DDISPLAYMODE {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub format: u32,
}

impl D3DDISPLAYMODE {
    pub fn to_model(self) -> DisplayMode {
        DisplayMode {
            width: self.width,
            height: self.height,
            refresh_rate: self.refresh_rate,
            format: Format(self.format),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct D3DPRESENT_PARAMETERS {
    pub back_buffer_width: u32,
    pub back_buffer_height: u32,
    pub back_buffer_format: u32,
    pub back_buffer_count: u32,
    pub multi_sample_type: u32,
    pub swap_effect: u32,
    pub h_device_window: *mut c_void,
    pub windowed: BOOL,
    pub enable_auto_depth_stencil: BOOL,
    pub auto_depth_stencil_format: u32,
    pub flags: u32,
    pub full_screen_refresh_rate_in_hz: u32,
    pub full_screen_presentation_interval: u32,
}

impl D3DPRESENT_PARAMETERS {
    pub fn from_model(params: &PresentParameters) -> Self {
        Self {
            back_buffer_width: params.back_buffer_width,
            back_buffer_height: params.back_buffer_height,
            back_buffer_format: params.back_buffer_format.0,
            back_buffer_count: params.back_buffer_count,
            multi_sample_type: params.multi_sample_type,
            swap_effect: params.swap_effect.0,
            h_device_window: params.device_window as *mut c_void,
            windowed: params.windowed as BOOL,
            enable_auto_depth_stencil: params.enable_auto_depth_stencil as BOOL,
            auto_depth_stencil_format: params.auto_depth_stencil_format.0,
            flags: params.flags,
            full_screen_refresh_rate_in_hz: params.full_screen_refresh_rate_in_hz,
            full_screen_presentation_interval: params.full_screen_presentation_interval,
        }
    }

    pub fn to_model(&self) -> PresentParameters {
        PresentParameters {
            back_buffer_width: self.back_buffer_width,
            back_buffer_height: self.back_buffer_height,
            back_buffer_format: Format(self.back_buffer_format),
            back_buffer_count: self.back_buffer_count,
            multi_sample_type: self.multi_sample_type,
            swap_effect: SwapEffect(self.swap_effect),
            device_window: self.h_device_window as u64,
            windowed: self.windowed != 0,
            enable_auto_depth_stencil: self.enable_auto_depth_stencil != 0,
            auto_depth_stencil_format: Format(self.auto_depth_stencil_format),
            flags: self.flags,
            full_screen_refresh_rate_in_hz: self.full_screen_refresh_rate_in_hz,
            full_screen_presentation_interval: self.full_screen_presentation_interval,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct D3DSURFACE_DESC {
    pub format: u32,
    pub resource_type: u32,
    pub usage: u32,
    pub pool: u32,
    pub size: u32,
    pub multi_sample_type: u32,
    pub width: u32,
    pub height: u32,
}

impl D3DSURFACE_DESC {
    pub fn to_model(self) -> SurfaceDesc {
        SurfaceDesc {
            format: Format(self.format),
            resource_type: api_capture_core::models::d3d8::ResourceType(self.resource_type),
            usage: self.usage,
            pool: api_capture_core::models::d3d8::Pool(self.pool),
            size: self.size,
            multi_sample_type: self.multi_sample_type,
            width: self.width,
            height: self.height,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct D3DLOCKED_RECT {
    pub pitch: i32,
    pub p_bits: *mut c_void,
}

impl Default for D3DLOCKED_RECT {
    fn default() -> Self {
        Self {
            pitch: 0,
            p_bits: std::ptr::null_mut(),
        }
    }
}

impl D3DLOCKED_RECT {
    pub fn to_model(self) -> LockedRect {
        LockedRect {
            pitch: self.pitch,
            bits: self.p_bits as u64,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct D3DVIEWPORT8 {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

impl D3DVIEWPORT8 {
    pub fn from_model(viewport: &Viewport) -> Self {
        Self {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_z: viewport.min_z,
            max_z: viewport.max_z,
        }
    }

    pub fn to_model(self) -> Viewport {
        Viewport {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            min_z: self.min_z,
            max_z: self.max_z,
        }
    }
}

pub const MAX_DEVICE_IDENTIFIER_STRING: usize = 512;

#[repr(C)]
pub struct D3DADAPTER_IDENTIFIER8 {
    pub driver: [u8; MAX_DEVICE_IDENTIFIER_STRING],
    pub description: [u8; MAX_DEVICE_IDENTIFIER_STRING],
    pub driver_version: i64,
    pub vendor_id: u32,
    pub device_id: u32,
    pub sub_sys_id: u32,
    pub revision: u32,
    pub device_identifier: api_capture_core::Guid,
    pub whql_level: u32,
}

impl Default for D3DADAPTER_IDENTIFIER8 {
    fn default() -> Self {
        // Arrays over 32 elements have no derived Default; zero the lot.
        unsafe { std::mem::zeroed() }
    }
}

impl D3DADAPTER_IDENTIFIER8 {
    pub fn to_model(&self) -> AdapterIdentifier {
        AdapterIdentifier {
            driver: c_string(&self.driver),
            description: c_string(&self.description),
            vendor_id: self.vendor_id,
            device_id: self.device_id,
            sub_sys_id: self.sub_sys_id,
            revision: self.revision,
        }
    }
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Optional-rect call convention: null pointer means "whole area".
pub fn opt_rect_ptr(storage: &Option<RECT>) -> *const RECT {
    match storage {
        Some(rect) => rect as *const RECT,
        None => std::ptr::null(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_parameters_round_trip() {
        let model = PresentParameters {
            back_buffer_width: 800,
            back_buffer_height: 600,
            back_buffer_format: Format(21),
            windowed: false,
            device_window: 0xABCD,
            ..Default::default()
        };
        let ffi = D3DPRESENT_PARAMETERS::from_model(&model);
        assert_eq!(ffi.windowed, 0);
        assert_eq!(ffi.h_device_window as u64, 0xABCD);
        assert_eq!(ffi.to_model(), model);
    }

    #[test]
    fn adapter_identifier_strings_are_nul_terminated() {
        let mut ffi = D3DADAPTER_IDENTIFIER8::default();
        ffi.driver[..9].copy_from_slice(b"mock.dll\0");
        ffi.description[..5].copy_from_slice(b"Mock\0");
        ffi.vendor_id = 0x10DE;
        let model = ffi.to_model();
        assert_eq!(model.driver, "mock.dll");
        assert_eq!(model.description, "Mock");
        assert_eq!(model.vendor_id, 0x10DE);
    }

    #[test]
    fn locked_rect_reports_address_only() {
        let locked = D3DLOCKED_RECT {
            pitch: 2560,
            p_bits: 0x1234 as *mut c_void,
        };
        assert_eq!(locked.to_model(), LockedRect { pitch: 2560, bits: 0x1234 });
    }
}
