use std::sync::Arc;

use crate::models::d3d8::{
    BackBufferType, ClearFlags, D3dRect, DisplayMode, Format, HResult, Matrix, Point,
    PresentParameters, Rect, RenderState, TransformState, Viewport, WindowHandle,
};
use crate::models::value::Value;
use crate::traits::{
    Direct3D8, Direct3DDevice8, Direct3DSurface8, Direct3DSwapChain8, InterfaceTag,
};

use super::{
    opt_rect_value, unwrap_surface, wrapper_type, TraceDirect3D8, TraceSurface8, TraceSwapChain8,
};

wrapper_type! {
    /// Recording stand-in for `IDirect3DDevice8`.
    ///
    /// Carries the bulk of the interception patterns: object results that
    /// must be wrapped fresh (`Create*`), results that reuse registry
    /// entries (`GetDirect3D`, `GetBackBuffer`), and object arguments that
    /// must be unwrapped back to real space (`SetRenderTarget`,
    /// `CopyRects`).
    TraceDevice8: Direct3DDevice8, InterfaceTag::Device8, "IDirect3DDevice8"
}

impl Direct3DDevice8 for TraceDevice8 {
    fn test_cooperative_level(&self) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::TestCooperativeLevel");
        call.arg("this", Value::Handle(self.object_id));
        let result = self.real.test_cooperative_level();
        call.ret(result.to_value());
        result
    }

    fn get_available_texture_mem(&self) -> u32 {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetAvailableTextureMem");
        call.arg("this", Value::Handle(self.object_id));
        let bytes = self.real.get_available_texture_mem();
        call.ret(Value::UInt(bytes.into()));
        bytes
    }

    fn get_direct3d(&self) -> Result<Arc<dyn Direct3D8>, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetDirect3D");
        call.arg("this", Value::Handle(self.object_id));
        match self.real.get_direct3d() {
            Ok(d3d) => {
                // The parent is almost always wrapped already; identity
                // stability demands that exact instance back.
                let d3d = TraceDirect3D8::wrap_reuse(&self.ctx, d3d);
                call.out("ppD3D8", Value::Handle(d3d.object_id()));
                call.ret(HResult::OK.to_value());
                Ok(d3d)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn get_display_mode(&self) -> Result<DisplayMode, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetDisplayMode");
        call.arg("this", Value::Handle(self.object_id));
        match self.real.get_display_mode() {
            Ok(mode) => {
                call.out("pMode", mode.to_value());
                call.ret(HResult::OK.to_value());
                Ok(mode)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn create_additional_swap_chain(
        &self,
        params: &mut PresentParameters,
    ) -> Result<Arc<dyn Direct3DSwapChain8>, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::CreateAdditionalSwapChain");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("pPresentationParameters", params.to_value());
        match self.real.create_additional_swap_chain(params) {
            Ok(swap_chain) => {
                let swap_chain = TraceSwapChain8::wrap_fresh(&self.ctx, swap_chain);
                call.out("pPresentationParameters", params.to_value());
                call.out("pSwapChain", Value::Handle(swap_chain.object_id()));
                call.ret(HResult::OK.to_value());
                Ok(swap_chain)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn reset(&self, params: &mut PresentParameters) -> HResult {
        let mut call = self.ctx.recorder().begin_call("IDirect3DDevice8::Reset");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("pPresentationParameters", params.to_value());
        let result = self.real.reset(params);
        if result.is_success() {
            call.out("pPresentationParameters", params.to_value());
        }
        call.ret(result.to_value());
        result
    }

    fn present(
        &self,
        source_rect: Option<Rect>,
        dest_rect: Option<Rect>,
        dest_window_override: WindowHandle,
    ) -> HResult {
        let mut call = self.ctx.recorder().begin_call("IDirect3DDevice8::Present");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("pSourceRect", opt_rect_value(&source_rect));
        call.arg("pDestRect", opt_rect_value(&dest_rect));
        call.arg("hDestWindowOverride", Value::Handle(dest_window_override));
        let result = self
            .real
            .present(source_rect, dest_rect, dest_window_override);
        call.ret(result.to_value());
        result
    }

    fn get_back_buffer(
        &self,
        back_buffer: u32,
        kind: BackBufferType,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetBackBuffer");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("BackBuffer", Value::UInt(back_buffer.into()));
        call.arg("Type", kind.to_value());
        match self.real.get_back_buffer(back_buffer, kind) {
            Ok(surface) => {
                let surface = TraceSurface8::wrap_reuse(&self.ctx, surface);
                call.out("ppBackBuffer", Value::Handle(surface.object_id()));
                call.ret(HResult::OK.to_value());
                Ok(surface)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn create_render_target(
        &self,
        width: u32,
        height: u32,
        format: Format,
        multi_sample: u32,
        lockable: bool,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::CreateRenderTarget");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Width", Value::UInt(width.into()));
        call.arg("Height", Value::UInt(height.into()));
        call.arg("Format", format.to_value());
        call.arg("MultiSample", Value::UInt(multi_sample.into()));
        call.arg("Lockable", Value::Bool(lockable));
        match self
            .real
            .create_render_target(width, height, format, multi_sample, lockable)
        {
            Ok(surface) => {
                let surface = TraceSurface8::wrap_fresh(&self.ctx, surface);
                call.out("ppSurface", Value::Handle(surface.object_id()));
                call.ret(HResult::OK.to_value());
                Ok(surface)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn create_image_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::CreateImageSurface");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Width", Value::UInt(width.into()));
        call.arg("Height", Value::UInt(height.into()));
        call.arg("Format", format.to_value());
        match self.real.create_image_surface(width, height, format) {
            Ok(surface) => {
                let surface = TraceSurface8::wrap_fresh(&self.ctx, surface);
                call.out("ppSurface", Value::Handle(surface.object_id()));
                call.ret(HResult::OK.to_value());
                Ok(surface)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn copy_rects(
        &self,
        source: &Arc<dyn Direct3DSurface8>,
        source_rects: &[Rect],
        dest: &Arc<dyn Direct3DSurface8>,
        dest_points: &[Point],
    ) -> HResult {
        let mut call = self.ctx.recorder().begin_call("IDirect3DDevice8::CopyRects");
        let (source, source_value) = unwrap_surface(source);
        let (dest, dest_value) = unwrap_surface(dest);
        call.arg("this", Value::Handle(self.object_id));
        call.arg("pSourceSurface", source_value);
        call.arg(
            "pSourceRectsArray",
            Value::Array(source_rects.iter().map(Rect::to_value).collect()),
        );
        call.arg("cRects", Value::UInt(source_rects.len() as u64));
        call.arg("pDestinationSurface", dest_value);
        call.arg(
            "pDestPointsArray",
            Value::Array(dest_points.iter().map(Point::to_value).collect()),
        );
        let result = self
            .real
            .copy_rects(&source, source_rects, &dest, dest_points);
        call.ret(result.to_value());
        result
    }

    fn get_front_buffer(&self, dest: &Arc<dyn Direct3DSurface8>) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetFrontBuffer");
        let (dest, dest_value) = unwrap_surface(dest);
        call.arg("this", Value::Handle(self.object_id));
        call.arg("pDestSurface", dest_value);
        let result = self.real.get_front_buffer(&dest);
        call.ret(result.to_value());
        result
    }

    fn set_render_target(
        &self,
        render_target: Option<Arc<dyn Direct3DSurface8>>,
        new_z_stencil: Option<Arc<dyn Direct3DSurface8>>,
    ) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::SetRenderTarget");
        call.arg("this", Value::Handle(self.object_id));
        let (render_target, rt_value) = match &render_target {
            Some(surface) => {
                let (real, value) = unwrap_surface(surface);
                (Some(real), value)
            }
            None => (None, Value::Null),
        };
        let (new_z_stencil, zs_value) = match &new_z_stencil {
            Some(surface) => {
                let (real, value) = unwrap_surface(surface);
                (Some(real), value)
            }
            None => (None, Value::Null),
        };
        call.arg("pRenderTarget", rt_value);
        call.arg("pNewZStencil", zs_value);
        let result = self.real.set_render_target(render_target, new_z_stencil);
        call.ret(result.to_value());
        result
    }

    fn get_render_target(&self) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetRenderTarget");
        call.arg("this", Value::Handle(self.object_id));
        match self.real.get_render_target() {
            Ok(surface) => {
                let surface = TraceSurface8::wrap_reuse(&self.ctx, surface);
                call.out("ppRenderTarget", Value::Handle(surface.object_id()));
                call.ret(HResult::OK.to_value());
                Ok(surface)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn begin_scene(&self) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::BeginScene");
        call.arg("this", Value::Handle(self.object_id));
        let result = self.real.begin_scene();
        call.ret(result.to_value());
        result
    }

    fn end_scene(&self) -> HResult {
        let mut call = self.ctx.recorder().begin_call("IDirect3DDevice8::EndScene");
        call.arg("this", Value::Handle(self.object_id));
        let result = self.real.end_scene();
        call.ret(result.to_value());
        result
    }

    fn clear(
        &self,
        rects: &[D3dRect],
        flags: ClearFlags,
        color: u32,
        z: f32,
        stencil: u32,
    ) -> HResult {
        let mut call = self.ctx.recorder().begin_call("IDirect3DDevice8::Clear");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Count", Value::UInt(rects.len() as u64));
        call.arg(
            "pRects",
            Value::Array(rects.iter().map(D3dRect::to_value).collect()),
        );
        call.arg("Flags", flags.to_value());
        call.arg("Color", Value::UInt(color.into()));
        call.arg("Z", Value::Float(z.into()));
        call.arg("Stencil", Value::UInt(stencil.into()));
        let result = self.real.clear(rects, flags, color, z, stencil);
        call.ret(result.to_value());
        result
    }

    fn set_transform(&self, state: TransformState, matrix: &Matrix) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::SetTransform");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("State", state.to_value());
        call.arg("pMatrix", matrix.to_value());
        let result = self.real.set_transform(state, matrix);
        call.ret(result.to_value());
        result
    }

    fn get_transform(&self, state: TransformState) -> Result<Matrix, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetTransform");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("State", state.to_value());
        match self.real.get_transform(state) {
            Ok(matrix) => {
                call.out("pMatrix", matrix.to_value());
                call.ret(HResult::OK.to_value());
                Ok(matrix)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn set_viewport(&self, viewport: &Viewport) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::SetViewport");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("pViewport", viewport.to_value());
        let result = self.real.set_viewport(viewport);
        call.ret(result.to_value());
        result
    }

    fn get_viewport(&self) -> Result<Viewport, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetViewport");
        call.arg("this", Value::Handle(self.object_id));
        match self.real.get_viewport() {
            Ok(viewport) => {
                call.out("pViewport", viewport.to_value());
                call.ret(HResult::OK.to_value());
                Ok(viewport)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn set_render_state(&self, state: RenderState, value: u32) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::SetRenderState");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("State", state.to_value());
        call.arg("Value", Value::UInt(value.into()));
        let result = self.real.set_render_state(state, value);
        call.ret(result.to_value());
        result
    }

    fn get_render_state(&self, state: RenderState) -> Result<u32, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DDevice8::GetRenderState");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("State", state.to_value());
        match self.real.get_render_state(state) {
            Ok(value) => {
                call.out("pValue", Value::UInt(value.into()));
                call.ret(HResult::OK.to_value());
                Ok(value)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }
}
