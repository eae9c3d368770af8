use std::sync::Arc;

use crate::models::d3d8::{BackBufferType, HResult, Rect, WindowHandle};
use crate::models::value::Value;
use crate::traits::{Direct3DSurface8, Direct3DSwapChain8, InterfaceTag};

use super::{opt_rect_value, wrapper_type, TraceSurface8};

wrapper_type! {
    /// Recording stand-in for `IDirect3DSwapChain8`.
    TraceSwapChain8: Direct3DSwapChain8, InterfaceTag::SwapChain8, "IDirect3DSwapChain8"
}

impl Direct3DSwapChain8 for TraceSwapChain8 {
    fn present(
        &self,
        source_rect: Option<Rect>,
        dest_rect: Option<Rect>,
        dest_window_override: WindowHandle,
    ) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DSwapChain8::Present");
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
            .begin_call("IDirect3DSwapChain8::GetBackBuffer");
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
}
