use crate::models::d3d8::{HResult, LockFlags, LockedRect, Rect, SurfaceDesc};
use crate::models::value::Value;
use crate::traits::{Direct3DSurface8, InterfaceTag};

use super::{opt_rect_value, wrapper_type};

wrapper_type! {
    /// Recording stand-in for `IDirect3DSurface8`.
    TraceSurface8: Direct3DSurface8, InterfaceTag::Surface8, "IDirect3DSurface8"
}

impl Direct3DSurface8 for TraceSurface8 {
    fn get_desc(&self) -> Result<SurfaceDesc, HResult> {
        let mut call = self.ctx.recorder().begin_call("IDirect3DSurface8::GetDesc");
        call.arg("this", Value::Handle(self.object_id));
        match self.real.get_desc() {
            Ok(desc) => {
                call.out("pDesc", desc.to_value());
                call.ret(HResult::OK.to_value());
                Ok(desc)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn lock_rect(&self, rect: Option<Rect>, flags: LockFlags) -> Result<LockedRect, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DSurface8::LockRect");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("pRect", opt_rect_value(&rect));
        call.arg("Flags", flags.to_value());
        match self.real.lock_rect(rect, flags) {
            Ok(locked) => {
                call.out("pLockedRect", locked.to_value());
                call.ret(HResult::OK.to_value());
                Ok(locked)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn unlock_rect(&self) -> HResult {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3DSurface8::UnlockRect");
        call.arg("this", Value::Handle(self.object_id));
        let result = self.real.unlock_rect();
        call.ret(result.to_value());
        result
    }
}
