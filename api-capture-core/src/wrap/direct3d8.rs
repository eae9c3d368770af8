use std::sync::Arc;

use crate::models::d3d8::{
    AdapterIdentifier, BehaviorFlags, DevType, DisplayMode, Format, HResult, PresentParameters,
    ResourceType, WindowHandle,
};
use crate::models::value::Value;
use crate::traits::{Direct3D8, Direct3DDevice8, InterfaceTag};

use super::{wrapper_type, TraceDevice8};

wrapper_type! {
    /// Recording stand-in for `IDirect3D8`, the top-level API object.
    TraceDirect3D8: Direct3D8, InterfaceTag::Direct3D8, "IDirect3D8"
}

impl Direct3D8 for TraceDirect3D8 {
    fn get_adapter_count(&self) -> u32 {
        let mut call = self.ctx.recorder().begin_call("IDirect3D8::GetAdapterCount");
        call.arg("this", Value::Handle(self.object_id));
        let count = self.real.get_adapter_count();
        call.ret(Value::UInt(count.into()));
        count
    }

    fn get_adapter_identifier(
        &self,
        adapter: u32,
        flags: u32,
    ) -> Result<AdapterIdentifier, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3D8::GetAdapterIdentifier");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Adapter", Value::UInt(adapter.into()));
        call.arg("Flags", Value::UInt(flags.into()));
        match self.real.get_adapter_identifier(adapter, flags) {
            Ok(identifier) => {
                call.out("pIdentifier", identifier.to_value());
                call.ret(HResult::OK.to_value());
                Ok(identifier)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn get_adapter_mode_count(&self, adapter: u32) -> u32 {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3D8::GetAdapterModeCount");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Adapter", Value::UInt(adapter.into()));
        let count = self.real.get_adapter_mode_count(adapter);
        call.ret(Value::UInt(count.into()));
        count
    }

    fn enum_adapter_modes(&self, adapter: u32, mode: u32) -> Result<DisplayMode, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3D8::EnumAdapterModes");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Adapter", Value::UInt(adapter.into()));
        call.arg("Mode", Value::UInt(mode.into()));
        match self.real.enum_adapter_modes(adapter, mode) {
            Ok(display_mode) => {
                call.out("pMode", display_mode.to_value());
                call.ret(HResult::OK.to_value());
                Ok(display_mode)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn get_adapter_display_mode(&self, adapter: u32) -> Result<DisplayMode, HResult> {
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3D8::GetAdapterDisplayMode");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Adapter", Value::UInt(adapter.into()));
        match self.real.get_adapter_display_mode(adapter) {
            Ok(display_mode) => {
                call.out("pMode", display_mode.to_value());
                call.ret(HResult::OK.to_value());
                Ok(display_mode)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }

    fn check_device_type(
        &self,
        adapter: u32,
        check_type: DevType,
        display_format: Format,
        back_buffer_format: Format,
        windowed: bool,
    ) -> HResult {
        let mut call = self.ctx.recorder().begin_call("IDirect3D8::CheckDeviceType");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Adapter", Value::UInt(adapter.into()));
        call.arg("CheckType", check_type.to_value());
        call.arg("DisplayFormat", display_format.to_value());
        call.arg("BackBufferFormat", back_buffer_format.to_value());
        call.arg("Windowed", Value::Bool(windowed));
        let result = self.real.check_device_type(
            adapter,
            check_type,
            display_format,
            back_buffer_format,
            windowed,
        );
        call.ret(result.to_value());
        result
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
        let mut call = self
            .ctx
            .recorder()
            .begin_call("IDirect3D8::CheckDeviceFormat");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Adapter", Value::UInt(adapter.into()));
        call.arg("DeviceType", device_type.to_value());
        call.arg("AdapterFormat", adapter_format.to_value());
        call.arg("Usage", Value::UInt(usage.into()));
        call.arg("RType", resource_type.to_value());
        call.arg("CheckFormat", check_format.to_value());
        let result = self.real.check_device_format(
            adapter,
            device_type,
            adapter_format,
            usage,
            resource_type,
            check_format,
        );
        call.ret(result.to_value());
        result
    }

    fn create_device(
        &self,
        adapter: u32,
        device_type: DevType,
        focus_window: WindowHandle,
        behavior_flags: BehaviorFlags,
        params: &mut PresentParameters,
    ) -> Result<Arc<dyn Direct3DDevice8>, HResult> {
        let mut call = self.ctx.recorder().begin_call("IDirect3D8::CreateDevice");
        call.arg("this", Value::Handle(self.object_id));
        call.arg("Adapter", Value::UInt(adapter.into()));
        call.arg("DeviceType", device_type.to_value());
        call.arg("hFocusWindow", Value::Handle(focus_window));
        call.arg("BehaviorFlags", behavior_flags.to_value());
        call.arg("pPresentationParameters", params.to_value());
        match self
            .real
            .create_device(adapter, device_type, focus_window, behavior_flags, params)
        {
            Ok(device) => {
                let device = TraceDevice8::wrap_fresh(&self.ctx, device);
                // The driver may have rewritten the presentation parameters.
                call.out("pPresentationParameters", params.to_value());
                call.out(
                    "ppReturnedDeviceInterface",
                    Value::Handle(device.object_id()),
                );
                call.ret(HResult::OK.to_value());
                Ok(device)
            }
            Err(hr) => {
                call.ret(hr.to_value());
                Err(hr)
            }
        }
    }
}
