//! End-to-end interception properties, driven through mock real objects.
//!
//! The mocks play the role of the genuine library: reference-counted
//! objects with scripted responses and an invocation log that serves as the
//! behavioral oracle. Anything observable through a wrapper must match
//! driving the mock directly.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Barrier, Weak};
use std::thread;

use parking_lot::Mutex;

use api_capture_core::models::d3d8::{
    AdapterIdentifier, BackBufferType, BehaviorFlags, ClearFlags, D3dRect, DevType, DisplayMode,
    Format, HResult, LockFlags, LockedRect, Matrix, Point, PresentParameters, Rect, RenderState,
    ResourceType, SurfaceDesc, TransformState, Viewport, WindowHandle,
};
use api_capture_core::models::guid::{
    Guid, IID_IDIRECT3D8, IID_IDIRECT3DDEVICE8, IID_IDIRECT3DRESOURCE8, IID_IDIRECT3DSURFACE8,
    IID_IUNKNOWN,
};
use api_capture_core::trace::reader::TraceDocument;
use api_capture_core::trace::MemorySink;
use api_capture_core::{
    AnyInterface, CaptureContext, Direct3D8, Direct3DDevice8, Direct3DSurface8,
    Direct3DSwapChain8, TraceDevice8, TraceDirect3D8, TraceSurface8, Unknown, Value,
};

type Oracle = Arc<Mutex<Vec<String>>>;

// --- Mock real objects ---

struct MockSurface {
    me: Weak<MockSurface>,
    handle: u64,
    refs: AtomicU32,
    desc: SurfaceDesc,
    log: Oracle,
}

impl MockSurface {
    fn new(handle: u64, desc: SurfaceDesc, log: Oracle) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            handle,
            refs: AtomicU32::new(1),
            desc,
            log,
        })
    }

    fn arc(&self) -> Arc<MockSurface> {
        self.me.upgrade().expect("mock surface gone")
    }

    fn ref_count(&self) -> u32 {
        self.refs.load(Ordering::SeqCst)
    }
}

impl Unknown for MockSurface {
    fn raw_handle(&self) -> u64 {
        self.handle
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn add_ref(&self) -> u32 {
        self.refs.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release(&self) -> u32 {
        self.refs.fetch_sub(1, Ordering::SeqCst) - 1
    }

    fn query_interface(&self, iid: &Guid) -> Result<AnyInterface, HResult> {
        self.log.lock().push("Surface::QueryInterface".into());
        if *iid == IID_IDIRECT3DSURFACE8 || *iid == IID_IUNKNOWN {
            self.add_ref();
            Ok(AnyInterface::Surface8(self.arc()))
        } else if *iid == IID_IDIRECT3DRESOURCE8 {
            // A real interface this capture layer does not model.
            Ok(AnyInterface::Opaque(self.handle))
        } else {
            Err(HResult::NO_INTERFACE)
        }
    }
}

impl Direct3DSurface8 for MockSurface {
    fn get_desc(&self) -> Result<SurfaceDesc, HResult> {
        self.log.lock().push("Surface::GetDesc".into());
        Ok(self.desc)
    }

    fn lock_rect(&self, _rect: Option<Rect>, _flags: LockFlags) -> Result<LockedRect, HResult> {
        self.log.lock().push("Surface::LockRect".into());
        Ok(LockedRect {
            pitch: (self.desc.width * 4) as i32,
            bits: 0xBEEF,
        })
    }

    fn unlock_rect(&self) -> HResult {
        self.log.lock().push("Surface::UnlockRect".into());
        HResult::OK
    }
}

struct MockDevice {
    me: Weak<MockDevice>,
    handle: u64,
    refs: AtomicU32,
    parent: Weak<MockD3d>,
    back_buffer: Arc<MockSurface>,
    render_states: Mutex<HashMap<u32, u32>>,
    next_surface: AtomicU32,
    log: Oracle,
}

impl MockDevice {
    fn new(parent: &Arc<MockD3d>, log: Oracle) -> Arc<Self> {
        let desc = SurfaceDesc {
            format: Format(21),
            width: 640,
            height: 480,
            ..Default::default()
        };
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            handle: 0x2000,
            refs: AtomicU32::new(1),
            parent: Arc::downgrade(parent),
            back_buffer: MockSurface::new(0x3000, desc, Arc::clone(&log)),
            render_states: Mutex::new(HashMap::new()),
            next_surface: AtomicU32::new(0),
            log,
        })
    }

    fn arc(&self) -> Arc<MockDevice> {
        self.me.upgrade().expect("mock device gone")
    }
}

impl Unknown for MockDevice {
    fn raw_handle(&self) -> u64 {
        self.handle
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn add_ref(&self) -> u32 {
        self.refs.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release(&self) -> u32 {
        self.refs.fetch_sub(1, Ordering::SeqCst) - 1
    }

    fn query_interface(&self, iid: &Guid) -> Result<AnyInterface, HResult> {
        self.log.lock().push("Device::QueryInterface".into());
        if *iid == IID_IDIRECT3DDEVICE8 || *iid == IID_IUNKNOWN {
            self.add_ref();
            Ok(AnyInterface::Device8(self.arc()))
        } else {
            Err(HResult::NO_INTERFACE)
        }
    }
}

impl Direct3DDevice8 for MockDevice {
    fn test_cooperative_level(&self) -> HResult {
        self.log.lock().push("Device::TestCooperativeLevel".into());
        HResult::OK
    }

    fn get_available_texture_mem(&self) -> u32 {
        self.log.lock().push("Device::GetAvailableTextureMem".into());
        64 * 1024 * 1024
    }

    fn get_direct3d(&self) -> Result<Arc<dyn Direct3D8>, HResult> {
        self.log.lock().push("Device::GetDirect3D".into());
        let parent = self.parent.upgrade().ok_or(HResult::INVALID_CALL)?;
        parent.add_ref();
        Ok(parent)
    }

    fn get_display_mode(&self) -> Result<DisplayMode, HResult> {
        self.log.lock().push("Device::GetDisplayMode".into());
        Ok(DisplayMode {
            width: 640,
            height: 480,
            refresh_rate: 60,
            format: Format(21),
        })
    }

    fn create_additional_swap_chain(
        &self,
        _params: &mut PresentParameters,
    ) -> Result<Arc<dyn Direct3DSwapChain8>, HResult> {
        Err(HResult::NOT_AVAILABLE)
    }

    fn reset(&self, params: &mut PresentParameters) -> HResult {
        self.log.lock().push("Device::Reset".into());
        params.back_buffer_width = 640;
        params.back_buffer_height = 480;
        HResult::OK
    }

    fn present(
        &self,
        _source_rect: Option<Rect>,
        _dest_rect: Option<Rect>,
        _dest_window_override: WindowHandle,
    ) -> HResult {
        self.log.lock().push("Device::Present".into());
        HResult::OK
    }

    fn get_back_buffer(
        &self,
        back_buffer: u32,
        _kind: BackBufferType,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        self.log
            .lock()
            .push(format!("Device::GetBackBuffer({back_buffer})"));
        if back_buffer != 0 {
            return Err(HResult::INVALID_CALL);
        }
        self.back_buffer.add_ref();
        Ok(self.back_buffer.arc())
    }

    fn create_render_target(
        &self,
        width: u32,
        height: u32,
        format: Format,
        _multi_sample: u32,
        _lockable: bool,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        self.create_image_surface(width, height, format)
    }

    fn create_image_surface(
        &self,
        width: u32,
        height: u32,
        format: Format,
    ) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        self.log
            .lock()
            .push(format!("Device::CreateImageSurface({width}x{height})"));
        let n = self.next_surface.fetch_add(1, Ordering::SeqCst) as u64;
        let desc = SurfaceDesc {
            format,
            width,
            height,
            ..Default::default()
        };
        Ok(MockSurface::new(0x4000 + n * 0x10, desc, Arc::clone(&self.log)))
    }

    fn copy_rects(
        &self,
        source: &Arc<dyn Direct3DSurface8>,
        _source_rects: &[Rect],
        dest: &Arc<dyn Direct3DSurface8>,
        _dest_points: &[Point],
    ) -> HResult {
        self.log.lock().push(format!(
            "Device::CopyRects({:#x} -> {:#x})",
            source.raw_handle(),
            dest.raw_handle()
        ));
        HResult::OK
    }

    fn get_front_buffer(&self, dest: &Arc<dyn Direct3DSurface8>) -> HResult {
        self.log
            .lock()
            .push(format!("Device::GetFrontBuffer({:#x})", dest.raw_handle()));
        HResult::OK
    }

    fn set_render_target(
        &self,
        render_target: Option<Arc<dyn Direct3DSurface8>>,
        _new_z_stencil: Option<Arc<dyn Direct3DSurface8>>,
    ) -> HResult {
        let handle = render_target.map(|s| s.raw_handle()).unwrap_or(0);
        self.log
            .lock()
            .push(format!("Device::SetRenderTarget({handle:#x})"));
        HResult::OK
    }

    fn get_render_target(&self) -> Result<Arc<dyn Direct3DSurface8>, HResult> {
        self.log.lock().push("Device::GetRenderTarget".into());
        self.back_buffer.add_ref();
        Ok(self.back_buffer.arc())
    }

    fn begin_scene(&self) -> HResult {
        self.log.lock().push("Device::BeginScene".into());
        HResult::OK
    }

    fn end_scene(&self) -> HResult {
        self.log.lock().push("Device::EndScene".into());
        HResult::OK
    }

    fn clear(
        &self,
        _rects: &[D3dRect],
        _flags: ClearFlags,
        color: u32,
        _z: f32,
        stencil: u32,
    ) -> HResult {
        self.log
            .lock()
            .push(format!("Device::Clear({color}, {stencil})"));
        HResult::OK
    }

    fn set_transform(&self, _state: TransformState, _matrix: &Matrix) -> HResult {
        HResult::OK
    }

    fn get_transform(&self, _state: TransformState) -> Result<Matrix, HResult> {
        Ok(Matrix::default())
    }

    fn set_viewport(&self, _viewport: &Viewport) -> HResult {
        HResult::OK
    }

    fn get_viewport(&self) -> Result<Viewport, HResult> {
        Ok(Viewport::default())
    }

    fn set_render_state(&self, state: RenderState, value: u32) -> HResult {
        self.log
            .lock()
            .push(format!("Device::SetRenderState({}, {})", state.0, value));
        self.render_states.lock().insert(state.0, value);
        HResult::OK
    }

    fn get_render_state(&self, state: RenderState) -> Result<u32, HResult> {
        self.log
            .lock()
            .push(format!("Device::GetRenderState({})", state.0));
        Ok(self
            .render_states
            .lock()
            .get(&state.0)
            .copied()
            .unwrap_or(0))
    }
}

struct MockD3d {
    me: Weak<MockD3d>,
    handle: u64,
    refs: AtomicU32,
    log: Oracle,
}

impl MockD3d {
    fn new(log: Oracle) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            handle: 0x1000,
            refs: AtomicU32::new(1),
            log,
        })
    }

    fn arc(&self) -> Arc<MockD3d> {
        self.me.upgrade().expect("mock d3d gone")
    }
}

impl Unknown for MockD3d {
    fn raw_handle(&self) -> u64 {
        self.handle
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn add_ref(&self) -> u32 {
        self.refs.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release(&self) -> u32 {
        self.refs.fetch_sub(1, Ordering::SeqCst) - 1
    }

    fn query_interface(&self, iid: &Guid) -> Result<AnyInterface, HResult> {
        self.log.lock().push("D3d::QueryInterface".into());
        if *iid == IID_IDIRECT3D8 || *iid == IID_IUNKNOWN {
            self.add_ref();
            Ok(AnyInterface::Direct3D8(self.arc()))
        } else {
            Err(HResult::NO_INTERFACE)
        }
    }
}

impl Direct3D8 for MockD3d {
    fn get_adapter_count(&self) -> u32 {
        self.log.lock().push("D3d::GetAdapterCount".into());
        1
    }

    fn get_adapter_identifier(
        &self,
        adapter: u32,
        _flags: u32,
    ) -> Result<AdapterIdentifier, HResult> {
        self.log
            .lock()
            .push(format!("D3d::GetAdapterIdentifier({adapter})"));
        if adapter != 0 {
            return Err(HResult::INVALID_CALL);
        }
        Ok(AdapterIdentifier {
            driver: "mock.dll".into(),
            description: "Mock Adapter".into(),
            vendor_id: 0x10DE,
            device_id: 0x0001,
            sub_sys_id: 0,
            revision: 1,
        })
    }

    fn get_adapter_mode_count(&self, _adapter: u32) -> u32 {
        1
    }

    fn enum_adapter_modes(&self, adapter: u32, mode: u32) -> Result<DisplayMode, HResult> {
        if adapter != 0 || mode != 0 {
            return Err(HResult::INVALID_CALL);
        }
        self.get_adapter_display_mode(adapter)
    }

    fn get_adapter_display_mode(&self, adapter: u32) -> Result<DisplayMode, HResult> {
        self.log
            .lock()
            .push(format!("D3d::GetAdapterDisplayMode({adapter})"));
        if adapter != 0 {
            return Err(HResult::INVALID_CALL);
        }
        Ok(DisplayMode {
            width: 1024,
            height: 768,
            refresh_rate: 60,
            format: Format(22),
        })
    }

    fn check_device_type(
        &self,
        _adapter: u32,
        _check_type: DevType,
        _display_format: Format,
        _back_buffer_format: Format,
        _windowed: bool,
    ) -> HResult {
        self.log.lock().push("D3d::CheckDeviceType".into());
        HResult::OK
    }

    fn check_device_format(
        &self,
        _adapter: u32,
        _device_type: DevType,
        _adapter_format: Format,
        _usage: u32,
        _resource_type: ResourceType,
        _check_format: Format,
    ) -> HResult {
        HResult::OK
    }

    fn create_device(
        &self,
        adapter: u32,
        _device_type: DevType,
        _focus_window: WindowHandle,
        _behavior_flags: BehaviorFlags,
        params: &mut PresentParameters,
    ) -> Result<Arc<dyn Direct3DDevice8>, HResult> {
        self.log.lock().push(format!("D3d::CreateDevice({adapter})"));
        if adapter != 0 {
            return Err(HResult::INVALID_CALL);
        }
        params.back_buffer_width = 640;
        params.back_buffer_height = 480;
        Ok(MockDevice::new(&self.arc(), Arc::clone(&self.log)))
    }
}

// --- Harness ---

fn capture_context() -> (Arc<CaptureContext>, MemorySink) {
    let sink = MemorySink::new();
    let ctx = CaptureContext::new(Box::new(sink.clone()));
    ctx.open().unwrap();
    (ctx, sink)
}

fn wrapped_d3d(ctx: &Arc<CaptureContext>, log: &Oracle) -> (Arc<TraceDirect3D8>, Arc<MockD3d>) {
    let mock = MockD3d::new(Arc::clone(log));
    let wrapper = TraceDirect3D8::wrap_reuse(ctx, mock.arc());
    (wrapper, mock)
}

fn downcast_surface(surface: &Arc<dyn Direct3DSurface8>) -> Arc<TraceSurface8> {
    Arc::clone(surface)
        .as_any()
        .downcast::<TraceSurface8>()
        .expect("not a trace wrapper")
}

// --- Properties ---

/// Drive one fixed scenario against any implementation of the API surface
/// and collect every observable output.
fn drive_scenario(api: Arc<dyn Direct3D8>) -> Vec<String> {
    let mut seen = Vec::new();
    seen.push(api.get_adapter_count().to_string());

    let mode = api.get_adapter_display_mode(0).unwrap();
    seen.push(format!("{}x{}@{}", mode.width, mode.height, mode.refresh_rate));
    seen.push(format!("{:?}", api.get_adapter_display_mode(7).unwrap_err()));

    let mut params = PresentParameters::default();
    let device = api
        .create_device(
            0,
            DevType(1),
            0xFEED,
            BehaviorFlags::HARDWARE_VERTEXPROCESSING,
            &mut params,
        )
        .unwrap();
    seen.push(format!("{}x{}", params.back_buffer_width, params.back_buffer_height));
    seen.push(format!("{:?}", device.test_cooperative_level()));
    seen.push(device.get_available_texture_mem().to_string());

    let surface = device.get_back_buffer(0, BackBufferType(0)).unwrap();
    let desc = surface.get_desc().unwrap();
    seen.push(format!("{}x{} fmt={}", desc.width, desc.height, desc.format.0));
    seen.push(format!(
        "{:?}",
        device.get_back_buffer(3, BackBufferType(0)).err().unwrap()
    ));

    seen.push(format!("{:?}", device.set_render_state(RenderState(7), 1)));
    seen.push(device.get_render_state(RenderState(7)).unwrap().to_string());
    seen.push(format!("{:?}", device.begin_scene()));
    seen.push(format!(
        "{:?}",
        device.clear(&[], ClearFlags::TARGET, 0xFF00FF, 1.0, 0)
    ));
    seen.push(format!("{:?}", device.end_scene()));
    seen.push(format!("{:?}", device.present(None, None, 0)));

    seen.push(surface.release().to_string());
    seen.push(device.release().to_string());
    seen
}

#[test]
fn transparency_wrapper_matches_direct_use() {
    let direct_log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let direct = MockD3d::new(Arc::clone(&direct_log));
    let direct_out = drive_scenario(direct.arc());

    let wrapped_log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, _sink) = capture_context();
    let (wrapper, _mock) = wrapped_d3d(&ctx, &wrapped_log);
    let wrapped_out = drive_scenario(wrapper);

    assert_eq!(direct_out, wrapped_out);
    assert_eq!(*direct_log.lock(), *wrapped_log.lock());
}

#[test]
fn identity_stable_across_requery() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, _sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let mut params = PresentParameters::default();
    let device = d3d
        .create_device(0, DevType(1), 0, BehaviorFlags::empty(), &mut params)
        .unwrap();

    // The device hands back its parent; that must be the wrapper we
    // already hold, not a duplicate.
    let parent = device.get_direct3d().unwrap();
    let parent = Arc::clone(&parent)
        .as_any()
        .downcast::<TraceDirect3D8>()
        .unwrap();
    assert!(Arc::ptr_eq(&d3d, &parent));
    assert_eq!(parent.ref_count(), 2);

    // Re-query through QueryInterface as well.
    match device.query_interface(&IID_IDIRECT3DDEVICE8).unwrap() {
        AnyInterface::Device8(again) => {
            let again = Arc::clone(&again).as_any().downcast::<TraceDevice8>().unwrap();
            let device = Arc::clone(&device).as_any().downcast::<TraceDevice8>().unwrap();
            assert!(Arc::ptr_eq(&device, &again));
            assert_eq!(again.ref_count(), 2);
        }
        _ => panic!("expected a device interface"),
    }
}

#[test]
fn back_buffer_requery_returns_same_wrapper() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, _sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let mut params = PresentParameters::default();
    let device = d3d
        .create_device(0, DevType(1), 0, BehaviorFlags::empty(), &mut params)
        .unwrap();

    let first = device.get_back_buffer(0, BackBufferType(0)).unwrap();
    let second = device.get_back_buffer(0, BackBufferType(0)).unwrap();
    let first = downcast_surface(&first);
    let second = downcast_surface(&second);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.ref_count(), 2);
    assert_eq!(first.object_id(), second.object_id());
}

#[test]
fn release_destroys_wrapper_exactly_once() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, _sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let mut params = PresentParameters::default();
    let device = d3d
        .create_device(0, DevType(1), 0, BehaviorFlags::empty(), &mut params)
        .unwrap();
    let surface = device.get_back_buffer(0, BackBufferType(0)).unwrap();
    let wrapper = downcast_surface(&surface);
    assert_eq!(wrapper.ref_count(), 1);
    // Real count is 2: the device keeps its own internal reference.
    assert_eq!(surface.add_ref(), 3);
    assert_eq!(surface.add_ref(), 4);
    assert_eq!(wrapper.ref_count(), 3);

    assert_eq!(surface.release(), 3);
    assert_eq!(surface.release(), 2);
    assert_eq!(surface.release(), 1);
    assert_eq!(wrapper.ref_count(), 0);

    // Dead: re-querying the same real surface builds a fresh wrapper with
    // a new identity instead of resurrecting this one.
    let old_id = wrapper.object_id();
    let again = device.get_back_buffer(0, BackBufferType(0)).unwrap();
    let again = downcast_surface(&again);
    assert!(!Arc::ptr_eq(&wrapper, &again));
    assert_ne!(again.object_id(), old_id);

    // Over-release stays dead rather than wrapping around.
    surface.release();
    assert_eq!(wrapper.ref_count(), 0);
}

#[test]
fn no_double_wrap_under_concurrent_requests() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, _sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let mut params = PresentParameters::default();
    let device = d3d
        .create_device(0, DevType(1), 0, BehaviorFlags::empty(), &mut params)
        .unwrap();

    const THREADS: usize = 8;
    let barrier = Arc::new(Barrier::new(THREADS));
    let mut joins = Vec::new();
    for _ in 0..THREADS {
        let device = Arc::clone(&device);
        let barrier = Arc::clone(&barrier);
        joins.push(thread::spawn(move || {
            barrier.wait();
            device.get_back_buffer(0, BackBufferType(0)).unwrap()
        }));
    }

    let surfaces: Vec<_> = joins
        .into_iter()
        .map(|j| downcast_surface(&j.join().unwrap()))
        .collect();

    for surface in &surfaces[1..] {
        assert!(Arc::ptr_eq(&surfaces[0], surface));
    }
    assert_eq!(surfaces[0].ref_count(), THREADS as u32);
}

#[test]
fn concurrent_calls_record_atomic_blocks() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let mut params = PresentParameters::default();
    let device = d3d
        .create_device(0, DevType(1), 0, BehaviorFlags::empty(), &mut params)
        .unwrap();

    const THREADS: u32 = 4;
    const CALLS: u32 = 25;
    let barrier = Arc::new(Barrier::new(THREADS as usize));
    let mut joins = Vec::new();
    for t in 0..THREADS {
        let device = Arc::clone(&device);
        let barrier = Arc::clone(&barrier);
        joins.push(thread::spawn(move || {
            barrier.wait();
            for i in 0..CALLS {
                // Color and stencil always agree; a torn record would not.
                let marker = t * 1_000 + i;
                device.clear(&[], ClearFlags::TARGET, marker, 1.0, marker);
            }
        }));
    }
    for join in joins {
        join.join().unwrap();
    }

    ctx.close().unwrap();

    let doc = TraceDocument::parse(&sink.contents()).unwrap();
    let clears: Vec<_> = doc
        .calls
        .iter()
        .filter(|c| c.name == "IDirect3DDevice8::Clear")
        .collect();
    assert_eq!(clears.len(), (THREADS * CALLS) as usize);

    for clear in clears {
        let color = clear.args.iter().find(|a| a.name == "Color").unwrap();
        let stencil = clear.args.iter().find(|a| a.name == "Stencil").unwrap();
        assert_eq!(color.literal, stencil.literal, "torn record in call {}", clear.no);
        assert_eq!(clear.ret.as_ref().unwrap().literal, "D3D_OK");
    }
}

#[test]
fn teardown_closes_document_exactly_once() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    const CALLS: u64 = 5;
    for _ in 0..CALLS {
        d3d.get_adapter_count();
    }
    ctx.close().unwrap();
    ctx.close().unwrap();

    let doc = TraceDocument::parse(&sink.contents()).unwrap();
    assert_eq!(doc.calls.len(), CALLS as usize);
    assert_eq!(ctx.recorder().calls_written(), CALLS);

    // Nothing may be appended after the trailer.
    d3d.get_adapter_count();
    let reparsed = TraceDocument::parse(&sink.contents()).unwrap();
    assert_eq!(reparsed.calls.len(), CALLS as usize);
    assert_eq!(ctx.recorder().calls_written(), CALLS);
}

#[test]
fn wrapper_arguments_unwrap_to_real_handles() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, _sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let mut params = PresentParameters::default();
    let device = d3d
        .create_device(0, DevType(1), 0, BehaviorFlags::empty(), &mut params)
        .unwrap();
    let surface = device.get_back_buffer(0, BackBufferType(0)).unwrap();

    device.set_render_target(Some(Arc::clone(&surface)), None);

    // The mock must have seen its own surface, not the wrapper.
    let entries = log.lock();
    let entry = entries
        .iter()
        .find(|e| e.starts_with("Device::SetRenderTarget"))
        .unwrap();
    assert_eq!(entry, "Device::SetRenderTarget(0x3000)");
}

#[test]
fn unmodeled_interfaces_pass_through_opaque() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let mut params = PresentParameters::default();
    let device = d3d
        .create_device(0, DevType(1), 0, BehaviorFlags::empty(), &mut params)
        .unwrap();
    let surface = device.get_back_buffer(0, BackBufferType(0)).unwrap();

    match surface.query_interface(&IID_IDIRECT3DRESOURCE8).unwrap() {
        AnyInterface::Opaque(handle) => assert_eq!(handle, 0x3000),
        _ => panic!("expected opaque passthrough"),
    }

    // The record survives with the field marked opaque.
    ctx.close().unwrap();
    let doc = TraceDocument::parse(&sink.contents()).unwrap();
    let qi = doc
        .calls
        .iter()
        .find(|c| c.name == "IDirect3DSurface8::QueryInterface")
        .unwrap();
    let out = qi.outs.iter().find(|o| o.name == "ppvObj").unwrap();
    assert_eq!(out.type_tag, "opaque");
    assert_eq!(out.literal, "?");
}

#[test]
fn failed_queries_forward_error_and_still_record() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let bogus = Guid::new(0xDEAD_BEEF, 0, 0, [0; 8]);
    assert_eq!(
        d3d.query_interface(&bogus).err(),
        Some(HResult::NO_INTERFACE)
    );

    ctx.close().unwrap();
    let doc = TraceDocument::parse(&sink.contents()).unwrap();
    let qi = doc
        .calls
        .iter()
        .find(|c| c.name == "IDirect3D8::QueryInterface")
        .unwrap();
    assert_eq!(qi.ret.as_ref().unwrap().literal, "E_NOINTERFACE");
}

#[test]
fn trace_records_objects_by_stable_id() {
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    let mut params = PresentParameters::default();
    let device = d3d
        .create_device(0, DevType(1), 0, BehaviorFlags::empty(), &mut params)
        .unwrap();
    device.begin_scene();
    ctx.close().unwrap();

    let device = Arc::clone(&device).as_any().downcast::<TraceDevice8>().unwrap();
    let expected = format!("{:#x}", device.object_id());

    let doc = TraceDocument::parse(&sink.contents()).unwrap();
    let create = doc
        .calls
        .iter()
        .find(|c| c.name == "IDirect3D8::CreateDevice")
        .unwrap();
    let returned = create
        .outs
        .iter()
        .find(|o| o.name == "ppReturnedDeviceInterface")
        .unwrap();
    assert_eq!(returned.literal, expected);

    let begin = doc
        .calls
        .iter()
        .find(|c| c.name == "IDirect3DDevice8::BeginScene")
        .unwrap();
    assert_eq!(begin.args[0].name, "this");
    assert_eq!(begin.args[0].literal, expected);
}

#[test]
fn trace_value_encoding_is_symbolic() {
    let value = Format(21).to_value();
    assert_eq!(value, Value::Enum("D3DFMT_A8R8G8B8", 21));
    let log: Oracle = Arc::new(Mutex::new(Vec::new()));
    let (ctx, sink) = capture_context();
    let (d3d, _mock) = wrapped_d3d(&ctx, &log);

    d3d.check_device_type(0, DevType(1), Format(22), Format(21), true);
    ctx.close().unwrap();

    let doc = TraceDocument::parse(&sink.contents()).unwrap();
    let check = doc
        .calls
        .iter()
        .find(|c| c.name == "IDirect3D8::CheckDeviceType")
        .unwrap();
    let fmt = check.args.iter().find(|a| a.name == "DisplayFormat").unwrap();
    assert_eq!(fmt.literal, "D3DFMT_X8R8G8B8");
    let dev = check.args.iter().find(|a| a.name == "CheckType").unwrap();
    assert_eq!(dev.literal, "D3DDEVTYPE_HAL");
}
