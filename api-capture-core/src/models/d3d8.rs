//! Data types of the wrapped Direct3D 8 surface.
//!
//! These mirror the shapes the real API moves across its method boundaries,
//! in Rust form. Every type knows how to encode itself as a trace [`Value`]
//! with symbolic names for the constants a reader would want spelled out.

use super::value::Value;

/// Window handle passed through verbatim; the capture layer never
/// dereferences it.
pub type WindowHandle = u64;

/// HRESULT-style status code returned by most wrapped methods.
///
/// Kept as the raw 32-bit value so forwarding never loses information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HResult(pub i32);

impl HResult {
    pub const OK: HResult = HResult(0);
    pub const DEVICE_LOST: HResult = HResult(0x8876_0868_u32 as i32);
    pub const NOT_AVAILABLE: HResult = HResult(0x8876_086A_u32 as i32);
    pub const INVALID_CALL: HResult = HResult(0x8876_086C_u32 as i32);
    pub const OUT_OF_VIDEO_MEMORY: HResult = HResult(0x8876_017C_u32 as i32);
    pub const NO_INTERFACE: HResult = HResult(0x8000_4002_u32 as i32);

    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Self::OK => Some("D3D_OK"),
            Self::DEVICE_LOST => Some("D3DERR_DEVICELOST"),
            Self::NOT_AVAILABLE => Some("D3DERR_NOTAVAILABLE"),
            Self::INVALID_CALL => Some("D3DERR_INVALIDCALL"),
            Self::OUT_OF_VIDEO_MEMORY => Some("D3DERR_OUTOFVIDEOMEMORY"),
            Self::NO_INTERFACE => Some("E_NOINTERFACE"),
            _ => None,
        }
    }

    pub fn to_value(self) -> Value {
        match self.symbol() {
            Some(name) => Value::Enum(name, self.0 as i64),
            None => Value::SInt(self.0 as i64),
        }
    }
}

macro_rules! named_constant {
    ($(#[$attr:meta])* $name:ident { $($value:literal => $symbol:ident),+ $(,)? }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub u32);

        impl $name {
            pub fn symbol(self) -> Option<&'static str> {
                match self.0 {
                    $($value => Some(stringify!($symbol)),)+
                    _ => None,
                }
            }

            pub fn to_value(self) -> Value {
                match self.symbol() {
                    Some(name) => Value::Enum(name, self.0 as i64),
                    None => Value::UInt(self.0 as u64),
                }
            }
        }
    };
}

named_constant! {
    /// `D3DFORMAT` surface/pixel format.
    Format {
        0 => D3DFMT_UNKNOWN,
        20 => D3DFMT_R8G8B8,
        21 => D3DFMT_A8R8G8B8,
        22 => D3DFMT_X8R8G8B8,
        23 => D3DFMT_R5G6B5,
        24 => D3DFMT_X1R5G5B5,
        25 => D3DFMT_A1R5G5B5,
        26 => D3DFMT_A4R4G4B4,
        70 => D3DFMT_D16_LOCKABLE,
        71 => D3DFMT_D32,
        73 => D3DFMT_D15S1,
        75 => D3DFMT_D24S8,
        80 => D3DFMT_D16,
    }
}

impl Default for Format {
    fn default() -> Self {
        Format(0)
    }
}

named_constant! {
    /// `D3DDEVTYPE` device driver type.
    DevType {
        1 => D3DDEVTYPE_HAL,
        2 => D3DDEVTYPE_REF,
        3 => D3DDEVTYPE_SW,
    }
}

named_constant! {
    /// `D3DPOOL` resource memory class.
    Pool {
        0 => D3DPOOL_DEFAULT,
        1 => D3DPOOL_MANAGED,
        2 => D3DPOOL_SYSTEMMEM,
        3 => D3DPOOL_SCRATCH,
    }
}

impl Default for Pool {
    fn default() -> Self {
        Pool(0)
    }
}

named_constant! {
    /// `D3DRESOURCETYPE`.
    ResourceType {
        1 => D3DRTYPE_SURFACE,
        2 => D3DRTYPE_VOLUME,
        3 => D3DRTYPE_TEXTURE,
        4 => D3DRTYPE_VOLUMETEXTURE,
        5 => D3DRTYPE_CUBETEXTURE,
        6 => D3DRTYPE_VERTEXBUFFER,
        7 => D3DRTYPE_INDEXBUFFER,
    }
}

impl Default for ResourceType {
    fn default() -> Self {
        ResourceType(1)
    }
}

named_constant! {
    /// `D3DSWAPEFFECT`.
    SwapEffect {
        1 => D3DSWAPEFFECT_DISCARD,
        2 => D3DSWAPEFFECT_FLIP,
        3 => D3DSWAPEFFECT_COPY,
        4 => D3DSWAPEFFECT_COPY_VSYNC,
    }
}

named_constant! {
    /// `D3DBACKBUFFER_TYPE`.
    BackBufferType {
        0 => D3DBACKBUFFER_TYPE_MONO,
        1 => D3DBACKBUFFER_TYPE_LEFT,
        2 => D3DBACKBUFFER_TYPE_RIGHT,
    }
}

named_constant! {
    /// `D3DTRANSFORMSTATETYPE`. WORLD is the common alias for index 256.
    TransformState {
        2 => D3DTS_VIEW,
        3 => D3DTS_PROJECTION,
        16 => D3DTS_TEXTURE0,
        256 => D3DTS_WORLD,
    }
}

named_constant! {
    /// `D3DRENDERSTATETYPE`, the handful a trace reader meets constantly.
    RenderState {
        7 => D3DRS_ZENABLE,
        8 => D3DRS_FILLMODE,
        9 => D3DRS_SHADEMODE,
        19 => D3DRS_SRCBLEND,
        20 => D3DRS_DESTBLEND,
        22 => D3DRS_CULLMODE,
        27 => D3DRS_ALPHABLENDENABLE,
        137 => D3DRS_LIGHTING,
        139 => D3DRS_AMBIENT,
    }
}

bitflags::bitflags! {
    /// `D3DCLEAR_*` flags for `Clear`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        const TARGET = 0x1;
        const ZBUFFER = 0x2;
        const STENCIL = 0x4;
    }

    /// `D3DCREATE_*` behavior flags for `CreateDevice`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BehaviorFlags: u32 {
        const FPU_PRESERVE = 0x2;
        const MULTITHREADED = 0x4;
        const PUREDEVICE = 0x10;
        const SOFTWARE_VERTEXPROCESSING = 0x20;
        const HARDWARE_VERTEXPROCESSING = 0x40;
        const MIXED_VERTEXPROCESSING = 0x80;
        const DISABLE_DRIVER_MANAGEMENT = 0x100;
    }

    /// `D3DLOCK_*` flags for `LockRect`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LockFlags: u32 {
        const READONLY = 0x10;
        const NOSYSLOCK = 0x800;
        const NOOVERWRITE = 0x1000;
        const DISCARD = 0x2000;
        const NO_DIRTY_UPDATE = 0x8000;
    }
}

fn flags_value<F>(flags: F) -> Value
where
    F: bitflags::Flags<Bits = u32> + Copy,
{
    let mut names = Vec::new();
    let mut residue = flags;
    for named in F::FLAGS {
        if flags.contains(*named.value()) {
            names.push(named.name());
            residue.remove(*named.value());
        }
    }
    Value::Flags {
        bits: residue.bits() as u64,
        names,
    }
}

impl ClearFlags {
    pub fn to_value(self) -> Value {
        flags_value(self)
    }
}

impl BehaviorFlags {
    pub fn to_value(self) -> Value {
        flags_value(self)
    }
}

impl LockFlags {
    pub fn to_value(self) -> Value {
        flags_value(self)
    }
}

/// `RECT`, screen-space edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("left", Value::SInt(self.left as i64)),
            ("top", Value::SInt(self.top as i64)),
            ("right", Value::SInt(self.right as i64)),
            ("bottom", Value::SInt(self.bottom as i64)),
        ])
    }
}

/// `POINT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("x", Value::SInt(self.x as i64)),
            ("y", Value::SInt(self.y as i64)),
        ])
    }
}

/// `D3DRECT`, the clear-rectangle variant with corner coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct D3dRect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl D3dRect {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("x1", Value::SInt(self.x1 as i64)),
            ("y1", Value::SInt(self.y1 as i64)),
            ("x2", Value::SInt(self.x2 as i64)),
            ("y2", Value::SInt(self.y2 as i64)),
        ])
    }
}

/// `D3DDISPLAYMODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub refresh_rate: u32,
    pub format: Format,
}

impl DisplayMode {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("Width", Value::UInt(self.width as u64)),
            ("Height", Value::UInt(self.height as u64)),
            ("RefreshRate", Value::UInt(self.refresh_rate as u64)),
            ("Format", self.format.to_value()),
        ])
    }
}

/// `D3DPRESENT_PARAMETERS`. In and out for `CreateDevice`/`Reset`: the
/// driver rewrites fields like the back buffer size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PresentParameters {
    pub back_buffer_width: u32,
    pub back_buffer_height: u32,
    pub back_buffer_format: Format,
    pub back_buffer_count: u32,
    pub multi_sample_type: u32,
    pub swap_effect: SwapEffect,
    pub device_window: WindowHandle,
    pub windowed: bool,
    pub enable_auto_depth_stencil: bool,
    pub auto_depth_stencil_format: Format,
    pub flags: u32,
    pub full_screen_refresh_rate_in_hz: u32,
    pub full_screen_presentation_interval: u32,
}

impl Default for PresentParameters {
    fn default() -> Self {
        Self {
            back_buffer_width: 0,
            back_buffer_height: 0,
            back_buffer_format: Format(0),
            back_buffer_count: 1,
            multi_sample_type: 0,
            swap_effect: SwapEffect(1),
            device_window: 0,
            windowed: true,
            enable_auto_depth_stencil: false,
            auto_depth_stencil_format: Format(0),
            flags: 0,
            full_screen_refresh_rate_in_hz: 0,
            full_screen_presentation_interval: 0,
        }
    }
}

impl PresentParameters {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("BackBufferWidth", Value::UInt(self.back_buffer_width as u64)),
            (
                "BackBufferHeight",
                Value::UInt(self.back_buffer_height as u64),
            ),
            ("BackBufferFormat", self.back_buffer_format.to_value()),
            ("BackBufferCount", Value::UInt(self.back_buffer_count as u64)),
            ("MultiSampleType", Value::UInt(self.multi_sample_type as u64)),
            ("SwapEffect", self.swap_effect.to_value()),
            ("hDeviceWindow", Value::Handle(self.device_window)),
            ("Windowed", Value::Bool(self.windowed)),
            (
                "EnableAutoDepthStencil",
                Value::Bool(self.enable_auto_depth_stencil),
            ),
            (
                "AutoDepthStencilFormat",
                self.auto_depth_stencil_format.to_value(),
            ),
            ("Flags", Value::UInt(self.flags as u64)),
            (
                "FullScreen_RefreshRateInHz",
                Value::UInt(self.full_screen_refresh_rate_in_hz as u64),
            ),
            (
                "FullScreen_PresentationInterval",
                Value::UInt(self.full_screen_presentation_interval as u64),
            ),
        ])
    }
}

/// `D3DSURFACE_DESC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceDesc {
    pub format: Format,
    pub resource_type: ResourceType,
    pub usage: u32,
    pub pool: Pool,
    pub size: u32,
    pub multi_sample_type: u32,
    pub width: u32,
    pub height: u32,
}

impl SurfaceDesc {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("Format", self.format.to_value()),
            ("Type", self.resource_type.to_value()),
            ("Usage", Value::UInt(self.usage as u64)),
            ("Pool", self.pool.to_value()),
            ("Size", Value::UInt(self.size as u64)),
            ("MultiSampleType", Value::UInt(self.multi_sample_type as u64)),
            ("Width", Value::UInt(self.width as u64)),
            ("Height", Value::UInt(self.height as u64)),
        ])
    }
}

/// `D3DADAPTER_IDENTIFIER8`, trimmed to the fields with trace value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdapterIdentifier {
    pub driver: String,
    pub description: String,
    pub vendor_id: u32,
    pub device_id: u32,
    pub sub_sys_id: u32,
    pub revision: u32,
}

impl AdapterIdentifier {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("Driver", Value::Str(self.driver.clone())),
            ("Description", Value::Str(self.description.clone())),
            ("VendorId", Value::UInt(self.vendor_id as u64)),
            ("DeviceId", Value::UInt(self.device_id as u64)),
            ("SubSysId", Value::UInt(self.sub_sys_id as u64)),
            ("Revision", Value::UInt(self.revision as u64)),
        ])
    }
}

/// `D3DVIEWPORT8`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub min_z: f32,
    pub max_z: f32,
}

impl Viewport {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("X", Value::UInt(self.x as u64)),
            ("Y", Value::UInt(self.y as u64)),
            ("Width", Value::UInt(self.width as u64)),
            ("Height", Value::UInt(self.height as u64)),
            ("MinZ", Value::Float(self.min_z as f64)),
            ("MaxZ", Value::Float(self.max_z as f64)),
        ])
    }
}

/// `D3DMATRIX`, row-major 4x4.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Matrix(pub [[f32; 4]; 4]);

impl Matrix {
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.0
                .iter()
                .flatten()
                .map(|&m| Value::Float(m as f64))
                .collect(),
        )
    }
}

/// `D3DLOCKED_RECT`. The mapped memory is reported by address only; the
/// capture layer does not shadow locked contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockedRect {
    pub pitch: i32,
    pub bits: u64,
}

impl LockedRect {
    pub fn to_value(&self) -> Value {
        Value::Struct(vec![
            ("Pitch", Value::SInt(self.pitch as i64)),
            ("pBits", Value::Handle(self.bits)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hresult_success_and_symbols() {
        assert!(HResult::OK.is_success());
        assert!(!HResult::INVALID_CALL.is_success());
        assert_eq!(HResult::DEVICE_LOST.symbol(), Some("D3DERR_DEVICELOST"));
        assert_eq!(HResult(1).symbol(), None);
        assert!(HResult(1).is_success());
    }

    #[test]
    fn named_constants_fall_back_to_numbers() {
        assert_eq!(Format(21).to_value(), Value::Enum("D3DFMT_A8R8G8B8", 21));
        assert_eq!(Format(9999).to_value(), Value::UInt(9999));
    }

    #[test]
    fn clear_flags_encode_names_and_residue() {
        let flags = ClearFlags::TARGET | ClearFlags::ZBUFFER;
        match flags.to_value() {
            Value::Flags { bits, names } => {
                assert_eq!(bits, 0);
                assert_eq!(names, vec!["TARGET", "ZBUFFER"]);
            }
            other => panic!("unexpected encoding: {other:?}"),
        }
    }

    #[test]
    fn unnamed_flag_bits_survive() {
        let flags = ClearFlags::from_bits_retain(0x1 | 0x100);
        match flags.to_value() {
            Value::Flags { bits, names } => {
                assert_eq!(bits, 0x100);
                assert_eq!(names, vec!["TARGET"]);
            }
            other => panic!("unexpected encoding: {other:?}"),
        }
    }
}
