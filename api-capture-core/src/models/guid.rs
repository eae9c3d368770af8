use std::fmt;

use uuid::Uuid;

/// A 128-bit COM interface identifier.
///
/// Laid out field-for-field like the Win32 `GUID` struct so pointers to it
/// can cross the FFI boundary directly (`REFIID` parameters).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

impl Guid {
    pub const fn new(data1: u32, data2: u16, data3: u16, data4: [u8; 8]) -> Self {
        Self {
            data1,
            data2,
            data3,
            data4,
        }
    }

    /// The canonical hyphenated form (lower-case hex, standard grouping).
    pub fn as_uuid(&self) -> Uuid {
        Uuid::from_fields(self.data1, self.data2, self.data3, &self.data4)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_uuid().hyphenated())
    }
}

pub const IID_IUNKNOWN: Guid = Guid::new(
    0x0000_0000,
    0x0000,
    0x0000,
    [0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46],
);
pub const IID_IDIRECT3D8: Guid = Guid::new(
    0x1DD9_E8DA,
    0x1C77,
    0x4D40,
    [0xB0, 0xCF, 0x98, 0xFE, 0xFD, 0xFF, 0x95, 0x12],
);
pub const IID_IDIRECT3DDEVICE8: Guid = Guid::new(
    0x7385_E5DF,
    0x8FE8,
    0x41D5,
    [0x86, 0xB6, 0xD7, 0xB4, 0x85, 0x47, 0xB6, 0xCF],
);
pub const IID_IDIRECT3DSWAPCHAIN8: Guid = Guid::new(
    0x928C_088B,
    0x76B9,
    0x4C6B,
    [0xA5, 0x36, 0xA5, 0x90, 0x85, 0x38, 0x76, 0xCD],
);
pub const IID_IDIRECT3DSURFACE8: Guid = Guid::new(
    0xB96E_EBCA,
    0xB326,
    0x4EA5,
    [0x88, 0x2F, 0x2F, 0xF5, 0xBA, 0xE0, 0x21, 0xDD],
);
pub const IID_IDIRECT3DRESOURCE8: Guid = Guid::new(
    0x1B36_BB7B,
    0x09B7,
    0x410A,
    [0xB4, 0x45, 0x7D, 0x14, 0x30, 0xD7, 0xB3, 0x3F],
);

/// The name table consulted before falling back to numeric formatting.
static WELL_KNOWN: &[(Guid, &str)] = &[
    (IID_IUNKNOWN, "IID_IUnknown"),
    (IID_IDIRECT3D8, "IID_IDirect3D8"),
    (IID_IDIRECT3DDEVICE8, "IID_IDirect3DDevice8"),
    (IID_IDIRECT3DSWAPCHAIN8, "IID_IDirect3DSwapChain8"),
    (IID_IDIRECT3DSURFACE8, "IID_IDirect3DSurface8"),
    (IID_IDIRECT3DRESOURCE8, "IID_IDirect3DResource8"),
];

/// Symbolic name for a well-known identifier, if the table knows it.
pub fn well_known_name(guid: &Guid) -> Option<&'static str> {
    WELL_KNOWN
        .iter()
        .find(|(known, _)| known == guid)
        .map(|(_, name)| *name)
}

/// Name for any identifier: the symbolic name when known, otherwise the
/// canonical `uuid(...)` fallback so unrecognized ids never fail to format.
pub fn name_for(guid: &Guid) -> String {
    match well_known_name(guid) {
        Some(name) => name.to_owned(),
        None => format!("uuid({guid})"),
    }
}
