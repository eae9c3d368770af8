mod d3d8;
mod unknown;

pub use d3d8::{Direct3D8, Direct3DDevice8, Direct3DSurface8, Direct3DSwapChain8};
pub use unknown::{RawHandle, Unknown};

use std::sync::Arc;

use crate::models::guid::{self, Guid};

/// Discriminator for the wrapped interface variants; one half of an
/// identity-registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterfaceTag {
    Direct3D8,
    Device8,
    SwapChain8,
    Surface8,
}

impl InterfaceTag {
    pub fn interface_name(self) -> &'static str {
        match self {
            InterfaceTag::Direct3D8 => "IDirect3D8",
            InterfaceTag::Device8 => "IDirect3DDevice8",
            InterfaceTag::SwapChain8 => "IDirect3DSwapChain8",
            InterfaceTag::Surface8 => "IDirect3DSurface8",
        }
    }

    /// The tag an interface id resolves to, if the capture layer models it.
    pub fn from_iid(iid: &Guid) -> Option<Self> {
        match *iid {
            guid::IID_IDIRECT3D8 => Some(InterfaceTag::Direct3D8),
            guid::IID_IDIRECT3DDEVICE8 => Some(InterfaceTag::Device8),
            guid::IID_IDIRECT3DSWAPCHAIN8 => Some(InterfaceTag::SwapChain8),
            guid::IID_IDIRECT3DSURFACE8 => Some(InterfaceTag::Surface8),
            _ => None,
        }
    }
}

/// An interface pointer of dynamic type, as produced by `QueryInterface`.
///
/// `Opaque` carries the raw handle of an interface the capture layer does
/// not model; it is passed through unchanged rather than fabricated.
pub enum AnyInterface {
    Direct3D8(Arc<dyn Direct3D8>),
    Device8(Arc<dyn Direct3DDevice8>),
    SwapChain8(Arc<dyn Direct3DSwapChain8>),
    Surface8(Arc<dyn Direct3DSurface8>),
    Opaque(RawHandle),
}

impl AnyInterface {
    pub fn tag(&self) -> Option<InterfaceTag> {
        match self {
            AnyInterface::Direct3D8(_) => Some(InterfaceTag::Direct3D8),
            AnyInterface::Device8(_) => Some(InterfaceTag::Device8),
            AnyInterface::SwapChain8(_) => Some(InterfaceTag::SwapChain8),
            AnyInterface::Surface8(_) => Some(InterfaceTag::Surface8),
            AnyInterface::Opaque(_) => None,
        }
    }

    pub fn raw_handle(&self) -> RawHandle {
        match self {
            AnyInterface::Direct3D8(o) => o.raw_handle(),
            AnyInterface::Device8(o) => o.raw_handle(),
            AnyInterface::SwapChain8(o) => o.raw_handle(),
            AnyInterface::Surface8(o) => o.raw_handle(),
            AnyInterface::Opaque(handle) => *handle,
        }
    }
}
