//! Hardware rendering negotiation types and context lifetime tracking.
//!
//! Rendering APIs stay opaque: a core asks for a context type, the frontend
//! creates it and hands out an interface tied to one context generation.

use thiserror::Error;

/// Graphics API a core asks for (`SET_HW_RENDER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum HwContextType {
    /// No hardware context.
    #[default]
    None = 0,
    /// Compatibility-profile OpenGL.
    OpenGl = 1,
    /// OpenGL ES 2.0.
    OpenGles2 = 2,
    /// Core-profile OpenGL with an explicit version.
    OpenGlCore = 3,
    /// OpenGL ES 3.0.
    OpenGles3 = 4,
    /// OpenGL ES with an explicit version.
    OpenGlesVersion = 5,
    /// Vulkan.
    Vulkan = 6,
    /// Direct3D with an explicit version.
    Direct3D = 7,
}

impl HwContextType {
    /// Converts a wire value.
    #[must_use]
    pub const fn from_u32(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::OpenGl),
            2 => Some(Self::OpenGles2),
            3 => Some(Self::OpenGlCore),
            4 => Some(Self::OpenGles3),
            5 => Some(Self::OpenGlesVersion),
            6 => Some(Self::Vulkan),
            7 => Some(Self::Direct3D),
            _ => None,
        }
    }

    /// Returns `true` for the OpenGL family.
    #[must_use]
    pub const fn is_gl(self) -> bool {
        matches!(
            self,
            Self::OpenGl
                | Self::OpenGles2
                | Self::OpenGlCore
                | Self::OpenGles3
                | Self::OpenGlesVersion
        )
    }

    /// Returns `true` when the version fields of the request are meaningful.
    #[must_use]
    pub const fn uses_version(self) -> bool {
        matches!(
            self,
            Self::OpenGlCore | Self::OpenGlesVersion | Self::Direct3D | Self::Vulkan
        )
    }

    /// Interface kind `GET_HW_RENDER_INTERFACE` returns for this context.
    #[must_use]
    pub const fn interface_kind(self, version_major: u32) -> Option<HwRenderInterfaceKind> {
        match (self, version_major) {
            (Self::Vulkan, _) => Some(HwRenderInterfaceKind::Vulkan),
            (Self::Direct3D, 9) => Some(HwRenderInterfaceKind::D3D9),
            (Self::Direct3D, 10) => Some(HwRenderInterfaceKind::D3D10),
            (Self::Direct3D, 11) => Some(HwRenderInterfaceKind::D3D11),
            (Self::Direct3D, 12) => Some(HwRenderInterfaceKind::D3D12),
            _ => None,
        }
    }
}

/// Context request (`SET_HW_RENDER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct HwRenderRequest {
    /// Requested API.
    pub context_type: HwContextType,
    /// Major version for versioned context types.
    pub version_major: u32,
    /// Minor version for versioned context types.
    pub version_minor: u32,
    /// Attach a depth buffer.
    pub depth: bool,
    /// Attach a stencil buffer; ignored without `depth`.
    pub stencil: bool,
    /// Framebuffer origin is bottom-left.
    pub bottom_left_origin: bool,
    /// Frontend should avoid context resets where it can.
    pub cache_context: bool,
    /// Request a debug context.
    pub debug_context: bool,
}

impl HwRenderRequest {
    /// Returns `true` when a packed depth/stencil buffer is attached.
    #[must_use]
    pub const fn packed_depth_stencil(&self) -> bool {
        self.depth && self.stencil
    }
}

/// API-specific interface kinds (`GET_HW_RENDER_INTERFACE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u32)]
pub enum HwRenderInterfaceKind {
    #[allow(missing_docs)]
    Vulkan = 0,
    #[allow(missing_docs)]
    D3D9 = 1,
    #[allow(missing_docs)]
    D3D10 = 2,
    #[allow(missing_docs)]
    D3D11 = 3,
    #[allow(missing_docs)]
    D3D12 = 4,
    /// PlayStation 2 GS kit.
    GsKitPs2 = 5,
}

/// Proof that an interface was issued for one context generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextLease {
    generation: u64,
}

impl ContextLease {
    /// Context generation the lease belongs to.
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.generation
    }
}

/// Interface returned by `GET_HW_RENDER_INTERFACE`.
///
/// Valid until the context it was issued for is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HwRenderInterface {
    /// API family.
    pub kind: HwRenderInterfaceKind,
    /// Interface revision.
    pub version: u32,
    /// Context generation the interface is bound to.
    pub lease: ContextLease,
}

/// Context negotiation (`SET_HW_RENDER_CONTEXT_NEGOTIATION_INTERFACE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct HwRenderContextNegotiation {
    /// API family; only Vulkan defines one.
    pub kind: HwRenderInterfaceKind,
    /// Negotiation interface revision.
    pub version: u32,
}

/// Hardware context lifetime errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum HwRenderError {
    /// No context exists.
    #[error("no hardware context is alive")]
    NoContext,
    /// Interface used after its context was destroyed.
    #[error("interface from context generation {lease} used after reset to generation {current}")]
    StaleInterface {
        /// Generation the interface was issued for.
        lease: u64,
        /// Current generation.
        current: u64,
    },
}

/// Frontend-side tracker of the negotiated context.
#[derive(Debug, Clone, Default)]
pub struct HwContext {
    request: Option<HwRenderRequest>,
    generation: u64,
    alive: bool,
}

impl HwContext {
    /// Tracker with no accepted request.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            request: None,
            generation: 0,
            alive: false,
        }
    }

    /// Stores the accepted request.
    pub fn accept(&mut self, request: HwRenderRequest) {
        self.request = Some(request);
    }

    /// Accepted request, if any.
    #[must_use]
    pub const fn request(&self) -> Option<&HwRenderRequest> {
        self.request.as_ref()
    }

    /// Creates or recreates the context and returns the new lease.
    pub fn reset(&mut self) -> ContextLease {
        self.generation = self.generation.wrapping_add(1);
        self.alive = true;
        ContextLease {
            generation: self.generation,
        }
    }

    /// Destroys the context; every issued lease becomes stale.
    pub fn destroy(&mut self) {
        self.alive = false;
    }

    /// Returns `true` while a context exists.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Interface for the live context, when the request names a kind.
    #[must_use]
    pub fn interface(&self) -> Option<HwRenderInterface> {
        if !self.alive {
            return None;
        }
        let request = self.request?;
        let kind = request.context_type.interface_kind(request.version_major)?;
        Some(HwRenderInterface {
            kind,
            version: 1,
            lease: ContextLease {
                generation: self.generation,
            },
        })
    }

    /// Verifies that `lease` belongs to the live context.
    ///
    /// # Errors
    ///
    /// Returns [`HwRenderError::NoContext`] when no context is alive and
    /// [`HwRenderError::StaleInterface`] when the lease predates the current
    /// context.
    pub const fn check_lease(&self, lease: ContextLease) -> Result<(), HwRenderError> {
        if !self.alive {
            return Err(HwRenderError::NoContext);
        }
        if lease.generation != self.generation {
            return Err(HwRenderError::StaleInterface {
                lease: lease.generation,
                current: self.generation,
            });
        }
        Ok(())
    }
}
