//! GfxTrace Service - Entities exchanged with the trace service
//!
//! Each entity is a codec type from `gfxtrace-rpclib`. Call
//! [`register_all`] once at startup so objects can be decoded by type key.

pub mod atom;
pub mod context;
pub mod hierarchy;
pub mod id;
pub mod image;
pub mod path;
pub mod stringtable;
pub mod wireframe;

use gfxtrace_rpclib::{BinaryClass, Namespace, Result};
use tracing::debug;

pub use atom::Range;
pub use context::Context;
pub use hierarchy::{Hierarchy, HierarchyList};
pub use id::{ApiID, CaptureID, ContextID};
pub use image::{FmtAtcRgbaInterpolatedAlphaAmd, FmtRgba};
pub use path::{CapturePath, ContextPath, ContextsPath, Path};
pub use stringtable::{node_string, Block, Formatter, Parameter, Text, Truncate};
pub use wireframe::WireframeMode;

/// Every class defined by this crate
pub fn classes() -> [&'static BinaryClass; 13] {
    [
        &atom::RANGE_CLASS,
        &context::CONTEXT_CLASS,
        &hierarchy::HIERARCHY_CLASS,
        &hierarchy::HIERARCHY_LIST_CLASS,
        &stringtable::TEXT_CLASS,
        &stringtable::PARAMETER_CLASS,
        &stringtable::BLOCK_CLASS,
        &stringtable::TRUNCATE_CLASS,
        &path::CAPTURE_PATH_CLASS,
        &path::CONTEXTS_PATH_CLASS,
        &path::CONTEXT_PATH_CLASS,
        &image::FMT_RGBA_CLASS,
        &image::FMT_ATC_RGBA_INTERPOLATED_ALPHA_AMD_CLASS,
    ]
}

/// Register every service entity in the global namespace
///
/// Safe to call more than once.
pub fn register_all() -> Result<()> {
    register_into(Namespace::global())
}

/// Register every service entity in `namespace`
pub fn register_into(namespace: &Namespace) -> Result<()> {
    namespace.register_all(&classes())?;
    debug!("Registered {} service entities", classes().len());
    Ok(())
}
