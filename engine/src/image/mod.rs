//! Image acquisition — URI parsing, the source boundary, and the bundled
//! registry-backed implementation.

pub mod reference;
pub mod registry;
pub mod source;

pub use reference::ImageUri;
pub use registry::{RegistryAuth, RegistrySource};
pub use source::{ImageHandle, ImageSource, LayerBlob};
