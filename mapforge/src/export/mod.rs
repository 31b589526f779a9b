//! The download pipeline: validate the request, fetch every layer, then either draw a map or
//! package the layers as vector files in a zip archive.

pub mod archive;
mod error;
mod exporter;
mod request;

pub use error::{ExportError, NO_DATA_MESSAGE, format_error_chain};
pub use exporter::{ExportArtifact, Exporter};
pub use request::{DownloadParams, DownloadRequest};
