//! Contains the layer table, area descriptors, export formats, Web Mercator math and the Overpass
//! client used to fetch layer features.

pub mod area;
pub mod format;
pub mod layer;
pub mod mercator;
pub mod overpass;

pub use area::{AreaDescriptor, AreaParams, AreaType};
pub use format::{BasemapStyle, ExportFormat};
pub use layer::{GeometryKind, Layer, LayerQuery, TagFilter, parse_layer_list, sort_layers};
pub use mercator::MercatorExtent;
pub use overpass::{FeatureSource, OverpassClient, OverpassResponse};
