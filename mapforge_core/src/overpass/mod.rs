//! Fetching layer features from the Overpass API.

mod client;
mod query;
mod response;

pub use client::*;
pub use query::*;
pub use response::*;

use crate::{area::AreaDescriptor, layer::Layer};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Something that can deliver the raw OSM elements of a layer inside an area.
#[async_trait]
pub trait FeatureSource: Debug + Send + Sync {
	async fn fetch(&self, layer: &Layer, area: &AreaDescriptor) -> Result<OverpassResponse>;
}
