/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */
#![allow(unused)]

//! Sentinel-2 true-color image acquisition for areas of interest (AOIs).
//!
//! For each AOI we search a STAC catalog for low cloud cover tiles, keep the acquisition days whose
//! tiles fully cover the AOI, mosaic and crop the red/green/blue bands of these tiles, resample to the
//! target resolution and export a GeoTIFF, a display JPEG and a metadata document per day.

mod errors;
pub use errors::*;

pub mod config;
pub mod aoi;
pub mod catalog;
pub mod assets;
pub mod coverage;
pub mod selection;
pub mod loader;
pub mod normalize;
pub mod export;
pub mod metadata;
pub mod pipeline;

pub use config::{load_config, TrueColorConfig};
pub use aoi::Aoi;
pub use catalog::{Catalog, ImageTile, StacCatalog};
pub use assets::{AssetOpener, HttpAssetOpener};
pub use pipeline::{run, PipelineContext, RunOptions, RunSummary};
