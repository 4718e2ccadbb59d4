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

//! typed configuration of a true-color acquisition run, loaded from a RON file

use std::{path::{Path, PathBuf}, time::Duration};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use truecolor_common::{datetime::{deserialize_duration, secs, serialize_duration}, ron::load_ron_file};
use truecolor_raster::geotiff::GeoTiffCompression;

use crate::errors::{config_error, Result};

/// default location of the config file, relative to the working dir
pub const DEFAULT_CONFIG_PATH: &str = "configs/truecolor_s2.ron";

#[derive(Debug,Clone,Default,Serialize,Deserialize)]
pub struct TrueColorConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub sentinel2: Sentinel2Config,

    #[serde(default)]
    pub bands: BandMapping,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    /// AOIs that are read from GeoJSON files
    #[serde(default)]
    pub vector_aois: Vec<VectorAoiConfig>,

    /// square AOIs around point coordinates
    #[serde(default)]
    pub coordinate_aois: Option<CoordinateAoiConfig>,
}

impl TrueColorConfig {
    /// reject values that would only fail later (during processing)
    pub fn validate (&self)->Result<()> {
        self.catalog.validate()?;
        self.sentinel2.validate()?;
        self.bands.validate()?;
        self.output.validate()?;
        self.retry.validate()?;

        for v in &self.vector_aois { v.validate()? }
        if let Some(c) = &self.coordinate_aois { c.validate()? }

        Ok(())
    }
}

/// STAC catalog and asset signing endpoints
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub url: String,
    pub collection: String,

    /// SAS token endpoint used to sign asset hrefs (None for public hrefs)
    pub sas_url: Option<String>,

    /// items per search page
    pub page_size: usize,

    /// upper limit for items per search (all pages)
    pub max_items: Option<usize>,

    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default()->Self {
        CatalogConfig {
            url: "https://planetarycomputer.microsoft.com/api/stac/v1".to_string(),
            collection: "sentinel-2-l2a".to_string(),
            sas_url: Some("https://planetarycomputer.microsoft.com/api/sas/v1/token".to_string()),
            page_size: 100,
            max_items: None,
            timeout: secs(120),
        }
    }
}

impl CatalogConfig {
    fn validate (&self)->Result<()> {
        if self.url.is_empty() { return Err( config_error("empty catalog url")) }
        if self.collection.is_empty() { return Err( config_error("empty catalog collection")) }
        if self.page_size == 0 { return Err( config_error("catalog page_size has to be > 0")) }
        if let Some(0) = self.max_items { return Err( config_error("catalog max_items has to be > 0")) }
        Ok(())
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct Sentinel2Config {
    /// tiles with a cloud cover percentage at or above this are not even searched
    pub max_cloud_cover: f64,

    /// reported in metadata documents. Selection always uses [`crate::coverage::FULL_COVERAGE_THRESHOLD`]
    pub min_aoi_coverage: f64,
}

impl Default for Sentinel2Config {
    fn default()->Self {
        Sentinel2Config { max_cloud_cover: 20.0, min_aoi_coverage: 99.9 }
    }
}

impl Sentinel2Config {
    fn validate (&self)->Result<()> {
        if !(0.0..=100.0).contains( &self.max_cloud_cover) {
            return Err( config_error( format!("max_cloud_cover {} not in [0,100]", self.max_cloud_cover)))
        }
        if !(self.min_aoi_coverage > 0.0 && self.min_aoi_coverage <= 100.0) {
            return Err( config_error( format!("min_aoi_coverage {} not in (0,100]", self.min_aoi_coverage)))
        }
        Ok(())
    }
}

/// asset keys of the logical RGB bands
#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct BandMapping {
    pub red: String,
    pub green: String,
    pub blue: String,
}

impl Default for BandMapping {
    fn default()->Self {
        BandMapping { red: "B04".to_string(), green: "B03".to_string(), blue: "B02".to_string() }
    }
}

impl BandMapping {
    /// (logical band name, asset key) in RGB order
    pub fn rgb (&self)->[(&'static str, &str);3] {
        [ ("red", self.red.as_str()), ("green", self.green.as_str()), ("blue", self.blue.as_str()) ]
    }

    fn validate (&self)->Result<()> {
        for (band,key) in self.rgb() {
            if key.is_empty() { return Err( config_error( format!("no asset key for {band} band"))) }
        }
        Ok(())
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub base_dir: PathBuf,
    pub tif_subdir: String,
    pub jpg_subdir: String,

    /// pixel size of exported images in meters
    pub target_resolution: f64,

    pub jpg_quality: u8,

    /// linear gain applied before clipping reflectance to [0,1]
    pub gain: f64,

    pub compression: GeoTiffCompression,
}

impl Default for OutputConfig {
    fn default()->Self {
        OutputConfig {
            base_dir: PathBuf::from("output"),
            tif_subdir: "tif".to_string(),
            jpg_subdir: "jpg".to_string(),
            target_resolution: 10.0,
            jpg_quality: 95,
            gain: crate::normalize::DEFAULT_GAIN,
            compression: GeoTiffCompression::Lzw,
        }
    }
}

impl OutputConfig {
    fn validate (&self)->Result<()> {
        if !(self.target_resolution > 0.0) {
            return Err( config_error( format!("target_resolution {} has to be > 0", self.target_resolution)))
        }
        if !(1..=100).contains( &self.jpg_quality) {
            return Err( config_error( format!("jpg_quality {} not in [1,100]", self.jpg_quality)))
        }
        if !(self.gain > 0.0) {
            return Err( config_error( format!("gain {} has to be > 0", self.gain)))
        }
        if self.tif_subdir.is_empty() || self.jpg_subdir.is_empty() {
            return Err( config_error("empty output subdir"))
        }
        Ok(())
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// max number of attempts (not re-tries) for opening and cropping band sources
    pub max_attempts: u32,

    /// delay between failed open attempts
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub open_delay: Duration,

    /// delay between failed read/crop attempts
    #[serde(serialize_with = "serialize_duration", deserialize_with = "deserialize_duration")]
    pub crop_delay: Duration,
}

impl Default for RetryConfig {
    fn default()->Self {
        RetryConfig { max_attempts: 3, open_delay: secs(2), crop_delay: secs(3) }
    }
}

impl RetryConfig {
    fn validate (&self)->Result<()> {
        if self.max_attempts == 0 { return Err( config_error("retry max_attempts has to be > 0")) }
        Ok(())
    }
}

/// inclusive range of acquisition days
#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    fn validate (&self)->Result<()> {
        if self.start > self.end {
            return Err( config_error( format!("date range start {} after end {}", self.start, self.end)))
        }
        Ok(())
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct VectorAoiConfig {
    pub location_name: String,

    /// GeoJSON file with (multi)polygon features in EPSG:4326
    pub aoi_file: PathBuf,

    pub date_range: DateRange,

    /// use the bounding box of all features instead of their union
    #[serde(default)]
    pub use_bounding_box: bool,

    /// process all features as one AOI. If false each feature becomes its own AOI
    #[serde(default = "default_true")]
    pub process_as_single: bool,

    /// feature property that identifies individual features (falls back to 1-based index)
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// buffer around individual features in meters
    #[serde(default)]
    pub buffer_meters: f64,

    /// put the output of all individual features into the folder of the location
    #[serde(default)]
    pub shared_folder: bool,
}

impl VectorAoiConfig {
    fn validate (&self)->Result<()> {
        if self.location_name.trim().is_empty() { return Err( config_error("empty location_name")) }
        if !(self.buffer_meters >= 0.0) {
            return Err( config_error( format!("{}: negative buffer_meters", self.location_name)))
        }
        self.date_range.validate()
    }
}

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct CoordinateAoiConfig {
    #[serde(default = "default_group_name")]
    pub location_group_name: String,

    /// (lat,lon) pairs in degrees
    pub coordinates: Vec<(f64,f64)>,

    /// side length of the squares around each coordinate
    pub square_size_meters: f64,

    pub date_range: DateRange,

    /// also process an AOI that covers all squares (needs at least 2 coordinates)
    #[serde(default = "default_true")]
    pub process_overall: bool,

    #[serde(default = "default_overall_buffer")]
    pub overall_buffer_meters: f64,
}

impl CoordinateAoiConfig {
    fn validate (&self)->Result<()> {
        for &(lat,lon) in &self.coordinates {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err( config_error( format!("invalid coordinate ({lat},{lon})")))
            }
        }
        if !(self.square_size_meters > 0.0) {
            return Err( config_error( format!("square_size_meters {} has to be > 0", self.square_size_meters)))
        }
        if !(self.overall_buffer_meters >= 0.0) {
            return Err( config_error("negative overall_buffer_meters"))
        }
        self.date_range.validate()
    }
}

fn default_true()->bool { true }
fn default_id_field()->String { "fid".to_string() }
fn default_group_name()->String { "Coordinate".to_string() }
fn default_overall_buffer()->f64 { 500.0 }

/// load and validate a config file
pub fn load_config<P: AsRef<Path>> (path: P)->Result<TrueColorConfig> {
    let config: TrueColorConfig = load_ron_file( path)?;
    config.validate()?;
    Ok(config)
}
