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

use thiserror::Error;
use truecolor_common::{net::NetError, ron::RonConfigError};
use truecolor_raster::RasterError;

pub type Result<T> = std::result::Result<T, TrueColorError>;

#[derive(Error,Debug)]
pub enum TrueColorError {
    #[error("IO error {0}")]
    IOError( #[from] std::io::Error),

    #[error("config error {0}")]
    ConfigError(String),

    #[error("config file error {0}")]
    ConfigFileError( #[from] RonConfigError),

    #[error("net error {0}")]
    NetError( #[from] NetError),

    #[error("http error {0}")]
    HttpError( #[from] reqwest::Error),

    #[error("JSON error {0}")]
    JsonError( #[from] serde_json::Error),

    #[error("raster error {0}")]
    RasterError( #[from] RasterError),

    #[error("image error {0}")]
    ImageError( #[from] image::ImageError),

    #[error("GeoJSON error {0}")]
    GeoJsonError( #[from] Box<geojson::Error>),

    /// a data access problem that might go away if we re-open the source
    #[error("transient IO error {0}")]
    TransientIo(String),

    /// a band could not be loaded, even after retries
    #[error("failed to load band {band} of tile {tile}: {cause}")]
    BandLoadFailure { band: String, tile: String, cause: Box<TrueColorError> },

    #[error("tile {tile} has no asset {asset}")]
    MissingAsset { tile: String, asset: String },

    #[error("invalid AOI {0}")]
    InvalidAoi(String),

    #[error("catalog error {0}")]
    CatalogError(String),

    /// a generic error
    #[error("operation failed {0}")]
    OpFailed(String)
}

impl TrueColorError {
    /// can this error go away if we try again (re-opening sources or re-sending requests)
    pub fn is_retryable (&self)->bool {
        match self {
            TrueColorError::IOError(_) => true,
            TrueColorError::TransientIo(_) => true,
            TrueColorError::NetError(e) => e.is_transient(),
            TrueColorError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            TrueColorError::RasterError(e) => e.is_transient(),
            _ => false
        }
    }
}

impl From<geojson::Error> for TrueColorError {
    fn from (e: geojson::Error)->Self {
        TrueColorError::GeoJsonError( Box::new(e))
    }
}

pub fn config_error (msg: impl ToString)->TrueColorError {
    TrueColorError::ConfigError(msg.to_string())
}

pub fn invalid_aoi (msg: impl ToString)->TrueColorError {
    TrueColorError::InvalidAoi(msg.to_string())
}

pub fn catalog_error (msg: impl ToString)->TrueColorError {
    TrueColorError::CatalogError(msg.to_string())
}

pub fn transient_io (msg: impl ToString)->TrueColorError {
    TrueColorError::TransientIo(msg.to_string())
}

pub fn band_load_failure (band: impl ToString, tile: impl ToString, cause: TrueColorError)->TrueColorError {
    TrueColorError::BandLoadFailure { band: band.to_string(), tile: tile.to_string(), cause: Box::new(cause) }
}

pub fn op_failed (msg: impl ToString)->TrueColorError {
    TrueColorError::OpFailed(msg.to_string())
}
