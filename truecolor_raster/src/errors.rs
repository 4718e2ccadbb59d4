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

use truecolor_common::define_error;

define_error!{ pub RasterError = 
    IOError( #[from] std::io::Error) : "IO error: {0}",
    TiffError( #[from] tiff::TiffError) : "TIFF error: {0}",
    ProjectionError(String) : "projection error: {0}",
    UnsupportedFormat(String) : "unsupported format: {0}",
    InvalidRaster(String) : "invalid raster: {0}",
    NoOverlap(String) : "no overlap: {0}",
    OpFailed(String) : "operation failed: {0}"
}

pub type Result<T> = std::result::Result<T, RasterError>;

impl RasterError {
    /// errors that stem from accessing the data (not from the data itself) and hence might be cured by re-opening
    pub fn is_transient (&self)->bool {
        match self {
            RasterError::IOError(_) => true,
            RasterError::TiffError(tiff::TiffError::IoError(_)) => true,
            _ => false
        }
    }
}

pub fn projection_error (msg: impl ToString)->RasterError {
    RasterError::ProjectionError(msg.to_string())
}

pub fn invalid_raster (msg: impl ToString)->RasterError {
    RasterError::InvalidRaster(msg.to_string())
}

pub fn unsupported_format (msg: impl ToString)->RasterError {
    RasterError::UnsupportedFormat(msg.to_string())
}

pub fn op_failed (msg: impl ToString)->RasterError {
    RasterError::OpFailed(msg.to_string())
}
