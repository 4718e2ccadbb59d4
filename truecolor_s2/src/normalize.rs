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

//! conversion of scaled surface reflectance into displayable 8 bit samples

use truecolor_raster::{Raster, RasterValue};

/// linear gain that brightens typical land reflectance (Sentinel Hub true color)
pub const DEFAULT_GAIN: f64 = 2.5;

/// reflectance 1.0 is stored as this integer value
pub const REFLECTANCE_SCALE: f64 = 10000.0;

#[inline]
pub fn normalize_value (v: f64, gain: f64)->u8 {
    ((v / REFLECTANCE_SCALE * gain).clamp( 0.0, 1.0) * 255.0).round() as u8 // NaN -> 0
}

/// `round(clip(v / 10000 * gain, 0, 1) * 255)` for every sample. Keeps grid and frame, nodata becomes 0
pub fn normalize<T: RasterValue> (raster: &Raster<T>, gain: f64)->Raster<u8> {
    Raster {
        data: raster.data.mapv( |v| normalize_value( v.to_f64_sample(), gain)),
        transform: raster.transform,
        epsg: raster.epsg,
        nodata: Some(0),
    }
}
