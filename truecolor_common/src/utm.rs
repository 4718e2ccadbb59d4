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

use serde::{Deserialize, Serialize};

/// UTM zone (1..=60) and hemisphere. The latitude band letter is not needed to select a WGS84/UTM
/// reference frame, only the hemisphere is
#[derive(Debug,Copy,Clone,Serialize,Deserialize,PartialEq,Eq)]
pub struct UtmZone {
    pub zone: u32,
    pub north: bool,
}

impl UtmZone {
    /// EPSG code of the WGS84 / UTM frame (326xx north, 327xx south)
    pub fn epsg (&self) -> u32 {
        if self.north { 32600 + self.zone } else { 32700 + self.zone }
    }

    pub fn from_epsg (epsg: u32) -> Option<UtmZone> {
        match epsg {
            32601..=32660 => Some( UtmZone { zone: epsg - 32600, north: true }),
            32701..=32760 => Some( UtmZone { zone: epsg - 32700, north: false }),
            _ => None
        }
    }
}

impl std::fmt::Display for UtmZone {
    fn fmt (&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.zone, if self.north {'N'} else {'S'})
    }
}

/// plain 6-degree zone of a longitude without the Norway/Svalbard exceptions. Latitude 0 counts as north
pub fn naive_utm_zone (lon_deg: f64, lat_deg: f64) -> UtmZone {
    let zone = (((lon_deg + 180.0) / 6.0).floor() as i64).rem_euclid(60) as u32 + 1;
    UtmZone { zone, north: lat_deg >= 0.0 }
}
