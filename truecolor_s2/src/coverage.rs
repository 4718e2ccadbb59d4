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

//! how much of an AOI is covered by a candidate footprint

use geo::{Area, BooleanOps, Intersects, MultiPolygon};

/// min coverage percentage for an AOI to count as fully covered. Footprint edges and floating point
/// noise rarely give exactly 100%
pub const FULL_COVERAGE_THRESHOLD: f64 = 99.9;

#[derive(Debug,Clone,Copy,PartialEq)]
pub struct Coverage {
    /// in [0,100]
    pub percentage: f64,
    pub fully_covered: bool,
}

impl Coverage {
    pub const NONE: Coverage = Coverage { percentage: 0.0, fully_covered: false };
}

/// the percentage of the `aoi` area that is covered by `candidate`. Degenerate AOIs are never covered
pub fn coverage (aoi: &MultiPolygon<f64>, candidate: &MultiPolygon<f64>)->Coverage {
    let aoi_area = aoi.unsigned_area();
    if !(aoi_area > 0.0) || !aoi.intersects( candidate) {
        return Coverage::NONE
    }

    let covered = aoi.intersection( candidate).unsigned_area();
    let mut percentage = (covered / aoi_area * 100.0).clamp( 0.0, 100.0);
    if (100.0 - percentage).abs() < 1e-9 {
        percentage = 100.0;
    }

    Coverage { percentage, fully_covered: percentage >= FULL_COVERAGE_THRESHOLD }
}
