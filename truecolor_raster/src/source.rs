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

//! random access to single band raster data sets (local or remote files, in-memory rasters)

use truecolor_common::BoundingBox;

use crate::{
    errors::{invalid_raster, Result}, proj::{SrsTransform, DEFAULT_DENSIFY_PTS},
    PixelWindow, Raster, RasterProfile, RasterValue
};

/// an opened single band raster data set from which we can read windows
pub trait RasterSource<T: RasterValue> {
    /// name used in log messages (e.g. a file name)
    fn name (&self)->&str;

    fn profile (&self)->&RasterProfile;

    /// read a pixel window as a single band raster
    fn read_window (&mut self, win: &PixelWindow)->Result<Raster<T>>;

    /// read the part of the data set that covers `bounds` (given in frame `epsg`) plus `margin` pixels
    /// on each side. None if the data set does not overlap the bounds
    fn read_bounds (&mut self, bounds: &BoundingBox<f64>, epsg: u32, margin: usize)->Result<Option<Raster<T>>> {
        let grid = self.profile().grid;
        let bb = SrsTransform::new( epsg, grid.epsg)?.transform_bounds( bounds, DEFAULT_DENSIFY_PTS)?;

        match grid.window_for_bounds( &bb) {
            Some(win) => {
                let win = win.expanded( margin, grid.width, grid.height);
                Ok( Some( self.read_window( &win)?) )
            }
            None => Ok(None)
        }
    }
}

/// a raster source that is backed by a single band in-memory [`Raster`]
pub struct MemorySource<T: RasterValue> {
    name: String,
    raster: Raster<T>,
    profile: RasterProfile,
}

impl <T: RasterValue> MemorySource<T> {
    pub fn new (name: impl ToString, raster: Raster<T>)->Result<Self> {
        if raster.band_count() != 1 {
            return Err( invalid_raster("memory sources have to be single band"))
        }
        let profile = raster.profile();
        Ok( MemorySource { name: name.to_string(), raster, profile } )
    }
}

impl <T: RasterValue> RasterSource<T> for MemorySource<T> {
    fn name (&self)->&str { &self.name }

    fn profile (&self)->&RasterProfile { &self.profile }

    fn read_window (&mut self, win: &PixelWindow)->Result<Raster<T>> {
        self.raster.window( win)
    }
}
