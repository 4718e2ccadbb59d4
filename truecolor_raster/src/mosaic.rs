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

//! combining overlapping rasters into one continuous raster

use tracing::debug;
use truecolor_common::BoundingBox;

use crate::{
    errors::{invalid_raster, Result}, geotransform_from_bbox, proj::{SrsTransform, DEFAULT_DENSIFY_PTS},
    warp::{warp_into, Resampling, WritePolicy}, Raster, RasterGrid, RasterValue
};

/// bounds of a raster in another frame
pub fn bounds_in_frame<T: RasterValue> (raster: &Raster<T>, epsg: u32)->Result<BoundingBox<f64>> {
    SrsTransform::new( raster.epsg, epsg)?.transform_bounds( &raster.bounds(), DEFAULT_DENSIFY_PTS)
}

/// snap bounds outwards to the pixel lattice of a north-up reference grid
pub fn aligned_grid (reference: &RasterGrid, bounds: &BoundingBox<f64>)->RasterGrid {
    let (rx,ry) = (reference.transform[1].abs(), reference.transform[5].abs());
    let (ox,oy) = (reference.transform[0], reference.transform[3]);

    let west = ox + ((bounds.west - ox) / rx + 1e-6).floor() * rx;
    let east = ox + ((bounds.east - ox) / rx - 1e-6).ceil() * rx;
    let north = oy - ((oy - bounds.north) / ry + 1e-6).floor() * ry;
    let south = oy - ((oy - bounds.south) / ry - 1e-6).ceil() * ry;

    let width = ((east - west) / rx).round().max(0.0) as usize;
    let height = ((north - south) / ry).round().max(0.0) as usize;
    let transform = geotransform_from_bbox( &BoundingBox::new( west, south, east, north), rx, -ry);
    RasterGrid::new( transform, width, height, reference.epsg)
}

/// grid that covers the union of all rasters, in the frame and on the pixel lattice of the first one
pub fn union_grid<T: RasterValue> (rasters: &[Raster<T>])->Result<RasterGrid> {
    let first = rasters.first().ok_or_else( || invalid_raster("no rasters to merge"))?;
    let epsg = first.epsg;

    let mut bounds = first.bounds();
    for r in &rasters[1..] {
        bounds = bounds.union( &bounds_in_frame( r, epsg)?);
    }
    Ok( aligned_grid( &first.grid(), &bounds) )
}

/// paint sources into `grid` in list order. Each target pixel gets its value from the first source that
/// has a valid (non-nodata) sample for it. Sources in the frame of the grid are copied pixel by pixel,
/// sources in other frames are reprojected with bilinear resampling
pub fn mosaic_into_grid<T: RasterValue> (sources: &[Raster<T>], grid: &RasterGrid, nodata: T)->Result<Raster<T>> {
    let band_count = sources.first().map( |s| s.band_count()).ok_or_else( || invalid_raster("no rasters to mosaic"))?;
    let mut out = Raster::filled( grid, band_count, nodata, Some(nodata))?;

    for (i,src) in sources.iter().enumerate() {
        let resampling = if src.epsg == grid.epsg { Resampling::Nearest } else { Resampling::Bilinear };
        let n = warp_into( src, &mut out, resampling, WritePolicy::FillNodata)?;
        debug!("mosaic source {i} (EPSG:{}) filled {n} pixels", src.epsg);
    }
    Ok(out)
}

/// mosaic all rasters into a grid covering their union (see [`union_grid`])
pub fn merge<T: RasterValue> (sources: &[Raster<T>])->Result<Raster<T>> {
    let grid = union_grid( sources)?;
    let nodata = sources.first().and_then( |s| s.nodata).unwrap_or_default();
    mosaic_into_grid( sources, &grid, nodata)
}
