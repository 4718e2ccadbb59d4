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

//! loading of the RGB bands of all tiles of one acquisition day, mosaicked and cropped to an AOI.
//!
//! Each band is loaded independently: the first opened tile defines the target frame and pixel lattice,
//! the crop grid is the part of that lattice which contains the AOI (limited to the extent of all tiles),
//! and tiles are painted into the crop grid in list order so that the first tile with a valid sample wins.
//! Tiles in other frames are reprojected with bilinear resampling. Sources are only read for the part
//! that overlaps the crop grid.

use std::thread;
use geo::MultiPolygon;
use tracing::{debug, info};

use truecolor_common::BoundingBox;
use truecolor_raster::{
    mask::{geometry_bounds, mask_outside}, mosaic::{aligned_grid, mosaic_into_grid},
    proj::{SrsTransform, DEFAULT_DENSIFY_PTS, EPSG_WGS84}, Raster, RasterError, RasterGrid
};

use crate::{
    aoi::Aoi, assets::{with_retry, AssetOpener, BandSource}, catalog::ImageTile,
    config::{BandMapping, RetryConfig},
    errors::{band_load_failure, op_failed, Result, TrueColorError}
};

/// value of samples without data (outside of tile footprints or the AOI)
pub const NODATA: u16 = 0;

/// extra source pixels read around the crop grid so that bilinear resampling has all neighbors
const READ_MARGIN: usize = 1;

#[derive(Debug,Clone,PartialEq)]
pub enum LoadOutcome {
    /// a 3 band (R,G,B) raster
    Loaded(Raster<u16>),
    /// there is no valid sample in the AOI
    Empty,
}

struct OpenedTile {
    tile_id: String,
    source: BandSource,
}

/// open the band asset of all tiles, retrying each open
fn open_band_sources (tiles: &[ImageTile], band: &str, asset: &str, opener: &dyn AssetOpener, retry: &RetryConfig)->Result<Vec<OpenedTile>> {
    let mut opened = Vec::with_capacity( tiles.len());
    for tile in tiles {
        let href = tile.asset_href( asset).map_err( |e| band_load_failure( band, &tile.id, e))?;
        let what = format!("opening {band} band of {}", tile.id);
        let source = with_retry( &what, retry.max_attempts, retry.open_delay, || opener.open( href))
            .map_err( |e| band_load_failure( band, &tile.id, e))?;
        opened.push( OpenedTile { tile_id: tile.id.clone(), source });
    }
    Ok(opened)
}

/// the grid on the lattice of `reference` that contains the AOI bounds, limited to the union of all tile extents
fn crop_grid (reference: &RasterGrid, aoi_bounds: &BoundingBox<f64>, tiles: &[OpenedTile])->Result<RasterGrid> {
    let epsg = reference.epsg;
    let mut extent: Option<BoundingBox<f64>> = None;
    for t in tiles {
        let grid = t.source.profile().grid;
        let bb = SrsTransform::new( grid.epsg, epsg)?.transform_bounds( &grid.bounds(), DEFAULT_DENSIFY_PTS)?;
        extent = Some( match extent { Some(e) => e.union( &bb), None => bb });
    }

    let bounds = extent
        .and_then( |e| e.intersection( aoi_bounds))
        .ok_or_else( || TrueColorError::RasterError( RasterError::NoOverlap("AOI is outside of all tiles".to_string())))?;

    let grid = aligned_grid( reference, &bounds);
    if grid.is_empty() {
        return Err( op_failed( format!("empty crop grid for bounds {bounds:?}")))
    }
    Ok(grid)
}

/// read, mosaic and mask one band. Errors carry the id of the tile that caused them, if any
fn crop_band (mut tiles: Vec<OpenedTile>, aoi: &Aoi, band: &str)->std::result::Result<Raster<u16>,(Option<String>,TrueColorError)> {
    let first = tiles.first().ok_or_else( || (None, op_failed("no tiles")))?;
    let reference = first.source.profile().grid;
    let epsg = reference.epsg;

    let aoi_geom: MultiPolygon<f64> = SrsTransform::new( EPSG_WGS84, epsg)
        .and_then( |t| t.transform_geometry( &aoi.geometry))
        .map_err( |e| (None, e.into()))?;
    let aoi_bounds = geometry_bounds( &aoi_geom).ok_or_else( || (None, op_failed("empty projected AOI")))?;
    let grid = crop_grid( &reference, &aoi_bounds, &tiles).map_err( |e| (None, e))?;
    let grid_bounds = grid.bounds();

    let mut windows: Vec<Raster<u16>> = Vec::with_capacity( tiles.len());
    for t in tiles.iter_mut() {
        match t.source.read_bounds( &grid_bounds, epsg, READ_MARGIN) {
            Ok(Some(mut r)) => {
                debug!("{band} band of {}: read {}x{} pixels (EPSG:{})", t.tile_id, r.width(), r.height(), r.epsg);
                r.nodata = Some(NODATA);
                windows.push( r);
            }
            Ok(None) => debug!("{band} band of {} does not overlap the AOI", t.tile_id),
            Err(e) => return Err( (Some(t.tile_id.clone()), e.into()))
        }
    }
    drop(tiles); // we have all we need from the sources

    let mut mosaic = if windows.is_empty() {
        Raster::filled( &grid, 1, NODATA, Some(NODATA))
    } else {
        mosaic_into_grid( &windows, &grid, NODATA)
    }.map_err( |e| (None, e.into()))?;

    mask_outside( &mut mosaic, &aoi_geom, NODATA).map_err( |e| (None, e.into()))?;
    Ok(mosaic)
}

/// load one band, re-opening all sources if reading fails with a transient error
fn load_band (tiles: &[ImageTile], aoi: &Aoi, band: &str, asset: &str, opener: &dyn AssetOpener, retry: &RetryConfig)->Result<Raster<u16>> {
    let mut attempt = 1;
    loop {
        let opened = open_band_sources( tiles, band, asset, opener, retry)?;

        match crop_band( opened, aoi, band) {
            Ok(raster) => {
                info!("  {band} band ({asset}): {}x{} pixels in EPSG:{}", raster.width(), raster.height(), raster.epsg);
                return Ok(raster)
            }
            Err((_,e)) if e.is_retryable() && attempt < retry.max_attempts => {
                info!("reading {band} band failed: {e}, re-opening sources, retry {attempt}/{} in {:.1} sec", 
                      retry.max_attempts - 1, retry.crop_delay.as_secs_f64());
                thread::sleep( retry.crop_delay);
                attempt += 1;
            }
            Err((Some(tile),e)) => return Err( band_load_failure( band, tile, e)),
            Err((None,e)) => return Err(e)
        }
    }
}

/// load red, green and blue bands of `tiles` (in mosaic priority order), cropped and masked to `aoi`.
/// Returns [`LoadOutcome::Empty`] if there is no non-zero sample
pub fn load_rgb (tiles: &[ImageTile], aoi: &Aoi, bands: &BandMapping, opener: &dyn AssetOpener, retry: &RetryConfig)->Result<LoadOutcome> {
    if tiles.is_empty() {
        return Err( op_failed("no tiles to load"))
    }

    let mut rasters: Vec<Raster<u16>> = Vec::with_capacity(3);
    for (band,asset) in bands.rgb() {
        rasters.push( load_band( tiles, aoi, band, asset, opener, retry)?);
    }

    let grid = rasters[0].grid();
    if let Some((i,r)) = rasters.iter().enumerate().find( |(_,r)| r.grid() != grid) {
        return Err( op_failed( format!("band {i} grid {:?} differs from {grid:?}", r.grid())))
    }

    let rgb = Raster::stack( rasters)?;
    if rgb.is_all_zero() {
        Ok( LoadOutcome::Empty )
    } else {
        Ok( LoadOutcome::Loaded(rgb) )
    }
}
