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

//! synthetic catalogs and band sources for tests that should not touch the network

use std::{cell::{Cell, RefCell}, collections::{BTreeMap, HashMap}, io, rc::Rc, time::Duration};
use chrono::{DateTime, NaiveDate, Utc};
use geo::{MultiPolygon, Rect};
use ndarray::Array2;

use truecolor_common::BoundingBox;
use truecolor_raster::{
    new_geotransform, proj::{SrsTransform, DEFAULT_DENSIFY_PTS, EPSG_WGS84}, source::{MemorySource, RasterSource},
    PixelWindow, Raster, RasterError, RasterGrid, RasterProfile
};
use truecolor_s2::{
    assets::{AssetOpener, BandSource}, catalog::{Catalog, ImageTile}, config::RetryConfig,
    op_failed, transient_io, Result
};

pub const BANDS: [&str;3] = ["B04", "B03", "B02"];

/// retries without delays
pub fn fast_retry (max_attempts: u32)->RetryConfig {
    RetryConfig { max_attempts, open_delay: Duration::ZERO, crop_delay: Duration::ZERO }
}

/// a north-up grid with 10m pixels, `x0`/`y0` snapped to the 10m lattice
pub fn grid (epsg: u32, west: f64, north: f64, east: f64, south: f64)->RasterGrid {
    let x0 = (west / 10.0).floor() * 10.0;
    let y0 = (north / 10.0).ceil() * 10.0;
    let width = (((east / 10.0).ceil() * 10.0 - x0) / 10.0).round() as usize;
    let height = ((y0 - (south / 10.0).floor() * 10.0) / 10.0).round() as usize;
    RasterGrid::new( new_geotransform( x0, 10.0, 0.0, y0, 0.0, -10.0), width, height, epsg)
}

/// lon/lat footprint (bounding rectangle) of a grid
pub fn footprint (grid: &RasterGrid)->MultiPolygon<f64> {
    let bb = SrsTransform::new( grid.epsg, EPSG_WGS84).unwrap()
        .transform_bounds( &grid.bounds(), DEFAULT_DENSIFY_PTS).unwrap();
    MultiPolygon( vec![ Rect::new( (bb.west, bb.south), (bb.east, bb.north)).to_polygon() ])
}

pub fn href (tile_id: &str, band: &str)->String {
    format!("mem://{tile_id}/{band}")
}

pub fn tile (id: &str, datetime: &str, footprint: MultiPolygon<f64>, epsg: u32, cloud_cover: f64)->ImageTile {
    ImageTile {
        id: id.to_string(),
        datetime: DateTime::parse_from_rfc3339( datetime).unwrap().to_utc(),
        footprint,
        cloud_cover: Some(cloud_cover),
        epsg: Some(epsg),
        assets: BANDS.iter().map( |b| (b.to_string(), href( id, b))).collect(),
        platform: Some("Sentinel-2A".to_string()),
        orbit_state: Some("descending".to_string()),
        relative_orbit: Some(79),
        processing_baseline: Some("05.10".to_string()),
        mgrs_tile: Some("33NVA".to_string()),
    }
}

/// an opener that serves in-memory single band rasters by href and can simulate transient failures
#[derive(Default)]
pub struct MemOpener {
    rasters: HashMap<String,Raster<u16>>,
    failures: RefCell<HashMap<String,u32>>,
    read_failures: RefCell<HashMap<String,Rc<Cell<u32>>>>,
    pub opens: RefCell<usize>,
}

impl MemOpener {
    pub fn new ()->Self { MemOpener::default() }

    /// register constant bands for a tile: red = v, green = v + 100, blue = v + 200 (0 stays 0)
    pub fn add_tile (&mut self, tile_id: &str, grid: &RasterGrid, v: u16) {
        for (i,band) in BANDS.iter().enumerate() {
            let value = if v == 0 { 0 } else { v + 100 * i as u16 };
            let data = Array2::from_elem( (grid.height, grid.width), value);
            let raster = Raster::from_band( data, grid.transform, grid.epsg, Some(0)).unwrap();
            self.rasters.insert( href( tile_id, band), raster);
        }
    }

    /// the next `n` opens of href fail with a transient error
    pub fn fail_next (&self, href: &str, n: u32) {
        self.failures.borrow_mut().insert( href.to_string(), n);
    }

    /// the next `n` window reads of href fail with an IO error, no matter how often it is re-opened
    pub fn fail_next_reads (&self, href: &str, n: u32) {
        self.read_failures.borrow_mut().insert( href.to_string(), Rc::new( Cell::new(n)));
    }
}

impl AssetOpener for MemOpener {
    fn open (&self, href: &str)->Result<BandSource> {
        *self.opens.borrow_mut() += 1;

        if let Some(n) = self.failures.borrow_mut().get_mut( href) {
            if *n > 0 {
                *n -= 1;
                return Err( transient_io( format!("simulated failure of {href}")))
            }
        }

        let raster = self.rasters.get( href).ok_or_else( || op_failed( format!("unknown asset {href}")))?;
        let source = MemorySource::new( href, raster.clone())?;

        match self.read_failures.borrow().get( href) {
            Some(remaining) => Ok( Box::new( FlakySource { source, remaining: remaining.clone() }) ),
            None => Ok( Box::new( source) )
        }
    }
}

/// a memory source whose reads fail while there are `remaining` failures
pub struct FlakySource {
    source: MemorySource<u16>,
    remaining: Rc<Cell<u32>>,
}

impl RasterSource<u16> for FlakySource {
    fn name (&self)->&str { self.source.name() }

    fn profile (&self)->&RasterProfile { self.source.profile() }

    fn read_window (&mut self, win: &PixelWindow)->truecolor_raster::Result<Raster<u16>> {
        let n = self.remaining.get();
        if n > 0 {
            self.remaining.set( n - 1);
            return Err( RasterError::IOError( io::Error::new( io::ErrorKind::Other, format!("simulated read failure of {}", self.name()))))
        }
        self.source.read_window( win)
    }
}

/// a catalog that returns fixed tiles (filtered by date and cloud cover)
pub struct StaticCatalog {
    pub tiles: Vec<ImageTile>,
}

impl Catalog for StaticCatalog {
    fn search (&self, _bbox: &BoundingBox<f64>, start: NaiveDate, end: NaiveDate, max_cloud: f64)->Result<Vec<ImageTile>> {
        Ok( self.tiles.iter()
            .filter( |t| t.date() >= start && t.date() <= end && t.cloud_cover.map( |c| c < max_cloud).unwrap_or(true))
            .cloned()
            .collect() )
    }
}

/// a catalog that is always down
pub struct FailingCatalog;

impl Catalog for FailingCatalog {
    fn search (&self, _bbox: &BoundingBox<f64>, _start: NaiveDate, _end: NaiveDate, _max_cloud: f64)->Result<Vec<ImageTile>> {
        Err( transient_io("catalog unavailable"))
    }
}
