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

//! raster model and the geospatial raster operations needed to assemble image products from tiled,
//! possibly differently projected sources: projection, reprojection, mosaicking, polygon crop/mask,
//! resampling and GeoTIFF I/O

use std::fmt::Debug;
use ndarray::{s, Array2, Array3, ArrayView2, ArrayViewMut2, Axis};
use num::ToPrimitive;
use serde::{Deserialize, Serialize};
use strum::Display;
use tiff::decoder::DecodingResult;

use truecolor_common::BoundingBox;

mod errors;
pub use errors::*;

pub mod proj;
pub mod warp;
pub mod mosaic;
pub mod mask;
pub mod geotiff;
pub mod source;

/* #region geotransforms *****************************************************************************************/

/// affine pixel->world transform in GDAL order: 
/// `x = gt[0] + col*gt[1] + row*gt[2]`, `y = gt[3] + col*gt[4] + row*gt[5]`
pub type GeoTransform = [f64;6];

pub fn new_geotransform (x_upper_left: f64, x_resolution: f64, row_rotation: f64,
                         y_upper_left: f64, col_rotation: f64, y_resolution: f64) -> GeoTransform {
    [x_upper_left,x_resolution,row_rotation,y_upper_left,col_rotation,y_resolution]
}

/// north-up transform with the upper left corner of the box as origin. `y_resolution` is usually negative
pub fn geotransform_from_bbox (bbox: &BoundingBox<f64>, x_resolution: f64, y_resolution: f64) -> GeoTransform {
    new_geotransform( bbox.west, x_resolution, 0.0,
                      bbox.north, 0.0, y_resolution)
}

#[inline]
pub fn pixel_to_world (gt: &GeoTransform, col: f64, row: f64) -> (f64,f64) {
    ( gt[0] + col*gt[1] + row*gt[2], gt[3] + col*gt[4] + row*gt[5] )
}

/// inverse transform (world->pixel), None for a singular transform
pub fn invert_geotransform (gt: &GeoTransform) -> Option<GeoTransform> {
    let det = gt[1]*gt[5] - gt[2]*gt[4];
    if det.abs() < 1e-15 { return None }

    let inv_det = 1.0 / det;
    let a = gt[5] * inv_det;
    let b = -gt[2] * inv_det;
    let d = -gt[4] * inv_det;
    let e = gt[1] * inv_det;
    Some([ -gt[0]*a - gt[3]*b, a, b, -gt[0]*d - gt[3]*e, d, e ])
}

pub fn is_north_up (gt: &GeoTransform) -> bool {
    gt[2] == 0.0 && gt[4] == 0.0
}

pub fn same_geotransform (a: &GeoTransform, b: &GeoTransform, eps: f64) -> bool {
    a.iter().zip(b.iter()).all( |(x,y)| (x-y).abs() <= eps)
}

/* #endregion geotransforms */

/* #region value types *******************************************************************************************/

#[derive(Debug,Copy,Clone,PartialEq,Eq,Serialize,Deserialize,Display)]
#[strum(serialize_all = "lowercase")]
pub enum DataType {
    UInt8, UInt16, Int16, UInt32, Int32, Float32, Float64
}

impl DataType {
    pub fn from_tiff (bits: u8, sample_format: u16)->Option<DataType> {
        match (sample_format, bits) {
            (1,8) => Some(DataType::UInt8),
            (1,16) => Some(DataType::UInt16),
            (1,32) => Some(DataType::UInt32),
            (2,16) => Some(DataType::Int16),
            (2,32) => Some(DataType::Int32),
            (3,32) => Some(DataType::Float32),
            (3,64) => Some(DataType::Float64),
            _ => None
        }
    }
}

/// the sample types we can store in a [`Raster`]
pub trait RasterValue: Copy + Default + PartialEq + PartialOrd + Debug + ToPrimitive + Send + Sync + 'static {
    const DATA_TYPE: DataType;

    /// convert a computed (resampled) value into this type, rounding and saturating integer types
    fn from_f64_sample (v: f64)->Self;

    #[inline]
    fn to_f64_sample (self)->f64 { self.to_f64().unwrap_or(f64::NAN) }

    fn zero ()->Self { Self::default() }

    /// convert decoded TIFF samples into this type
    fn from_decoding_result (res: DecodingResult)->Result<Vec<Self>> {
        fn conv<S: ToPrimitive, T: RasterValue> (v: Vec<S>)->Vec<T> {
            v.into_iter().map( |x| T::from_f64_sample( x.to_f64().unwrap_or(f64::NAN))).collect()
        }

        match res {
            DecodingResult::U8(v) => Ok( conv(v) ),
            DecodingResult::U16(v) => Ok( conv(v) ),
            DecodingResult::U32(v) => Ok( conv(v) ),
            DecodingResult::I8(v) => Ok( conv(v) ),
            DecodingResult::I16(v) => Ok( conv(v) ),
            DecodingResult::I32(v) => Ok( conv(v) ),
            DecodingResult::F32(v) => Ok( conv(v) ),
            DecodingResult::F64(v) => Ok( conv(v) ),
            _ => Err( unsupported_format("TIFF sample type"))
        }
    }
}

macro_rules! impl_int_raster_value {
    ( $( $t:ty => $dt:ident ),* ) => {
        $(
            impl RasterValue for $t {
                const DATA_TYPE: DataType = DataType::$dt;

                #[inline]
                fn from_f64_sample (v: f64)->Self {
                    if v.is_nan() { 0 } else { v.round() as $t } // 'as' saturates
                }
            }
        )*
    }
}
impl_int_raster_value!{ u8 => UInt8, u16 => UInt16, i16 => Int16, u32 => UInt32, i32 => Int32 }

impl RasterValue for f32 {
    const DATA_TYPE: DataType = DataType::Float32;
    #[inline] fn from_f64_sample (v: f64)->Self { v as f32 }
}

impl RasterValue for f64 {
    const DATA_TYPE: DataType = DataType::Float64;
    #[inline] fn from_f64_sample (v: f64)->Self { v }
}

/* #endregion value types */

/* #region grids and profiles ************************************************************************************/

/// a pixel grid in a given reference frame, without samples
#[derive(Debug,Clone,Copy,PartialEq,Serialize,Deserialize)]
pub struct RasterGrid {
    pub transform: GeoTransform,
    pub width: usize,
    pub height: usize,
    pub epsg: u32,
}

impl RasterGrid {
    pub fn new (transform: GeoTransform, width: usize, height: usize, epsg: u32)->Self {
        RasterGrid { transform, width, height, epsg }
    }

    /// absolute pixel size (x,y)
    pub fn pixel_size (&self)->(f64,f64) {
        ( (self.transform[1].powi(2) + self.transform[4].powi(2)).sqrt(), 
          (self.transform[2].powi(2) + self.transform[5].powi(2)).sqrt() )
    }

    /// world bounds of all four grid corners
    pub fn bounds (&self)->BoundingBox<f64> {
        let w = self.width as f64;
        let h = self.height as f64;
        let corners = [ 
            pixel_to_world( &self.transform, 0.0, 0.0), pixel_to_world( &self.transform, w, 0.0),
            pixel_to_world( &self.transform, 0.0, h), pixel_to_world( &self.transform, w, h)
        ];
        bounds_of_points( &corners)
    }

    pub fn is_empty (&self)->bool { self.width == 0 || self.height == 0 }

    /// the sub grid covered by a window of this grid
    pub fn window_grid (&self, win: &PixelWindow)->RasterGrid {
        let (x0,y0) = pixel_to_world( &self.transform, win.col_off as f64, win.row_off as f64);
        let mut transform = self.transform;
        transform[0] = x0;
        transform[3] = y0;
        RasterGrid { transform, width: win.width, height: win.height, epsg: self.epsg }
    }

    /// pixel window of this grid that covers the given bounds (in the frame of this grid), clipped to
    /// the grid extent. Start indices are floored, end indices are ceiled. None if there is no overlap
    pub fn window_for_bounds (&self, bbox: &BoundingBox<f64>)->Option<PixelWindow> {
        let inv = invert_geotransform( &self.transform)?;
        let corners = [
            pixel_to_world( &inv, bbox.west, bbox.north), pixel_to_world( &inv, bbox.east, bbox.north),
            pixel_to_world( &inv, bbox.west, bbox.south), pixel_to_world( &inv, bbox.east, bbox.south)
        ];
        let pb = bounds_of_points( &corners);

        // tolerate floating point noise when bounds fall on pixel edges
        let c0 = ((pb.west + 1e-6).floor().max(0.0)) as usize;
        let r0 = ((pb.south + 1e-6).floor().max(0.0)) as usize;
        let c1 = ((pb.east - 1e-6).ceil().min(self.width as f64)).max(0.0) as usize;
        let r1 = ((pb.north - 1e-6).ceil().min(self.height as f64)).max(0.0) as usize;

        if c1 > c0 && r1 > r0 {
            Some( PixelWindow { col_off: c0, row_off: r0, width: c1 - c0, height: r1 - r0 })
        } else {
            None
        }
    }
}

pub fn bounds_of_points (pts: &[(f64,f64)])->BoundingBox<f64> {
    let mut bb = BoundingBox::new( f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for &(x,y) in pts {
        if x < bb.west { bb.west = x }
        if x > bb.east { bb.east = x }
        if y < bb.south { bb.south = y }
        if y > bb.north { bb.north = y }
    }
    bb
}

/// a rectangular pixel region (col/row offset and size)
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct PixelWindow {
    pub col_off: usize,
    pub row_off: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    pub fn new (col_off: usize, row_off: usize, width: usize, height: usize)->Self {
        PixelWindow { col_off, row_off, width, height }
    }

    pub fn col_end (&self)->usize { self.col_off + self.width }
    pub fn row_end (&self)->usize { self.row_off + self.height }

    /// grow window by `n` pixels on each side, clipped to a raster of size (w,h)
    pub fn expanded (&self, n: usize, w: usize, h: usize)->PixelWindow {
        let c0 = self.col_off.saturating_sub(n);
        let r0 = self.row_off.saturating_sub(n);
        let c1 = (self.col_end() + n).min(w);
        let r1 = (self.row_end() + n).min(h);
        PixelWindow { col_off: c0, row_off: r0, width: c1.saturating_sub(c0), height: r1.saturating_sub(r0) }
    }
}

/// spatial metadata of a raster without its samples
#[derive(Debug,Clone,PartialEq,Serialize,Deserialize)]
pub struct RasterProfile {
    pub grid: RasterGrid,
    pub band_count: usize,
    pub data_type: DataType,
    pub nodata: Option<f64>,
}

impl RasterProfile {
    pub fn epsg (&self)->u32 { self.grid.epsg }
    pub fn width (&self)->usize { self.grid.width }
    pub fn height (&self)->usize { self.grid.height }
    pub fn transform (&self)->&GeoTransform { &self.grid.transform }
    pub fn bounds (&self)->BoundingBox<f64> { self.grid.bounds() }
}

/* #endregion grids and profiles */

/* #region raster ************************************************************************************************/

/// a georeferenced raster with 1 (single band) or 3 (RGB) bands. Samples are stored as (band,row,col)
#[derive(Debug,Clone,PartialEq)]
pub struct Raster<T: RasterValue> {
    pub data: Array3<T>,
    pub transform: GeoTransform,
    pub epsg: u32,
    pub nodata: Option<T>,
}

impl <T: RasterValue> Raster<T> {
    pub fn new (data: Array3<T>, transform: GeoTransform, epsg: u32, nodata: Option<T>)->Result<Self> {
        let (bands, rows, cols) = data.dim();
        if bands != 1 && bands != 3 {
            return Err( invalid_raster( format!("unsupported band count {bands}")))
        }
        if rows == 0 || cols == 0 {
            return Err( invalid_raster( format!("empty raster {cols}x{rows}")))
        }
        if invert_geotransform( &transform).is_none() {
            return Err( invalid_raster( format!("singular geotransform {transform:?}")))
        }
        Ok( Raster { data, transform, epsg, nodata } )
    }

    pub fn from_band (band: Array2<T>, transform: GeoTransform, epsg: u32, nodata: Option<T>)->Result<Self> {
        Self::new( band.insert_axis(Axis(0)), transform, epsg, nodata)
    }

    /// a raster covering `grid` with every sample set to `value`
    pub fn filled (grid: &RasterGrid, band_count: usize, value: T, nodata: Option<T>)->Result<Self> {
        let data = Array3::from_elem( (band_count, grid.height, grid.width), value);
        Self::new( data, grid.transform, grid.epsg, nodata)
    }

    /// combine single band rasters that share one exact grid into a multi band raster
    pub fn stack (bands: Vec<Raster<T>>)->Result<Self> {
        let first = bands.first().ok_or_else( || invalid_raster("no bands to stack"))?;
        let grid = first.grid();
        let nodata = first.nodata;

        for (i,b) in bands.iter().enumerate() {
            if b.band_count() != 1 {
                return Err( invalid_raster( format!("band {i} is not a single band raster")))
            }
            let g = b.grid();
            if g.width != grid.width || g.height != grid.height || g.epsg != grid.epsg || !same_geotransform( &g.transform, &grid.transform, 1e-6) {
                return Err( invalid_raster( format!("band {i} grid {g:?} does not match {grid:?}")))
            }
        }

        let views: Vec<ArrayView2<T>> = bands.iter().map( |b| b.band(0)).collect();
        let data = ndarray::stack( Axis(0), &views).map_err( |e| invalid_raster(e))?;
        Self::new( data, grid.transform, grid.epsg, nodata)
    }

    pub fn band_count (&self)->usize { self.data.dim().0 }
    pub fn height (&self)->usize { self.data.dim().1 }
    pub fn width (&self)->usize { self.data.dim().2 }

    pub fn band (&self, i: usize)->ArrayView2<'_,T> { self.data.index_axis( Axis(0), i) }
    pub fn band_mut (&mut self, i: usize)->ArrayViewMut2<'_,T> { self.data.index_axis_mut( Axis(0), i) }

    pub fn grid (&self)->RasterGrid {
        RasterGrid { transform: self.transform, width: self.width(), height: self.height(), epsg: self.epsg }
    }

    pub fn profile (&self)->RasterProfile {
        RasterProfile {
            grid: self.grid(),
            band_count: self.band_count(),
            data_type: T::DATA_TYPE,
            nodata: self.nodata.map( |v| v.to_f64_sample()),
        }
    }

    pub fn bounds (&self)->BoundingBox<f64> { self.grid().bounds() }

    pub fn pixel_size (&self)->(f64,f64) { self.grid().pixel_size() }

    pub fn is_all (&self, value: T)->bool { self.data.iter().all( |v| *v == value) }

    pub fn is_all_zero (&self)->bool { self.is_all( T::zero()) }

    /// copy of a pixel window of this raster
    pub fn window (&self, win: &PixelWindow)->Result<Self> {
        if win.col_end() > self.width() || win.row_end() > self.height() {
            return Err( invalid_raster( format!("window {win:?} exceeds raster {}x{}", self.width(), self.height())))
        }
        let data = self.data.slice( s![.., win.row_off..win.row_end(), win.col_off..win.col_end()]).to_owned();
        let grid = self.grid().window_grid(win);
        Self::new( data, grid.transform, self.epsg, self.nodata)
    }
}

/* #endregion raster */
