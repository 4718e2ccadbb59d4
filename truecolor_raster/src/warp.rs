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

//! resampling of rasters into other pixel grids (reprojection and pixel size changes)

use ndarray::{Array3, ArrayView2};
use tracing::debug;

use crate::{
    errors::{invalid_raster, Result}, invert_geotransform, pixel_to_world, proj::SrsTransform,
    GeoTransform, Raster, RasterGrid, RasterValue
};

/// max difference between current and requested pixel size that does not require resampling
pub const PIXEL_SIZE_TOLERANCE: f64 = 0.01;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Resampling {
    Nearest,
    Bilinear
}

/// how to treat target pixels that already have a valid value
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum WritePolicy {
    Overwrite,
    /// only write target pixels that are still nodata, i.e. the first source that provides a value wins
    FillNodata
}

#[inline]
fn valid<T: RasterValue> (v: T, nodata: Option<T>)->bool {
    nodata.map( |nd| nd != v).unwrap_or(true)
}

/// sample the pixel that contains pixel space position (px,py)
pub fn sample_nearest<T: RasterValue> (band: &ArrayView2<T>, px: f64, py: f64, nodata: Option<T>)->Option<f64> {
    let (h,w) = band.dim();
    if px < 0.0 || py < 0.0 { return None }
    let (c,r) = (px.floor() as usize, py.floor() as usize);
    if c >= w || r >= h { return None }

    let v = band[[r,c]];
    if valid( v, nodata) { Some( v.to_f64_sample()) } else { None }
}

/// bilinear interpolation between the four pixel centers around pixel space position (px,py).
/// Neighbors that are nodata or outside the band carry no weight
pub fn sample_bilinear<T: RasterValue> (band: &ArrayView2<T>, px: f64, py: f64, nodata: Option<T>)->Option<f64> {
    let (h,w) = band.dim();
    if px < 0.0 || py < 0.0 || px > w as f64 || py > h as f64 { return None }

    let u = px - 0.5;
    let v = py - 0.5;
    let c0 = u.floor();
    let r0 = v.floor();
    let fx = u - c0;
    let fy = v - r0;

    let mut sum = 0.0;
    let mut wsum = 0.0;
    for (dc,dr,wt) in [(0,0, (1.0-fx)*(1.0-fy)), (1,0, fx*(1.0-fy)), (0,1, (1.0-fx)*fy), (1,1, fx*fy)] {
        if wt <= 0.0 { continue }
        let c = c0 as i64 + dc;
        let r = r0 as i64 + dr;
        if c < 0 || r < 0 || c >= w as i64 || r >= h as i64 { continue }

        let s = band[[r as usize, c as usize]];
        if valid( s, nodata) {
            sum += wt * s.to_f64_sample();
            wsum += wt;
        }
    }

    if wsum > 1e-9 { Some( sum / wsum) } else { None }
}

#[inline]
fn sample<T: RasterValue> (band: &ArrayView2<T>, px: f64, py: f64, nodata: Option<T>, resampling: Resampling)->Option<f64> {
    match resampling {
        Resampling::Nearest => sample_nearest( band, px, py, nodata),
        Resampling::Bilinear => sample_bilinear( band, px, py, nodata),
    }
}

/// resample all bands of `src` into the grid of `dst`, reprojecting if the frames differ.
/// Pixel centers of `dst` are mapped into `src` pixel space. Returns the number of written pixels
pub fn warp_into<T: RasterValue> (src: &Raster<T>, dst: &mut Raster<T>, resampling: Resampling, policy: WritePolicy)->Result<usize> {
    if src.band_count() != dst.band_count() {
        return Err( invalid_raster( format!("band count mismatch {} vs {}", src.band_count(), dst.band_count())))
    }

    let to_src = SrsTransform::new( dst.epsg, src.epsg)?;
    let src_inv = invert_geotransform( &src.transform).ok_or_else( || invalid_raster("singular source transform"))?;
    let src_bounds = src.bounds();
    let dst_nodata = dst.nodata;
    let dst_tf = dst.transform;
    let (h,w) = (dst.height(), dst.width());
    let src_bands: Vec<ArrayView2<T>> = (0..src.band_count()).map( |b| src.band(b)).collect();
    let mut written = 0;

    for r in 0..h {
        for c in 0..w {
            if policy == WritePolicy::FillNodata && dst_nodata.is_some() {
                let all_set = (0..dst.band_count()).all( |b| valid( dst.data[[b,r,c]], dst_nodata));
                if all_set { continue }
            }

            let (x,y) = pixel_to_world( &dst_tf, c as f64 + 0.5, r as f64 + 0.5);
            let (sx,sy) = match to_src.transform_point( x, y) {
                Ok(p) => p,
                Err(_) => continue // outside of projection domain
            };
            if !to_src.is_identity() && (sx < src_bounds.west || sx > src_bounds.east || sy < src_bounds.south || sy > src_bounds.north) {
                continue
            }
            let (px,py) = pixel_to_world( &src_inv, sx, sy);

            let mut wrote = false;
            for (b,band) in src_bands.iter().enumerate() {
                if let Some(v) = sample( band, px, py, src.nodata, resampling) {
                    let cur = dst.data[[b,r,c]];
                    if policy == WritePolicy::Overwrite || !valid( cur, dst_nodata) {
                        let tv = T::from_f64_sample(v);
                        dst.data[[b,r,c]] = tv;
                        wrote = true;
                    }
                }
            }
            if wrote { written += 1 }
        }
    }

    Ok(written)
}

/// resample raster to a new square pixel size, keeping origin, rotation terms, frame and data type.
/// Rasters that are already within [`PIXEL_SIZE_TOLERANCE`] of the requested size are returned as is
pub fn resample<T: RasterValue> (raster: Raster<T>, target_pixel_size: f64)->Result<Raster<T>> {
    if !(target_pixel_size > 0.0) {
        return Err( invalid_raster( format!("invalid target pixel size {target_pixel_size}")))
    }

    let current = raster.transform[1].abs();
    if (current - target_pixel_size).abs() < PIXEL_SIZE_TOLERANCE {
        return Ok(raster)
    }

    let scale = current / target_pixel_size;
    let new_width = (raster.width() as f64 * scale).floor() as usize;
    let new_height = (raster.height() as f64 * scale).floor() as usize;
    if new_width == 0 || new_height == 0 {
        return Err( invalid_raster( format!("resampling {}x{} from {current} to {target_pixel_size} leaves no pixels", raster.width(), raster.height())))
    }
    debug!("resample {}x{} @{current} -> {new_width}x{new_height} @{target_pixel_size}", raster.width(), raster.height());

    let t = raster.transform;
    let transform: GeoTransform = [ t[0], target_pixel_size, t[2], t[3], t[4], -target_pixel_size ];
    let fill = raster.nodata.unwrap_or_default();
    let grid = RasterGrid::new( transform, new_width, new_height, raster.epsg);
    let mut out = Raster::filled( &grid, raster.band_count(), fill, raster.nodata)?;

    warp_into( &raster, &mut out, Resampling::Bilinear, WritePolicy::Overwrite)?;
    Ok(out)
}
