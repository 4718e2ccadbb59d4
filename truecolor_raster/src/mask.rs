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

//! cropping and masking of rasters with polygons

use geo::{BoundingRect, Coord, LineString, MultiPolygon};
use ndarray::Array2;
use truecolor_common::BoundingBox;

use crate::{
    errors::{invalid_raster, RasterError, Result}, invert_geotransform, pixel_to_world,
    PixelWindow, Raster, RasterGrid, RasterValue
};

pub fn geometry_bounds (poly: &MultiPolygon<f64>)->Option<BoundingBox<f64>> {
    poly.bounding_rect().map( |r| BoundingBox::new( r.min().x, r.min().y, r.max().x, r.max().y))
}

/// the minimal window of `grid` that contains the polygon (which has to be in the grid frame)
pub fn polygon_window (grid: &RasterGrid, poly: &MultiPolygon<f64>)->Option<PixelWindow> {
    geometry_bounds(poly).and_then( |bb| grid.window_for_bounds( &bb))
}

/// boolean mask of all grid pixels whose center lies inside the polygon (even-odd rule, which
/// handles holes). The polygon has to be in the grid frame
pub fn rasterize_polygon (grid: &RasterGrid, poly: &MultiPolygon<f64>)->Result<Array2<bool>> {
    let inv = invert_geotransform( &grid.transform).ok_or_else( || invalid_raster("singular transform"))?;
    let mut mask = Array2::from_elem( (grid.height, grid.width), false);

    // all ring edges in pixel space
    let mut edges: Vec<(Coord<f64>,Coord<f64>)> = Vec::new();
    let mut add_ring = |ring: &LineString<f64>| {
        for line in ring.lines() {
            let (x0,y0) = pixel_to_world( &inv, line.start.x, line.start.y);
            let (x1,y1) = pixel_to_world( &inv, line.end.x, line.end.y);
            edges.push( (Coord{x:x0,y:y0}, Coord{x:x1,y:y1}) );
        }
    };
    for p in poly.iter() {
        add_ring( p.exterior());
        for hole in p.interiors() { add_ring( hole) }
    }

    let mut xs: Vec<f64> = Vec::new();
    for r in 0..grid.height {
        let y = r as f64 + 0.5;
        xs.clear();
        for (a,b) in &edges {
            if (a.y <= y) != (b.y <= y) {
                xs.push( a.x + (y - a.y) * (b.x - a.x) / (b.y - a.y));
            }
        }
        xs.sort_by( |a,b| a.total_cmp(b));

        for pair in xs.chunks_exact(2) {
            // columns whose center c+0.5 is in [x0,x1)
            let c0 = (pair[0] - 0.5).ceil().max(0.0) as usize;
            let c1 = ((pair[1] - 0.5).ceil().max(0.0) as usize).min( grid.width);
            for c in c0..c1 {
                mask[[r,c]] = true;
            }
        }
    }

    Ok(mask)
}

/// set all samples outside of the polygon to `fill`
pub fn mask_outside<T: RasterValue> (raster: &mut Raster<T>, poly: &MultiPolygon<f64>, fill: T)->Result<()> {
    let mask = rasterize_polygon( &raster.grid(), poly)?;
    for b in 0..raster.band_count() {
        let mut band = raster.band_mut(b);
        ndarray::Zip::from( &mut band).and( &mask).for_each( |v, inside| {
            if !*inside { *v = fill }
        });
    }
    Ok(())
}

/// crop the raster to the minimal window that contains the polygon and set samples outside of the
/// polygon to nodata (zero if the raster has no nodata value). The polygon has to be in the raster frame
pub fn crop_to_polygon<T: RasterValue> (raster: &Raster<T>, poly: &MultiPolygon<f64>)->Result<Raster<T>> {
    let win = polygon_window( &raster.grid(), poly)
        .ok_or_else( || RasterError::NoOverlap("polygon does not intersect raster".to_string()))?;

    let mut cropped = raster.window( &win)?;
    let fill = raster.nodata.unwrap_or_default();
    mask_outside( &mut cropped, poly, fill)?;
    Ok(cropped)
}
