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

//! point, geometry and bounds projection between EPSG reference frames, based on proj4rs with
//! the EPSG definitions from crs-definitions

use geo::{line_measures::{Densifiable, Euclidean}, Coord, MapCoords};
use proj4rs::proj::Proj;
use truecolor_common::BoundingBox;

use crate::{bounds_of_points, errors::{projection_error, Result}};

pub const EPSG_WGS84: u32 = 4326;

/// PROJ.4 definition of an EPSG code, if crs-definitions knows it
pub fn proj_string (epsg: u32)->Option<&'static str> {
    u16::try_from(epsg).ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}

pub fn is_geographic (epsg: u32)->bool {
    match proj_string(epsg) {
        Some(s) => s.contains("+proj=longlat") || s.contains("+proj=latlong"),
        None => epsg == EPSG_WGS84
    }
}

/// unit name of the frame axes
pub fn linear_units (epsg: u32)->&'static str {
    if is_geographic(epsg) { 
        "degree"
    } else {
        match proj_string(epsg) {
            Some(s) if s.contains("+units=us-ft") => "US survey foot",
            Some(s) if s.contains("+units=ft") => "foot",
            Some(_) => "metre",
            None => "unknown"
        }
    }
}

fn new_proj (epsg: u32)->Result<Proj> {
    let def = proj_string(epsg).ok_or_else( || projection_error( format!("EPSG:{epsg} is not a known reference frame")))?;
    Proj::from_proj_string(def).map_err( |e| projection_error( format!("invalid projection EPSG:{epsg}: {e:?}")))
}

/// a reusable transformation between two EPSG frames. Geographic coordinates are lon/lat degrees
pub struct SrsTransform {
    src_epsg: u32,
    dst_epsg: u32,
    projs: Option<(Proj,Proj)>, // None for identity
    src_geo: bool,
    dst_geo: bool,
}

impl SrsTransform {
    pub fn new (src_epsg: u32, dst_epsg: u32)->Result<Self> {
        let projs = if src_epsg == dst_epsg { None } else { Some( (new_proj(src_epsg)?, new_proj(dst_epsg)?) ) };
        Ok( SrsTransform { src_epsg, dst_epsg, projs, src_geo: is_geographic(src_epsg), dst_geo: is_geographic(dst_epsg) } )
    }

    pub fn src_epsg (&self)->u32 { self.src_epsg }
    pub fn dst_epsg (&self)->u32 { self.dst_epsg }
    pub fn is_identity (&self)->bool { self.projs.is_none() }

    pub fn inverse (&self)->Result<SrsTransform> {
        SrsTransform::new( self.dst_epsg, self.src_epsg)
    }

    pub fn transform_point (&self, x: f64, y: f64)->Result<(f64,f64)> {
        if let Some((src,dst)) = &self.projs {
            let mut p = if self.src_geo { (x.to_radians(), y.to_radians(), 0.0) } else { (x, y, 0.0) };
            proj4rs::transform::transform( src, dst, &mut p)
                .map_err( |e| projection_error( format!("EPSG:{} -> EPSG:{} failed for ({x},{y}): {e:?}", self.src_epsg, self.dst_epsg)))?;

            let (tx,ty) = if self.dst_geo { (p.0.to_degrees(), p.1.to_degrees()) } else { (p.0, p.1) };
            if tx.is_finite() && ty.is_finite() {
                Ok( (tx,ty) )
            } else {
                Err( projection_error( format!("EPSG:{} -> EPSG:{} has no finite result for ({x},{y})", self.src_epsg, self.dst_epsg)))
            }
        } else {
            Ok( (x,y) )
        }
    }

    #[inline]
    pub fn transform_coord (&self, c: Coord<f64>)->Result<Coord<f64>> {
        let (x,y) = self.transform_point( c.x, c.y)?;
        Ok( Coord { x, y } )
    }

    /// transform a geometry after densifying its edges so that straight source edges follow their
    /// projected curves (at most [`MAX_GEO_SEGMENT_DEG`] or [`MAX_PROJECTED_SEGMENT`] between vertices)
    pub fn transform_geometry<G> (&self, g: &G)->Result<<G::Output as MapCoords<f64,f64>>::Output>
        where G: Densifiable<f64>, G::Output: MapCoords<f64,f64>
    {
        let max_segment = if self.src_geo { MAX_GEO_SEGMENT_DEG } else { MAX_PROJECTED_SEGMENT };
        g.densify( &Euclidean, max_segment).try_map_coords( |c| self.transform_coord(c))
    }

    /// transform bounds by sampling `densify` points along each edge and computing the extent of
    /// the transformed points
    pub fn transform_bounds (&self, bbox: &BoundingBox<f64>, densify: usize)->Result<BoundingBox<f64>> {
        if self.is_identity() { return Ok(*bbox) }

        let n = densify.max(1) + 1;
        let mut pts: Vec<(f64,f64)> = Vec::with_capacity( 4*n);
        for i in 0..=n {
            let f = i as f64 / n as f64;
            let x = bbox.west + f * (bbox.east - bbox.west);
            let y = bbox.south + f * (bbox.north - bbox.south);
            pts.push( self.transform_point( x, bbox.south)?);
            pts.push( self.transform_point( x, bbox.north)?);
            pts.push( self.transform_point( bbox.west, y)?);
            pts.push( self.transform_point( bbox.east, y)?);
        }
        Ok( bounds_of_points(&pts) )
    }
}

/// GDAL's recommended number of edge points for bounds transformation
pub const DEFAULT_DENSIFY_PTS: usize = 21;

/// max edge length of geographic geometries before they get projected (about 100m)
pub const MAX_GEO_SEGMENT_DEG: f64 = 0.001;

/// max edge length of projected geometries (in frame units) before they get projected
pub const MAX_PROJECTED_SEGMENT: f64 = 100.0;
