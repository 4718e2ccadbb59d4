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

//! construction of areas of interest (AOIs) from GeoJSON files and point coordinates.
//! All AOI geometries are in EPSG:4326 (lon/lat degrees)

use std::{fs, path::Path};
use geo::{Area, BooleanOps, Buffer, Centroid, MultiPolygon, Polygon, Rect};
use geojson::{feature::Id, Feature, GeoJson, JsonObject, JsonValue};
use tracing::{info, warn};

use truecolor_common::{utm::naive_utm_zone, BoundingBox};
use truecolor_raster::{mask::geometry_bounds, proj::{SrsTransform, DEFAULT_DENSIFY_PTS, EPSG_WGS84}};

use crate::{
    config::{CoordinateAoiConfig, DateRange, VectorAoiConfig},
    errors::{invalid_aoi, Result}
};

/// areas above this size (in km²) often fail because of memory or remote read timeouts
pub const LARGE_AOI_KM2: f64 = 1000.0;

/// squares that result in fewer pixels along each side are hardly usable
pub const MIN_EXPECTED_PIXELS: f64 = 20.0;

/// an immutable area of interest
#[derive(Debug,Clone,PartialEq)]
pub struct Aoi {
    pub geometry: MultiPolygon<f64>,
    pub bbox: BoundingBox<f64>,
}

impl Aoi {
    pub fn new (geometry: MultiPolygon<f64>)->Result<Self> {
        let bbox = geometry_bounds( &geometry).ok_or_else( || invalid_aoi("empty geometry"))?;
        let finite = bbox.to_minmax_array().iter().all( |v| v.is_finite());
        if !finite || !(geometry.unsigned_area() > 0.0) {
            return Err( invalid_aoi( format!("degenerate geometry with bounds {bbox:?}")))
        }
        Ok( Aoi { geometry, bbox } )
    }

    pub fn from_bbox (bbox: &BoundingBox<f64>)->Result<Self> {
        if bbox.is_empty() {
            return Err( invalid_aoi( format!("empty bounding box {bbox:?}")))
        }
        let rect = Rect::new( (bbox.west, bbox.south), (bbox.east, bbox.north));
        Self::new( MultiPolygon( vec![ rect.to_polygon() ]))
    }

    /// EPSG code of the UTM zone that contains the center of the AOI bounds
    pub fn utm_epsg (&self)->u32 {
        let (lon,lat) = self.bbox.center();
        naive_utm_zone( lon, lat).epsg()
    }

    /// area in km², computed in the UTM zone of the AOI
    pub fn area_km2 (&self)->Result<f64> {
        let to_utm = SrsTransform::new( EPSG_WGS84, self.utm_epsg())?;
        let g = to_utm.transform_geometry( &self.geometry)?;
        Ok( g.unsigned_area() / 1_000_000.0 )
    }
}

/// replace blanks so that names can be used as file or directory names
pub fn safe_name (name: &str)->String {
    name.trim().replace(' ', "_")
}

/// location name for a coordinate square, e.g. "Coordinate_50_0755N_14_4378E"
pub fn coordinate_location_name (group: &str, lat: f64, lon: f64)->String {
    let lat_str = format!("{:.4}", lat.abs()).replace('.', "_");
    let lon_str = format!("{:.4}", lon.abs()).replace('.', "_");
    let lat_dir = if lat >= 0.0 { 'N' } else { 'S' };
    let lon_dir = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{group}_{lat_str}{lat_dir}_{lon_str}{lon_dir}")
}

/* #region vector files ******************************************************************************************/

/// a single (multi)polygon feature of a vector file
#[derive(Debug,Clone)]
pub struct AoiFeature {
    /// 0-based position within the file
    pub index: usize,
    pub id: Option<Id>,
    pub properties: JsonObject,
    pub geometry: MultiPolygon<f64>,
}

impl AoiFeature {
    /// the identifier stored in property `id_field`, or the feature id if there is no such property
    pub fn field_id (&self, id_field: &str)->Option<String> {
        match self.properties.get( id_field) {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            Some(JsonValue::Bool(b)) => Some(b.to_string()),
            Some(_) => None,
            None => match &self.id {
                Some(Id::String(s)) => Some(s.clone()),
                Some(Id::Number(n)) => Some(n.to_string()),
                None => None
            }
        }
    }
}

/// the features of a vector file and the AOI that is their union
#[derive(Debug,Clone)]
pub struct VectorAoi {
    pub features: Vec<AoiFeature>,
    pub aoi: Aoi,
}

fn to_multi_polygon (geom: geo::Geometry<f64>)->Result<MultiPolygon<f64>> {
    match geom {
        geo::Geometry::Polygon(p) => Ok( MultiPolygon( vec![p]) ),
        geo::Geometry::MultiPolygon(mp) => Ok(mp),
        geo::Geometry::Rect(r) => Ok( MultiPolygon( vec![r.to_polygon()]) ),
        geo::Geometry::GeometryCollection(gc) => {
            let mut polys: Vec<Polygon<f64>> = Vec::new();
            for g in gc {
                polys.extend( to_multi_polygon(g)?.0);
            }
            Ok( MultiPolygon(polys) )
        }
        other => Err( invalid_aoi( format!("unsupported AOI geometry type {other:?}")))
    }
}

fn union_all<'a> (polys: impl IntoIterator<Item=&'a MultiPolygon<f64>>)->MultiPolygon<f64> {
    polys.into_iter().fold( MultiPolygon( Vec::new()), |acc,p| {
        if acc.0.is_empty() { p.clone() } else { acc.union(p) }
    })
}

/// read polygon features from a GeoJSON file (FeatureCollection, Feature or bare Geometry)
pub fn load_aoi_file (path: impl AsRef<Path>)->Result<VectorAoi> {
    let path = path.as_ref();
    let contents = fs::read_to_string( path)?;
    let geojson: GeoJson = contents.parse()?;

    let features: Vec<Feature> = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![ Feature::from(g) ],
    };

    let mut aoi_features: Vec<AoiFeature> = Vec::with_capacity( features.len());
    for (index,f) in features.into_iter().enumerate() {
        let Some(geometry) = f.geometry else {
            warn!("feature {index} of {path:?} has no geometry, ignored");
            continue
        };
        let geometry = to_multi_polygon( geo::Geometry::<f64>::try_from( geometry)?)?;
        aoi_features.push( AoiFeature { index, id: f.id, properties: f.properties.unwrap_or_default(), geometry });
    }

    if aoi_features.is_empty() {
        return Err( invalid_aoi( format!("no polygon features in {path:?}")))
    }

    let aoi = Aoi::new( union_all( aoi_features.iter().map( |f| &f.geometry)))?;
    Ok( VectorAoi { features: aoi_features, aoi } )
}

/// grow a geometry by `meters` in the UTM zone of its centroid
pub fn buffer_geometry (geometry: &MultiPolygon<f64>, meters: f64)->Result<MultiPolygon<f64>> {
    let c = geometry.centroid().ok_or_else( || invalid_aoi("geometry without centroid"))?;
    let to_utm = SrsTransform::new( EPSG_WGS84, naive_utm_zone( c.x(), c.y()).epsg())?;

    let utm_geom = to_utm.transform_geometry( geometry)?;
    let buffered = utm_geom.buffer( meters);
    Ok( to_utm.inverse()?.transform_geometry( &buffered)? )
}

/* #endregion vector files */

/* #region coordinate squares ************************************************************************************/

/// square with side length `size_m` centered on (lat,lon), constructed in the UTM zone of the point
pub fn square_aoi (lat: f64, lon: f64, size_m: f64)->Result<Aoi> {
    if !(size_m > 0.0) {
        return Err( invalid_aoi( format!("invalid square size {size_m}")))
    }
    let to_utm = SrsTransform::new( EPSG_WGS84, naive_utm_zone( lon, lat).epsg())?;
    let (x,y) = to_utm.transform_point( lon, lat)?;

    let h = size_m / 2.0;
    let square = Rect::new( (x - h, y - h), (x + h, y + h)).to_polygon();
    let square = to_utm.inverse()?.transform_geometry( &square)?;
    Aoi::new( MultiPolygon( vec![square]))
}

/// bounding box of the squares around all coordinates, grown by `buffer_m` in the UTM zone of its center
pub fn overall_aoi (coords: &[(f64,f64)], size_m: f64, buffer_m: f64)->Result<Aoi> {
    let mut bounds: Option<BoundingBox<f64>> = None;
    for &(lat,lon) in coords {
        let bb = square_aoi( lat, lon, size_m)?.bbox;
        bounds = Some( match bounds { Some(b) => b.union( &bb), None => bb });
    }
    let mut bbox = bounds.ok_or_else( || invalid_aoi("no coordinates"))?;

    if buffer_m > 0.0 {
        let (lon,lat) = bbox.center();
        let to_utm = SrsTransform::new( EPSG_WGS84, naive_utm_zone( lon, lat).epsg())?;
        let utm_bbox = to_utm.transform_bounds( &bbox, DEFAULT_DENSIFY_PTS)?.buffered( buffer_m);
        bbox = to_utm.inverse()?.transform_bounds( &utm_bbox, DEFAULT_DENSIFY_PTS)?;
    }

    Aoi::from_bbox( &bbox)
}

/* #endregion coordinate squares */

/* #region AOI jobs **********************************************************************************************/

/// a named AOI to process
#[derive(Debug,Clone)]
pub struct AoiJob {
    /// used for log messages and output file names
    pub location: String,
    /// output sub directory (below tif/jpg dirs)
    pub folder: String,
    pub aoi: Aoi,
    pub date_range: DateRange,
}

impl AoiJob {
    pub fn new (location: impl ToString, aoi: Aoi, date_range: DateRange)->Self {
        let location = safe_name( &location.to_string());
        AoiJob { folder: location.clone(), location, aoi, date_range }
    }

    pub fn with_folder (mut self, folder: &str)->Self {
        self.folder = safe_name( folder);
        self
    }
}

/// the AOIs defined by a vector file config: either one AOI for the whole file or one per feature
pub fn vector_aoi_jobs (cfg: &VectorAoiConfig)->Result<Vec<AoiJob>> {
    info!("loading AOI {} from {:?}", cfg.location_name, cfg.aoi_file);
    let VectorAoi { features, aoi } = load_aoi_file( &cfg.aoi_file)?;
    info!("  {} features, bounds {:?}", features.len(), aoi.bbox);

    let aoi = if cfg.use_bounding_box && features.len() > 1 {
        info!("  using bounding box of all features");
        Aoi::from_bbox( &aoi.bbox)?
    } else {
        aoi
    };

    if cfg.process_as_single || features.len() == 1 {
        return Ok( vec![ AoiJob::new( &cfg.location_name, aoi, cfg.date_range) ])
    }

    let use_index = !features.iter().all( |f| f.field_id( &cfg.id_field).is_some());
    if use_index {
        warn!("  id field '{}' not found in all features, using index instead", cfg.id_field);
    }

    let mut jobs = Vec::with_capacity( features.len());
    for f in &features {
        let id = if use_index { (f.index + 1).to_string() } else { f.field_id( &cfg.id_field).unwrap_or_default() };
        let location = format!("{}_R{}", cfg.location_name, id);

        let geometry = if cfg.buffer_meters > 0.0 {
            buffer_geometry( &f.geometry, cfg.buffer_meters)?
        } else {
            f.geometry.clone()
        };

        let mut job = AoiJob::new( location, Aoi::new( geometry)?, cfg.date_range);
        if cfg.shared_folder {
            job = job.with_folder( &cfg.location_name);
        }
        jobs.push( job);
    }
    Ok(jobs)
}

/// one job per coordinate square, plus the overall AOI if enabled and there is more than one coordinate.
/// Construction errors are reported per location
pub fn coordinate_aoi_jobs (cfg: &CoordinateAoiConfig, target_resolution: f64)->Vec<(String,Result<AoiJob>)> {
    let group = &cfg.location_group_name;
    let expected_pixels = cfg.square_size_meters / target_resolution;
    info!("coordinate AOIs of {group}: {} squares of {}m (~{:.0}x{:.0} pixels)",
          cfg.coordinates.len(), cfg.square_size_meters, expected_pixels, expected_pixels);
    if expected_pixels < MIN_EXPECTED_PIXELS {
        warn!("square size {}m only yields {:.0}x{:.0} pixel images, recommend at least 500m", 
              cfg.square_size_meters, expected_pixels, expected_pixels);
    }

    let mut jobs: Vec<(String,Result<AoiJob>)> = cfg.coordinates.iter().map( |&(lat,lon)| {
        let location = coordinate_location_name( group, lat, lon);
        let job = square_aoi( lat, lon, cfg.square_size_meters).map( |aoi| AoiJob::new( &location, aoi, cfg.date_range));
        (location, job)
    }).collect();

    if cfg.coordinates.len() > 1 {
        if cfg.process_overall {
            let location = format!("{group}_overall");
            let job = overall_aoi( &cfg.coordinates, cfg.square_size_meters, cfg.overall_buffer_meters).and_then( |aoi| {
                let area = aoi.area_km2()?;
                info!("overall AOI {location}: {:.2} km², buffer {}m", area, cfg.overall_buffer_meters);
                if area > LARGE_AOI_KM2 {
                    warn!("large AOI ({area:.0} km²) may fail due to timeout or memory issues, consider reducing overall_buffer_meters (currently {}m)", 
                          cfg.overall_buffer_meters);
                }
                Ok( AoiJob::new( &location, aoi, cfg.date_range))
            });
            jobs.push( (location, job));
        } else {
            info!("overall AOI of {group} disabled");
        }
    }

    jobs
}

/* #endregion AOI jobs */
