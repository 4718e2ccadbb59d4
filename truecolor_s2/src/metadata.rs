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

//! the human readable metadata document that accompanies each exported image

use std::{fmt::Write as FmtWrite, fs, path::{Path, PathBuf}};
use chrono::NaiveDate;
use tracing::info;

use truecolor_common::{datetime::{short_utc_datetime_string, utc_now}, fs::{commit_tmp, tmp_path}};
use truecolor_raster::{proj::{linear_units, proj_string}, RasterProfile};

use crate::{catalog::ImageTile, config::TrueColorConfig, errors::{op_failed, Result}};

const RULE_WIDTH: usize = 70;

fn heading (doc: &mut String, title: &str) {
    let _ = writeln!( doc, "{}\n{title}\n{}", "-".repeat( RULE_WIDTH), "-".repeat( RULE_WIDTH));
}

fn or_na<T: ToString> (v: &Option<T>)->String {
    v.as_ref().map( |v| v.to_string()).unwrap_or_else( || "N/A".to_string())
}

/// render the metadata document text
pub fn metadata_doc (location: &str, date: &NaiveDate, tiles: &[ImageTile], profile: &RasterProfile, cfg: &TrueColorConfig)->String {
    let mut doc = String::with_capacity( 4096);
    let rule = "=".repeat( RULE_WIDTH);
    let epsg = profile.epsg();
    let (px_w, px_h) = profile.grid.pixel_size();
    let gt = profile.transform();
    let bounds = profile.bounds();

    let _ = writeln!( doc, "{rule}\nSENTINEL-2 TRUE COLOR IMAGE METADATA\n{rule}\n");
    let _ = writeln!( doc, "Location: {location}");
    let _ = writeln!( doc, "Acquisition Date: {date}");
    let _ = writeln!( doc, "Processing Date: {}", short_utc_datetime_string( &utc_now()));
    let _ = writeln!( doc, "Number of Tiles: {}\n", tiles.len());

    heading( &mut doc, "PROJECTION & COORDINATE SYSTEM");
    let _ = writeln!( doc, "Projection: {}", proj_string( epsg).unwrap_or("N/A"));
    let _ = writeln!( doc, "EPSG Code: {epsg}");
    let _ = writeln!( doc, "Linear Units: {}\n", linear_units( epsg));

    heading( &mut doc, "IMAGE PROPERTIES");
    let _ = writeln!( doc, "Width: {} pixels", profile.width());
    let _ = writeln!( doc, "Height: {} pixels", profile.height());
    let _ = writeln!( doc, "Resolution: {}m/pixel", cfg.output.target_resolution);
    let _ = writeln!( doc, "Bands: RGB (Red: {}, Green: {}, Blue: {})", cfg.bands.red, cfg.bands.green, cfg.bands.blue);
    let _ = writeln!( doc, "Data Type: {}\n", profile.data_type);

    let width_m = profile.width() as f64 * px_w;
    let height_m = profile.height() as f64 * px_h;
    let _ = writeln!( doc, "Coverage: {:.3} km x {:.3} km", width_m / 1000.0, height_m / 1000.0);
    let _ = writeln!( doc, "Total Area: {:.3} km²\n", width_m * height_m / 1_000_000.0);

    heading( &mut doc, "GEOTRANSFORM");
    let _ = writeln!( doc, "Origin X: {:.2}", gt[0]);
    let _ = writeln!( doc, "Origin Y: {:.2}", gt[3]);
    let _ = writeln!( doc, "Pixel Width: {:.2}", gt[1]);
    let _ = writeln!( doc, "Pixel Height: {:.2}", -gt[5]);
    let _ = writeln!( doc, "Rotation: {:.2}, {:.2}\n", gt[2], gt[4]);

    let _ = writeln!( doc, "Bounds:");
    let _ = writeln!( doc, "  West: {:.2}", bounds.west);
    let _ = writeln!( doc, "  South: {:.2}", bounds.south);
    let _ = writeln!( doc, "  East: {:.2}", bounds.east);
    let _ = writeln!( doc, "  North: {:.2}\n", bounds.north);

    heading( &mut doc, "SENTINEL-2 TILE INFORMATION");
    for (i,tile) in tiles.iter().enumerate() {
        let _ = writeln!( doc, "\nTile {}:", i+1);
        let _ = writeln!( doc, "  Product ID: {}", tile.id);
        let _ = writeln!( doc, "  Acquisition Time: {}", tile.datetime.to_rfc3339());
        let _ = writeln!( doc, "  Satellite: {}", or_na( &tile.platform.as_ref().map( |p| p.to_uppercase())));
        let _ = writeln!( doc, "  Orbit Direction: {}", or_na( &tile.orbit_state));
        let _ = writeln!( doc, "  Relative Orbit: {}", or_na( &tile.relative_orbit));
        let _ = writeln!( doc, "  Cloud Cover: {}", or_na( &tile.cloud_cover.map( |c| format!("{c:.2}%"))));
        let _ = writeln!( doc, "  Processing Baseline: {}", or_na( &tile.processing_baseline));
        let _ = writeln!( doc, "  MGRS Tile: {}", or_na( &tile.mgrs_tile));
    }
    let _ = writeln!( doc);

    heading( &mut doc, "PROCESSING INFORMATION");
    let _ = writeln!( doc, "Normalization Method: linear gain, clipped to [0,1]");
    let _ = writeln!( doc, "Gain Factor: {}", cfg.output.gain);
    let _ = writeln!( doc, "Compression (GeoTIFF): {}", cfg.output.compression);
    let _ = writeln!( doc, "JPEG Quality: {}", cfg.output.jpg_quality);
    let _ = writeln!( doc, "Max Cloud Cover Filter: {}%", cfg.sentinel2.max_cloud_cover);
    let _ = writeln!( doc, "Min AOI Coverage: {}%\n", cfg.sentinel2.min_aoi_coverage);

    let _ = writeln!( doc, "{rule}\nEnd of Metadata\n{rule}");
    doc
}

/// write the metadata document `<dir>/<base_name>.txt`, returning its path
pub fn write_metadata_doc (dir: impl AsRef<Path>, base_name: &str, location: &str, date: &NaiveDate, tiles: &[ImageTile],
                           profile: &RasterProfile, cfg: &TrueColorConfig)->Result<PathBuf> {
    if base_name.is_empty() {
        return Err( op_failed("empty metadata document name"))
    }
    let path = dir.as_ref().join( format!("{base_name}.txt"));
    let tmp = tmp_path( &path);

    fs::write( &tmp, metadata_doc( location, date, tiles, profile, cfg))?;
    commit_tmp( &tmp, &path)?;

    info!("  saved metadata {:?}", path);
    Ok(path)
}
