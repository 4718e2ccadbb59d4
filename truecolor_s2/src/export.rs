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

//! output file layout and export of GeoTIFF and JPEG images. Files are written to temporary paths
//! first so that an interrupted run never leaves partial files that look complete

use std::{io::{BufWriter, Write}, path::{Path, PathBuf}};
use chrono::NaiveDate;
use image::{codecs::jpeg::JpegEncoder, ExtendedColorType};
use tracing::info;

use truecolor_common::{
    datetime::yyyymmdd, fs::{commit_tmp, create_file_with_parents, ensure_writable_dir, is_non_empty_file, tmp_path}
};
use truecolor_raster::{geotiff::{write_rgb_geotiff_file, GeoTiffCompression, TiffRgbSample}, Raster};

use crate::{config::OutputConfig, errors::{op_failed, Result}};

/// where the products of one (location,date) go
#[derive(Debug,Clone,PartialEq)]
pub struct OutputPaths {
    /// "<location>_<yyyymmdd>"
    pub base_name: String,
    pub tif: PathBuf,
    pub jpg: PathBuf,
    /// metadata document (next to the GeoTIFF)
    pub doc: PathBuf,
}

impl OutputPaths {
    /// `<base_dir>/<tif_subdir>/<folder>/<location>_<yyyymmdd>.tif` and the same for jpg
    pub fn new (cfg: &OutputConfig, folder: &str, location: &str, date: &NaiveDate)->Self {
        let base_name = format!("{}_{}", location, yyyymmdd( date));
        let tif_dir = cfg.base_dir.join( &cfg.tif_subdir).join( folder);
        let jpg_dir = cfg.base_dir.join( &cfg.jpg_subdir).join( folder);

        OutputPaths {
            tif: tif_dir.join( format!("{base_name}.tif")),
            jpg: jpg_dir.join( format!("{base_name}.jpg")),
            doc: tif_dir.join( format!("{base_name}.txt")),
            base_name,
        }
    }

    /// do we already have both images (empty files don't count)
    pub fn images_exist (&self)->bool {
        is_non_empty_file( &self.tif) && is_non_empty_file( &self.jpg)
    }

    pub fn tif_dir (&self)->&Path { self.tif.parent().unwrap_or( Path::new(".")) }
}

/// write a 3 band raster as georeferenced RGB GeoTIFF. Missing output directories are created
pub fn export_geotiff<T: TiffRgbSample> (raster: &Raster<T>, path: impl AsRef<Path>, compression: GeoTiffCompression)->Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter( |d| !d.as_os_str().is_empty()) {
        ensure_writable_dir( dir)?;
    }
    let tmp = tmp_path( path);
    write_rgb_geotiff_file( raster, &tmp, compression)?;
    commit_tmp( &tmp, path)?;
    info!("  saved GeoTIFF {:?}", path);
    Ok(())
}

/// write a 3 band 8 bit raster as RGB JPEG with the given quality (1..=100)
pub fn export_jpeg (raster: &Raster<u8>, path: impl AsRef<Path>, quality: u8)->Result<()> {
    if raster.band_count() != 3 {
        return Err( op_failed( format!("JPEG export needs 3 bands, got {}", raster.band_count())))
    }
    if !(1..=100).contains( &quality) {
        return Err( op_failed( format!("invalid JPEG quality {quality}")))
    }

    let path = path.as_ref();
    let (w,h) = (raster.width() as u32, raster.height() as u32);
    let interleaved: Vec<u8> = raster.data.view().permuted_axes([1,2,0]).iter().copied().collect();

    let tmp = tmp_path( path);
    let mut writer = BufWriter::new( create_file_with_parents( &tmp)?);
    JpegEncoder::new_with_quality( &mut writer, quality).encode( &interleaved, w, h, ExtendedColorType::Rgb8)?;
    writer.flush()?;
    drop(writer);

    commit_tmp( &tmp, path)?;
    info!("  saved JPEG {:?}", path);
    Ok(())
}
