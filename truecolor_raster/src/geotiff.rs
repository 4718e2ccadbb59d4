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

//! GeoTIFF access based on the `tiff` crate: windowed reads of single band (cloud optimized) GeoTIFFs,
//! profile queries and RGB GeoTIFF export with georeferencing tags

use std::{fs::File, io::{BufReader, BufWriter, Read, Seek, Write}, path::Path};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use strum::Display;
use tiff::{
    decoder::Decoder, tags::Tag, ColorType,
    encoder::{colortype, Compression, DeflateLevel, DirectoryEncoder, TiffEncoder, TiffKind},
};

use crate::{
    errors::{invalid_raster, unsupported_format, Result}, is_north_up, proj::is_geographic,
    DataType, GeoTransform, PixelWindow, Raster, RasterGrid, RasterProfile, RasterValue, source::RasterSource
};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE_KEY: u16 = 1024;
const GT_RASTER_TYPE_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

#[inline]
fn tag (code: u16)->Tag { Tag::from_u16_exhaustive(code) }

#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize,Display)]
pub enum GeoTiffCompression {
    #[strum(serialize = "None")]
    Uncompressed,
    #[strum(serialize = "LZW")]
    Lzw,
    #[strum(serialize = "DEFLATE")]
    Deflate
}

impl GeoTiffCompression {
    fn tiff_compression (&self)->Compression {
        match self {
            GeoTiffCompression::Uncompressed => Compression::Uncompressed,
            GeoTiffCompression::Lzw => Compression::Lzw,
            GeoTiffCompression::Deflate => Compression::Deflate( DeflateLevel::Balanced),
        }
    }
}

/* #region reading ***********************************************************************************************/

fn find_f64_vec<R: Read + Seek> (decoder: &mut Decoder<R>, code: u16)->Result<Option<Vec<f64>>> {
    match decoder.find_tag( tag(code))? {
        Some(v) => Ok( Some( v.into_f64_vec()?) ),
        None => Ok(None)
    }
}

fn find_u16_vec<R: Read + Seek> (decoder: &mut Decoder<R>, code: u16)->Result<Option<Vec<u16>>> {
    match decoder.find_tag( tag(code))? {
        Some(v) => Ok( Some( v.into_u16_vec()?) ),
        None => Ok(None)
    }
}

fn geo_key (keys: &[u16], key_id: u16)->Option<u16> {
    if keys.len() < 4 { return None }
    let n = keys[3] as usize;
    keys[4..].chunks_exact(4).take(n)
        .find( |k| k[0] == key_id && k[1] == 0) // only keys with inline values
        .map( |k| k[3])
}

/// read transform and EPSG code from GeoTIFF tags
fn read_georeference<R: Read + Seek> (decoder: &mut Decoder<R>)->Result<(GeoTransform,u32)> {
    let keys = find_u16_vec( decoder, GEO_KEY_DIRECTORY)?.ok_or_else( || unsupported_format("no GeoKeyDirectory"))?;

    let epsg = match (geo_key( &keys, PROJECTED_CS_TYPE_KEY), geo_key( &keys, GEOGRAPHIC_TYPE_KEY)) {
        (Some(code),_) if code != USER_DEFINED => code as u32,
        (_,Some(code)) if code != USER_DEFINED => code as u32,
        _ => return Err( unsupported_format("no EPSG reference frame in GeoKeyDirectory"))
    };

    let mut transform: GeoTransform = if let Some(m) = find_f64_vec( decoder, MODEL_TRANSFORMATION)? {
        if m.len() < 8 { return Err( unsupported_format("short ModelTransformation")) }
        [ m[3], m[0], m[1], m[7], m[4], m[5] ]

    } else {
        let scale = find_f64_vec( decoder, MODEL_PIXEL_SCALE)?.ok_or_else( || unsupported_format("no ModelPixelScale"))?;
        let tp = find_f64_vec( decoder, MODEL_TIEPOINT)?.ok_or_else( || unsupported_format("no ModelTiepoint"))?;
        if scale.len() < 2 || tp.len() < 6 { return Err( unsupported_format("short ModelPixelScale/ModelTiepoint")) }

        let (sx,sy) = (scale[0], scale[1]);
        [ tp[3] - tp[0]*sx, sx, 0.0, tp[4] + tp[1]*sy, 0.0, -sy ]
    };

    if geo_key( &keys, GT_RASTER_TYPE_KEY) == Some(RASTER_PIXEL_IS_POINT) {
        // tie points refer to pixel centers
        transform[0] -= (transform[1] + transform[2]) / 2.0;
        transform[3] -= (transform[4] + transform[5]) / 2.0;
    }

    Ok( (transform, epsg) )
}

fn read_nodata<R: Read + Seek> (decoder: &mut Decoder<R>)->Result<Option<f64>> {
    match decoder.find_tag( tag(GDAL_NODATA))? {
        Some(v) => {
            let s = v.into_string()?;
            Ok( s.trim_matches( |c: char| c == '\0' || c.is_whitespace()).parse::<f64>().ok() )
        }
        None => Ok(None)
    }
}

fn read_profile_from_decoder<R: Read + Seek> (decoder: &mut Decoder<R>)->Result<RasterProfile> {
    let (w,h) = decoder.dimensions()?;
    let (band_count, bits) = match decoder.colortype()? {
        ColorType::Gray(b) => (1, b),
        ColorType::RGB(b) => (3, b),
        ColorType::RGBA(b) => (4, b),
        ColorType::Multiband { bit_depth, num_samples } => (num_samples as usize, bit_depth),
        other => return Err( unsupported_format( format!("color type {other:?}")))
    };
    let sample_format = find_u16_vec( decoder, Tag::SampleFormat.to_u16())?
        .and_then( |v| v.first().copied())
        .unwrap_or(1);
    let data_type = DataType::from_tiff( bits, sample_format)
        .ok_or_else( || unsupported_format( format!("{bits} bit samples of format {sample_format}")))?;

    let (transform, epsg) = read_georeference( decoder)?;
    let nodata = read_nodata( decoder)?;

    Ok( RasterProfile {
        grid: RasterGrid::new( transform, w as usize, h as usize, epsg),
        band_count,
        data_type,
        nodata
    })
}

/// spatial metadata of a GeoTIFF file
pub fn read_profile (path: impl AsRef<Path>)->Result<RasterProfile> {
    let reader = BufReader::new( File::open( path.as_ref())?);
    let mut decoder = Decoder::new( reader)?;
    read_profile_from_decoder( &mut decoder)
}

/// a single band GeoTIFF from which we read pixel windows chunk by chunk (tiles or strips). Only the
/// chunks that overlap a requested window are decoded, which makes this suitable for remote
/// cloud optimized GeoTIFFs if `R` is backed by HTTP range requests
pub struct GeoTiffSource<R: Read + Seek> {
    name: String,
    decoder: Decoder<R>,
    profile: RasterProfile,
    chunk_size: (usize,usize),
    chunks_across: usize,
}

impl <R: Read + Seek> GeoTiffSource<R> {
    pub fn open (reader: R, name: impl ToString)->Result<Self> {
        let mut decoder = Decoder::new( reader)?;
        let profile = read_profile_from_decoder( &mut decoder)?;
        if profile.band_count != 1 {
            return Err( unsupported_format( format!("{} bands (only single band GeoTIFFs can be read)", profile.band_count)))
        }

        let (cw,ch) = decoder.chunk_dimensions();
        let chunk_size = (cw as usize, ch as usize);
        if chunk_size.0 == 0 || chunk_size.1 == 0 {
            return Err( unsupported_format("zero chunk size"))
        }
        let chunks_across = profile.width().div_ceil( chunk_size.0);

        Ok( GeoTiffSource { name: name.to_string(), decoder, profile, chunk_size, chunks_across } )
    }
}

impl GeoTiffSource<BufReader<File>> {
    pub fn open_file (path: impl AsRef<Path>)->Result<Self> {
        let path = path.as_ref();
        let name = path.file_name().and_then( |s| s.to_str()).unwrap_or("?").to_string();
        Self::open( BufReader::new( File::open(path)?), name)
    }
}

impl <T: RasterValue, R: Read + Seek> RasterSource<T> for GeoTiffSource<R> {
    fn name (&self)->&str { &self.name }

    fn profile (&self)->&RasterProfile { &self.profile }

    fn read_window (&mut self, win: &PixelWindow)->Result<Raster<T>> {
        let grid = self.profile.grid;
        if win.width == 0 || win.height == 0 || win.col_end() > grid.width || win.row_end() > grid.height {
            return Err( invalid_raster( format!("window {win:?} outside of {}x{} raster {}", grid.width, grid.height, self.name)))
        }

        let nodata: Option<T> = self.profile.nodata.map( T::from_f64_sample);
        let mut band = Array2::from_elem( (win.height, win.width), nodata.unwrap_or_default());
        let (cw,ch) = self.chunk_size;

        for chunk_row in (win.row_off / ch)..=((win.row_end() - 1) / ch) {
            for chunk_col in (win.col_off / cw)..=((win.col_end() - 1) / cw) {
                let idx = (chunk_row * self.chunks_across + chunk_col) as u32;
                let (dw,dh) = self.decoder.chunk_data_dimensions( idx);
                let (dw,dh) = (dw as usize, dh as usize);
                let data = T::from_decoding_result( self.decoder.read_chunk( idx)?)?;
                if data.len() < dw * dh {
                    return Err( invalid_raster( format!("short chunk {idx} in {}", self.name)))
                }

                let (x0,y0) = (chunk_col * cw, chunk_row * ch);
                let c_start = win.col_off.max(x0);
                let c_end = win.col_end().min(x0 + dw);
                let r_start = win.row_off.max(y0);
                let r_end = win.row_end().min(y0 + dh);

                for r in r_start..r_end {
                    let src_row = &data[(r - y0)*dw .. (r - y0 + 1)*dw];
                    for c in c_start..c_end {
                        band[[r - win.row_off, c - win.col_off]] = src_row[c - x0];
                    }
                }
            }
        }

        let wgrid = grid.window_grid( win);
        Raster::from_band( band, wgrid.transform, grid.epsg, nodata)
    }
}

/* #endregion reading */

/* #region writing ***********************************************************************************************/

fn geo_key_directory (epsg: u32)->Result<Vec<u16>> {
    let code = u16::try_from(epsg).map_err( |_| unsupported_format( format!("EPSG:{epsg} cannot be stored in a GeoKeyDirectory")))?;
    let (model_type, crs_key) = if is_geographic(epsg) {
        (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE_KEY)
    } else {
        (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE_KEY)
    };

    Ok( vec![
        1, 1, 0, 3, // version, revision, minor revision, number of keys
        GT_MODEL_TYPE_KEY, 0, 1, model_type,
        GT_RASTER_TYPE_KEY, 0, 1, RASTER_PIXEL_IS_AREA,
        crs_key, 0, 1, code,
    ])
}

fn write_geotiff_tags<W: Write + Seek, K: TiffKind> (dir: &mut DirectoryEncoder<'_,W,K>, profile: &RasterProfile)->Result<()> {
    let gt = profile.grid.transform;

    if is_north_up( &gt) {
        let pixel_scale = [ gt[1], -gt[5], 0.0 ];
        dir.write_tag( tag(MODEL_PIXEL_SCALE), pixel_scale.as_slice())?;

        let tiepoint = [ 0.0, 0.0, 0.0, gt[0], gt[3], 0.0 ];
        dir.write_tag( tag(MODEL_TIEPOINT), tiepoint.as_slice())?;
    } else {
        let m = [ 
            gt[1], gt[2], 0.0, gt[0],
            gt[4], gt[5], 0.0, gt[3],
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0
        ];
        dir.write_tag( tag(MODEL_TRANSFORMATION), m.as_slice())?;
    }

    let keys = geo_key_directory( profile.grid.epsg)?;
    dir.write_tag( tag(GEO_KEY_DIRECTORY), keys.as_slice())?;

    if let Some(nodata) = profile.nodata {
        let s = format!("{nodata}");
        dir.write_tag( tag(GDAL_NODATA), s.as_str())?;
    }
    Ok(())
}

/// sample types we can write as RGB GeoTIFFs
pub trait TiffRgbSample: RasterValue {
    fn write_rgb<W: Write + Seek> (enc: &mut TiffEncoder<W>, profile: &RasterProfile, data: &[Self])->Result<()>;
}

macro_rules! impl_tiff_rgb_sample {
    ( $( $t:ty => $ct:ident ),* ) => {
        $(
            impl TiffRgbSample for $t {
                fn write_rgb<W: Write + Seek> (enc: &mut TiffEncoder<W>, profile: &RasterProfile, data: &[Self])->Result<()> {
                    let mut image = enc.new_image::<colortype::$ct>( profile.width() as u32, profile.height() as u32)?;
                    write_geotiff_tags( image.encoder(), profile)?;
                    image.write_data( data)?;
                    Ok(())
                }
            }
        )*
    }
}
impl_tiff_rgb_sample!{ u8 => RGB8, u16 => RGB16, f32 => RGB32Float }

/// write a 3 band raster as pixel interleaved RGB GeoTIFF
pub fn write_rgb_geotiff<T: TiffRgbSample, W: Write + Seek> (raster: &Raster<T>, writer: W, compression: GeoTiffCompression)->Result<()> {
    if raster.band_count() != 3 {
        return Err( invalid_raster( format!("RGB GeoTIFF needs 3 bands, got {}", raster.band_count())))
    }

    let (h,w) = (raster.height(), raster.width());
    let mut data: Vec<T> = Vec::with_capacity( 3*w*h);
    for r in 0..h {
        for c in 0..w {
            for b in 0..3 {
                data.push( raster.data[[b,r,c]]);
            }
        }
    }

    let mut enc = TiffEncoder::new( writer)?.with_compression( compression.tiff_compression());
    T::write_rgb( &mut enc, &raster.profile(), &data)
}

pub fn write_rgb_geotiff_file<T: TiffRgbSample> (raster: &Raster<T>, path: impl AsRef<Path>, compression: GeoTiffCompression)->Result<()> {
    let mut writer = BufWriter::new( File::create( path.as_ref())?);
    write_rgb_geotiff( raster, &mut writer, compression)?;
    writer.flush()?;
    Ok(())
}

/* #endregion writing */
