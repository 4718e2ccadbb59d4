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

use std::{fs::File, io::BufWriter};
use ndarray::Array3;
use tiff::{encoder::{colortype, TiffEncoder}, tags::Tag};
use truecolor_raster::{
    geotiff::{read_profile, write_rgb_geotiff_file, GeoTiffCompression, GeoTiffSource},
    new_geotransform, source::RasterSource, DataType, PixelWindow, Raster
};

// run with "cargo test test_xx -- --nocapture"

#[test]
fn test_write_rgb_and_read_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rgb.tif");

    let mut data = Array3::<u16>::zeros( (3, 20, 30));
    for ((b,r,c),v) in data.indexed_iter_mut() { *v = (b*1000 + r*30 + c) as u16 }
    let gt = new_geotransform( 399960.0, 10.0, 0.0, 5900040.0, 0.0, -10.0);
    let raster = Raster::new( data, gt, 32633, Some(0)).unwrap();

    write_rgb_geotiff_file( &raster, &path, GeoTiffCompression::Lzw).unwrap();

    let profile = read_profile( &path).unwrap();
    println!("{profile:?}");
    assert_eq!( profile.width(), 30);
    assert_eq!( profile.height(), 20);
    assert_eq!( profile.band_count, 3);
    assert_eq!( profile.data_type, DataType::UInt16);
    assert_eq!( profile.epsg(), 32633);
    assert_eq!( profile.transform(), &gt);
    assert_eq!( profile.nodata, Some(0.0));
}

#[test]
fn test_read_window_from_single_band() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("B04.tif");
    let (w,h) = (64u32, 48u32);
    let data: Vec<u16> = (0..w*h).map( |i| (i % 1000) as u16 + 1).collect();

    {
        let mut file = BufWriter::new( File::create(&path).unwrap());
        let mut enc = TiffEncoder::new( &mut file).unwrap();
        let mut image = enc.new_image::<colortype::Gray16>( w, h).unwrap();
        let dir = image.encoder();
        dir.write_tag( Tag::Unknown(33550), [20.0, 20.0, 0.0].as_slice()).unwrap();
        dir.write_tag( Tag::Unknown(33922), [0.0, 0.0, 0.0, 300000.0, 6000000.0, 0.0].as_slice()).unwrap();
        dir.write_tag( Tag::Unknown(34735), [1u16,1,0,3, 1024,0,1,1, 1025,0,1,1, 3072,0,1,32632].as_slice()).unwrap();
        dir.write_tag( Tag::Unknown(42113), "0").unwrap();
        image.write_data( &data).unwrap();
    }

    let mut src = GeoTiffSource::open_file( &path).unwrap();
    let profile = RasterSource::<u16>::profile( &src).clone();
    assert_eq!( profile.epsg(), 32632);
    assert_eq!( profile.transform(), &[300000.0, 20.0, 0.0, 6000000.0, 0.0, -20.0]);

    let win = PixelWindow::new( 10, 5, 20, 30);
    let r: Raster<u16> = RasterSource::<u16>::read_window( &mut src, &win).unwrap();
    assert_eq!( (r.width(), r.height()), (20,30));
    assert_eq!( r.transform, [300200.0, 20.0, 0.0, 5999900.0, 0.0, -20.0]);
    for row in 0..30 {
        for col in 0..20 {
            let i = (row + 5) * w as usize + (col + 10);
            assert_eq!( r.data[[0,row,col]], data[i]);
        }
    }

    assert!( RasterSource::<u16>::read_window( &mut src, &PixelWindow::new( 60, 0, 10, 10)).is_err());
}
