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

use ndarray::Array3;
use truecolor_raster::{new_geotransform, warp::resample, Raster};
use truecolor_s2::normalize::{normalize, normalize_value, DEFAULT_GAIN, REFLECTANCE_SCALE};

// run with "cargo test test_xx -- --nocapture"

#[test]
fn test_normalize_values() {
    assert_eq!( normalize_value( 10000.0, DEFAULT_GAIN), 255);
    assert_eq!( normalize_value( 0.0, DEFAULT_GAIN), 0);
    assert_eq!( normalize_value( 4000.0, DEFAULT_GAIN), 255);
    assert_eq!( normalize_value( 1000.0, DEFAULT_GAIN), 64);
    assert_eq!( normalize_value( 65535.0, DEFAULT_GAIN), 255);
    assert_eq!( normalize_value( -5.0, DEFAULT_GAIN), 0);
    assert_eq!( normalize_value( f64::NAN, DEFAULT_GAIN), 0);

    assert_eq!( normalize_value( REFLECTANCE_SCALE, 1.0), 255);
    assert_eq!( normalize_value( 5000.0, 1.0), 128);
}

#[test]
fn test_normalize_raster() {
    let gt = new_geotransform( 500000.0, 10.0, 0.0, 5000.0, 0.0, -10.0);
    let mut data = Array3::<u16>::zeros( (3, 2, 2));
    data[[0,0,0]] = 1000;
    data[[1,0,1]] = 4000;
    data[[2,1,1]] = 10000;
    let raster = Raster::new( data, gt, 32633, Some(0)).unwrap();

    let rgb = normalize( &raster, DEFAULT_GAIN);
    println!("{:?}", rgb.data);
    assert_eq!( rgb.data.dim(), (3,2,2));
    assert_eq!( rgb.transform, gt);
    assert_eq!( rgb.epsg, 32633);
    assert_eq!( rgb.nodata, Some(0));
    assert_eq!( rgb.data[[0,0,0]], 64);
    assert_eq!( rgb.data[[1,0,1]], 255);
    assert_eq!( rgb.data[[2,1,1]], 255);
    assert_eq!( rgb.data[[0,1,1]], 0);
}

#[test]
fn test_resample_keeps_target_resolution() {
    let gt = new_geotransform( 500000.0, 10.0, 0.0, 5000.0, 0.0, -10.0);
    let raster = Raster::new( Array3::<u16>::from_elem( (3, 20, 30), 1234), gt, 32633, Some(0)).unwrap();

    let same = resample( raster.clone(), 10.0).unwrap();
    assert_eq!( same, raster);

    let coarse = resample( raster, 20.0).unwrap();
    assert_eq!( (coarse.width(), coarse.height()), (15, 10));
    assert_eq!( coarse.epsg, 32633);
    assert!( coarse.data.iter().all( |v| *v == 1234));
}
