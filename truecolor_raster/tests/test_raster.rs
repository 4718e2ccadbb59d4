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

use geo::{polygon, BoundingRect, MultiPolygon};
use ndarray::{Array2, Array3};
use truecolor_common::BoundingBox;
use truecolor_raster::{
    geotransform_from_bbox, invert_geotransform, pixel_to_world, new_geotransform,
    mask::{crop_to_polygon, polygon_window, rasterize_polygon},
    mosaic::{aligned_grid, merge, mosaic_into_grid},
    proj::{SrsTransform, linear_units, is_geographic},
    warp::{resample, sample_bilinear},
    PixelWindow, Raster, RasterGrid, RasterError
};

// run with "cargo test test_xx -- --nocapture"

fn const_band (w: usize, h: usize, v: u16, x0: f64, y0: f64, res: f64, epsg: u32)->Raster<u16> {
    let band = Array2::from_elem( (h,w), v);
    Raster::from_band( band, new_geotransform( x0, res, 0.0, y0, 0.0, -res), epsg, Some(0)).unwrap()
}

#[test]
fn test_geotransform_inversion() {
    let gt = new_geotransform( 399960.0, 10.0, 0.0, 5900040.0, 0.0, -10.0);
    let inv = invert_geotransform( &gt).unwrap();

    let (x,y) = pixel_to_world( &gt, 12.5, 7.25);
    let (c,r) = pixel_to_world( &inv, x, y);
    assert!( (c - 12.5).abs() < 1e-9 && (r - 7.25).abs() < 1e-9);
}

#[test]
fn test_window_for_bounds() {
    let grid = RasterGrid::new( new_geotransform( 0.0, 10.0, 0.0, 1000.0, 0.0, -10.0), 100, 100, 32633);

    let win = grid.window_for_bounds( &BoundingBox::new( 15.0, 905.0, 45.0, 995.0)).unwrap();
    assert_eq!( win, PixelWindow::new( 1, 0, 4, 10));

    // bounds on pixel edges do not grow the window
    let win = grid.window_for_bounds( &BoundingBox::new( 10.0, 900.0, 50.0, 1000.0)).unwrap();
    assert_eq!( win, PixelWindow::new( 1, 0, 4, 10));

    // clipped to the grid
    let win = grid.window_for_bounds( &BoundingBox::new( -100.0, -100.0, 30.0, 2000.0)).unwrap();
    assert_eq!( win, PixelWindow::new( 0, 0, 3, 100));

    assert!( grid.window_for_bounds( &BoundingBox::new( 2000.0, 0.0, 3000.0, 100.0)).is_none());
}

#[test]
fn test_band_count_invariant() {
    let gt = new_geotransform( 0.0, 1.0, 0.0, 10.0, 0.0, -1.0);
    assert!( Raster::new( Array3::<u16>::zeros((2,10,10)), gt, 32633, None).is_err());
    assert!( Raster::new( Array3::<u16>::zeros((3,10,10)), gt, 32633, None).is_ok());
    assert!( Raster::new( Array3::<u16>::zeros((1,0,10)), gt, 32633, None).is_err());
}

#[test]
fn test_stack_requires_registered_bands() {
    let r = const_band( 10, 10, 1, 0.0, 100.0, 10.0, 32633);
    let g = const_band( 10, 10, 2, 0.0, 100.0, 10.0, 32633);
    let b = const_band( 10, 10, 3, 0.0, 100.0, 10.0, 32633);
    let rgb = Raster::stack( vec![r.clone(), g.clone(), b]).unwrap();
    assert_eq!( rgb.band_count(), 3);
    assert_eq!( rgb.data[[2,5,5]], 3);

    let shifted = const_band( 10, 10, 3, 10.0, 100.0, 10.0, 32633);
    assert!( Raster::stack( vec![r, g, shifted]).is_err());
}

#[test]
fn test_resample_identity() {
    let raster = const_band( 50, 40, 1234, 0.0, 400.0, 10.0, 32633);
    let out = resample( raster.clone(), 10.005).unwrap();
    assert_eq!( out, raster);
}

#[test]
fn test_resample_down_and_up() {
    let mut raster = const_band( 1000, 1000, 0, 500000.0, 4000000.0, 10.0, 32633);
    for ((r,c),v) in raster.band_mut(0).indexed_iter_mut() {
        *v = 1000 + (r % 7) as u16 * 10 + (c % 5) as u16;
    }

    let coarse = resample( raster.clone(), 20.0).unwrap();
    assert_eq!( (coarse.width(), coarse.height()), (500,500));
    assert_eq!( coarse.transform, [500000.0, 20.0, 0.0, 4000000.0, 0.0, -20.0]);
    assert_eq!( coarse.epsg, 32633);

    let fine = resample( coarse, 10.0).unwrap();
    assert_eq!( (fine.width(), fine.height()), (1000,1000));
    assert_eq!( fine.transform, raster.transform);
    assert!( fine.data.iter().all( |v| *v >= 1000 && *v <= 1070));
}

#[test]
fn test_bilinear_preserves_constants() {
    let raster = const_band( 7, 5, 4000, 0.0, 50.0, 10.0, 32633);
    let out = resample( raster, 3.0).unwrap();
    assert_eq!( (out.width(), out.height()), (23, 16));
    assert!( out.is_all(4000));
}

#[test]
fn test_bilinear_sample() {
    let band = Array2::from_shape_vec( (2,2), vec![0u16, 100, 200, 300]).unwrap();
    let v = sample_bilinear( &band.view(), 1.0, 1.0, None).unwrap();
    assert!( (v - 150.0).abs() < 1e-9);

    // nodata neighbors carry no weight
    let v = sample_bilinear( &band.view(), 1.0, 1.0, Some(0)).unwrap();
    assert!( (v - 200.0).abs() < 1e-9);

    assert!( sample_bilinear( &band.view(), 3.0, 1.0, None).is_none());
}

#[test]
fn test_mosaic_first_wins() {
    // two overlapping tiles on the same lattice, overlap is columns 5..10 of the first tile
    let a = const_band( 10, 10, 100, 0.0, 100.0, 10.0, 32633);
    let mut b = const_band( 10, 10, 200, 50.0, 100.0, 10.0, 32633);
    b.band_mut(0)[[0,0]] = 0; // nodata in b does not matter

    let m = merge( &[a.clone(), b.clone()]).unwrap();
    assert_eq!( (m.width(), m.height()), (15,10));
    assert_eq!( m.data[[0,3,7]], 100);
    assert_eq!( m.data[[0,3,12]], 200);

    let m = merge( &[b, a]).unwrap();
    assert_eq!( m.data[[0,3,7]], 200);
    assert_eq!( m.data[[0,0,5]], 100); // filled from second source where the first has nodata
}

#[test]
fn test_mosaic_fills_nodata_of_first() {
    let mut a = const_band( 10, 10, 100, 0.0, 100.0, 10.0, 32633);
    for c in 0..10 { a.band_mut(0)[[9,c]] = 0 }
    let b = const_band( 10, 10, 200, 0.0, 100.0, 10.0, 32633);

    let m = merge( &[a, b]).unwrap();
    assert_eq!( m.data[[0,8,4]], 100);
    assert_eq!( m.data[[0,9,4]], 200);
}

#[test]
fn test_projection() {
    let tf = SrsTransform::new( 4326, 32633).unwrap();
    let (x,y) = tf.transform_point( 15.0, 0.0).unwrap();
    println!("(15,0) -> ({x},{y})");
    assert!( (x - 500000.0).abs() < 0.01);
    assert!( y.abs() < 0.01);

    let (x,y) = tf.transform_point( 15.5, 52.3).unwrap();
    let (lon,lat) = tf.inverse().unwrap().transform_point( x, y).unwrap();
    assert!( (lon - 15.5).abs() < 1e-6 && (lat - 52.3).abs() < 1e-6);

    assert!( is_geographic(4326));
    assert!( !is_geographic(32633));
    assert_eq!( linear_units(32633), "metre");
    assert!( SrsTransform::new( 4326, 4326).unwrap().is_identity());
}

#[test]
fn test_projected_edges_follow_curves() {
    // a lon/lat box 2 degrees wide that is centered on the central meridian of UTM zone 33.
    // Its southern edge is a parallel, which bows south at the central meridian
    let aoi = polygon![ (x: 14.0, y: 50.0), (x: 16.0, y: 50.0), (x: 16.0, y: 50.5), (x: 14.0, y: 50.5), (x: 14.0, y: 50.0) ];
    let tf = SrsTransform::new( 4326, 32633).unwrap();

    let g = tf.transform_geometry( &aoi).unwrap();
    let (_,y_corner) = tf.transform_point( 14.0, 50.0).unwrap();
    let (_,y_mid) = tf.transform_point( 15.0, 50.0).unwrap();
    let south = g.bounding_rect().unwrap().min().y;
    println!("corner y: {y_corner}, edge center y: {y_mid}, projected south: {south}");

    assert!( y_corner - y_mid > 100.0);
    assert!( (south - y_mid).abs() < 1.0);
    assert!( g.exterior().0.len() > 100);
}

#[test]
fn test_merge_across_frames() {
    // tiles on both sides of the 18E meridian (boundary between UTM 33N and 34N)
    let to33 = SrsTransform::new( 4326, 32633).unwrap();
    let to34 = SrsTransform::new( 4326, 32634).unwrap();
    let (x33,y33) = to33.transform_point( 17.9, 50.0).unwrap();
    let (x34,y34) = to34.transform_point( 18.1, 50.0).unwrap();

    let a = const_band( 200, 200, 1000, (x33 / 10.0).floor() * 10.0 - 1000.0, (y33 / 10.0).floor() * 10.0 + 1000.0, 10.0, 32633);
    let b = const_band( 200, 200, 3000, (x34 / 10.0).floor() * 10.0 - 1000.0, (y34 / 10.0).floor() * 10.0 + 1000.0, 10.0, 32634);

    let m = merge( &[a, b]).unwrap();
    assert_eq!( m.epsg, 32633);
    assert!( m.data.iter().any( |v| *v == 1000));
    assert!( m.data.iter().any( |v| *v == 3000)); // reprojected constant stays constant
    assert!( m.data.iter().all( |v| *v == 0 || *v == 1000 || *v == 3000));
}

#[test]
fn test_crop_to_polygon() {
    let raster = const_band( 100, 100, 500, 0.0, 1000.0, 10.0, 32633);
    // triangle within x 105..495, y 505..895
    let poly: MultiPolygon<f64> = polygon![ (x: 105.0, y: 505.0), (x: 495.0, y: 505.0), (x: 105.0, y: 895.0) ].into();

    let win = polygon_window( &raster.grid(), &poly).unwrap();
    assert_eq!( win, PixelWindow::new( 10, 10, 40, 40));

    let cropped = crop_to_polygon( &raster, &poly).unwrap();
    assert_eq!( (cropped.width(), cropped.height()), (40,40));
    assert_eq!( cropped.transform, [100.0, 10.0, 0.0, 900.0, 0.0, -10.0]);
    assert_eq!( cropped.data[[0,38,1]], 500); // near lower left corner of triangle
    assert_eq!( cropped.data[[0,1,38]], 0);   // upper right is outside

    let outside: MultiPolygon<f64> = polygon![ (x: 5000.0, y: 5000.0), (x: 6000.0, y: 5000.0), (x: 6000.0, y: 6000.0) ].into();
    assert!( matches!( crop_to_polygon( &raster, &outside), Err(RasterError::NoOverlap(_))));
}

#[test]
fn test_rasterize_with_hole() {
    let grid = RasterGrid::new( new_geotransform( 0.0, 1.0, 0.0, 10.0, 0.0, -1.0), 10, 10, 32633);
    let poly: MultiPolygon<f64> = polygon!(
        exterior: [ (x: 0.0, y: 0.0), (x: 10.0, y: 0.0), (x: 10.0, y: 10.0), (x: 0.0, y: 10.0) ],
        interiors: [ [ (x: 4.0, y: 4.0), (x: 6.0, y: 4.0), (x: 6.0, y: 6.0), (x: 4.0, y: 6.0) ] ]
    ).into();

    let mask = rasterize_polygon( &grid, &poly).unwrap();
    assert_eq!( mask.iter().filter( |b| **b).count(), 96);
    assert!( !mask[[5,5]]);
    assert!( mask[[0,0]]);
}
