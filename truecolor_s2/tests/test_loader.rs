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

mod common;

use anyhow::Result;
use truecolor_raster::{mask::rasterize_polygon, proj::{SrsTransform, EPSG_WGS84}, Raster};
use truecolor_s2::{
    aoi::square_aoi, config::BandMapping, loader::{load_rgb, LoadOutcome}, Aoi, TrueColorError
};
use common::*;

// run with "cargo test test_xx -- --nocapture"

/// AOI pixels (centers inside the projected AOI) of band `b`
fn aoi_samples (raster: &Raster<u16>, aoi: &Aoi, b: usize)->Vec<u16> {
    let g = SrsTransform::new( EPSG_WGS84, raster.epsg).unwrap().transform_geometry( &aoi.geometry).unwrap();
    let mask = rasterize_polygon( &raster.grid(), &g).unwrap();
    raster.band(b).iter().zip( mask.iter()).filter( |(_,inside)| **inside).map( |(v,_)| *v).collect()
}

fn loaded (outcome: LoadOutcome)->Raster<u16> {
    match outcome {
        LoadOutcome::Loaded(r) => r,
        LoadOutcome::Empty => panic!("unexpected empty outcome")
    }
}

/// 400m AOI on the central meridian of UTM zone 33N, and two overlapping tiles that each cover part of it.
/// Tile A covers x < 500100, tile B covers x >= 499900
fn same_frame_setup (va: u16, vb: u16)->(Aoi, Vec<truecolor_s2::ImageTile>, MemOpener) {
    let aoi = square_aoi( 0.05, 15.0, 400.0).unwrap();
    let (_,cy) = SrsTransform::new( EPSG_WGS84, 32633).unwrap().transform_point( 15.0, 0.05).unwrap();

    let ga = grid( 32633, 499000.0, cy + 1000.0, 500100.0, cy - 1000.0);
    let gb = grid( 32633, 499900.0, cy + 1000.0, 501000.0, cy - 1000.0);

    let mut opener = MemOpener::new();
    opener.add_tile( "A", &ga, va);
    opener.add_tile( "B", &gb, vb);

    let tiles = vec![
        tile( "A", "2024-06-05T10:00:00Z", footprint( &ga), 32633, 5.0),
        tile( "B", "2024-06-05T10:00:05Z", footprint( &gb), 32633, 7.0),
    ];
    (aoi, tiles, opener)
}

#[test]
fn test_same_frame_mosaic() -> Result<()> {
    let (aoi, tiles, opener) = same_frame_setup( 1000, 2000);
    let rgb = loaded( load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3))?);
    println!("mosaic: {}x{} EPSG:{} transform {:?}", rgb.width(), rgb.height(), rgb.epsg, rgb.transform);

    assert_eq!( rgb.band_count(), 3);
    assert_eq!( rgb.epsg, 32633);
    assert!( (rgb.transform[1] - 10.0).abs() < 1e-9);
    assert!( rgb.width() >= 40 && rgb.width() <= 41);

    // no nodata inside the AOI, and the first tile wins where both have data
    let inside = aoi_samples( &rgb, &aoi, 0);
    assert!( !inside.is_empty());
    assert!( inside.iter().all( |v| *v == 1000 || *v == 2000));

    let gt = rgb.transform;
    for c in 0..rgb.width() {
        let x = gt[0] + (c as f64 + 0.5) * gt[1];
        let expected = if x < 500100.0 { 1000 } else { 2000 };
        let r = rgb.height() / 2;
        assert_eq!( rgb.data[[0,r,c]], expected, "column {c} (x={x})");
    }

    // green and blue come from their own assets
    assert!( aoi_samples( &rgb, &aoi, 1).iter().all( |v| *v == 1100 || *v == 2100));
    assert!( aoi_samples( &rgb, &aoi, 2).iter().all( |v| *v == 1200 || *v == 2200));
    Ok(())
}

#[test]
fn test_outside_aoi_is_masked() -> Result<()> {
    let (aoi, tiles, opener) = same_frame_setup( 1000, 2000);
    let rgb = loaded( load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3))?);

    let n_inside = aoi_samples( &rgb, &aoi, 0).len();
    let n_nonzero = rgb.band(0).iter().filter( |v| **v != 0).count();
    assert_eq!( n_inside, n_nonzero);
    Ok(())
}

#[test]
fn test_differing_frames() -> Result<()> {
    // AOI close to the boundary between UTM zones 33 and 34
    let (lat,lon) = (0.05, 17.99);
    let aoi = square_aoi( lat, lon, 400.0)?;

    let b33 = SrsTransform::new( EPSG_WGS84, 32633)?.transform_bounds( &aoi.bbox, 21)?;
    let b34 = SrsTransform::new( EPSG_WGS84, 32634)?.transform_bounds( &aoi.bbox, 21)?;
    let cx33 = (b33.west + b33.east) / 2.0;
    let cx34 = (b34.west + b34.east) / 2.0;

    let ga = grid( 32633, b33.west - 500.0, b33.north + 500.0, cx33 + 100.0, b33.south - 500.0);
    let gb = grid( 32634, cx34 - 100.0, b34.north + 500.0, b34.east + 500.0, b34.south - 500.0);

    let mut opener = MemOpener::new();
    opener.add_tile( "A", &ga, 1000);
    opener.add_tile( "B", &gb, 3000);

    let tiles = vec![
        tile( "A", "2024-06-05T10:00:00Z", footprint( &ga), 32633, 5.0),
        tile( "B", "2024-06-05T10:00:05Z", footprint( &gb), 32634, 5.0),
    ];

    let rgb = loaded( load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3))?);
    println!("mosaic: {}x{} EPSG:{}", rgb.width(), rgb.height(), rgb.epsg);
    assert_eq!( rgb.epsg, 32633);

    let inside = aoi_samples( &rgb, &aoi, 0);
    assert!( inside.iter().all( |v| *v != 0), "no nodata inside AOI");
    assert!( inside.iter().any( |v| *v == 1000));
    assert!( inside.iter().any( |v| *v == 3000), "reprojected tile contributes");
    Ok(())
}

#[test]
fn test_all_zero_is_empty() -> Result<()> {
    let (aoi, tiles, opener) = same_frame_setup( 0, 0);
    let outcome = load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3))?;
    assert_eq!( outcome, LoadOutcome::Empty);
    Ok(())
}

#[test]
fn test_transient_open_failures() -> Result<()> {
    let (aoi, tiles, opener) = same_frame_setup( 1000, 2000);
    opener.fail_next( &href( "B", "B04"), 2);
    let outcome = load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3))?;
    assert!( matches!( outcome, LoadOutcome::Loaded(_)));
    assert_eq!( *opener.opens.borrow(), 6 + 2);

    // one more failure than we have attempts
    let (aoi, tiles, opener) = same_frame_setup( 1000, 2000);
    opener.fail_next( &href( "B", "B04"), 3);
    match load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3)) {
        Err(TrueColorError::BandLoadFailure { band, tile, cause }) => {
            println!("band load failure: {band} {tile} {cause}");
            assert_eq!( band, "red");
            assert_eq!( tile, "B");
            assert!( cause.is_retryable());
        }
        other => panic!("expected band load failure, got {other:?}")
    }
    Ok(())
}

#[test]
fn test_transient_read_failures() -> Result<()> {
    // reads of the red band of A fail twice, each failure re-opens both red sources
    let (aoi, tiles, opener) = same_frame_setup( 1000, 2000);
    opener.fail_next_reads( &href( "A", "B04"), 2);
    let rgb = loaded( load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3))?);
    println!("opens after read retries: {}", *opener.opens.borrow());
    assert_eq!( *opener.opens.borrow(), 3*2 + 2 + 2);
    assert!( aoi_samples( &rgb, &aoi, 0).iter().all( |v| *v == 1000 || *v == 2000));

    // every attempt fails
    let (aoi, tiles, opener) = same_frame_setup( 1000, 2000);
    opener.fail_next_reads( &href( "A", "B04"), 3);
    match load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3)) {
        Err(TrueColorError::BandLoadFailure { band, tile, cause }) => {
            println!("band load failure: {band} {tile} {cause}");
            assert_eq!( band, "red");
            assert_eq!( tile, "A");
            assert!( cause.is_retryable());
        }
        other => panic!("expected band load failure, got {other:?}")
    }
    assert_eq!( *opener.opens.borrow(), 3*2);
    Ok(())
}

#[test]
fn test_missing_asset() -> Result<()> {
    let (aoi, mut tiles, opener) = same_frame_setup( 1000, 2000);
    tiles[1].assets.remove("B03");

    match load_rgb( &tiles, &aoi, &BandMapping::default(), &opener, &fast_retry(3)) {
        Err(TrueColorError::BandLoadFailure { band, tile, .. }) => {
            assert_eq!( band, "green");
            assert_eq!( tile, "B");
        }
        other => panic!("expected band load failure, got {other:?}")
    }
    Ok(())
}
