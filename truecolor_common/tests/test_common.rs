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

use std::path::Path;
use chrono::NaiveDate;
use serde::{Serialize,Deserialize};
use std::time::Duration;
use truecolor_common::{
    BoundingBox, datetime::{self, deserialize_duration, utc_day_interval, yyyymmdd},
    fs::{is_non_empty_file, tmp_path, commit_tmp, create_file_with_parents},
    net::url_file_name, ron::load_ron_file, utm::{naive_utm_zone, UtmZone}
};

// run with "cargo test test_xx -- --nocapture"

#[test]
fn test_bbox_ops() {
    let a = BoundingBox::<f64>::new( 0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::<f64>::new( 5.0, -5.0, 15.0, 5.0);

    let u = a.union(&b);
    assert_eq!( u, BoundingBox::new( 0.0, -5.0, 15.0, 10.0));

    let i = a.intersection(&b).unwrap();
    assert_eq!( i, BoundingBox::new( 5.0, 0.0, 10.0, 5.0));

    let c = BoundingBox::<f64>::new( 20.0, 20.0, 30.0, 30.0);
    assert!( a.intersection(&c).is_none());
    assert_eq!( a.center(), (5.0, 5.0));
    assert_eq!( a.buffered(1.0), BoundingBox::new( -1.0, -1.0, 11.0, 11.0));
}

#[test]
fn test_utm_zones() {
    let z = naive_utm_zone( 13.4, 52.5); // Berlin
    assert_eq!( z, UtmZone { zone: 33, north: true });
    assert_eq!( z.epsg(), 32633);

    let z = naive_utm_zone( -122.4, 37.8); // San Francisco
    assert_eq!( z.epsg(), 32610);

    let z = naive_utm_zone( 151.2, -33.9); // Sydney
    assert_eq!( z.epsg(), 32756);

    assert_eq!( naive_utm_zone( 180.0, 0.0).zone, 1);
    assert_eq!( UtmZone::from_epsg(32756), Some(UtmZone{ zone: 56, north: false}));
    assert_eq!( UtmZone::from_epsg(4326), None);
}

#[test]
fn test_day_strings() {
    let d = NaiveDate::from_ymd_opt( 2024, 6, 17).unwrap();
    assert_eq!( yyyymmdd(&d), "20240617");

    let e = NaiveDate::from_ymd_opt( 2024, 6, 30).unwrap();
    assert_eq!( utc_day_interval(d,e), "2024-06-17T00:00:00Z/2024-06-30T23:59:59Z");
}

#[test]
fn test_url_file_name() {
    assert_eq!( url_file_name("https://host/a/b/T33UUU_B04_10m.tif?st=2024&sig=x"), Some("T33UUU_B04_10m.tif"));
    assert_eq!( url_file_name("https://host/a/b/c.tif"), Some("c.tif"));
}

#[derive(Deserialize,Debug)]
struct TestConfig {
    name: String,
    #[serde(deserialize_with="deserialize_duration")]
    delay: Duration,
}

#[test]
fn test_load_ron_and_tmp_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sub").join("test.ron");

    let tmp = tmp_path(&path);
    assert_eq!( tmp.file_name().unwrap().to_str().unwrap(), "test.ron.tmp");

    {
        use std::io::Write;
        let mut file = create_file_with_parents(&tmp).unwrap();
        write!( file, r#"TestConfig( name: "blah", delay: "2s" )"#).unwrap();
    }
    assert!( !is_non_empty_file(&path));
    commit_tmp( &tmp, &path).unwrap();
    assert!( is_non_empty_file(&path));

    let conf: TestConfig = load_ron_file(&path).unwrap();
    println!("{conf:?}");
    assert_eq!( conf.name, "blah");
    assert_eq!( conf.delay, Duration::from_secs(2));
}
