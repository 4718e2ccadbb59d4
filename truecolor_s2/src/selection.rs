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

//! grouping of catalog tiles by acquisition day and selection of the days that fully cover an AOI

use std::collections::BTreeMap;
use chrono::NaiveDate;
use geo::{BooleanOps, MultiPolygon};
use tracing::info;

use crate::{
    aoi::Aoi, catalog::{mean_cloud_cover, ImageTile}, coverage::{coverage, Coverage}
};

/// diagnostics of one acquisition day
#[derive(Debug,Clone,PartialEq)]
pub struct DateSummary {
    pub date: NaiveDate,
    pub tile_count: usize,
    pub mean_cloud_cover: Option<f64>,
    pub coverage: Coverage,
}

/// tiles per UTC calendar day in ascending day order. Tiles keep their catalog order within a day
pub fn group_by_date (tiles: Vec<ImageTile>)->BTreeMap<NaiveDate,Vec<ImageTile>> {
    let mut groups: BTreeMap<NaiveDate,Vec<ImageTile>> = BTreeMap::new();
    for tile in tiles {
        groups.entry( tile.date()).or_default().push( tile);
    }
    groups
}

/// union of all tile footprints
pub fn merged_footprint (tiles: &[ImageTile])->MultiPolygon<f64> {
    tiles.iter().fold( MultiPolygon( Vec::new()), |acc,t| {
        if acc.0.is_empty() { t.footprint.clone() } else { acc.union( &t.footprint) }
    })
}

pub fn summarize_group (date: NaiveDate, tiles: &[ImageTile], aoi: &Aoi)->DateSummary {
    DateSummary {
        date,
        tile_count: tiles.len(),
        mean_cloud_cover: mean_cloud_cover( tiles),
        coverage: coverage( &aoi.geometry, &merged_footprint( tiles)),
    }
}

pub fn summarize_dates (groups: &BTreeMap<NaiveDate,Vec<ImageTile>>, aoi: &Aoi)->Vec<DateSummary> {
    groups.iter().map( |(date,tiles)| summarize_group( *date, tiles, aoi)).collect()
}

fn log_summary (s: &DateSummary) {
    let mark = if s.coverage.fully_covered { "+" } else { "-" };
    let cloud = s.mean_cloud_cover.map( |c| format!("{c:.1}%")).unwrap_or_else( || "n/a".to_string());
    info!("  {mark} {} - {} tiles - avg cloud: {cloud} - coverage: {:.1}%", s.date, s.tile_count, s.coverage.percentage);
}

/// the days whose merged tile footprints fully cover the AOI, with their tiles in catalog order
pub fn select_usable_dates (tiles: Vec<ImageTile>, aoi: &Aoi)->BTreeMap<NaiveDate,Vec<ImageTile>> {
    let mut groups = group_by_date( tiles);

    groups.retain( |date,tiles| {
        let summary = summarize_group( *date, tiles, aoi);
        log_summary( &summary);
        summary.coverage.fully_covered
    });

    info!("{} dates with full AOI coverage", groups.len());
    groups
}
