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

//! the acquisition pipeline: catalog search, date selection and per date processing of all AOIs

use std::collections::BTreeMap;
use chrono::NaiveDate;
use itertools::Itertools;
use tracing::{error, info, warn};

use truecolor_raster::{geotiff::read_profile, warp::resample, RasterProfile};

use crate::{
    aoi::{coordinate_aoi_jobs, vector_aoi_jobs, AoiJob},
    assets::AssetOpener,
    catalog::{mean_cloud_cover, Catalog, ImageTile},
    config::TrueColorConfig,
    errors::Result,
    export::{export_geotiff, export_jpeg, OutputPaths},
    loader::{load_rgb, LoadOutcome},
    metadata::write_metadata_doc,
    normalize::normalize,
    selection::select_usable_dates,
};

/// everything a pipeline run needs besides the AOIs
pub struct PipelineContext<'a> {
    pub config: &'a TrueColorConfig,
    pub catalog: &'a dyn Catalog,
    pub opener: &'a dyn AssetOpener,
}

/// products of a successfully processed (AOI,date)
#[derive(Debug,Clone,PartialEq)]
pub struct ProcessingResult {
    pub tif_path: std::path::PathBuf,
    pub jpg_path: std::path::PathBuf,
    pub doc_path: std::path::PathBuf,
    pub profile: RasterProfile,
    pub tile_ids: Vec<String>,
}

#[derive(Debug,Clone,PartialEq)]
pub enum DateStatus {
    Processed,
    /// images already existed (metadata document was regenerated)
    Skipped,
    /// no valid sample inside the AOI
    NoData,
    Failed(String),
}

#[derive(Debug,Clone,PartialEq)]
pub struct DateOutcome {
    pub date: NaiveDate,
    pub status: DateStatus,
    pub result: Option<ProcessingResult>,
}

impl DateOutcome {
    fn new (date: NaiveDate, status: DateStatus)->Self {
        DateOutcome { date, status, result: None }
    }
}

#[derive(Debug,Clone,PartialEq)]
pub struct AoiReport {
    pub location: String,
    /// number of days that fully cover the AOI
    pub usable_dates: usize,
    pub outcomes: Vec<DateOutcome>,
    /// set if the AOI could not be constructed or searched
    pub failure: Option<String>,
}

impl AoiReport {
    pub fn new (location: impl ToString)->Self {
        AoiReport { location: location.to_string(), usable_dates: 0, outcomes: Vec::new(), failure: None }
    }

    pub fn failed (location: impl ToString, msg: impl ToString)->Self {
        AoiReport { failure: Some(msg.to_string()), ..AoiReport::new( location) }
    }

    pub fn count (&self, pred: impl Fn(&DateStatus)->bool)->usize {
        self.outcomes.iter().filter( |o| pred( &o.status)).count()
    }

    pub fn processed (&self)->usize { self.count( |s| *s == DateStatus::Processed) }
    pub fn skipped (&self)->usize { self.count( |s| *s == DateStatus::Skipped) }
    pub fn no_data (&self)->usize { self.count( |s| *s == DateStatus::NoData) }
    pub fn failed_dates (&self)->usize { self.count( |s| matches!( s, DateStatus::Failed(_))) }

    pub fn is_success (&self)->bool { self.failure.is_none() && self.failed_dates() == 0 }
}

/// collected outcome of a run over all AOIs
#[derive(Debug,Clone,Default,PartialEq)]
pub struct RunSummary {
    pub reports: Vec<AoiReport>,
}

impl RunSummary {
    pub fn processed (&self)->usize { self.reports.iter().map( |r| r.processed()).sum() }
    pub fn skipped (&self)->usize { self.reports.iter().map( |r| r.skipped()).sum() }
    pub fn no_data (&self)->usize { self.reports.iter().map( |r| r.no_data()).sum() }
    pub fn failed_dates (&self)->usize { self.reports.iter().map( |r| r.failed_dates()).sum() }
    pub fn failed_aois (&self)->usize { self.reports.iter().filter( |r| r.failure.is_some()).count() }

    /// no AOI and no date failed
    pub fn is_success (&self)->bool { self.reports.iter().all( |r| r.is_success()) }

    pub fn log (&self) {
        info!("processed {} AOIs: {} dates processed, {} skipped (existing), {} without data, {} failed",
              self.reports.len(), self.processed(), self.skipped(), self.no_data(), self.failed_dates());
        for r in &self.reports {
            match &r.failure {
                Some(msg) => error!("  {}: FAILED {}", r.location, msg),
                None => info!("  {}: {} usable dates, {} processed, {} skipped, {} no data, {} failed",
                              r.location, r.usable_dates, r.processed(), r.skipped(), r.no_data(), r.failed_dates())
            }
        }
    }
}

/// options of a run that are not part of the config
#[derive(Debug,Clone,Default)]
pub struct RunOptions {
    /// only search and select, do not access rasters
    pub dry_run: bool,
    /// only process the AOI with this location name
    pub location: Option<String>,
}

/* #region per date ************************************************************************************************/

fn regenerate_metadata (job: &AoiJob, date: &NaiveDate, tiles: &[ImageTile], paths: &OutputPaths, ctx: &PipelineContext)->Result<()> {
    let profile = read_profile( &paths.tif)?;
    write_metadata_doc( paths.tif_dir(), &paths.base_name, &job.location, date, tiles, &profile, ctx.config)?;
    Ok(())
}

fn process_date (job: &AoiJob, date: &NaiveDate, tiles: &[ImageTile], ctx: &PipelineContext)->Result<DateOutcome> {
    let cfg = ctx.config;
    let paths = OutputPaths::new( &cfg.output, &job.folder, &job.location, date);

    if paths.images_exist() {
        info!("  images already exist, regenerating metadata");
        if let Err(e) = regenerate_metadata( job, date, tiles, &paths, ctx) {
            warn!("  could not regenerate metadata of {}: {e}", paths.base_name);
        }
        return Ok( DateOutcome::new( *date, DateStatus::Skipped))
    }

    info!("  loading and mosaicking {} tile(s)..", tiles.len());
    let rgb = match load_rgb( tiles, &job.aoi, &cfg.bands, ctx.opener, &cfg.retry)? {
        LoadOutcome::Loaded(rgb) => rgb,
        LoadOutcome::Empty => {
            warn!("  all pixel values are zero, skipping {date}");
            return Ok( DateOutcome::new( *date, DateStatus::NoData))
        }
    };

    let rgb = resample( rgb, cfg.output.target_resolution)?;
    let (px_w,px_h) = rgb.pixel_size();
    info!("  final image: {}x{} pixels, {:.2} x {:.2} km", rgb.width(), rgb.height(),
          rgb.width() as f64 * px_w / 1000.0, rgb.height() as f64 * px_h / 1000.0);

    export_geotiff( &rgb, &paths.tif, cfg.output.compression)?;
    export_jpeg( &normalize( &rgb, cfg.output.gain), &paths.jpg, cfg.output.jpg_quality)?;

    let profile = rgb.profile();
    let doc_path = write_metadata_doc( paths.tif_dir(), &paths.base_name, &job.location, date, tiles, &profile, cfg)?;

    let result = ProcessingResult {
        tif_path: paths.tif,
        jpg_path: paths.jpg,
        doc_path,
        profile,
        tile_ids: tiles.iter().map( |t| t.id.clone()).collect(),
    };
    Ok( DateOutcome { date: *date, status: DateStatus::Processed, result: Some(result) } )
}

/// process all usable dates of an AOI in ascending order. A failing date does not stop the others
pub fn process_dates (job: &AoiJob, usable_dates: &BTreeMap<NaiveDate,Vec<ImageTile>>, ctx: &PipelineContext)->AoiReport {
    let mut report = AoiReport::new( &job.location);
    report.usable_dates = usable_dates.len();
    let n = usable_dates.len();

    for (i,(date,tiles)) in usable_dates.iter().enumerate() {
        let cloud = mean_cloud_cover( tiles).map( |c| format!("{c:.1}%")).unwrap_or_else( || "n/a".to_string());
        info!("[{}/{n}] {} {date}: {} tiles ({}), avg cloud cover {cloud}", i+1, job.location, tiles.len(),
              tiles.iter().map( |t| t.id.as_str()).join(", "));

        let outcome = match process_date( job, date, tiles, ctx) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("  processing {} {date} failed: {e}", job.location);
                DateOutcome::new( *date, DateStatus::Failed( e.to_string()))
            }
        };
        if outcome.status == DateStatus::Processed {
            info!("  {} {date} successfully processed", job.location);
        }
        report.outcomes.push( outcome);
    }

    report
}

/* #endregion per date */

/* #region per AOI *************************************************************************************************/

fn log_remediation_hints (job: &AoiJob) {
    warn!("  failures of {} are often caused by", job.location);
    warn!("    - large AOIs causing timeouts or memory issues (reduce buffer distances)");
    warn!("    - network issues reading from cloud storage (try again later)");
    warn!("  overall AOIs can be disabled with 'process_overall: false'");
}

/// search, select and (unless dry run) process one AOI
pub fn process_aoi (job: &AoiJob, ctx: &PipelineContext, dry_run: bool)->AoiReport {
    let cfg = ctx.config;
    info!("processing {} ({} to {}), bounds {:?}", job.location, job.date_range.start, job.date_range.end, job.aoi.bbox);
    if (cfg.sentinel2.min_aoi_coverage - crate::coverage::FULL_COVERAGE_THRESHOLD).abs() > 1e-9 {
        info!("  min_aoi_coverage {}% is informational, dates are selected at {}% coverage", 
              cfg.sentinel2.min_aoi_coverage, crate::coverage::FULL_COVERAGE_THRESHOLD);
    }

    let tiles = match ctx.catalog.search( &job.aoi.bbox, job.date_range.start, job.date_range.end, cfg.sentinel2.max_cloud_cover) {
        Ok(tiles) => tiles,
        Err(e) => {
            error!("  catalog search for {} failed: {e}", job.location);
            log_remediation_hints( job);
            return AoiReport::failed( &job.location, e)
        }
    };

    let usable = select_usable_dates( tiles, &job.aoi);
    if usable.is_empty() {
        warn!("  no suitable images found for {}", job.location);
    }

    if dry_run {
        let mut report = AoiReport::new( &job.location);
        report.usable_dates = usable.len();
        return report
    }

    let report = process_dates( job, &usable, ctx);
    if report.failed_dates() > 0 {
        log_remediation_hints( job);
    }
    report
}

/// all AOI jobs of the config. Entries with errors could not be constructed
pub fn aoi_jobs (config: &TrueColorConfig)->Vec<(String,Result<AoiJob>)> {
    let mut jobs: Vec<(String,Result<AoiJob>)> = Vec::new();

    for v in &config.vector_aois {
        match vector_aoi_jobs( v) {
            Ok(vjobs) => jobs.extend( vjobs.into_iter().map( |j| (j.location.clone(), Ok(j)))),
            Err(e) => jobs.push( (v.location_name.clone(), Err(e)))
        }
    }

    if let Some(c) = &config.coordinate_aois {
        jobs.extend( coordinate_aoi_jobs( c, config.output.target_resolution));
    }

    jobs
}

/// process all AOIs of the config (or the one selected in `options`)
pub fn run (ctx: &PipelineContext, options: &RunOptions)->RunSummary {
    let mut summary = RunSummary::default();

    for (location,job) in aoi_jobs( ctx.config) {
        if let Some(selected) = &options.location {
            if *selected != location { continue }
        }

        let report = match job {
            Ok(job) => process_aoi( &job, ctx, options.dry_run),
            Err(e) => {
                error!("creating AOI {location} failed: {e}");
                AoiReport::failed( location, e)
            }
        };
        summary.reports.push( report);
    }

    if let Some(selected) = &options.location {
        if summary.reports.is_empty() {
            warn!("no AOI with location name {selected}");
        }
    }

    summary
}

/* #endregion per AOI */
