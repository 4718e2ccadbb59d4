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

use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use truecolor_common::{check_cli, define_cli};
use truecolor_s2::{
    config::DEFAULT_CONFIG_PATH, load_config, run, HttpAssetOpener, PipelineContext, Result, RunOptions, StacCatalog
};

define_cli! { ARGS [about="Sentinel-2 true-color image acquisition for areas of interest"] =
    config: String [help="pathname of RON config file", short, long, default_value=DEFAULT_CONFIG_PATH],
    dry_run: bool [help="only search catalog and select dates, do not load imagery", long],
    location: Option<String> [help="only process the AOI with this location name", long]
}

fn main ()->Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter( EnvFilter::try_from_default_env().unwrap_or_else( |_| EnvFilter::new("info")))  // use RUST_LOG to set max level
        .init();
    check_cli!(ARGS);

    let config = load_config( &ARGS.config)?;
    info!("loaded config {}: {} vector AOIs, {} coordinate AOIs, max cloud cover {}%", 
          ARGS.config, config.vector_aois.len(), 
          config.coordinate_aois.as_ref().map( |c| c.coordinates.len()).unwrap_or(0), 
          config.sentinel2.max_cloud_cover);

    let catalog = StacCatalog::new( config.catalog.clone())?;
    let opener = HttpAssetOpener::new( &config.catalog)?;
    let ctx = PipelineContext { config: &config, catalog: &catalog, opener: &opener };
    let options = RunOptions { dry_run: ARGS.dry_run, location: ARGS.location.clone() };

    let summary = run( &ctx, &options);
    summary.log();
    info!("output in {:?} ({}/, {}/)", config.output.base_dir, config.output.tif_subdir, config.output.jpg_subdir);

    if summary.reports.is_empty() && options.location.is_some() {
        error!("nothing processed");
        std::process::exit(2);
    }
    if !summary.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
