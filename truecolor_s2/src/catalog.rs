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

//! image tile model and STAC catalog search

use std::collections::BTreeMap;
use chrono::{DateTime, NaiveDate, Utc};
use geo::{MultiPolygon, Rect};
use geojson::{JsonObject, JsonValue};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use truecolor_common::{
    datetime::{parse_datetime, utc_day_interval}, net::{get_json, post_json_query}, BoundingBox
};

use crate::{
    config::CatalogConfig,
    errors::{catalog_error, Result, TrueColorError}
};

/// a single acquisition product of the catalog, with the hrefs of its band assets
#[derive(Debug,Clone,PartialEq)]
pub struct ImageTile {
    pub id: String,
    pub datetime: DateTime<Utc>,
    /// in EPSG:4326
    pub footprint: MultiPolygon<f64>,
    pub cloud_cover: Option<f64>,
    /// frame of the pixel grid, if the catalog reports it
    pub epsg: Option<u32>,
    /// asset key -> href
    pub assets: BTreeMap<String,String>,

    pub platform: Option<String>,
    pub orbit_state: Option<String>,
    pub relative_orbit: Option<u32>,
    pub processing_baseline: Option<String>,
    pub mgrs_tile: Option<String>,
}

impl ImageTile {
    /// UTC calendar day of the acquisition
    pub fn date (&self)->NaiveDate {
        self.datetime.date_naive()
    }

    pub fn asset_href (&self, key: &str)->Result<&str> {
        self.assets.get( key)
            .map( |s| s.as_str())
            .ok_or_else( || TrueColorError::MissingAsset { tile: self.id.clone(), asset: key.to_string() })
    }
}

/// mean cloud cover of tiles that report one
pub fn mean_cloud_cover (tiles: &[ImageTile])->Option<f64> {
    let ccs: Vec<f64> = tiles.iter().filter_map( |t| t.cloud_cover).collect();
    if ccs.is_empty() { None } else { Some( ccs.iter().sum::<f64>() / ccs.len() as f64) }
}

/* #region STAC ****************************************************************************************************/

#[derive(Debug,Clone,Serialize,Deserialize)]
pub struct StacAsset {
    pub href: String,
}

/// the parts of a STAC item we need
#[derive(Debug,Clone,Deserialize)]
pub struct StacItem {
    pub id: String,
    pub geometry: Option<geojson::Geometry>,
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub properties: JsonObject,
    #[serde(default)]
    pub assets: BTreeMap<String,StacAsset>,
}

#[derive(Debug,Clone,Deserialize)]
pub struct StacLink {
    pub rel: String,
    pub href: String,
    pub method: Option<String>,
    pub body: Option<JsonValue>,
    #[serde(default)]
    pub merge: bool,
}

#[derive(Debug,Clone,Deserialize)]
pub struct StacItemCollection {
    #[serde(default)]
    pub features: Vec<StacItem>,
    #[serde(default)]
    pub links: Vec<StacLink>,
}

impl StacItemCollection {
    pub fn next_link (&self)->Option<&StacLink> {
        self.links.iter().find( |l| l.rel == "next")
    }
}

fn prop_str (props: &JsonObject, key: &str)->Option<String> {
    props.get(key).and_then( |v| v.as_str()).map( |s| s.to_string())
}

fn prop_f64 (props: &JsonObject, key: &str)->Option<f64> {
    props.get(key).and_then( |v| v.as_f64())
}

/// EPSG code from either "proj:epsg" (number) or "proj:code" ("EPSG:32633")
fn prop_epsg (props: &JsonObject)->Option<u32> {
    if let Some(epsg) = props.get("proj:epsg").and_then( |v| v.as_u64()) {
        return u32::try_from(epsg).ok()
    }
    prop_str( props, "proj:code")
        .and_then( |s| s.strip_prefix("EPSG:").and_then( |c| c.parse::<u32>().ok()))
}

fn footprint (item: &StacItem)->Result<MultiPolygon<f64>> {
    if let Some(geometry) = &item.geometry {
        match geo::Geometry::<f64>::try_from( geometry.clone())? {
            geo::Geometry::Polygon(p) => return Ok( MultiPolygon( vec![p])),
            geo::Geometry::MultiPolygon(mp) => return Ok(mp),
            _ => {}
        }
    }
    match item.bbox.as_deref() {
        Some([w,s,e,n]) => Ok( MultiPolygon( vec![ Rect::new( (*w,*s), (*e,*n)).to_polygon() ])),
        _ => Err( catalog_error( format!("item {} has no polygon footprint", item.id)))
    }
}

impl TryFrom<&StacItem> for ImageTile {
    type Error = TrueColorError;

    fn try_from (item: &StacItem)->Result<Self> {
        let props = &item.properties;
        let datetime = prop_str( props, "datetime")
            .and_then( |s| parse_datetime( &s))
            .ok_or_else( || catalog_error( format!("item {} has no valid datetime", item.id)))?;

        Ok( ImageTile {
            id: item.id.clone(),
            datetime,
            footprint: footprint( item)?,
            cloud_cover: prop_f64( props, "eo:cloud_cover"),
            epsg: prop_epsg( props),
            assets: item.assets.iter().map( |(k,a)| (k.clone(), a.href.clone())).collect(),
            platform: prop_str( props, "platform"),
            orbit_state: prop_str( props, "sat:orbit_state"),
            relative_orbit: props.get("sat:relative_orbit").and_then( |v| v.as_u64()).and_then( |v| u32::try_from(v).ok()),
            processing_baseline: prop_str( props, "s2:processing_baseline"),
            mgrs_tile: prop_str( props, "s2:mgrs_tile"),
        })
    }
}

/* #endregion STAC */

/// something we can search for image tiles
pub trait Catalog {
    /// all tiles intersecting `bbox` (EPSG:4326) acquired within [start,end] (UTC days, inclusive)
    /// with a cloud cover below `max_cloud`, in catalog order
    fn search (&self, bbox: &BoundingBox<f64>, start: NaiveDate, end: NaiveDate, max_cloud: f64)->Result<Vec<ImageTile>>;
}

/// client for a STAC API `/search` endpoint
pub struct StacCatalog {
    config: CatalogConfig,
    client: Client,
}

impl StacCatalog {
    pub fn new (config: CatalogConfig)->Result<Self> {
        let client = Client::builder().timeout( config.timeout).build()?;
        Ok( StacCatalog { config, client } )
    }

    pub fn search_url (&self)->String {
        format!("{}/search", self.config.url.trim_end_matches('/'))
    }

    fn search_body (&self, bbox: &BoundingBox<f64>, start: NaiveDate, end: NaiveDate, max_cloud: f64)->JsonValue {
        json!({
            "collections": [ self.config.collection ],
            "bbox": bbox.to_minmax_array(),
            "datetime": utc_day_interval( start, end),
            "query": { "eo:cloud_cover": { "lt": max_cloud } },
            "limit": self.config.page_size
        })
    }

    fn get_page (&self, url: &str, method: Option<&str>, body: &JsonValue)->Result<StacItemCollection> {
        if method.map( |m| m.eq_ignore_ascii_case("GET")).unwrap_or(false) {
            Ok( get_json( &self.client, url)? )
        } else {
            Ok( post_json_query( &self.client, url, body)? )
        }
    }
}

fn merge_body (base: &JsonValue, update: &JsonValue)->JsonValue {
    let mut merged = base.clone();
    if let (Some(m), Some(u)) = (merged.as_object_mut(), update.as_object()) {
        for (k,v) in u { m.insert( k.clone(), v.clone()); }
    }
    merged
}

impl Catalog for StacCatalog {
    fn search (&self, bbox: &BoundingBox<f64>, start: NaiveDate, end: NaiveDate, max_cloud: f64)->Result<Vec<ImageTile>> {
        let initial_body = self.search_body( bbox, start, end, max_cloud);
        let mut url = self.search_url();
        let mut method: Option<String> = Some("POST".to_string());
        let mut body = initial_body.clone();
        let mut tiles: Vec<ImageTile> = Vec::new();

        loop {
            let page = self.get_page( &url, method.as_deref(), &body)?;
            debug!("got {} items from {}", page.features.len(), url);

            for item in &page.features {
                tiles.push( ImageTile::try_from( item)?);
            }

            if let Some(max_items) = self.config.max_items {
                if tiles.len() >= max_items {
                    tiles.truncate( max_items);
                    break
                }
            }

            match page.next_link() {
                Some(link) if !page.features.is_empty() => {
                    url = link.href.clone();
                    method = link.method.clone();
                    body = match &link.body {
                        Some(b) if link.merge => merge_body( &initial_body, b),
                        Some(b) => b.clone(),
                        None => initial_body.clone()
                    };
                }
                _ => break
            }
        }

        info!("found {} {} tiles with cloud cover < {}%", tiles.len(), self.config.collection, max_cloud);
        Ok(tiles)
    }
}
