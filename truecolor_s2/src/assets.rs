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

//! opening band assets as raster sources: local files, or remote cloud optimized GeoTIFFs that are read
//! with HTTP range requests after signing their hrefs with a Planetary Computer SAS token

use std::{
    collections::{HashMap, VecDeque}, io::{self, Read, Seek, SeekFrom}, sync::Mutex, thread, time::Duration
};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use truecolor_common::{
    datetime::{parse_datetime, utc_now}, io_error, net::{get_byte_range, get_content_length, get_json, url_file_name}
};
use truecolor_raster::{geotiff::GeoTiffSource, source::RasterSource};

use crate::{config::CatalogConfig, errors::{op_failed, Result}};

/// an opened single band asset
pub type BandSource = Box<dyn RasterSource<u16>>;

/// something that turns asset hrefs into readable raster sources
pub trait AssetOpener {
    fn open (&self, href: &str)->Result<BandSource>;
}

/// run `op` until it succeeds, fails with a non-retryable error or `max_attempts` is reached,
/// sleeping `delay` between attempts
pub fn with_retry<T,F> (what: &str, max_attempts: u32, delay: Duration, mut op: F)->Result<T> where F: FnMut()->Result<T> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                info!("{what} failed: {e}, retry {attempt}/{} in {:.1} sec", max_attempts - 1, delay.as_secs_f64());
                thread::sleep( delay);
                attempt += 1;
            }
            Err(e) => return Err(e)
        }
    }
}

pub fn is_remote (href: &str)->bool {
    href.starts_with("https://") || href.starts_with("http://")
}

/* #region HTTP range reader ***************************************************************************************/

pub const DEFAULT_BLOCK_SIZE: u64 = 512 * 1024;
pub const DEFAULT_MAX_BLOCKS: usize = 64;

/// Read + Seek access to a remote resource that fetches fixed size blocks with HTTP range requests and
/// keeps the most recently fetched blocks
pub struct HttpRangeReader {
    client: Client,
    url: String,
    len: u64,
    pos: u64,
    block_size: u64,
    max_blocks: usize,
    blocks: HashMap<u64,Vec<u8>>,
    fetched: VecDeque<u64>,
}

impl HttpRangeReader {
    pub fn new (client: Client, url: impl ToString, block_size: u64, max_blocks: usize)->Result<Self> {
        let url = url.to_string();
        if block_size == 0 || max_blocks == 0 {
            return Err( op_failed("zero block cache size"))
        }
        let len = get_content_length( &client, &url)?;
        Ok( HttpRangeReader { client, url, len, pos: 0, block_size, max_blocks, blocks: HashMap::new(), fetched: VecDeque::new() } )
    }

    pub fn len (&self)->u64 { self.len }

    fn block (&mut self, idx: u64)->io::Result<&Vec<u8>> {
        if !self.blocks.contains_key( &idx) {
            let start = idx * self.block_size;
            let n = self.block_size.min( self.len - start);
            let bytes = get_byte_range( &self.client, &self.url, start, n)
                .map_err( |e| io_error!( io::ErrorKind::Other, "range request failed: {}", e))?;
            if bytes.len() as u64 != n {
                return Err( io_error!( io::ErrorKind::UnexpectedEof, "short range response {} of {} bytes", bytes.len(), n))
            }

            if self.fetched.len() >= self.max_blocks {
                if let Some(old) = self.fetched.pop_front() { self.blocks.remove( &old); }
            }
            self.fetched.push_back( idx);
            self.blocks.insert( idx, bytes);
        }
        self.blocks.get( &idx).ok_or_else( || io_error!( io::ErrorKind::Other, "block {} not cached", idx))
    }
}

impl Read for HttpRangeReader {
    fn read (&mut self, buf: &mut [u8])->io::Result<usize> {
        if self.pos >= self.len || buf.is_empty() { return Ok(0) }

        let idx = self.pos / self.block_size;
        let off = (self.pos - idx * self.block_size) as usize;
        let block = self.block( idx)?;
        let n = (block.len() - off).min( buf.len());
        buf[..n].copy_from_slice( &block[off..off+n]);

        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for HttpRangeReader {
    fn seek (&mut self, pos: SeekFrom)->io::Result<u64> {
        let new_pos = match pos {
            SeekFrom::Start(p) => Some(p),
            SeekFrom::End(d) => self.len.checked_add_signed(d),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
        };
        match new_pos {
            Some(p) => { self.pos = p; Ok(p) }
            None => Err( io_error!( io::ErrorKind::InvalidInput, "invalid seek to {:?}", pos))
        }
    }
}

/* #endregion HTTP range reader */

/* #region Planetary Computer signing ******************************************************************************/

#[derive(Debug,Deserialize)]
struct SasTokenResponse {
    token: String,
    #[serde(rename = "msft:expiry")]
    expiry: String,
}

#[derive(Debug,Clone)]
struct SasToken {
    token: String,
    expiry: DateTime<Utc>,
}

/// tokens that expire within this many minutes are renewed
const TOKEN_EXPIRY_MARGIN_MINUTES: i64 = 5;

/// hosts whose hrefs need a SAS token
fn needs_signing (href: &str)->bool {
    let host = href.split("://").nth(1).and_then( |s| s.split('/').next()).unwrap_or("");
    host.ends_with(".blob.core.windows.net") && !href.contains("sig=")
}

/// append a SAS token as query to an href
pub fn append_token (href: &str, token: &str)->String {
    let token = token.trim_start_matches('?');
    if href.contains('?') { format!("{href}&{token}") } else { format!("{href}?{token}") }
}

/* #endregion Planetary Computer signing */

/// opens local paths from disk and remote hrefs with HTTP range requests, signing hrefs of Azure blob
/// storage with a (cached) SAS token if a token endpoint is configured
pub struct HttpAssetOpener {
    client: Client,
    sas_url: Option<String>,
    collection: String,
    block_size: u64,
    max_blocks: usize,
    token: Mutex<Option<SasToken>>,
}

impl HttpAssetOpener {
    pub fn new (config: &CatalogConfig)->Result<Self> {
        let client = Client::builder().timeout( config.timeout).build()?;
        Ok( HttpAssetOpener {
            client,
            sas_url: config.sas_url.clone(),
            collection: config.collection.clone(),
            block_size: DEFAULT_BLOCK_SIZE,
            max_blocks: DEFAULT_MAX_BLOCKS,
            token: Mutex::new(None),
        })
    }

    fn token (&self, sas_url: &str)->Result<String> {
        let mut cached = self.token.lock().map_err( |_| op_failed("poisoned token cache"))?;
        if let Some(t) = cached.as_ref() {
            if t.expiry - TimeDelta::minutes( TOKEN_EXPIRY_MARGIN_MINUTES) > utc_now() {
                return Ok( t.token.clone() )
            }
        }

        let url = format!("{}/{}", sas_url.trim_end_matches('/'), self.collection);
        info!("requesting SAS token for {}", self.collection);
        let response: SasTokenResponse = get_json( &self.client, &url)?;
        let expiry = parse_datetime( &response.expiry)
            .ok_or_else( || op_failed( format!("invalid token expiry {}", response.expiry)))?;
        debug!("SAS token for {} expires {}", self.collection, expiry);

        let token = response.token.clone();
        *cached = Some( SasToken { token: response.token, expiry });
        Ok(token)
    }

    /// the href with a SAS token if it needs one
    pub fn sign (&self, href: &str)->Result<String> {
        match &self.sas_url {
            Some(sas_url) if needs_signing( href) => Ok( append_token( href, &self.token( sas_url)?) ),
            _ => Ok( href.to_string() )
        }
    }
}

impl AssetOpener for HttpAssetOpener {
    fn open (&self, href: &str)->Result<BandSource> {
        if is_remote( href) {
            let url = self.sign( href)?;
            let name = url_file_name( href).unwrap_or( href).to_string();
            let reader = HttpRangeReader::new( self.client.clone(), url, self.block_size, self.max_blocks)?;
            debug!("opening remote {name} ({} bytes)", reader.len());
            Ok( Box::new( GeoTiffSource::open( reader, name)?) )
        } else {
            let path = href.strip_prefix("file://").unwrap_or( href);
            Ok( Box::new( GeoTiffSource::open_file( path)?) )
        }
    }
}
