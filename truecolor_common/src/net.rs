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

//! common utility functions for (blocking) network operations

use reqwest::{blocking::Client, header::{HeaderValue, CONTENT_TYPE, CONTENT_LENGTH, RANGE}, StatusCode};
use regex::Regex;
use lazy_static::lazy_static;
use serde::{de::DeserializeOwned,Serialize};

use crate::define_error;

lazy_static! {
    static ref FNAME_RE: Regex = Regex::new( r"(?:.*/)([^/?#]+)(?:[?#].*)?$").unwrap();
}

define_error!{ pub NetError = 
    IOError(#[from] std::io::Error) : "IO error: {0}",
    NotFoundError(String) : "not found {0}",
    HttpError(#[from] reqwest::Error) : "http error: {0}",
    StatusError(u16,String) : "response status {0} for {1}",
    OpFailed(String) : "operation failed: {0}"
}

impl NetError {
    /// errors that might go away if we try again later (connection problems, throttling, server errors)
    pub fn is_transient (&self)->bool {
        match self {
            NetError::IOError(_) => true,
            NetError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            NetError::StatusError(status,_) => *status == 429 || *status >= 500,
            _ => false
        }
    }
}

pub type Result<T> = std::result::Result<T, NetError>;

fn check_status (url: &str, status: StatusCode)->Result<()> {
    match status {
        StatusCode::OK | StatusCode::PARTIAL_CONTENT => Ok(()),
        StatusCode::NOT_FOUND => Err( NetError::NotFoundError(url.to_string())),
        other => Err( NetError::StatusError( other.as_u16(), url.to_string()))
    }
}

pub fn post_json_query<T,U> (client: &Client, url: &str, data: &T) -> Result<U> where T: Serialize, U: DeserializeOwned {
    let response = client.post( url)
        .header( CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .json( data)
        .send()?;

    check_status( url, response.status())?;
    Ok( response.json()? )
}

pub fn get_json<U> (client: &Client, url: &str) -> Result<U> where U: DeserializeOwned {
    let response = client.get( url).send()?;
    check_status( url, response.status())?;
    Ok( response.json()? )
}

pub fn get_content_length (client: &Client, url: &str) -> Result<u64> {
    let response = client.head( url).send()?;
    check_status( url, response.status())?;

    response.headers().get(CONTENT_LENGTH)
        .and_then( |v| v.to_str().ok())
        .and_then( |s| s.parse::<u64>().ok())
        .ok_or_else( || NetError::OpFailed(format!("no content length for {url}")))
}

/// retrieve bytes [start..start+len) of the resource at url with a HTTP range request
pub fn get_byte_range (client: &Client, url: &str, start: u64, len: u64) -> Result<Vec<u8>> {
    if len == 0 { return Ok(Vec::new()) }

    let range = format!("bytes={}-{}", start, start + len - 1);
    let response = client.get( url).header( RANGE, range).send()?;
    let status = response.status();
    check_status( url, status)?;

    let bytes = response.bytes()?;
    if status == StatusCode::PARTIAL_CONTENT {
        Ok( bytes.to_vec() )
    } else { // server ignored the range header and sent everything
        let s = (start as usize).min( bytes.len());
        let e = (s + len as usize).min( bytes.len());
        Ok( bytes[s..e].to_vec() )
    }
}

pub fn url_file_name (url: &str) -> Option<&str> {
    FNAME_RE.captures(url).and_then( |cap| cap.get(1).map( |m| m.as_str()))
}
