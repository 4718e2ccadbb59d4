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

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Serialize,Deserialize,Serializer,Deserializer};
use std::time::Duration;
use parse_duration::parse;

#[inline] pub fn secs (n: u64)->Duration { Duration::from_secs(n) }
#[inline] pub fn minutes (n: u64)->Duration { Duration::from_secs(n * 60) }

#[inline]
pub fn utc_now()->DateTime<Utc> {
    Utc::now()
}

/// start of the given calendar day in UTC
pub fn naive_utc_date_to_utc_datetime (nd: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime( &nd.and_time( NaiveTime::MIN))
}

/// last second of the given calendar day in UTC
pub fn end_of_utc_day (nd: NaiveDate) -> DateTime<Utc> {
    naive_utc_date_to_utc_datetime(nd) + chrono::TimeDelta::seconds(86399)
}

/// RFC 3339 interval string "<start>/<end>" that covers the given days (inclusive)
pub fn utc_day_interval (start: NaiveDate, end: NaiveDate) -> String {
    format!("{}/{}", 
        naive_utc_date_to_utc_datetime(start).to_rfc3339_opts(SecondsFormat::Secs, true),
        end_of_utc_day(end).to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// compact day string as used in filenames (e.g. "20240617")
pub fn yyyymmdd (nd: &NaiveDate) -> String {
    nd.format("%Y%m%d").to_string()
}

pub fn short_utc_datetime_string (dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn parse_datetime (s: &str)->Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.to_utc()),
        Err(_) => None
    }
}

/// serde deserializer for human readable durations such as "2s" or "1min 30s"
pub fn deserialize_duration <'a,D>(deserializer: D) -> Result<Duration,D::Error>
    where D: Deserializer<'a>
{
    String::deserialize(deserializer).and_then( |string| {
        parse(string.as_str())
            .map_err( |e| serde::de::Error::custom(format!("{:?}",e)))
    })
}

pub fn serialize_duration<S: Serializer> (dur: &Duration, s: S) -> Result<S::Ok, S::Error>  {
    let dfm = format!("{:?}", dur);
    s.serialize_str(&dfm)
}
