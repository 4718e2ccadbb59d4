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

//! utility functions for RON (de)serialization of configuration files

use std::{fs, path::Path};
use serde::de::DeserializeOwned;

use crate::define_error;

define_error!{ pub RonConfigError = 
    IOError(#[from] std::io::Error) : "IO error: {0}",
    ParseError(#[from] ron::error::SpannedError) : "RON parse error: {0}"
}

pub type Result<T> = std::result::Result<T, RonConfigError>;

/// load a RON serialized value of type T from the given file
pub fn load_ron_file<T,P> (path: P)->Result<T> where T: DeserializeOwned, P: AsRef<Path> {
    let contents = fs::read_to_string( path.as_ref())?;
    Ok( ron::from_str::<T>( &contents)? )
}
