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

use std::fs::{self,File};
use std::io::{self, ErrorKind, Error as IOError};
use std::path::{Path,PathBuf};
use io::ErrorKind::*;

use crate::io_error;

type Result<T> = std::result::Result<T,std::io::Error>;

/// check if dir pathname exists and is writable, try to create dir otherwise
pub fn ensure_writable_dir (path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if path.is_dir() {
        let md = fs::metadata(&path)?;
        if md.permissions().readonly() {
            Err(io_error!(PermissionDenied, "output_dir {:?} not writable", &path))
        } else {
            Ok(())
        }

    } else {
        fs::create_dir_all(path)
    }
}

pub fn file_length (path: impl AsRef<Path>)->Option<u64> {
    fs::metadata(path).ok().map(|md| md.len())
}

/// answer if path is an existing regular file with content
pub fn is_non_empty_file (path: impl AsRef<Path>)->bool {
    let path = path.as_ref();
    path.is_file() && file_length(path).map(|len| len > 0).unwrap_or(false)
}

/// the pathname we write to before a file is complete. Partially written outputs should never be
/// mistaken for finished products
pub fn tmp_path (path: impl AsRef<Path>)->PathBuf {
    let path = path.as_ref();
    let mut fname = path.file_name().map(|s| s.to_os_string()).unwrap_or_default();
    fname.push(".tmp");
    path.with_file_name(fname)
}

/// move a completed tmp file to its final location, replacing any existing file
pub fn commit_tmp (tmp: impl AsRef<Path>, path: impl AsRef<Path>)->io::Result<()> {
    fs::rename( tmp.as_ref(), path.as_ref())
}

/// create (truncate) a file after making sure its parent directory exists
pub fn create_file_with_parents (path: impl AsRef<Path>)->io::Result<File> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_writable_dir(parent)?;
        }
    }
    File::create(path)
}
