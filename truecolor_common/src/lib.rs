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

use serde::{Serialize,Deserialize};
use num::{Num,ToPrimitive};

pub mod macros;
pub mod fs;
pub mod datetime;
pub mod utm;
pub mod ron;
pub mod net;

/// a generic bounding box without semantics for the coordinate type
#[repr(C)]
#[derive(Debug,Copy,Clone,Serialize,Deserialize,PartialEq)]
pub struct BoundingBox <T: Num> {
    pub west: T,
    pub south: T,
    pub east: T,
    pub north: T
}

impl <T: Num + Copy + ToPrimitive + PartialOrd> BoundingBox<T> {
    pub fn new(west: T, south: T, east: T, north: T)->Self {
        BoundingBox{ west, south, east, north}
    }

    pub fn to_minmax_array (&self) -> [T;4] {
        [self.west,self.south,self.east,self.north]
    }

    pub fn width (&self)->T { self.east - self.west }
    pub fn height (&self)->T { self.north - self.south }

    pub fn is_empty (&self)->bool { self.east <= self.west || self.north <= self.south }

    /// smallest box that contains both self and other
    pub fn union (&self, other: &Self)->Self {
        BoundingBox {
            west: if other.west < self.west { other.west } else { self.west },
            south: if other.south < self.south { other.south } else { self.south },
            east: if other.east > self.east { other.east } else { self.east },
            north: if other.north > self.north { other.north } else { self.north },
        }
    }

    /// overlap of self and other, None if they are disjoint
    pub fn intersection (&self, other: &Self)->Option<Self> {
        let bb = BoundingBox {
            west: if other.west > self.west { other.west } else { self.west },
            south: if other.south > self.south { other.south } else { self.south },
            east: if other.east < self.east { other.east } else { self.east },
            north: if other.north < self.north { other.north } else { self.north },
        };
        if bb.is_empty() { None } else { Some(bb) }
    }

    pub fn center (&self) -> (f64,f64) {
        let w = self.west.to_f64().unwrap_or(f64::NAN);
        let s = self.south.to_f64().unwrap_or(f64::NAN);
        let e = self.east.to_f64().unwrap_or(f64::NAN);
        let n = self.north.to_f64().unwrap_or(f64::NAN);
        ( (w + e) / 2.0, (s + n) / 2.0 )
    }
}

impl BoundingBox<f64> {
    /// grow (or shrink for negative values) the box by `d` on all sides
    pub fn buffered (&self, d: f64)->Self {
        BoundingBox { west: self.west - d, south: self.south - d, east: self.east + d, north: self.north + d }
    }
}
