// Copyright 2024 the tsig authors.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the [`Class`] type.

use std::fmt;

////////////////////////////////////////////////////////////////////////
// CLASSES                                                            //
////////////////////////////////////////////////////////////////////////

/// The CLASS of a resource record.
///
/// A CLASS is represented on the wire as an unsigned 16-bit integer, so
/// this is a wrapper around [`u16`] with constants for the values this
/// crate cares about. Every TSIG RR is of class [`ANY`](Self::ANY) per
/// RFC 2845 § 2.3.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Class(u16);

impl Class {
    // RFC 1035
    pub const IN: Self = Self(1);
    pub const CH: Self = Self(3);
    pub const HS: Self = Self(4);

    // RFC 2136
    pub const NONE: Self = Self(254);

    // RFC 1035 (QCLASS *; also the class of the TSIG pseudo-RR)
    pub const ANY: Self = Self(255);
}

impl From<u16> for Class {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Class> for u16 {
    fn from(class: Class) -> Self {
        class.0
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::IN => f.write_str("IN"),
            Self::CH => f.write_str("CH"),
            Self::HS => f.write_str("HS"),
            Self::NONE => f.write_str("NONE"),
            Self::ANY => f.write_str("ANY"),
            Self(value) => write!(f, "CLASS{}", value),
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}
