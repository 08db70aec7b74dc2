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

//! Resource record fundamentals: the [`Type`] newtype and the generic
//! [`Record`] structure with opaque RDATA.

use std::fmt;

use crate::class::Class;
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// RR TYPES                                                           //
////////////////////////////////////////////////////////////////////////

/// The TYPE of a resource record.
///
/// A TYPE is represented on the wire as an unsigned 16-bit integer.
/// This crate never interprets RDATA except for TSIG, so the constants
/// here are limited to types that show up in its own processing and
/// tests; any other value is carried through opaquely.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
pub struct Type(u16);

impl Type {
    // RFC 1035
    pub const A: Self = Self(1);
    pub const NS: Self = Self(2);
    pub const CNAME: Self = Self(5);
    pub const SOA: Self = Self(6);
    pub const MX: Self = Self(15);
    pub const TXT: Self = Self(16);

    // RFC 3596
    pub const AAAA: Self = Self(28);

    // RFC 6891
    pub const OPT: Self = Self(41);

    // RFC 2845
    pub const TSIG: Self = Self(250);

    // RFC 1035 (QTYPEs, carried here as in the original since questions
    // share the 16-bit type space)
    pub const AXFR: Self = Self(252);
    pub const ANY: Self = Self(255);
}

impl From<u16> for Type {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

impl From<Type> for u16 {
    fn from(rr_type: Type) -> Self {
        rr_type.0
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::A => f.write_str("A"),
            Self::NS => f.write_str("NS"),
            Self::CNAME => f.write_str("CNAME"),
            Self::SOA => f.write_str("SOA"),
            Self::MX => f.write_str("MX"),
            Self::TXT => f.write_str("TXT"),
            Self::AAAA => f.write_str("AAAA"),
            Self::OPT => f.write_str("OPT"),
            Self::TSIG => f.write_str("TSIG"),
            Self::AXFR => f.write_str("AXFR"),
            Self::ANY => f.write_str("ANY"),
            Self(value) => write!(f, "TYPE{}", value),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

////////////////////////////////////////////////////////////////////////
// GENERIC RECORDS                                                    //
////////////////////////////////////////////////////////////////////////

/// A resource record whose RDATA is carried as opaque octets.
///
/// This is all the record machinery TSIG processing needs: enough to
/// serialize a record into a message, to walk past records of other
/// types, and to recognize the TSIG pseudo-RR itself.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    pub owner: Name,
    pub rr_type: Type,
    pub class: Class,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl Record {
    /// Returns whether this record is a TSIG pseudo-RR.
    pub fn is_tsig(&self) -> bool {
        self.rr_type == Type::TSIG
    }

    /// Serializes the record (with an uncompressed owner name) into the
    /// provided buffer.
    pub fn pack_into(&self, buf: &mut Vec<u8>) -> Result<(), PackError> {
        if self.rdata.len() > u16::MAX as usize {
            return Err(PackError);
        }
        buf.extend_from_slice(self.owner.wire_repr());
        buf.extend_from_slice(&u16::from(self.rr_type).to_be_bytes());
        buf.extend_from_slice(&u16::from(self.class).to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&(self.rdata.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.rdata);
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a record or message could not be serialized
/// because a field or section exceeded its wire-format limit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PackError;

impl fmt::Display for PackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("record or message too large to serialize")
    }
}

impl std::error::Error for PackError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
