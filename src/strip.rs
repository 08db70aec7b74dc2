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

//! Splitting of a received message into its signed region and its TSIG
//! record.

use std::convert::TryFrom;

use log::debug;

use crate::message::{self, Rcode, Reader};
use crate::record::TsigRecord;
use crate::rr::Type;
use crate::Error;

/// Locates the TSIG record of a wire-format message and splits the
/// message around it.
///
/// On success this returns the signed region (a copy of the message up
/// to the start of the TSIG record, with its ARCOUNT already reduced by
/// one so that it reads as a well-formed TSIG-less message) together
/// with the parsed [`TsigRecord`].
///
/// Messages whose additional section is empty, or that have no TSIG
/// record in it, fail with [`Error::NoSignature`]. A message whose
/// RCODE is NOTAUTH is a signature rejection from the remote end and
/// fails with [`Error::NotAuthoritative`] before any parsing of record
/// sections is attempted.
pub fn strip_tsig(msg: &[u8]) -> Result<(Vec<u8>, TsigRecord), Error> {
    let mut reader = Reader::try_from(msg)?;
    let arcount = reader.arcount();
    if arcount == 0 {
        return Err(Error::NoSignature);
    }
    if reader.rcode() == Rcode::NOTAUTH {
        return Err(Error::NotAuthoritative);
    }

    for _ in 0..reader.qdcount() {
        reader.read_question()?;
    }
    let preceding_rrs = reader.ancount() as usize + reader.nscount() as usize;
    for _ in 0..preceding_rrs {
        reader.read_rr()?;
    }
    for _ in 0..arcount {
        let rr = reader.read_rr()?;
        if rr.rr_type == Type::TSIG {
            let record = TsigRecord::parse(rr.owner, rr.rdata)?;
            let mut signed = msg[..rr.start].to_vec();
            message::set_arcount(&mut signed, arcount - 1);
            debug!(
                "stripped TSIG record (key {}, algorithm {}) from message {:#06x}",
                record.name, record.algorithm, reader.id(),
            );
            return Ok((signed, record));
        }
    }
    Err(Error::NoSignature)
}

impl From<crate::message::reader::Error> for Error {
    fn from(_: crate::message::reader::Error) -> Self {
        Self::Unpack
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
