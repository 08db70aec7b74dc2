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

//! Implementation of reading and writing of DNS messages.

pub(crate) mod constants;
mod rcode;
pub mod reader;
pub use rcode::Rcode;
pub use reader::Reader;

use crate::class::Class;
use crate::name::Name;
use crate::rr::{PackError, Record, Type};

////////////////////////////////////////////////////////////////////////
// QUESTIONS                                                          //
////////////////////////////////////////////////////////////////////////

/// The question of a DNS query, per RFC 1035 § 4.1.2.
///
/// The QTYPE and QCLASS share the 16-bit spaces of record types and
/// classes, so they are carried here as [`Type`] and [`Class`].
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Question {
    pub qname: Name,
    pub qtype: Type,
    pub qclass: Class,
}

////////////////////////////////////////////////////////////////////////
// MESSAGES                                                           //
////////////////////////////////////////////////////////////////////////

/// A DNS message held in structured form.
///
/// This is the signer's view of a message: a header, a question, and
/// three record sections with opaque RDATA. The TSIG stub that
/// [`sign`](crate::sign) consumes is simply the last record of
/// [`additional`](Self::additional). The `flags` field carries the
/// second 16-bit word of the header (QR, opcode, AA, TC, RD, RA, and
/// RCODE) verbatim.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Message {
    pub id: u16,
    pub flags: u16,
    pub question: Vec<Question>,
    pub answer: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
}

impl Message {
    /// Creates an empty query message with the given transaction id.
    pub fn new(id: u16) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Replaces the question section with a single question.
    pub fn set_question(&mut self, qname: Name, qtype: Type, qclass: Class) {
        self.question = vec![Question {
            qname,
            qtype,
            qclass,
        }];
    }

    /// Returns the RCODE carried in the flags word.
    pub fn rcode(&self) -> Rcode {
        Rcode::from(self.flags as u8)
    }

    /// Sets the RCODE bits of the flags word.
    pub fn set_rcode(&mut self, rcode: Rcode) {
        self.flags = (self.flags & !(constants::RCODE_MASK as u16)) | u8::from(rcode) as u16;
    }

    /// Returns whether the last record of the additional section is a
    /// TSIG pseudo-RR. This is the precondition [`sign`](crate::sign)
    /// requires of its message argument.
    pub fn is_tsig(&self) -> bool {
        self.additional.last().is_some_and(Record::is_tsig)
    }

    /// Serializes the message to wire format. Names are written
    /// uncompressed, so the output is byte-for-byte reproducible from
    /// the structured form alone.
    pub fn pack(&self) -> Result<Vec<u8>, PackError> {
        let qdcount = section_count(self.question.len())?;
        let ancount = section_count(self.answer.len())?;
        let nscount = section_count(self.authority.len())?;
        let arcount = section_count(self.additional.len())?;

        let mut buf = Vec::with_capacity(512);
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&qdcount.to_be_bytes());
        buf.extend_from_slice(&ancount.to_be_bytes());
        buf.extend_from_slice(&nscount.to_be_bytes());
        buf.extend_from_slice(&arcount.to_be_bytes());

        for question in &self.question {
            buf.extend_from_slice(question.qname.wire_repr());
            buf.extend_from_slice(&u16::from(question.qtype).to_be_bytes());
            buf.extend_from_slice(&u16::from(question.qclass).to_be_bytes());
        }
        for record in self
            .answer
            .iter()
            .chain(&self.authority)
            .chain(&self.additional)
        {
            record.pack_into(&mut buf)?;
        }
        Ok(buf)
    }
}

/// Converts a section length into the 16-bit count the header carries.
fn section_count(len: usize) -> Result<u16, PackError> {
    u16::try_from(len).or(Err(PackError))
}

/// Patches the ARCOUNT field of a wire-format message in place.
///
/// Contract: this writes exactly bytes [10,12) of `msg` (the 16-bit
/// big-endian additional-record count of the fixed header) and nothing
/// else. `msg` must be at least a full header long.
pub(crate) fn set_arcount(msg: &mut [u8], arcount: u16) {
    msg[constants::ARCOUNT_START..constants::ARCOUNT_END].copy_from_slice(&arcount.to_be_bytes());
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
