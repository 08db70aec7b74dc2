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

//! Implementation of the [`Name`] type for domain names.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use arrayvec::ArrayVec;

/// The maximum length of the uncompressed on-the-wire representation of
/// a domain name.
const MAX_WIRE_LEN: usize = 255;

/// The maximum length of a label in a domain name (not including the
/// octet that provides the length).
const MAX_LABEL_LEN: usize = 63;

////////////////////////////////////////////////////////////////////////
// NAME STRUCTURE                                                     //
////////////////////////////////////////////////////////////////////////

/// A domain name, held in validated uncompressed wire form.
///
/// A `Name` can be constructed through the [`FromStr`] implementation
/// (which accepts dotted, fully qualified ASCII names with [RFC 4343
/// § 2.1] escapes), from uncompressed wire data with
/// [`Name::try_from_uncompressed`], or from compressed wire data with
/// [`Name::try_from_compressed`].
///
/// Equality and hashing are case-insensitive, since that is how the DNS
/// compares names. The canonical all-lowercase form required when a
/// name is fed into a TSIG MAC is produced explicitly with
/// [`Name::to_lowercase`].
///
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
#[derive(Clone)]
pub struct Name {
    wire: Box<[u8]>,
}

impl Name {
    /// Returns a `Name` representing the DNS root, `.`.
    pub fn root() -> Self {
        Self {
            wire: vec![0].into_boxed_slice(),
        }
    }

    /// Returns whether the `Name` is the DNS root.
    pub fn is_root(&self) -> bool {
        self.wire.len() == 1
    }

    /// Returns the uncompressed on-the-wire representation of the
    /// `Name`.
    pub fn wire_repr(&self) -> &[u8] {
        &self.wire
    }

    /// Makes all ASCII letters in this `Name` lowercase.
    pub fn make_ascii_lowercase(&mut self) {
        // Length octets are at most MAX_LABEL_LEN, well below b'A', so
        // lowercasing the whole buffer touches only label content.
        self.wire.make_ascii_lowercase();
    }

    /// Returns a copy of this `Name` with all ASCII letters lowercase.
    pub fn to_lowercase(&self) -> Self {
        let mut name = self.clone();
        name.make_ascii_lowercase();
        name
    }

    /// Tries to parse an uncompressed name present at the start of the
    /// provided buffer. The name need not occupy the entire buffer;
    /// extra data is ignored. If the name is valid, the new `Name` is
    /// returned along with its length in octets.
    pub fn try_from_uncompressed(octets: &[u8]) -> Result<(Self, usize), Error> {
        let mut offset = 0;
        loop {
            let len = *octets.get(offset).ok_or(Error::UnexpectedEom)? as usize;
            if len > MAX_LABEL_LEN {
                return Err(Error::LabelTooLong);
            }
            offset += len + 1;
            if offset > MAX_WIRE_LEN {
                return Err(Error::NameTooLong);
            }
            if len == 0 {
                break;
            }
            if offset > octets.len() {
                return Err(Error::UnexpectedEom);
            }
        }
        let name = Self {
            wire: octets[..offset].into(),
        };
        Ok((name, offset))
    }

    /// Tries to parse a compressed name present at index `start` of the
    /// provided buffer. Pointers are followed; indices given in
    /// pointers are treated as indices in `octets`, so generally one
    /// will pass an entire DNS message. Two things are returned on
    /// success:
    ///
    /// * the new `Name`; and
    /// * the number of contiguous octets read at `start` (that is, the
    ///   number of octets to skip past `start` to reach the next field
    ///   of the message).
    pub fn try_from_compressed(octets: &[u8], start: usize) -> Result<(Self, usize), Error> {
        let mut wire = ArrayVec::<u8, MAX_WIRE_LEN>::new();
        let mut next_chunk = Some(start);
        let mut first_chunk_len = None;

        while let Some(chunk_start) = next_chunk {
            let mut index = chunk_start;
            loop {
                let len = *octets.get(index).ok_or(Error::UnexpectedEom)?;
                if len & 0xc0 == 0xc0 {
                    next_chunk = Some(parse_pointer(octets, chunk_start, index)? as usize);
                    index += 2;
                    break;
                } else if len as usize > MAX_LABEL_LEN {
                    return Err(Error::LabelTooLong);
                }
                let end_of_label = index + len as usize + 1;
                if end_of_label > octets.len() {
                    return Err(Error::UnexpectedEom);
                }
                wire.try_extend_from_slice(&octets[index..end_of_label])
                    .or(Err(Error::NameTooLong))?;
                index = end_of_label;
                if len == 0 {
                    next_chunk = None;
                    break;
                }
            }
            first_chunk_len.get_or_insert(index - chunk_start);
        }

        let name = Self {
            wire: wire.as_slice().into(),
        };
        Ok((name, first_chunk_len.unwrap()))
    }
}

/// Parses a pointer at `index` in `octets`. This also checks that the
/// pointer refers to an index *earlier* than the start of the chunk it
/// is in (`chunk_start`); per RFC 1035 § 4.1.4 pointers point to a
/// *prior* occurrence of a name, which conveniently prevents loops.
fn parse_pointer(octets: &[u8], chunk_start: usize, index: usize) -> Result<u16, Error> {
    if index + 1 < octets.len() {
        let pointer_bytes = [octets[index], octets[index + 1]];
        let pointer = u16::from_be_bytes(pointer_bytes) & !0xc000;
        if (pointer as usize) >= chunk_start {
            Err(Error::InvalidPointer)
        } else {
            Ok(pointer)
        }
    } else {
        Err(Error::UnexpectedEom)
    }
}

////////////////////////////////////////////////////////////////////////
// COMPARISON, HASHING, AND FORMATTING                                //
////////////////////////////////////////////////////////////////////////

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.wire.eq_ignore_ascii_case(&other.wire)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for &octet in self.wire.iter() {
            state.write_u8(octet.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let mut offset = 0;
        while self.wire[offset] != 0 {
            let len = self.wire[offset] as usize;
            for &octet in &self.wire[offset + 1..offset + 1 + len] {
                match octet {
                    b'.' | b'\\' => write!(f, "\\{}", octet as char)?,
                    0x21..=0x7e => write!(f, "{}", octet as char)?,
                    _ => write!(f, "\\{:03}", octet)?,
                }
            }
            f.write_str(".")?;
            offset += len + 1;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\"", self)
    }
}

////////////////////////////////////////////////////////////////////////
// PARSING OF NAMES FROM RUST STRINGS                                 //
////////////////////////////////////////////////////////////////////////

/// Allows for conversion of a Rust [`str`] into a [`Name`]. The passed
/// string must be strictly ASCII and fully qualified (ending with a
/// dot). Escape sequences as defined by [RFC 4343 § 2.1] are supported.
///
/// [RFC 4343 § 2.1]: https://datatracker.ietf.org/doc/html/rfc4343#section-2.1
impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::StrEmpty);
        } else if s == "." {
            return Ok(Name::root());
        }

        let octets = s.as_bytes();
        let mut wire = Vec::with_capacity(s.len() + 1);
        let mut label = Vec::new();
        let mut index = 0;
        let mut terminated = false;

        while index < octets.len() {
            let octet = octets[index];
            if octet == b'\\' {
                let (value, consumed) = parse_escape(&octets[index + 1..])?;
                label.push(value);
                index += consumed + 1;
                terminated = false;
            } else if octet == b'.' {
                if label.is_empty() {
                    return Err(Error::NullNonTerminal);
                }
                flush_label(&mut wire, &mut label)?;
                index += 1;
                terminated = true;
            } else if !octet.is_ascii() {
                return Err(Error::StrNotAscii);
            } else {
                label.push(octet);
                index += 1;
                terminated = false;
            }
        }

        if !terminated {
            return Err(Error::NonNullTerminal);
        }
        wire.push(0);
        if wire.len() > MAX_WIRE_LEN {
            return Err(Error::NameTooLong);
        }
        Ok(Self {
            wire: wire.into_boxed_slice(),
        })
    }
}

/// Appends the accumulated label to the wire buffer being built.
fn flush_label(wire: &mut Vec<u8>, label: &mut Vec<u8>) -> Result<(), Error> {
    if label.len() > MAX_LABEL_LEN {
        return Err(Error::LabelTooLong);
    }
    wire.push(label.len() as u8);
    wire.extend_from_slice(label);
    label.clear();
    Ok(())
}

/// Parses an escape sequence. We expect `remaining_octets` to start
/// with the octet immediately *after* the backslash that introduces the
/// escape sequence.
fn parse_escape(remaining_octets: &[u8]) -> Result<(u8, usize), Error> {
    if remaining_octets.is_empty() {
        Err(Error::InvalidEscape)
    } else if remaining_octets[0].is_ascii_digit() {
        if remaining_octets.len() < 3
            || !remaining_octets[1].is_ascii_digit()
            || !remaining_octets[2].is_ascii_digit()
        {
            Err(Error::InvalidEscape)
        } else {
            let hundreds = (remaining_octets[0] - b'0') as usize;
            let tens = (remaining_octets[1] - b'0') as usize;
            let ones = (remaining_octets[2] - b'0') as usize;
            let value = 100 * hundreds + 10 * tens + ones;
            if value > 255 {
                Err(Error::InvalidEscape)
            } else {
                Ok((value as u8, 3))
            }
        }
    } else {
        Ok((remaining_octets[0], 1))
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error signaling that a domain name could not be parsed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Error {
    StrEmpty,
    StrNotAscii,
    InvalidEscape,
    LabelTooLong,
    NameTooLong,
    NullNonTerminal,
    NonNullTerminal,
    UnexpectedEom,
    InvalidPointer,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::StrEmpty => f.write_str("string is empty"),
            Self::StrNotAscii => f.write_str("string is not ASCII"),
            Self::InvalidEscape => f.write_str("invalid escape sequence"),
            Self::LabelTooLong => f.write_str("label exceeds 63 octets"),
            Self::NameTooLong => f.write_str("name exceeds 255 octets"),
            Self::NullNonTerminal => f.write_str("null label in non-terminal position"),
            Self::NonNullTerminal => f.write_str("name is not fully qualified"),
            Self::UnexpectedEom => f.write_str("unexpected end of message"),
            Self::InvalidPointer => f.write_str("compression pointer does not point backward"),
        }
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
