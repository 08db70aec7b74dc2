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

//! The [`TsigRecord`] structure and its RDATA wire format.

use std::fmt;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::class::Class;
use crate::name::Name;
use crate::rr::{Record, Type};
use crate::Error;

/// The default fudge value (in seconds) applied when a TSIG stub does
/// not specify one.
pub const DEFAULT_FUDGE: u16 = 300;

/// TIME SIGNED is a 48-bit field on the wire.
const MAX_TIME_SIGNED: u64 = (1 << 48) - 1;

////////////////////////////////////////////////////////////////////////
// THE TSIG RECORD                                                    //
////////////////////////////////////////////////////////////////////////

/// The TSIG pseudo-RR of RFC 2845, in structured form.
///
/// The `mac` field holds the MAC as lowercase hexadecimal text; on the
/// wire it is raw octets preceded by a 16-bit size. A request MAC
/// passed between [`sign`](crate::sign) and [`verify`](crate::verify)
/// calls is this hexadecimal form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TsigRecord {
    /// The owner name of the record, which identifies the shared key.
    pub name: Name,
    /// The domain name identifying the algorithm.
    pub algorithm: Name,
    /// Seconds since the Unix epoch, truncated to 48 bits on the wire.
    pub time_signed: u64,
    /// The permitted clock skew, in seconds, on either side of
    /// `time_signed`.
    pub fudge: u16,
    /// The MAC as lowercase hexadecimal text.
    pub mac: String,
    /// The original message ID, echoed so that the signer's ID survives
    /// forwarders that rewrite the header.
    pub orig_id: u16,
    /// The TSIG error field (a 16-bit extended RCODE).
    pub error: u16,
    /// The "other data" field, used to convey the server's clock on a
    /// BADTIME error.
    pub other_data: Vec<u8>,
}

impl TsigRecord {
    /// Creates the unsigned stub record that callers append to a
    /// message before signing it. Time and fudge are left zero and are
    /// filled in with [`TsigRecord::with_defaults`] at signing time.
    pub fn stub(name: Name, algorithm: Name) -> Self {
        Self {
            name,
            algorithm,
            time_signed: 0,
            fudge: 0,
            mac: String::new(),
            orig_id: 0,
            error: 0,
            other_data: Vec::new(),
        }
    }

    /// Returns the size in octets of the MAC carried by this record.
    pub fn mac_size(&self) -> u16 {
        (self.mac.len() / 2) as u16
    }

    /// Returns a copy of this record with unset timing fields filled
    /// in: a zero `time_signed` becomes `now` and a zero `fudge`
    /// becomes [`DEFAULT_FUDGE`]. Fields already set are kept, so a
    /// caller can pin an exact time for testing or for signing at a
    /// chosen moment.
    pub fn with_defaults(&self, now: u64) -> Self {
        let mut record = self.clone();
        if record.time_signed == 0 {
            record.time_signed = now;
        }
        if record.fudge == 0 {
            record.fudge = DEFAULT_FUDGE;
        }
        record
    }

    /// Serializes the RDATA of this record per RFC 2845 § 2.3. The
    /// algorithm name is written uncompressed, as RFC 3597 § 4 requires
    /// of TSIG.
    pub fn serialize_rdata(&self) -> Result<Vec<u8>, Error> {
        if self.time_signed > MAX_TIME_SIGNED || self.other_data.len() > u16::MAX as usize {
            return Err(Error::Pack);
        }
        let mac = hex::decode(&self.mac).or(Err(Error::Pack))?;
        if mac.len() > u16::MAX as usize {
            return Err(Error::Pack);
        }

        let mut buf =
            Vec::with_capacity(self.algorithm.wire_repr().len() + 16 + mac.len() + self.other_data.len());
        buf.extend_from_slice(self.algorithm.wire_repr());
        put_u48(&mut buf, self.time_signed);
        buf.extend_from_slice(&self.fudge.to_be_bytes());
        buf.extend_from_slice(&(mac.len() as u16).to_be_bytes());
        buf.extend_from_slice(&mac);
        buf.extend_from_slice(&self.orig_id.to_be_bytes());
        buf.extend_from_slice(&self.error.to_be_bytes());
        buf.extend_from_slice(&(self.other_data.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.other_data);
        if buf.len() > u16::MAX as usize {
            return Err(Error::Pack);
        }
        Ok(buf)
    }

    /// Parses TSIG RDATA read off the wire. The RDATA must be exactly
    /// as long as its fields say it is; trailing octets are rejected.
    pub fn parse(name: Name, rdata: &[u8]) -> Result<Self, Error> {
        let (algorithm, algorithm_len) =
            Name::try_from_uncompressed(rdata).or(Err(Error::Unpack))?;
        let rest = &rdata[algorithm_len..];
        if rest.len() < 10 {
            return Err(Error::Unpack);
        }
        let time_signed = get_u48(&rest[0..6]);
        let fudge = u16::from_be_bytes([rest[6], rest[7]]);
        let mac_size = u16::from_be_bytes([rest[8], rest[9]]) as usize;
        let rest = &rest[10..];
        if rest.len() < mac_size + 6 {
            return Err(Error::Unpack);
        }
        let mac = hex::encode(&rest[..mac_size]);
        let rest = &rest[mac_size..];
        let orig_id = u16::from_be_bytes([rest[0], rest[1]]);
        let error = u16::from_be_bytes([rest[2], rest[3]]);
        let other_len = u16::from_be_bytes([rest[4], rest[5]]) as usize;
        let rest = &rest[6..];
        if rest.len() != other_len {
            return Err(Error::Unpack);
        }
        Ok(Self {
            name,
            algorithm,
            time_signed,
            fudge,
            mac,
            orig_id,
            error,
            other_data: rest.to_vec(),
        })
    }

    /// Converts this record into a generic [`Record`] ready for
    /// serialization. TSIG records have class ANY and TTL 0.
    pub fn to_record(&self) -> Result<Record, Error> {
        Ok(Record {
            owner: self.name.clone(),
            rr_type: Type::TSIG,
            class: Class::ANY,
            ttl: 0,
            rdata: self.serialize_rdata()?,
        })
    }
}

/// TSIG records are displayed in a "pseudosection" of their own, since
/// they are message meta-data rather than DNS data.
impl fmt::Display for TsigRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            ";; TSIG PSEUDOSECTION:\n{}\t0\tANY\tTSIG\t{} {} {} {} {} {} {} {}",
            self.name,
            self.algorithm,
            tsig_time_to_date(self.time_signed),
            self.fudge,
            self.mac_size(),
            self.mac.to_uppercase(),
            self.orig_id,
            self.error,
            self.other_data.len(),
        )
    }
}

////////////////////////////////////////////////////////////////////////
// HELPERS                                                            //
////////////////////////////////////////////////////////////////////////

/// Appends the low 48 bits of `value` to `buf` in network byte order.
pub(crate) fn put_u48(buf: &mut Vec<u8>, value: u64) {
    buf.extend_from_slice(&value.to_be_bytes()[2..8]);
}

/// Reads a 48-bit network-byte-order integer. `octets` must be exactly
/// six octets long.
fn get_u48(octets: &[u8]) -> u64 {
    octets.iter().fold(0, |acc, &octet| acc << 8 | octet as u64)
}

const DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year][month][day][hour][minute][second]");

/// Formats a TIME SIGNED value in the YYYYMMDDHHmmss form used when
/// printing TSIG records. Values outside the range the calendar can
/// express are printed as raw seconds.
fn tsig_time_to_date(time_signed: u64) -> String {
    i64::try_from(time_signed)
        .ok()
        .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        .and_then(|date| date.format(DATE_FORMAT).ok())
        .unwrap_or_else(|| time_signed.to_string())
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const TSIG_RDATA: &[u8] = b"\
        \x0b\x68\x6d\x61\x63\x2d\x73\x68\x61\x32\x35\x36\x00\x00\x00\x63\
        \x29\x12\xb4\x01\x2c\x00\x20\xfe\x60\x1b\xa4\xb2\x4a\x33\x48\xd3\
        \x47\xe4\x4e\x8e\x02\xdf\x7b\x83\xf1\xee\x38\xea\x05\x3e\xde\xe8\
        \xb0\x8e\x26\x52\x46\xda\xf4\xab\x97\x00\x00\x00\x0f\x73\x6f\x6d\
        \x65\x20\x6f\x74\x68\x65\x72\x20\x64\x61\x74\x61";

    const MAC_HEX: &str = "fe601ba4b24a3348d347e44e8e02df7b83f1ee38ea053edee8b08e265246daf4";

    fn example_record() -> TsigRecord {
        TsigRecord {
            name: "key.example.test.".parse().unwrap(),
            algorithm: "hmac-sha256.".parse().unwrap(),
            time_signed: 0x632912b4,
            fudge: 300,
            mac: MAC_HEX.to_owned(),
            orig_id: 0xab97,
            error: 0,
            other_data: b"some other data".to_vec(),
        }
    }

    #[test]
    fn serialization_works() {
        assert_eq!(example_record().serialize_rdata().unwrap(), TSIG_RDATA);
    }

    #[test]
    fn parse_works() {
        let name: Name = "key.example.test.".parse().unwrap();
        let record = TsigRecord::parse(name, TSIG_RDATA).unwrap();
        assert_eq!(record, example_record());
        assert_eq!(record.mac_size(), 32);
    }

    #[test]
    fn parse_rejects_truncated_rdata() {
        for len in 0..TSIG_RDATA.len() {
            let name: Name = "key.example.test.".parse().unwrap();
            assert_eq!(
                TsigRecord::parse(name, &TSIG_RDATA[..len]),
                Err(Error::Unpack)
            );
        }
    }

    #[test]
    fn parse_rejects_trailing_octets() {
        let mut rdata = TSIG_RDATA.to_vec();
        rdata.push(0);
        let name: Name = "key.example.test.".parse().unwrap();
        assert_eq!(TsigRecord::parse(name, &rdata), Err(Error::Unpack));
    }

    #[test]
    fn serialize_rejects_bad_mac_hex() {
        let mut record = example_record();
        record.mac = "not hex".to_owned();
        assert_eq!(record.serialize_rdata(), Err(Error::Pack));
    }

    #[test]
    fn serialize_rejects_oversized_time() {
        let mut record = example_record();
        record.time_signed = 1 << 48;
        assert_eq!(record.serialize_rdata(), Err(Error::Pack));
    }

    #[test]
    fn with_defaults_fills_only_unset_fields() {
        let stub = TsigRecord::stub(
            "key.example.test.".parse().unwrap(),
            "hmac-sha256.".parse().unwrap(),
        );
        let filled = stub.with_defaults(0x632912b4);
        assert_eq!(filled.time_signed, 0x632912b4);
        assert_eq!(filled.fudge, DEFAULT_FUDGE);
        // Preset values survive.
        let pinned = example_record().with_defaults(1);
        assert_eq!(pinned.time_signed, 0x632912b4);
        assert_eq!(pinned.fudge, 300);
        // The original is untouched.
        assert_eq!(stub.time_signed, 0);
    }

    #[test]
    fn u48_roundtrips() {
        let mut buf = Vec::new();
        put_u48(&mut buf, 0x0000_8000_0000_0001);
        assert_eq!(buf, b"\x80\x00\x00\x00\x00\x01");
        assert_eq!(get_u48(&buf), 0x0000_8000_0000_0001);
    }

    #[test]
    fn date_formatting_works() {
        assert_eq!(tsig_time_to_date(0), "19700101000000");
        assert_eq!(tsig_time_to_date(0x632912b4), "20220920010908");
    }

    #[test]
    fn display_works() {
        let text = example_record().to_string();
        assert!(text.starts_with(";; TSIG PSEUDOSECTION:\n"));
        assert!(text.contains("hmac-sha256."));
        assert!(text.contains("20220920010908"));
        assert!(text.contains(&MAC_HEX.to_uppercase()));
    }
}
