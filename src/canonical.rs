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

//! Construction of the byte sequence over which a TSIG MAC is computed.

use crate::class::Class;
use crate::record::{put_u48, TsigRecord};
use crate::Error;

/// Builds the canonical byte sequence of RFC 2845 § 3.4 for `signed`,
/// the wire form of the message without its TSIG record.
///
/// When `request_mac` is non-empty (given as hexadecimal text, as
/// [`TsigRecord`] carries MACs), it is prepended with a 16-bit size so
/// that the new MAC chains off the prior one. With `timers_only` set,
/// only the time and fudge are appended after the message, which is the
/// reduced form RFC 2845 § 4.4 uses for the second and later envelopes
/// of a transfer; otherwise the full set of TSIG variables follows,
/// with the owner and algorithm names lowercased and the class and TTL
/// pinned to ANY and 0 so that signer and verifier agree on one
/// canonical rendering.
pub(crate) fn build(
    signed: &[u8],
    rr: &TsigRecord,
    request_mac: &str,
    timers_only: bool,
) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::with_capacity(signed.len() + request_mac.len() / 2 + 64);

    if !request_mac.is_empty() {
        let mac = hex::decode(request_mac).or(Err(Error::Pack))?;
        if mac.len() > u16::MAX as usize {
            return Err(Error::Pack);
        }
        buf.extend_from_slice(&(mac.len() as u16).to_be_bytes());
        buf.extend_from_slice(&mac);
    }

    buf.extend_from_slice(signed);

    if timers_only {
        put_u48(&mut buf, rr.time_signed);
        buf.extend_from_slice(&rr.fudge.to_be_bytes());
    } else {
        buf.extend_from_slice(rr.name.to_lowercase().wire_repr());
        buf.extend_from_slice(&u16::from(Class::ANY).to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(rr.algorithm.to_lowercase().wire_repr());
        put_u48(&mut buf, rr.time_signed);
        buf.extend_from_slice(&rr.fudge.to_be_bytes());
        buf.extend_from_slice(&rr.error.to_be_bytes());
        buf.extend_from_slice(&(rr.other_data.len() as u16).to_be_bytes());
        buf.extend_from_slice(&rr.other_data);
    }

    Ok(buf)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn example_rr() -> TsigRecord {
        TsigRecord {
            name: "key.example.test.".parse().unwrap(),
            algorithm: "hmac-sha256.".parse().unwrap(),
            time_signed: 0x632912b4,
            fudge: 300,
            mac: String::new(),
            orig_id: 0,
            error: 0,
            other_data: Vec::new(),
        }
    }

    const MESSAGE: &[u8] = b"\x12\x34\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00";

    #[test]
    fn full_variables_are_canonical() {
        let buf = build(MESSAGE, &example_rr(), "", false).unwrap();
        let mut expected = MESSAGE.to_vec();
        expected.extend_from_slice(b"\x03key\x07example\x04test\x00");
        expected.extend_from_slice(b"\x00\xff"); // class ANY
        expected.extend_from_slice(b"\x00\x00\x00\x00"); // TTL
        expected.extend_from_slice(b"\x0bhmac-sha256\x00");
        expected.extend_from_slice(b"\x00\x00\x63\x29\x12\xb4"); // time
        expected.extend_from_slice(b"\x01\x2c"); // fudge
        expected.extend_from_slice(b"\x00\x00"); // error
        expected.extend_from_slice(b"\x00\x00"); // other len
        assert_eq!(buf, expected);
    }

    #[test]
    fn names_are_lowercased() {
        let mut upper = example_rr();
        upper.name = "KEY.EXAMPLE.TEST.".parse().unwrap();
        upper.algorithm = "HMAC-SHA256.".parse().unwrap();
        assert_eq!(
            build(MESSAGE, &upper, "", false).unwrap(),
            build(MESSAGE, &example_rr(), "", false).unwrap(),
        );
    }

    #[test]
    fn request_mac_is_size_prefixed() {
        let buf = build(MESSAGE, &example_rr(), "deadbeef", false).unwrap();
        assert!(buf.starts_with(b"\x00\x04\xde\xad\xbe\xef"));
        assert_eq!(&buf[6..6 + MESSAGE.len()], MESSAGE);
    }

    #[test]
    fn timers_only_appends_time_and_fudge() {
        let buf = build(MESSAGE, &example_rr(), "", true).unwrap();
        let mut expected = MESSAGE.to_vec();
        expected.extend_from_slice(b"\x00\x00\x63\x29\x12\xb4\x01\x2c");
        assert_eq!(buf, expected);
    }

    #[test]
    fn bad_request_mac_hex_is_rejected() {
        assert_eq!(
            build(MESSAGE, &example_rr(), "not hex", false),
            Err(Error::Pack)
        );
    }
}
