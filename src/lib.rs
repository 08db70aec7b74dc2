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

//! TSIG transaction signatures for DNS messages, per RFC 2845.
//!
//! TSIG authenticates a DNS transaction with an HMAC computed over the
//! message and a set of "TSIG variables", keyed by a secret shared
//! between the two endpoints. The MAC travels in a TSIG pseudo-RR
//! appended as the last record of the additional section.
//!
//! To sign a message, append a TSIG stub record naming the key and the
//! algorithm (see [`set_tsig`]) and hand the message to [`sign`]
//! together with the base64-encoded secret:
//!
//! ```
//! use tsig::class::Class;
//! use tsig::message::Message;
//! use tsig::rr::Type;
//!
//! let secret = "so6ZGir4GPAqINNh9U5c3A==";
//!
//! let mut msg = Message::new(0x1d2c);
//! msg.set_question("miek.nl.".parse().unwrap(), Type::AXFR, Class::IN);
//! tsig::set_tsig(
//!     &mut msg,
//!     "axfr.".parse().unwrap(),
//!     tsig::HMAC_SHA256.parse().unwrap(),
//!     300,
//!     0,
//! )
//! .unwrap();
//!
//! let (wire, _mac) = tsig::sign(&msg, secret, "", false).unwrap();
//! assert_eq!(tsig::verify(&wire, secret, "", false), Ok(()));
//! ```
//!
//! When verifying the first message of a transaction, `request_mac` is
//! empty. For a response it is the MAC of the request, and for the
//! second and later envelopes of a zone transfer it is the MAC of the
//! previous envelope, with `timers_only` set. MACs are passed as the
//! lowercase hexadecimal strings this crate produces.

pub mod class;
pub mod message;
pub mod name;
pub mod rr;

mod algorithm;
mod canonical;
mod record;
mod strip;

pub use algorithm::{Algorithm, HMAC_MD5, HMAC_SHA1, HMAC_SHA256};
pub use record::{TsigRecord, DEFAULT_FUDGE};
pub use strip::strip_tsig;

use std::fmt;
use std::time::SystemTime;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::debug;

use crate::message::Message;
use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// SIGNING                                                            //
////////////////////////////////////////////////////////////////////////

/// Appends a TSIG stub record to `msg`, marking it for signature by the
/// key named `key_name` with the given algorithm. A zero `fudge` or
/// `time_signed` means the default (300 seconds and the time of
/// signing, respectively).
pub fn set_tsig(
    msg: &mut Message,
    key_name: Name,
    algorithm: Name,
    fudge: u16,
    time_signed: u64,
) -> Result<(), Error> {
    let mut stub = TsigRecord::stub(key_name, algorithm);
    stub.fudge = fudge;
    stub.time_signed = time_signed;
    msg.additional.push(stub.to_record()?);
    Ok(())
}

/// Signs `msg` with the current system time. See [`sign_at`].
pub fn sign(
    msg: &Message,
    secret: &str,
    request_mac: &str,
    timers_only: bool,
) -> Result<(Vec<u8>, String), Error> {
    sign_at(msg, secret, request_mac, timers_only, unix_now())
}

/// Signs `msg`, whose additional section must end with a TSIG stub
/// record (see [`set_tsig`]), using the base64-encoded `secret` of the
/// key the stub names. Returns the wire form of the signed message and
/// the MAC in hexadecimal, for use as the `request_mac` of a later
/// call.
///
/// `request_mac` is the MAC this one chains off, or empty for the first
/// message of a transaction. With `timers_only` set, only the timer
/// variables enter the MAC, as for the second and later envelopes of a
/// zone transfer.
///
/// # Panics
///
/// Panics if the last record of `msg`'s additional section is not a
/// TSIG record. That is a programming error in the caller, not a
/// run-time condition.
pub fn sign_at(
    msg: &Message,
    secret: &str,
    request_mac: &str,
    timers_only: bool,
    now: u64,
) -> Result<(Vec<u8>, String), Error> {
    if !msg.is_tsig() {
        panic!("message to sign must end with a TSIG stub record");
    }
    let key = BASE64.decode(secret).map_err(Error::Secret)?;

    let mut unsigned = msg.clone();
    let stub = unsigned.additional.pop().unwrap(); // checked above
    let stub = TsigRecord::parse(stub.owner, &stub.rdata)?;
    let rr = stub.with_defaults(now);
    let algorithm =
        Algorithm::from_name(&rr.algorithm).ok_or_else(|| Error::KeyAlgorithm(rr.algorithm.clone()))?;

    let wire = unsigned.pack().or(Err(Error::Pack))?;
    let mut mac = algorithm.make_authenticator(&key);
    mac.update(&canonical::build(&wire, &rr, request_mac, timers_only)?);
    let mac = hex::encode(mac.finalize());

    let signed_rr = TsigRecord {
        mac: mac.clone(),
        orig_id: msg.id,
        ..rr
    };
    let mut signed = wire;
    signed_rr.to_record()?.pack_into(&mut signed).or(Err(Error::Pack))?;
    message::set_arcount(&mut signed, unsigned.additional.len() as u16 + 1);

    debug!(
        "signed message {:#06x} with key {} ({})",
        msg.id,
        signed_rr.name,
        algorithm.name(),
    );
    Ok((signed, mac))
}

////////////////////////////////////////////////////////////////////////
// VERIFICATION                                                       //
////////////////////////////////////////////////////////////////////////

/// Verifies `msg` against the current system time. See [`verify_at`].
pub fn verify(msg: &[u8], secret: &str, request_mac: &str, timers_only: bool) -> Result<(), Error> {
    verify_at(msg, secret, request_mac, timers_only, unix_now())
}

/// Verifies the TSIG record of the wire-format message `msg` using the
/// base64-encoded `secret` of the key it names. `request_mac` and
/// `timers_only` mirror their meaning in [`sign_at`].
///
/// The time check comes first: `now` must be within the record's fudge
/// of its signing time, counting in both directions so that neither
/// endpoint's clock has to be the one that is ahead. Only then is the
/// MAC recomputed and compared.
pub fn verify_at(
    msg: &[u8],
    secret: &str,
    request_mac: &str,
    timers_only: bool,
    now: u64,
) -> Result<(), Error> {
    let key = BASE64.decode(secret).map_err(Error::Secret)?;
    let (signed, stripped) = strip_tsig(msg)?;
    let rr = stripped.with_defaults(now);

    if now.abs_diff(rr.time_signed) > rr.fudge as u64 {
        return Err(Error::Time);
    }

    let algorithm =
        Algorithm::from_name(&rr.algorithm).ok_or_else(|| Error::KeyAlgorithm(rr.algorithm.clone()))?;
    let mut mac = algorithm.make_authenticator(&key);
    mac.update(&canonical::build(&signed, &rr, request_mac, timers_only)?);
    let computed = hex::encode(mac.finalize());

    if !computed.eq_ignore_ascii_case(&rr.mac) {
        return Err(Error::Signature);
    }
    debug!(
        "verified message {:#06x} signed by key {} ({})",
        u16::from_be_bytes([msg[0], msg[1]]),
        rr.name,
        algorithm.name(),
    );
    Ok(())
}

/// Returns the current system time in seconds since the Unix epoch.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// An error produced while signing or verifying a message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The key secret is not valid base64.
    Secret(base64::DecodeError),
    /// The TSIG record names an algorithm this crate does not know.
    KeyAlgorithm(Name),
    /// The message or TSIG record could not be serialized.
    Pack,
    /// The message or TSIG record could not be parsed.
    Unpack,
    /// The message carries no TSIG record.
    NoSignature,
    /// The message RCODE is NOTAUTH; the remote end rejected our
    /// signature.
    NotAuthoritative,
    /// The signing time is outside the fudge window.
    Time,
    /// The MAC does not match.
    Signature,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Secret(err) => write!(f, "invalid key secret: {}", err),
            Self::KeyAlgorithm(name) => write!(f, "unknown TSIG algorithm {}", name),
            Self::Pack => f.write_str("message could not be serialized"),
            Self::Unpack => f.write_str("message could not be parsed"),
            Self::NoSignature => f.write_str("no TSIG record found"),
            Self::NotAuthoritative => f.write_str("message RCODE is NOTAUTH"),
            Self::Time => f.write_str("TSIG signing time outside the fudge window"),
            Self::Signature => f.write_str("TSIG MAC does not match"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Secret(err) => Some(err),
            _ => None,
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::Class;
    use crate::rr::Type;

    const SECRET: &str = "so6ZGir4GPAqINNh9U5c3A==";
    const WRONG_SECRET: &str = "c2VjcmV0MQ==";
    const NOW: u64 = 0x632912b4;

    fn axfr_query(algorithm: &str) -> Message {
        let mut msg = Message::new(0x1d2c);
        msg.set_question("miek.nl.".parse().unwrap(), Type::AXFR, Class::IN);
        set_tsig(
            &mut msg,
            "axfr.".parse().unwrap(),
            algorithm.parse().unwrap(),
            300,
            0,
        )
        .unwrap();
        msg
    }

    #[test]
    fn sign_then_verify_roundtrips() {
        for algorithm in [HMAC_MD5, HMAC_SHA1, HMAC_SHA256] {
            let msg = axfr_query(algorithm);
            let (wire, mac) = sign_at(&msg, SECRET, "", false, NOW).unwrap();
            assert!(!mac.is_empty());
            assert_eq!(verify_at(&wire, SECRET, "", false, NOW), Ok(()));
        }
    }

    #[test]
    fn signing_preserves_message_and_patches_arcount() {
        let msg = axfr_query(HMAC_SHA256);
        let unsigned = {
            let mut msg = msg.clone();
            msg.additional.pop();
            msg.pack().unwrap()
        };
        let (wire, mac) = sign_at(&msg, SECRET, "", false, NOW).unwrap();

        // HMAC-SHA256 produces a 32-octet MAC.
        assert_eq!(mac.len(), 64);
        // The signed region is byte-for-byte the unsigned message,
        // except for the ARCOUNT.
        assert_eq!(&wire[..10], &unsigned[..10]);
        assert_eq!(&wire[10..12], &[0, 1]);
        assert_eq!(&wire[12..unsigned.len()], &unsigned[12..]);

        // The appended record echoes the message ID and signing time.
        let (_, rr) = strip_tsig(&wire).unwrap();
        assert_eq!(rr.orig_id, 0x1d2c);
        assert_eq!(rr.time_signed, NOW);
        assert_eq!(rr.fudge, 300);
        assert_eq!(rr.mac, mac);
    }

    #[test]
    fn hmac_md5_mx_query_signs_and_verifies() {
        // An HMAC-MD5 MAC is 16 octets, so 32 hexadecimal characters.
        let mut msg = Message::new(0x1d2c);
        msg.set_question("miek.nl.".parse().unwrap(), Type::MX, Class::IN);
        set_tsig(
            &mut msg,
            "axfr.".parse().unwrap(),
            HMAC_MD5.parse().unwrap(),
            300,
            0,
        )
        .unwrap();
        let (wire, mac) = sign_at(&msg, SECRET, "", false, NOW).unwrap();
        assert_eq!(mac.len(), 32);
        assert_eq!(verify_at(&wire, SECRET, "", false, NOW), Ok(()));
    }

    #[test]
    fn verify_rejects_tampering() {
        let msg = axfr_query(HMAC_SHA256);
        let (mut wire, _) = sign_at(&msg, SECRET, "", false, NOW).unwrap();
        wire[13] ^= 0x20; // flip case of a question name octet
        assert_eq!(
            verify_at(&wire, SECRET, "", false, NOW),
            Err(Error::Signature)
        );
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let msg = axfr_query(HMAC_SHA256);
        let (wire, _) = sign_at(&msg, SECRET, "", false, NOW).unwrap();
        assert_eq!(
            verify_at(&wire, WRONG_SECRET, "", false, NOW),
            Err(Error::Signature)
        );
    }

    #[test]
    fn verify_rejects_times_outside_the_fudge_window() {
        let msg = axfr_query(HMAC_SHA256);
        let (wire, _) = sign_at(&msg, SECRET, "", false, NOW).unwrap();
        // The window extends fudge seconds in both directions.
        assert_eq!(verify_at(&wire, SECRET, "", false, NOW + 300), Ok(()));
        assert_eq!(verify_at(&wire, SECRET, "", false, NOW - 300), Ok(()));
        assert_eq!(
            verify_at(&wire, SECRET, "", false, NOW + 400),
            Err(Error::Time)
        );
        assert_eq!(
            verify_at(&wire, SECRET, "", false, NOW - 400),
            Err(Error::Time)
        );
    }

    #[test]
    fn sign_rejects_unknown_algorithm() {
        let msg = axfr_query("hmac-sha999.");
        assert_eq!(
            sign_at(&msg, SECRET, "", false, NOW),
            Err(Error::KeyAlgorithm("hmac-sha999.".parse().unwrap()))
        );
    }

    #[test]
    fn verify_rejects_unknown_algorithm() {
        let mut msg = Message::new(0x1d2c);
        msg.set_question("miek.nl.".parse().unwrap(), Type::AXFR, Class::IN);
        let rr = TsigRecord {
            name: "axfr.".parse().unwrap(),
            algorithm: "hmac-sha999.".parse().unwrap(),
            time_signed: NOW,
            fudge: 300,
            mac: "00".repeat(32),
            orig_id: 0x1d2c,
            error: 0,
            other_data: Vec::new(),
        };
        msg.additional.push(rr.to_record().unwrap());
        let wire = msg.pack().unwrap();
        assert_eq!(
            verify_at(&wire, SECRET, "", false, NOW),
            Err(Error::KeyAlgorithm("hmac-sha999.".parse().unwrap()))
        );
    }

    #[test]
    fn verify_rejects_unsigned_message() {
        let mut msg = axfr_query(HMAC_SHA256);
        msg.additional.pop();
        let wire = msg.pack().unwrap();
        assert_eq!(
            verify_at(&wire, SECRET, "", false, NOW),
            Err(Error::NoSignature)
        );
    }

    #[test]
    fn sign_rejects_bad_secret() {
        let msg = axfr_query(HMAC_SHA256);
        assert!(matches!(
            sign_at(&msg, "not base64!!", "", false, NOW),
            Err(Error::Secret(_))
        ));
    }

    #[test]
    #[should_panic(expected = "TSIG stub record")]
    fn sign_panics_without_stub() {
        let mut msg = axfr_query(HMAC_SHA256);
        msg.additional.pop();
        let _ = sign_at(&msg, SECRET, "", false, NOW);
    }

    #[test]
    fn chained_envelopes_verify() {
        // A transfer response chain: the first envelope signs the full
        // variables and chains off the request MAC; later envelopes
        // sign timers only and chain off the previous envelope.
        let request = axfr_query(HMAC_SHA256);
        let (request_wire, request_mac) = sign_at(&request, SECRET, "", false, NOW).unwrap();
        assert_eq!(verify_at(&request_wire, SECRET, "", false, NOW), Ok(()));

        let mut envelope_1 = Message::new(0x1d2c);
        envelope_1.flags = 0x8400;
        set_tsig(
            &mut envelope_1,
            "axfr.".parse().unwrap(),
            HMAC_SHA256.parse().unwrap(),
            300,
            0,
        )
        .unwrap();
        let (wire_1, mac_1) = sign_at(&envelope_1, SECRET, &request_mac, false, NOW).unwrap();
        assert_eq!(verify_at(&wire_1, SECRET, &request_mac, false, NOW), Ok(()));

        let mut envelope_2 = Message::new(0x1d2c);
        envelope_2.flags = 0x8400;
        set_tsig(
            &mut envelope_2,
            "axfr.".parse().unwrap(),
            HMAC_SHA256.parse().unwrap(),
            300,
            0,
        )
        .unwrap();
        let (wire_2, mac_2) = sign_at(&envelope_2, SECRET, &mac_1, true, NOW).unwrap();
        assert_ne!(mac_1, mac_2);
        assert_eq!(verify_at(&wire_2, SECRET, &mac_1, true, NOW), Ok(()));

        // Breaking any link of the chain breaks verification.
        assert_eq!(
            verify_at(&wire_2, SECRET, &request_mac, true, NOW),
            Err(Error::Signature)
        );
        assert_eq!(
            verify_at(&wire_1, SECRET, "", false, NOW),
            Err(Error::Signature)
        );
    }

    #[test]
    fn macs_compare_case_insensitively() {
        let msg = axfr_query(HMAC_SHA256);
        let (wire, mac) = sign_at(&msg, SECRET, "", false, NOW).unwrap();

        // Rewrite the message with the MAC in uppercase hexadecimal.
        let (signed, mut rr) = strip_tsig(&wire).unwrap();
        rr.mac = mac.to_uppercase();
        let mut rewritten = signed;
        rr.to_record().unwrap().pack_into(&mut rewritten).unwrap();
        message::set_arcount(&mut rewritten, 1);

        assert_eq!(verify_at(&rewritten, SECRET, "", false, NOW), Ok(()));
    }
}
