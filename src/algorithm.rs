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

//! TSIG algorithm identifiers and their HMAC implementations.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use lazy_static::lazy_static;
use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;

use crate::name::Name;

////////////////////////////////////////////////////////////////////////
// ALGORITHM NAMES                                                    //
////////////////////////////////////////////////////////////////////////

/// The domain name identifying HMAC-MD5, per RFC 2845 § 7.
pub const HMAC_MD5: &str = "hmac-md5.sig-alg.reg.int.";

/// The domain name identifying HMAC-SHA1, per RFC 4635.
pub const HMAC_SHA1: &str = "hmac-sha1.";

/// The domain name identifying HMAC-SHA256, per RFC 4635.
pub const HMAC_SHA256: &str = "hmac-sha256.";

lazy_static! {
    static ref ALGORITHMS_BY_NAME: HashMap<Name, Algorithm> = {
        let mut map = HashMap::new();
        map.insert(HMAC_MD5.parse().unwrap(), Algorithm::HmacMd5);
        map.insert(HMAC_SHA1.parse().unwrap(), Algorithm::HmacSha1);
        map.insert(HMAC_SHA256.parse().unwrap(), Algorithm::HmacSha256);
        map
    };
}

////////////////////////////////////////////////////////////////////////
// ALGORITHMS                                                         //
////////////////////////////////////////////////////////////////////////

/// A TSIG algorithm supported by this crate.
///
/// TSIG identifies algorithms by domain name, and an unrecognized name
/// is a hard error at both signing and verification time; there is no
/// fallback algorithm. [`Algorithm::from_name`] performs the lookup.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Algorithm {
    HmacMd5,
    HmacSha1,
    HmacSha256,
}

impl Algorithm {
    /// Looks up the algorithm identified by `name`. The lookup is
    /// case-insensitive, since [`Name`] comparison is.
    pub fn from_name(name: &Name) -> Option<Self> {
        ALGORITHMS_BY_NAME.get(name).copied()
    }

    /// Returns the textual domain name identifying this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::HmacMd5 => HMAC_MD5,
            Self::HmacSha1 => HMAC_SHA1,
            Self::HmacSha256 => HMAC_SHA256,
        }
    }

    /// Creates an [`Authenticator`] keyed with `key`.
    pub(crate) fn make_authenticator(&self, key: &[u8]) -> Box<dyn Authenticator> {
        // new_from_slice is infallible for HMAC; keys of any length are
        // accepted per RFC 2104.
        match self {
            Self::HmacMd5 => Box::new(Hmac::<Md5>::new_from_slice(key).unwrap()),
            Self::HmacSha1 => Box::new(Hmac::<Sha1>::new_from_slice(key).unwrap()),
            Self::HmacSha256 => Box::new(Hmac::<Sha256>::new_from_slice(key).unwrap()),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// THE AUTHENTICATOR TRAIT                                            //
////////////////////////////////////////////////////////////////////////

/// An object-safe facade over [`hmac::Mac`], so that the signing and
/// verification paths can work with any algorithm through one type.
pub(crate) trait Authenticator {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

impl<M: Mac> Authenticator for M {
    fn update(&mut self, data: &[u8]) {
        Mac::update(self, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        Mac::finalize(*self).into_bytes().to_vec()
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_exact_and_case_insensitive() {
        let sha256: Name = "HMAC-SHA256.".parse().unwrap();
        assert_eq!(Algorithm::from_name(&sha256), Some(Algorithm::HmacSha256));
        let md5: Name = HMAC_MD5.parse().unwrap();
        assert_eq!(Algorithm::from_name(&md5), Some(Algorithm::HmacMd5));
        let unknown: Name = "hmac-sha512.".parse().unwrap();
        assert_eq!(Algorithm::from_name(&unknown), None);
        // A prefix of a registered name must not match.
        let prefix: Name = "hmac-md5.".parse().unwrap();
        assert_eq!(Algorithm::from_name(&prefix), None);
    }

    #[test]
    fn authenticator_computes_hmac_sha256() {
        // RFC 4231 test case 2.
        let mut mac = Algorithm::HmacSha256.make_authenticator(b"Jefe");
        mac.update(b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac.finalize()),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn mac_sizes_match_digests() {
        for (algorithm, size) in [
            (Algorithm::HmacMd5, 16),
            (Algorithm::HmacSha1, 20),
            (Algorithm::HmacSha256, 32),
        ] {
            let mac = algorithm.make_authenticator(b"key");
            assert_eq!(mac.finalize().len(), size);
        }
    }
}
