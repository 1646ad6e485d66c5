//! RS256 test keys and token signing.
//!
//! The private keys under `keys/` are throwaway 2048-bit keys generated for
//! tests only. Their public halves are published by the mocked JWKS endpoint.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

/// Audience the test server expects.
pub const TEST_AUDIENCE: &str = "todo-api-test";

const KEY_1_PEM: &str = include_str!("../keys/test-signing-key-1.pem");
const KEY_1_MODULUS: &str = "0ugiTVNWkOmTM_80ff3y2hkMvMMsHQydU7_Hdc-bdCgDKVBRSxMxBdyzOUfecvfBWre6wn4vKx0X3PqwrDNBXOdSIdE2wxGiXtrg4EinM9Ltbc6Yh44YHqm9bFSWEwbnVQF6HGelR-3jSILdNINjspxnY_TbYvoHNvQaikat1_A8UEeh-PVj7tQKYG_hjb3yThivzTIDaZ7Yt1kBIMiW0AH3zMjQzklD4RnGMycQrqqWDor0DfU5BmofLV-OLOwUXwBgx-UpwxHWaQ8OD8z4ps72LEWLwKbDo9qq4aYE_Sw7quuy1VcLnb8MG_fQp0XawIRaL0PHRAxfHaNff_6BUw";

const KEY_2_PEM: &str = include_str!("../keys/test-signing-key-2.pem");
const KEY_2_MODULUS: &str = "ry8ITQECP634zzH7cFXVis3ytY-ccoZaXQbAXBUP0p3PRzRe_QkcTfrmcvlWdXG47IrVdT8pmGnZ7N0bRMPKMVYJRp5hkrXYVcqOZXGoUoRR68oWk3ID1Tj_iBr-K4KZEct2Tl8deMmNsdhSwOuDcI6bJMNWNiZSL7B_r08Ey0dBWBu5ufXK7A301wStN0JtDfAc4A9bWRh0SaouMiOHTlufjkGkgcb515tGHkFIhJWpcXkIVI6377gVKlcirEQBvigrOZUHOQQrlVb4-g-2KQM6ezlenMfa6CiKktWxIomY61pwNB2AjnH_oiufvdQqp2RYFS7hG__5e2QIwAFc6Q";

const EXPONENT: &str = "AQAB";

/// Claims placed in test tokens.
///
/// `aud` is a raw JSON value so tests can send a string, an array or
/// something invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestClaims {
    pub sub: String,
    pub iss: String,
    pub aud: serde_json::Value,
    pub exp: i64,
    pub iat: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
}

impl TestClaims {
    /// Claims valid for one hour.
    pub fn valid(sub: &str, issuer: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: sub.to_string(),
            iss: issuer.to_string(),
            aud: serde_json::json!(TEST_AUDIENCE),
            exp: now + 3600,
            iat: now,
            nbf: None,
        }
    }

    /// Claims that expired an hour ago.
    pub fn expired(sub: &str, issuer: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            exp: now - 3600,
            iat: now - 7200,
            ..Self::valid(sub, issuer)
        }
    }
}

/// An RS256 signing key with a known key ID.
#[derive(Debug, Clone)]
pub struct TestKeypair {
    pub kid: String,
    private_pem: &'static str,
    modulus: &'static str,
}

impl TestKeypair {
    /// The key published by the test server's JWKS endpoint.
    pub fn primary() -> Self {
        Self {
            kid: "test-key-1".to_string(),
            private_pem: KEY_1_PEM,
            modulus: KEY_1_MODULUS,
        }
    }

    /// A second key, not published unless a test rotates it in.
    pub fn secondary() -> Self {
        Self {
            kid: "test-key-2".to_string(),
            private_pem: KEY_2_PEM,
            modulus: KEY_2_MODULUS,
        }
    }

    /// Same private key as `self`, advertised under another key ID.
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = kid.to_string();
        self
    }

    /// Public JWK for this key.
    pub fn jwk_json(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "RSA",
            "kid": self.kid,
            "n": self.modulus,
            "e": EXPONENT,
            "alg": "RS256",
            "use": "sig"
        })
    }

    /// Sign `claims` with RS256.
    pub fn sign<T: Serialize>(&self, claims: &T) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = Some(self.kid.clone());
        self.sign_with_header(&header, claims)
    }

    /// Sign with a caller-supplied header (for algorithm/kid tests).
    pub fn sign_with_header<T: Serialize>(&self, header: &Header, claims: &T) -> String {
        let encoding_key = EncodingKey::from_rsa_pem(self.private_pem.as_bytes())
            .expect("test key PEM should parse");
        encode(header, claims, &encoding_key).expect("test token should sign")
    }
}

/// JWKS document containing the given keys.
pub fn jwks_document(keys: &[&TestKeypair]) -> serde_json::Value {
    let keys: Vec<serde_json::Value> = keys.iter().map(|key| key.jwk_json()).collect();
    serde_json::json!({ "keys": keys })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    #[test]
    fn test_signed_token_verifies_with_published_jwk() {
        let keypair = TestKeypair::primary();
        let claims = TestClaims::valid("auth0|alice", "https://issuer.test/");

        let token = keypair.sign(&claims);

        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("test-key-1"));

        let key = DecodingKey::from_rsa_components(KEY_1_MODULUS, EXPONENT).unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[TEST_AUDIENCE]);
        let decoded = decode::<TestClaims>(&token, &key, &validation).unwrap();
        assert_eq!(decoded.claims.sub, "auth0|alice");
    }

    #[test]
    fn test_keys_do_not_verify_each_other() {
        let claims = TestClaims::valid("auth0|alice", "https://issuer.test/");
        let token = TestKeypair::secondary().sign(&claims);

        let key = DecodingKey::from_rsa_components(KEY_1_MODULUS, EXPONENT).unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[TEST_AUDIENCE]);
        assert!(decode::<TestClaims>(&token, &key, &validation).is_err());
    }
}
