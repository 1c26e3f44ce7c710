//! Identity token decoding
//!
//! The provider-issued JWT is held raw for the session duration; only the
//! claims this subsystem needs (`iss`, `sub`, `aud`, `exp`, `nonce`) are
//! decoded. Signature verification is the proving service's and chain's
//! concern, not ours.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Claims decoded from the token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer.
    pub iss: String,
    /// Subject - the stable per-user identifier the salt is derived from.
    pub sub: String,
    /// Audience. Providers emit either a string or a single-element array.
    #[serde(deserialize_with = "deserialize_audience")]
    pub aud: String,
    /// Expiry, seconds since epoch.
    #[serde(default)]
    pub exp: u64,
    /// The nonce the authorization request embedded, signed back by the
    /// provider. Absent for tokens issued outside this protocol.
    #[serde(default)]
    pub nonce: Option<String>,
}

fn deserialize_audience<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Audience {
        Single(String),
        Many(Vec<String>),
    }

    match Audience::deserialize(deserializer)? {
        Audience::Single(aud) => Ok(aud),
        Audience::Many(mut auds) if auds.len() == 1 => Ok(auds.remove(0)),
        Audience::Many(_) => Err(serde::de::Error::custom(
            "audience must be a string or a single-element array",
        )),
    }
}

/// A provider-issued identity token: the raw compact JWT plus its decoded
/// claims.
#[derive(Debug, Clone)]
pub struct IdentityToken {
    raw: String,
    claims: Claims,
}

impl IdentityToken {
    /// Decode a compact JWT. Fails with `Error::MalformedToken` on any
    /// structural problem; the signature is not checked here.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let mut parts = raw.split('.');
        let (_header, payload) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(h), Some(p), Some(_sig), None) if !h.is_empty() && !p.is_empty() => (h, p),
            _ => {
                return Err(Error::MalformedToken(
                    "token is not a three-part compact JWT".into(),
                ))
            }
        };

        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| Error::MalformedToken(format!("payload is not base64url: {e}")))?;

        let claims: Claims = serde_json::from_slice(&decoded)
            .map_err(|e| Error::MalformedToken(format!("payload is not valid claims JSON: {e}")))?;

        Ok(Self {
            raw: raw.to_string(),
            claims,
        })
    }

    /// The raw compact JWT, exactly as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The decoded claims.
    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::make_jwt;
    use super::*;

    const FIXTURE_JWT: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9.eyJpc3MiOiJodHRwczovL2FjY291bnRzLmV4YW1wbGUuY29tIiwic3ViIjoiMTIzNDU2Nzg5MCIsImF1ZCI6InprbG9naW4tZGVtbyIsImV4cCI6MTkxNjIzOTAyMiwibm9uY2UiOiI3YnFpUTlsNFJiOHM4T3dEc2FhcHFiVXkwbGMifQ.c2ln";

    #[test]
    fn test_parse_fixture_token() {
        let token = IdentityToken::parse(FIXTURE_JWT).unwrap();
        let claims = token.claims();
        assert_eq!(claims.iss, "https://accounts.example.com");
        assert_eq!(claims.sub, "1234567890");
        assert_eq!(claims.aud, "zklogin-demo");
        assert_eq!(claims.exp, 1916239022);
        assert_eq!(claims.nonce.as_deref(), Some("7bqiQ9l4Rb8s8OwDsaapqbUy0lc"));
        assert_eq!(token.raw(), FIXTURE_JWT);
    }

    #[test]
    fn test_audience_array_form() {
        let jwt = make_jwt(r#"{"iss":"i","sub":"s","aud":["only-one"],"exp":1}"#);
        let token = IdentityToken::parse(&jwt).unwrap();
        assert_eq!(token.claims().aud, "only-one");
    }

    #[test]
    fn test_multi_audience_rejected() {
        let jwt = make_jwt(r#"{"iss":"i","sub":"s","aud":["a","b"],"exp":1}"#);
        assert!(matches!(
            IdentityToken::parse(&jwt),
            Err(Error::MalformedToken(_))
        ));
    }

    #[test]
    fn test_malformed_structures_rejected() {
        assert!(IdentityToken::parse("").is_err());
        assert!(IdentityToken::parse("one.two").is_err());
        assert!(IdentityToken::parse("a.b.c.d").is_err());
        assert!(IdentityToken::parse("header.!!!notbase64!!!.sig").is_err());

        let jwt = make_jwt(r#"{"not":"claims"}"#);
        assert!(matches!(
            IdentityToken::parse(&jwt),
            Err(Error::MalformedToken(_))
        ));
    }

    #[test]
    fn test_nonce_claim_optional() {
        let jwt = make_jwt(r#"{"iss":"i","sub":"s","aud":"a","exp":1}"#);
        let token = IdentityToken::parse(&jwt).unwrap();
        assert!(token.claims().nonce.is_none());
    }
}
