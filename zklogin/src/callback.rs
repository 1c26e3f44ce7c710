//! OAuth redirect callback parsing
//!
//! Providers return the identity token either in the URL fragment (implicit
//! flow) or in the query string. Parsing is a pure function of the URL, so
//! calling it twice on the same redirect yields the same token; guarding
//! against duplicate *processing* of a callback is the caller's contract.

use url::Url;

use crate::error::Error;
use crate::token::IdentityToken;

/// Parameter name carrying the token in both fragment and query forms.
const TOKEN_PARAM: &str = "id_token";

/// Extract the identity token from a redirect URL.
///
/// The fragment is checked before the query because implicit-flow providers
/// put credentials there precisely so they never reach a server log.
/// Fails with `Error::MissingToken` when neither location yields one.
pub fn parse_redirect(redirect_url: &str) -> Result<IdentityToken, Error> {
    let url = Url::parse(redirect_url)
        .map_err(|e| Error::MalformedToken(format!("redirect URL is not a URL: {e}")))?;

    if let Some(fragment) = url.fragment() {
        if let Some(raw) = find_param(fragment, TOKEN_PARAM) {
            return IdentityToken::parse(&raw);
        }
    }

    if let Some(raw) = url
        .query_pairs()
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
    {
        return IdentityToken::parse(&raw);
    }

    Err(Error::MissingToken)
}

/// Look up a key in a query-encoded string (the fragment has the same shape).
fn find_param(encoded: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::test_support::make_jwt;

    fn fixture_jwt() -> String {
        make_jwt(r#"{"iss":"i","sub":"s","aud":"a","exp":1}"#)
    }

    #[test]
    fn test_token_in_fragment() {
        let jwt = fixture_jwt();
        let url = format!("http://localhost:5173/callback#id_token={jwt}&state=xyz");
        let token = parse_redirect(&url).unwrap();
        assert_eq!(token.raw(), jwt);
    }

    #[test]
    fn test_token_in_query() {
        let jwt = fixture_jwt();
        let url = format!("http://localhost:5173/callback?state=xyz&id_token={jwt}");
        let token = parse_redirect(&url).unwrap();
        assert_eq!(token.raw(), jwt);
    }

    #[test]
    fn test_fragment_wins_over_query() {
        let fragment_jwt = make_jwt(r#"{"iss":"frag","sub":"s","aud":"a","exp":1}"#);
        let query_jwt = make_jwt(r#"{"iss":"query","sub":"s","aud":"a","exp":1}"#);
        let url = format!(
            "http://localhost:5173/callback?id_token={query_jwt}#id_token={fragment_jwt}"
        );
        let token = parse_redirect(&url).unwrap();
        assert_eq!(token.claims().iss, "frag");
    }

    #[test]
    fn test_missing_token() {
        let result = parse_redirect("http://localhost:5173/callback?state=xyz#other=1");
        assert!(matches!(result, Err(Error::MissingToken)));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let jwt = fixture_jwt();
        let url = format!("http://localhost:5173/callback#id_token={jwt}");
        let first = parse_redirect(&url).unwrap();
        let second = parse_redirect(&url).unwrap();
        assert_eq!(first.raw(), second.raw());
    }

    #[test]
    fn test_unparseable_url_rejected() {
        assert!(parse_redirect("not a url at all").is_err());
    }
}
