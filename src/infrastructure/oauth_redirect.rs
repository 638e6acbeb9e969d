use crate::infrastructure::error::TrackerError;
use url::Url;

pub const AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectToken {
    pub access_token: String,
    pub expires_in: i64,
}

/// Implicit-grant authorization URL; the provider returns the token in the
/// redirect URL fragment.
pub fn build_authorization_url(client_id: &str, redirect_uri: &str) -> Result<String, TrackerError> {
    if client_id.trim().is_empty() {
        return Err(TrackerError::InvalidConfig(
            "client id is required to authorize".to_string(),
        ));
    }
    Url::parse(redirect_uri)
        .map_err(|error| TrackerError::InvalidConfig(format!("invalid redirect uri: {error}")))?;

    let mut url = Url::parse(AUTHORIZATION_ENDPOINT)
        .map_err(|error| TrackerError::InvalidConfig(format!("invalid authorization endpoint: {error}")))?;
    url.query_pairs_mut()
        .append_pair("client_id", client_id.trim())
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "token")
        .append_pair("scope", SPREADSHEETS_SCOPE)
        .append_pair("include_granted_scopes", "true");
    Ok(url.to_string())
}

/// Reads `access_token` and `expires_in` from a redirect URL, a `#fragment`,
/// or a bare fragment. Returns `Ok(None)` when no token is present.
pub fn parse_redirect_fragment(input: &str) -> Result<Option<RedirectToken>, TrackerError> {
    let input = input.trim();
    let fragment = match input.split_once('#') {
        Some((_, fragment)) => fragment,
        None if input.contains("://") => return Ok(None),
        None => input,
    };
    if fragment.is_empty() {
        return Ok(None);
    }

    let mut access_token = None;
    let mut expires_in = None;
    for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
        match key.as_ref() {
            "access_token" => access_token = Some(value.into_owned()),
            "expires_in" => expires_in = Some(value.into_owned()),
            _ => {}
        }
    }

    let Some(access_token) = access_token.filter(|token| !token.trim().is_empty()) else {
        return Ok(None);
    };
    let expires_in = expires_in
        .as_deref()
        .map(str::trim)
        .ok_or_else(|| TrackerError::Validation("redirect is missing expires_in".to_string()))?
        .parse::<i64>()
        .map_err(|error| TrackerError::Validation(format!("invalid expires_in: {error}")))?;

    Ok(Some(RedirectToken {
        access_token,
        expires_in: expires_in.max(0),
    }))
}
