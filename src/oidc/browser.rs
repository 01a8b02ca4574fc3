//! Pure parsing helpers for the simulated browser: locating the login form on the
//! authorization page and pulling the authorization code out of the redirect.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use super::error::AuthFailure;

/// Query-parameter pattern for the authorization code in a redirect `Location`.
pub const AUTHORIZATION_CODE_PATTERN: &str = r"(?:[&?])code=([^&]+)";

static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(AUTHORIZATION_CODE_PATTERN).expect("invalid code pattern"));
static FORM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<form\b([^>]*)>(.*?)(?:</form>|\z)").expect("invalid form pattern")
});
static INPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b([^>]*)>").expect("invalid input pattern"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[xX]([0-9a-fA-F]{1,6})|#([0-9]{1,7})|(quot|apos|lt|gt|amp));")
        .expect("invalid entity pattern")
});
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("invalid attribute pattern")
});

/// Extracts the authorization code from a redirect `Location` header value.
pub fn extract_authorization_code(location: &str) -> Result<String, AuthFailure> {
    CODE_RE
        .captures(location)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AuthFailure::MissingAuthorizationCode {
            location: Some(location.to_string()),
        })
}

/// The login form found on the authorization page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Absolute URL the form posts to.
    pub action: Url,
    /// Hidden fields the provider expects back.
    pub hidden_fields: Vec<(String, String)>,
}

impl LoginForm {
    /// Form fields to submit: hidden fields plus the user's credentials.
    pub fn fields(&self, username: &str, password: &str) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = self
            .hidden_fields
            .iter()
            .filter(|(name, _)| name != "username" && name != "password")
            .cloned()
            .collect();
        fields.push(("username".to_string(), username.to_string()));
        fields.push(("password".to_string(), password.to_string()));
        fields
    }
}

/// Finds the first `<form>` of `html` and resolves its action against `page_url`.
pub fn parse_login_form(html: &str, page_url: &Url) -> Result<LoginForm, AuthFailure> {
    let caps = FORM_RE.captures(html).ok_or(AuthFailure::MissingLoginForm)?;
    let form_attrs = attributes(caps.get(1).map_or("", |m| m.as_str()));
    let form_body = caps.get(2).map_or("", |m| m.as_str());

    // A form without action posts back to the page itself
    let action = lookup(&form_attrs, "action").unwrap_or_default();
    let action = page_url
        .join(&unescape_html(&action))
        .map_err(|_| AuthFailure::MissingLoginForm)?;

    let hidden_fields = INPUT_RE
        .captures_iter(form_body)
        .filter_map(|input| {
            let attrs = attributes(input.get(1).map_or("", |m| m.as_str()));
            let is_hidden = lookup(&attrs, "type")
                .map(|t| t.eq_ignore_ascii_case("hidden"))
                .unwrap_or(false);
            if !is_hidden {
                return None;
            }
            let name = lookup(&attrs, "name")?;
            let value = lookup(&attrs, "value").unwrap_or_default();
            Some((unescape_html(&name), unescape_html(&value)))
        })
        .collect();

    Ok(LoginForm {
        action,
        hidden_fields,
    })
}

fn attributes(tag: &str) -> Vec<(String, String)> {
    ATTR_RE
        .captures_iter(tag)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            Some((name, value.to_string()))
        })
        .collect()
}

fn lookup(attrs: &[(String, String)], name: &str) -> Option<String> {
    attrs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

/// Decodes character references and the named entities a login page may put
/// in attribute values, in a single pass.
fn unescape_html(raw: &str) -> String {
    ENTITY_RE
        .replace_all(raw, |caps: &Captures| {
            let decoded = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(hex), _, _) => u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32),
                (_, Some(dec), _) => dec.as_str().parse().ok().and_then(char::from_u32),
                (_, _, Some(name)) => match name.as_str() {
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    _ => Some('&'),
                },
                _ => None,
            };
            // Invalid code points are left as written
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}
