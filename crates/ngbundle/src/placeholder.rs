//! Version placeholder substitution.
//!
//! A placeholder is a whole quoted string literal such as `"NG_VERSION_FULL"`
//! or `'NG_VERSION_CODENAME'`. Matches are replaced with the corresponding
//! version value, keeping the original quote character.

use std::borrow::Cow;

use log::trace;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::version::VersionRecord;

// The regex crate has no backreferences, so each quote style gets its own arm.
static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(NG_VERSION_[A-Z]+)"|'(NG_VERSION_[A-Z]+)'"#)
        .expect("placeholder pattern is valid")
});

/// The recognised tokens, in the order they are documented.
pub const PLACEHOLDER_TOKENS: [&str; 6] = [
    "NG_VERSION_FULL",
    "NG_VERSION_MAJOR",
    "NG_VERSION_MINOR",
    "NG_VERSION_DOT",
    "NG_VERSION_CDN",
    "NG_VERSION_CODENAME",
];

fn token_value<'a>(token: &str, version: &'a VersionRecord) -> Option<Cow<'a, str>> {
    let value = match token {
        "NG_VERSION_FULL" => Cow::Borrowed(version.full.as_str()),
        "NG_VERSION_MAJOR" => Cow::Owned(version.major.to_string()),
        "NG_VERSION_MINOR" => Cow::Owned(version.minor.to_string()),
        "NG_VERSION_DOT" => Cow::Owned(version.patch.to_string()),
        "NG_VERSION_CDN" => Cow::Borrowed(version.cdn.as_str()),
        "NG_VERSION_CODENAME" => Cow::Borrowed(version.code_name.as_str()),
        _ => return None,
    };
    Some(value)
}

/// Replace every placeholder literal in `text`.
///
/// Total and pure: text without placeholders comes back unchanged, and
/// unknown `NG_VERSION_*` names are left alone.
pub fn substitute(text: &str, version: &VersionRecord) -> String {
    let mut replaced = 0usize;
    let result = PLACEHOLDER_PATTERN.replace_all(text, |caps: &Captures<'_>| {
        let (quote, token) = match (caps.get(1), caps.get(2)) {
            (Some(token), _) => ('"', token.as_str()),
            (None, Some(token)) => ('\'', token.as_str()),
            (None, None) => unreachable!("one alternative always matches"),
        };
        match token_value(token, version) {
            Some(value) => {
                replaced += 1;
                format!("{quote}{value}{quote}")
            }
            None => caps[0].to_owned(),
        }
    });
    trace!("Substituted {replaced} version placeholders");
    result.into_owned()
}
