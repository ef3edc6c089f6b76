//! Candidate URL generation for the recovery strategies.
//!
//! URLs are handled as opaque strings split at `?` and `#`; query pairs
//! keep their original encoding unless a pair is added or removed.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

use assetlift_protocol::constants::VERSION_PARAM;

/// Characters escaped in generated query values.
const QUERY_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'/')
    .add(b':')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?');

struct UrlParts<'a> {
    base: &'a str,
    query: Vec<&'a str>,
    fragment: Option<&'a str>,
}

impl<'a> UrlParts<'a> {
    fn parse(url: &'a str) -> Self {
        let (rest, fragment) = match url.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (url, None),
        };
        let (base, query) = match rest.split_once('?') {
            Some((base, query)) => (base, query.split('&').filter(|p| !p.is_empty()).collect()),
            None => (rest, Vec::new()),
        };
        Self {
            base,
            query,
            fragment,
        }
    }

    fn remove(&mut self, name: &str) {
        self.query.retain(|pair| param_name(pair) != name);
    }

    fn render(&self, extra: Option<(&str, &str)>) -> String {
        let mut pairs: Vec<Cow<'_, str>> = self.query.iter().map(|p| Cow::Borrowed(*p)).collect();
        if let Some((name, value)) = extra {
            pairs.push(Cow::Owned(format!(
                "{name}={}",
                utf8_percent_encode(value, QUERY_VALUE)
            )));
        }

        let mut out = self.base.to_string();
        if !pairs.is_empty() {
            out.push('?');
            out.push_str(&pairs.join("&"));
        }
        if let Some(fragment) = self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

fn param_name(pair: &str) -> Cow<'_, str> {
    let name = pair.split_once('=').map_or(pair, |(name, _)| name);
    percent_decode_str(name).decode_utf8_lossy()
}

/// Removes the cache-busting version parameter.
pub fn strip_version(url: &str) -> String {
    let mut parts = UrlParts::parse(url);
    parts.remove(VERSION_PARAM);
    parts.render(None)
}

/// Replaces the version parameter with `value`, keeping other parameters.
pub fn with_version(url: &str, value: &str) -> String {
    let mut parts = UrlParts::parse(url);
    parts.remove(VERSION_PARAM);
    parts.render(Some((VERSION_PARAM, value)))
}

/// Alternate version values: now, now minus and plus `offset_secs`, a
/// literal `1`, and no version at all.
pub fn alt_versions(url: &str, now_unix: i64, offset_secs: i64) -> Vec<String> {
    let values = [
        now_unix.to_string(),
        (now_unix - offset_secs).to_string(),
        (now_unix + offset_secs).to_string(),
        "1".to_string(),
    ];
    let mut out: Vec<String> = values.iter().map(|v| with_version(url, v)).collect();
    out.push(strip_version(url));
    dedup(out)
}

/// Alternate URL shapes for a known resource: the bare URL, identifier
/// qualified queries, and extension substitutions among `extensions`.
pub fn alt_patterns(url: &str, resource_id: &str, extensions: &[String]) -> Vec<String> {
    let bare = UrlParts::parse(url).base.to_string();
    let mut out = vec![bare.clone()];

    let key = id_key(resource_id);
    if !key.is_empty() {
        let encoded = utf8_percent_encode(key, QUERY_VALUE);
        out.push(format!("{bare}?id={encoded}"));
        out.push(format!("{bare}?{VERSION_PARAM}={encoded}"));
    }

    if let Some((stem, ext)) = split_extension(&bare)
        && extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    {
        for alt in extensions {
            if !alt.eq_ignore_ascii_case(ext) {
                out.push(format!("{stem}.{alt}"));
            }
        }
    }

    dedup(out)
}

/// Trailing segment of a resource id, e.g. `123` for
/// `gid://platform/MediaImage/123`.
fn id_key(resource_id: &str) -> &str {
    resource_id.rsplit('/').next().unwrap_or(resource_id)
}

fn split_extension(path: &str) -> Option<(&str, &str)> {
    let (stem, ext) = path.rsplit_once('.')?;
    if ext.is_empty() || ext.contains('/') || stem.ends_with('/') {
        return None;
    }
    Some((stem, ext))
}

fn dedup(urls: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls {
        if !out.contains(&url) {
            out.push(url);
        }
    }
    out
}
