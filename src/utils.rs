//! URL construction helpers.

use reqwest::Url;

use crate::error::{Error, Result};

/// Builds an absolute request URL for a channel endpoint.
///
/// The first `$` placeholder in `template` is replaced by the channel name,
/// redundant path separators are collapsed, and `query` pairs are appended
/// after any query already present in the base URL. Fails with
/// [`Error::ServerUrlInvalid`] when `server` cannot be parsed.
pub fn build_url(server: &str, channel: &str, template: &str, query: &[(&str, String)]) -> Result<Url> {
    let mut url = Url::parse(server).map_err(|_| Error::ServerUrlInvalid)?;
    let path = collapse_slashes(&template.replacen('$', channel, 1));
    url.set_path(&path);
    for (key, value) in query {
        url.query_pairs_mut().append_pair(key, value);
    }
    Ok(url)
}

/// Collapses runs of `/` in a path into a single separator.
fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}
