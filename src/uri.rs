//! URI parsing for handler dispatch
//!
//! Only the scheme and the decoded path are interpreted. A URI whose path
//! cannot be decoded is kept but flagged invalid; handlers answer
//! `PathError` for it and never attempt I/O.

use url::Url;

/// Schemes the `url` crate parses with host semantics of their own
const SPECIAL_SCHEMES: &[&str] = &["http", "https", "ws", "wss", "ftp", "file"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    path: String,
    valid: bool,
}

impl Uri {
    /// Split `input` into scheme and percent-decoded path
    ///
    /// For non-special schemes a bare host is folded into the path, so
    /// `asset://dir/a.js`, `asset:/dir/a.js` and `asset:///dir/a.js` all
    /// resolve to `/dir/a.js`. An authority carrying a port or user info has
    /// no path equivalent and makes the URI invalid.
    pub fn parse(input: &str) -> Self {
        let url = match Url::parse(input) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!(uri = input, error = %e, "URI is not parseable");
                return Self::invalid(String::new());
            }
        };

        let scheme = url.scheme().to_string();
        let raw_path = match url.host_str() {
            Some(host) if !host.is_empty() && !SPECIAL_SCHEMES.contains(&scheme.as_str()) => {
                if url.port().is_some() || !url.username().is_empty() || url.password().is_some()
                {
                    tracing::debug!(uri = input, "URI authority cannot be folded into a path");
                    return Self::invalid(scheme);
                }
                format!("/{}{}", host, url.path())
            }
            _ => url.path().to_string(),
        };

        match percent_decode(&raw_path) {
            Some(path) => Self {
                scheme,
                path,
                valid: true,
            },
            None => {
                tracing::debug!(uri = input, "URI path is not decodable");
                Self::invalid(scheme)
            }
        }
    }

    fn invalid(scheme: String) -> Self {
        Self {
            scheme,
            path: String::new(),
            valid: false,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Decode `%XX` escapes; `None` on a malformed escape or non-UTF-8 result
fn percent_decode(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).copied().and_then(hex_value)?;
            let lo = bytes.get(i + 2).copied().and_then(hex_value)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}

fn hex_value(b: u8) -> Option<u8> {
    char::from(b).to_digit(16).map(|d| d as u8)
}
