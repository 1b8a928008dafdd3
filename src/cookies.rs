//! Cookie jar loading and CSRF token lookup.
//!
//! Session and CSRF cookies can be seeded from a Netscape HTTP cookie file,
//! commonly exported by browser extensions.

use percent_encoding::percent_decode_str;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Cookie entry parsed from a Netscape cookie file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NetscapeCookie {
    domain: String,
    include_subdomains: bool,
    path: String,
    secure: bool,
    name: String,
    value: String,
    http_only: bool,
}

/// Errors that can occur while loading cookies.
#[derive(Error, Debug)]
pub enum CookieError {
    /// Failed to read or walk the filesystem.
    #[error("Failed to read cookie file: {0}")]
    Io(#[from] std::io::Error),

    /// Cookie file contains an invalid line.
    #[error("Invalid Netscape cookie line: {0}")]
    InvalidLine(String),

    /// Cookie domain could not be converted into a URL.
    #[error("Invalid cookie domain: {0}")]
    InvalidDomain(String),
}

/// Supplies the anti-forgery token sent with mutating requests.
pub trait CsrfTokenProvider: Send + Sync {
    /// Returns the current token, if one is known.
    fn csrf_token(&self) -> Option<String>;
}

/// Reads the CSRF token from a cookie in a shared jar.
pub struct JarCsrfToken {
    jar: Arc<Jar>,
    url: Url,
    cookie_name: String,
}

impl JarCsrfToken {
    /// Creates a provider reading `cookie_name` as sent to `url`.
    pub fn new(jar: Arc<Jar>, url: Url, cookie_name: impl Into<String>) -> Self {
        Self {
            jar,
            url,
            cookie_name: cookie_name.into(),
        }
    }
}

impl CsrfTokenProvider for JarCsrfToken {
    fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.url)?;
        let header = header.to_str().ok()?;
        cookie_value(header, &self.cookie_name)
    }
}

/// A token fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticCsrfToken(pub Option<String>);

impl CsrfTokenProvider for StaticCsrfToken {
    fn csrf_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Finds `name` in a `Cookie` header value and percent-decodes it.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .map(|raw| percent_decode_str(raw).decode_utf8_lossy().into_owned())
}

/// Loads cookies from a Netscape cookie file into a fresh jar.
///
/// Returns the jar and the file used, if one matched `name_tokens`. A missing
/// directory yields an empty jar.
pub fn load_netscape_cookie_jar(
    cookie_dir: &Path,
    name_tokens: &[&str],
    server: &Url,
) -> Result<(Arc<Jar>, Option<PathBuf>), CookieError> {
    let jar = Arc::new(Jar::default());
    if !cookie_dir.is_dir() {
        return Ok((jar, None));
    }

    let cookie_path = find_cookie_file(cookie_dir, name_tokens)?;
    if let Some(path) = &cookie_path {
        let cookies = parse_netscape_cookie_file(path)?;
        add_cookies_to_jar(&jar, &cookies, server.scheme())?;
    }
    Ok((jar, cookie_path))
}

fn find_cookie_file(
    root: &Path,
    name_tokens: &[&str],
) -> Result<Option<PathBuf>, std::io::Error> {
    let mut best: Option<(PathBuf, std::time::SystemTime)> = None;
    find_cookie_file_recursive(root, name_tokens, &mut best)?;
    Ok(best.map(|(path, _)| path))
}

fn find_cookie_file_recursive(
    dir: &Path,
    name_tokens: &[&str],
    best: &mut Option<(PathBuf, std::time::SystemTime)>,
) -> Result<(), std::io::Error> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            find_cookie_file_recursive(&path, name_tokens, best)?;
            continue;
        }

        let file_name = match path.file_name().and_then(OsStr::to_str) {
            Some(name) => name.to_ascii_lowercase(),
            None => continue,
        };

        if !file_name.ends_with(".txt")
            || !name_tokens
                .iter()
                .all(|token| file_name.contains(&token.to_ascii_lowercase()))
        {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|meta| meta.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH);

        if best.as_ref().is_none_or(|(_, best_time)| modified > *best_time) {
            *best = Some((path, modified));
        }
    }

    Ok(())
}

fn parse_netscape_cookie_file(path: &Path) -> Result<Vec<NetscapeCookie>, CookieError> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.strip_prefix("#HttpOnly_") {
            Some(stripped) => Some((true, stripped)),
            None if line.starts_with('#') => None,
            None => Some((false, line)),
        })
        .map(|(http_only, line)| parse_netscape_line(line, http_only))
        .collect()
}

fn parse_netscape_line(line: &str, http_only: bool) -> Result<NetscapeCookie, CookieError> {
    let fields: Vec<&str> = line.splitn(7, '\t').collect();
    let &[domain, include_subdomains, path, secure, _expires, name, value] = fields.as_slice() else {
        return Err(CookieError::InvalidLine(line.to_string()));
    };

    Ok(NetscapeCookie {
        domain: domain.to_string(),
        include_subdomains: include_subdomains.eq_ignore_ascii_case("true"),
        path: path.to_string(),
        secure: secure.eq_ignore_ascii_case("true"),
        name: name.to_string(),
        value: value.to_string(),
        http_only,
    })
}

fn add_cookies_to_jar(
    jar: &Jar,
    cookies: &[NetscapeCookie],
    scheme: &str,
) -> Result<(), CookieError> {
    for cookie in cookies {
        let host = cookie.domain.trim_start_matches('.');
        if host.is_empty() {
            return Err(CookieError::InvalidDomain(cookie.domain.clone()));
        }

        let url = Url::parse(&format!("{scheme}://{host}/"))
            .map_err(|_| CookieError::InvalidDomain(cookie.domain.clone()))?;

        let mut cookie_str = format!("{}={}; Path={}", cookie.name, cookie.value, cookie.path);

        if cookie.include_subdomains {
            cookie_str.push_str(&format!("; Domain={}", cookie.domain));
        }

        if cookie.secure {
            cookie_str.push_str("; Secure");
        }

        if cookie.http_only {
            cookie_str.push_str("; HttpOnly");
        }

        jar.add_cookie_str(&cookie_str, &url);
    }

    Ok(())
}
