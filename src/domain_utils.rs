//! Domain extraction for archived record URLs.
//!
//! A record's "domain" is the host component of its target URL. Optionally
//! hosts can be collapsed to their registrable domain using the Public Suffix
//! List (PSL), which handles multi-label suffixes properly:
//! - www.example.co.uk -> example.co.uk
//! - shop.example.com -> example.com
//! - mysite.github.io -> mysite.github.io (github.io is a public suffix)

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use psl::domain_str;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

use crate::errors::{MailTallyError, Result};

/// How a record URL is reduced to the domain used for deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DomainMode {
    /// URL host as parsed (lowercased, no port).
    #[default]
    Host,
    /// Registrable domain per the Public Suffix List, falling back to the host.
    Registrable,
}

impl fmt::Display for DomainMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DomainMode::Host => "host",
            DomainMode::Registrable => "registrable",
        })
    }
}

impl FromStr for DomainMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(DomainMode::Host),
            "registrable" | "registrable_domain" => Ok(DomainMode::Registrable),
            other => Err(format!("unknown domain mode '{other}'")),
        }
    }
}

/// Extract the host of `url`.
///
/// Fails with `InvalidUrl` if the URL does not parse or has no host
/// (e.g. `mailto:` or `data:` URLs).
pub fn host_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| MailTallyError::invalid_url(url, e.to_string()))?;
    match parsed.host() {
        Some(Host::Domain(d)) if !d.is_empty() => Ok(d.trim_end_matches('.').to_string()),
        Some(Host::Domain(_)) | None => Err(MailTallyError::invalid_url(url, "URL has no host")),
        Some(ip) => Ok(ip.to_string()),
    }
}

/// Registrable domain of `host`, or `None` for IPs / hosts PSL cannot place.
pub fn registrable_domain(host: &str) -> Option<String> {
    if host.parse::<std::net::IpAddr>().is_ok() || host.starts_with('[') {
        return None;
    }
    domain_str(host).map(|s| s.to_string())
}

/// Domain of `url` under `mode`.
pub fn domain_of(url: &str, mode: DomainMode) -> Result<String> {
    let host = host_of(url)?;
    Ok(match mode {
        DomainMode::Host => host,
        DomainMode::Registrable => registrable_domain(&host).unwrap_or(host),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_extraction() {
        assert_eq!(host_of("http://a.example/").unwrap(), "a.example");
        assert_eq!(host_of("https://Sub.Example.COM:8080/x?y=1").unwrap(), "sub.example.com");
        assert_eq!(host_of("http://192.0.2.7/index.html").unwrap(), "192.0.2.7");
        assert_eq!(host_of("http://example.com./").unwrap(), "example.com");
    }

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(
            host_of("not a url").unwrap_err(),
            MailTallyError::InvalidUrl { .. }
        ));
        assert!(host_of("mailto:foo@bar.com").is_err());
        assert!(host_of("").is_err());
    }

    #[test]
    fn test_registrable_domain() {
        assert_eq!(registrable_domain("www.example.co.uk").unwrap(), "example.co.uk");
        assert_eq!(registrable_domain("shop.example.com").unwrap(), "example.com");
        assert_eq!(registrable_domain("mysite.github.io").unwrap(), "mysite.github.io");
        assert_eq!(registrable_domain("192.0.2.7"), None);
    }

    #[test]
    fn test_domain_modes() {
        let url = "http://blog.example.co.uk/post";
        assert_eq!(domain_of(url, DomainMode::Host).unwrap(), "blog.example.co.uk");
        assert_eq!(domain_of(url, DomainMode::Registrable).unwrap(), "example.co.uk");
        // IP hosts fall back to the host itself.
        assert_eq!(
            domain_of("http://192.0.2.7/", DomainMode::Registrable).unwrap(),
            "192.0.2.7"
        );
    }

    #[test]
    fn test_domain_mode_parsing() {
        assert_eq!("HOST".parse::<DomainMode>().unwrap(), DomainMode::Host);
        assert_eq!("registrable".parse::<DomainMode>().unwrap(), DomainMode::Registrable);
        assert!("tld".parse::<DomainMode>().is_err());
    }
}
