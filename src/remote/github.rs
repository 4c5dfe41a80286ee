//! Minimal GitHub REST client: create a release, find a release by tag.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use log::debug;
use regex::Regex;

use crate::error::{ReleaseError, RemoteError};
use crate::remote::{NewRelease, ReleaseInfo};

const API_VERSION: &str = "2022-11-28";

/// Repository coordinates on the hosting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    pub owner: String,
    pub name: String,
}

impl GitHubRepo {
    /// Parse an `owner/name` slug
    pub fn parse_slug(slug: &str) -> Result<Self, ReleaseError> {
        match slug.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(GitHubRepo {
                    owner: owner.to_string(),
                    name: name.trim_end_matches(".git").to_string(),
                })
            }
            _ => Err(ReleaseError::config(format!(
                "Invalid repository '{}': expected OWNER/NAME",
                slug
            ))),
        }
    }

    /// Derive owner and name from a git remote URL
    ///
    /// Handles `https://host/owner/name(.git)`, `ssh://git@host/owner/name`
    /// and scp-like `git@host:owner/name.git`.
    pub fn from_remote_url(url: &str) -> Result<Self, ReleaseError> {
        static URL: OnceLock<Regex> = OnceLock::new();
        static SCP: OnceLock<Regex> = OnceLock::new();

        let url_re = URL.get_or_init(|| {
            Regex::new(r"^(?:https?|ssh|git)://(?:[^@/]+@)?[^/]+/(?:.+/)?([^/]+)/([^/]+?)(?:\.git)?/?$")
                .expect("static regex")
        });
        let scp_re = SCP.get_or_init(|| {
            Regex::new(r"^(?:[^@/]+@)?[^:/]+:(?:.+/)?([^/]+)/([^/]+?)(?:\.git)?/?$")
                .expect("static regex")
        });

        let caps = url_re
            .captures(url)
            .or_else(|| scp_re.captures(url))
            .ok_or_else(|| {
                ReleaseError::config(format!(
                    "Cannot derive OWNER/NAME from remote URL '{}'",
                    url
                ))
            })?;

        Ok(GitHubRepo {
            owner: caps[1].to_string(),
            name: caps[2].to_string(),
        })
    }
}

impl fmt::Display for GitHubRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Blocking client for the release endpoints of the GitHub REST API
pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    repo: GitHubRepo,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(
        api_url: impl Into<String>,
        repo: GitHubRepo,
        token: Option<String>,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("github-tag-release/", env!("CARGO_PKG_VERSION")))
            .build();

        GitHubClient {
            agent,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            repo,
            token,
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!(
            "{}/repos/{}/{}{}",
            self.api_url, self.repo.owner, self.repo.name, path
        );
        debug!("{} {}", method, url);

        let request = self
            .agent
            .request(method, &url)
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", API_VERSION);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }

    pub fn create_release(&self, release: &NewRelease) -> Result<ReleaseInfo, RemoteError> {
        let response = self
            .request("POST", "/releases")
            .send_json(release)
            .map_err(classify_http_error)?;

        response
            .into_json::<ReleaseInfo>()
            .map_err(|e| RemoteError::transient(format!("unreadable release response: {}", e)))
    }

    pub fn find_release(&self, tag: &str) -> Result<Option<ReleaseInfo>, RemoteError> {
        let path = format!("/releases/tags/{}", encode_path_segment(tag));
        match self.request("GET", &path).call() {
            Ok(response) => response
                .into_json::<ReleaseInfo>()
                .map(Some)
                .map_err(|e| {
                    RemoteError::transient(format!("unreadable release response: {}", e))
                }),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(classify_http_error(e)),
        }
    }
}

fn classify_http_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            classify_status(code, &body)
        }
        ureq::Error::Transport(transport) => RemoteError::transient(transport.to_string()),
    }
}

/// Map an HTTP error status and body onto the retry taxonomy
pub fn classify_status(code: u16, body: &str) -> RemoteError {
    let detail = format!("HTTP {}: {}", code, summarize_body(body));
    let lowered = body.to_lowercase();

    match code {
        401 => RemoteError::auth(detail),
        403 | 429 if lowered.contains("rate limit") => RemoteError::transient(detail),
        403 => RemoteError::auth(detail),
        408 | 429 | 500..=599 => RemoteError::transient(detail),
        422 if lowered.contains("already_exists") => RemoteError::already_exists(detail),
        _ => RemoteError::rejected(detail),
    }
}

/// The `message` field of a GitHub error body, or the body itself
fn summarize_body(body: &str) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("message").and_then(|m| m.as_str()).map(String::from));

    match message {
        Some(message) => message,
        None => body.chars().take(200).collect(),
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
