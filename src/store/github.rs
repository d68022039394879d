use std::time::Duration;

use base64::Engine as _;
use log::debug;
use serde::Deserialize;
use serde_json::json;

use super::{ContentStore, EntryKind, StoreEntry, StoreError, StoredFile};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the posts live: one branch of one repository.
#[derive(Debug, Clone)]
pub(crate) struct Repository {
    pub api_url: String,
    pub owner: String,
    pub name: String,
    pub branch: String,
}

/// Content store backed by the GitHub Contents API.
pub(crate) struct GitHubStore {
    agent: ureq::Agent,
    repo: Repository,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentWire {
    #[serde(default)]
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct EntryWire {
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
    download_url: Option<String>,
}

impl From<EntryWire> for StoreEntry {
    fn from(w: EntryWire) -> Self {
        let kind = match w.kind.as_str() {
            "file" => EntryKind::File,
            "dir" => EntryKind::Dir,
            _ => EntryKind::Other,
        };
        StoreEntry {
            name: w.name,
            path: w.path,
            kind,
            download_url: w.download_url,
        }
    }
}

/// A stalled connection fails with a transport error after `io_timeout`; nothing is retried.
fn http_agent(io_timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout_read(io_timeout)
        .timeout_write(io_timeout)
        .build()
}

fn parse_json<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::Decode(e.to_string()))
}

fn read_body(resp: ureq::Response) -> Result<String, StoreError> {
    resp.into_string()
        .map_err(|e| StoreError::Transport(e.to_string()))
}

fn request_error(path: &str, err: ureq::Error) -> StoreError {
    match err {
        ureq::Error::Status(status, resp) => StoreError::Http {
            path: path.to_string(),
            status,
            body: resp.into_string().unwrap_or_default(),
        },
        ureq::Error::Transport(t) => StoreError::Transport(t.to_string()),
    }
}

/// Base64 as served by the API, which wraps lines with `\n`.
pub(super) fn decode_content(encoded: &str) -> Result<String, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

pub(super) fn encode_content(content: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(content.as_bytes())
}

impl GitHubStore {
    pub fn new(repo: Repository, token: Option<String>) -> Self {
        Self {
            agent: http_agent(IO_TIMEOUT),
            repo,
            token,
        }
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.repo.api_url.trim_end_matches('/'),
            self.repo.owner,
            self.repo.name,
            path.trim_matches('/')
        )
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let req = self
            .agent
            .request(method, url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => req.set("Authorization", &format!("token {token}")),
            None => req,
        }
    }
}

impl ContentStore for GitHubStore {
    fn get(&self, path: &str) -> Result<Option<StoredFile>, StoreError> {
        let url = self.contents_url(path);
        debug!("GET {url}");
        let resp = match self
            .request("GET", &url)
            .query("ref", &self.repo.branch)
            .call()
        {
            Ok(resp) => resp,
            Err(ureq::Error::Status(404, _)) => {
                debug!("{path} does not exist yet");
                return Ok(None);
            }
            Err(e) => return Err(request_error(path, e)),
        };
        let wire: ContentWire = parse_json(&read_body(resp)?)?;
        Ok(Some(StoredFile {
            content: decode_content(&wire.content)?,
            sha: wire.sha,
        }))
    }

    fn put(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<(), StoreError> {
        let url = self.contents_url(path);
        let mut body = json!({
            "message": message,
            "content": encode_content(content),
            "branch": self.repo.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }
        debug!("PUT {url} (sha: {sha:?})");
        match self
            .request("PUT", &url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(409 | 422, resp)) => Err(StoreError::Conflict {
                path: path.to_string(),
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(e) => Err(request_error(path, e)),
        }
    }

    fn list(&self, dir: &str) -> Result<Vec<StoreEntry>, StoreError> {
        let url = self.contents_url(dir);
        debug!("GET {url} (listing)");
        let resp = self
            .request("GET", &url)
            .query("ref", &self.repo.branch)
            .call()
            .map_err(|e| request_error(dir, e))?;
        let entries: Vec<EntryWire> = parse_json(&read_body(resp)?)?;
        Ok(entries.into_iter().map(StoreEntry::from).collect())
    }

    fn fetch_raw(&self, url: &str) -> Result<String, StoreError> {
        debug!("GET {url} (raw)");
        let resp = self
            .agent
            .get(url)
            .set("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| request_error(url, e))?;
        read_body(resp)
    }
}
