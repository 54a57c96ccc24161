use crate::AssetError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub const USER_AGENT: &str = "Helldivers2SlotMachine/1.0 (+https://example.local)";

/// Source of remote image bytes.
pub trait Fetcher {
    /// `Content-Type` reported for `url`, if the probe succeeds.
    fn content_type(&self, url: &str) -> Option<String>;

    /// Streams the body of `url` into `out`, returning the byte count.
    fn fetch_into(&self, url: &str, out: &mut dyn Write) -> Result<u64, AssetError>;
}

/// Time limits for [`HttpFetcher`]. `download` bounds a whole GET including
/// its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    pub connect: Duration,
    pub download: Duration,
    pub head: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(20),
            download: Duration::from_secs(600),
            head: Duration::from_secs(10),
        }
    }
}

pub struct HttpFetcher {
    client: Client,
    head_timeout: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, AssetError> {
        Self::with_timeouts(FetchTimeouts::default())
    }

    pub fn with_timeouts(timeouts: FetchTimeouts) -> Result<Self, AssetError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.download)
            .build()?;
        Ok(Self {
            client,
            head_timeout: timeouts.head,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn content_type(&self, url: &str) -> Option<String> {
        let response = self.client.head(url).timeout(self.head_timeout).send().ok()?;
        response
            .headers()
            .get(CONTENT_TYPE)?
            .to_str()
            .ok()
            .map(str::to_string)
    }

    fn fetch_into(&self, url: &str, out: &mut dyn Write) -> Result<u64, AssetError> {
        let mut response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.copy_to(out)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    /// Sleep before retry `n` is `n * backoff`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(1500),
        }
    }
}

/// Outcome of [`download`] when it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downloaded {
    Fetched,
    AlreadyPresent,
}

/// Downloads `url` to `dest` through a `.part` file renamed into place.
/// A non-empty `dest` is kept as is.
pub fn download(
    fetcher: &dyn Fetcher,
    url: &str,
    dest: &Path,
    policy: &RetryPolicy,
) -> Result<Downloaded, AssetError> {
    if fs::metadata(dest).map(|meta| meta.len() > 0).unwrap_or(false) {
        debug!(dest = %dest.display(), "already downloaded");
        return Ok(Downloaded::AlreadyPresent);
    }
    let part = part_path(dest);
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        let err = match fetch_once(fetcher, url, dest, &part) {
            Ok(()) => return Ok(Downloaded::Fetched),
            Err(err) => err,
        };
        let _ = fs::remove_file(&part);
        if attempt >= attempts {
            return Err(AssetError::Download {
                url: url.to_string(),
                attempts,
                reason: err.to_string(),
            });
        }
        warn!(url, attempt, error = %err, "download failed, retrying");
        thread::sleep(policy.backoff * attempt);
        attempt += 1;
    }
}

fn fetch_once(
    fetcher: &dyn Fetcher,
    url: &str,
    dest: &Path,
    part: &Path,
) -> Result<(), AssetError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(fs::File::create(part)?);
    fetcher.fetch_into(url, &mut out)?;
    out.flush()?;
    drop(out);
    fs::rename(part, dest)?;
    Ok(())
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
