//! Download orchestration.
//!
//! Transfers are bounded by the session's download slots and streamed to
//! the working directory in fixed-size chunks.  Nothing is downloaded while
//! the camera reports IsBusy.

use std::path::PathBuf;

use futures_util::future::join_all;
use log::{info, warn};
use serde_json::json;
use url::Url;

use crate::catalog::MediaRecord;
use crate::constants::status;
use crate::error::{GoProError, Result};
use crate::session::Session;

/// Which files `download_all` fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFilter {
    #[default]
    All,
    /// `.MP4` only.
    Videos,
    /// `.JPG` only.
    Photos,
}

impl MediaFilter {
    pub fn matches(&self, record: &MediaRecord) -> bool {
        match self {
            MediaFilter::All    => true,
            MediaFilter::Videos => record.is_video(),
            MediaFilter::Photos => record.is_photo(),
        }
    }
}

/// Local file name for `url`: the percent-decoded basename of its path.
/// Names that decode to something with a directory part are rejected.
pub fn url_file_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| GoProError::InvalidFileName(format!("{url}: {e}")))?;
    let raw = parsed
        .path_segments()
        .and_then(|s| s.last())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GoProError::InvalidFileName(format!("{url} has no file name")))?;
    let name = urlencoding::decode(raw)
        .map_err(|e| GoProError::InvalidFileName(format!("{raw}: {e}")))?
        .into_owned();
    check_file_name(&name)?;
    Ok(name)
}

fn check_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(GoProError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// Low-resolution proxy of a video: `.MP4` → `.LRV`, `GH` → `GL`.
pub fn low_res_name(name: &str) -> Option<String> {
    let stem = name.strip_suffix("MP4")?;
    Some(format!("{stem}LRV").replace("GH", "GL"))
}

impl Session {
    /// Refuse downloads while the camera records or processes media.
    pub async fn ensure_idle(&self) -> Result<()> {
        if self.status_code(status::IS_BUSY).await? != 0 {
            warn!("camera busy; download refused");
            return Err(GoProError::DeviceBusy);
        }
        Ok(())
    }

    /// Fetch `url` into the working directory as `name`, or as the URL's
    /// basename when no name is given.
    pub async fn download_one(&self, url: &str, name: Option<&str>) -> Result<PathBuf> {
        let name = match name {
            Some(n) => {
                check_file_name(n)?;
                n.to_string()
            }
            None => url_file_name(url)?,
        };
        self.ensure_idle().await?;
        self.transfer(url, &name).await
    }

    /// Download one catalog record, as `<folder>-<name>` unless named.
    pub async fn download_media(&self, record: &MediaRecord, name: Option<&str>) -> Result<PathBuf> {
        self.ensure_idle().await?;
        let name = name.map(str::to_string).unwrap_or_else(|| record.default_file_name());
        check_file_name(&name)?;
        self.log(
            format!("downloading {record} to {name}"),
            json!({ "media": record, "size": record.size_readable() }),
        )?;
        self.transfer(&self.media_url(record), &name).await
    }

    /// Download every record `filter` accepts, as `<folder>-<name>`.
    pub async fn download_all(&self, filter: MediaFilter) -> Result<Vec<MediaRecord>> {
        self.download_matching(|r| filter.matches(r)).await
    }

    /// Download every record `predicate` accepts.  All transfers are joined
    /// as one batch; the first failure is returned after the batch settles.
    pub async fn download_matching<P>(&self, predicate: P) -> Result<Vec<MediaRecord>>
    where
        P: Fn(&MediaRecord) -> bool,
    {
        self.ensure_idle().await?;
        let selected: Vec<MediaRecord> = self.list_media().await?.into_iter().filter(|r| predicate(r)).collect();
        info!("downloading {} files", selected.len());

        let transfers = selected.iter().map(|r| {
            let url = self.media_url(r);
            let name = r.default_file_name();
            async move { self.transfer(&url, &name).await }
        });
        for outcome in join_all(transfers).await {
            outcome?;
        }
        Ok(selected)
    }

    /// Download the most recent capture.  On a dual-lens camera both halves
    /// are fetched under their `<folder>-<name>` names, so `name` is only
    /// accepted for single-lens cameras.
    pub async fn download_last(&self, name: Option<&str>) -> Result<Vec<PathBuf>> {
        self.ensure_idle().await?;

        if self.camera().await?.is_dual_lens() {
            if let Some(name) = name {
                return Err(GoProError::InvalidArgument(format!(
                    "cannot name both halves of a dual-lens capture {name:?}"
                )));
            }
            let Some(pair) = self.latest_pair().await? else {
                return Err(GoProError::Payload("no media on camera".into()));
            };
            let first_url = self.media_url(&pair.first);
            let second_url = self.endpoints().media_second_lens(&pair.second.folder, &pair.second.name);
            let first_name = pair.first.default_file_name();
            let second_name = pair.second.default_file_name();
            let (a, b) = tokio::join!(
                self.transfer(&first_url, &first_name),
                self.transfer(&second_url, &second_name),
            );
            return Ok(vec![a?, b?]);
        }

        let Some(record) = self.latest_media().await? else {
            return Err(GoProError::Payload("no media on camera".into()));
        };
        let name = name.map(str::to_string).unwrap_or_else(|| record.default_file_name());
        check_file_name(&name)?;
        self.log(format!("download last: {record}"), json!({ "media": record }))?;
        Ok(vec![self.transfer(&self.media_url(&record), &name).await?])
    }

    /// Download the low-resolution proxy of a video as `LOWRES<folder>-<file>`.
    pub async fn download_low_res(&self, record: &MediaRecord) -> Result<PathBuf> {
        let proxy = low_res_name(&record.name).ok_or_else(|| {
            GoProError::InvalidArgument(format!("{} has no low resolution proxy", record.name))
        })?;
        self.ensure_idle().await?;
        let url = self.endpoints().media(&record.folder, &proxy);
        let name = format!("LOWRES{}-{}", record.folder, proxy);
        self.transfer(&url, &name).await
    }

    async fn transfer(&self, url: &str, name: &str) -> Result<PathBuf> {
        let _slot = self
            .download_slots()
            .acquire()
            .await
            .map_err(|_| GoProError::Io(std::io::Error::other("download slots closed")))?;

        let dir = &self.config().working_dir;
        tokio::fs::create_dir_all(dir).await?;
        let dest = dir.join(name);
        let bytes = self.transport().download(url, &dest, self.config().chunk_size).await?;
        info!("downloaded {url} → {} ({bytes} bytes)", dest.display());
        Ok(dest)
    }
}
