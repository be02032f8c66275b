//! Media catalog.
//!
//! `/gp/gpMediaList` returns `{"media":[{"d":folder,"fs":[{"n":name,"s":size}]}]}`.
//! Dual-lens cameras answer with an array of two such documents, one per
//! lens.  Records are kept in listing order: folders as listed, files as
//! listed within each folder.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::error::{GoProError, Result};
use crate::session::Session;

const SIZE_UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Human-readable size, powers of 1024 rounded to two decimals (`1.5MB`).
pub fn media_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut unit = 0;
    let mut scaled = bytes as f64;
    while scaled >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }
    let rounded = (scaled * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.1}{}", SIZE_UNITS[unit])
    } else {
        format!("{rounded}{}", SIZE_UNITS[unit])
    }
}

/// One file on the camera's card.  Identity is folder + name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRecord {
    pub folder: String,
    pub name:   String,
    pub size:   u64,
}

impl MediaRecord {
    pub fn size_readable(&self) -> String {
        media_size(self.size)
    }

    pub fn is_video(&self) -> bool {
        self.name.ends_with("MP4")
    }

    pub fn is_photo(&self) -> bool {
        self.name.ends_with("JPG")
    }

    /// `<folder>-<name>`, the default local file name.
    pub fn default_file_name(&self) -> String {
        format!("{}-{}", self.folder, self.name)
    }
}

impl fmt::Display for MediaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.folder, self.name, self.size_readable())
    }
}

/// Metadata document kinds served by `/gp/gpMediaMetadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    VideoInfo,
    PhotoInfo,
    Exif,
}

impl MetadataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKind::VideoInfo => "videoinfo",
            MetadataKind::PhotoInfo => "v4info",
            MetadataKind::Exif      => "exif",
        }
    }
}

// ── Wire format ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct MediaDoc {
    #[serde(default)]
    media: Vec<FolderEntry>,
}

#[derive(Debug, Deserialize)]
struct FolderEntry {
    d:  String,
    #[serde(default)]
    fs: Vec<FileEntry>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    n: String,
    #[serde(default, deserialize_with = "size_field")]
    s: u64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing {
    PerLens(Vec<MediaDoc>),
    Single(MediaDoc),
}

/// Sizes arrive as either a JSON number or a decimal string.
fn size_field<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }
    match Raw::deserialize(de)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl MediaDoc {
    fn records(self) -> Vec<MediaRecord> {
        self.media
            .into_iter()
            .flat_map(|folder| {
                let d = folder.d;
                folder
                    .fs
                    .into_iter()
                    .map(move |f| MediaRecord { folder: d.clone(), name: f.n, size: f.s })
            })
            .collect()
    }

    fn last_folder(&self) -> Option<&str> {
        self.media.last().map(|f| f.d.as_str())
    }

    fn last_in(&self, folder: &str) -> Option<MediaRecord> {
        self.media
            .iter()
            .filter(|f| f.d == folder)
            .flat_map(|f| f.fs.iter().map(move |e| (f, e)))
            .last()
            .map(|(f, e)| MediaRecord { folder: f.d.clone(), name: e.n.clone(), size: e.s })
    }
}

/// Parse a listing into one record list per document (one per lens).
fn parse_listing(body: &str) -> Result<Vec<Vec<MediaRecord>>> {
    let listing: Listing = serde_json::from_str(body)?;
    Ok(match listing {
        Listing::Single(doc) => vec![doc.records()],
        Listing::PerLens(docs) => docs.into_iter().map(MediaDoc::records).collect(),
    })
}

/// Flattened listing, documents in order.
pub fn parse_media_list(body: &str) -> Result<Vec<MediaRecord>> {
    Ok(parse_listing(body)?.into_iter().flatten().collect())
}

/// Last record in iteration order (last file of the last folder).  This is
/// listing order, not capture time.
pub fn latest(records: &[MediaRecord]) -> Option<&MediaRecord> {
    records.last()
}

/// Folder holding the other lens's half of a dual-lens capture.
pub fn counterpart_folder(folder: &str) -> String {
    if folder.contains("GBACK") {
        folder.replace("GBACK", "GFRNT")
    } else {
        folder.replace("GFRNT", "GBACK")
    }
}

/// Both halves of a dual-lens capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPair {
    pub first:  MediaRecord,
    pub second: MediaRecord,
}

impl Session {
    /// Every file on the card, in listing order.
    pub async fn list_media(&self) -> Result<Vec<MediaRecord>> {
        let body = self
            .transport()
            .get_text(&self.endpoints().media_list(), self.config().request_timeout())
            .await?;
        let records = parse_media_list(&body)?;
        self.log(format!("listed {} media files", records.len()), json!({ "count": records.len() }))?;
        Ok(records)
    }

    /// Last record of the first listing document.
    pub async fn latest_media(&self) -> Result<Option<MediaRecord>> {
        let body = self
            .transport()
            .get_text(&self.endpoints().media_list(), self.config().request_timeout())
            .await?;
        let mut docs = parse_listing(&body)?;
        if docs.is_empty() {
            return Ok(None);
        }
        Ok(docs.swap_remove(0).pop())
    }

    /// Latest capture of a dual-lens camera: the last folder of the first
    /// lens, and the same-numbered folder of the other lens.
    pub async fn latest_pair(&self) -> Result<Option<MediaPair>> {
        let body = self
            .transport()
            .get_text(&self.endpoints().media_list_ex(), self.config().request_timeout())
            .await?;
        let docs: Vec<MediaDoc> = serde_json::from_str(&body)?;
        let [front, back] = <[MediaDoc; 2]>::try_from(docs).map_err(|d| {
            GoProError::Payload(format!("dual-lens listing has {} documents", d.len()))
        })?;

        let Some(folder) = front.last_folder() else {
            return Ok(None);
        };
        let other = counterpart_folder(folder);
        let pair = front
            .last_in(folder)
            .zip(back.last_in(&other))
            .map(|(first, second)| MediaPair { first, second });
        Ok(pair)
    }

    pub fn media_url(&self, record: &MediaRecord) -> String {
        self.endpoints().media(&record.folder, &record.name)
    }

    /// URLs of the most recent capture: one, or two on a dual-lens camera.
    pub async fn latest_urls(&self) -> Result<Vec<String>> {
        if self.camera().await?.is_dual_lens() {
            let pair = self.latest_pair().await?;
            return Ok(pair
                .map(|p| {
                    vec![
                        self.media_url(&p.first),
                        self.endpoints().media_second_lens(&p.second.folder, &p.second.name),
                    ]
                })
                .unwrap_or_default());
        }
        Ok(self.latest_media().await?.map(|r| vec![self.media_url(&r)]).unwrap_or_default())
    }

    /// Metadata document for one file.
    pub async fn media_metadata(&self, record: &MediaRecord, kind: MetadataKind) -> Result<Value> {
        let url = self.endpoints().metadata(&record.folder, &record.name, kind.as_str());
        let body = self.transport().get_text(&url, self.config().request_timeout()).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Split a media URL of this camera into (folder, file).
    pub fn info_from_url(&self, url: &str) -> Option<(String, String)> {
        let rest = url.strip_prefix(&self.endpoints().media_prefix())?;
        let (folder, file) = rest.rsplit_once('/')?;
        if folder.is_empty() || file.is_empty() {
            return None;
        }
        Some((folder.to_string(), file.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{probe, session_with, ScriptedTransport, BASE};

    const LISTING: &str = r#"{
        "id": "1",
        "media": [
            { "d": "100GOPRO", "fs": [
                { "n": "GOPR0001.JPG", "s": "2516582" },
                { "n": "GH010002.MP4", "s": 104857600 } ] },
            { "d": "101GOPRO", "fs": [
                { "n": "GOPR0003.JPG", "s": "1572864" },
                { "n": "GH010004.MP4", "s": "1536" } ] }
        ]
    }"#;

    #[test]
    fn sizes_are_readable() {
        assert_eq!(media_size(1536), "1.5KB");
        assert_eq!(media_size(1_572_864), "1.5MB");
        assert_eq!(media_size(1024), "1.0KB");
        assert_eq!(media_size(500), "500.0B");
        assert_eq!(media_size(0), "0B");
        assert_eq!(media_size(1_234_567_890), "1.15GB");
    }

    #[test]
    fn listing_flattens_in_order() {
        let records = parse_media_list(LISTING).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["GOPR0001.JPG", "GH010002.MP4", "GOPR0003.JPG", "GH010004.MP4"]);
        assert_eq!(records[0].size, 2_516_582);
        assert_eq!(records[1].size, 104_857_600);
    }

    #[test]
    fn latest_is_last_file_of_last_folder() {
        let records = parse_media_list(LISTING).unwrap();
        let last = latest(&records).unwrap();
        assert_eq!(last.folder, "101GOPRO");
        assert_eq!(last.name, "GH010004.MP4");
        assert!(latest(&[]).is_none());
    }

    #[test]
    fn dual_lens_listing_keeps_both_documents() {
        let body = r#"[
            { "media": [ { "d": "100GBACK", "fs": [ { "n": "GPBK0001.JPG", "s": "10" } ] } ] },
            { "media": [ { "d": "100GFRNT", "fs": [ { "n": "GPFR0001.JPG", "s": "12" } ] } ] }
        ]"#;
        let records = parse_media_list(body).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].folder, "100GFRNT");
    }

    #[test]
    fn counterpart_swaps_lens_folders() {
        assert_eq!(counterpart_folder("100GBACK"), "100GFRNT");
        assert_eq!(counterpart_folder("100GFRNT"), "100GBACK");
        assert_eq!(counterpart_folder("100GOPRO"), "100GOPRO");
    }

    #[test]
    fn malformed_listing_is_an_error() {
        assert!(parse_media_list("{\"media\": [ { \"fs\": [] } ]}").is_err());
        assert!(parse_media_list("<html>").is_err());
    }

    #[tokio::test]
    async fn listing_failure_is_not_an_empty_list() {
        let transport = Arc::new(ScriptedTransport::new());
        let session = session_with(transport);
        assert!(session.list_media().await.is_err());
    }

    #[tokio::test]
    async fn dual_lens_pair_resolves_counterpart() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_json(BASE, probe("Fusion", "FS1.04.01.80.00"));
        transport.on_json(
            "http://10.5.5.9:8080/gp/gpMediaListEx",
            serde_json::json!([
                { "media": [
                    { "d": "100GBACK", "fs": [ { "n": "GB010001.MP4", "s": "1" } ] },
                    { "d": "101GBACK", "fs": [ { "n": "GB010002.MP4", "s": "1" }, { "n": "GB010003.MP4", "s": "1" } ] } ] },
                { "media": [
                    { "d": "101GFRNT", "fs": [ { "n": "GF010002.MP4", "s": "1" }, { "n": "GF010003.MP4", "s": "1" } ] } ] }
            ]),
        );
        let session = session_with(Arc::clone(&transport));

        let urls = session.latest_urls().await.unwrap();
        assert_eq!(
            urls,
            [
                "http://10.5.5.9:8080/videos/DCIM/101GBACK/GB010003.MP4",
                "http://10.5.5.9:8080/videos2/DCIM/101GFRNT/GF010003.MP4",
            ]
        );
    }

    #[test]
    fn urls_split_into_folder_and_file() {
        let session = session_with(Arc::new(ScriptedTransport::new()));
        let url = "http://10.5.5.9:8080/videos/DCIM/100GOPRO/GH010002.MP4";
        assert_eq!(
            session.info_from_url(url),
            Some(("100GOPRO".to_string(), "GH010002.MP4".to_string()))
        );
        assert_eq!(session.info_from_url("http://elsewhere/x.MP4"), None);
    }
}
