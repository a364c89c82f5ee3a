use std::fs;
use std::path::PathBuf;

use bzip2::read::BzDecoder;
use chrono::NaiveDate;
use log::info;
use scraper::{Html, Selector};

use crate::shared::SimulatorError;

const SERIAL_2_URL: &str = "https://publicdata.caida.org/datasets/as-relationships/serial-2/";

/// Fetches the newest CAIDA serial-2 AS relationship snapshot, decompresses
/// it, and caches the plain-text file locally. The simulator itself never
/// touches the network; it just takes the returned path.
pub struct CaidaCollector {
    base_url: String,
    cache_dir: PathBuf,
}

impl CaidaCollector {
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rovsim");
        CaidaCollector {
            base_url: SERIAL_2_URL.to_string(),
            cache_dir,
        }
    }

    pub fn with_cache_dir(mut self, cache_dir: PathBuf) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Return the path of the decompressed snapshot, downloading it first
    /// unless a cached copy already exists.
    pub fn run(&self) -> Result<PathBuf, SimulatorError> {
        fs::create_dir_all(&self.cache_dir)?;

        let snapshot = self.latest_snapshot()?;
        let cached = self.cache_dir.join(snapshot.trim_end_matches(".bz2"));
        if cached.exists() {
            info!("using cached CAIDA snapshot {}", cached.display());
            return Ok(cached);
        }

        if let Some(date) = snapshot_date(&snapshot) {
            info!("fetching CAIDA as-rel2 snapshot dated {}", date);
        }
        let compressed = download(&format!("{}{}", self.base_url, snapshot))?;
        let decompressed = decompress_bz2(&compressed)?;
        fs::write(&cached, decompressed)?;

        info!("CAIDA snapshot saved to {}", cached.display());
        Ok(cached)
    }

    /// Scrape the serial-2 index page for the newest `*.as-rel2.txt.bz2`
    /// link. Snapshot names start with YYYYMMDD, so they sort
    /// chronologically as strings.
    fn latest_snapshot(&self) -> Result<String, SimulatorError> {
        let body = reqwest::blocking::get(self.base_url.as_str())?
            .error_for_status()?
            .text()?;
        let document = Html::parse_document(&body);
        let anchors = Selector::parse("a").expect("static selector");

        let mut newest: Option<String> = None;
        for element in document.select(&anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !href.ends_with(".as-rel2.txt.bz2") {
                continue;
            }
            if newest.as_deref().map_or(true, |current| href > current) {
                newest = Some(href.to_string());
            }
        }
        newest.ok_or_else(|| SimulatorError::SnapshotNotFound(self.base_url.clone()))
    }
}

impl Default for CaidaCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn download(url: &str) -> Result<Vec<u8>, SimulatorError> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}

fn decompress_bz2(data: &[u8]) -> Result<Vec<u8>, SimulatorError> {
    let mut decoder = BzDecoder::new(data);
    let mut decompressed = Vec::new();
    std::io::copy(&mut decoder, &mut decompressed)?;
    Ok(decompressed)
}

fn snapshot_date(filename: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(filename.get(..8)?, "%Y%m%d").ok()
}
