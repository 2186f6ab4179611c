use std::path::{Path, PathBuf};

use async_trait::async_trait;
use symphonia::core::{
    codecs::CODEC_TYPE_NULL,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::{MetadataOptions, StandardTagKey},
    probe::Hint,
};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    common::{errors::ResolveError, types::AnyResult},
    protocol::tracks::TrackInfo,
    sources::SourcePlugin,
};

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "wav", "ogg", "opus", "m4a", "mp4", "aac", "mka", "webm",
];

/// Files on disk, plus filename search over a library directory.
pub struct LocalSource {
    library: Option<PathBuf>,
    search_limit: usize,
}

impl LocalSource {
    pub fn new(library: Option<&str>, search_limit: usize) -> AnyResult<Self> {
        let library = match library {
            Some(dir) => {
                let path = PathBuf::from(dir);
                if !path.is_dir() {
                    return Err(format!("library {} is not a directory", dir).into());
                }
                Some(path)
            }
            None => None,
        };

        Ok(Self {
            library,
            search_limit: search_limit.max(1),
        })
    }

    fn strip_scheme(identifier: &str) -> &str {
        identifier.strip_prefix("file://").unwrap_or(identifier)
    }

    fn probe_file(path: &Path) -> AnyResult<TrackInfo> {
        let file = std::fs::File::open(path)?;

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(&ext.to_lowercase());
        }

        let mss = MediaSourceStream::new(Box::new(file), Default::default());
        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let mut format = probed.format;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or("no audio track found")?;

        let duration_secs = match (track.codec_params.n_frames, track.codec_params.sample_rate) {
            (Some(frames), Some(rate)) if rate > 0 => Some(frames / rate as u64),
            _ => None,
        };

        let mut title = String::new();
        if let Some(meta) = format.metadata().current() {
            if let Some(tag) = meta
                .tags()
                .iter()
                .find(|t| t.std_key == Some(StandardTagKey::TrackTitle))
            {
                title = tag.value.to_string();
            }
        }

        // Fallback: use the filename without extension as the title
        if title.is_empty() {
            title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string();
        }

        Ok(TrackInfo {
            title,
            locator: format!("file://{}", path.display()),
            duration_secs,
            thumbnail: None,
            source_name: "local".to_string(),
        })
    }

    async fn probe(path: PathBuf) -> Result<TrackInfo, ResolveError> {
        let query = path.display().to_string();
        match tokio::task::spawn_blocking(move || LocalSource::probe_file(&path)).await {
            Ok(Ok(info)) => Ok(info),
            Ok(Err(e)) => Err(ResolveError::resolution(query, e)),
            Err(e) => Err(ResolveError::resolution(query, e)),
        }
    }

    /// Audio files under `root` whose stem contains every query word.
    fn find_matches(root: &Path, query: &str) -> Vec<PathBuf> {
        let words: Vec<String> = query
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if words.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Local source: skipping unreadable entry: {}", e);
                    continue;
                }
            };

            // Linked directories are not descended into; linked files count.
            let path = entry.path();
            let is_file =
                entry.file_type().is_file() || (entry.path_is_symlink() && path.is_file());
            if !is_file {
                continue;
            }

            let is_audio = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()));
            if !is_audio {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_lowercase();
            if words.iter().all(|w| stem.contains(w.as_str())) {
                matches.push(entry.into_path());
            }
        }

        matches.sort();
        matches
    }
}

#[async_trait]
impl SourcePlugin for LocalSource {
    fn name(&self) -> &str {
        "local"
    }

    fn can_handle(&self, identifier: &str) -> bool {
        Path::new(Self::strip_scheme(identifier)).is_file()
    }

    async fn load(&self, identifier: &str) -> Result<TrackInfo, ResolveError> {
        let path = PathBuf::from(Self::strip_scheme(identifier));
        debug!("Local source probing file: {}", path.display());
        Self::probe(path).await
    }

    async fn search(&self, query: &str) -> Result<Vec<TrackInfo>, ResolveError> {
        let Some(root) = self.library.clone() else {
            return Ok(Vec::new());
        };

        let owned_query = query.to_string();
        let paths = tokio::task::spawn_blocking(move || Self::find_matches(&root, &owned_query))
            .await
            .map_err(|e| ResolveError::resolution(query, e))?;

        let mut results = Vec::new();
        for path in paths.into_iter().take(self.search_limit) {
            match Self::probe(path).await {
                Ok(info) => results.push(info),
                Err(e) => warn!("Local source: skipping unreadable match: {}", e),
            }
        }
        Ok(results)
    }
}
