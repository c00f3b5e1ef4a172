//! Audio playback sink
//!
//! The sink is exclusive: starting a new clip replaces whatever is
//! currently playing. `play` returning Ok means playback *started*; the
//! caller records the announcement only after that point.

use crate::error::{Error, Result};
use async_trait::async_trait;
use fids_common::AnnouncementType;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// A resolved clip ready for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRequest {
    /// Clip path relative to the audio root (leading slash included)
    pub clip_path: String,
    pub flight_id: Uuid,
    pub announcement_type: AnnouncementType,
}

/// Playback sink seam
///
/// Production uses [`LibraryAudioSink`]; tests inject a recording sink
/// that can be scripted to fail.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Start playing a clip, replacing any current playback
    async fn play(&self, clip: ClipRequest) -> Result<()>;
}

/// Sink backed by the on-disk clip library
///
/// Verifies the clip exists under the audio root before reporting a
/// successful start; connected dashboards receive the started event over
/// SSE and render the playback.
pub struct LibraryAudioSink {
    root: PathBuf,
    current: Mutex<Option<ClipRequest>>,
}

impl LibraryAudioSink {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            current: Mutex::new(None),
        }
    }

    /// The clip currently playing, if any
    pub async fn now_playing(&self) -> Option<ClipRequest> {
        self.current.lock().await.clone()
    }

    fn resolve(&self, clip_path: &str) -> PathBuf {
        self.root.join(clip_path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AudioSink for LibraryAudioSink {
    async fn play(&self, clip: ClipRequest) -> Result<()> {
        let file = self.resolve(&clip.clip_path);
        let exists = tokio::fs::try_exists(&file).await?;
        if !exists {
            return Err(Error::Playback(format!(
                "Announcement clip missing: {}",
                file.display()
            )));
        }

        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            debug!("Stopping current clip {}", previous.clip_path);
        }
        info!("Playing announcement clip {}", clip.clip_path);
        *current = Some(clip);

        Ok(())
    }
}
