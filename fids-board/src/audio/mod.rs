//! Announcement audio: clip path resolution and the playback sink seam

pub mod path;
pub mod sink;

pub use path::clip_path;
pub use sink::{AudioSink, ClipRequest, LibraryAudioSink};
