//! Caption session: the ordered image list of the open folder, the current
//! position, and the read/edit/save lifecycle of the sidecar caption files.
//! Rendering is someone else's job; this module only hands out payloads.

use crate::error::SessionError;
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions recognized when scanning a folder, matched case-insensitively.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

/// One image file of the open folder.
#[derive(Clone, Debug)]
pub struct ImageEntry {
    path: PathBuf,
    file_name: String,
}

impl ImageEntry {
    fn new(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Sidecar caption path: same folder, same base name, `.txt` extension.
    pub fn caption_path(&self) -> PathBuf {
        self.path.with_extension("txt")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Everything the rendering side needs to display one image and its caption.
#[derive(Clone, Debug)]
pub struct RenderPayload {
    pub image_path: PathBuf,
    pub display_name: String,
    /// True pixel dimensions of the source file, never a display-scaled size.
    pub width: u32,
    pub height: u32,
    pub page_label: String,
    pub caption_text: String,
}

impl RenderPayload {
    pub fn resolution_label(&self) -> String {
        format!("{} x {}", self.width, self.height)
    }
}

/// Result of a successful `advance`: the move always happens, but a failed
/// save of the image being left is carried alongside the new render.
#[derive(Debug)]
pub struct AdvanceOutcome {
    pub save_error: Option<SessionError>,
    pub render: Result<RenderPayload, SessionError>,
}

#[derive(Default)]
pub struct CaptionSession {
    images: Vec<ImageEntry>,
    cur_idx: usize,
    pending_text: String,
}

impl CaptionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans `dir` for supported images and replaces the session state
    /// wholesale. Every image without a caption file gets an empty one
    /// created on the spot. Returns the image count, or `FolderEmpty` after
    /// resetting to the inert empty state.
    pub fn open_folder(&mut self, dir: &Path) -> Result<usize, SessionError> {
        let options = glob::MatchOptions {
            case_sensitive: false,
            ..glob::MatchOptions::new()
        };

        let mut images = Vec::new();
        for ext in SUPPORTED_IMAGE_EXTENSIONS {
            let pattern = dir.join(format!("*.{ext}")).to_string_lossy().into_owned();
            let paths = glob::glob_with(&pattern, options).map_err(|source| SessionError::Scan {
                path: dir.to_path_buf(),
                source,
            })?;
            for path in paths.flatten() {
                if path.is_file() {
                    images.push(ImageEntry::new(path));
                }
            }
        }
        images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        // Every image is guaranteed a caption file once the scan completes.
        // Existing files are left alone.
        for entry in &images {
            let caption = entry.caption_path();
            if !caption.exists() {
                if let Err(err) = fs::File::create(&caption) {
                    warn!("could not create caption file {}: {err}", caption.display());
                }
            }
        }

        self.images = images;
        self.cur_idx = 0;
        self.pending_text.clear();

        if self.images.is_empty() {
            return Err(SessionError::FolderEmpty(dir.to_path_buf()));
        }
        Ok(self.images.len())
    }

    /// Builds the render payload for `index` and resets `pending_text` to the
    /// caption read from disk. The caption is re-read on every call so edits
    /// made outside the program between displays are picked up.
    ///
    /// `index` must be within bounds; the caller navigates via `advance`,
    /// which never produces an out-of-range index.
    pub fn show(&mut self, index: usize) -> Result<RenderPayload, SessionError> {
        let entry = &self.images[index];
        let (width, height) =
            image::image_dimensions(entry.path()).map_err(|source| SessionError::ImageDecode {
                path: entry.path().to_path_buf(),
                source,
            })?;

        let caption_text = match read_caption(entry) {
            Ok(text) => text,
            Err(err) => {
                // Unreadable caption degrades to an empty editor rather than
                // blocking the image from displaying.
                warn!("{err}");
                String::new()
            }
        };

        let payload = RenderPayload {
            image_path: entry.path().to_path_buf(),
            display_name: entry.file_name().to_owned(),
            width,
            height,
            page_label: format!("{} of {}", index + 1, self.images.len()),
            caption_text,
        };
        self.pending_text = payload.caption_text.clone();
        Ok(payload)
    }

    /// In-memory update of the caption buffer. No disk I/O.
    pub fn set_pending_text(&mut self, text: impl Into<String>) {
        self.pending_text = text.into();
    }

    pub fn pending_text(&self) -> &str {
        &self.pending_text
    }

    /// Overwrites the current image's caption file with `pending_text`.
    /// On failure the buffer is untouched so the user can retry or copy the
    /// text elsewhere.
    pub fn save(&self) -> Result<(), SessionError> {
        if self.images.is_empty() {
            return Ok(());
        }
        let path = self.images[self.cur_idx].caption_path();
        fs::write(&path, &self.pending_text)
            .map_err(|source| SessionError::SaveFailed { path, source })
    }

    /// Saves the current caption, then moves one step and produces the render
    /// for the new position. Returns `None` without touching anything when the
    /// move would leave the list (the buttons are disabled at the boundary,
    /// but a stray press must not wrap or error).
    ///
    /// A failed save does not block the move; it rides along in the outcome
    /// for the caller to surface.
    pub fn advance(&mut self, direction: Direction) -> Option<AdvanceOutcome> {
        if self.images.is_empty() {
            return None;
        }
        let new_idx = match direction {
            Direction::Previous => self.cur_idx.checked_sub(1)?,
            Direction::Next => {
                let idx = self.cur_idx + 1;
                if idx >= self.images.len() {
                    return None;
                }
                idx
            }
        };

        let save_error = self.save().err();
        self.cur_idx = new_idx;
        let render = self.show(new_idx);
        Some(AdvanceOutcome { save_error, render })
    }

    /// Current position, or `None` while no folder is loaded.
    pub fn current_index(&self) -> Option<usize> {
        (!self.images.is_empty()).then_some(self.cur_idx)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Previous/Next make sense only with somewhere to go.
    pub fn nav_enabled(&self) -> bool {
        self.image_count() > 1
    }

    pub fn save_enabled(&self) -> bool {
        self.image_count() > 0
    }
}

fn read_caption(entry: &ImageEntry) -> Result<String, SessionError> {
    let path = entry.caption_path();
    if !path.exists() {
        // Deleted externally since the scan; recreate rather than fail.
        fs::File::create(&path).map_err(|source| SessionError::CaptionRead {
            path: path.clone(),
            source,
        })?;
        return Ok(String::new());
    }
    fs::read_to_string(&path).map_err(|source| SessionError::CaptionRead { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_image(dir: &Path, name: &str, width: u32, height: u32) {
        image::RgbImage::new(width, height)
            .save(dir.join(name))
            .expect("failed to write test image");
    }

    fn open(dir: &Path) -> CaptionSession {
        let mut session = CaptionSession::new();
        session.open_folder(dir).expect("open_folder failed");
        session
    }

    #[test]
    fn open_folder_creates_missing_caption_files() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        write_image(dir.path(), "b.jpg", 2, 2);
        write_image(dir.path(), "c.bmp", 2, 2);
        fs::write(dir.path().join("b.txt"), "kept").unwrap();

        let session = open(dir.path());

        assert_eq!(session.image_count(), 3);
        for name in ["a.txt", "b.txt", "c.txt"] {
            assert!(dir.path().join(name).exists(), "{name} missing");
        }
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "");
        // existing captions are never truncated by a scan
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "kept");
    }

    #[test]
    fn empty_folder_yields_inert_state() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

        let mut session = CaptionSession::new();
        let err = session.open_folder(dir.path()).unwrap_err();
        assert!(matches!(err, SessionError::FolderEmpty(_)));
        assert!(session.is_empty());
        assert_eq!(session.current_index(), None);
        assert!(!session.nav_enabled());
        assert!(!session.save_enabled());
        assert!(session.advance(Direction::Next).is_none());
        assert!(session.advance(Direction::Previous).is_none());
        assert!(session.save().is_ok());
    }

    #[test]
    fn caption_round_trips_unicode() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        let mut session = open(dir.path());

        let text = "première ligne 🦀\nsecond line\n\tтретья";
        session.set_pending_text(text);
        session.save().unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), text);

        session.set_pending_text("");
        session.save().unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "");
    }

    #[test]
    fn save_is_idempotent() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        let mut session = open(dir.path());

        session.set_pending_text("same text");
        session.save().unwrap();
        let first = fs::read(dir.path().join("a.txt")).unwrap();
        session.save().unwrap();
        let second = fs::read(dir.path().join("a.txt")).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, b"same text");
    }

    #[test]
    fn advance_clamps_at_boundaries() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        write_image(dir.path(), "b.png", 2, 2);
        let mut session = open(dir.path());

        assert!(session.advance(Direction::Previous).is_none());
        assert_eq!(session.current_index(), Some(0));

        let outcome = session.advance(Direction::Next).expect("should move");
        assert!(outcome.save_error.is_none());
        assert_eq!(session.current_index(), Some(1));

        assert!(session.advance(Direction::Next).is_none());
        assert_eq!(session.current_index(), Some(1));
    }

    #[test]
    fn advance_saves_current_caption_before_moving() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        write_image(dir.path(), "b.png", 2, 2);
        let mut session = open(dir.path());

        session.set_pending_text("x");
        let outcome = session.advance(Direction::Next).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "x");
        let payload = outcome.render.unwrap();
        assert_eq!(payload.display_name, "b.png");
        assert_eq!(payload.page_label, "2 of 2");
    }

    #[test]
    fn images_sorted_lexicographically_by_file_name() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "b.jpg", 2, 2);
        write_image(dir.path(), "a.png", 2, 2);
        write_image(dir.path(), "c.gif", 2, 2);
        let mut session = open(dir.path());

        assert_eq!(session.show(0).unwrap().display_name, "a.png");
        let second = session.advance(Direction::Next).unwrap().render.unwrap();
        assert_eq!(second.display_name, "b.jpg");
        let third = session.advance(Direction::Next).unwrap().render.unwrap();
        assert_eq!(third.display_name, "c.gif");
    }

    #[test]
    fn show_reports_source_dimensions() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "wide.png", 7, 4);
        let mut session = open(dir.path());

        let payload = session.show(0).unwrap();
        assert_eq!((payload.width, payload.height), (7, 4));
        assert_eq!(payload.resolution_label(), "7 x 4");
        assert_eq!(payload.page_label, "1 of 1");
        assert_eq!(payload.image_path, dir.path().join("wide.png"));
    }

    #[test]
    fn show_recreates_missing_caption_file() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        let mut session = open(dir.path());

        fs::remove_file(dir.path().join("a.txt")).unwrap();
        let payload = session.show(0).unwrap();
        assert_eq!(payload.caption_text, "");
        assert!(dir.path().join("a.txt").exists());
    }

    #[test]
    fn show_picks_up_external_caption_edits() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        let mut session = open(dir.path());

        assert_eq!(session.show(0).unwrap().caption_text, "");
        fs::write(dir.path().join("a.txt"), "edited elsewhere").unwrap();
        let payload = session.show(0).unwrap();
        assert_eq!(payload.caption_text, "edited elsewhere");
        assert_eq!(session.pending_text(), "edited elsewhere");
    }

    #[test]
    fn failed_save_keeps_pending_text() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        let mut session = open(dir.path());

        // a directory where the caption file should be makes the write fail
        fs::remove_file(dir.path().join("a.txt")).unwrap();
        fs::create_dir(dir.path().join("a.txt")).unwrap();

        session.set_pending_text("precious");
        let err = session.save().unwrap_err();
        assert!(matches!(err, SessionError::SaveFailed { .. }));
        assert_eq!(session.pending_text(), "precious");
    }

    #[test]
    fn advance_proceeds_when_save_fails() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "a.png", 2, 2);
        write_image(dir.path(), "b.png", 2, 2);
        let mut session = open(dir.path());

        fs::remove_file(dir.path().join("a.txt")).unwrap();
        fs::create_dir(dir.path().join("a.txt")).unwrap();
        session.set_pending_text("lost warning");

        let outcome = session.advance(Direction::Next).unwrap();
        assert!(matches!(
            outcome.save_error,
            Some(SessionError::SaveFailed { .. })
        ));
        assert_eq!(session.current_index(), Some(1));
        assert_eq!(outcome.render.unwrap().display_name, "b.png");
    }

    #[test]
    fn reopening_replaces_state_wholesale() {
        let dir_a = tempdir().unwrap();
        write_image(dir_a.path(), "a.png", 2, 2);
        write_image(dir_a.path(), "b.png", 2, 2);
        write_image(dir_a.path(), "c.png", 2, 2);
        let dir_b = tempdir().unwrap();
        write_image(dir_b.path(), "only.png", 2, 2);

        let mut session = open(dir_a.path());
        session.advance(Direction::Next).unwrap();
        session.set_pending_text("leftover");

        assert_eq!(session.open_folder(dir_b.path()).unwrap(), 1);
        assert_eq!(session.current_index(), Some(0));
        assert_eq!(session.image_count(), 1);
        assert!(!session.nav_enabled());
        assert_eq!(session.pending_text(), "");
    }

    #[test]
    fn extensions_matched_case_insensitively() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "A.PNG", 2, 2);
        write_image(dir.path(), "b.JpG", 2, 2);

        let session = open(dir.path());
        assert_eq!(session.image_count(), 2);
        assert!(dir.path().join("A.txt").exists());
        assert!(dir.path().join("b.txt").exists());
    }

    #[test]
    fn undecodable_image_reports_decode_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("fake.png"), b"not really a png").unwrap();

        let mut session = open(dir.path());
        session.set_pending_text("before");
        let err = session.show(0).unwrap_err();
        assert!(matches!(err, SessionError::ImageDecode { .. }));
        // a failed render leaves the buffer alone
        assert_eq!(session.pending_text(), "before");
    }
}
