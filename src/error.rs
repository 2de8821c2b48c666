//! Error kinds for the caption session. All of them are recoverable: the UI
//! reports them on its status line and the session stays usable.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no supported images in {}", .0.display())]
    FolderEmpty(PathBuf),

    #[error("could not list images in {}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: glob::PatternError,
    },

    #[error("could not decode image {}", .path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("could not read caption file {}", .path.display())]
    CaptionRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not save caption file {}", .path.display())]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
