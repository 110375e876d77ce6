use std::path::{Path, PathBuf};

use super::Selection;

/// File extension of sprite frames on disk.
pub const FRAME_EXT: &str = "ico";

/// Loaded frames for one selection. `T` is whatever handle the presenter
/// draws with (an `HICON` on Windows, a path elsewhere).
pub struct SpriteSheet<T> {
    frames: Vec<T>,
}

impl<T> SpriteSheet<T> {
    pub fn empty() -> Self {
        Self { frames: Vec::new() }
    }

    /// Load frames `0..frame_count` for `selection` from `dir`.
    /// Frames the loader rejects are skipped, so the sheet may hold fewer
    /// frames than the runner nominally has.
    pub fn load_with<F>(dir: &Path, selection: Selection, mut loader: F) -> Self
    where
        F: FnMut(&Path) -> Option<T>,
    {
        let expected = selection.frame_count();
        let mut frames = Vec::with_capacity(expected);

        for i in 0..expected {
            let path = frame_path(dir, selection, i);
            match loader(&path) {
                Some(frame) => frames.push(frame),
                None => log::warn!("Missing sprite frame {}", path.display()),
            }
        }

        log::debug!(
            "Loaded {}/{} frames for {}_{}",
            frames.len(),
            expected,
            selection.theme.name(),
            selection.runner.name(),
        );

        Self { frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.frames.get(index)
    }

    /// Frame `index`, or `fallback` when the sheet has no such frame.
    pub fn frame_or<'a>(&'a self, index: usize, fallback: &'a T) -> &'a T {
        self.get(index).unwrap_or(fallback)
    }

    /// Take ownership of every frame (used to release OS handles).
    #[cfg(windows)]
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.frames.drain(..)
    }
}

/// `<dir>/<theme>_<runner>_<index>.ico`
pub fn frame_path(dir: &Path, selection: Selection, index: usize) -> PathBuf {
    dir.join(format!("{}.{}", selection.asset_key(index), FRAME_EXT))
}
