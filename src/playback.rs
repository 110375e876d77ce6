use crate::load::SampleUnavailable;
use crate::sprite::Selection;

/// Stored in `last_load_percent` when no valid sample exists for the cycle.
pub const LOAD_SENTINEL: f32 = -1.0;

/// Everything the presenter needs to draw one frame.
///
/// Owned by the event loop thread; every mutation goes through `&mut self`,
/// so a reader never sees a selection paired with an index from another one.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    selection: Selection,
    frame_count: usize,
    frame_index: usize,
    last_load_percent: f32,
}

impl PlaybackState {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            frame_count: selection.frame_count(),
            frame_index: 0,
            last_load_percent: LOAD_SENTINEL,
        }
    }

    /// Advance one frame, wrapping at the frame count. No-op with zero frames.
    pub fn tick(&mut self) {
        if self.frame_count == 0 {
            return;
        }
        self.frame_index = (self.frame_index + 1) % self.frame_count;
    }

    /// Switch sprite sequence using the runner's nominal frame count.
    /// Always rewinds to frame 0, even when `selection` is unchanged.
    pub fn apply_selection(&mut self, selection: Selection) {
        self.apply_selection_with_frames(selection, selection.frame_count());
    }

    /// Switch sprite sequence when only `frames` of it could be loaded.
    pub fn apply_selection_with_frames(&mut self, selection: Selection, frames: usize) {
        self.selection = selection;
        self.frame_count = frames;
        self.frame_index = 0;
    }

    /// Store a sample result; failures overwrite with the sentinel.
    pub fn record_sample(&mut self, sample: Result<f32, SampleUnavailable>) {
        self.last_load_percent = match sample {
            Ok(percent) => percent,
            Err(_) => LOAD_SENTINEL,
        };
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Asset key of the frame currently shown.
    pub fn asset_key(&self) -> String {
        self.selection.asset_key(self.frame_index)
    }

    /// Last CPU percentage, or [`LOAD_SENTINEL`].
    pub fn last_load_percent(&self) -> f32 {
        self.last_load_percent
    }

    pub fn has_load(&self) -> bool {
        self.last_load_percent() >= 0.0
    }

    /// Tooltip text.
    pub fn load_text(&self) -> String {
        if self.has_load() {
            format!("CPU Usage: {:.1}%", self.last_load_percent())
        } else {
            "CPU Usage: --".to_string()
        }
    }
}
