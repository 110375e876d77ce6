pub mod sheet;

pub use sheet::SpriteSheet;

/// Which animal runs in the tray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Runner {
    Cat,
    Parrot,
    Horse,
}

impl Runner {
    pub const ALL: [Runner; 3] = [Runner::Cat, Runner::Parrot, Runner::Horse];

    /// Lowercase name used in asset keys.
    pub fn name(self) -> &'static str {
        match self {
            Runner::Cat => "cat",
            Runner::Parrot => "parrot",
            Runner::Horse => "horse",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Runner::Cat => "Cat",
            Runner::Parrot => "Parrot",
            Runner::Horse => "Horse",
        }
    }

    /// Number of sprite frames shipped for this runner (same for every theme).
    pub fn frame_count(self) -> usize {
        match self {
            Runner::Cat => 5,
            Runner::Parrot => 10,
            Runner::Horse => 14,
        }
    }
}

/// Sprite color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub const ALL: [Theme; 2] = [Theme::Light, Theme::Dark];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }
}

/// The (runner, theme) pair that picks a sprite sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selection {
    pub runner: Runner,
    pub theme: Theme,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(Runner::Cat, Theme::Light)
    }
}

impl Selection {
    pub fn new(runner: Runner, theme: Theme) -> Self {
        Self { runner, theme }
    }

    pub fn with_runner(self, runner: Runner) -> Self {
        Self { runner, ..self }
    }

    pub fn with_theme(self, theme: Theme) -> Self {
        Self { theme, ..self }
    }

    pub fn frame_count(self) -> usize {
        self.runner.frame_count()
    }

    /// Asset name for one frame, e.g. `light_cat_0`.
    pub fn asset_key(self, index: usize) -> String {
        format!("{}_{}_{}", self.theme.name(), self.runner.name(), index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_counts_per_runner() {
        assert_eq!(Runner::Cat.frame_count(), 5);
        assert_eq!(Runner::Parrot.frame_count(), 10);
        assert_eq!(Runner::Horse.frame_count(), 14);
        // Theme doesn't matter.
        let dark = Selection::new(Runner::Parrot, Theme::Dark);
        assert_eq!(dark.frame_count(), dark.with_theme(Theme::Light).frame_count());
    }

    #[test]
    fn asset_key_format() {
        assert_eq!(Selection::default().asset_key(0), "light_cat_0");
        assert_eq!(
            Selection::new(Runner::Horse, Theme::Dark).asset_key(13),
            "dark_horse_13"
        );
    }

    #[test]
    fn default_is_light_cat() {
        assert_eq!(Selection::default(), Selection::new(Runner::Cat, Theme::Light));
    }
}
