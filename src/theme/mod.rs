//! Mood taxonomy: the static catalog of mood options per theme.
//!
//! Built-in themes (`emoji`, `weather`) are fixed tables; `custom` themes
//! supply their options on the session itself. Mood ids that resolve to no
//! option degrade to a neutral placeholder rather than failing.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Which option catalog a session votes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    Emoji,
    Weather,
    Custom,
}

impl ThemeType {
    pub fn id(self) -> &'static str {
        match self {
            ThemeType::Emoji => "emoji",
            ThemeType::Weather => "weather",
            ThemeType::Custom => "custom",
        }
    }
}

impl std::fmt::Display for ThemeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// One selectable mood. `value` encodes sentiment polarity in `[0, 1]`,
/// 1.0 being the most positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodOption {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub value: f32,
}

impl MoodOption {
    fn new(id: &str, label: &str, icon: &str, value: f32) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            value,
        }
    }

    /// Neutral placeholder for mood ids that match no catalog entry.
    /// The raw id is preserved for display and counting.
    pub fn unknown(id: &str) -> Self {
        Self::new(id, "Unknown", "🤔", 0.5)
    }
}

pub static EMOJI_THEME: Lazy<Vec<MoodOption>> = Lazy::new(|| {
    vec![
        MoodOption::new("1", "Stoked", "🤩", 1.0),
        MoodOption::new("2", "Good", "🙂", 0.8),
        MoodOption::new("3", "Meh", "😐", 0.5),
        MoodOption::new("4", "Melting", "🫠", 0.3),
        MoodOption::new("5", "Mind Blown", "🤯", 0.2),
        MoodOption::new("6", "Sleeping", "😴", 0.1),
    ]
});

pub static WEATHER_THEME: Lazy<Vec<MoodOption>> = Lazy::new(|| {
    vec![
        MoodOption::new("w1", "Sunny", "☀️", 1.0),
        MoodOption::new("w2", "Partly Cloudy", "⛅", 0.7),
        MoodOption::new("w3", "Foggy", "🌫️", 0.4),
        MoodOption::new("w4", "Rainy", "🌧️", 0.3),
        MoodOption::new("w5", "Thunderstorm", "⛈️", 0.1),
        MoodOption::new("w6", "Snowy", "❄️", 0.5),
    ]
});

/// Resolve the option catalog for a theme. Custom themes draw from the
/// session-supplied list; a custom theme with no options is an empty catalog.
pub fn options_for(theme: ThemeType, custom: Option<&[MoodOption]>) -> &[MoodOption] {
    match theme {
        ThemeType::Emoji => EMOJI_THEME.as_slice(),
        ThemeType::Weather => WEATHER_THEME.as_slice(),
        ThemeType::Custom => custom.unwrap_or(&[]),
    }
}

/// Look up an option by id within a catalog.
pub fn find<'a>(options: &'a [MoodOption], id: &str) -> Option<&'a MoodOption> {
    options.iter().find(|o| o.id == id)
}
