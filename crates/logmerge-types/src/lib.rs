//! Shared types for logmerge
//!
//! This crate contains the record model, the component configuration
//! schema, and the color palette used across the logmerge crates.

use chrono::{DateTime, Utc};
use ratatui::style::Color;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

mod styled;

pub use styled::{StyledRun, StyledText};

/// Canonical point in time carried by every record.
///
/// Naive source timestamps are resolved to an offset at parse time, so all
/// instants are zone-aware and totally ordered.
pub type Instant = DateTime<Utc>;

// ============================================================================
// Component Configuration
// ============================================================================

/// Parsing and display rules for one logical log producer
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct ComponentConfig {
    /// Regex matched against the bare file name
    #[serde(rename = "filePattern", alias = "fileNamePattern", default)]
    pub file_name_pattern: String,

    /// Regex with named groups, one of them `timestamp`
    #[serde(rename = "lineFormat", default)]
    pub line_format: String,

    /// Fields joined with spaces to build the displayed message
    #[serde(
        rename = "show",
        alias = "displayFields",
        default,
        deserialize_with = "null_as_default"
    )]
    pub display_fields: Vec<String>,

    /// Highlight rules, applied in order
    #[serde(
        rename = "patterns",
        alias = "highlightRules",
        default,
        deserialize_with = "null_as_default"
    )]
    pub highlight_rules: Vec<HighlightRule>,
}

/// A regex plus the color(s) used to style its matches
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct HighlightRule {
    pub regex: String,

    #[serde(default)]
    pub color: Option<String>,

    /// Color the whole message once the regex matches anywhere
    #[serde(rename = "highlightLine", alias = "highlightWholeLine", default)]
    pub highlight_whole_line: bool,

    /// Sub-group colors, in document order
    #[serde(default, deserialize_with = "group_list")]
    pub groups: Vec<(GroupRef, Option<String>)>,
}

/// Reference to a capture group inside a highlight regex
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupRef {
    /// Regex group number; 0 is the whole match
    Index(usize),
    Name(String),
}

impl From<&str> for GroupRef {
    fn from(s: &str) -> Self {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(idx) = s.parse() {
                return Self::Index(idx);
            }
        }
        Self::Name(s.to_string())
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(idx) => write!(f, "{}", idx),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

impl<'de> Deserialize<'de> for GroupRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct GroupRefVisitor;

        impl Visitor<'_> for GroupRefVisitor {
            type Value = GroupRef;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a group number or group name")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<GroupRef, E> {
                Ok(usize::try_from(v)
                    .map(GroupRef::Index)
                    .unwrap_or_else(|_| GroupRef::Name(v.to_string())))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<GroupRef, E> {
                // Negative numbers never name a group; keep them so they are skipped at match time
                Ok(usize::try_from(v)
                    .map(GroupRef::Index)
                    .unwrap_or_else(|_| GroupRef::Name(v.to_string())))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<GroupRef, E> {
                Ok(GroupRef::from(v))
            }
        }

        deserializer.deserialize_any(GroupRefVisitor)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a `groups` mapping into an ordered list
fn group_list<'de, D>(deserializer: D) -> Result<Vec<(GroupRef, Option<String>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupListVisitor;

    impl<'de> Visitor<'de> for GroupListVisitor {
        type Value = Vec<(GroupRef, Option<String>)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of group references to colors")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((group, color)) = map.next_entry::<GroupRef, Option<String>>()? {
                groups.push((group, color));
            }
            Ok(groups)
        }
    }

    deserializer.deserialize_any(GroupListVisitor)
}

// ============================================================================
// Log Types
// ============================================================================

/// One parsed line, with provenance
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LogRecord {
    pub timestamp: Instant,

    /// First directory level under the root
    pub store: String,

    /// Second directory level under the root
    pub controller: String,

    /// Name of the component whose file pattern claimed the file
    pub component: String,

    /// Display fields joined with spaces
    pub message: String,

    /// Original line, used by the raw-line filter
    pub raw: String,
}

impl LogRecord {
    /// `store/controller` label used in headers
    pub fn source(&self) -> String {
        format!("{}/{}", self.store, self.controller)
    }
}

// ============================================================================
// Colors
// ============================================================================

/// Color used when a rule gives no color
pub const DEFAULT_COLOR: &str = "white";

/// Localized color names and their canonical equivalents
pub const COLOR_ALIASES: &[(&str, &str)] = &[
    ("rojo", "red"),
    ("verde", "green"),
    ("amarillo", "yellow"),
    ("azul", "blue"),
    ("magenta", "magenta"),
    ("cian", "cyan"),
    ("blanco", "white"),
    ("negro", "black"),
    ("gris", "gray"),
];

/// Map a configured color identifier to its canonical name.
///
/// Unknown names pass through lowercased; empty or absent names resolve to
/// [`DEFAULT_COLOR`].
pub fn resolve_color(name: Option<&str>) -> String {
    let name = match name.map(str::trim) {
        Some(n) if !n.is_empty() => n.to_lowercase(),
        _ => return DEFAULT_COLOR.to_string(),
    };
    COLOR_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(name)
}

/// Terminal color for a canonical color name
pub fn palette_color(canonical: &str) -> Option<Color> {
    let color = match canonical {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "bright_black" | "dark_gray" | "dark_grey" => Color::DarkGray,
        "bright_red" | "light_red" => Color::LightRed,
        "bright_green" | "light_green" => Color::LightGreen,
        "bright_yellow" | "light_yellow" => Color::LightYellow,
        "bright_blue" | "light_blue" => Color::LightBlue,
        "bright_magenta" | "light_magenta" => Color::LightMagenta,
        "bright_cyan" | "light_cyan" => Color::LightCyan,
        "bright_white" => Color::White,
        hex if hex.len() == 7 && hex.is_ascii() && hex.starts_with('#') => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Color::Rgb(channel(1)?, channel(3)?, channel(5)?)
        }
        _ => return None,
    };
    Some(color)
}

/// Canonical name for a terminal color (inverse of [`palette_color`])
pub fn color_name(color: Color) -> String {
    match color {
        Color::Reset => "default".to_string(),
        Color::Black => "black".to_string(),
        Color::Red => "red".to_string(),
        Color::Green => "green".to_string(),
        Color::Yellow => "yellow".to_string(),
        Color::Blue => "blue".to_string(),
        Color::Magenta => "magenta".to_string(),
        Color::Cyan => "cyan".to_string(),
        Color::Gray => "gray".to_string(),
        Color::DarkGray => "bright_black".to_string(),
        Color::LightRed => "bright_red".to_string(),
        Color::LightGreen => "bright_green".to_string(),
        Color::LightYellow => "bright_yellow".to_string(),
        Color::LightBlue => "bright_blue".to_string(),
        Color::LightMagenta => "bright_magenta".to_string(),
        Color::LightCyan => "bright_cyan".to_string(),
        Color::White => "white".to_string(),
        Color::Rgb(r, g, b) => format!("#{:02x}{:02x}{:02x}", r, g, b),
        Color::Indexed(i) => format!("color({})", i),
    }
}
