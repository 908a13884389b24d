//! Reserved words of the circuit language.

use std::fmt;

/// Section headings. Matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    Devices,
    Connections,
    Monitor,
    /// Legacy section for initial switch levels and clock periods
    Init,
}

impl Heading {
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "devices" => Some(Self::Devices),
            "connections" => Some(Self::Connections),
            "monitor" => Some(Self::Monitor),
            "init" => Some(Self::Init),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::Connections => "connections",
            Self::Monitor => "monitor",
            Self::Init => "init",
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statement keywords. Matched exactly, lower case only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Are,
    Is,
    Have,
    Has,
    Set,
    To,
    Cycle,
    Device,
    Trace,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "are" => Some(Self::Are),
            "is" => Some(Self::Is),
            "have" => Some(Self::Have),
            "has" => Some(Self::Has),
            "set" => Some(Self::Set),
            "to" => Some(Self::To),
            "cycle" => Some(Self::Cycle),
            "device" => Some(Self::Device),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Are => "are",
            Self::Is => "is",
            Self::Have => "have",
            Self::Has => "has",
            Self::Set => "set",
            Self::To => "to",
            Self::Cycle => "cycle",
            Self::Device => "device",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Words that only make statements read like English. The scanner drops them.
pub const FILLER_WORDS: &[&str] = &[
    "gate",
    "gates",
    "a",
    "an",
    "some",
    "initially",
    "input",
    "inputs",
    "connected",
];

pub fn is_filler(word: &str) -> bool {
    FILLER_WORDS.contains(&word)
}
