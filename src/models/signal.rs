use serde::{Deserialize, Serialize};
use std::fmt;

/// Result bucket of the DeMark scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bucket {
    /// Up-count exhaustion (potential sell)
    Tops,
    /// Down-count exhaustion (potential buy)
    Bottoms,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Tops => "Tops",
            Bucket::Bottoms => "Bottoms",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label emitted for a DeMark match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalLabel {
    #[serde(rename = "DM9 Top")]
    Dm9Top,
    #[serde(rename = "DM13 Top")]
    Dm13Top,
    #[serde(rename = "DM9 Bot")]
    Dm9Bot,
    #[serde(rename = "DM13 Bot")]
    Dm13Bot,
}

impl SignalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::Dm9Top => "DM9 Top",
            SignalLabel::Dm13Top => "DM13 Top",
            SignalLabel::Dm9Bot => "DM9 Bot",
            SignalLabel::Dm13Bot => "DM13 Bot",
        }
    }

    pub fn bucket(&self) -> Bucket {
        match self {
            SignalLabel::Dm9Top | SignalLabel::Dm13Top => Bucket::Tops,
            SignalLabel::Dm9Bot | SignalLabel::Dm13Bot => Bucket::Bottoms,
        }
    }
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DeMark flags for the final bar of one series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeMarkFlags {
    pub dm9_top: bool,
    pub dm13_top: bool,
    pub dm9_bot: bool,
    pub dm13_bot: bool,
}

impl DeMarkFlags {
    /// All four flags false
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !(self.dm9_top || self.dm13_top || self.dm9_bot || self.dm13_bot)
    }

    /// Label for the Tops bucket; 13 takes priority over 9
    pub fn top_label(&self) -> Option<SignalLabel> {
        if self.dm13_top {
            Some(SignalLabel::Dm13Top)
        } else if self.dm9_top {
            Some(SignalLabel::Dm9Top)
        } else {
            None
        }
    }

    /// Label for the Bottoms bucket; 13 takes priority over 9
    pub fn bottom_label(&self) -> Option<SignalLabel> {
        if self.dm13_bot {
            Some(SignalLabel::Dm13Bot)
        } else if self.dm9_bot {
            Some(SignalLabel::Dm9Bot)
        } else {
            None
        }
    }

    /// Labels to emit, tops first
    pub fn labels(&self) -> Vec<SignalLabel> {
        self.top_label().into_iter().chain(self.bottom_label()).collect()
    }
}

/// A ticker whose final bar completed a DeMark 9 or 13 count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMatch {
    pub ticker: String,
    pub last_close: f64,
    pub signal: SignalLabel,
    pub industry: String,
}

/// A ticker passing the Wyckoff breakout-with-momentum test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WyckoffMatch {
    pub ticker: String,
    pub last_close: f64,
    pub sector: String,
    pub industry: String,
    /// Close-to-close change of the final bar, in percent
    pub percent_change: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirteen_takes_priority() {
        let flags = DeMarkFlags {
            dm9_top: true,
            dm13_top: true,
            ..DeMarkFlags::none()
        };
        assert_eq!(flags.top_label(), Some(SignalLabel::Dm13Top));
        assert_eq!(flags.bottom_label(), None);
    }

    #[test]
    fn test_labels_and_buckets() {
        let flags = DeMarkFlags {
            dm9_bot: true,
            ..DeMarkFlags::none()
        };
        assert_eq!(flags.labels(), vec![SignalLabel::Dm9Bot]);
        assert_eq!(SignalLabel::Dm9Bot.bucket(), Bucket::Bottoms);
        assert_eq!(SignalLabel::Dm13Top.bucket(), Bucket::Tops);
        assert_eq!(SignalLabel::Dm13Bot.to_string(), "DM13 Bot");
        assert!(DeMarkFlags::none().is_empty());
        assert!(!flags.is_empty());
    }
}
