//! ChatMessage - chat source output
//!
//! The chat client itself is an external collaborator; these are the values it hands over.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Viewer badge attached to a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Subscriber,
    GiftSub,
    Bits,
    Broadcaster,
    Moderator,
    Verified,
    Artist,
}

impl FromStr for Badge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sub" | "subscriber" => Ok(Self::Subscriber),
            "gift_sub" | "sub-gifter" | "sub_gifter" => Ok(Self::GiftSub),
            "bits" => Ok(Self::Bits),
            "broadcaster" => Ok(Self::Broadcaster),
            "mod" | "moderator" => Ok(Self::Moderator),
            "verified" | "partner" => Ok(Self::Verified),
            "artist" | "artist-badge" => Ok(Self::Artist),
            other => Err(format!("unknown badge '{other}'")),
        }
    }
}

/// One incoming chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the sender
    pub author: String,

    /// Message text
    pub content: String,

    /// Badges of the sender, in display order
    #[serde(default)]
    pub badges: Vec<Badge>,

    /// Message was sent by the relay itself
    #[serde(default)]
    pub echo: bool,
}

impl ChatMessage {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
            badges: Vec::new(),
            echo: false,
        }
    }

    pub fn with_badges(mut self, badges: Vec<Badge>) -> Self {
        self.badges = badges;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_aliases() {
        assert_eq!("mod".parse::<Badge>(), Ok(Badge::Moderator));
        assert_eq!(" Subscriber ".parse::<Badge>(), Ok(Badge::Subscriber));
        assert!("vip".parse::<Badge>().is_err());
    }
}
