use serde::{Deserialize, Serialize};

/// One of the independently generated and approved pieces of a post.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Facet {
    Text,
    Image,
    Headline,
}

impl Facet {
    pub const ALL: [Facet; 3] = [Facet::Text, Facet::Image, Facet::Headline];

    /// Capitalized label used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Image => "Image",
            Self::Headline => "Headline",
        }
    }
}
