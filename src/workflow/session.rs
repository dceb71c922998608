use super::{ApprovalGate, Facet};
use crate::remote::{FacetUpdate, GeneratedContent};
use chrono::{DateTime, Utc};

/// How a facet's current value came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Origin {
    Generated,
    Regenerated,
}

/// The generated post currently under review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentArtifact {
    pub topic: String,
    pub text: String,
    /// Opaque locator (URL or data URI) for the rendered image.
    pub image: String,
    pub headline: String,
    pub text_origin: Origin,
    pub image_origin: Origin,
    pub headline_origin: Origin,
    pub generated_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentArtifact {
    pub fn from_generated(topic: &str, content: GeneratedContent) -> Self {
        let now = Utc::now();
        Self {
            topic: topic.to_string(),
            text: content.text,
            image: content.image,
            headline: content.headline,
            text_origin: Origin::Generated,
            image_origin: Origin::Generated,
            headline_origin: Origin::Generated,
            generated_at: now,
            updated_at: now,
        }
    }

    pub fn value(&self, facet: Facet) -> &str {
        match facet {
            Facet::Text => &self.text,
            Facet::Image => &self.image,
            Facet::Headline => &self.headline,
        }
    }

    pub fn origin(&self, facet: Facet) -> Origin {
        match facet {
            Facet::Text => self.text_origin,
            Facet::Image => self.image_origin,
            Facet::Headline => self.headline_origin,
        }
    }

    fn replace(&mut self, facet: Facet, value: String) {
        match facet {
            Facet::Text => {
                self.text = value;
                self.text_origin = Origin::Regenerated;
            }
            Facet::Image => {
                self.image = value;
                self.image_origin = Origin::Regenerated;
            }
            Facet::Headline => {
                self.headline = value;
                self.headline_origin = Origin::Regenerated;
            }
        }
        self.updated_at = Utc::now();
    }
}

/// Editable state of one publish session: the artifact and its approvals.
#[derive(Debug, Default)]
pub struct ContentSession {
    artifact: Option<ContentArtifact>,
    approvals: ApprovalGate,
}

impl ContentSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn artifact(&self) -> Option<&ContentArtifact> {
        self.artifact.as_ref()
    }

    pub fn approvals(&self) -> &ApprovalGate {
        &self.approvals
    }

    pub fn approve(&mut self, facet: Facet) {
        self.approvals.approve(facet);
    }

    /// Starts a new generation cycle: approvals are cleared before the remote
    /// call so a failed generation never leaves stale approvals behind.
    pub fn begin_generation(&mut self) {
        self.approvals.reset();
    }

    /// Stores a freshly generated artifact, discarding any previous one.
    pub fn install(&mut self, artifact: ContentArtifact) {
        self.approvals.reset();
        self.artifact = Some(artifact);
    }

    /// Applies a single-facet regeneration and revokes that facet's approval.
    ///
    /// Returns every field that changed. A headline update also carries the
    /// re-rendered image, which replaces the image value but leaves the image
    /// approval alone.
    pub fn apply_regeneration(
        &mut self,
        facet: Facet,
        update: FacetUpdate,
    ) -> Option<Vec<(Facet, String)>> {
        let artifact = self.artifact.as_mut()?;
        let mut changed = Vec::with_capacity(2);

        match (facet, update) {
            (Facet::Text, FacetUpdate::Text { text }) => {
                artifact.replace(Facet::Text, text.clone());
                changed.push((Facet::Text, text));
            }
            (Facet::Image, FacetUpdate::Image { image }) => {
                artifact.replace(Facet::Image, image.clone());
                changed.push((Facet::Image, image));
            }
            (Facet::Headline, FacetUpdate::Headline { headline, image }) => {
                artifact.replace(Facet::Headline, headline.clone());
                artifact.replace(Facet::Image, image.clone());
                changed.push((Facet::Headline, headline));
                changed.push((Facet::Image, image));
            }
            _ => return None,
        }

        self.approvals.revoke(facet);
        Some(changed)
    }

    /// Drops the artifact and every approval.
    pub fn clear(&mut self) {
        self.artifact = None;
        self.approvals.reset();
    }
}
