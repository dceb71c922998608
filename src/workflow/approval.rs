use super::Facet;

/// Per-facet approval flags guarding the publish action.
///
/// A facet only becomes approved through [`ApprovalGate::approve`]; any
/// content replacement revokes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalGate {
    text: bool,
    image: bool,
    headline: bool,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn approve(&mut self, facet: Facet) {
        *self.slot(facet) = true;
    }

    pub fn revoke(&mut self, facet: Facet) {
        *self.slot(facet) = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_approved(&self, facet: Facet) -> bool {
        match facet {
            Facet::Text => self.text,
            Facet::Image => self.image,
            Facet::Headline => self.headline,
        }
    }

    pub fn is_fully_approved(&self) -> bool {
        self.text && self.image && self.headline
    }

    /// Facets still waiting for approval, in display order.
    pub fn missing(&self) -> Vec<Facet> {
        Facet::ALL
            .into_iter()
            .filter(|facet| !self.is_approved(*facet))
            .collect()
    }

    fn slot(&mut self, facet: Facet) -> &mut bool {
        match facet {
            Facet::Text => &mut self.text,
            Facet::Image => &mut self.image,
            Facet::Headline => &mut self.headline,
        }
    }
}
