//! The place the user is searching around.
//!
//! The label and the coordinate are only trusted together. A query is
//! either [`PlaceQuery::Resolved`] (both set at once, by a suggestion, by
//! geolocation or by typed coordinates) or [`PlaceQuery::Unresolved`]
//! (free text only). Editing the label by hand always drops back to
//! `Unresolved`: once the text no longer names the picked place, the old
//! coordinate is not kept around.

use alertx_geo_models::Coordinate;

#[derive(Debug, Clone, PartialEq)]
pub enum PlaceQuery {
    /// Free text with no coordinate behind it.
    Unresolved { label: String },
    /// A label and the coordinate it was resolved to.
    Resolved { label: String, coordinate: Coordinate },
}

impl Default for PlaceQuery {
    fn default() -> Self {
        Self::Unresolved {
            label: String::new(),
        }
    }
}

impl PlaceQuery {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Unresolved { label } | Self::Resolved { label, .. } => label,
        }
    }

    #[must_use]
    pub const fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Self::Unresolved { .. } => None,
            Self::Resolved { coordinate, .. } => Some(*coordinate),
        }
    }

    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    /// Applies a keystroke-level edit of the label.
    pub fn edit_label(&mut self, text: &str) {
        *self = Self::Unresolved {
            label: text.to_string(),
        };
    }

    /// Sets label and coordinate together.
    pub fn resolve(&mut self, label: impl Into<String>, coordinate: Coordinate) {
        *self = Self::Resolved {
            label: label.into(),
            coordinate,
        };
    }

    /// Pins the current label to an explicitly entered coordinate.
    pub fn pin(&mut self, coordinate: Coordinate) {
        let label = std::mem::take(match self {
            Self::Unresolved { label } | Self::Resolved { label, .. } => label,
        });
        *self = Self::Resolved { label, coordinate };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chennai() -> Coordinate {
        Coordinate::new(13.0827, 80.2707).unwrap()
    }

    #[test]
    fn starts_empty_and_unresolved() {
        let q = PlaceQuery::default();
        assert_eq!(q.label(), "");
        assert!(q.coordinate().is_none());
    }

    #[test]
    fn editing_a_resolved_label_drops_the_coordinate() {
        let mut q = PlaceQuery::default();
        q.resolve("Chennai", chennai());
        assert!(q.is_resolved());

        q.edit_label("Chennai Central");
        assert_eq!(q.label(), "Chennai Central");
        assert!(q.coordinate().is_none());
    }

    #[test]
    fn pin_keeps_label() {
        let mut q = PlaceQuery::default();
        q.edit_label("Office");
        q.pin(chennai());
        assert_eq!(q.label(), "Office");
        assert_eq!(q.coordinate(), Some(chennai()));
    }
}
