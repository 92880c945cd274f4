use std::collections::BTreeMap;

use driftfield_visibility::ElementId;
use serde::{Deserialize, Serialize};

use crate::MotionError;

/// An animatable property of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    Opacity,
    /// Horizontal offset in pixels.
    X,
    /// Vertical offset in pixels, positive down.
    Y,
    Scale,
    /// Rotation in degrees.
    Rotation,
    /// Glow intensity in `[0, 1]`.
    Glow,
}

/// What an effect animates, before resolution to concrete elements.
///
/// Written in files as a one-key map (`{ selector: .hero }`,
/// `{ element: 3 }`, `{ collection: [1, 2] }`) or as a bare selector string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TargetRepr", into = "TargetMap")]
pub enum AnimatableTarget {
    /// Every element the host matches for a selector string.
    Selector(String),
    Element(ElementId),
    /// An explicit list, animated in list order.
    Collection(Vec<ElementId>),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    element: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection: Option<Vec<ElementId>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TargetRepr {
    Selector(String),
    Map(TargetMap),
}

impl TryFrom<TargetRepr> for AnimatableTarget {
    type Error = MotionError;

    fn try_from(repr: TargetRepr) -> Result<Self, Self::Error> {
        let map = match repr {
            TargetRepr::Selector(s) => return Ok(Self::Selector(s)),
            TargetRepr::Map(map) => map,
        };
        match (map.selector, map.element, map.collection) {
            (Some(s), None, None) => Ok(Self::Selector(s)),
            (None, Some(id), None) => Ok(Self::Element(id)),
            (None, None, Some(ids)) => Ok(Self::Collection(ids)),
            _ => Err(MotionError::InvalidTarget(
                "expected exactly one of selector, element, collection",
            )),
        }
    }
}

impl From<AnimatableTarget> for TargetMap {
    fn from(target: AnimatableTarget) -> Self {
        match target {
            AnimatableTarget::Selector(s) => Self {
                selector: Some(s),
                ..Self::default()
            },
            AnimatableTarget::Element(id) => Self {
                element: Some(id),
                ..Self::default()
            },
            AnimatableTarget::Collection(ids) => Self {
                collection: Some(ids),
                ..Self::default()
            },
        }
    }
}

impl AnimatableTarget {
    /// Normalize to a list of elements, in order, without duplicates.
    pub fn resolve(&self, resolver: &impl TargetResolver) -> Vec<ElementId> {
        let raw = match self {
            Self::Selector(s) => resolver.resolve_selector(s),
            Self::Element(id) => vec![*id],
            Self::Collection(ids) => ids.clone(),
        };
        let mut seen = std::collections::BTreeSet::new();
        raw.into_iter().filter(|id| seen.insert(*id)).collect()
    }
}

impl From<ElementId> for AnimatableTarget {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<&str> for AnimatableTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<Vec<ElementId>> for AnimatableTarget {
    fn from(ids: Vec<ElementId>) -> Self {
        Self::Collection(ids)
    }
}

/// Host lookup from selector strings to elements.
pub trait TargetResolver {
    fn resolve_selector(&self, selector: &str) -> Vec<ElementId>;
}

/// Receives interpolated property values.
pub trait PropertySink {
    fn set_property(&mut self, element: ElementId, property: Property, value: f32);
}

/// In-memory element registry and property values for headless hosts.
#[derive(Debug, Clone, Default)]
pub struct PropertyStore {
    selectors: BTreeMap<String, Vec<ElementId>>,
    values: BTreeMap<(ElementId, Property), f32>,
    writes: u64,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `selector` match `elements`, replacing any previous match.
    pub fn register(&mut self, selector: impl Into<String>, elements: Vec<ElementId>) {
        self.selectors.insert(selector.into(), elements);
    }

    pub fn get(&self, element: ElementId, property: Property) -> Option<f32> {
        self.values.get(&(element, property)).copied()
    }

    /// Total property writes received.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Current values of one element, by property.
    pub fn element_values(&self, element: ElementId) -> BTreeMap<Property, f32> {
        self.values
            .range((element, Property::Opacity)..=(element, Property::Glow))
            .map(|(&(_, p), &v)| (p, v))
            .collect()
    }
}

impl TargetResolver for PropertyStore {
    fn resolve_selector(&self, selector: &str) -> Vec<ElementId> {
        self.selectors.get(selector).cloned().unwrap_or_default()
    }
}

impl PropertySink for PropertyStore {
    fn set_property(&mut self, element: ElementId, property: Property, value: f32) {
        self.values.insert((element, property), value);
        self.writes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PropertyStore {
        let mut s = PropertyStore::new();
        s.register(".card", vec![ElementId(3), ElementId(1), ElementId(3)]);
        s
    }

    #[test]
    fn selector_resolves_in_order_without_duplicates() {
        let ids = AnimatableTarget::from(".card").resolve(&store());
        assert_eq!(ids, vec![ElementId(3), ElementId(1)]);
    }

    #[test]
    fn unknown_selector_resolves_to_nothing() {
        assert!(AnimatableTarget::from(".missing").resolve(&store()).is_empty());
    }

    #[test]
    fn element_and_collection_pass_through() {
        let s = store();
        assert_eq!(
            AnimatableTarget::from(ElementId(9)).resolve(&s),
            vec![ElementId(9)]
        );
        assert_eq!(
            AnimatableTarget::from(vec![ElementId(2), ElementId(5)]).resolve(&s),
            vec![ElementId(2), ElementId(5)]
        );
    }

    #[test]
    fn store_records_values_per_element() {
        let mut s = PropertyStore::new();
        s.set_property(ElementId(1), Property::Opacity, 0.5);
        s.set_property(ElementId(1), Property::Y, 10.0);
        s.set_property(ElementId(2), Property::Y, -4.0);
        assert_eq!(s.get(ElementId(1), Property::Y), Some(10.0));
        assert_eq!(s.element_values(ElementId(1)).len(), 2);
        assert_eq!(s.writes(), 3);
    }

    #[test]
    fn targets_deserialize() {
        let t: AnimatableTarget = serde_yaml::from_str("selector: .hero").unwrap();
        assert_eq!(t, AnimatableTarget::Selector(".hero".into()));
        let t: AnimatableTarget = serde_yaml::from_str("collection: [1, 2]").unwrap();
        assert_eq!(t, AnimatableTarget::Collection(vec![ElementId(1), ElementId(2)]));
        let t: AnimatableTarget = serde_yaml::from_str("{ element: 4 }").unwrap();
        assert_eq!(t, AnimatableTarget::Element(ElementId(4)));
        let t: AnimatableTarget = serde_yaml::from_str(".cta").unwrap();
        assert_eq!(t, AnimatableTarget::Selector(".cta".into()));
    }

    #[test]
    fn targets_reject_ambiguous_maps() {
        for bad in ["{ selector: .a, element: 1 }", "{}", "{ id: 3 }"] {
            assert!(
                serde_yaml::from_str::<AnimatableTarget>(bad).is_err(),
                "accepted: {bad}"
            );
        }
    }

    #[test]
    fn targets_serialize_as_maps() {
        let yaml = serde_yaml::to_string(&AnimatableTarget::Element(ElementId(7))).unwrap();
        assert_eq!(yaml.trim(), "element: 7");
        let back: AnimatableTarget = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, AnimatableTarget::Element(ElementId(7)));
    }
}
