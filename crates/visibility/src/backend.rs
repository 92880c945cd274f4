use std::collections::BTreeMap;

use crate::VisibilityError;
use crate::controller::{ElementId, ObserveOptions};
use crate::geometry::Rect;

/// One observation delivered by the host's intersection primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub element: ElementId,
    /// Visible fraction of the element, in `[0, 1]`.
    pub intersection_ratio: f32,
    pub is_intersecting: bool,
}

/// The host's viewport-intersection primitive.
pub trait IntersectionBackend {
    /// Begin delivering entries for `element`. Hosts without the primitive
    /// return [`VisibilityError::Unsupported`].
    fn observe(&mut self, element: ElementId, options: &ObserveOptions)
    -> Result<(), VisibilityError>;

    fn unobserve(&mut self, element: ElementId);
}

/// A host with no intersection primitive at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIntersection;

impl IntersectionBackend for NoIntersection {
    fn observe(&mut self, _: ElementId, _: &ObserveOptions) -> Result<(), VisibilityError> {
        Err(VisibilityError::Unsupported)
    }

    fn unobserve(&mut self, _: ElementId) {}
}

/// Software intersection primitive over document-space rectangles.
///
/// The viewport is a window of the document offset by the scroll position.
/// Used for headless scroll simulations and by hosts that know their own
/// layout (a desktop window is one element filling its viewport).
#[derive(Debug, Clone, Default)]
pub struct ViewportIntersector {
    viewport: Rect,
    scroll_y: f32,
    rects: BTreeMap<ElementId, Rect>,
    observed: BTreeMap<ElementId, ObserveOptions>,
}

impl ViewportIntersector {
    pub fn new(viewport: Rect) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    pub fn scroll_to(&mut self, scroll_y: f32) {
        self.scroll_y = scroll_y;
    }

    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    /// Place (or move) an element in document coordinates.
    pub fn set_element_rect(&mut self, element: ElementId, rect: Rect) {
        self.rects.insert(element, rect);
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Visible fraction of `element` for the current scroll position.
    pub fn ratio_of(&self, element: ElementId) -> Option<f32> {
        let options = self.observed.get(&element)?;
        let rect = self.rects.get(&element)?;
        let root = self
            .viewport
            .translate(0.0, self.scroll_y)
            .expand(&options.root_margin);
        let area = rect.area();
        let ratio = match root.intersection(rect) {
            Some(overlap) if area > 0.0 => (overlap.area() / area).clamp(0.0, 1.0),
            Some(_) => 1.0,
            None => 0.0,
        };
        Some(ratio)
    }

    /// Compute one entry per observed element with a known rectangle.
    pub fn take_entries(&mut self) -> Vec<IntersectionEntry> {
        self.observed
            .keys()
            .filter_map(|&element| {
                self.ratio_of(element).map(|ratio| IntersectionEntry {
                    element,
                    intersection_ratio: ratio,
                    is_intersecting: ratio > 0.0,
                })
            })
            .collect()
    }
}

impl IntersectionBackend for ViewportIntersector {
    fn observe(
        &mut self,
        element: ElementId,
        options: &ObserveOptions,
    ) -> Result<(), VisibilityError> {
        self.observed.insert(element, *options);
        Ok(())
    }

    fn unobserve(&mut self, element: ElementId) {
        self.observed.remove(&element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::RootMargin;

    fn observed(rect: Rect, options: ObserveOptions) -> ViewportIntersector {
        let mut vi = ViewportIntersector::new(Rect::new(0.0, 0.0, 1000.0, 800.0));
        vi.set_element_rect(ElementId(1), rect);
        vi.observe(ElementId(1), &options).unwrap();
        vi
    }

    #[test]
    fn fully_visible_element() {
        let vi = observed(Rect::new(0.0, 0.0, 100.0, 100.0), ObserveOptions::default());
        assert_eq!(vi.ratio_of(ElementId(1)), Some(1.0));
    }

    #[test]
    fn half_scrolled_element() {
        let mut vi = observed(Rect::new(0.0, 700.0, 100.0, 200.0), ObserveOptions::default());
        assert_eq!(vi.ratio_of(ElementId(1)), Some(0.5));
        vi.scroll_to(100.0);
        assert_eq!(vi.ratio_of(ElementId(1)), Some(1.0));
        vi.scroll_to(1000.0);
        assert_eq!(vi.ratio_of(ElementId(1)), Some(0.0));
    }

    #[test]
    fn root_margin_extends_viewport() {
        let opts = ObserveOptions {
            root_margin: RootMargin::uniform(100.0),
            ..ObserveOptions::default()
        };
        let vi = observed(Rect::new(0.0, 850.0, 100.0, 100.0), opts);
        assert_eq!(vi.ratio_of(ElementId(1)), Some(0.5));
    }

    #[test]
    fn unobserved_elements_produce_no_entries() {
        let mut vi = observed(Rect::new(0.0, 0.0, 10.0, 10.0), ObserveOptions::default());
        vi.set_element_rect(ElementId(2), Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(vi.take_entries().len(), 1);
        vi.unobserve(ElementId(1));
        assert!(vi.take_entries().is_empty());
    }

    #[test]
    fn no_intersection_is_unsupported() {
        let mut ni = NoIntersection;
        assert!(matches!(
            ni.observe(ElementId(1), &ObserveOptions::default()),
            Err(VisibilityError::Unsupported)
        ));
    }
}
