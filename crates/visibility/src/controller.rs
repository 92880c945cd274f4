use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::VisibilityError;
use crate::backend::{IntersectionBackend, IntersectionEntry};
use crate::geometry::RootMargin;

/// Identifier of an observed element, assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// Per-element observation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveOptions {
    /// Minimum visible fraction of the element to count as in view.
    pub threshold: f32,
    /// Margin applied to the viewport before intersecting.
    pub root_margin: RootMargin,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: RootMargin::default(),
        }
    }
}

/// Read-only, cloneable view of one element's `is_in_view` state.
#[derive(Debug, Clone, Default)]
pub struct VisibilitySignal(Rc<Cell<bool>>);

impl VisibilitySignal {
    /// A signal that is permanently in view, for consumers with no observer.
    pub fn always_visible() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_in_view(&self) -> bool {
        self.0.get()
    }

    fn set(&self, visible: bool) {
        self.0.set(visible);
    }
}

type Callback = Box<dyn FnMut(ElementId)>;

/// Optional transition callbacks for one element.
#[derive(Default)]
pub struct VisibilityCallbacks {
    on_visible: Option<Callback>,
    on_hidden: Option<Callback>,
}

impl VisibilityCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_visible(mut self, f: impl FnMut(ElementId) + 'static) -> Self {
        self.on_visible = Some(Box::new(f));
        self
    }

    pub fn on_hidden(mut self, f: impl FnMut(ElementId) + 'static) -> Self {
        self.on_hidden = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for VisibilityCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityCallbacks")
            .field("on_visible", &self.on_visible.is_some())
            .field("on_hidden", &self.on_hidden.is_some())
            .finish()
    }
}

/// One visibility edge reported by [`VisibilityController::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub element: ElementId,
    pub visible: bool,
}

struct Tracked {
    options: ObserveOptions,
    signal: VisibilitySignal,
    callbacks: VisibilityCallbacks,
    /// The backend could not observe this element; it stays visible forever.
    degraded: bool,
}

impl Tracked {
    fn apply(&mut self, element: ElementId, visible: bool) -> Option<Transition> {
        if self.signal.is_in_view() == visible {
            return None;
        }
        self.signal.set(visible);
        let callback = if visible {
            self.callbacks.on_visible.as_mut()
        } else {
            self.callbacks.on_hidden.as_mut()
        };
        if let Some(cb) = callback {
            cb(element);
        }
        Some(Transition { element, visible })
    }
}

/// Tracks viewport presence for many elements over one shared backend.
///
/// Signals start hidden and change only when an intersection entry crosses
/// the element's threshold; callbacks fire on those edges only. Elements the
/// backend cannot observe degrade to permanently visible.
pub struct VisibilityController<B> {
    backend: B,
    tracked: BTreeMap<ElementId, Tracked>,
}

impl<B: IntersectionBackend> VisibilityController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            tracked: BTreeMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Number of elements currently observed (degraded ones included).
    pub fn observed_count(&self) -> usize {
        self.tracked.len()
    }

    /// Start observing `element`. Returns the signal consumers read.
    pub fn observe(
        &mut self,
        element: ElementId,
        options: ObserveOptions,
        callbacks: VisibilityCallbacks,
    ) -> Result<VisibilitySignal, VisibilityError> {
        if self.tracked.contains_key(&element) {
            return Err(VisibilityError::AlreadyObserved(element));
        }
        if !(0.0..=1.0).contains(&options.threshold) {
            return Err(VisibilityError::InvalidThreshold(options.threshold));
        }

        let signal = VisibilitySignal::default();
        let mut tracked = Tracked {
            options,
            signal: signal.clone(),
            callbacks,
            degraded: false,
        };

        match self.backend.observe(element, &options) {
            Ok(()) => {
                tracing::debug!(?element, threshold = options.threshold, "observing element");
            }
            Err(VisibilityError::Unsupported) => {
                tracing::debug!(?element, "intersection unsupported, treating element as visible");
                tracked.degraded = true;
                tracked.apply(element, true);
            }
            Err(e) => return Err(e),
        }

        self.tracked.insert(element, tracked);
        Ok(signal)
    }

    /// Feed a batch of entries from the backend. Returns the transitions, in
    /// entry order, after firing their callbacks.
    pub fn process(&mut self, entries: &[IntersectionEntry]) -> Vec<Transition> {
        let mut transitions = Vec::new();
        for entry in entries {
            let Some(tracked) = self.tracked.get_mut(&entry.element) else {
                tracing::trace!(element = ?entry.element, "entry for unobserved element");
                continue;
            };
            if tracked.degraded {
                continue;
            }
            let visible =
                entry.is_intersecting && entry.intersection_ratio >= tracked.options.threshold;
            if let Some(t) = tracked.apply(entry.element, visible) {
                tracing::debug!(element = ?t.element, visible = t.visible, "visibility changed");
                transitions.push(t);
            }
        }
        transitions
    }

    /// Stop observing one element. Its signal keeps its last value.
    pub fn unobserve(&mut self, element: ElementId) -> bool {
        match self.tracked.remove(&element) {
            Some(t) => {
                if !t.degraded {
                    self.backend.unobserve(element);
                }
                true
            }
            None => false,
        }
    }

    /// Stop observing everything.
    pub fn disconnect(&mut self) {
        let ids: Vec<ElementId> = self.tracked.keys().copied().collect();
        for id in ids {
            self.unobserve(id);
        }
    }
}

impl<B> std::fmt::Debug for VisibilityController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityController")
            .field("observed", &self.tracked.len())
            .finish()
    }
}
