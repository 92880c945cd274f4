use driftfield_profile::Environment;

/// The one place the reduced-motion preference is consulted.
///
/// The orchestrator asks the gate before building any effect; effect
/// constructors themselves never check the preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionGate {
    reduced_motion: bool,
}

impl Default for MotionGate {
    fn default() -> Self {
        Self::allow()
    }
}

impl MotionGate {
    pub const fn allow() -> Self {
        Self {
            reduced_motion: false,
        }
    }

    pub const fn reduced() -> Self {
        Self {
            reduced_motion: true,
        }
    }

    pub fn from_environment(env: &impl Environment) -> Self {
        Self {
            reduced_motion: env.prefers_reduced_motion(),
        }
    }

    pub fn allows_motion(&self) -> bool {
        !self.reduced_motion
    }

    /// Run `build` only when motion is allowed.
    pub fn run<T>(&self, build: impl FnOnce() -> T) -> Option<T> {
        if self.allows_motion() {
            Some(build())
        } else {
            tracing::trace!("reduced motion, effect skipped");
            None
        }
    }
}
