//! Timer scheduling trait

/// What a timer callback wants next
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wake {
    /// Call again at this monotonic time (seconds)
    Reschedule(f64),
    /// Never call again
    Stop,
}

impl Wake {
    /// Due time, if the timer stays armed
    pub fn due(&self) -> Option<f64> {
        match self {
            Self::Reschedule(t) => Some(*t),
            Self::Stop => None,
        }
    }
}

/// Cooperative timer reactor
///
/// The reactor owns the dispatch loop. A component registers a single due
/// time here and the embedding application routes the returned handle back
/// to the component's timer method when it fires, re-arming according to
/// the returned [`Wake`].
pub trait Scheduler {
    /// Identifies a registered timer
    type Handle;

    /// Current time on the reactor's monotonic clock, in seconds
    fn monotonic(&self) -> f64;

    /// Register a timer due at `waketime`
    fn register_timer(&mut self, waketime: f64) -> Self::Handle;
}
