use crate::ease::Ease;
use core_types::Millis;
use std::collections::HashMap;

/// Default duration of a timeline, in milliseconds.
pub const DEFAULT_DURATION: Millis = 250;

/// Timing shared by every transition started under one name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeline {
    /// `0` writes the target immediately once running.
    pub duration: Millis,
    /// `0` starts running at once, without a scheduled phase.
    pub delay: Millis,
    pub ease: Ease,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            delay: 0,
            ease: Ease::Linear,
        }
    }
}

/// Arguments of `start_transition`.
///
/// An empty `name` is anonymous: the timing fields configure a private
/// timeline for that call. A non-empty name refers to a timeline registered
/// earlier with `configure_timeline`; the timing fields are then ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionConfig {
    pub name: String,
    pub duration: Millis,
    pub delay: Millis,
    pub ease: Ease,
}

impl TransitionConfig {
    pub fn anonymous(duration: Millis, delay: Millis) -> Self {
        Self {
            name: String::new(),
            duration,
            delay,
            ease: Ease::Linear,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub(crate) fn own_timeline(&self) -> Timeline {
        Timeline {
            duration: self.duration,
            delay: self.delay,
            ease: self.ease,
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        let timeline = Timeline::default();
        Self {
            name: String::new(),
            duration: timeline.duration,
            delay: timeline.delay,
            ease: timeline.ease,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TimelineRegistry {
    by_name: HashMap<String, Timeline>,
}

impl TimelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces `name`. Transitions already started keep the
    /// timing they were started with.
    pub fn configure(&mut self, name: impl Into<String>, timeline: Timeline) {
        self.by_name.insert(name.into(), timeline);
    }

    pub fn get(&self, name: &str) -> Option<Timeline> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }
}
