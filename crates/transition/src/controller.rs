use crate::config::{Timeline, TimelineRegistry, TransitionConfig};
use crate::error::{TransitionError, TransitionResult};
use crate::interpolate::Interpolator;
use core_types::{AttrValue, Millis};
use dom::{NodeRef, NodeTree};
use selection::{Scene, Selection, Slot, ValueSource};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Identifies one `start_transition` call and the per-node schedules it
/// created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionHandle(u64);

impl TransitionHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransitionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionState {
    /// No schedule of that handle ever touched the node.
    Idle,
    Scheduled,
    Running,
    Completed,
    Interrupted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitionEvent {
    Started { handle: TransitionHandle, node: NodeRef },
    Ended { handle: TransitionHandle, node: NodeRef },
    Interrupted { handle: TransitionHandle, node: NodeRef },
    /// The node was detached by a deferred `remove`.
    Removed { handle: TransitionHandle, node: NodeRef },
}

#[derive(Debug)]
struct Tween {
    attr: String,
    target: AttrValue,
    /// Built when the schedule starts running, from the value found then.
    interp: Option<Interpolator>,
}

#[derive(Debug)]
struct Schedule {
    handle: TransitionHandle,
    name: String,
    node: NodeRef,
    /// Slot index, passed to value functions.
    index: usize,
    start_at: Millis,
    timeline: Timeline,
    state: TransitionState,
    tweens: Vec<Tween>,
    text: Option<String>,
    remove_on_end: bool,
}

/// Per-node transition schedules driven by the host clock.
///
/// At most one schedule per `(node, name)` is live: starting another one
/// interrupts the old one, whose last written values stay in the tree.
/// Anonymous transitions share the empty name. Schedules of different names
/// may run on the same node, but an attribute is only ever tweened by the
/// schedule that most recently started running with it.
///
/// Only the latest settled schedule per `(node, name)` is remembered, so
/// [`TransitionController::state`] reports older finished handles as `Idle`.
#[derive(Debug, Default)]
pub struct TransitionController {
    timelines: TimelineRegistry,
    schedules: Vec<Schedule>,
    settled: HashMap<(NodeRef, String), (TransitionHandle, TransitionState)>,
    pending_events: Vec<TransitionEvent>,
    now: Millis,
    next_handle: u64,
}

impl TransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last clock value seen by [`TransitionController::tick`].
    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn timelines(&self) -> &TimelineRegistry {
        &self.timelines
    }

    pub fn configure_timeline(&mut self, name: impl Into<String>, timeline: Timeline) {
        let name = name.into();
        log::trace!(target: "transition.schedule", "configure timeline {name:?}: {timeline:?}");
        self.timelines.configure(name, timeline);
    }

    /// Number of scheduled or running per-node schedules.
    pub fn active_count(&self) -> usize {
        self.schedules.len()
    }

    /// Number of finished schedules still answering [`TransitionController::state`].
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    pub fn start_transition<T: NodeTree>(
        &mut self,
        scene: &Scene<T>,
        config: &TransitionConfig,
        selection: &Selection,
    ) -> TransitionResult<TransitionHandle> {
        let timeline = if config.is_anonymous() {
            config.own_timeline()
        } else {
            self.timelines
                .get(&config.name)
                .ok_or_else(|| TransitionError::UnconfiguredTransition(config.name.clone()))?
        };
        scene.ensure_live(selection)?;

        let handle = TransitionHandle(self.next_handle);
        self.next_handle += 1;
        let state = if timeline.delay == 0 {
            TransitionState::Running
        } else {
            TransitionState::Scheduled
        };

        let mut started = 0usize;
        for group in selection.groups() {
            for (index, slot) in group.slots().iter().enumerate() {
                let Slot::Node(node) = slot else {
                    continue;
                };
                let node = *node;
                self.interrupt_where(|s| s.node == node && s.name == config.name);
                if state == TransitionState::Running {
                    self.pending_events
                        .push(TransitionEvent::Started { handle, node });
                }
                self.schedules.push(Schedule {
                    handle,
                    name: config.name.clone(),
                    node,
                    index,
                    start_at: self.now + timeline.delay,
                    timeline,
                    state,
                    tweens: Vec::new(),
                    text: None,
                    remove_on_end: false,
                });
                started += 1;
            }
        }
        log::trace!(
            target: "transition.schedule",
            "start {handle} {:?} on {started} nodes at {}: {timeline:?}",
            config.name,
            self.now
        );
        Ok(handle)
    }

    /// Tweens attribute `name` towards `value` on every node of `handle`.
    /// Running schedules read the start value now; scheduled ones when they
    /// start running. Zero-duration running schedules write at once.
    pub fn attr<'v, T: NodeTree>(
        &mut self,
        scene: &mut Scene<T>,
        handle: TransitionHandle,
        name: &str,
        value: impl Into<ValueSource<'v>>,
    ) -> TransitionResult<()> {
        let value = value.into();
        for idx in 0..self.schedules.len() {
            let (node, index, state, duration) = {
                let s = &self.schedules[idx];
                if s.handle != handle {
                    continue;
                }
                (s.node, s.index, s.state, s.timeline.duration)
            };
            if !scene.is_live(node) {
                continue;
            }
            let target = value.resolve(scene.datum(node), index);
            let interp = match state {
                TransitionState::Running if duration == 0 => {
                    scene.tree_mut().set_attribute(node, name, &target.render())?;
                    None
                }
                TransitionState::Running => {
                    let start = scene.tree().attribute(node, name)?;
                    Some(Interpolator::new(start, &target))
                }
                _ => None,
            };
            let claims = state == TransitionState::Running;

            let schedule = &mut self.schedules[idx];
            schedule.tweens.retain(|t| t.attr != name);
            if !(claims && interp.is_none()) {
                schedule.tweens.push(Tween {
                    attr: name.to_string(),
                    target,
                    interp,
                });
            }
            if claims {
                self.claim(idx, node, name);
            }
        }
        Ok(())
    }

    /// Sets the text of every node of `handle` when its schedule starts
    /// running.
    pub fn text<'v, T: NodeTree>(
        &mut self,
        scene: &mut Scene<T>,
        handle: TransitionHandle,
        value: impl Into<ValueSource<'v>>,
    ) -> TransitionResult<()> {
        let value = value.into();
        for schedule in self.schedules.iter_mut().filter(|s| s.handle == handle) {
            if !scene.is_live(schedule.node) {
                continue;
            }
            let text = value.resolve(scene.datum(schedule.node), schedule.index).render();
            if schedule.state == TransitionState::Running {
                write_text(scene, schedule.node, &text)?;
            } else {
                schedule.text = Some(text);
            }
        }
        Ok(())
    }

    /// Detaches each node of `handle` once its schedule completes. Dropped for
    /// schedules that get interrupted.
    pub fn remove(&mut self, handle: TransitionHandle) -> usize {
        let mut marked = 0;
        for schedule in self.schedules.iter_mut().filter(|s| s.handle == handle) {
            schedule.remove_on_end = true;
            marked += 1;
        }
        marked
    }

    /// Interrupts the `name` schedules of the selection's nodes.
    pub fn interrupt<T: NodeTree>(
        &mut self,
        scene: &Scene<T>,
        selection: &Selection,
        name: &str,
    ) -> TransitionResult<usize> {
        scene.ensure_live(selection)?;
        let nodes = selection.nodes().collect::<HashSet<_>>();
        Ok(self.interrupt_where(|s| s.name == name && nodes.contains(&s.node)))
    }

    /// Interrupts every schedule of the given nodes, whatever its name.
    pub fn cancel_nodes(&mut self, nodes: &[NodeRef]) -> usize {
        let nodes = nodes.iter().copied().collect::<HashSet<_>>();
        self.interrupt_where(|s| nodes.contains(&s.node))
    }

    pub fn state(&self, handle: TransitionHandle, node: NodeRef) -> TransitionState {
        self.schedules
            .iter()
            .find(|s| s.handle == handle && s.node == node)
            .map(|s| s.state)
            .or_else(|| {
                self.settled
                    .iter()
                    .find(|((n, _), (h, _))| *n == node && *h == handle)
                    .map(|(_, (_, state))| *state)
            })
            .unwrap_or(TransitionState::Idle)
    }

    /// Advances every schedule to `now` and returns what happened since the
    /// previous tick, in schedule order. A clock going backwards is clamped to
    /// the last observed time.
    pub fn tick<T: NodeTree>(
        &mut self,
        scene: &mut Scene<T>,
        now: Millis,
    ) -> TransitionResult<Vec<TransitionEvent>> {
        let now = if now < self.now {
            log::debug!(
                target: "transition.schedule",
                "clock went backwards ({now} < {}); clamped",
                self.now
            );
            self.now
        } else {
            now
        };
        self.now = now;
        self.settled.retain(|(node, _), _| scene.is_live(*node));

        let mut events = std::mem::take(&mut self.pending_events);
        let mut finished = Vec::new();
        for idx in 0..self.schedules.len() {
            let s = &self.schedules[idx];
            if !scene.is_live(s.node) {
                continue;
            }
            if s.state == TransitionState::Scheduled {
                if now < s.start_at {
                    continue;
                }
                events.push(TransitionEvent::Started {
                    handle: s.handle,
                    node: s.node,
                });
                self.begin_running(scene, idx)?;
            }
            if self.advance(scene, idx, now)? {
                finished.push(idx);
            }
        }

        let mut removals = Vec::new();
        for idx in finished {
            let s = &mut self.schedules[idx];
            s.state = TransitionState::Completed;
            settle(&mut self.settled, s, TransitionState::Completed);
            events.push(TransitionEvent::Ended {
                handle: s.handle,
                node: s.node,
            });
            if s.remove_on_end {
                removals.push((s.handle, s.node));
            }
        }
        for (handle, node) in removals {
            // An earlier removal in this tick may have taken it already.
            if !scene.is_live(node) {
                continue;
            }
            let root = scene.tree().root();
            scene.remove_collect(&Selection::from_nodes(root, [node]))?;
            events.push(TransitionEvent::Removed { handle, node });
        }

        let settled = &mut self.settled;
        self.schedules.retain(|s| {
            if s.state == TransitionState::Completed {
                return false;
            }
            if !scene.is_live(s.node) {
                settle(settled, s, TransitionState::Interrupted);
                events.push(TransitionEvent::Interrupted {
                    handle: s.handle,
                    node: s.node,
                });
                return false;
            }
            true
        });
        Ok(events)
    }

    fn begin_running<T: NodeTree>(
        &mut self,
        scene: &mut Scene<T>,
        idx: usize,
    ) -> TransitionResult<()> {
        let schedule = &mut self.schedules[idx];
        let node = schedule.node;
        schedule.state = TransitionState::Running;
        let mut claimed = Vec::with_capacity(schedule.tweens.len());
        for tween in &mut schedule.tweens {
            let start = scene.tree().attribute(node, &tween.attr)?;
            tween.interp = Some(Interpolator::new(start, &tween.target));
            claimed.push(tween.attr.clone());
        }
        if let Some(text) = schedule.text.take() {
            write_text(scene, node, &text)?;
        }
        log::trace!(
            target: "transition.schedule",
            "{} running on {node} at {}",
            schedule.handle,
            self.now
        );
        for attr in claimed {
            self.claim(idx, node, &attr);
        }
        Ok(())
    }

    /// Writes the current tween values; true once the schedule is complete.
    fn advance<T: NodeTree>(
        &self,
        scene: &mut Scene<T>,
        idx: usize,
        now: Millis,
    ) -> TransitionResult<bool> {
        let s = &self.schedules[idx];
        let elapsed = now.saturating_sub(s.start_at);
        let t = if s.timeline.duration == 0 {
            1.0
        } else {
            (elapsed as f64 / s.timeline.duration as f64).min(1.0)
        };
        let eased = if t >= 1.0 { 1.0 } else { s.timeline.ease.apply(t) };
        for tween in &s.tweens {
            if let Some(value) = tween.interp.as_ref().and_then(|i| i.value_at(eased)) {
                scene
                    .tree_mut()
                    .set_attribute(s.node, &tween.attr, &value.render())?;
            }
        }
        Ok(t >= 1.0)
    }

    // Running schedules on `node` other than `owner_idx` stop tweening `attr`.
    fn claim(&mut self, owner_idx: usize, node: NodeRef, attr: &str) {
        let owner = self.schedules[owner_idx].handle;
        for (i, s) in self.schedules.iter_mut().enumerate() {
            if i == owner_idx || s.node != node || s.state != TransitionState::Running {
                continue;
            }
            let before = s.tweens.len();
            s.tweens.retain(|t| t.attr != attr);
            if s.tweens.len() != before {
                log::trace!(
                    target: "transition.schedule",
                    "{owner} takes {attr:?} on {node} over from {}",
                    s.handle
                );
            }
        }
    }

    fn interrupt_where(&mut self, mut pred: impl FnMut(&Schedule) -> bool) -> usize {
        let events = &mut self.pending_events;
        let settled = &mut self.settled;
        let mut interrupted = 0;
        self.schedules.retain(|s| {
            if !pred(s) {
                return true;
            }
            log::trace!(
                target: "transition.schedule",
                "{} interrupted on {} ({:?})",
                s.handle,
                s.node,
                s.state
            );
            settle(settled, s, TransitionState::Interrupted);
            events.push(TransitionEvent::Interrupted {
                handle: s.handle,
                node: s.node,
            });
            interrupted += 1;
            false
        });
        interrupted
    }
}

fn write_text<T: NodeTree>(scene: &mut Scene<T>, node: NodeRef, text: &str) -> TransitionResult<()> {
    scene.set_text(&Selection::from_nodes(node, [node]), text)?;
    Ok(())
}

// Replaces whatever an earlier schedule of the same name left on the node.
fn settle(
    settled: &mut HashMap<(NodeRef, String), (TransitionHandle, TransitionState)>,
    schedule: &Schedule,
    state: TransitionState,
) {
    settled.insert((schedule.node, schedule.name.clone()), (schedule.handle, state));
}
