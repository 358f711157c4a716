//! Host-facing entry points over the selection, join and transition core.
//!
//! [`Runtime`] owns the tree, the datum bindings and the transition
//! schedules, and forwards each call to the layer that implements it. With
//! [`RuntimeConfig::trace_calls`] set, every forwarded call is logged at
//! `debug` under the `weaver.bindings` target.

use std::fmt;

pub use core_types::{AttrValue, Datum, Key, Millis};
pub use dom::{Document, NodeRef, NodeTree, outline};
pub use selection::{
    DatumTable, EnterSlot, Group, Join, KeyFn, Scene, Selection, SelectionError, Slot,
    ValueSource,
};
pub use transition::{
    Ease, Timeline, TransitionConfig, TransitionController, TransitionError, TransitionEvent,
    TransitionHandle, TransitionState,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Log every forwarded call.
    pub trace_calls: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WeaverError {
    Selection(SelectionError),
    Transition(TransitionError),
}

impl fmt::Display for WeaverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeaverError::Selection(err) => write!(f, "selection: {err}"),
            WeaverError::Transition(err) => write!(f, "transition: {err}"),
        }
    }
}

impl std::error::Error for WeaverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WeaverError::Selection(err) => Some(err),
            WeaverError::Transition(err) => Some(err),
        }
    }
}

impl From<SelectionError> for WeaverError {
    fn from(err: SelectionError) -> Self {
        WeaverError::Selection(err)
    }
}

impl From<TransitionError> for WeaverError {
    fn from(err: TransitionError) -> Self {
        WeaverError::Transition(err)
    }
}

pub type WeaverResult<T> = Result<T, WeaverError>;

#[derive(Debug)]
pub struct Runtime<T: NodeTree = Document> {
    scene: Scene<T>,
    transitions: TransitionController,
    config: RuntimeConfig,
}

impl Runtime<Document> {
    pub fn with_document(config: RuntimeConfig) -> Self {
        Self::new(Document::new(), config)
    }
}

impl<T: NodeTree> Runtime<T> {
    pub fn new(tree: T, config: RuntimeConfig) -> Self {
        Self {
            scene: Scene::new(tree),
            transitions: TransitionController::new(),
            config,
        }
    }

    pub fn config(&self) -> RuntimeConfig {
        self.config
    }

    pub fn scene(&self) -> &Scene<T> {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene<T> {
        &mut self.scene
    }

    pub fn tree(&self) -> &T {
        self.scene.tree()
    }

    pub fn transitions(&self) -> &TransitionController {
        &self.transitions
    }

    fn trace(&self, call: fmt::Arguments<'_>) {
        if self.config.trace_calls {
            log::debug!(target: "weaver.bindings", "{call}");
        }
    }

    pub fn select_all_in_dom(&self, selector: &str) -> Selection {
        self.trace(format_args!("select_all_in_dom({selector:?})"));
        self.scene.select_all(selector)
    }

    pub fn selection_select_all(
        &self,
        selector: &str,
        selection: &Selection,
    ) -> WeaverResult<Selection> {
        self.trace(format_args!("{selection}.select_all({selector:?})"));
        Ok(self.scene.select_all_within(selection, selector)?)
    }

    /// Joins `projection(data)` keyed by datum identity.
    pub fn data<D: ?Sized>(
        &mut self,
        data: &D,
        projection: impl Fn(&D) -> Vec<Datum>,
        selection: &Selection,
    ) -> WeaverResult<Join> {
        self.data_key_fn(data, projection, &KeyFn::Identity, selection)
    }

    pub fn data_key_fn<D: ?Sized>(
        &mut self,
        data: &D,
        projection: impl Fn(&D) -> Vec<Datum>,
        key_fn: &KeyFn<'_>,
        selection: &Selection,
    ) -> WeaverResult<Join> {
        let data = projection(data);
        self.trace(format_args!(
            "{selection}.data([{} items], {key_fn:?})",
            data.len()
        ));
        Ok(self.scene.join(selection, &data, key_fn)?)
    }

    pub fn enter_and_append(&mut self, tag: &str, join: &Join) -> WeaverResult<Selection> {
        self.trace(format_args!("{}.append({tag:?})", join.enter));
        Ok(self.scene.append(&join.enter, tag)?)
    }

    pub fn exit(&self, join: &Join) -> Selection {
        self.trace(format_args!("exit {}", join.exit));
        join.exit.clone()
    }

    pub fn append(&mut self, tag: &str, selection: &Selection) -> WeaverResult<Selection> {
        self.trace(format_args!("{selection}.append({tag:?})"));
        Ok(self.scene.append(selection, tag)?)
    }

    /// Detaches the selection's nodes at once and cancels their transitions.
    pub fn remove<'s>(&mut self, selection: &'s Selection) -> WeaverResult<&'s Selection> {
        self.trace(format_args!("{selection}.remove()"));
        let detached = self.scene.remove_collect(selection)?;
        self.transitions.cancel_nodes(&detached);
        Ok(selection)
    }

    pub fn set_attr<'s, 'v>(
        &mut self,
        name: &str,
        value: impl Into<ValueSource<'v>>,
        selection: &'s Selection,
    ) -> WeaverResult<&'s Selection> {
        let value = value.into();
        self.trace(format_args!("{selection}.attr({name:?}, {value:?})"));
        Ok(self.scene.set_attribute(selection, name, value)?)
    }

    pub fn set_text<'s, 'v>(
        &mut self,
        value: impl Into<ValueSource<'v>>,
        selection: &'s Selection,
    ) -> WeaverResult<&'s Selection> {
        let value = value.into();
        self.trace(format_args!("{selection}.text({value:?})"));
        Ok(self.scene.set_text(selection, value)?)
    }

    pub fn configure_timeline(&mut self, name: &str, timeline: Timeline) {
        self.trace(format_args!("configure_timeline({name:?}, {timeline:?})"));
        self.transitions.configure_timeline(name, timeline);
    }

    pub fn add_transition(
        &mut self,
        selection: &Selection,
        config: &TransitionConfig,
    ) -> WeaverResult<TransitionHandle> {
        if config.is_anonymous() {
            self.trace(format_args!(
                "{selection}.transition() duration {} delay {}",
                config.duration, config.delay
            ));
        } else {
            self.trace(format_args!("{selection}.transition({:?})", config.name));
        }
        Ok(self
            .transitions
            .start_transition(&self.scene, config, selection)?)
    }

    pub fn transition_attr<'v>(
        &mut self,
        handle: TransitionHandle,
        name: &str,
        value: impl Into<ValueSource<'v>>,
    ) -> WeaverResult<TransitionHandle> {
        let value = value.into();
        self.trace(format_args!("{handle}.attr({name:?}, {value:?})"));
        self.transitions.attr(&mut self.scene, handle, name, value)?;
        Ok(handle)
    }

    pub fn transition_text<'v>(
        &mut self,
        handle: TransitionHandle,
        value: impl Into<ValueSource<'v>>,
    ) -> WeaverResult<TransitionHandle> {
        let value = value.into();
        self.trace(format_args!("{handle}.text({value:?})"));
        self.transitions.text(&mut self.scene, handle, value)?;
        Ok(handle)
    }

    /// Detaches the handle's nodes once their schedules complete.
    pub fn transition_remove(&mut self, handle: TransitionHandle) -> TransitionHandle {
        self.trace(format_args!("{handle}.remove()"));
        self.transitions.remove(handle);
        handle
    }

    pub fn interrupt(&mut self, selection: &Selection, name: &str) -> WeaverResult<usize> {
        self.trace(format_args!("{selection}.interrupt({name:?})"));
        Ok(self.transitions.interrupt(&self.scene, selection, name)?)
    }

    pub fn tick(&mut self, now: Millis) -> WeaverResult<Vec<TransitionEvent>> {
        Ok(self.transitions.tick(&mut self.scene, now)?)
    }

    pub fn transition_state(&self, handle: TransitionHandle, node: NodeRef) -> TransitionState {
        self.transitions.state(handle, node)
    }
}
