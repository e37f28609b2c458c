// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notification hooks for graph events.
//!
//! Observers implement [`GraphObserver`] and register with a [`Callbacks`]
//! set. The set only holds weak references: an observer that has been dropped
//! is pruned the next time an event is issued.

use crate::graph::Graph;
use crate::knob::KnobId;
use crate::node::NodeId;
use crate::working_copy::EditorState;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Receiver of graph events. Every hook defaults to doing nothing.
pub trait GraphObserver {
    /// The editor context was started
    fn on_editor_start_up(&self) {}
    /// A graph was loaded
    fn on_load_canvas(&self, _graph: &Graph) {}
    /// An editor state was loaded
    fn on_load_editor_state(&self, _state: &EditorState) {}
    /// A graph was saved
    fn on_save_canvas(&self, _graph: &Graph) {}
    /// An editor state was saved
    fn on_save_editor_state(&self, _state: &EditorState) {}
    /// A node was added
    fn on_add_node(&self, _graph: &Graph, _node: NodeId) {}
    /// A node is about to be deleted; it is still in the graph
    fn on_delete_node(&self, _graph: &Graph, _node: NodeId) {}
    /// A node was moved
    fn on_move_node(&self, _graph: &Graph, _node: NodeId) {}
    /// An input knob was connected
    fn on_add_connection(&self, _graph: &Graph, _input: KnobId) {}
    /// An input knob is about to lose its connection
    fn on_remove_connection(&self, _graph: &Graph, _input: KnobId) {}
}

/// Set of registered observers
#[derive(Default)]
pub struct Callbacks {
    observers: RefCell<Vec<Weak<dyn GraphObserver>>>,
}

impl Callbacks {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer. The set does not keep it alive.
    pub fn register<O: GraphObserver + 'static>(&self, observer: &Rc<O>) {
        let weak: Weak<O> = Rc::downgrade(observer);
        let weak: Weak<dyn GraphObserver> = weak;
        self.observers.borrow_mut().push(weak);
    }

    /// Number of observers still alive
    pub fn observer_count(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    /// Invoke `event` on every live observer, pruning dropped ones
    pub(crate) fn issue(&self, event: impl Fn(&dyn GraphObserver)) {
        let live: Vec<Rc<dyn GraphObserver>> = {
            let mut observers = self.observers.borrow_mut();
            let before = observers.len();
            observers.retain(|o| o.strong_count() > 0);
            if observers.len() != before {
                tracing::debug!("Pruned {} dropped observers", before - observers.len());
            }
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        // The borrow is released so observers may register others while handling
        for observer in live {
            event(observer.as_ref());
        }
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("observers", &self.observer_count())
            .finish()
    }
}
