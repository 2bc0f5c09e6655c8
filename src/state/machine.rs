//! Transition-table state machine
//!
//! A `StateMachine` maps `(current state, command)` pairs to the next state.
//! Transitions are attempted, never forced: an unmapped pair leaves the state
//! untouched and reports `false`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

/// Generic automaton over a state type `S` and a command type `C`
#[derive(Debug)]
pub struct StateMachine<S, C> {
    transitions: HashMap<(S, C), S>,
    current: Mutex<S>,
}

/// Access to the machine from inside a transition action
///
/// The machine lock is held for the lifetime of a `Transit`, so follow-up
/// transitions made through it are atomic with the one that triggered the
/// action.
pub struct Transit<'a, S, C> {
    transitions: &'a HashMap<(S, C), S>,
    current: &'a mut S,
}

impl<S, C> StateMachine<S, C>
where
    S: Copy + Eq + Hash + Debug,
    C: Copy + Eq + Hash + Debug,
{
    /// Creates a machine from its transition table and initial state
    pub fn new(transitions: impl IntoIterator<Item = ((S, C), S)>, initial: S) -> Self {
        Self {
            transitions: transitions.into_iter().collect(),
            current: Mutex::new(initial),
        }
    }

    /// Returns the current state
    pub fn current_state(&self) -> S {
        *self.lock()
    }

    /// Returns true if `command` is mapped from the current state
    pub fn can_transit(&self, command: C) -> bool {
        let current = self.lock();
        self.transitions.contains_key(&(*current, command))
    }

    /// Attempts the transition for `command`
    pub fn try_transit_next(&self, command: C) -> bool {
        self.try_transit_next_with(command, |_| {})
    }

    /// Attempts the transition for `command` and runs `action` after it
    ///
    /// `action` runs while the machine lock is still held and only if the
    /// transition succeeded. It receives a [`Transit`] through which it can
    /// read the state just entered and chain further transitions.
    pub fn try_transit_next_with<F>(&self, command: C, action: F) -> bool
    where
        F: FnOnce(&mut Transit<'_, S, C>),
    {
        let mut current = self.lock();
        let Some(&next) = self.transitions.get(&(*current, command)) else {
            return false;
        };
        *current = next;

        let mut transit = Transit {
            transitions: &self.transitions,
            current: &mut *current,
        };
        action(&mut transit);
        true
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // A panic inside an action leaves the state as last written
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<S, C> Transit<'_, S, C>
where
    S: Copy + Eq + Hash + Debug,
    C: Copy + Eq + Hash + Debug,
{
    /// The state the machine is in right now
    pub fn state(&self) -> S {
        *self.current
    }

    /// Attempts a follow-up transition without releasing the lock
    pub fn try_transit_next(&mut self, command: C) -> bool {
        match self.transitions.get(&(*self.current, command)) {
            Some(&next) => {
                *self.current = next;
                true
            }
            None => false,
        }
    }
}

/// Logs a rejected `(state, command)` pair
pub fn log_transition_failure<S: Debug, C: Debug>(state: S, command: C) {
    tracing::warn!(
        state = ?state,
        command = ?command,
        "Failed to transit from [{:?}] using command [{:?}]",
        state,
        command
    );
}
