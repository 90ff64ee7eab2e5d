//! Game state capability and the types the state machine is built from.
//!
//! A game state is one screen of the game (menu, play, credits, ...). Every
//! screen implements [`GameState`] and is constructed through a [`StateTable`],
//! which maps a [`StateKind`] to a constructor. States never touch the machine
//! directly: they return a [`Transition`] from `update` and the machine applies
//! it at the frame boundary.
//!
//! # Key types
//!
//! - [`StateKind`] names the screens the game knows about
//! - [`GameState<C>`] is the lifecycle/update/render capability, generic over the
//!   context `C` handed through the frame loop
//! - [`Lifecycle`] holds the active/alive flags the machine keeps per state
//! - [`Transition`] is the request a state hands back to the machine

use std::{collections::HashMap, fmt::Debug};

/// Identifies a screen of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    Begin,
    Menu,
    Story,
    Guide,
    Credits,
    End,
    Play,
}

impl StateKind {
    pub const ALL: [StateKind; 7] = [
        StateKind::Begin,
        StateKind::Menu,
        StateKind::Story,
        StateKind::Guide,
        StateKind::Credits,
        StateKind::End,
        StateKind::Play,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StateKind::Begin => "Begin",
            StateKind::Menu => "Menu",
            StateKind::Story => "Story",
            StateKind::Guide => "Guide",
            StateKind::Credits => "Credits",
            StateKind::End => "End",
            StateKind::Play => "Play",
        }
    }
}

/// Activity flags of a state owned by the machine.
///
/// `active` states receive update and render calls. A state that is not active
/// but still `alive` is suspended under an overlay and can be resumed. A state
/// that is no longer `alive` is scheduled for teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub active: bool,
    pub alive: bool,
}

impl Lifecycle {
    pub fn running() -> Self {
        Self {
            active: true,
            alive: true,
        }
    }

    pub fn suspend(&mut self) {
        self.active = false;
    }

    pub fn resume(&mut self) {
        if self.alive {
            self.active = true;
        }
    }

    pub fn retire(&mut self) {
        self.active = false;
        self.alive = false;
    }

    pub fn is_suspended(&self) -> bool {
        self.alive && !self.active
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::running()
    }
}

/// A request from a state to the machine, returned from [`GameState::update`].
///
/// Transitions are queued during the update pass and applied afterwards, so a
/// state is never torn down while its own `update` is running. The requesting
/// state is recorded as the predecessor of the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transition {
    /// Stay in the current configuration.
    #[default]
    None,
    /// Replace every state with a freshly constructed one.
    Permanent(StateKind),
    /// Push an overlay and suspend the requesting state.
    Temporary(StateKind),
    /// Close the requesting overlay and resume its predecessor.
    Pop,
    /// Tear every state down; the game loop ends once the machine is empty.
    Quit,
}

/// Capability every screen implements.
///
/// `C` is the context passed through the frame loop. For the running game it
/// is [`crate::game::GameContext`]; tests can use any plain struct.
///
/// Only `update` and `render` are required, the lifecycle hooks default to
/// doing nothing.
pub trait GameState<C> {
    /// Called once after the state was installed in the machine.
    fn on_enter(&mut self, _ctx: &mut C) {}

    /// Called once right before the state is dropped.
    fn on_exit(&mut self, _ctx: &mut C) {}

    /// Advance the state by one frame.
    fn update(&mut self, ctx: &mut C) -> Transition;

    /// Submit this state's draw work for the current frame.
    fn render(&self, ctx: &mut C);
}

impl<C> Debug for dyn GameState<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GameState")
    }
}

/// Builds a state. Receives the context and the predecessor the transition
/// carried; fails when the state's assets cannot be loaded.
pub type StateConstructor<C> =
    Box<dyn Fn(&mut C, Option<StateKind>) -> anyhow::Result<Box<dyn GameState<C>>>>;

/// Dispatch table from [`StateKind`] to constructor.
pub struct StateTable<C> {
    constructors: HashMap<StateKind, StateConstructor<C>>,
}

impl<C> StateTable<C> {
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registers the constructor for `kind`, replacing an earlier one.
    pub fn register<F>(&mut self, kind: StateKind, constructor: F)
    where
        F: Fn(&mut C, Option<StateKind>) -> anyhow::Result<Box<dyn GameState<C>>> + 'static,
    {
        if self
            .constructors
            .insert(kind, Box::new(constructor))
            .is_some()
        {
            log::warn!("Constructor for state {:?} was registered twice", kind);
        }
    }

    pub fn contains(&self, kind: StateKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    pub(crate) fn construct(
        &self,
        kind: StateKind,
        ctx: &mut C,
        previous: Option<StateKind>,
    ) -> anyhow::Result<Box<dyn GameState<C>>> {
        let constructor = self
            .constructors
            .get(&kind)
            .ok_or_else(|| anyhow::anyhow!("No constructor registered for state {:?}", kind))?;
        constructor(ctx, previous)
    }
}

impl<C> Default for StateTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
