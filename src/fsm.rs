//! The finite state machine that owns every game state.
//!
//! The machine holds at most one *permanent* state and any number of
//! *temporary* overlays stacked on top of it. Each state is uniquely owned by
//! its slot and dropped as soon as it is popped or replaced.
//!
//! ```text
//!   overlays:  [Guide]          <- active, receives update/render
//!   permanent:  Menu            <- suspended (active = false, alive = true)
//! ```
//!
//! Update and render only reach active slots: the permanent state first, then
//! overlays in insertion order. Transitions requested during `update` are
//! applied once the whole update pass is over, followed by a sweep that
//! destroys every slot that is no longer alive.

use anyhow::Context as _;
use log::{debug, info, warn};

use crate::state::{GameState, Lifecycle, StateKind, StateTable, Transition};

struct Slot<C> {
    kind: StateKind,
    previous: Option<StateKind>,
    lifecycle: Lifecycle,
    state: Box<dyn GameState<C>>,
}

pub struct FiniteStateMachine<C> {
    table: StateTable<C>,
    permanent: Option<Slot<C>>,
    overlays: Vec<Slot<C>>,
}

impl<C> FiniteStateMachine<C> {
    pub fn new(table: StateTable<C>) -> Self {
        Self {
            table,
            permanent: None,
            overlays: Vec::new(),
        }
    }

    //--- Transitions ------------------------------------------------------

    /// Replaces the permanent state and every overlay with a new `kind` state.
    ///
    /// The new state is constructed first. If that fails nothing is torn down
    /// and the construction error is returned.
    pub fn make_permanent(
        &mut self,
        kind: StateKind,
        previous: Option<StateKind>,
        ctx: &mut C,
    ) -> anyhow::Result<()> {
        let state = self
            .table
            .construct(kind, ctx, previous)
            .with_context(|| format!("Failed to construct permanent state {:?}", kind))?;

        self.slots_mut().for_each(|slot| slot.lifecycle.retire());
        self.sweep(ctx);

        let mut slot = Slot {
            kind,
            previous,
            lifecycle: Lifecycle::running(),
            state,
        };
        slot.state.on_enter(ctx);
        self.permanent = Some(slot);
        info!("Entered permanent state {:?} (from {:?})", kind, previous);
        Ok(())
    }

    /// Pushes a `kind` overlay and suspends `previous` without destroying it.
    pub fn make_temporary(
        &mut self,
        kind: StateKind,
        previous: Option<StateKind>,
        ctx: &mut C,
    ) -> anyhow::Result<()> {
        if self.contains(kind) {
            anyhow::bail!("State {:?} is already running and cannot be pushed again", kind);
        }

        let state = self
            .table
            .construct(kind, ctx, previous)
            .with_context(|| format!("Failed to construct temporary state {:?}", kind))?;

        match previous {
            Some(previous_kind) => match self.slot_mut(previous_kind) {
                Some(slot) => slot.lifecycle.suspend(),
                None => warn!(
                    "Predecessor {:?} of overlay {:?} is not running",
                    previous_kind, kind
                ),
            },
            None => debug!("Overlay {:?} pushed without a predecessor", kind),
        }

        let mut slot = Slot {
            kind,
            previous,
            lifecycle: Lifecycle::running(),
            state,
        };
        slot.state.on_enter(ctx);
        self.overlays.push(slot);
        info!("Entered temporary state {:?} (over {:?})", kind, previous);
        Ok(())
    }

    /// Closes the overlay `kind` and resumes its predecessor.
    ///
    /// Returns `false` when there is no such overlay. The permanent state can
    /// only be replaced, never popped.
    pub fn pop(&mut self, kind: StateKind, ctx: &mut C) -> bool {
        let Some(position) = self
            .overlays
            .iter()
            .position(|slot| slot.kind == kind && slot.lifecycle.alive)
        else {
            if self.permanent() == Some(kind) {
                warn!("Permanent state {:?} cannot be popped", kind);
            } else {
                debug!("State {:?} is not an overlay, nothing to pop", kind);
            }
            return false;
        };

        let previous = self.overlays[position].previous;
        self.overlays[position].lifecycle.retire();

        // An overlay stacked on the popped one inherits its predecessor and
        // keeps it suspended.
        let mut inherited = false;
        for slot in self.overlays.iter_mut().filter(|slot| slot.lifecycle.alive) {
            if slot.previous == Some(kind) {
                slot.previous = previous;
                inherited = true;
            }
        }
        // The predecessor stays suspended while another overlay still sits on it.
        let still_covered = previous.is_some_and(|previous| {
            self.overlays
                .iter()
                .any(|slot| slot.lifecycle.alive && slot.previous == Some(previous))
        });
        if !inherited && !still_covered {
            if let Some(slot) = previous.and_then(|previous| self.slot_mut(previous)) {
                slot.lifecycle.resume();
            }
        }

        self.sweep(ctx);
        info!("Left temporary state {:?} (back to {:?})", kind, previous);
        true
    }

    /// Tears down every state.
    pub fn clear(&mut self, ctx: &mut C) {
        self.slots_mut().for_each(|slot| slot.lifecycle.retire());
        self.sweep(ctx);
        info!("All game states cleared");
    }

    //--- Frame dispatch ---------------------------------------------------

    /// Updates every active state, then applies the transitions they asked
    /// for in the order they were requested.
    pub fn update(&mut self, ctx: &mut C) {
        let mut requested = Vec::new();
        for slot in self.slots_mut() {
            if slot.lifecycle.active {
                let transition = slot.state.update(ctx);
                if transition != Transition::None {
                    requested.push((slot.kind, transition));
                }
            }
        }

        for (origin, transition) in requested {
            self.apply(origin, transition, ctx);
        }
        self.sweep(ctx);
    }

    /// Renders every active state, permanent first, overlays in insertion order.
    pub fn render(&self, ctx: &mut C) {
        self.permanent
            .iter()
            .chain(self.overlays.iter())
            .filter(|slot| slot.lifecycle.active)
            .for_each(|slot| slot.state.render(ctx));
    }

    fn apply(&mut self, origin: StateKind, transition: Transition, ctx: &mut C) {
        // An earlier transition of this frame may already have removed the origin.
        if !self.contains(origin) {
            debug!(
                "Dropping {:?} requested by {:?}, which is no longer running",
                transition, origin
            );
            return;
        }

        let result = match transition {
            Transition::None => Ok(()),
            Transition::Permanent(kind) => self.make_permanent(kind, Some(origin), ctx),
            Transition::Temporary(kind) => self.make_temporary(kind, Some(origin), ctx),
            Transition::Pop => {
                self.pop(origin, ctx);
                Ok(())
            }
            Transition::Quit => {
                self.clear(ctx);
                Ok(())
            }
        };

        if let Err(e) = result {
            log::error!("Transition {:?} from {:?} failed: {:#}", transition, origin, e);
        }
    }

    fn sweep(&mut self, ctx: &mut C) {
        // Tear overlays down from the top so the newest goes first.
        let mut index = self.overlays.len();
        while index > 0 {
            index -= 1;
            if !self.overlays[index].lifecycle.alive {
                let mut slot = self.overlays.remove(index);
                slot.state.on_exit(ctx);
                debug!("Destroyed temporary state {:?}", slot.kind);
            }
        }

        if self
            .permanent
            .as_ref()
            .is_some_and(|slot| !slot.lifecycle.alive)
        {
            if let Some(mut slot) = self.permanent.take() {
                slot.state.on_exit(ctx);
                debug!("Destroyed permanent state {:?}", slot.kind);
            }
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn permanent(&self) -> Option<StateKind> {
        self.permanent.as_ref().map(|slot| slot.kind)
    }

    pub fn overlays(&self) -> Vec<StateKind> {
        self.overlays.iter().map(|slot| slot.kind).collect()
    }

    /// Kinds that currently receive update and render calls, in dispatch order.
    pub fn active_states(&self) -> Vec<StateKind> {
        self.slots()
            .filter(|slot| slot.lifecycle.active)
            .map(|slot| slot.kind)
            .collect()
    }

    pub fn lifecycle(&self, kind: StateKind) -> Option<Lifecycle> {
        self.slot(kind).map(|slot| slot.lifecycle)
    }

    /// The state `kind` was entered from, if it is running and had one.
    pub fn predecessor(&self, kind: StateKind) -> Option<StateKind> {
        self.slot(kind).and_then(|slot| slot.previous)
    }

    pub fn contains(&self, kind: StateKind) -> bool {
        self.slot(kind).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.permanent.is_none() && self.overlays.is_empty()
    }

    pub fn len(&self) -> usize {
        self.permanent.iter().count() + self.overlays.len()
    }

    fn slots(&self) -> impl Iterator<Item = &Slot<C>> {
        self.permanent.iter().chain(self.overlays.iter())
    }

    fn slot(&self, kind: StateKind) -> Option<&Slot<C>> {
        self.slots()
            .find(|slot| slot.kind == kind && slot.lifecycle.alive)
    }

    fn slots_mut(&mut self) -> impl Iterator<Item = &mut Slot<C>> {
        self.permanent.iter_mut().chain(self.overlays.iter_mut())
    }

    fn slot_mut(&mut self, kind: StateKind) -> Option<&mut Slot<C>> {
        self.slots_mut()
            .find(|slot| slot.kind == kind && slot.lifecycle.alive)
    }
}
