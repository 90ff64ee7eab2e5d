//! Story, guide and credits pages. They open on top of another screen and
//! return to it.

use log::{debug, warn};

use crate::{
    data_structures::sprite::{Background, Button, clicked_action},
    game::GameContext,
    state::{GameState, StateKind, Transition},
    states::back_pressed,
};

pub struct OverlayState {
    kind: StateKind,
    background: Background,
    back: Option<Button>,
}

impl OverlayState {
    /// Loads `<Name>Background` and, if configured, a `<Name>Return` button.
    pub fn new(kind: StateKind, ctx: &mut GameContext) -> anyhow::Result<Self> {
        let background = ctx.load_background(&format!("{}Background", kind.name()))?;
        let back = match ctx.load_button(&format!("{}Return", kind.name())) {
            Ok(button) => Some(button),
            Err(e) => {
                warn!("{} page has no return button: {:#}", kind.name(), e);
                None
            }
        };
        Ok(Self {
            kind,
            background,
            back,
        })
    }
}

impl GameState<GameContext> for OverlayState {
    fn on_enter(&mut self, _ctx: &mut GameContext) {
        debug!("{} page opened", self.kind.name());
    }

    fn update(&mut self, ctx: &mut GameContext) -> Transition {
        if back_pressed(ctx) {
            return Transition::Pop;
        }
        let window = ctx.window_size();
        if clicked_action(self.back.as_slice(), &mut ctx.input, window).is_some() {
            return Transition::Pop;
        }
        Transition::None
    }

    fn render(&self, ctx: &mut GameContext) {
        ctx.frame.push(self.background.render());
        if let Some(back) = &self.back {
            ctx.frame.push(back.render());
        }
    }
}
