//! Title screen.

use log::warn;

use crate::{
    data_structures::sprite::{Background, Button, clicked_action},
    game::GameContext,
    state::{GameState, StateKind, Transition},
    states::{back_pressed, confirm_pressed, transition_for},
};

pub struct BeginState {
    background: Background,
    buttons: Vec<Button>,
}

impl BeginState {
    pub fn new(ctx: &mut GameContext) -> anyhow::Result<Self> {
        Ok(Self {
            background: ctx.load_background("BeginBackground")?,
            buttons: ctx.load_buttons(&["BeginStart"])?,
        })
    }
}

impl GameState<GameContext> for BeginState {
    fn update(&mut self, ctx: &mut GameContext) -> Transition {
        if confirm_pressed(ctx) {
            return Transition::Permanent(StateKind::Menu);
        }
        if back_pressed(ctx) {
            return Transition::Quit;
        }
        let window = ctx.window_size();
        match clicked_action(&self.buttons, &mut ctx.input, window) {
            Some(action) => transition_for(action).unwrap_or_else(|| {
                warn!("Unknown button action on the title screen: {}", action);
                Transition::None
            }),
            None => Transition::None,
        }
    }

    fn render(&self, ctx: &mut GameContext) {
        ctx.frame.push(self.background.render());
        self.buttons
            .iter()
            .for_each(|button| ctx.frame.push(button.render()));
    }
}
