//! Victory screen shown after the player reached the goal.

use crate::{
    data_structures::sprite::{Background, Button, clicked_action},
    game::GameContext,
    state::{GameState, StateKind, Transition},
    states::{back_pressed, confirm_pressed},
};

pub struct EndState {
    background: Background,
    buttons: Vec<Button>,
}

impl EndState {
    pub fn new(ctx: &mut GameContext) -> anyhow::Result<Self> {
        Ok(Self {
            background: ctx.load_background("EndBackground")?,
            buttons: ctx.load_buttons(&["EndReturn"])?,
        })
    }
}

impl GameState<GameContext> for EndState {
    fn update(&mut self, ctx: &mut GameContext) -> Transition {
        let window = ctx.window_size();
        if confirm_pressed(ctx)
            || back_pressed(ctx)
            || clicked_action(&self.buttons, &mut ctx.input, window).is_some()
        {
            return Transition::Permanent(StateKind::Menu);
        }
        Transition::None
    }

    fn render(&self, ctx: &mut GameContext) {
        ctx.frame.push(self.background.render());
        self.buttons
            .iter()
            .for_each(|button| ctx.frame.push(button.render()));
    }
}
