//! Main menu.
//!
//! Play replaces the menu, story, guide and credits open on top of it.

use log::{debug, warn};
use winit::keyboard::KeyCode;

use crate::{
    data_structures::sprite::{Background, Button, clicked_action},
    game::GameContext,
    state::{GameState, StateKind, Transition},
    states::{back_pressed, confirm_pressed, transition_for},
};

const BUTTONS: [&str; 5] = [
    "MenuPlay",
    "MenuStory",
    "MenuGuide",
    "MenuCredits",
    "MenuQuit",
];

pub struct MenuState {
    background: Background,
    buttons: Vec<Button>,
}

impl MenuState {
    pub fn new(ctx: &mut GameContext) -> anyhow::Result<Self> {
        let state = Self {
            background: ctx.load_background("MenuBackground")?,
            buttons: ctx.load_buttons(&BUTTONS)?,
        };
        debug!("Menu loaded with {} buttons", state.buttons.len());
        Ok(state)
    }
}

impl GameState<GameContext> for MenuState {
    fn update(&mut self, ctx: &mut GameContext) -> Transition {
        if confirm_pressed(ctx) {
            return Transition::Permanent(StateKind::Play);
        }
        if back_pressed(ctx) {
            return Transition::Quit;
        }
        if ctx.input.is_key_pressed(KeyCode::F1, false) {
            return Transition::Temporary(StateKind::Guide);
        }

        let window = ctx.window_size();
        match clicked_action(&self.buttons, &mut ctx.input, window) {
            Some(action) => transition_for(action).unwrap_or_else(|| {
                warn!("Unknown menu action: {}", action);
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
