//! The screens of the game.
//!
//! ```text
//!   Begin --begin--> Menu --play--> Play --goal--> End --return--> Menu
//!                     |               |
//!                     +--story/guide/credits (overlays, return pops)
//!                                     +--help--> Guide (overlay)
//! ```

use winit::keyboard::KeyCode;

use crate::{
    game::GameContext,
    state::{GameState, StateKind, StateTable, Transition},
};

pub mod begin;
pub mod end;
pub mod menu;
pub mod overlay;
pub mod play;

/// Gamepad button names the states listen to.
pub const CONFIRM_BUTTON: &str = "confirm";
pub const BACK_BUTTON: &str = "back";
pub const MENU_BUTTON: &str = "menu";
pub const HELP_BUTTON: &str = "help";

/// Constructors of every screen.
pub fn state_table() -> StateTable<GameContext> {
    let mut table = StateTable::new();
    table.register(StateKind::Begin, |ctx, _| {
        Ok(Box::new(begin::BeginState::new(ctx)?) as Box<dyn GameState<GameContext>>)
    });
    table.register(StateKind::Menu, |ctx, _| {
        Ok(Box::new(menu::MenuState::new(ctx)?) as Box<dyn GameState<GameContext>>)
    });
    for kind in [StateKind::Story, StateKind::Guide, StateKind::Credits] {
        table.register(kind, move |ctx, _| {
            Ok(Box::new(overlay::OverlayState::new(kind, ctx)?) as Box<dyn GameState<GameContext>>)
        });
    }
    table.register(StateKind::Play, |ctx, _| {
        Ok(Box::new(play::PlayState::new(ctx)?) as Box<dyn GameState<GameContext>>)
    });
    table.register(StateKind::End, |ctx, _| {
        Ok(Box::new(end::EndState::new(ctx)?) as Box<dyn GameState<GameContext>>)
    });
    table
}

/// Maps a button action from the interface config to the transition it asks
/// for. Unknown actions map to `None`.
pub fn transition_for(action: &str) -> Option<Transition> {
    let transition = match action.trim().to_ascii_lowercase().as_str() {
        "begin" | "menu" => Transition::Permanent(StateKind::Menu),
        "play" => Transition::Permanent(StateKind::Play),
        "story" => Transition::Temporary(StateKind::Story),
        "guide" | "help" => Transition::Temporary(StateKind::Guide),
        "credits" => Transition::Temporary(StateKind::Credits),
        "return" | "back" => Transition::Pop,
        "quit" | "exit" => Transition::Quit,
        _ => return None,
    };
    Some(transition)
}

/// Enter, space or the confirm button, pressed this frame.
pub(crate) fn confirm_pressed(ctx: &mut GameContext) -> bool {
    ctx.input.is_key_pressed(KeyCode::Enter, false)
        || ctx.input.is_key_pressed(KeyCode::Space, false)
        || ctx.input.is_controller_button_pressed(CONFIRM_BUTTON, false)
}

/// Escape, backspace or the back button, pressed this frame.
pub(crate) fn back_pressed(ctx: &mut GameContext) -> bool {
    ctx.input.is_key_pressed(KeyCode::Escape, false)
        || ctx.input.is_key_pressed(KeyCode::Backspace, false)
        || ctx.input.is_controller_button_pressed(BACK_BUTTON, false)
}
