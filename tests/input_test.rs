use cgmath::Vector2;
use flashlight::{
    data_structures::sprite::{Rect, WidgetDesc},
    input::{Bounds2D, GamepadAxis, GamepadEvent, InputManager},
    resources::tags::{TagFile, object_data},
    state::{StateKind, Transition},
    states::transition_for,
};
use winit::{event::MouseButton, keyboard::KeyCode};

use crate::common::test_utils::INTERFACE;

mod common;

const MAPPING: &str = "TYPE >> MappedButtons\nconfirm:0\nback:1\nmenu:7\nbroken:minus one\n----------END----------\n";

fn mapped_input() -> InputManager {
    let mut input = InputManager::new();
    input.load_mapped_buttons(&object_data(MAPPING, "MappedButtons").unwrap());
    input.handle_gamepad_event(GamepadEvent::Connected);
    input
}

#[test]
fn single_press_queries_report_once_per_press() {
    let mut input = InputManager::new();
    input.set_key(KeyCode::Enter, true);

    assert!(input.is_key_pressed(KeyCode::Enter, false));
    assert!(!input.is_key_pressed(KeyCode::Enter, false));
    // Held keys keep repeating.
    assert!(input.is_key_pressed(KeyCode::Enter, true));

    input.set_key(KeyCode::Enter, false);
    assert!(!input.is_key_pressed(KeyCode::Enter, true));
    input.set_key(KeyCode::Enter, true);
    assert!(input.is_key_pressed(KeyCode::Enter, false));
}

#[test]
fn keys_never_seen_are_not_pressed() {
    let mut input = InputManager::new();
    assert!(!input.is_key_pressed(KeyCode::KeyW, true));
    assert!(!input.is_mouse_button_pressed(MouseButton::Right, true));
}

#[test]
fn mouse_buttons_share_the_press_lock() {
    let mut input = InputManager::new();
    input.set_mouse_button(MouseButton::Left, true);
    assert!(input.is_mouse_button_pressed(MouseButton::Left, false));
    assert!(!input.is_mouse_button_pressed(MouseButton::Left, false));
    assert!(input.is_mouse_button_pressed(MouseButton::Left, true));
    assert!(!input.is_mouse_button_pressed(MouseButton::Right, true));
}

#[test]
fn gamepad_buttons_are_queried_by_mapped_name() {
    let mut input = mapped_input();
    assert!(input.is_gamepad_connected());

    input.handle_gamepad_event(GamepadEvent::ButtonDown(7));
    assert!(input.is_controller_button_pressed("menu", false));
    assert!(!input.is_controller_button_pressed("menu", false));
    assert!(!input.is_controller_button_pressed("confirm", true));
    assert!(!input.is_controller_button_pressed("broken", true));
    assert!(!input.is_controller_button_pressed("unmapped", true));

    input.handle_gamepad_event(GamepadEvent::ButtonUp(7));
    input.handle_gamepad_event(GamepadEvent::ButtonDown(7));
    assert!(input.is_controller_button_pressed("menu", false));
}

#[test]
fn disconnecting_the_gamepad_releases_it() {
    let mut input = mapped_input();
    input.handle_gamepad_event(GamepadEvent::ButtonDown(0));
    input.handle_gamepad_event(GamepadEvent::Axis(GamepadAxis::LeftX, 30000));

    input.handle_gamepad_event(GamepadEvent::Disconnected);
    assert!(!input.is_gamepad_connected());
    assert!(!input.is_controller_button_pressed("confirm", true));
    assert_eq!(input.axis(GamepadAxis::LeftX), 0.0);
}

#[test]
fn axes_inside_the_dead_zone_read_zero() {
    let mut input = mapped_input();
    input.handle_gamepad_event(GamepadEvent::Axis(GamepadAxis::LeftX, 7999));
    input.handle_gamepad_event(GamepadEvent::Axis(GamepadAxis::LeftY, -8000));
    assert_eq!(input.left_axis(), Vector2::new(0.0, 0.0));

    input.handle_gamepad_event(GamepadEvent::Axis(GamepadAxis::RightX, 32767));
    input.handle_gamepad_event(GamepadEvent::Axis(GamepadAxis::RightY, i16::MIN));
    assert_eq!(input.right_axis(), Vector2::new(1.0, -1.0));

    input.handle_gamepad_event(GamepadEvent::Axis(GamepadAxis::LeftX, 16384));
    assert!((input.axis(GamepadAxis::LeftX) - 0.5).abs() < 1e-3);
}

#[test]
fn directional_pad_is_clamped() {
    let mut input = mapped_input();
    input.handle_gamepad_event(GamepadEvent::DirectionalPad(3, -1));
    assert_eq!(input.directional_pad(), Vector2::new(1, -1));
}

#[test]
fn mouse_collision_includes_the_edges() {
    let mut input = InputManager::new();
    let bounds = Bounds2D::new(10.0, 20.0, 100.0, 50.0);

    input.set_mouse_position(10.0, 20.0);
    assert!(input.is_mouse_colliding(&bounds));
    input.set_mouse_position(110.0, 70.0);
    assert!(input.is_mouse_colliding(&bounds));
    input.set_mouse_position(110.5, 40.0);
    assert!(!input.is_mouse_colliding(&bounds));
    assert_eq!(input.mouse_position(), Vector2::new(110.5, 40.0));
}

#[test]
fn window_close_is_remembered() {
    let mut input = InputManager::default();
    assert!(!input.is_window_closed());
    input.set_window_closed(true);
    assert!(input.is_window_closed());
}

#[test]
fn end_frame_clears_motion_and_wheel() {
    let mut input = InputManager::new();
    input.handle_device_event(&winit::event::DeviceEvent::MouseMotion { delta: (3.0, -2.0) });
    input.handle_device_event(&winit::event::DeviceEvent::MouseMotion { delta: (1.0, 1.0) });
    assert_eq!(input.mouse_motion(), Vector2::new(4.0, -1.0));

    input.end_frame();
    assert_eq!(input.mouse_motion(), Vector2::new(0.0, 0.0));
    assert_eq!(input.mouse_wheel(), Vector2::new(0.0, 0.0));
}

#[test]
fn widget_rects_scale_with_the_window() {
    let rect = Rect::new(540.0, 300.0, 200.0, 60.0);
    assert_eq!(rect.bounds_in([1280, 720]), Bounds2D::new(540.0, 300.0, 200.0, 60.0));
    assert_eq!(rect.bounds_in([2560, 1440]), Bounds2D::new(1080.0, 600.0, 400.0, 120.0));

    let quad = Rect::screen().quad();
    assert_eq!(quad[0].position, [-1.0, 1.0]);
    assert_eq!(quad[3].position, [1.0, -1.0]);
}

#[test]
fn widgets_are_described_by_config_blocks() {
    let button = WidgetDesc::from_block(&object_data(INTERFACE, "MenuPlay").unwrap()).unwrap();
    assert_eq!(button.tag, "Play");
    assert_eq!(button.sprite, "textures/button_play.png");
    assert_eq!(button.rect, Rect::new(540.0, 300.0, 200.0, 60.0));
    assert_eq!(button.action.as_deref(), Some("play"));

    let background =
        WidgetDesc::from_block(&object_data(INTERFACE, "MenuBackground").unwrap()).unwrap();
    assert_eq!(background.rect, Rect::screen());
    assert_eq!(background.action, None);

    let unnamed = WidgetDesc::from_block(&object_data(INTERFACE, "Unterminated").unwrap()).unwrap();
    assert_eq!(unnamed.tag, "Unterminated");
}

#[test]
fn widgets_are_clicked_once_per_press() {
    let button = WidgetDesc::from_block(&object_data(INTERFACE, "MenuPlay").unwrap()).unwrap();
    let window = [1280, 720];
    let mut input = InputManager::new();

    input.set_mouse_position(600.0, 330.0);
    assert!(button.is_hovered(&input, window));
    assert!(!button.is_clicked(&mut input, window));

    input.set_mouse_button(MouseButton::Left, true);
    assert!(button.is_clicked(&mut input, window));
    assert!(!button.is_clicked(&mut input, window));

    input.set_mouse_button(MouseButton::Left, false);
    input.set_mouse_position(10.0, 10.0);
    input.set_mouse_button(MouseButton::Left, true);
    assert!(!button.is_clicked(&mut input, window));
}

#[test]
fn play_screen_buttons_open_the_menu_and_the_guide() {
    let file = TagFile::open("assets/files/interfaceObjects.config").unwrap();
    let action = |block: &str| {
        let desc = WidgetDesc::from_block(&file.block(block).unwrap()).unwrap();
        desc.action.as_deref().and_then(transition_for)
    };
    assert_eq!(
        action("PlayMenu"),
        Some(Transition::Permanent(StateKind::Menu))
    );
    assert_eq!(
        action("PlayHelp"),
        Some(Transition::Temporary(StateKind::Guide))
    );
}
