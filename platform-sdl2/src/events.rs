// SPDX-FileCopyrightText: 2025 Jens Pitkänen <jens.pitkanen@helsinki.fi>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use platform::{Key, MouseButton, PlatformEvent};
use sdl2::{
    event::{Event, WindowEvent},
    keyboard::Scancode,
    mouse::MouseButton as SdlMouseButton,
};

/// The [`Key`] of a physical key. Keys are identified by scancode, so they
/// don't move around with the keyboard layout.
pub const fn key_for_scancode(scancode: Scancode) -> Key {
    Key::new(scancode as u32)
}

/// An SDL event translated into a [`PlatformEvent`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TranslatedEvent {
    /// The SDL window id the event was addressed to, if any.
    pub window_id: Option<u32>,
    pub event: PlatformEvent,
}

/// Translates the SDL events the platform layer cares about, and returns
/// `None` for the rest.
pub(crate) fn translate_event(event: &Event) -> Option<TranslatedEvent> {
    let (window_id, event) = match event {
        Event::Quit { .. } => (None, PlatformEvent::Quit),

        Event::Window {
            window_id,
            win_event,
            ..
        } => {
            let event = match *win_event {
                WindowEvent::FocusGained => PlatformEvent::FocusGained,
                WindowEvent::FocusLost => PlatformEvent::FocusLost,
                WindowEvent::DisplayChanged(display_index) if display_index >= 0 => {
                    PlatformEvent::DisplayChanged {
                        display_index: display_index as usize,
                    }
                }
                // RESIZED is only sent for resizes from outside the program,
                // SIZE_CHANGED for every size change.
                WindowEvent::Resized(width, height) => PlatformEvent::Resized {
                    width: width.max(0) as u32,
                    height: height.max(0) as u32,
                    user_initiated: true,
                },
                WindowEvent::SizeChanged(width, height) => PlatformEvent::Resized {
                    width: width.max(0) as u32,
                    height: height.max(0) as u32,
                    user_initiated: false,
                },
                _ => return None,
            };
            (Some(*window_id), event)
        }

        Event::KeyDown {
            window_id,
            scancode: Some(scancode),
            repeat: false,
            ..
        } => (
            Some(*window_id),
            PlatformEvent::KeyDown(key_for_scancode(*scancode)),
        ),
        Event::KeyUp {
            window_id,
            scancode: Some(scancode),
            ..
        } => (
            Some(*window_id),
            PlatformEvent::KeyUp(key_for_scancode(*scancode)),
        ),

        Event::MouseMotion {
            window_id, x, y, ..
        } => (Some(*window_id), PlatformEvent::MouseMotion { x: *x, y: *y }),
        Event::MouseButtonDown {
            window_id,
            mouse_btn,
            ..
        } => (
            Some(*window_id),
            PlatformEvent::MouseButtonDown(mouse_button(*mouse_btn)?),
        ),
        Event::MouseButtonUp {
            window_id,
            mouse_btn,
            ..
        } => (
            Some(*window_id),
            PlatformEvent::MouseButtonUp(mouse_button(*mouse_btn)?),
        ),
        Event::MouseWheel { window_id, y, .. } => {
            (Some(*window_id), PlatformEvent::MouseWheel { delta: *y })
        }

        _ => return None,
    };
    Some(TranslatedEvent { window_id, event })
}

fn mouse_button(button: SdlMouseButton) -> Option<MouseButton> {
    match button {
        SdlMouseButton::Left => Some(MouseButton::Left),
        SdlMouseButton::Middle => Some(MouseButton::Middle),
        SdlMouseButton::Right => Some(MouseButton::Right),
        SdlMouseButton::X1 => Some(MouseButton::X1),
        SdlMouseButton::X2 => Some(MouseButton::X2),
        SdlMouseButton::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use platform::PlatformEvent;
    use sdl2::event::{Event, WindowEvent};

    use super::{translate_event, TranslatedEvent};

    fn window_event(win_event: WindowEvent) -> Event {
        Event::Window {
            timestamp: 0,
            window_id: 3,
            win_event,
        }
    }

    #[test]
    fn quit_has_no_window() {
        assert_eq!(
            Some(TranslatedEvent {
                window_id: None,
                event: PlatformEvent::Quit,
            }),
            translate_event(&Event::Quit { timestamp: 0 }),
        );
    }

    #[test]
    fn only_external_resizes_are_user_initiated() {
        let user = translate_event(&window_event(WindowEvent::Resized(640, 480))).unwrap();
        assert_eq!(Some(3), user.window_id);
        assert_eq!(
            PlatformEvent::Resized {
                width: 640,
                height: 480,
                user_initiated: true,
            },
            user.event,
        );

        let programmatic =
            translate_event(&window_event(WindowEvent::SizeChanged(640, 480))).unwrap();
        assert_eq!(
            PlatformEvent::Resized {
                width: 640,
                height: 480,
                user_initiated: false,
            },
            programmatic.event,
        );
    }

    #[test]
    fn focus_and_display_changes_are_translated() {
        assert_eq!(
            PlatformEvent::FocusLost,
            translate_event(&window_event(WindowEvent::FocusLost))
                .unwrap()
                .event,
        );
        assert_eq!(
            PlatformEvent::DisplayChanged { display_index: 1 },
            translate_event(&window_event(WindowEvent::DisplayChanged(1)))
                .unwrap()
                .event,
        );
        assert_eq!(None, translate_event(&window_event(WindowEvent::Exposed)));
    }
}
