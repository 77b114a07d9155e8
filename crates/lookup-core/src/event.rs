#![forbid(unsafe_code)]

//! Input events as the lookup widget sees them.
//!
//! A host forwards three streams: keys typed into the lookup input, pointer
//! activity anywhere on the surface (needed for outside-press dismissal),
//! and focus changes of the input. On native targets [`Event::from_crossterm`]
//! builds these from a terminal event stream; other hosts construct them
//! directly.
//!
//! Pointer coordinates are 0-indexed cells in the same space as
//! [`crate::geometry::Rect`].

use bitflags::bitflags;

/// One host input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Key activity in the lookup input.
    Key(KeyEvent),
    /// Pointer activity somewhere on the surface.
    Mouse(MouseEvent),
    /// Text pasted into the input.
    Paste(PasteEvent),
    /// The input gained (`true`) or lost (`false`) focus.
    Focus(bool),
}

/// A key press, repeat, or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Unmodified press of `code`.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Press or auto-repeat. Releases never navigate.
    #[must_use]
    pub const fn is_press(&self) -> bool {
        !matches!(self.kind, KeyEventKind::Release)
    }

    /// Whether Ctrl is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }
}

/// Keys the lookup input reacts to. Anything else is dropped at the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Printable character.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Delete,
    Home,
    End,
    Up,
    Down,
    Left,
    Right,
}

/// Phase of a key event. Sources that only report presses use the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    /// Held modifier keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0;
        const SHIFT = 1 << 0;
        const ALT   = 1 << 1;
        const CTRL  = 1 << 2;
        /// Super, Meta, Hyper, or Command.
        const SUPER = 1 << 3;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Pointer activity at a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    #[must_use]
    pub const fn new(kind: MouseEventKind, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    /// Primary-button press at `(x, y)`.
    #[must_use]
    pub const fn down(x: u16, y: u16) -> Self {
        Self::new(MouseEventKind::Down(MouseButton::Left), x, y)
    }

    /// Whether any button went down. Only presses can dismiss.
    #[must_use]
    pub const fn is_down(&self) -> bool {
        matches!(self.kind, MouseEventKind::Down(_))
    }

    /// `(x, y)`.
    #[must_use]
    pub const fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    Down(MouseButton),
    Up(MouseButton),
    /// Motion with a button held.
    Drag(MouseButton),
    /// Motion with no button held.
    Moved,
    /// Wheel or trackpad scroll in any direction.
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Pasted text. Control characters are stripped by the widget, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteEvent {
    pub text: String,
}

impl PasteEvent {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod from_crossterm {
    use crossterm::event as ct;

    use super::{
        Event, KeyCode, KeyEvent, KeyEventKind, Modifiers, MouseButton, MouseEvent,
        MouseEventKind, PasteEvent,
    };

    const KEYS: [(ct::KeyCode, KeyCode); 11] = [
        (ct::KeyCode::Enter, KeyCode::Enter),
        (ct::KeyCode::Esc, KeyCode::Escape),
        (ct::KeyCode::Backspace, KeyCode::Backspace),
        (ct::KeyCode::Tab, KeyCode::Tab),
        (ct::KeyCode::Delete, KeyCode::Delete),
        (ct::KeyCode::Home, KeyCode::Home),
        (ct::KeyCode::End, KeyCode::End),
        (ct::KeyCode::Up, KeyCode::Up),
        (ct::KeyCode::Down, KeyCode::Down),
        (ct::KeyCode::Left, KeyCode::Left),
        (ct::KeyCode::Right, KeyCode::Right),
    ];

    const MODIFIERS: [(ct::KeyModifiers, Modifiers); 6] = [
        (ct::KeyModifiers::SHIFT, Modifiers::SHIFT),
        (ct::KeyModifiers::ALT, Modifiers::ALT),
        (ct::KeyModifiers::CONTROL, Modifiers::CTRL),
        (ct::KeyModifiers::SUPER, Modifiers::SUPER),
        (ct::KeyModifiers::HYPER, Modifiers::SUPER),
        (ct::KeyModifiers::META, Modifiers::SUPER),
    ];

    impl Event {
        /// Translate a crossterm event. Resizes and unsupported keys
        /// (function keys, media keys, ...) yield `None`.
        #[must_use]
        pub fn from_crossterm(event: ct::Event) -> Option<Self> {
            Some(match event {
                ct::Event::Key(key) => Self::Key(key_event(key)?),
                ct::Event::Mouse(mouse) => Self::Mouse(mouse_event(mouse)),
                ct::Event::Paste(text) => Self::Paste(PasteEvent::new(text)),
                ct::Event::FocusGained => Self::Focus(true),
                ct::Event::FocusLost => Self::Focus(false),
                ct::Event::Resize(..) => return None,
            })
        }
    }

    pub(super) fn key_code(code: ct::KeyCode) -> Option<KeyCode> {
        if let ct::KeyCode::Char(c) = code {
            return Some(KeyCode::Char(c));
        }
        KEYS.iter()
            .find(|(from, _)| *from == code)
            .map(|&(_, to)| to)
    }

    pub(super) fn modifiers(held: ct::KeyModifiers) -> Modifiers {
        MODIFIERS
            .iter()
            .filter(|(from, _)| held.contains(*from))
            .fold(Modifiers::NONE, |acc, &(_, to)| acc | to)
    }

    pub(super) fn key_event(key: ct::KeyEvent) -> Option<KeyEvent> {
        let kind = match key.kind {
            ct::KeyEventKind::Press => KeyEventKind::Press,
            ct::KeyEventKind::Repeat => KeyEventKind::Repeat,
            ct::KeyEventKind::Release => KeyEventKind::Release,
        };
        Some(
            KeyEvent::new(key_code(key.code)?)
                .with_modifiers(modifiers(key.modifiers))
                .with_kind(kind),
        )
    }

    pub(super) fn mouse_event(mouse: ct::MouseEvent) -> MouseEvent {
        let button = |b: ct::MouseButton| match b {
            ct::MouseButton::Left => MouseButton::Left,
            ct::MouseButton::Right => MouseButton::Right,
            ct::MouseButton::Middle => MouseButton::Middle,
        };
        let kind = match mouse.kind {
            ct::MouseEventKind::Down(b) => MouseEventKind::Down(button(b)),
            ct::MouseEventKind::Up(b) => MouseEventKind::Up(button(b)),
            ct::MouseEventKind::Drag(b) => MouseEventKind::Drag(button(b)),
            ct::MouseEventKind::Moved => MouseEventKind::Moved,
            ct::MouseEventKind::ScrollUp
            | ct::MouseEventKind::ScrollDown
            | ct::MouseEventKind::ScrollLeft
            | ct::MouseEventKind::ScrollRight => MouseEventKind::Scroll,
        };
        MouseEvent {
            modifiers: modifiers(mouse.modifiers),
            ..MouseEvent::new(kind, mouse.column, mouse.row)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_release_is_not_a_press() {
        let down = KeyEvent::new(KeyCode::Down);
        assert!(down.is_press());
        assert!(down.with_kind(KeyEventKind::Repeat).is_press());
        assert!(!down.with_kind(KeyEventKind::Release).is_press());
    }

    #[test]
    fn ctrl_is_detected_among_other_modifiers() {
        let chord = KeyEvent::new(KeyCode::Char('u')).with_modifiers(Modifiers::CTRL | Modifiers::SHIFT);
        assert!(chord.ctrl());
        assert!(!KeyEvent::new(KeyCode::Char('u')).ctrl());
    }

    #[test]
    fn pointer_down_shorthand() {
        let press = MouseEvent::down(4, 9);
        assert!(press.is_down());
        assert_eq!(press.position(), (4, 9));
        assert!(!MouseEvent::new(MouseEventKind::Moved, 0, 0).is_down());
        assert!(!MouseEvent::new(MouseEventKind::Up(MouseButton::Left), 0, 0).is_down());
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod crossterm_mapping {
        use crossterm::event as ct;

        use super::super::from_crossterm::{key_code, key_event, modifiers, mouse_event};
        use super::super::*;

        #[test]
        fn navigation_keys_map_and_function_keys_drop() {
            assert_eq!(key_code(ct::KeyCode::Esc), Some(KeyCode::Escape));
            assert_eq!(key_code(ct::KeyCode::Up), Some(KeyCode::Up));
            assert_eq!(key_code(ct::KeyCode::Char('é')), Some(KeyCode::Char('é')));
            assert_eq!(key_code(ct::KeyCode::F(3)), None);
            assert_eq!(key_code(ct::KeyCode::PageDown), None);
        }

        #[test]
        fn meta_like_modifiers_fold_into_super() {
            for held in [
                ct::KeyModifiers::SUPER,
                ct::KeyModifiers::HYPER,
                ct::KeyModifiers::META,
            ] {
                assert_eq!(modifiers(held), Modifiers::SUPER);
            }
            assert_eq!(
                modifiers(ct::KeyModifiers::CONTROL | ct::KeyModifiers::ALT),
                Modifiers::CTRL | Modifiers::ALT
            );
        }

        #[test]
        fn key_release_keeps_its_phase() {
            let mapped = key_event(ct::KeyEvent {
                code: ct::KeyCode::Enter,
                modifiers: ct::KeyModifiers::NONE,
                kind: ct::KeyEventKind::Release,
                state: ct::KeyEventState::NONE,
            })
            .expect("enter maps");
            assert_eq!(mapped.code, KeyCode::Enter);
            assert_eq!(mapped.kind, KeyEventKind::Release);
        }

        #[test]
        fn right_click_with_shift() {
            let mapped = mouse_event(ct::MouseEvent {
                kind: ct::MouseEventKind::Down(ct::MouseButton::Right),
                column: 12,
                row: 3,
                modifiers: ct::KeyModifiers::SHIFT,
            });
            assert_eq!(mapped.kind, MouseEventKind::Down(MouseButton::Right));
            assert_eq!(mapped.position(), (12, 3));
            assert_eq!(mapped.modifiers, Modifiers::SHIFT);
        }

        #[test]
        fn every_scroll_direction_is_scroll() {
            for kind in [
                ct::MouseEventKind::ScrollUp,
                ct::MouseEventKind::ScrollDown,
                ct::MouseEventKind::ScrollLeft,
                ct::MouseEventKind::ScrollRight,
            ] {
                let mapped = mouse_event(ct::MouseEvent {
                    kind,
                    column: 0,
                    row: 0,
                    modifiers: ct::KeyModifiers::NONE,
                });
                assert_eq!(mapped.kind, MouseEventKind::Scroll);
            }
        }

        #[test]
        fn focus_paste_and_resize() {
            assert_eq!(
                Event::from_crossterm(ct::Event::FocusLost),
                Some(Event::Focus(false))
            );
            assert_eq!(
                Event::from_crossterm(ct::Event::Paste("acme".into())),
                Some(Event::Paste(PasteEvent::new("acme")))
            );
            assert_eq!(Event::from_crossterm(ct::Event::Resize(80, 24)), None);
        }
    }
}
