//! Per-tick input snapshot — the input-device collaborator boundary.
//!
//! The widget system never talks to a windowing backend. The host records
//! device transitions into an [`InputState`] (press/release/wheel/position),
//! hands it to [`crate::system::UiSystem::update`] once per tick, and calls
//! [`InputState::begin_frame`] before recording the next tick. Queries are
//! the boolean triple the dispatch loop needs: down now, went down this
//! tick, went up this tick.

/// Mouse button identifier (decoupled from any windowing backend).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    /// All buttons, in dispatch order.
    pub const ALL: [MouseButton; 3] = [MouseButton::Left, MouseButton::Right, MouseButton::Middle];

    const fn mask(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Right => 2,
            MouseButton::Middle => 4,
        }
    }
}

/// Keyboard key (closed set; extend as bindings need it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Delete,
    Insert,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Space,
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    Minus,
    Period,
    Comma,
}

impl Key {
    /// Printable character for this key, if any. Drives `KeyChar` dispatch.
    pub const fn to_char(self, shift: bool) -> Option<char> {
        let lower = match self {
            Key::Space => return Some(' '),
            Key::A => 'a', Key::B => 'b', Key::C => 'c', Key::D => 'd',
            Key::E => 'e', Key::F => 'f', Key::G => 'g', Key::H => 'h',
            Key::I => 'i', Key::J => 'j', Key::K => 'k', Key::L => 'l',
            Key::M => 'm', Key::N => 'n', Key::O => 'o', Key::P => 'p',
            Key::Q => 'q', Key::R => 'r', Key::S => 's', Key::T => 't',
            Key::U => 'u', Key::V => 'v', Key::W => 'w', Key::X => 'x',
            Key::Y => 'y', Key::Z => 'z',
            Key::Num0 => '0', Key::Num1 => '1', Key::Num2 => '2',
            Key::Num3 => '3', Key::Num4 => '4', Key::Num5 => '5',
            Key::Num6 => '6', Key::Num7 => '7', Key::Num8 => '8',
            Key::Num9 => '9',
            Key::Minus => if shift { '_' } else { '-' },
            Key::Period => '.',
            Key::Comma => ',',
            _ => return None,
        };
        if shift && lower.is_ascii_lowercase() {
            Some(lower.to_ascii_uppercase())
        } else {
            Some(lower)
        }
    }
}

/// Modifier keys, sampled fresh each tick and attached to every key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

/// Input device state for one tick.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    mouse_x: i32,
    mouse_y: i32,
    prev_mouse_x: i32,
    prev_mouse_y: i32,
    /// Buttons that went down this tick.
    buttons_pressed: u8,
    /// Buttons that went up this tick.
    buttons_released: u8,
    /// Buttons currently held.
    buttons_down: u8,
    wheel_delta: i32,
    modifiers: Modifiers,
    keys_pressed: Vec<Key>,
    keys_released: Vec<Key>,
    keys_down: Vec<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears per-tick transition state. Held buttons/keys and the cursor
    /// position persist.
    pub fn begin_frame(&mut self) {
        self.prev_mouse_x = self.mouse_x;
        self.prev_mouse_y = self.mouse_y;
        self.buttons_pressed = 0;
        self.buttons_released = 0;
        self.wheel_delta = 0;
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    pub fn set_mouse_pos(&mut self, x: i32, y: i32) {
        self.mouse_x = x;
        self.mouse_y = y;
    }

    pub fn mouse_button_down(&mut self, button: MouseButton) {
        let mask = button.mask();
        self.buttons_pressed |= mask;
        self.buttons_down |= mask;
    }

    pub fn mouse_button_up(&mut self, button: MouseButton) {
        let mask = button.mask();
        self.buttons_released |= mask;
        self.buttons_down &= !mask;
    }

    /// Accumulates wheel notches (positive = away from the user).
    pub fn scroll(&mut self, delta: i32) {
        self.wheel_delta += delta;
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn key_down(&mut self, key: Key) {
        if !self.keys_down.contains(&key) {
            self.keys_pressed.push(key);
            self.keys_down.push(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.keys_released.push(key);
        self.keys_down.retain(|&k| k != key);
    }

    // -- Queries --------------------------------------------------------

    pub fn mouse_pos(&self) -> (i32, i32) {
        (self.mouse_x, self.mouse_y)
    }

    pub fn mouse_moved(&self) -> bool {
        self.mouse_x != self.prev_mouse_x || self.mouse_y != self.prev_mouse_y
    }

    /// Button went down this tick.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        (self.buttons_pressed & button.mask()) != 0
    }

    /// Button went up this tick.
    pub fn mouse_released(&self, button: MouseButton) -> bool {
        (self.buttons_released & button.mask()) != 0
    }

    /// Button is currently held.
    pub fn mouse_down(&self, button: MouseButton) -> bool {
        (self.buttons_down & button.mask()) != 0
    }

    pub fn any_button_released(&self) -> bool {
        self.buttons_released != 0
    }

    pub fn wheel_delta(&self) -> i32 {
        self.wheel_delta
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn keys_pressed(&self) -> &[Key] {
        &self.keys_pressed
    }

    pub fn keys_released(&self) -> &[Key] {
        &self.keys_released
    }

    pub fn key_held(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }
}
