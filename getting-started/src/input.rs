use std::collections::HashMap;

use winit::keyboard::KeyCode;

#[derive(Debug, Default)]
pub struct Keyboard {
    states: HashMap<KeyCode, KeyState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    /// The key is up. e.g. not pressed.
    Up,
    /// The key went down since the last poll.
    Pressed,
    /// The key went up since the last poll.
    Released,
    /// The key went down during an earlier poll and is still down.
    Held,
}

impl Keyboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_key_state(&self, key: KeyCode) -> Option<KeyState> {
        self.states.get(&key).copied()
    }

    /// Whether the key is down right now, no matter when it went down.
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        matches!(
            self.get_key_state(key),
            Some(KeyState::Pressed | KeyState::Held)
        )
    }

    pub fn press_key(&mut self, key: KeyCode) {
        if !self.is_key_down(key) {
            self.states.insert(key, KeyState::Pressed);
        }
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.states.insert(key, KeyState::Released);
    }

    /// Age the states by one poll.
    pub fn update_keys(&mut self) {
        for state in self.states.values_mut() {
            if *state == KeyState::Pressed {
                *state = KeyState::Held;
            } else if *state == KeyState::Released {
                *state = KeyState::Up;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_stay_down() {
        let mut keyboard = Keyboard::new();
        assert!(!keyboard.is_key_down(KeyCode::Escape));

        keyboard.press_key(KeyCode::Escape);
        assert_eq!(
            keyboard.get_key_state(KeyCode::Escape),
            Some(KeyState::Pressed)
        );
        assert!(keyboard.is_key_down(KeyCode::Escape));

        keyboard.update_keys();
        assert_eq!(keyboard.get_key_state(KeyCode::Escape), Some(KeyState::Held));
        assert!(keyboard.is_key_down(KeyCode::Escape));

        // a second press while held does not restart it
        keyboard.press_key(KeyCode::Escape);
        assert_eq!(keyboard.get_key_state(KeyCode::Escape), Some(KeyState::Held));

        keyboard.release_key(KeyCode::Escape);
        assert!(!keyboard.is_key_down(KeyCode::Escape));
        keyboard.update_keys();
        assert_eq!(keyboard.get_key_state(KeyCode::Escape), Some(KeyState::Up));
    }
}
