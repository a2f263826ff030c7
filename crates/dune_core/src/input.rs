//! Input state tracking with both edge-triggered and level-triggered queries.
//!
//! - **Level-triggered (held):** `is_held(key)` / `is_mouse_held(btn)` are true
//!   every frame the key or button is physically down. The orbit camera uses
//!   this for dragging.
//!
//! - **Edge-triggered (just_pressed / just_released):** true only during the
//!   frame the transition happened, cleared by `end_frame()` once the frame
//!   has turned them into control events.
//!
//! Mouse motion is accumulated into a per-frame drag delta so the camera sees
//! every pixel of movement even when several cursor events arrive per frame.

use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Digit1,
    Digit2,
    Digit3,
    N,
    Escape,
    F3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

pub struct InputState {
    held: HashSet<Key>,
    just_pressed: HashSet<Key>,
    just_released: HashSet<Key>,

    mouse_held: HashSet<MouseBtn>,
    mouse_just_pressed: HashSet<MouseBtn>,
    mouse_just_released: HashSet<MouseBtn>,

    pub mouse_position: (f64, f64),
    mouse_delta: (f64, f64),
    has_mouse_position: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_just_pressed: HashSet::new(),
            mouse_just_released: HashSet::new(),
            mouse_position: (0.0, 0.0),
            mouse_delta: (0.0, 0.0),
            has_mouse_position: false,
        }
    }

    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            self.just_pressed.insert(key);
        }
    }

    pub fn key_up(&mut self, key: Key) {
        if self.held.remove(&key) {
            self.just_released.insert(key);
        }
    }

    pub fn mouse_down(&mut self, btn: MouseBtn) {
        if self.mouse_held.insert(btn) {
            self.mouse_just_pressed.insert(btn);
        }
    }

    pub fn mouse_up(&mut self, btn: MouseBtn) {
        if self.mouse_held.remove(&btn) {
            self.mouse_just_released.insert(btn);
        }
    }

    /// Record a new cursor position. The first position only seeds tracking.
    pub fn mouse_moved(&mut self, x: f64, y: f64) {
        if self.has_mouse_position {
            self.mouse_delta.0 += x - self.mouse_position.0;
            self.mouse_delta.1 += y - self.mouse_position.1;
        }
        self.mouse_position = (x, y);
        self.has_mouse_position = true;
    }

    /// Cursor movement accumulated since the last `end_frame()`.
    pub fn mouse_delta(&self) -> (f64, f64) {
        self.mouse_delta
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn is_just_pressed(&self, key: Key) -> bool {
        self.just_pressed.contains(&key)
    }

    pub fn is_just_released(&self, key: Key) -> bool {
        self.just_released.contains(&key)
    }

    pub fn is_mouse_held(&self, btn: MouseBtn) -> bool {
        self.mouse_held.contains(&btn)
    }

    pub fn is_mouse_just_pressed(&self, btn: MouseBtn) -> bool {
        self.mouse_just_pressed.contains(&btn)
    }

    pub fn is_mouse_just_released(&self, btn: MouseBtn) -> bool {
        self.mouse_just_released.contains(&btn)
    }

    pub fn end_frame(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
        self.mouse_just_pressed.clear();
        self.mouse_just_released.clear();
        self.mouse_delta = (0.0, 0.0);
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_down_sets_held_and_just_pressed() {
        let mut input = InputState::new();
        input.key_down(Key::N);
        assert!(input.is_held(Key::N));
        assert!(input.is_just_pressed(Key::N));
    }

    #[test]
    fn test_key_up_clears_held_sets_just_released() {
        let mut input = InputState::new();
        input.key_down(Key::Digit1);
        input.key_up(Key::Digit1);
        assert!(!input.is_held(Key::Digit1));
        assert!(input.is_just_released(Key::Digit1));
    }

    #[test]
    fn test_key_repeat_keeps_single_press() {
        let mut input = InputState::new();
        input.key_down(Key::N);
        input.end_frame();
        // OS key repeat delivers another press while held; it must not
        // toggle day/night a second time.
        input.key_down(Key::N);
        assert!(input.is_held(Key::N));
        assert!(!input.is_just_pressed(Key::N));
    }

    #[test]
    fn test_key_up_without_down_is_no_op() {
        let mut input = InputState::new();
        input.key_up(Key::Escape);
        assert!(!input.is_just_released(Key::Escape));
        assert!(!input.is_held(Key::Escape));
    }

    #[test]
    fn test_end_frame_clears_transient_state() {
        let mut input = InputState::new();
        input.key_down(Key::Digit2);
        input.mouse_down(MouseBtn::Left);
        input.end_frame();
        assert!(!input.is_just_pressed(Key::Digit2));
        assert!(!input.is_mouse_just_pressed(MouseBtn::Left));
        assert!(input.is_held(Key::Digit2));
        assert!(input.is_mouse_held(MouseBtn::Left));
    }

    #[test]
    fn test_mouse_up_sets_just_released() {
        let mut input = InputState::new();
        input.mouse_down(MouseBtn::Left);
        input.mouse_up(MouseBtn::Left);
        assert!(input.is_mouse_just_released(MouseBtn::Left));
        assert!(!input.is_mouse_held(MouseBtn::Left));
    }

    #[test]
    fn test_first_mouse_move_only_seeds_position() {
        let mut input = InputState::new();
        input.mouse_moved(100.0, 200.0);
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
        assert_eq!(input.mouse_position, (100.0, 200.0));
    }

    #[test]
    fn test_mouse_delta_accumulates_until_end_frame() {
        let mut input = InputState::new();
        input.mouse_moved(10.0, 10.0);
        input.mouse_moved(15.0, 8.0);
        input.mouse_moved(20.0, 4.0);
        assert_eq!(input.mouse_delta(), (10.0, -6.0));
        input.end_frame();
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
        input.mouse_moved(21.0, 4.0);
        assert_eq!(input.mouse_delta(), (1.0, 0.0));
    }

    #[test]
    fn test_default_state_is_empty() {
        let input = InputState::new();
        assert!(!input.is_held(Key::N));
        assert!(!input.is_just_pressed(Key::N));
        assert!(!input.is_mouse_held(MouseBtn::Left));
        assert_eq!(input.mouse_delta(), (0.0, 0.0));
    }
}
