// src/input/buttons.rs
//! Button level sampling.

use embedded_hal::digital::InputPin;

/// Instantaneous pressed state of both buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonLevels {
    pub left: bool,
    pub right: bool,
}

impl ButtonLevels {
    pub const RELEASED: Self = Self::new(false, false);

    pub const fn new(left: bool, right: bool) -> Self {
        Self { left, right }
    }

    pub fn both(&self) -> bool {
        self.left && self.right
    }

    pub fn any(&self) -> bool {
        self.left || self.right
    }

    pub fn none(&self) -> bool {
        !self.any()
    }
}

/// The LEFT and RIGHT buttons, pulled up and pressed when low.
pub struct ButtonPair<L, R> {
    left: L,
    right: R,
}

impl<L: InputPin, R: InputPin> ButtonPair<L, R> {
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }

    /// Sample both pins. A pin that fails to read counts as released.
    pub fn read(&mut self) -> ButtonLevels {
        ButtonLevels {
            left: self.left.is_low().unwrap_or(false),
            right: self.right.is_low().unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    struct FakePin(bool);

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    #[test]
    fn test_pins_are_active_low() {
        let mut pair = ButtonPair::new(FakePin(false), FakePin(true));
        assert_eq!(pair.read(), ButtonLevels::new(true, false));
    }

    #[test]
    fn test_levels_helpers() {
        assert!(ButtonLevels::new(true, true).both());
        assert!(ButtonLevels::new(false, true).any());
        assert!(ButtonLevels::RELEASED.none());
    }
}
