use bitflags::bitflags;
use macroquad::prelude::*;
use thiserror::Error;

bitflags! {
    /// Set of screen directions. Diagonals are unions of the four axes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Direction: u8 {
        const LEFT = 1;
        const UP = 2;
        const RIGHT = 4;
        const DOWN = 8;

        const LEFT_UP = Self::LEFT.bits() | Self::UP.bits();
        const LEFT_DOWN = Self::LEFT.bits() | Self::DOWN.bits();
        const RIGHT_UP = Self::RIGHT.bits() | Self::UP.bits();
        const RIGHT_DOWN = Self::RIGHT.bits() | Self::DOWN.bits();
        const BOTH_HORIZONTAL = Self::LEFT.bits() | Self::RIGHT.bits();
        const BOTH_VERTICAL = Self::UP.bits() | Self::DOWN.bits();
        const ALL = Self::LEFT.bits() | Self::UP.bits() | Self::RIGHT.bits() | Self::DOWN.bits();
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectionError {
    #[error("there is no integer linked to direction {0:?}")]
    NoIntegerForDirection(Direction),
    #[error("there is no direction linked to value {0}")]
    NoDirectionForInteger(i32),
}

impl Direction {
    pub const NONE: Self = Self::empty();

    /// Only the empty set and the four single axes have an integer form.
    pub fn to_int(self) -> Result<i32, DirectionError> {
        match self.bits() {
            0 | 1 | 2 | 4 | 8 => Ok(self.bits() as i32),
            _ => Err(DirectionError::NoIntegerForDirection(self)),
        }
    }

    pub fn from_int(value: i32) -> Result<Self, DirectionError> {
        match value {
            0 => Ok(Self::NONE),
            1 => Ok(Self::LEFT),
            2 => Ok(Self::UP),
            4 => Ok(Self::RIGHT),
            8 => Ok(Self::DOWN),
            _ => Err(DirectionError::NoDirectionForInteger(value)),
        }
    }

    /// Mirrors every axis present in the set.
    pub fn opposite(self) -> Self {
        let mut result = Self::NONE;
        if self.contains(Self::LEFT) {
            result |= Self::RIGHT;
        }
        if self.contains(Self::RIGHT) {
            result |= Self::LEFT;
        }
        if self.contains(Self::UP) {
            result |= Self::DOWN;
        }
        if self.contains(Self::DOWN) {
            result |= Self::UP;
        }
        result
    }

    pub fn from_vector(v: Vec2) -> Self {
        let mut result = Self::NONE;
        if v.x < 0.0 {
            result |= Self::LEFT;
        } else if v.x > 0.0 {
            result |= Self::RIGHT;
        }
        if v.y < 0.0 {
            result |= Self::UP;
        } else if v.y > 0.0 {
            result |= Self::DOWN;
        }
        result
    }

    pub fn horizontal_sign(self) -> f32 {
        match (self.contains(Self::LEFT), self.contains(Self::RIGHT)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn vertical_sign(self) -> f32 {
        match (self.contains(Self::UP), self.contains(Self::DOWN)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn unit_vector(self) -> Vec2 {
        vec2(self.horizontal_sign(), self.vertical_sign())
    }
}

impl TryFrom<i32> for Direction {
    type Error = DirectionError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::from_int(value)
    }
}
