use crate::color::Color;
use crate::error::FormatError;
use crate::user_data::UserData;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopDirection {
    #[default]
    Forward,
    Reverse,
    PingPong,
    PingPongReverse,
}

impl LoopDirection {
    pub fn from_u8(value: u8) -> Result<Self, FormatError> {
        match value {
            0 => Ok(LoopDirection::Forward),
            1 => Ok(LoopDirection::Reverse),
            2 => Ok(LoopDirection::PingPong),
            3 => Ok(LoopDirection::PingPongReverse),
            other => Err(FormatError::UnknownLoopDirection(other)),
        }
    }
}

/// A named animation over an inclusive frame range
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Tag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    pub direction: LoopDirection,
    /// 0 loops forever
    pub repeat: u16,
    pub color: Color,
    pub user_data: Option<UserData>,
}

impl Tag {
    pub fn frames(&self) -> RangeInclusive<usize> {
        self.from..=self.to
    }

    /// The user data color when there is one, the tag color otherwise
    pub fn display_color(&self) -> Color {
        self.user_data
            .as_ref()
            .and_then(|ud| ud.color)
            .unwrap_or(self.color)
    }
}
