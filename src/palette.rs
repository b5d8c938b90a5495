use crate::color::{Color, TRANSPARENT};
use std::ops::Index;

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Palette {
    colors: Vec<Color>,
    transparent_index: u8,
}

impl Palette {
    pub fn new(transparent_index: u8) -> Self {
        Self {
            colors: Vec::new(),
            transparent_index,
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn transparent_index(&self) -> u8 {
        self.transparent_index
    }

    /// Keeps existing entries, new slots are zeroed
    pub fn resize(&mut self, len: usize) {
        self.colors.resize(len, TRANSPARENT);
    }

    pub fn get(&self, index: usize) -> Option<&Color> {
        self.colors.get(index)
    }

    /// # Panics
    /// If `index` is not below [`Palette::len`].
    pub fn set(&mut self, index: usize, color: Color) {
        self.colors[index] = color;
    }
}

impl Index<usize> for Palette {
    type Output = Color;

    fn index(&self, index: usize) -> &Color {
        &self.colors[index]
    }
}
