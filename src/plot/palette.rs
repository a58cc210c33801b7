use plotters::prelude::*;

/// Rotating color assignment for plot series.
pub struct SeriesPalette {
    colors: Vec<RGBColor>,
    index: usize,
}

impl SeriesPalette {
    pub fn next_color(&mut self) -> RGBColor {
        let color = self.colors[self.index];
        self.index = (self.index + 1) % self.colors.len();
        color
    }
}

impl Default for SeriesPalette {
    fn default() -> Self {
        use plotters::prelude::full_palette::*;

        Self {
            colors: vec![BLUE_700, ORANGE_800, GREEN_700, PURPLE_600, BROWN, TEAL_700],
            index: 0,
        }
    }
}
