use plotters::{
    prelude::*,
    style::{
        full_palette::{ORANGE, RED_900, YELLOW_100},
        text_anchor::{HPos, Pos, VPos},
    },
};

use super::confusion::ConfusionMatrix;

const CELL_SIZE: i32 = 48;

/// Approximate width of one label character at the label font size
const CHAR_WIDTH: i32 = 7;

const MARGIN: i32 = 60;

const FONT: &str = "sans-serif";

/// The scale color for a fraction of the largest count, yellow through orange to dark red
pub fn color(fraction: f64) -> RGBColor {
    DerivedColorMap::new(&[YELLOW_100, ORANGE, RED_900]).get_color(fraction.clamp(0.0, 1.0) as f32)
}

fn text_style(size: u32, h_pos: HPos) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font()).pos(Pos::new(h_pos, VPos::Center))
}

/// Render a confusion matrix as an annotated SVG heatmap
pub fn render(matrix: &ConfusionMatrix) -> anyhow::Result<String> {
    let labels = matrix.labels();
    let n = labels.len() as i32;
    let max = matrix.max().max(1) as f64;

    let label_width = labels
        .iter()
        .map(|label| label.chars().count())
        .max()
        .unwrap_or_default() as i32
        * CHAR_WIDTH;

    let left = MARGIN + label_width;
    let top = MARGIN;
    let grid = n * CELL_SIZE;
    let x_axis_y = top + grid + label_width + 40;

    let width = left + grid + MARGIN;
    let height = x_axis_y + MARGIN / 2;

    let mut svg = String::new();

    {
        let root = SVGBackend::with_string(&mut svg, (width as u32, height as u32))
            .into_drawing_area();

        root.fill(&WHITE)?;

        root.draw(&Text::new(
            "Confusion matrix",
            (left + grid / 2, 32),
            text_style(16, HPos::Center),
        ))?;

        for (row, counts) in matrix.counts().iter().enumerate() {
            let y = top + row as i32 * CELL_SIZE;

            for (column, &count) in counts.iter().enumerate() {
                let x = left + column as i32 * CELL_SIZE;
                let fraction = count as f64 / max;
                let text_color = if fraction > 0.5 { &WHITE } else { &BLACK };

                root.draw(&Rectangle::new(
                    [(x, y), (x + CELL_SIZE, y + CELL_SIZE)],
                    color(fraction).filled(),
                ))?;

                root.draw(&Text::new(
                    count.to_string(),
                    (x + CELL_SIZE / 2, y + CELL_SIZE / 2),
                    text_style(11, HPos::Center).color(text_color),
                ))?;
            }
        }

        for (i, label) in labels.iter().enumerate() {
            let offset = i as i32 * CELL_SIZE + CELL_SIZE / 2;

            root.draw(&Text::new(
                label.as_str(),
                (left - 6, top + offset),
                text_style(11, HPos::Right),
            ))?;

            root.draw(&Text::new(
                label.as_str(),
                (left + offset, top + grid + 8),
                TextStyle::from((FONT, 11).into_font())
                    .pos(Pos::new(HPos::Right, VPos::Center))
                    .transform(FontTransform::Rotate270),
            ))?;
        }

        root.draw(&Text::new(
            "Predicted labels",
            (left + grid / 2, x_axis_y),
            text_style(13, HPos::Center),
        ))?;

        root.draw(&Text::new(
            "True labels",
            (20, top + grid / 2),
            text_style(13, HPos::Center).transform(FontTransform::Rotate270),
        ))?;

        root.present()?;
    }

    Ok(svg)
}
