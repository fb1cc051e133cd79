//! PNG ticket rendering.
//!
//! Tickets are a card (or a configured template image) with a colour band for the
//! ticket type and the ticket number stamped in seven-segment digits, so no font
//! files are needed at runtime.

use crate::db::types::TicketType;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;
use thiserror::Error;

const CARD_WIDTH: u32 = 800;
const CARD_HEIGHT: u32 = 400;
const DIGIT_WIDTH: u32 = 60;
const DIGIT_HEIGHT: u32 = 110;
const SEGMENT: u32 = 12;
const DIGIT_GAP: u32 = 24;
const MIN_DIGITS: usize = 4;

const BACKGROUND: Rgba<u8> = Rgba([250, 250, 245, 255]);
const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);

// Segment bits: a b c d e f g (top, top-right, bottom-right, bottom, bottom-left, top-left, middle)
const DIGIT_SEGMENTS: [u8; 10] = [
    0b1111110, 0b0110000, 0b1101101, 0b1111001, 0b0110011, 0b1011011, 0b1011111, 0b1110000,
    0b1111111, 0b1111011,
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to load ticket template {path}: {source}")]
    Template {
        path: String,
        source: image::ImageError,
    },
}

pub trait TicketRenderer: Send + Sync {
    /// Renders the ticket and returns PNG bytes.
    fn render(&self, ticket_number: i64, ticket_type: TicketType) -> Result<Vec<u8>, RenderError>;
}

pub struct PngTicketRenderer {
    template: Option<RgbaImage>,
}

impl PngTicketRenderer {
    pub fn new(template: Option<&str>) -> Result<Self, RenderError> {
        let template = match template {
            Some(path) => Some(
                image::open(path)
                    .map_err(|source| RenderError::Template {
                        path: path.to_string(),
                        source,
                    })?
                    .to_rgba8(),
            ),
            None => None,
        };
        Ok(Self { template })
    }

    fn canvas(&self) -> RgbaImage {
        match &self.template {
            Some(template) => template.clone(),
            None => RgbaImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, BACKGROUND),
        }
    }
}

fn band_colour(ticket_type: TicketType) -> Rgba<u8> {
    match ticket_type {
        TicketType::Base => Rgba([240, 200, 40, 255]),
        TicketType::Vip(_) => Rgba([40, 90, 200, 255]),
        TicketType::Org => Rgba([200, 40, 40, 255]),
    }
}

/// Fills a rectangle, clipped to the image.
fn fill_rect(img: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, colour: Rgba<u8>) {
    let x_end = (x + w).min(img.width());
    let y_end = (y + h).min(img.height());
    for py in y..y_end {
        for px in x..x_end {
            img.put_pixel(px, py, colour);
        }
    }
}

fn draw_digit(img: &mut RgbaImage, x: u32, y: u32, digit: usize) {
    let bits = DIGIT_SEGMENTS[digit];
    let half = DIGIT_HEIGHT / 2;
    let on = |bit: u8| bits & (1 << (6 - bit)) != 0;

    if on(0) {
        fill_rect(img, x, y, DIGIT_WIDTH, SEGMENT, INK);
    }
    if on(1) {
        fill_rect(img, x + DIGIT_WIDTH - SEGMENT, y, SEGMENT, half, INK);
    }
    if on(2) {
        fill_rect(img, x + DIGIT_WIDTH - SEGMENT, y + half, SEGMENT, half, INK);
    }
    if on(3) {
        fill_rect(img, x, y + DIGIT_HEIGHT - SEGMENT, DIGIT_WIDTH, SEGMENT, INK);
    }
    if on(4) {
        fill_rect(img, x, y + half, SEGMENT, half, INK);
    }
    if on(5) {
        fill_rect(img, x, y, SEGMENT, half, INK);
    }
    if on(6) {
        fill_rect(img, x, y + half - SEGMENT / 2, DIGIT_WIDTH, SEGMENT, INK);
    }
}

impl TicketRenderer for PngTicketRenderer {
    fn render(&self, ticket_number: i64, ticket_type: TicketType) -> Result<Vec<u8>, RenderError> {
        let mut img = self.canvas();
        let (width, height) = img.dimensions();

        let band = (width / 10).max(1);
        fill_rect(&mut img, 0, 0, band, height, band_colour(ticket_type));

        let digits = format!("{:0width$}", ticket_number.max(0), width = MIN_DIGITS);
        let total = digits.len() as u32 * (DIGIT_WIDTH + DIGIT_GAP) - DIGIT_GAP;
        let start_x = band + (width.saturating_sub(band).saturating_sub(total)) / 2;
        let start_y = height.saturating_sub(DIGIT_HEIGHT) / 2;

        for (i, ch) in digits.chars().enumerate() {
            if let Some(d) = ch.to_digit(10) {
                let x = start_x + i as u32 * (DIGIT_WIDTH + DIGIT_GAP);
                draw_digit(&mut img, x, start_y, d as usize);
            }
        }

        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png)?;
        Ok(bytes.into_inner())
    }
}
