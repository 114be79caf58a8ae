use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgb, RgbImage};

use crate::error::RenderError;
use crate::types::Pixel;

/// Edge length, in image pixels, of one canvas cell.
pub const BLOCK_SIZE: u32 = 2;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Parses `#RRGGBB` (the leading `#` is optional).
pub fn parse_color(color: &str) -> Result<Rgb<u8>, RenderError> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RenderError::InvalidColor(color.to_owned()));
    }
    let value =
        u32::from_str_radix(hex, 16).map_err(|_| RenderError::InvalidColor(color.to_owned()))?;
    Ok(Rgb([(value >> 16) as u8, (value >> 8) as u8, value as u8]))
}

/// Rasterizes painted cells onto a white `grid_size * block` square and encodes it as PNG.
pub fn render_png<'a, I>(pixels: I, grid_size: u16, block: u32) -> Result<Vec<u8>, RenderError>
where
    I: IntoIterator<Item = &'a Pixel>,
{
    let side = u32::from(grid_size) * block;
    let mut image = RgbImage::from_pixel(side, side, BACKGROUND);

    for pixel in pixels {
        let color = parse_color(&pixel.color)?;
        let (left, top) = (u32::from(pixel.x) * block, u32::from(pixel.y) * block);
        for dy in 0..block {
            for dx in 0..block {
                let (ix, iy) = (left + dx, top + dy);
                if ix < side && iy < side {
                    image.put_pixel(ix, iy, color);
                }
            }
        }
    }

    let mut buf = Vec::new();
    PngEncoder::new(&mut buf).write_image(image.as_raw(), side, side, ColorType::Rgb8)?;
    Ok(buf)
}
