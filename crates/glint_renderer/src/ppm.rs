//! Portable pixmap (PPM, P3) image writer.

use std::io::{self, Write};

use crate::renderer::ImageBuffer;

/// Write an image as ASCII PPM.
///
/// Pixels are emitted row-major, top to bottom, left to right; each channel
/// is `floor(255.999 * clamp(x, 0, 1))`. Inputs are expected in [0, 1];
/// out-of-range values are clamped.
pub fn write_ppm<W: Write>(writer: &mut W, image: &ImageBuffer) -> io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "255")?;

    for pixel in &image.pixels {
        let r = (255.999 * pixel.x.clamp(0.0, 1.0)) as u32;
        let g = (255.999 * pixel.y.clamp(0.0, 1.0)) as u32;
        let b = (255.999 * pixel.z.clamp(0.0, 1.0)) as u32;
        writeln!(writer, "{} {} {}", r, g, b)?;
    }

    Ok(())
}
