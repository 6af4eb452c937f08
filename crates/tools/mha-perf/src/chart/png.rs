//! Minimal PNG encoder for 8-bit RGB canvases.
//!
//! Emits `IHDR`, `pHYs` (so viewers see the intended DPI), a single `IDAT`
//! holding the zlib-compressed scanlines, and `IEND`.

use std::io::{self, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::ZlibEncoder;

use super::canvas::Canvas;

/// PNG file signature.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

/// Bit depth per channel.
const BIT_DEPTH: u8 = 8;
/// Color type 2: truecolor RGB.
const COLOR_TYPE_RGB: u8 = 2;
/// Scanline filter type 0: none.
const FILTER_NONE: u8 = 0;
/// `pHYs` unit specifier: meters.
const UNIT_METER: u8 = 1;

/// Convert dots per inch to pixels per meter, rounded.
pub fn dpi_to_ppm(dpi: u32) -> u32 {
    u32::try_from((u64::from(dpi) * 10_000 + 127) / 254).unwrap_or(u32::MAX)
}

/// Encode `canvas` as a PNG image tagged with `dpi`.
///
/// # Errors
///
/// Returns an error if compression fails or the image is too large for PNG.
pub fn encode(canvas: &Canvas, dpi: u32) -> io::Result<Vec<u8>> {
    let (width, height) = (canvas.width(), canvas.height());
    if width == 0 || height == 0 || width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot encode a {width}x{height} image"),
        ));
    }

    let mut out = Vec::new();
    out.extend_from_slice(&SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes()); // width (4)
    ihdr.extend_from_slice(&height.to_be_bytes()); // height (4)
    ihdr.push(BIT_DEPTH); // bit depth (1)
    ihdr.push(COLOR_TYPE_RGB); // color type (1)
    ihdr.push(0); // compression method (1)
    ihdr.push(0); // filter method (1)
    ihdr.push(0); // interlace method (1)
    write_chunk(&mut out, *b"IHDR", &ihdr);

    let ppm = dpi_to_ppm(dpi);
    let mut phys = Vec::with_capacity(9);
    phys.extend_from_slice(&ppm.to_be_bytes()); // x pixels per unit (4)
    phys.extend_from_slice(&ppm.to_be_bytes()); // y pixels per unit (4)
    phys.push(UNIT_METER); // unit (1)
    write_chunk(&mut out, *b"pHYs", &phys);

    let rgb = canvas.to_rgb_bytes();
    let stride = width as usize * 3;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    for scanline in rgb.chunks_exact(stride) {
        encoder.write_all(&[FILTER_NONE])?;
        encoder.write_all(scanline)?;
    }
    let idat = encoder.finish()?;
    write_chunk(&mut out, *b"IDAT", &idat);

    write_chunk(&mut out, *b"IEND", &[]);
    Ok(out)
}

/// Encode `canvas` and write it to `path`, returning the byte count.
///
/// # Errors
///
/// Returns an error if encoding or the write fails.
pub fn write_png(canvas: &Canvas, dpi: u32, path: &Path) -> io::Result<usize> {
    let data = encode(canvas, dpi)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &data)?;
    Ok(data.len())
}

/// Append one chunk: length, type, data, CRC-32 over type and data.
fn write_chunk(out: &mut Vec<u8>, kind: [u8; 4], data: &[u8]) {
    let len = u32::try_from(data.len()).unwrap_or(u32::MAX);
    out.extend_from_slice(&len.to_be_bytes());

    let mut crc = crc32fast::Hasher::new();
    crc.update(&kind);
    crc.update(data);

    out.extend_from_slice(&kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
}
