//! Minimal PNG encoder for flat RGB images.
//!
//! Rows use the Sub filter and the zlib stream is a single fixed-Huffman deflate
//! block with distance-1 run-length matches, which keeps solid-color images small.

/// PNG file signature.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Encode a solid-color RGB image.
pub fn solid_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let pixels: Vec<u8> = rgb
        .iter()
        .copied()
        .cycle()
        .take(width as usize * height as usize * 3)
        .collect();
    encode_rgb(width, height, &pixels)
}

/// Encode 8-bit RGB pixel data (row-major, `width * height * 3` bytes).
pub fn encode_rgb(width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    let stride = width as usize * 3;
    let mut filtered = Vec::with_capacity((stride + 1) * height as usize);
    for row in pixels.chunks(stride).take(height as usize) {
        filtered.push(1);
        for (i, byte) in row.iter().enumerate() {
            let left = if i >= 3 { row[i - 3] } else { 0 };
            filtered.push(byte.wrapping_sub(left));
        }
    }

    let mut header = Vec::with_capacity(13);
    header.extend_from_slice(&width.to_be_bytes());
    header.extend_from_slice(&height.to_be_bytes());
    // bit depth 8, color type RGB, deflate, adaptive filtering, no interlace
    header.extend_from_slice(&[8, 2, 0, 0, 0]);

    let mut out = Vec::new();
    out.extend_from_slice(&SIGNATURE);
    write_chunk(&mut out, b"IHDR", &header);
    write_chunk(&mut out, b"IDAT", &zlib(&filtered));
    write_chunk(&mut out, b"IEND", &[]);
    out
}

/// Width and height from a PNG header, if the bytes look like a PNG.
pub fn dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || bytes[..8] != SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    let start = out.len();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let crc = crc32(&out[start..]);
    out.extend_from_slice(&crc.to_be_bytes());
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

fn adler32(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for &byte in data {
        a = (a + byte as u32) % 65521;
        b = (b + a) % 65521;
    }
    (b << 16) | a
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut out = vec![0x78, 0x01];
    out.extend(deflate_fixed(data));
    out.extend_from_slice(&adler32(data).to_be_bytes());
    out
}

struct BitWriter {
    bytes: Vec<u8>,
    current: u32,
    filled: u32,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            bytes: Vec::new(),
            current: 0,
            filled: 0,
        }
    }

    /// Write `count` bits, least significant first.
    fn bits(&mut self, value: u32, count: u32) {
        for i in 0..count {
            self.current |= ((value >> i) & 1) << self.filled;
            self.filled += 1;
            if self.filled == 8 {
                self.bytes.push(self.current as u8);
                self.current = 0;
                self.filled = 0;
            }
        }
    }

    /// Write a Huffman code, most significant bit first.
    fn code(&mut self, code: u32, length: u32) {
        for i in (0..length).rev() {
            self.bits((code >> i) & 1, 1);
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push(self.current as u8);
        }
        self.bytes
    }
}

const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115,
    131, 163, 195, 227, 258,
];
const LENGTH_EXTRA: [u32; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

fn write_symbol(writer: &mut BitWriter, symbol: u32) {
    match symbol {
        0..=143 => writer.code(0x30 + symbol, 8),
        144..=255 => writer.code(0x190 + symbol - 144, 9),
        256..=279 => writer.code(symbol - 256, 7),
        _ => writer.code(0xC0 + symbol - 280, 8),
    }
}

fn write_run(writer: &mut BitWriter, length: usize) {
    let index = LENGTH_BASE
        .iter()
        .rposition(|&base| base as usize <= length)
        .unwrap_or(0);
    write_symbol(writer, 257 + index as u32);
    writer.bits(
        (length - LENGTH_BASE[index] as usize) as u32,
        LENGTH_EXTRA[index],
    );
    // distance 1: code 0, five bits, no extra bits
    writer.code(0, 5);
}

fn deflate_fixed(data: &[u8]) -> Vec<u8> {
    let mut writer = BitWriter::new();
    writer.bits(1, 1); // final block
    writer.bits(1, 2); // fixed Huffman

    let mut i = 0;
    while i < data.len() {
        if i > 0 {
            let previous = data[i - 1];
            let run = data[i..]
                .iter()
                .take(258)
                .take_while(|&&byte| byte == previous)
                .count();
            if run >= 3 {
                write_run(&mut writer, run);
                i += run;
                continue;
            }
        }
        write_symbol(&mut writer, data[i] as u32);
        i += 1;
    }
    write_symbol(&mut writer, 256);
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc_matches_reference() {
        assert_eq!(crc32(b"IEND"), 0xAE42_6082);
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn adler_matches_reference() {
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn solid_image_is_compact() {
        let png = solid_rgb(1024, 768, [135, 206, 235]);
        assert_eq!(dimensions(&png), Some((1024, 768)));
        assert!(png.len() < 64 * 1024, "placeholder is {} bytes", png.len());
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn run_lengths_cover_every_length_code() {
        for length in 3..=258 {
            let mut writer = BitWriter::new();
            write_run(&mut writer, length);
            assert!(!writer.finish().is_empty());
        }
    }
}
