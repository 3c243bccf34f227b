//! Base64 block framing of binary `DataArray` payloads.
//!
//! Two framings exist, selected by the `compressor` attribute of the file:
//!
//! * uncompressed: `[header-int: byte length][payload bytes]`, base64 encoded as one run.
//! * zlib (`vtkZLibDataCompressor`): a header of `[nb_blocks][block size][last block size]`
//!   followed by `nb_blocks` compressed block sizes, base64 encoded as one run, then the
//!   concatenated compressed blocks base64 encoded as a second run.
//!
//! Every window is addressed in base64 characters from the start of the payload, so the
//! character accounting in [`chars_needed`] has to be exact: an error there shifts every
//! array that follows in the appended section.

use crate::prelude::*;

use crate::config::{Compression, HeaderType};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::Read;

/// number of base64 characters encoding `count` values of `width` bytes each (with padding)
///
/// this is `4 * ceil(count * 8 * width / 24)`
pub fn chars_needed(width: usize, count: usize) -> usize {
    4 * ((count * width + 2) / 3)
}

/// decode the framed payload of one array into its raw little endian bytes
pub fn decode_payload(
    input: &str,
    config: &CodecConfig,
    array_name: &str,
) -> Result<Vec<u8>, error::Decode> {
    match config.compression {
        Compression::None => decode_uncompressed(input, config.header_type, array_name),
        Compression::ZLib => decode_compressed(input, config.header_type, array_name),
    }
}

/// decode `[header-int: byte length][payload]`
///
/// Only the characters covering the header are decoded first. The byte length it holds
/// decides how many more characters belong to this array.
pub fn decode_uncompressed(
    input: &str,
    header_type: HeaderType,
    array_name: &str,
) -> Result<Vec<u8>, error::Decode> {
    let width = header_type.width();

    let header = decode_window(input, 0, chars_needed(width, 1), array_name)?;
    ensure_decoded(&header, width, array_name)?;

    let nb_bytes = bounded_length(header_type.read(&header), input, array_name)?;
    let total_chars = chars_needed(1, width + nb_bytes);

    log::trace!(
        "uncompressed array `{}`: {} payload bytes in {} base64 characters",
        array_name,
        nb_bytes,
        total_chars
    );

    let mut decoded = decode_window(input, 0, total_chars, array_name)?;
    ensure_decoded(&decoded, width + nb_bytes, array_name)?;

    decoded.truncate(width + nb_bytes);
    decoded.drain(..width);

    Ok(decoded)
}

/// decode a zlib block compressed payload
pub fn decode_compressed(
    input: &str,
    header_type: HeaderType,
    array_name: &str,
) -> Result<Vec<u8>, error::Decode> {
    let width = header_type.width();

    let fixed_chars = chars_needed(width, 3);
    let fixed = decode_window(input, 0, fixed_chars, array_name)?;
    ensure_decoded(&fixed, 3 * width, array_name)?;

    // every block needs `width` bytes in the table, so `input` bounds the count
    let nb_blocks = bounded_length(header_type.read(&fixed), input, array_name)?;

    if nb_blocks == 0 {
        log::trace!("compressed array `{}` has no blocks", array_name);
        return Ok(Vec::new());
    }

    let block_size = saturating_usize(header_type.read(&fixed[width..]));
    let last_block_size = match saturating_usize(header_type.read(&fixed[2 * width..])) {
        // a zero sized last block means the last block is full
        0 => block_size,
        size => size,
    };

    let table = decode_window(input, fixed_chars, chars_needed(width, nb_blocks), array_name)?;
    ensure_decoded(&table, nb_blocks * width, array_name)?;

    let compressed_sizes = table
        .chunks_exact(width)
        .take(nb_blocks)
        .map(|bytes| bounded_length(header_type.read(bytes), input, array_name))
        .collect::<Result<Vec<usize>, _>>()?;

    let total_compressed = compressed_sizes
        .iter()
        .try_fold(0usize, |total, size| total.checked_add(*size))
        .filter(|total| *total <= input.len())
        .ok_or_else(|| error::Truncated::new(array_name.into(), usize::MAX, input.len()))?;

    // the header and the block table are encoded together, the data starts right after them
    let data_start = chars_needed(width, 3 + nb_blocks);
    let data = decode_window(
        input,
        data_start,
        chars_needed(1, total_compressed),
        array_name,
    )?;
    ensure_decoded(&data, total_compressed, array_name)?;

    log::trace!(
        "compressed array `{}`: {} blocks of {} bytes (last {}), {} compressed bytes",
        array_name,
        nb_blocks,
        block_size,
        last_block_size,
        total_compressed
    );

    let mut out = Vec::new();
    let mut position = 0;

    for (block, compressed_size) in compressed_sizes.into_iter().enumerate() {
        let expected = if block + 1 == nb_blocks {
            last_block_size
        } else {
            block_size
        };

        let compressed = &data[position..position + compressed_size];
        let inflated = inflate_block(compressed, expected, &mut out, block, array_name)?;

        if inflated != expected {
            return Err(error::BlockLength::new(array_name.into(), block, expected, inflated).into());
        }

        position += compressed_size;
    }

    Ok(out)
}

/// frame raw little endian bytes the way `decode_payload` expects them
pub fn encode_payload(bytes: &[u8], config: &CodecConfig, block_size: usize) -> Result<String, Error> {
    match config.compression {
        Compression::None => encode_uncompressed(bytes, config.header_type),
        Compression::ZLib => encode_compressed(bytes, config.header_type, block_size),
    }
}

pub fn encode_uncompressed(bytes: &[u8], header_type: HeaderType) -> Result<String, Error> {
    let mut framed = Vec::with_capacity(header_type.width() + bytes.len());
    header_type.extend_le_bytes(bytes.len(), &mut framed)?;
    framed.extend_from_slice(bytes);

    Ok(base64::encode(&framed))
}

/// split `bytes` in blocks of `block_size` bytes and compress each one independently
pub fn encode_compressed(
    bytes: &[u8],
    header_type: HeaderType,
    block_size: usize,
) -> Result<String, Error> {
    let block_size = block_size.max(1);

    let mut compressed_blocks = Vec::new();
    for block in bytes.chunks(block_size) {
        let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(block)?;
        compressed_blocks.push(encoder.finish()?);
    }

    let nb_blocks = compressed_blocks.len();

    let mut header = Vec::with_capacity((3 + nb_blocks) * header_type.width());
    header_type.extend_le_bytes(nb_blocks, &mut header)?;
    header_type.extend_le_bytes(block_size, &mut header)?;
    header_type.extend_le_bytes(bytes.len() % block_size, &mut header)?;

    for block in compressed_blocks.iter() {
        header_type.extend_le_bytes(block.len(), &mut header)?;
    }

    let data: Vec<u8> = compressed_blocks.concat();

    let mut out = base64::encode(&header);
    out.push_str(&base64::encode(&data));

    Ok(out)
}

fn inflate_block(
    compressed: &[u8],
    expected: usize,
    out: &mut Vec<u8>,
    block: usize,
    array_name: &str,
) -> Result<usize, error::Decode> {
    // one byte past the expected size is enough to report a wrong block length
    let limit = (expected as u64).saturating_add(1);
    let mut decoder = ZlibDecoder::new(compressed).take(limit);
    let inflated = decoder
        .read_to_end(out)
        .map_err(|e| error::Inflate::new(array_name.into(), block, e))?;
    Ok(inflated)
}

/// A byte count read from a header. Counts larger than the whole input can never be
/// satisfied by it and are reported as truncation.
fn bounded_length(value: u64, input: &str, array_name: &str) -> Result<usize, error::Decode> {
    match usize::try_from(value) {
        Ok(length) if length <= input.len() => Ok(length),
        _ => {
            let needed = chars_needed(1, saturating_usize(value).min(usize::MAX / 2));
            Err(error::Truncated::new(array_name.into(), needed, input.len()).into())
        }
    }
}

fn saturating_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// base64 decode `len` characters of `input` starting at character `start`
fn decode_window(
    input: &str,
    start: usize,
    len: usize,
    array_name: &str,
) -> Result<Vec<u8>, error::Decode> {
    let end = start.checked_add(len).unwrap_or(usize::MAX);

    let window = input
        .get(start..end)
        .ok_or_else(|| error::Truncated::new(array_name.into(), end, input.len()))?;

    let bytes =
        base64::decode(window).map_err(|e| error::Base64::new(array_name.into(), e))?;

    Ok(bytes)
}

fn ensure_decoded(bytes: &[u8], needed: usize, array_name: &str) -> Result<(), error::Decode> {
    if bytes.len() < needed {
        // report the shortfall in base64 characters, like the window checks
        let needed_chars = chars_needed(1, needed);
        let available = chars_needed(1, bytes.len());
        return Err(error::Truncated::new(array_name.into(), needed_chars, available).into());
    }
    Ok(())
}
