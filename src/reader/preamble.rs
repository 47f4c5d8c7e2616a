//! Byte order detection and version probing.
//!
//! Every RT file starts with three 4-byte integers: a sentinel equal to 1,
//! the major version and the minor version. The sentinel fixes the byte
//! order for the rest of the file.

use tracing::debug;

use crate::error::DecodeError;
use crate::reader::cursor::{ByteCursor, Endianness};
use crate::schema::VersionKey;

/// Value of the leading sentinel word.
pub const SENTINEL: i32 = 1;

/// Size of the sentinel and version words.
pub const PREAMBLE_SIZE: usize = 12;

/// Result of probing the start of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    pub endianness: Endianness,
    pub version: VersionKey,
}

/// Determine the file byte order from the sentinel at offset 0.
///
/// Native order is tried first, then swapped order. The cursor position
/// is left unchanged.
///
/// # Errors
/// `DecodeError::Format` if neither interpretation yields the sentinel or
/// the data is too short to hold it.
pub fn detect_endianness(cursor: &ByteCursor<'_>) -> Result<Endianness, DecodeError> {
    let bytes = cursor.peek_at(0, 4).ok_or_else(|| {
        DecodeError::Format(format!(
            "Cannot determine byte order: file holds {} bytes, sentinel needs 4",
            cursor.len()
        ))
    })?;

    let native = Endianness::native();
    for order in [native, native.swapped()] {
        if order.read_i32(bytes) == SENTINEL {
            return Ok(order);
        }
    }

    Err(DecodeError::Format(format!(
        "Cannot determine byte order: sentinel bytes {:02x?} do not encode {} in either order",
        bytes, SENTINEL
    )))
}

/// Read the version words using the cursor's current byte order.
///
/// The cursor position is restored afterwards.
///
/// # Errors
/// - `DecodeError::Truncated` if the file is shorter than the preamble
/// - `DecodeError::Format` if the sentinel disagrees with the byte order
///   or a version word is negative
pub fn probe_version(cursor: &mut ByteCursor<'_>) -> Result<VersionKey, DecodeError> {
    let at = cursor.position();
    cursor.set_position(0);
    let words = read_words(cursor);
    cursor.set_position(at);
    let (sentinel, major, minor) = words?;

    if sentinel != SENTINEL {
        return Err(DecodeError::Format(format!(
            "Sentinel reads {} in {:?} byte order, expected {}",
            sentinel,
            cursor.order(),
            SENTINEL
        )));
    }

    match (u32::try_from(major), u32::try_from(minor)) {
        (Ok(major), Ok(minor)) => Ok(VersionKey::new(major, minor)),
        _ => Err(DecodeError::Format(format!(
            "Invalid version {}.{}",
            major, minor
        ))),
    }
}

fn read_words(cursor: &mut ByteCursor<'_>) -> Result<(i32, i32, i32), DecodeError> {
    Ok((
        cursor.read_i32("_endian_check")?,
        cursor.read_i32("ver_major")?,
        cursor.read_i32("ver_minor")?,
    ))
}

/// Detect byte order, probe the version, and leave the cursor at offset 0
/// configured with the detected order.
pub fn read_preamble(cursor: &mut ByteCursor<'_>) -> Result<Preamble, DecodeError> {
    let endianness = detect_endianness(cursor)?;
    cursor.set_order(endianness);
    let version = probe_version(cursor)?;
    cursor.set_position(0);

    debug!(?endianness, %version, "Read preamble");
    Ok(Preamble {
        endianness,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preamble_bytes(order: Endianness, words: [i32; 3]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for w in words {
            match order {
                Endianness::Little => bytes.extend_from_slice(&w.to_le_bytes()),
                Endianness::Big => bytes.extend_from_slice(&w.to_be_bytes()),
            }
        }
        bytes
    }

    #[test]
    fn test_detect_native() {
        let native = Endianness::native();
        let data = preamble_bytes(native, [1, 3, 9]);
        let cursor = ByteCursor::new(&data);
        assert_eq!(detect_endianness(&cursor).unwrap(), native);
    }

    #[test]
    fn test_detect_swapped() {
        let swapped = Endianness::native().swapped();
        let data = preamble_bytes(swapped, [1, 3, 9]);
        let cursor = ByteCursor::new(&data);
        assert_eq!(detect_endianness(&cursor).unwrap(), swapped);
    }

    #[test]
    fn test_detect_restores_position() {
        let data = preamble_bytes(Endianness::Big, [1, 2, 3]);
        let mut cursor = ByteCursor::new(&data);
        cursor.set_position(8);
        detect_endianness(&cursor).unwrap();
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_detect_rejects_bad_sentinel() {
        let data = preamble_bytes(Endianness::Little, [7, 3, 9]);
        let cursor = ByteCursor::new(&data);
        assert!(matches!(
            detect_endianness(&cursor),
            Err(DecodeError::Format(_))
        ));
    }

    #[test]
    fn test_detect_rejects_short_file() {
        let data = [1u8, 0];
        let cursor = ByteCursor::new(&data);
        assert!(matches!(
            detect_endianness(&cursor),
            Err(DecodeError::Format(_))
        ));
    }

    #[test]
    fn test_probe_version_restores_position() {
        let data = preamble_bytes(Endianness::Big, [1, 3, 11]);
        let mut cursor = ByteCursor::new(&data).with_order(Endianness::Big);
        cursor.set_position(4);
        assert_eq!(probe_version(&mut cursor).unwrap(), VersionKey::new(3, 11));
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_probe_version_inconsistent_order() {
        let data = preamble_bytes(Endianness::Big, [1, 3, 9]);
        let mut cursor = ByteCursor::new(&data).with_order(Endianness::Little);
        assert!(matches!(
            probe_version(&mut cursor),
            Err(DecodeError::Format(_))
        ));
    }

    #[test]
    fn test_probe_version_truncated() {
        let data = preamble_bytes(Endianness::Little, [1, 3, 9]);
        let mut cursor = ByteCursor::new(&data[..8]).with_order(Endianness::Little);
        assert!(matches!(
            probe_version(&mut cursor),
            Err(DecodeError::Truncated { field, .. }) if field == "ver_minor"
        ));
    }

    #[test]
    fn test_read_preamble() {
        let swapped = Endianness::native().swapped();
        let data = preamble_bytes(swapped, [1, 2, 3]);
        let mut cursor = ByteCursor::new(&data);
        let preamble = read_preamble(&mut cursor).unwrap();
        assert_eq!(preamble.endianness, swapped);
        assert_eq!(preamble.version, VersionKey::new(2, 3));
        assert_eq!(cursor.order(), swapped);
        assert_eq!(cursor.position(), 0);
    }
}
