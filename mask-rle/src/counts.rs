//! The COCO compressed counts string.
//!
//! Each count is written as little-endian groups of 5 bits. A group byte is
//! `48 + bits`, with `0x20` set when another group follows, and the last group
//! is sign extended from `0x10`. From the fourth count onward the value stored
//! is the difference to the count two positions earlier.

use crate::RleError;

const OFFSET: u8 = 48;
const MAX_SHIFT: u32 = 64;

pub(crate) fn compress(counts: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(counts.len() * 2);

    counts.iter().enumerate().for_each(|(index, &count)| {
        let mut value = count as i64;
        if index > 2 {
            value -= counts[index - 2] as i64;
        }

        loop {
            let mut group = (value & 0x1f) as u8;
            value >>= 5;
            let more = if group & 0x10 != 0 {
                value != -1
            } else {
                value != 0
            };
            if more {
                group |= 0x20;
            }
            bytes.push(group + OFFSET);
            if !more {
                break;
            }
        }
    });

    bytes
}

pub(crate) fn decompress(bytes: &[u8]) -> Result<Vec<u32>, RleError> {
    let mut counts: Vec<u32> = vec![];
    let mut position = 0;

    while position < bytes.len() {
        let start = position;
        let mut value = 0i64;
        let mut shift = 0u32;

        loop {
            let byte = *bytes.get(position).ok_or(RleError::Truncated)?;
            let group = match byte.checked_sub(OFFSET) {
                Some(group) if group < 0x40 => group as i64,
                _ => return Err(RleError::InvalidByte { position, byte }),
            };
            if shift >= MAX_SHIFT {
                return Err(RleError::Overflow { position: start });
            }

            value |= (group & 0x1f) << shift;
            shift += 5;
            position += 1;

            if group & 0x20 == 0 {
                if group & 0x10 != 0 && shift < MAX_SHIFT {
                    value |= -1i64 << shift;
                }
                break;
            }
        }

        let index = counts.len();
        if index > 2 {
            value = value
                .checked_add(counts[index - 2] as i64)
                .ok_or(RleError::Overflow { position: start })?;
        }
        let count = u32::try_from(value).map_err(|_| RleError::InvalidRun { index, value })?;
        counts.push(count);
    }

    Ok(counts)
}
