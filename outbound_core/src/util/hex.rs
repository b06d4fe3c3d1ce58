//! Helpers for working with hexadecimal

use std::iter::Iterator;

/// Convert some bytes to their hexidecimal representation.
///
/// This does not include the `0x` prefix unless formatted with `{:#x}`.
/// It is mainly helpful in implementing [`std::fmt::LowerHex`] on the way
/// to implement [`std::fmt::Display`] for public identifiers.
pub(crate) fn bytes_as_hex<'a, I: Iterator<Item = &'a u8>>(
    mut byte_iter: I,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    if f.alternate() {
        write!(f, "0x")?;
    }

    byte_iter.try_fold((), |_, byte| write!(f, "{:02x}", byte))
}
