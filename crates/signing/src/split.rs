//! Splitting a signed index into its signature and content streams
//!
//! A signed index is two gzip streams written back to back by the same
//! compressor, so both start with the same fixed header. The split point is
//! the first occurrence of that header after the blob's own leading one.

use apkidx_types::IndexFormat;

/// Leading bytes of every stream the index signer emits: gzip magic,
/// deflate, no flags, zero mtime.
pub const GZIP_HEADER: [u8; 8] = [0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Split `data` into `(signature, content)`.
///
/// Returns `(&[], data)` when no second stream starts anywhere past offset 0,
/// which is what an unsigned index looks like.
#[must_use]
pub fn split_streams(data: &[u8]) -> (&[u8], &[u8]) {
    match find_stream_start(data) {
        Some(pos) => data.split_at(pos),
        None => (&data[..0], data),
    }
}

fn find_stream_start(data: &[u8]) -> Option<usize> {
    data.get(1..)?
        .windows(GZIP_HEADER.len())
        .position(|window| window == GZIP_HEADER)
        .map(|pos| pos + 1)
}

/// Bytes of `content` that a signature in `format` covers.
///
/// `None` means the content does not have the shape the format requires.
#[must_use]
pub fn signed_region(format: IndexFormat, content: &[u8]) -> Option<&[u8]> {
    match format {
        IndexFormat::Current => Some(content),
        IndexFormat::Legacy => {
            let (first, _) = split_streams(content);
            (!first.is_empty()).then_some(first)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::gzip;

    #[test]
    fn test_split_two_streams() {
        let sig = gzip(b"signature");
        let content = gzip(b"content");
        let blob = [sig.as_slice(), content.as_slice()].concat();

        let (left, right) = split_streams(&blob);
        assert_eq!(left, sig.as_slice());
        assert_eq!(right, content.as_slice());
    }

    #[test]
    fn test_single_stream_is_unsigned() {
        let content = gzip(b"content");
        let (left, right) = split_streams(&content);
        assert!(left.is_empty());
        assert_eq!(right, content.as_slice());
    }

    #[test]
    fn test_short_and_empty_input() {
        assert_eq!(split_streams(&[]), (&[][..], &[][..]));
        let (left, right) = split_streams(&GZIP_HEADER);
        assert!(left.is_empty());
        assert_eq!(right, &GZIP_HEADER[..]);
    }

    #[test]
    fn test_first_boundary_wins() {
        let a = gzip(b"a");
        let b = gzip(b"b");
        let c = gzip(b"c");
        let blob = [a.as_slice(), b.as_slice(), c.as_slice()].concat();

        let (left, right) = split_streams(&blob);
        assert_eq!(left, a.as_slice());
        assert_eq!(right.len(), b.len() + c.len());
    }

    #[test]
    fn test_header_at_offset_one() {
        let mut blob = vec![0u8];
        blob.extend_from_slice(&GZIP_HEADER);
        let (left, right) = split_streams(&blob);
        assert_eq!(left, &[0u8][..]);
        assert_eq!(right, &GZIP_HEADER[..]);
    }

    #[test]
    fn test_signed_region_per_format() {
        let a = gzip(b"a");
        let b = gzip(b"b");
        let two = [a.as_slice(), b.as_slice()].concat();

        assert_eq!(signed_region(IndexFormat::Current, &two), Some(two.as_slice()));
        assert_eq!(signed_region(IndexFormat::Legacy, &two), Some(a.as_slice()));
        assert_eq!(signed_region(IndexFormat::Legacy, &a), None);
    }
}
