//! Ordered concatenation of per-chunk audio buffers.
//!
//! MP3 audio is frame-based, so buffers produced by separate synthesis
//! calls remain decodable after a plain byte-level join. This holds for the
//! codec used here but is not a property of arbitrary codecs; any move to a
//! container format (wav, ogg) would need real muxing instead.

use bytes::{Bytes, BytesMut};

/// Concatenate audio buffers in input order into a single buffer.
///
/// A single buffer is returned unchanged without copying. Multiple buffers
/// are copied once into an allocation sized to the exact total. Buffers are
/// never reordered, dropped or interleaved.
pub fn concatenate(buffers: Vec<Bytes>) -> Bytes {
    if buffers.len() <= 1 {
        return buffers.into_iter().next().unwrap_or_default();
    }

    let total: usize = buffers.iter().map(Bytes::len).sum();
    let mut out = BytesMut::with_capacity(total);
    for buffer in &buffers {
        out.extend_from_slice(buffer);
    }
    out.freeze()
}
