//! Embedded payload marker.
//!
//! The bootstrap binary carries a fixed 32-byte signature immediately followed by
//! two little-endian `u64` fields: the payload offset and the payload length, both
//! measured from the start of the executable file. The fields are zero in a fresh
//! build; the packaging tool patches them after appending the payload.

use std::hint::black_box;

/// Length of the signature in bytes.
pub const SIGNATURE_LEN: usize = 32;

/// Length of the whole marker (signature + offset + length).
pub const MARKER_LEN: usize = SIGNATURE_LEN + 16;

const SIGNATURE: [u8; SIGNATURE_LEN] = [
    0x5f, 0x1f, 0x05, 0xf9, 0x1c, 0x00, 0x76, 0x29, 0x84, 0x82, 0x68, 0x7f, 0xf2, 0xbb, 0xef, 0xcd,
    0x3e, 0xb6, 0x6b, 0x1d, 0xe9, 0xb7, 0x72, 0x93, 0x22, 0x16, 0x43, 0xa1, 0x01, 0x08, 0x98, 0x7b,
];

#[repr(C)]
struct RawMarker {
    signature: [u8; SIGNATURE_LEN],
    offset: [u8; 8],
    length: [u8; 8],
}

// The only copy of the signature in the linked image.
#[used]
static EMBEDDED: RawMarker = RawMarker {
    signature: SIGNATURE,
    offset: [0; 8],
    length: [0; 8],
};

/// The `(offset, length)` pair recorded in a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayloadMarker {
    pub offset: u64,
    pub length: u64,
}

impl PayloadMarker {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// The signature bytes, read through the embedded static so the optimizer
    /// cannot materialize a second copy.
    pub fn signature() -> &'static [u8; SIGNATURE_LEN] {
        black_box(&EMBEDDED.signature)
    }

    /// Finds the first marker in `image`, returning its byte position and the
    /// recorded fields. Returns `None` when the signature is absent or truncated.
    pub fn find_in(image: &[u8]) -> Option<(usize, PayloadMarker)> {
        let signature = Self::signature();
        let position = image
            .windows(SIGNATURE_LEN)
            .position(|window| window == signature)?;
        let fields = image.get(position + SIGNATURE_LEN..position + MARKER_LEN)?;
        let (offset, length) = fields.split_at(8);
        let marker = PayloadMarker {
            offset: u64::from_le_bytes(offset.try_into().ok()?),
            length: u64::from_le_bytes(length.try_into().ok()?),
        };
        Some((position, marker))
    }

    /// Whether the marker was patched with a payload.
    pub fn is_present(&self) -> bool {
        self.offset > 0 && self.length > 0
    }

    /// Serializes the full marker, as the packaging tool writes it.
    pub fn encode(&self) -> [u8; MARKER_LEN] {
        let mut bytes = [0u8; MARKER_LEN];
        bytes[..SIGNATURE_LEN].copy_from_slice(Self::signature());
        bytes[SIGNATURE_LEN..SIGNATURE_LEN + 8].copy_from_slice(&self.offset.to_le_bytes());
        bytes[SIGNATURE_LEN + 8..].copy_from_slice(&self.length.to_le_bytes());
        bytes
    }
}
