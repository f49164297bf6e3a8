//! Message framing inside the transfer buffer.
//!
//! Frame format:
//! - TAG (2 bytes): message marker, `AT` for command messages
//! - RESERVED (1 byte): written as zero, ignored on decode
//! - LENGTH (2 bytes): payload length, little-endian
//! - PAYLOAD (LENGTH bytes): message text
//! - ZERO FILL: every remaining byte of the buffer is zero

/// Marker for AT command messages
pub const TAG_AT: [u8; 2] = *b"AT";

/// Size of TAG + RESERVED + LENGTH
pub const HEADER_LEN: usize = 5;

/// Largest payload the 16-bit length field can describe
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

const LENGTH_OFFSET: usize = 3;

/// Errors that can occur during framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload does not fit the 16-bit length field
    PayloadTooLarge,
    /// Buffer cannot hold header and payload
    BufferTooSmall,
    /// Buffer is shorter than a header
    Incomplete,
    /// Tag differs from the expected marker
    InvalidTag,
    /// Length field points past the end of the buffer
    LengthOverrun,
}

/// A framed message borrowing its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    /// Two marker bytes
    pub tag: [u8; 2],
    /// Payload bytes
    pub payload: &'a [u8],
}

impl<'a> Message<'a> {
    /// Create a new message with the given tag and payload
    pub fn new(tag: [u8; 2], payload: &'a [u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FrameError::PayloadTooLarge);
        }
        Ok(Self { tag, payload })
    }

    /// Create an AT command message
    pub fn at(payload: &'a [u8]) -> Result<Self, FrameError> {
        Self::new(TAG_AT, payload)
    }

    /// Number of bytes taken by header and payload
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.payload.len()
    }

    /// Encode this message at the start of `buffer`
    ///
    /// Everything after the payload is zeroed so the whole buffer can be
    /// transferred as-is. Returns the number of framed bytes.
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.encoded_len();
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = (self.payload.len() as u16).to_le_bytes();

        buffer[..2].copy_from_slice(&self.tag);
        buffer[2] = 0;
        buffer[LENGTH_OFFSET..HEADER_LEN].copy_from_slice(&length);
        buffer[HEADER_LEN..frame_len].copy_from_slice(self.payload);
        buffer[frame_len..].fill(0);

        Ok(frame_len)
    }

    /// Decode a message from the start of `buffer`
    pub fn decode(buffer: &'a [u8]) -> Result<Self, FrameError> {
        if buffer.len() < HEADER_LEN {
            return Err(FrameError::Incomplete);
        }

        let length =
            u16::from_le_bytes([buffer[LENGTH_OFFSET], buffer[LENGTH_OFFSET + 1]]) as usize;
        let end = HEADER_LEN + length;
        if end > buffer.len() {
            return Err(FrameError::LengthOverrun);
        }

        Ok(Self {
            tag: [buffer[0], buffer[1]],
            payload: &buffer[HEADER_LEN..end],
        })
    }

    /// Decode a message and check its tag
    pub fn decode_tagged(buffer: &'a [u8], tag: [u8; 2]) -> Result<Self, FrameError> {
        let message = Self::decode(buffer)?;
        if message.tag != tag {
            return Err(FrameError::InvalidTag);
        }
        Ok(message)
    }
}
