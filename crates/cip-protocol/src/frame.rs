//! CIP packet framing over a byte stream.
//!
//! Wire format: `opcode(1) | payload_len(2, big-endian) | payload(payload_len)`.
//! [`FrameDecoder`] buffers bytes across reads so a packet split across two
//! socket reads is reassembled rather than dropped.

/// One framed packet: the opcode byte and its payload (the length prefix is
/// consumed, not retained).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub opcode: u8,
    pub payload: Vec<u8>,
}

/// Above this many buffered-but-unframeable bytes, the buffer is treated as
/// garbage and dropped rather than grown without bound. Not part of the
/// protocol; a defensive cap on a misbehaving peer.
const MAX_BUFFERED: usize = 64 * 1024;

/// A persistent rolling buffer that turns a sequence of `feed()` calls (one
/// per socket read) into a sequence of complete [`Frame`]s.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed newly-read bytes and return every frame now fully buffered.
    /// Bytes belonging to an incomplete trailing frame are retained for the
    /// next call.
    pub fn feed(&mut self, data: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(data);

        let mut frames = Vec::new();
        let mut consumed = 0usize;
        loop {
            let remaining = &self.buf[consumed..];
            if remaining.len() < 3 {
                break;
            }
            let payload_len = u16::from_be_bytes([remaining[1], remaining[2]]) as usize;
            let packet_len = payload_len + 3;
            if remaining.len() < packet_len {
                break;
            }
            frames.push(Frame {
                opcode: remaining[0],
                payload: remaining[3..packet_len].to_vec(),
            });
            consumed += packet_len;
        }
        self.buf.drain(..consumed);

        if self.buf.len() > MAX_BUFFERED {
            self.buf.clear();
        }

        frames
    }
}
