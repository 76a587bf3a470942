//! Segmented read of the portrait photo.
//!
//! The card never advertises the photo's length. It is read in 0xFF-byte
//! chunks at advancing offsets until the card hands back a short or empty
//! chunk, the accumulated size hits the cap, or a transmit fails. Whatever
//! has accumulated by then is the result; a truncated photo is degraded
//! output, not an error.

use tracing::{debug, trace_span};

use crate::transport::{CardTransport, Link};
use crate::apdu;

/// File offset where the photo starts.
pub const PHOTO_OFFSET: u16 = 0x017B;

/// Upper bound on the photo size; accumulation stops once it is reached.
pub const PHOTO_MAX_SIZE: usize = 5000;

/// Chunk length requested per READ BINARY.
pub const CHUNK_LEN: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop,
}

pub struct PhotoRead {
    offset: u16,
    data: Vec<u8>,
}

impl PhotoRead {
    pub fn new() -> Self {
        Self {
            offset: PHOTO_OFFSET,
            data: Vec::new(),
        }
    }

    /// Reads one chunk. Every `Continue` strictly advances the offset, and
    /// every failure is a `Stop`, so the loop in [`run`](Self::run) cannot
    /// spin forever.
    pub fn step<T: CardTransport>(&mut self, link: &mut Link<T>) -> Step {
        let frame = apdu::read_binary(self.offset, CHUNK_LEN);
        let rsp = match link.exchange(&frame) {
            Ok(rsp) => rsp,
            Err(err) => {
                debug!(offset = self.offset, "photo chunk failed: {}", err);
                return Step::Stop;
            }
        };
        let chunk = match apdu::payload(&rsp) {
            Some(chunk) if !chunk.is_empty() => chunk,
            _ => return Step::Stop,
        };

        self.data.extend_from_slice(chunk);
        self.offset += chunk.len() as u16;

        // A short chunk is end-of-field on this card's data layout.
        if chunk.len() < CHUNK_LEN as usize || self.data.len() >= PHOTO_MAX_SIZE {
            Step::Stop
        } else {
            Step::Continue
        }
    }

    pub fn run<T: CardTransport>(mut self, link: &mut Link<T>) -> Vec<u8> {
        let span = trace_span!("read_photo");
        let _enter = span.enter();

        while self.step(link) == Step::Continue {}
        debug!(len = self.data.len(), "photo read done");
        self.data
    }
}

impl Default for PhotoRead {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::transport::testing::MockCard;
    use crate::Result;

    fn run(replies: Vec<Result<Vec<u8>>>) -> (Vec<u8>, Vec<Vec<u8>>) {
        let mut link = Link::new(MockCard::replying(replies)).with_delay(Duration::ZERO);
        let data = PhotoRead::new().run(&mut link);
        (data, link.card.sent)
    }

    #[test]
    fn stops_on_short_chunk() {
        let (data, sent) = run(vec![
            MockCard::ok(&[0xAB; 0xFF]),
            MockCard::ok(&[0xCD; 0x50]),
        ]);
        assert_eq!(data.len(), 0xFF + 0x50);
        assert_eq!(sent.len(), 2);
        // Offsets advance by exactly the previous payload's length.
        assert_eq!(sent[0], apdu::read_binary(0x017B, 0xFF).to_vec());
        assert_eq!(sent[1], apdu::read_binary(0x017B + 0xFF, 0xFF).to_vec());
    }

    #[test]
    fn stops_on_empty_payload() {
        let (data, sent) = run(vec![MockCard::ok(&[0xAB; 0xFF]), MockCard::ok(&[])]);
        assert_eq!(data.len(), 0xFF);
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn transport_error_is_not_fatal() {
        let (data, _) = run(vec![MockCard::ok(&[0xAB; 0xFF]), MockCard::fail()]);
        assert_eq!(data.len(), 0xFF);
    }

    #[test]
    fn status_word_only_reply_stops() {
        // payload() == Some(&[]) for a bare 9000; treated the same as empty.
        let (data, _) = run(vec![Ok(vec![0x90, 0x00])]);
        assert!(data.is_empty());
    }

    #[test]
    fn stops_at_size_cap() {
        // 20 full chunks = 5100 bytes >= 5000; the 21st must never be asked for.
        let replies: Vec<_> = (0..25).map(|_| MockCard::ok(&[0xEE; 0xFF])).collect();
        let (data, sent) = run(replies);
        assert_eq!(data.len(), 20 * 0xFF);
        assert_eq!(sent.len(), 20);
    }
}
