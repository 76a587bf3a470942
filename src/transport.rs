//! One logical command per exchange, with the card's timing quirks applied.

use std::thread;
use std::time::Duration;

use tracing::{trace, trace_span};

use crate::{apdu, Result};

/// Pause before each command. Some readers return empty replies when driven
/// back-to-back; the stock firmware tolerates 100ms everywhere.
pub const COMMAND_DELAY: Duration = Duration::from_millis(100);

/// Anything that can shuttle an APDU to a card and back. `pcsc::Card` in
/// production, scripted mocks in tests.
pub trait CardTransport {
    fn transmit(&mut self, frame: &[u8]) -> Result<Vec<u8>>;
}

impl CardTransport for pcsc::Card {
    fn transmit(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        let mut rbuf = [0; pcsc::MAX_BUFFER_SIZE];
        let rsp = pcsc::Card::transmit(self, frame, &mut rbuf)?;
        Ok(rsp.to_vec())
    }
}

/// A transport plus the protocol-level handling every command needs: the
/// inter-command delay, and a single 61xx "more data" continuation.
pub struct Link<T> {
    pub card: T,
    delay: Duration,
}

impl<T: CardTransport> Link<T> {
    pub fn new(card: T) -> Self {
        Self {
            card,
            delay: COMMAND_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sends one command and returns its full reply, status word included.
    ///
    /// A 61xx status word means the first reply's body is not the real data;
    /// the card wants a GET RESPONSE with the length it has ready. That is
    /// honored exactly once - no field on this card ever chains twice.
    pub fn exchange(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
        let span = trace_span!("exchange");
        let _enter = span.enter();

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }

        trace!(req = %hex::encode(frame), ">> TX");
        let rsp = self.card.transmit(frame)?;
        trace!(rsp = %hex::encode(&rsp), "<< RX");

        if let [.., 0x61, le] = rsp[..] {
            let rsp = self.card.transmit(&apdu::get_response(le))?;
            trace!(rsp = %hex::encode(&rsp), "<< RX (GET RESPONSE)");
            return Ok(rsp);
        }
        Ok(rsp)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;

    use super::CardTransport;
    use crate::{Error, Result};

    /// Replays a scripted sequence of replies and records every frame sent.
    #[derive(Default)]
    pub struct MockCard {
        pub sent: Vec<Vec<u8>>,
        pub replies: VecDeque<Result<Vec<u8>>>,
    }

    impl MockCard {
        pub fn replying<I>(replies: I) -> Self
        where
            I: IntoIterator<Item = Result<Vec<u8>>>,
        {
            Self {
                sent: Vec::new(),
                replies: replies.into_iter().collect(),
            }
        }

        /// A reply carrying `data` followed by a 9000 status word.
        pub fn ok(data: &[u8]) -> Result<Vec<u8>> {
            let mut rsp = data.to_vec();
            rsp.extend_from_slice(&[0x90, 0x00]);
            Ok(rsp)
        }

        pub fn fail() -> Result<Vec<u8>> {
            Err(Error::Transport(pcsc::Error::NoSmartcard))
        }
    }

    impl CardTransport for MockCard {
        fn transmit(&mut self, frame: &[u8]) -> Result<Vec<u8>> {
            self.sent.push(frame.to_vec());
            self.replies.pop_front().unwrap_or_else(MockCard::fail)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::testing::MockCard;
    use super::Link;
    use crate::apdu;

    fn link(card: MockCard) -> Link<MockCard> {
        Link::new(card).with_delay(Duration::ZERO)
    }

    #[test]
    fn exchange_passes_plain_replies_through() {
        let mut link = link(MockCard::replying([MockCard::ok(&[0x01, 0x02])]));
        let rsp = link.exchange(&[0x80, 0xB0, 0x00, 0x04, 0x02, 0x00, 0x0D]).unwrap();
        assert_eq!(rsp, vec![0x01, 0x02, 0x90, 0x00]);
        assert_eq!(link.card.sent.len(), 1);
    }

    #[test]
    fn exchange_chases_61xx_once() {
        // First reply: junk body plus "I have 0x0D bytes for you".
        let mut link = link(MockCard::replying([
            Ok(vec![0xDE, 0xAD, 0x61, 0x0D]),
            MockCard::ok(b"1234567890123"),
        ]));
        let rsp = link.exchange(&apdu::Field::Cid.frame()).unwrap();

        assert_eq!(link.card.sent.len(), 2);
        assert_eq!(link.card.sent[1], apdu::get_response(0x0D).to_vec());
        assert_eq!(apdu::payload(&rsp).unwrap(), b"1234567890123");
    }

    #[test]
    fn exchange_propagates_transport_errors() {
        let mut link = link(MockCard::replying([MockCard::fail()]));
        assert!(link.exchange(&apdu::SELECT_APPLET).is_err());
    }
}
