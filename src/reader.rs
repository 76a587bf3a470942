//! Drives one full card transaction: SELECT, the six fixed fields, the
//! photo, and decoding into an [`IdRecord`].

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, trace_span, warn};

use crate::apdu::{self, Field};
use crate::photo::PhotoRead;
use crate::transport::{CardTransport, Link};
use crate::{decode, Error, Result};

/// The decoded contents of one card, with the wire field names the API
/// has always used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdRecord {
    pub cid: String,
    pub name_th: String,
    pub name_en: String,
    pub birth_date: String,
    pub gender: String,
    pub address: String,
    /// `data:image/jpeg;base64,...`, or empty when the card gave no photo.
    pub photo: String,
}

pub struct CardReader<T> {
    link: Link<T>,
}

impl<T: CardTransport> CardReader<T> {
    pub fn new(card: T) -> Self {
        Self {
            link: Link::new(card),
        }
    }

    pub fn with_delay(card: T, delay: Duration) -> Self {
        Self {
            link: Link::new(card).with_delay(delay),
        }
    }

    /// One complete read. Only a missing CID fails the transaction; every
    /// other field degrades to an empty value, and the photo to no photo.
    pub fn read(&mut self) -> Result<IdRecord> {
        let span = trace_span!("read_card");
        let _enter = span.enter();

        // The select's outcome is deliberately not checked: deployed readers
        // never did, and some cards answer it with junk yet serve the file
        // reads that follow just fine.
        if let Err(err) = self.link.exchange(&apdu::SELECT_APPLET) {
            warn!("applet select failed, continuing: {}", err);
        }

        let cid = self.read_field(Field::Cid);
        let name_th = self.read_field(Field::NameTh);
        let name_en = self.read_field(Field::NameEn);
        let birth_date = self.read_field(Field::BirthDate);
        let gender = self.read_field(Field::Gender);
        let address = self.read_field(Field::Address);

        // The CID is the only field whose presence gates the result.
        let Some(cid) = cid else {
            return Err(Error::ReadFail);
        };

        let photo = PhotoRead::new().run(&mut self.link);

        Ok(IdRecord {
            cid: String::from_utf8_lossy(&cid).into_owned(),
            name_th: decode::thai_text(&name_th.unwrap_or_default()),
            name_en: decode::latin_text(&name_en.unwrap_or_default()),
            birth_date: decode::birth_date(&birth_date.unwrap_or_default()),
            gender: decode::gender(&gender.unwrap_or_default()),
            address: decode::thai_text(&address.unwrap_or_default()),
            photo: decode::photo_data_uri(&photo),
        })
    }

    /// A failed or truncated field read yields `None` rather than aborting;
    /// a record with a few blank fields still beats no record at all.
    fn read_field(&mut self, field: Field) -> Option<Vec<u8>> {
        match self.link.exchange(&field.frame()) {
            Ok(rsp) => {
                let payload = apdu::payload(&rsp).map(<[u8]>::to_vec);
                if payload.is_none() {
                    debug!(?field, "reply too short, degrading to empty");
                }
                payload
            }
            Err(err) => {
                warn!(?field, "read failed, degrading to empty: {}", err);
                None
            }
        }
    }
}
