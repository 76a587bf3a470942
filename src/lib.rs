//! Reads the public data file of a Thai national ID card over PC/SC.
//!
//! The card speaks a small ISO 7816-4 dialect: SELECT the identity applet,
//! then READ BINARY against fixed offsets in a single transparent file. The
//! interesting parts live in [`transport`] (61xx response chaining), [`photo`]
//! (segmented read of a field with no advertised length) and [`decode`]
//! (legacy Thai text and Buddhist-calendar dates).

pub mod apdu;
pub mod decode;
pub mod photo;
pub mod reader;
pub mod server;
pub mod session;
pub mod transport;

pub use reader::{CardReader, IdRecord};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// PC/SC context could not be established; pcscd is probably not running.
    #[error("failed to establish PC/SC context: {0}")]
    Context(#[source] pcsc::Error),

    #[error("no card reader found")]
    NoReader,

    /// The reader is there, but connecting to the card in it failed.
    #[error("card unresponsive or not detected: {0}")]
    Connect(#[source] pcsc::Error),

    /// The CID could not be read; without it there is no record to return.
    #[error("failed to read ID data from card")]
    ReadFail,

    #[error("transport error: {0}")]
    Transport(#[from] pcsc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
