//! Byte-exact command frames for the Thai national ID applet.
//!
//! Every read uses the proprietary-class READ BINARY `80 B0 <hi> <lo> 02 00
//! <le>`, with the file offset carried in P1/P2. The `02 00` trailer is a
//! quirk of this applet and is expected verbatim, so frames are built as
//! fixed byte arrays rather than through a generic APDU encoder.

/// SELECT the identity applet by AID (A0 00 00 00 54 48 00 01).
pub const SELECT_APPLET: [u8; 13] = [
    0x00, 0xA4, 0x04, 0x00, 0x08, 0xA0, 0x00, 0x00, 0x00, 0x54, 0x48, 0x00, 0x01,
];

/// The six fixed-position fields of the card's public data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Cid,
    NameTh,
    NameEn,
    BirthDate,
    Gender,
    Address,
}

impl Field {
    /// All fields, in the order the card is read.
    pub const ALL: [Field; 6] = [
        Field::Cid,
        Field::NameTh,
        Field::NameEn,
        Field::BirthDate,
        Field::Gender,
        Field::Address,
    ];

    /// (offset, length) of the field within the data file.
    fn location(self) -> (u16, u8) {
        match self {
            Self::Cid => (0x0004, 0x0D),
            Self::NameTh => (0x0011, 0x64),
            Self::NameEn => (0x0075, 0x64),
            Self::BirthDate => (0x00D9, 0x08),
            Self::Gender => (0x00E1, 0x01),
            Self::Address => (0x1579, 0x64),
        }
    }

    pub fn frame(self) -> [u8; 7] {
        let (offset, le) = self.location();
        read_binary(offset, le)
    }
}

/// READ BINARY at `offset`, expecting `le` bytes back. Photo chunks are
/// generated through this with an advancing offset; everything else uses the
/// constant per-field locations.
pub fn read_binary(offset: u16, le: u8) -> [u8; 7] {
    let [hi, lo] = offset.to_be_bytes();
    [0x80, 0xB0, hi, lo, 0x02, 0x00, le]
}

/// GET RESPONSE, issued when a reply carries a 61xx status word.
pub fn get_response(le: u8) -> [u8; 5] {
    [0x00, 0xC0, 0x00, 0x00, le]
}

/// Splits the trailing 2-byte status word off a reply, leaving the payload.
/// `None` if the reply is too short to even hold a status word.
pub fn payload(rsp: &[u8]) -> Option<&[u8]> {
    rsp.len().checked_sub(2).map(|n| &rsp[..n])
}
