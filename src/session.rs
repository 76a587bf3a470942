//! PC/SC session setup: one context, the first reader, one card.

use tracing::{debug, trace, trace_span};

use crate::{Error, Result};

/// Connects to the card in the first available reader. The returned card
/// keeps its context alive; dropping it disconnects and releases both.
pub fn connect() -> Result<pcsc::Card> {
    let span = trace_span!("session_connect");
    let _enter = span.enter();

    debug!("Connecting to PCSC...");
    trace!({ scope = "user" }, "pcsc::Context::establish()");
    let ctx = pcsc::Context::establish(pcsc::Scope::User).map_err(Error::Context)?;

    debug!("Listing readers...");
    let mut buf = vec![0; ctx.list_readers_len().map_err(|_| Error::NoReader)?];
    let reader = ctx
        .list_readers(&mut buf)
        .map_err(|_| Error::NoReader)?
        .next()
        .ok_or(Error::NoReader)?;
    debug!("Reader: {:?}", reader);

    trace!(
        { sharing_mode = ?pcsc::ShareMode::Shared, protocols = ?pcsc::Protocols::ANY },
        "pcsc::Context::connect()"
    );
    ctx.connect(reader, pcsc::ShareMode::Shared, pcsc::Protocols::ANY)
        .map_err(Error::Connect)
}

/// Names of all connected readers, for the CLI.
pub fn list_readers() -> Result<Vec<String>> {
    let ctx = pcsc::Context::establish(pcsc::Scope::User).map_err(Error::Context)?;
    let mut buf = vec![0; ctx.list_readers_len().map_err(|_| Error::NoReader)?];
    Ok(ctx
        .list_readers(&mut buf)
        .map_err(|_| Error::NoReader)?
        .map(|name| name.to_string_lossy().into_owned())
        .collect())
}
