//! Socket plumbing: one long-lived push connection shared by every stream,
//! surfaced to the dashboard as a pair of mpsc channels.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::{decode_inbound, encode_outbound, Inbound, Outbound, WireError};

/// Channel pair for the single push connection. Dropping the outbound sender
/// closes the write half; the inbound receiver ends when the socket does.
pub struct PushChannel {
    pub inbound: mpsc::UnboundedReceiver<Inbound>,
    pub outbound: mpsc::UnboundedSender<Outbound>,
}

/// Open the push connection and spawn its read/write tasks.
///
/// Outbound writes are fire-and-forget: a failed send is logged and the
/// subscription simply stays unestablished until the next user action.
pub async fn connect(url: &str) -> Result<PushChannel, WireError> {
    let (socket, _resp) = connect_async(url)
        .await
        .map_err(|e| WireError::Connect(e.to_string()))?;
    info!(url, "push channel connected");
    let (mut write, mut read) = socket.split();

    let (in_tx, in_rx) = mpsc::unbounded_channel::<Inbound>();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();

    tokio::spawn(async move {
        while let Some(frame) = read.next().await {
            match frame {
                Ok(Message::Text(text)) => match decode_inbound(&text) {
                    Ok(msg) => {
                        if in_tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(WireError::UnknownType(tag)) => {
                        metrics::counter!("wire_unknown_type_total", 1u64);
                        warn!(tag = %tag, "ignoring unrecognized push message");
                    }
                    Err(e) => warn!(error = %e, "dropping undecodable push message"),
                },
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Binary(_)) => {}
                Ok(Message::Close(_)) => {
                    debug!("push channel closed by server");
                    break;
                }
                Ok(Message::Frame(_)) => {}
                Err(e) => {
                    warn!(error = %e, "push channel read failed");
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let text = match encode_outbound(&msg) {
                Ok(t) => t,
                Err(e) => {
                    warn!(error = %e, "could not encode subscription request");
                    continue;
                }
            };
            if let Err(e) = write.send(Message::Text(text)).await {
                // No retry; the UI shows stale state until the next action.
                warn!(error = %e, "subscription request not delivered");
            }
        }
    });

    Ok(PushChannel { inbound: in_rx, outbound: out_tx })
}
