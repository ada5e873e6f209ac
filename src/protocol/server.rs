//! Frame listener: one thread per connection, every decoded frame goes to
//! the handler. A version mismatch or malformed frame closes the connection.

use log::{debug, info, warn};
use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;

use super::{read_frame, Frame};
use crate::error::{CacheError, Result};
use crate::metrics::record_frame;

/// Accept loop. Returns only if `accept` itself fails fatally.
pub fn serve<F>(listener: TcpListener, max_len: usize, handler: F) -> Result<()>
where
    F: Fn(SocketAddr, Frame) + Send + Sync + 'static,
{
    let local = listener
        .local_addr()
        .map_err(|e| CacheError::io("listener address", e))?;
    info!("serve: listening on {}", local);
    let handler = Arc::new(handler);

    for conn in listener.incoming() {
        let stream = match conn {
            Ok(s) => s,
            Err(e) => {
                warn!("serve: accept failed: {}", e);
                continue;
            }
        };
        let peer = match stream.peer_addr() {
            Ok(p) => p,
            Err(e) => {
                warn!("serve: peer address: {}", e);
                continue;
            }
        };
        let h = handler.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("cc-conn-{}", peer))
            .spawn(move || {
                let res = serve_connection(stream, max_len, |f| (*h)(peer, f));
                match res {
                    Ok(n) => debug!("serve: {} closed after {} frame(s)", peer, n),
                    Err(e) => warn!("serve: {} dropped: {}", peer, e),
                }
            });
        if let Err(e) = spawned {
            warn!("serve: spawn connection thread: {}", e);
        }
    }
    Ok(())
}

/// Read frames until EOF or the first error. Returns the number of frames
/// handed to `on_frame`.
pub fn serve_connection<F>(stream: TcpStream, max_len: usize, mut on_frame: F) -> Result<u64>
where
    F: FnMut(Frame),
{
    let mut reader = BufReader::new(stream);
    let mut n = 0u64;
    while let Some(frame) = read_frame(&mut reader, max_len)? {
        record_frame();
        n += 1;
        on_frame(frame);
    }
    Ok(n)
}
