use anyhow::{Context, Result};
use log::info;
use std::net::TcpListener;

use CerebralCache::protocol::{serve, version_string};
use CerebralCache::util::hex_dump;
use CerebralCache::CacheConfig;

/// Listens and logs frames; nothing is applied to a store.
pub fn exec(addr: Option<String>, max_frame_bytes: Option<usize>) -> Result<()> {
    let mut cfg = CacheConfig::from_env();
    if let Some(a) = addr {
        cfg = cfg.with_listen_addr(a);
    }
    if let Some(n) = max_frame_bytes {
        cfg = cfg.with_max_frame_bytes(n);
    }

    let listener = TcpListener::bind(&cfg.listen_addr)
        .with_context(|| format!("bind {}", cfg.listen_addr))?;
    serve(listener, cfg.max_frame_bytes, |peer, frame| {
        let preview = &frame.content[..frame.content.len().min(32)];
        info!(
            "frame from {}: v{} action={} {} B [{}]",
            peer,
            version_string(frame.version),
            frame.action,
            frame.content.len(),
            hex_dump(preview)
        );
    })?;
    Ok(())
}
