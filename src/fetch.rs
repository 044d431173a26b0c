//! Background fetching.
//!
//! Runs on a dedicated thread, performing blocking HTTP work for the UI
//! thread: page fetches, promoted-content fetches, and fire-and-forget
//! post actions. Requests arrive over one [`mpsc`] channel and results go
//! back over another; the UI thread drains results on every tick.
//!
//! Each page response carries the request id handed out by the cache when
//! the fetch began, so results that arrive after an invalidation or a feed
//! switch are recognised and dropped instead of corrupting newer state.

use std::sync::mpsc;
use std::thread;

use log::{debug, warn};

use crate::cache::RequestId;
use crate::feed::{Ad, AdSource, FeedError, FeedPage, FeedQuery, FeedSource, RemoteAction};

/// Requests sent from the UI thread to the fetch worker.
pub enum FetchRequest {
    /// Fetch one feed page, continuing from `cursor`.
    Page {
        id: RequestId,
        query: FeedQuery,
        cursor: Option<String>,
        first: usize,
    },
    /// Fetch `count` promoted items for the feed instance `generation`.
    Ads { generation: u64, count: usize },
    /// Forward a user action to the backend. The cache was already updated
    /// optimistically; a failure is reported back for rollback.
    Mutate { post_id: String, action: RemoteAction },
}

/// Results sent from the fetch worker back to the UI thread.
pub enum FetchMsg {
    Page {
        id: RequestId,
        query: FeedQuery,
        result: Result<FeedPage, String>,
    },
    Ad {
        generation: u64,
        /// `None` when the inventory is exhausted.
        ad: Option<Ad>,
    },
    MutateFailed {
        post_id: String,
        action: RemoteAction,
        error: String,
    },
}

/// The seam between feed state and the worker. Production code sends over
/// the channel; tests substitute a counting mock.
pub trait FetchDispatch {
    fn dispatch(&self, request: FetchRequest) -> Result<(), FeedError>;
}

/// Channel-backed handle to the fetch worker thread.
#[derive(Clone)]
pub struct FetchHandle {
    tx: mpsc::Sender<FetchRequest>,
}

impl FetchDispatch for FetchHandle {
    fn dispatch(&self, request: FetchRequest) -> Result<(), FeedError> {
        self.tx.send(request).map_err(|_| FeedError::WorkerGone)
    }
}

/// Spawn the background fetch thread.
///
/// Returns the request handle and the receiver the main loop should drain on
/// every tick. The thread runs until the handle (and every clone of it) is
/// dropped, which closes the request channel.
pub fn spawn(
    source: Box<dyn FeedSource>,
    ads: Box<dyn AdSource>,
) -> (FetchHandle, mpsc::Receiver<FetchMsg>) {
    let (req_tx, req_rx) = mpsc::channel::<FetchRequest>();
    let (msg_tx, msg_rx) = mpsc::channel::<FetchMsg>();

    thread::spawn(move || {
        while let Ok(request) = req_rx.recv() {
            let msg = match request {
                FetchRequest::Page {
                    id,
                    query,
                    cursor,
                    first,
                } => {
                    debug!("worker: page fetch {id} for {query} via {}", source.name());
                    let result = source
                        .fetch_page(&query, cursor.as_deref(), first)
                        .map_err(|e| e.to_string());
                    FetchMsg::Page { id, query, result }
                }
                FetchRequest::Ads { generation, count } => {
                    // Fan a multi-ad request out into one message per ad so
                    // the UI can start rendering the first one immediately.
                    let mut sent = 0;
                    for _ in 0..count {
                        match ads.fetch_ad() {
                            Ok(Some(ad)) => {
                                sent += 1;
                                if msg_tx.send(FetchMsg::Ad { generation, ad: Some(ad) }).is_err() {
                                    return;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                warn!("ad fetch failed: {e}");
                                break;
                            }
                        }
                    }
                    if sent == count {
                        continue;
                    }
                    // Report exhaustion once so the instance stops asking.
                    FetchMsg::Ad {
                        generation,
                        ad: None,
                    }
                }
                FetchRequest::Mutate { post_id, action } => {
                    match source.apply_action(&post_id, action) {
                        Ok(()) => continue,
                        Err(e) => FetchMsg::MutateFailed {
                            post_id,
                            action,
                            error: e.to_string(),
                        },
                    }
                }
            };
            // If the receiver is gone the main thread has exited; stop quietly.
            if msg_tx.send(msg).is_err() {
                return;
            }
        }
    });

    (FetchHandle { tx: req_tx }, msg_rx)
}
