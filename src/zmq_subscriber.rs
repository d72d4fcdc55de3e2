//! # ZMQ Subscriber
//!
//! SUB socket subscription to Dash Core's hash notifications, bridged into
//! the async dispatch loop.
//!
//! ZMQ sockets are not `Send`-friendly across await points, so the socket
//! lives on a dedicated OS thread. A short receive timeout lets the thread
//! observe the shutdown flag between polls; frames are forwarded over an
//! unbounded channel to the single consumer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::error::MonitorError;
use crate::notification::{RawNotification, Topic};

const RECV_TIMEOUT_MS: i32 = 1_000;

/// Handle to the running subscription; dropping it does not stop the
/// thread, call [`SubscriberHandle::shutdown`] for a clean teardown.
pub struct SubscriberHandle {
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SubscriberHandle {
    /// Signal the receive thread and wait for it to release the socket.
    pub fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Connect a SUB socket to `endpoint`, subscribe to the four lock topics,
/// and start draining it on a dedicated thread.
pub fn start(
    endpoint: &str,
) -> Result<(SubscriberHandle, UnboundedReceiver<RawNotification>), MonitorError> {
    let ctx = zmq::Context::new();
    let socket = ctx.socket(zmq::SUB)?;

    for topic in Topic::ALL {
        socket.set_subscribe(topic.as_str().as_bytes())?;
    }
    socket.set_rcvtimeo(RECV_TIMEOUT_MS)?;
    socket.connect(endpoint)?;

    info!("Subscribed to {} (topics: hashblock, hashchainlock, hashtx, hashtxlock)", endpoint);

    let (tx, rx) = mpsc::unbounded_channel();
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();

    let thread = std::thread::spawn(move || {
        loop {
            if shutdown_flag.load(Ordering::Relaxed) {
                break;
            }

            let frames = match socket.recv_multipart(0) {
                Ok(frames) => frames,
                Err(zmq::Error::EAGAIN) => continue, // receive timeout, poll shutdown
                Err(e) => {
                    warn!("ZMQ receive failed: {}", e);
                    continue;
                }
            };

            let raw = match RawNotification::from_frames(frames) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Dropping message: {}", e);
                    continue;
                }
            };

            if tx.send(raw).is_err() {
                // Consumer gone, nothing left to do.
                break;
            }
        }
        info!("ZMQ subscription released");
    });

    Ok((
        SubscriberHandle {
            shutdown,
            thread: Some(thread),
        },
        rx,
    ))
}
