//! Input/output plumbing between an asynchronous text surface and a
//! synchronous interpreter thread.
//!
//! The text surface pushes committed lines and pastes into a
//! [`StreamBridge`] with [`StreamBridge::append`]; the interpreter thread
//! drains it with blocking char/line reads, or through the [`BridgeReader`]
//! adapter when it wants a plain [`std::io::Read`]. The bridge can be closed
//! (idempotent, readers see end-of-stream once the buffer drains) and fully
//! reopened with [`StreamBridge::clear`], on the same long-lived handle, any
//! number of times. A pending blocking read can be terminated on its own via
//! a [`CancelToken`] without disturbing the bridge or other readers.
//!
//! [`OutputSink`] is the reverse direction: a [`std::io::Write`] for
//! interpreter stdout/stderr that forwards completed lines back to the
//! surface.

mod bridge;
mod output;
mod reader;

pub use bridge::CancelToken;
pub use bridge::StreamBridge;
pub use output::OutputKind;
pub use output::OutputSink;
pub use output::SurfaceSink;
pub use reader::BridgeReader;
