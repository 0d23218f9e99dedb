use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use tracing::trace;

/// The blocking, closeable, reopenable character stream connecting the text
/// surface (producer side) to the interpreter thread (consumer side).
///
/// Cloning is cheap and every clone refers to the same underlying stream;
/// producers and consumers each hold one long-lived handle across any number
/// of `close()`/`clear()` cycles.
///
/// All end-of-stream conditions surface as `None` from the read methods,
/// never as a panic or an error: close, reset, and per-call cancellation are
/// normal termination signals here, because the producer (UI) and consumer
/// (interpreter) are decoupled and neither may destabilize the other.
#[derive(Debug, Clone, Default)]
pub struct StreamBridge {
    inner: Arc<BridgeInner>,
}

#[derive(Debug)]
struct BridgeInner {
    state: Mutex<BridgeState>,
    readable: Condvar,
}

#[derive(Debug)]
struct BridgeState {
    buffer: VecDeque<char>,
    open: bool,
    /// Reopen generation counter. `clear()` bumps it so that a reader that
    /// entered its wait before the reset observes end-of-stream, exactly as
    /// it would for `close()`, while the post-state is open-and-empty.
    epoch: u64,
}

impl Default for BridgeInner {
    fn default() -> Self {
        Self {
            state: Mutex::new(BridgeState {
                buffer: VecDeque::new(),
                open: true,
                epoch: 0,
            }),
            readable: Condvar::new(),
        }
    }
}

fn lock(mutex: &Mutex<BridgeState>) -> MutexGuard<'_, BridgeState> {
    // A producer that panicked while holding the lock left the state
    // coherent (every mutation is a single update), so poisoning is
    // recovered rather than propagated into the consumer.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StreamBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `text` verbatim to the buffer tail and wakes blocked readers.
    ///
    /// Embedded separators are not interpreted; line framing is the reader's
    /// job. On a closed bridge this is a silent no-op so that producers never
    /// need to check stream state before calling.
    pub fn append(&self, text: &str) {
        let mut state = lock(&self.inner.state);
        if !state.open {
            trace!(len = text.len(), "append dropped, bridge is closed");
            return;
        }
        state.buffer.extend(text.chars());
        self.inner.readable.notify_all();
    }

    /// Pops the head character, blocking while the bridge is open and empty.
    ///
    /// Returns `None` once the stream ends: the bridge was closed and the
    /// buffer is exhausted, or the bridge was reset while this call waited.
    /// Buffered characters remain drainable after `close()`.
    pub fn read_char(&self) -> Option<char> {
        self.read_char_inner(None)
    }

    /// Like [`read_char`](Self::read_char), and additionally returns `None`
    /// when `token` is cancelled while the call would block. A call that
    /// finds buffered data returns it even on a cancelled token;
    /// cancellation only terminates waits.
    pub fn read_char_cancellable(&self, token: &CancelToken) -> Option<char> {
        self.read_char_inner(Some(token))
    }

    /// Pops the head character if one is buffered; never blocks.
    pub fn try_read_char(&self) -> Option<char> {
        lock(&self.inner.state).buffer.pop_front()
    }

    /// Accumulates characters until a line separator or end-of-stream.
    ///
    /// The `'\n'` separator is consumed but excluded from the result, as is
    /// one `'\r'` immediately preceding it. End-of-stream before any
    /// character was accumulated for this call yields `None`; end-of-stream
    /// after partial accumulation yields the partial line.
    pub fn read_line(&self) -> Option<String> {
        self.read_line_inner(None)
    }

    /// Cancellable variant of [`read_line`](Self::read_line).
    pub fn read_line_cancellable(&self, token: &CancelToken) -> Option<String> {
        self.read_line_inner(Some(token))
    }

    /// Number of characters readable without blocking. `0` on an empty
    /// buffer regardless of open/closed state.
    pub fn available(&self) -> usize {
        lock(&self.inner.state).buffer.len()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.inner.state).open
    }

    /// Closes the bridge and wakes waiters. Idempotent.
    ///
    /// Buffered-but-unread characters stay drainable until exhausted, after
    /// which reads yield `None`; new appends are discarded.
    pub fn close(&self) {
        let mut state = lock(&self.inner.state);
        if state.open {
            state.open = false;
            trace!("bridge closed");
        }
        self.inner.readable.notify_all();
    }

    /// Reopens the bridge and discards any buffered data, regardless of the
    /// prior state.
    ///
    /// A reader blocked at the moment of the reset observes end-of-stream,
    /// the same as the close path; afterwards the bridge is open with an
    /// empty buffer and serves future reads normally.
    pub fn clear(&self) {
        let mut state = lock(&self.inner.state);
        state.open = true;
        state.buffer.clear();
        state.epoch += 1;
        trace!(epoch = state.epoch, "bridge reset");
        self.inner.readable.notify_all();
    }

    /// Creates a cancellation handle for blocking reads on this bridge.
    ///
    /// Cancelling terminates only the waits that were given this token (they
    /// return `None`) and never changes bridge state; other blocked or
    /// future calls are unaffected. A cancelled token stays cancelled, so a
    /// fresh read takes a fresh token.
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            inner: self.inner.clone(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    fn read_char_inner(&self, token: Option<&CancelToken>) -> Option<char> {
        let mut state = lock(&self.inner.state);
        let epoch = state.epoch;
        loop {
            // The epoch check comes before the pop so a reader that was
            // blocked across a reset never consumes data appended after it.
            if state.epoch != epoch {
                return None;
            }
            if let Some(ch) = state.buffer.pop_front() {
                return Some(ch);
            }
            if !state.open {
                return None;
            }
            if token.is_some_and(CancelToken::is_cancelled) {
                trace!("blocking read cancelled");
                return None;
            }
            state = self
                .inner
                .readable
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn read_line_inner(&self, token: Option<&CancelToken>) -> Option<String> {
        let mut line = String::new();
        loop {
            match self.read_char_inner(token) {
                Some('\n') => {
                    if line.ends_with('\r') {
                        line.pop();
                    }
                    return Some(line);
                }
                Some(ch) => line.push(ch),
                None if line.is_empty() => return None,
                None => return Some(line),
            }
        }
    }
}

/// Per-call cancellation signal for blocking reads, the stand-in for
/// platform thread interruption: cancelling releases the waits holding this
/// token without touching the bridge.
#[derive(Debug, Clone)]
pub struct CancelToken {
    inner: Arc<BridgeInner>,
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        // Taking the lock orders the flag store against a waiter's check, so
        // the notify cannot slip between its check and its wait.
        let _state = lock(&self.inner.state);
        self.inner.readable.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
