use std::io::Write;
use std::sync::Arc;
use std::sync::Weak;
use tracing::trace;

/// Which interpreter stream a chunk of output came from, so the surface can
/// style stdout and stderr differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Stdout,
    Stderr,
}

/// Text-surface collaborator consuming interpreter output.
pub trait SurfaceSink: Send + Sync + 'static {
    fn write_output(&self, kind: OutputKind, text: &str);
}

/// [`std::io::Write`] handle for interpreter stdout/stderr that forwards
/// completed lines back to the text surface.
///
/// Bytes accumulate in a per-handle buffer; every `'\n'`-terminated chunk,
/// or an explicit `flush` of a partial chunk, is decoded (lossy UTF-8) and
/// forwarded to the shared [`SurfaceSink`] tagged with this handle's
/// [`OutputKind`]. Clones share the surface but not the buffer, so stdout
/// and stderr handles never interleave within a line.
///
/// Writes never fail: once the host has dropped the surface, output is
/// discarded rather than surfaced to the interpreter as an error.
#[derive(Debug)]
pub struct OutputSink {
    kind: OutputKind,
    surface: Weak<dyn SurfaceSink>,
    buffer: Vec<u8>,
}

impl OutputSink {
    pub fn new(surface: &Arc<dyn SurfaceSink>, kind: OutputKind) -> Self {
        Self {
            kind,
            surface: Arc::downgrade(surface),
            buffer: Vec::new(),
        }
    }

    pub fn kind(&self) -> OutputKind {
        self.kind
    }

    fn forward(&self, bytes: &[u8]) {
        let Some(surface) = self.surface.upgrade() else {
            trace!(kind = ?self.kind, len = bytes.len(), "output dropped, surface is gone");
            return;
        };
        surface.write_output(self.kind, &String::from_utf8_lossy(bytes));
    }
}

impl Clone for OutputSink {
    /// Shares the surface; the buffer starts empty so each clone frames its
    /// own lines.
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            surface: self.surface.clone(),
            buffer: Vec::new(),
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, payload: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(payload);
        while let Some(newline_idx) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_idx).collect();
            self.forward(&line);
        }
        Ok(payload.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.buffer.is_empty() {
            let chunk: Vec<u8> = self.buffer.drain(..).collect();
            self.forward(&chunk);
        }
        Ok(())
    }
}
