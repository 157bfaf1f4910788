//! Chrome trace output.
//!
//! Off unless `open()` is called; `scope()` is then a near no-op.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

static TRACE: Mutex<Option<Trace>> = Mutex::new(None);
static ENABLED: AtomicBool = AtomicBool::new(false);

struct Event {
    name: &'static str,
    start: Instant,
    end: Instant,
}

struct Trace {
    start: Instant,
    w: BufWriter<File>,
}

impl Trace {
    fn new(path: &str) -> std::io::Result<Self> {
        let mut w = BufWriter::new(File::create(path)?);
        writeln!(w, "[")?;
        Ok(Trace {
            start: Instant::now(),
            w,
        })
    }

    fn write_event(&mut self, event: &Event) -> std::io::Result<()> {
        write!(
            self.w,
            "{{ \"pid\": 0, \"name\": {:?}, \"ts\": {}, \"ph\": \"X\", \"dur\": {} }}",
            event.name,
            event.start.duration_since(self.start).as_micros(),
            event.end.duration_since(event.start).as_micros(),
        )
    }

    fn write(&mut self, event: &Event) -> std::io::Result<()> {
        self.write_event(event)?;
        writeln!(self.w, ",")
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.write_event(&Event {
            name: "main",
            start: self.start,
            end: Instant::now(),
        })?;
        writeln!(self.w, "]")?;
        self.w.flush()
    }
}

fn lock() -> MutexGuard<'static, Option<Trace>> {
    TRACE.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn open(path: &str) -> std::io::Result<()> {
    let trace = Trace::new(path)?;
    *lock() = Some(trace);
    ENABLED.store(true, Ordering::Release);
    Ok(())
}

/// Run `f`, recording how long it took as a named span.
/// Spans may nest and may be recorded from any thread.
#[inline]
pub fn scope<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    if !ENABLED.load(Ordering::Acquire) {
        return f();
    }
    let start = Instant::now();
    let result = f();
    let event = Event {
        name,
        start,
        end: Instant::now(),
    };
    if let Some(trace) = lock().as_mut() {
        // Tracing is best-effort; a failed write must not fail the build.
        let _ = trace.write(&event);
    }
    result
}

pub fn close() -> std::io::Result<()> {
    ENABLED.store(false, Ordering::Release);
    match lock().take() {
        Some(mut trace) => trace.close(),
        None => Ok(()),
    }
}
