#![deny(clippy::all)]
use std::{
    fs::File,
    io::{self, Write},
    panic::PanicHookInfo,
    sync::atomic::{AtomicBool, Ordering},
    thread,
};

use backtrace::Backtrace;

const CRASH_LOG: &str = "crash.log";

static TRIPPED: AtomicBool = AtomicBool::new(false);

/// Panic hook that records the panic message, location, and a captured
/// backtrace to `crash.log` in the current working directory, mirroring
/// the report to stderr.
///
/// Install with `std::panic::set_hook(Box::new(panic_trace::hook))`.
pub fn hook(info: &PanicHookInfo<'_>) {
    TRIPPED.store(true, Ordering::Release);

    let message = payload_message(info);
    let thread = thread::current();
    let name = thread.name().unwrap_or("<unnamed>");

    let location = info
        .location()
        .map(ToString::to_string)
        .unwrap_or_else(|| String::from("<unknown>"));

    let backtrace = Backtrace::new();
    let report = format!(
        "thread '{name}' panicked at {location}:\n{message}\nstack backtrace:\n{backtrace:#?}\n"
    );

    let _ = io::stderr().write_all(report.as_bytes());

    if let Ok(mut file) = File::create(CRASH_LOG) {
        let _ = file.write_all(report.as_bytes());
    }
}

/// Whether any thread has panicked since the hook was installed.
pub fn tripped() -> bool {
    TRIPPED.load(Ordering::Acquire)
}

fn payload_message<'a>(info: &'a PanicHookInfo<'_>) -> &'a str {
    let payload = info.payload();

    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "Box<dyn Any>"
    }
}
