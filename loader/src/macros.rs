// src/macros.rs

/// Logs one status line tagged with the component that produced it.
///
/// The component becomes the record target, which the log file format prints
/// next to the level. Usage:
/// ```ignore
/// ldr_log!(Level::Info, "table", "Patch table created");
/// ldr_log!(Level::Error, "store", "Cannot write settings: {}", err);
/// ```
/// The console shows `Ldr: Patch table created`; the log file shows
/// `[2019-01-04T16:32:10+02:00][INFO ][table][pid=4568][tid=ThreadId(1)] Patch table created`.
#[macro_export]
macro_rules! ldr_log {
    ($level:expr, $component:expr, $fmt:literal $(, $($arg:tt)+)?) => {
        log::log!(target: $component, $level, $fmt $(, $($arg)+)?)
    };
}

#[cfg(test)]
mod tests {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use std::sync::Mutex;

    /// A tiny in-memory logger that captures up to DEBUG.
    struct MemoryLogger {
        buffer: Mutex<String>,
    }

    impl MemoryLogger {
        const fn new() -> Self {
            MemoryLogger { buffer: Mutex::new(String::new()) }
        }

        fn take(&self) -> String {
            std::mem::take(&mut *self.buffer.lock().unwrap())
        }
    }

    static LOGGER: MemoryLogger = MemoryLogger::new();

    impl Log for MemoryLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= Level::Debug
        }
        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                let mut buf = self.buffer.lock().unwrap();
                buf.push_str(&format!("[{}][{}] {}\n", record.level(), record.target(), record.args()));
            }
        }
        fn flush(&self) {}
    }

    #[test]
    fn ldr_log_tags_component_as_target() {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Debug);
        LOGGER.take();

        ldr_log!(Level::Debug, "device", "handle opened = {}", 42);
        ldr_log!(Level::Warn, "driver", "restart failed");

        let output = LOGGER.take();
        assert!(output.contains("[DEBUG][device] handle opened = 42"), "missing record: {}", output);
        assert!(output.contains("[WARN][driver] restart failed"), "missing record: {}", output);
    }
}
