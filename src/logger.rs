use chrono::Local;
use std::io::{self, Write};

// Everything goes to stderr so stdout stays clean for callers that pipe it.
#[inline]
pub fn log(level: &str, file: &str, line: u32, message: &str) {
    let now = Local::now();
    let formatted_time = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let log_message = format!(
        "{} [{}] {}:{} - {}\n",
        formatted_time, level, file, line, message
    );

    let mut stderr = io::stderr().lock();
    let _ = stderr.write_all(log_message.as_bytes());
    let _ = stderr.flush();
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        #[cfg(any(feature = "log_error", feature = "log_warn", feature = "log_info", feature = "log_debug", feature = "log_trace"))]
        $crate::logger::log("ERROR", file!(), line!(), &format!($($arg)*))
    }
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        #[cfg(any(feature = "log_warn", feature = "log_info", feature = "log_debug", feature = "log_trace"))]
        $crate::logger::log("WARN ", file!(), line!(), &format!($($arg)*))
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        #[cfg(any(feature = "log_info", feature = "log_debug", feature = "log_trace"))]
        $crate::logger::log("INFO ", file!(), line!(), &format!($($arg)*))
    }
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        #[cfg(any(feature = "log_debug", feature = "log_trace"))]
        $crate::logger::log("DEBUG", file!(), line!(), &format!($($arg)*))
    }
}

#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "log_trace")]
        $crate::logger::log("TRACE", file!(), line!(), &format!($($arg)*))
    }
}
