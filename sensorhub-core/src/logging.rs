// Optional logging. Without the `log` feature every macro compiles to a
// dead branch that still type-checks its arguments.

#[cfg(feature = "log")]
macro_rules! log_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_trace {
    ($($arg:tt)*) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    };
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    };
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    };
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    };
}

#[cfg(feature = "log")]
macro_rules! log_error {
    ($($arg:tt)*) => { log::error!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if false {
            ::core::mem::drop(::core::format_args!($($arg)*));
        }
    };
}
