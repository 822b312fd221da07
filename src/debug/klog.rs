//! Sistema de Logging Simplificado
//!
//! Macros diretas para saída serial, com níveis selecionados por feature
//! (no_logs, log_error, log_info, log_debug, log_trace).
//! Sem traits complexas, apenas texto e u64.

/// Trait auxiliar para imprimir valores de tipos diferentes
pub trait SerialDebug {
    fn serial_debug(&self);
}

impl SerialDebug for u64 {
    fn serial_debug(&self) {
        crate::drivers::serial::write_str(" 0x");
        crate::drivers::serial::write_hex(*self);
    }
}

impl SerialDebug for usize {
    fn serial_debug(&self) {
        crate::drivers::serial::write_str(" 0x");
        crate::drivers::serial::write_hex(*self as u64);
    }
}

impl SerialDebug for u32 {
    fn serial_debug(&self) {
        crate::drivers::serial::write_str(" 0x");
        crate::drivers::serial::write_hex(*self as u64);
    }
}

impl SerialDebug for i32 {
    fn serial_debug(&self) {
        crate::drivers::serial::write_str(" 0x");
        crate::drivers::serial::write_hex(*self as u64);
    }
}

impl SerialDebug for &str {
    fn serial_debug(&self) {
        crate::drivers::serial::write_str(" ");
        crate::drivers::serial::write_str(self);
    }
}

/// Error Log (removido apenas com no_logs)
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {
        #[cfg(not(feature = "no_logs"))]
        {
            $crate::drivers::serial::write_str("[ERROR] ");
            $crate::drivers::serial::write_str($msg);
            $crate::drivers::serial::write_str("\n");
        }
    };
    ($msg:expr, $val:expr) => {
        #[cfg(not(feature = "no_logs"))]
        {
            $crate::drivers::serial::write_str("[ERROR] ");
            $crate::drivers::serial::write_str($msg);
            $crate::debug::klog::SerialDebug::serial_debug(&$val);
            $crate::drivers::serial::write_str("\n");
        }
    };
}

/// Warn Log (removido apenas com no_logs)
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {
        #[cfg(not(feature = "no_logs"))]
        {
            $crate::drivers::serial::write_str("[WARN]  ");
            $crate::drivers::serial::write_str($msg);
            $crate::drivers::serial::write_str("\n");
        }
    };
    ($msg:expr, $val:expr) => {
        #[cfg(not(feature = "no_logs"))]
        {
            $crate::drivers::serial::write_str("[WARN]  ");
            $crate::drivers::serial::write_str($msg);
            $crate::debug::klog::SerialDebug::serial_debug(&$val);
            $crate::drivers::serial::write_str("\n");
        }
    };
}

/// Info Log
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {
        #[cfg(any(feature = "log_info", feature = "log_debug", feature = "log_trace"))]
        {
            $crate::drivers::serial::write_str("[INFO]  ");
            $crate::drivers::serial::write_str($msg);
            $crate::drivers::serial::write_str("\n");
        }
    };
    ($msg:expr, $val:expr) => {
        #[cfg(any(feature = "log_info", feature = "log_debug", feature = "log_trace"))]
        {
            $crate::drivers::serial::write_str("[INFO]  ");
            $crate::drivers::serial::write_str($msg);
            $crate::debug::klog::SerialDebug::serial_debug(&$val);
            $crate::drivers::serial::write_str("\n");
        }
    };
}

/// Debug Log
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {
        #[cfg(any(feature = "log_debug", feature = "log_trace"))]
        {
            $crate::drivers::serial::write_str("[DEBUG] ");
            $crate::drivers::serial::write_str($msg);
            $crate::drivers::serial::write_str("\n");
        }
    };
    ($msg:expr, $val:expr) => {
        #[cfg(any(feature = "log_debug", feature = "log_trace"))]
        {
            $crate::drivers::serial::write_str("[DEBUG] ");
            $crate::drivers::serial::write_str($msg);
            $crate::debug::klog::SerialDebug::serial_debug(&$val);
            $crate::drivers::serial::write_str("\n");
        }
    };
}

/// Trace Log (máxima verbosidade)
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {
        #[cfg(feature = "log_trace")]
        {
            $crate::drivers::serial::write_str("[TRACE] ");
            $crate::drivers::serial::write_str($msg);
            $crate::drivers::serial::write_str("\n");
        }
    };
    ($msg:expr, $val:expr) => {
        #[cfg(feature = "log_trace")]
        {
            $crate::drivers::serial::write_str("[TRACE] ");
            $crate::drivers::serial::write_str($msg);
            $crate::debug::klog::SerialDebug::serial_debug(&$val);
            $crate::drivers::serial::write_str("\n");
        }
    };
}
