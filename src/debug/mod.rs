//! # Debug - Logging do Kernel
//!
//! Saída de diagnóstico via serial. As macros (`kinfo!` etc.) são
//! exportadas na raiz do crate.

pub mod klog;
