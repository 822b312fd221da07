//! # Kernel Driver Layer
//!
//! Deste core só sobrevive o driver serial: é a saída primária de logs
//! (klog). Os demais drivers do sistema vivem em userspace.

pub mod serial;
