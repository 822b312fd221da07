//! # Memory Management
//!
//! Deste core: janela física (HHDM), contrato de frames, heap do kernel e
//! o page-table engine hierárquico de 4 níveis com as portas por
//! arquitetura. O alocador físico real (PMM) é colaborador externo e entra
//! pelo trait `FrameAlloc`.

// Módulos
pub mod addr;
pub mod aspace;
pub mod config;
pub mod error;
pub mod frame;
pub mod heap;
pub mod hhdm;
pub mod km;
pub mod page;

#[cfg(feature = "self_test")]
pub mod test;

// Re-exports úteis
pub use addr::{PhysAddr, VirtAddr};
pub use error::MmError;

pub type Result<T> = core::result::Result<T, MmError>;
