// (FASE1) src/lib.rs
//! Anvil Kernel Core Library.
//!
//! Ponto central de exportação dos módulos do núcleo.
//! Este crate é o *core* do microkernel: capability space, page tables
//! hierárquicas, udebug e bringup SMP. Scheduler, transporte IPC, VFS e
//! drivers vivem fora daqui e consomem estas interfaces.

#![no_std]

// Habilitar alocação dinâmica (necessário para Vec/Box)
extern crate alloc;

// --- Módulos de Baixo Nível (Hardware) ---
pub mod arch; // Barreiras de memória, layout de PTE por porta
pub mod drivers; // Serial (saída de log)

// --- Módulos Centrais (Lógica do Kernel) ---
pub mod config; // Registro de boot (cpu_count, regiões de memória)
pub mod debug; // Logging (klog)
pub mod klib; // Utilitários internos (hash table, arena, align)
pub mod mm; // Gerenciamento de memória (HHDM, frames, page tables)
pub mod sync; // Primitivas de sincronização (Mutex, CondVar, WaitQ)

// --- Subsistemas ---
pub mod caps; // Capabilities e kernel objects
pub mod ipc; // Contrato mínimo de chamadas (answerbox)
pub mod smp; // Descoberta e bringup de CPUs
pub mod task; // Portadores Task/Thread
pub mod udebug; // Depuração de userspace

#[cfg(feature = "self_test")]
pub mod selftest;

// Re-exportar tipos de endereço para acesso fácil
pub use crate::mm::{PhysAddr, VirtAddr};
