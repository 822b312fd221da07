//! # Synchronization Primitives
//!
//! Abstrações para garantir a integridade de dados em ambiente de kernel
//! concorrente (multicore e interrupt-driven).
//!
//! - **Spinlock:** re-exportamos `spin::Mutex` como `SpinMutex` para seções
//!   críticas curtas (o padrão da casa: trocar a implementação no futuro sem
//!   alterar o código consumidor).
//! - **Mutex:** mutex passivo próprio (pode bloquear), com guard que expõe o
//!   mutex para integração com `CondVar`.
//! - **CondVar:** espera por condição com unlock/sleep/relock.
//! - **WaitQ:** fila de espera com semântica de wakeup perdido (tokens) e
//!   wakeup-all (geração), incluindo variante com timeout.
//!
//! Ordem global de locks (ver udebug e caps):
//! 1. Mutex de udebug da task ANTES do mutex de udebug da thread.
//! 2. Lock do address space antes de qualquer operação de page table.
//! 3. Mutex de capabilities é folha: nenhum outro mutex do kernel pode ser
//!    adquirido com ele em mãos.

pub mod condvar;
pub mod mutex;
pub mod waitq;

pub use condvar::CondVar;
pub use mutex::{Mutex, MutexGuard};
pub use waitq::{SleepError, WaitQ};

// Re-exporta primitivas da crate `spin`.
// Isso facilita mudar a implementação no futuro sem alterar o código consumidor.
pub use spin::Mutex as SpinMutex;
pub use spin::{Lazy, Once};
