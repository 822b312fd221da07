//! # Higher Half Direct Map (HHDM)
//!
//! Janela fixa que mapeia toda a RAM física: o kernel acessa qualquer
//! endereço físico somando o offset do HHDM. O page-table engine usa isso
//! para tocar os frames das tabelas.
//!
//! Antes de `init` o offset é zero (identity), o que serve ao early-boot e
//! ao ambiente de self-test.

use crate::mm::PhysAddr;
use core::sync::atomic::{AtomicU64, Ordering};

/// Offset aplicado pelo bootloader (0 = identity).
static HHDM_OFFSET: AtomicU64 = AtomicU64::new(0);

/// Registra o offset do HHDM informado pelo bootloader.
pub fn init(offset: u64) {
    HHDM_OFFSET.store(offset, Ordering::Release);
}

/// Offset atual.
#[inline]
pub fn offset() -> u64 {
    HHDM_OFFSET.load(Ordering::Acquire)
}

/// Ponteiro virtual para um endereço físico.
#[inline]
pub fn phys_to_virt(pa: PhysAddr) -> *mut u8 {
    (pa.as_u64() + offset()) as *mut u8
}
