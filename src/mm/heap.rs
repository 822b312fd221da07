//! # Kernel Heap Allocator
//!
//! Alocação dinâmica (`Box`, `Vec`) para o kernel via
//! `linked_list_allocator`, registrado como `#[global_allocator]`.
//! O boot chama `init` uma vez com a faixa virtual reservada ao heap.

use linked_list_allocator::LockedHeap;

#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

/// Inicializa o heap do kernel.
///
/// # Safety
///
/// `start..start+size` deve estar mapeado, gravável e exclusivo do heap.
pub unsafe fn init(start: usize, size: usize) {
    ALLOCATOR.lock().init(start as *mut u8, size);
}
