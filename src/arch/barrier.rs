// Arquivo: arch/barrier.rs
//
// Propósito: Barreiras de memória para o protocolo de visibilidade das
// page tables (e contagem de referências cross-CPU).
//
// Detalhes de Implementação:
// - write_barrier() pareia com read_barrier(): quem insere uma tabela
//   nova publica o conteúdo ANTES do bit present; quem lê consome o bit
//   present ANTES de dereferenciar o próximo nível.
// - Em x86_64 emitimos as instruções de fence; em outras arquiteturas
//   usamos os fences atômicos portáveis do core.

//! Barreiras de memória

/// Barreira de escrita: stores anteriores visíveis antes dos posteriores.
#[inline(always)]
pub fn write_barrier() {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::asm!("sfence", options(nostack, preserves_flags));
    }
    #[cfg(not(target_arch = "x86_64"))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::Release);
}

/// Barreira de leitura: loads posteriores não passam à frente dos
/// anteriores.
#[inline(always)]
pub fn read_barrier() {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::asm!("lfence", options(nostack, preserves_flags));
    }
    #[cfg(not(target_arch = "x86_64"))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::Acquire);
}

/// Barreira completa (visibilidade entre CPUs).
#[inline(always)]
pub fn memory_barrier() {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::asm!("mfence", options(nostack, preserves_flags));
    }
    #[cfg(not(target_arch = "x86_64"))]
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}
