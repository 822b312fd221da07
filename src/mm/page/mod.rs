// Arquivo: mm/page/mod.rs
//
// Propósito: Interface abstrata do page-table engine hierárquico.
// Cada porta (arquitetura) descreve seu layout de PTE e a geometria dos
// níveis; o walker genérico (`pt`) implementa insert/remove/find/update/
// make_global uma única vez.
//
// Detalhes de Implementação:
// - `ENTRIES[nivel] == 0` colapsa o nível: o walker só percorre os níveis
//   com entradas, e o último deles é a folha.
// - PTEs são lidas/escritas como cópia (volatile); o engine nunca devolve
//   ponteiro para dentro da tabela.

//! Page-table engine: interface de porta

pub mod pt;

pub use pt::PageTable;

use crate::klib::align::fnzb;
use crate::mm::{PhysAddr, VirtAddr};
use bitflags::bitflags;

bitflags! {
    /// Flags abstratas de mapeamento (a porta traduz para bits reais).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PageFlags: u32 {
        const PRESENT   = 1 << 0;
        const READ      = 1 << 1;
        const WRITE     = 1 << 2;
        const EXEC      = 1 << 3;
        const USER      = 1 << 4;
        const CACHEABLE = 1 << 5;
        const GLOBAL    = 1 << 6;
    }
}

/// Acessores uniformes de uma entrada de tabela de página.
///
/// `set_flags` altera apenas os bits de flag (endereço preservado);
/// `set_present` altera apenas o bit present.
pub trait Pte: Copy {
    /// Entrada zerada (inválida).
    fn empty() -> Self;

    fn is_present(&self) -> bool;
    fn set_present(&mut self, present: bool);

    /// Endereço do próximo nível (ou do frame, na folha).
    fn address(&self) -> PhysAddr;
    fn set_address(&mut self, addr: PhysAddr);

    /// Frame mapeado (folha).
    fn frame(&self) -> PhysAddr {
        self.address()
    }

    fn flags(&self) -> PageFlags;
    fn set_flags(&mut self, flags: PageFlags);

    /// Entrada em uso (qualquer bit setado, na maioria das portas).
    fn is_valid(&self) -> bool;
    fn is_writable(&self) -> bool;
    fn is_executable(&self) -> bool;
}

/// Descrição de uma porta do engine.
pub trait PtPort {
    type Entry: Pte;

    /// Entradas por nível (PTL0..PTL3). Zero colapsa o nível.
    const ENTRIES: [usize; 4];

    /// log2 do tamanho de página.
    const PAGE_WIDTH: u32;

    /// Índice da página dentro da tabela do nível dado.
    fn vpn_index(level: usize, page: VirtAddr) -> usize {
        let mut shift = Self::PAGE_WIDTH;
        let mut l = level + 1;
        while l < 4 {
            shift += fnzb(Self::ENTRIES[l]);
            l += 1;
        }
        ((page.as_u64() >> shift) as usize) & (Self::ENTRIES[level] - 1)
    }

    /// Frames por tabela do nível dado.
    fn table_frames(level: usize) -> usize {
        let _ = level;
        1
    }
}
