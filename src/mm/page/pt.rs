// Arquivo: mm/page/pt.rs
//
// Propósito: Walker genérico das page tables hierárquicas de 4 níveis.
// Toda porta compartilha este algoritmo; o que varia (layout de PTE,
// geometria) entra pelo trait `PtPort`.
//
// Detalhes de Implementação:
// - Tabelas interiores novas são alocadas em LOWMEM, zeradas, linkadas
//   não-present e só ganham o bit present após write_barrier(): um walker
//   de hardware (ou find concorrente) vê a tabela ou ausente ou completa.
// - find() pareia com read_barrier() antes de descer cada nível e devolve
//   CÓPIA da PTE, nunca ponteiro.
// - remove() zera a entrada folha e libera tabelas interiores esvaziadas,
//   exceto as da região km (globais, compartilhadas entre address spaces).

//! Walker hierárquico de 4 níveis

use crate::arch::barrier;
use crate::config;
use crate::klib::align::{align_down_u64, fnzb, overlaps};
use crate::mm::config::PAGE_SIZE;
use crate::mm::frame::{FrameAlloc, FrameFlags};
use crate::mm::page::{PageFlags, Pte, PtPort};
use crate::mm::{hhdm, km, MmError, PhysAddr, VirtAddr};
use core::marker::PhantomData;

pub struct PageTable<P: PtPort> {
    root: PhysAddr,
    _port: PhantomData<P>,
}

impl<P: PtPort> PageTable<P> {
    /// Aloca e zera a tabela raiz (PTL0).
    pub fn new(alloc: &mut dyn FrameAlloc) -> Result<Self, MmError> {
        let (levels, _) = Self::active_levels();
        let root = Self::alloc_table(alloc, levels[0])?;
        Ok(Self {
            root,
            _port: PhantomData,
        })
    }

    /// Walker sobre uma raiz já existente.
    ///
    /// # Safety
    ///
    /// Alias sem dono da tabela: o chamador garante que só usa operações
    /// de leitura (`find`) ou que detém o lock do address space.
    pub unsafe fn from_root(root: PhysAddr) -> Self {
        Self {
            root,
            _port: PhantomData,
        }
    }

    /// Frame raiz (para carregar no registrador de base da MMU).
    pub fn root(&self) -> PhysAddr {
        self.root
    }

    /// Mapeia `page` -> `frame` com as flags dadas.
    ///
    /// Pré-condição: lock do address space em mãos (garantido por `&mut`).
    pub fn insert(
        &mut self,
        alloc: &mut dyn FrameAlloc,
        page: VirtAddr,
        frame: PhysAddr,
        flags: PageFlags,
    ) -> Result<(), MmError> {
        let (levels, n) = Self::active_levels();
        let mut table = self.root;

        for k in 0..n - 1 {
            let idx = P::vpn_index(levels[k], page);
            let entry = unsafe { Self::read_entry(table, idx) };

            if entry.is_present() {
                table = entry.address();
                continue;
            }

            let child = Self::alloc_table(alloc, levels[k + 1])?;
            let mut fresh = P::Entry::empty();
            fresh.set_address(child);
            // Permissivo no interior; a folha restringe.
            fresh.set_flags(
                PageFlags::USER | PageFlags::EXEC | PageFlags::CACHEABLE | PageFlags::WRITE,
            );
            unsafe { Self::write_entry(table, idx, fresh) };
            // A tabela nova só pode ficar visível depois de totalmente
            // inicializada.
            barrier::write_barrier();
            fresh.set_present(true);
            unsafe { Self::write_entry(table, idx, fresh) };

            table = child;
        }

        let idx = P::vpn_index(levels[n - 1], page);
        let mut pte = P::Entry::empty();
        pte.set_address(frame);
        pte.set_flags(flags.difference(PageFlags::PRESENT));
        unsafe { Self::write_entry(table, idx, pte) };
        // O mapeamento só pode ficar visível depois de completo.
        barrier::write_barrier();
        pte.set_present(true);
        unsafe { Self::write_entry(table, idx, pte) };

        Ok(())
    }

    /// Remove o mapeamento de `page`, se existir (idempotente).
    ///
    /// O shootdown de TLB é responsabilidade do chamador. Tabelas
    /// interiores esvaziadas são liberadas, exceto as compartilhadas da
    /// região km.
    pub fn remove(&mut self, alloc: &mut dyn FrameAlloc, page: VirtAddr) {
        let (levels, n) = Self::active_levels();

        let mut tables = [PhysAddr::NULL; 4];
        let mut idxs = [0usize; 4];
        tables[0] = self.root;

        for k in 0..n {
            idxs[k] = P::vpn_index(levels[k], page);
            if k + 1 < n {
                let entry = unsafe { Self::read_entry(tables[k], idxs[k]) };
                if !entry.is_present() {
                    return;
                }
                tables[k + 1] = entry.address();
            }
        }

        // Destruir o mapeamento. Só limpar o present não basta: a entrada
        // precisa ser zerada para a manutenção de coerência de PT em
        // algumas portas.
        unsafe { Self::write_entry(tables[n - 1], idxs[n - 1], P::Entry::empty()) };

        // Liberar, de baixo para cima, toda tabela que ficou vazia.
        for k in (1..n).rev() {
            if !Self::table_is_empty(tables[k], P::ENTRIES[levels[k]]) {
                // Há um caminho vivo até esta tabela; nada a liberar acima.
                return;
            }
            if k == 1 && km::is_non_identity(page) {
                // A entrada da raiz serve a região km compartilhada:
                // a tabela persiste.
                return;
            }
            unsafe { Self::write_entry(tables[k - 1], idxs[k - 1], P::Entry::empty()) };
            alloc.free(tables[k], P::table_frames(levels[k]));
        }
    }

    /// Busca o mapeamento de `page`. Devolve uma CÓPIA da PTE folha se o
    /// caminho até a tabela folha existe (a própria folha pode estar
    /// não-present; o chamador testa `is_present`).
    pub fn find(&self, page: VirtAddr) -> Option<P::Entry> {
        let (levels, n) = Self::active_levels();
        let mut table = self.root;

        for k in 0..n - 1 {
            let idx = P::vpn_index(levels[k], page);
            let entry = unsafe { Self::read_entry(table, idx) };
            if !entry.is_present() {
                return None;
            }
            // Só ler o próximo nível depois de vê-lo present (pareia com a
            // write_barrier de insert).
            barrier::read_barrier();
            table = entry.address();
        }

        let idx = P::vpn_index(levels[n - 1], page);
        Some(unsafe { Self::read_entry(table, idx) })
    }

    /// Atualiza a PTE de `page`. Apenas bits de bookkeeping podem mudar:
    /// frame, valid, present, writable e executable devem ser idênticos.
    ///
    /// Panic em mapeamento inexistente (erro de lógica do chamador).
    pub fn update(&mut self, page: VirtAddr, new: P::Entry) {
        let old = match self.find(page) {
            Some(pte) => pte,
            None => panic!("update de PTE inexistente"),
        };

        assert!(old.is_valid() == new.is_valid());
        assert!(old.is_present() == new.is_present());
        assert!(old.frame() == new.frame());
        assert!(old.is_writable() == new.is_writable());
        assert!(old.is_executable() == new.is_executable());

        let (levels, n) = Self::active_levels();
        let mut table = self.root;
        for k in 0..n - 1 {
            let entry = unsafe { Self::read_entry(table, P::vpn_index(levels[k], page)) };
            table = entry.address();
        }
        unsafe { Self::write_entry(table, P::vpn_index(levels[n - 1], page), new) };
    }

    /// Torna globais os mapeamentos da faixa `[base, base+size)`: toda
    /// entrada da raiz no intervalo cujo ponteiro de próximo nível é zero
    /// ganha uma tabela alocada, zerada e present. `remove` nunca libera
    /// essas tabelas (ver região km).
    pub fn make_global(
        &mut self,
        alloc: &mut dyn FrameAlloc,
        base: VirtAddr,
        size: u64,
    ) -> Result<(), MmError> {
        assert!(size > 0);

        let (levels, n) = Self::active_levels();
        if n < 2 {
            return Ok(());
        }

        let step = Self::root_step();
        let child_level = levels[1];

        let mut addr = align_down_u64(base.as_u64(), step);
        while addr.wrapping_sub(1) < base.as_u64() + size - 1 {
            let idx = P::vpn_index(levels[0], VirtAddr::new(addr));
            let entry = unsafe { Self::read_entry(self.root, idx) };

            if !entry.address().is_null() {
                // Esta entrada da raiz também mapeia a região identity do
                // kernel: já é global e inicializada.
                if let Some(cfg) = config::try_get() {
                    debug_assert!(overlaps(addr, step, cfg.identity_base, cfg.identity_size));
                }
                addr = addr.wrapping_add(step);
                continue;
            }

            let child = Self::alloc_table(alloc, child_level)?;
            let mut fresh = P::Entry::empty();
            fresh.set_address(child);
            fresh.set_flags(
                PageFlags::PRESENT
                    | PageFlags::USER
                    | PageFlags::CACHEABLE
                    | PageFlags::EXEC
                    | PageFlags::WRITE
                    | PageFlags::READ,
            );
            unsafe { Self::write_entry(self.root, idx, fresh) };

            addr = addr.wrapping_add(step);
        }

        Ok(())
    }

    /// Span de endereço virtual coberto por UMA entrada da raiz.
    fn root_step() -> u64 {
        let (levels, n) = Self::active_levels();
        let mut va_bits = P::PAGE_WIDTH;
        for k in 0..n {
            va_bits += fnzb(P::ENTRIES[levels[k]]);
        }
        1u64 << (va_bits - fnzb(P::ENTRIES[levels[0]]))
    }

    /// Níveis com entradas (o último é a folha).
    fn active_levels() -> ([usize; 4], usize) {
        let mut levels = [0usize; 4];
        let mut n = 0;
        let mut l = 0;
        while l < 4 {
            if P::ENTRIES[l] != 0 {
                levels[n] = l;
                n += 1;
            }
            l += 1;
        }
        debug_assert!(n > 0, "porta sem niveis de page table");
        (levels, n)
    }

    fn table_is_empty(table: PhysAddr, entries: usize) -> bool {
        for idx in 0..entries {
            if unsafe { Self::read_entry(table, idx) }.is_valid() {
                return false;
            }
        }
        true
    }

    fn alloc_table(alloc: &mut dyn FrameAlloc, level: usize) -> Result<PhysAddr, MmError> {
        let frames = P::table_frames(level);
        let pa = alloc
            .alloc(frames, FrameFlags::LOWMEM, 0)
            .ok_or(MmError::OutOfMemory)?;
        unsafe {
            core::ptr::write_bytes(hhdm::phys_to_virt(pa), 0, frames * PAGE_SIZE);
        }
        Ok(pa)
    }

    #[inline]
    unsafe fn read_entry(table: PhysAddr, idx: usize) -> P::Entry {
        let ptr = (hhdm::phys_to_virt(table) as *const P::Entry).add(idx);
        core::ptr::read_volatile(ptr)
    }

    #[inline]
    unsafe fn write_entry(table: PhysAddr, idx: usize, pte: P::Entry) {
        let ptr = (hhdm::phys_to_virt(table) as *mut P::Entry).add(idx);
        core::ptr::write_volatile(ptr, pte);
    }
}
