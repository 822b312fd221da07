//! Address space
//!
//! Um address space é uma tradução VA->PA enraizada numa PTL0. O lock
//! cobre toda mutação e a maior parte das buscas; a exceção documentada é
//! `lookup_unlocked`, o equivalente do walker de hardware (protegido pelo
//! pareamento de barreiras do engine, não pelo lock).

use crate::mm::frame::FrameAlloc;
use crate::mm::page::{PageTable, PtPort};
use crate::mm::{MmError, PhysAddr, VirtAddr};
use crate::sync::SpinMutex;

pub struct AddressSpace<P: PtPort> {
    root: PhysAddr,
    table: SpinMutex<PageTable<P>>,
}

impl<P: PtPort> AddressSpace<P> {
    /// Cria o address space com a raiz alocada e zerada.
    pub fn new(alloc: &mut dyn FrameAlloc) -> Result<Self, MmError> {
        let table = PageTable::new(alloc)?;
        Ok(Self {
            root: table.root(),
            table: SpinMutex::new(table),
        })
    }

    /// Adquire o lock do address space. Toda operação de page table passa
    /// pelo guard retornado.
    pub fn lock(&self) -> spin::MutexGuard<'_, PageTable<P>> {
        self.table.lock()
    }

    /// Estado do lock (para asserções).
    pub fn is_locked(&self) -> bool {
        self.table.is_locked()
    }

    /// Frame da PTL0.
    pub fn root(&self) -> PhysAddr {
        self.root
    }

    /// Busca sem o lock, no estilo de um walker de hardware. A cópia
    /// retornada pode estar desatualizada em relação a mutações
    /// concorrentes; a consistência estrutural vem das barreiras do
    /// engine.
    pub fn lookup_unlocked(&self, page: VirtAddr) -> Option<P::Entry> {
        unsafe { PageTable::<P>::from_root(self.root) }.find(page)
    }
}
