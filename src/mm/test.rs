//! Testes do page-table engine
//!
//! Rodam sobre a porta x86_64 com uma arena de frames de teste (memória
//! do heap, janela identity). Se o HHDM já foi movido do identity, os
//! testes não se aplicam e são pulados.

use crate::{kassert, kassert_eq};
use crate::arch::x86_64::page::{X86Pte, X86PtPort};
use crate::klib::test_framework::{TestCase, TestResult};
use crate::mm::aspace::AddressSpace;
use crate::mm::config::PAGE_SIZE;
use crate::mm::frame::{FrameAlloc, FrameFlags};
use crate::mm::hhdm;
use crate::mm::page::{PageFlags, PageTable, Pte};
use crate::mm::{PhysAddr, VirtAddr};
use alloc::alloc::{alloc, dealloc, Layout};

pub const MM_TESTS: &[TestCase] = &[
    TestCase::new("pt_insert_find", test_insert_find),
    TestCase::new("pt_remove_frees_tables", test_remove_frees_tables),
    TestCase::new("pt_remove_idempotent", test_remove_idempotent),
    TestCase::new("pt_shared_interior_tables", test_shared_interior_tables),
    TestCase::new("pt_update_bookkeeping", test_update_bookkeeping),
    TestCase::new("pt_make_global_persists", test_make_global_persists),
    TestCase::new("pt_aspace_lock", test_aspace_lock),
];

/// Arena de frames para testes: memória real do heap, endereços tratados
/// como físicos (válido só com a janela identity).
struct TestArena {
    base: *mut u8,
    layout: Layout,
    frames: usize,
    next: usize,
    outstanding: usize,
}

impl TestArena {
    fn new(frames: usize) -> Option<Self> {
        let layout = Layout::from_size_align(frames * PAGE_SIZE, PAGE_SIZE).ok()?;
        let base = unsafe { alloc(layout) };
        if base.is_null() {
            return None;
        }
        Some(Self {
            base,
            layout,
            frames,
            next: 0,
            outstanding: 0,
        })
    }
}

impl FrameAlloc for TestArena {
    fn alloc(&mut self, count: usize, _flags: FrameFlags, _constraint: u64) -> Option<PhysAddr> {
        if self.next + count > self.frames {
            return None;
        }
        let pa = PhysAddr::new(self.base as u64 + (self.next * PAGE_SIZE) as u64);
        self.next += count;
        self.outstanding += count;
        Some(pa)
    }

    fn free(&mut self, _addr: PhysAddr, count: usize) {
        self.outstanding -= count;
    }
}

impl Drop for TestArena {
    fn drop(&mut self) {
        unsafe { dealloc(self.base, self.layout) };
    }
}

fn identity_window() -> bool {
    hhdm::offset() == 0
}

const TEST_FLAGS: PageFlags = PageFlags::READ
    .union(PageFlags::WRITE)
    .union(PageFlags::USER)
    .union(PageFlags::CACHEABLE);

/// Mapeia e encontra: o find devolve frame e flags ∪ PRESENT.
fn test_insert_find() -> TestResult {
    if !identity_window() {
        return TestResult::Skip;
    }
    let mut arena = match TestArena::new(16) {
        Some(a) => a,
        None => return TestResult::Fail,
    };

    let mut pt: PageTable<X86PtPort> = match PageTable::new(&mut arena) {
        Ok(pt) => pt,
        Err(_) => return TestResult::Fail,
    };
    kassert_eq!(arena.outstanding, 1);

    let page = VirtAddr::new(0x4000);
    let frame = PhysAddr::new(0x10_0000);
    if pt.insert(&mut arena, page, frame, TEST_FLAGS).is_err() {
        return TestResult::Fail;
    }

    // Um nível interior novo por nível não inicializado: PTL1..PTL3.
    kassert_eq!(arena.outstanding, 4);

    let pte = match pt.find(page) {
        Some(pte) => pte,
        None => return TestResult::Fail,
    };
    kassert!(pte.is_present());
    kassert_eq!(pte.frame().as_u64(), frame.as_u64());
    kassert!(pte.flags().contains(TEST_FLAGS | PageFlags::PRESENT));

    // Página vizinha segue não mapeada.
    match pt.find(VirtAddr::new(0x5000)) {
        Some(other) => kassert!(!other.is_present()),
        None => return TestResult::Fail,
    }

    TestResult::Pass
}

/// Remover libera as tabelas interiores que esvaziaram (PTL0 fica).
fn test_remove_frees_tables() -> TestResult {
    if !identity_window() {
        return TestResult::Skip;
    }
    let mut arena = match TestArena::new(16) {
        Some(a) => a,
        None => return TestResult::Fail,
    };
    let mut pt: PageTable<X86PtPort> = match PageTable::new(&mut arena) {
        Ok(pt) => pt,
        Err(_) => return TestResult::Fail,
    };

    let page = VirtAddr::new(0x4000);
    if pt
        .insert(&mut arena, page, PhysAddr::new(0x10_0000), TEST_FLAGS)
        .is_err()
    {
        return TestResult::Fail;
    }
    kassert_eq!(arena.outstanding, 4);

    pt.remove(&mut arena, page);

    match pt.find(page) {
        None => {}
        Some(pte) => kassert!(!pte.is_present()),
    }
    kassert_eq!(arena.outstanding, 1);

    TestResult::Pass
}

/// Remover página já desmapeada é no-op.
fn test_remove_idempotent() -> TestResult {
    if !identity_window() {
        return TestResult::Skip;
    }
    let mut arena = match TestArena::new(16) {
        Some(a) => a,
        None => return TestResult::Fail,
    };
    let mut pt: PageTable<X86PtPort> = match PageTable::new(&mut arena) {
        Ok(pt) => pt,
        Err(_) => return TestResult::Fail,
    };

    pt.remove(&mut arena, VirtAddr::new(0x4000));
    kassert_eq!(arena.outstanding, 1);

    let page = VirtAddr::new(0x8000);
    if pt
        .insert(&mut arena, page, PhysAddr::new(0x20_0000), TEST_FLAGS)
        .is_err()
    {
        return TestResult::Fail;
    }
    pt.remove(&mut arena, page);
    pt.remove(&mut arena, page);
    kassert_eq!(arena.outstanding, 1);

    TestResult::Pass
}

/// Tabelas interiores compartilhadas só caem quando a última página sai.
fn test_shared_interior_tables() -> TestResult {
    if !identity_window() {
        return TestResult::Skip;
    }
    let mut arena = match TestArena::new(16) {
        Some(a) => a,
        None => return TestResult::Fail,
    };
    let mut pt: PageTable<X86PtPort> = match PageTable::new(&mut arena) {
        Ok(pt) => pt,
        Err(_) => return TestResult::Fail,
    };

    let page_a = VirtAddr::new(0x4000);
    let page_b = VirtAddr::new(0x5000); // mesma PT folha
    if pt
        .insert(&mut arena, page_a, PhysAddr::new(0x10_0000), TEST_FLAGS)
        .is_err()
    {
        return TestResult::Fail;
    }
    if pt
        .insert(&mut arena, page_b, PhysAddr::new(0x20_0000), TEST_FLAGS)
        .is_err()
    {
        return TestResult::Fail;
    }
    kassert_eq!(arena.outstanding, 4);

    pt.remove(&mut arena, page_a);
    // page_b mantém o caminho vivo.
    kassert_eq!(arena.outstanding, 4);
    kassert!(pt.find(page_b).is_some());

    pt.remove(&mut arena, page_b);
    kassert_eq!(arena.outstanding, 1);

    TestResult::Pass
}

/// update só mexe em bits de bookkeeping (frame/present/write/exec
/// idênticos).
fn test_update_bookkeeping() -> TestResult {
    if !identity_window() {
        return TestResult::Skip;
    }
    let mut arena = match TestArena::new(16) {
        Some(a) => a,
        None => return TestResult::Fail,
    };
    let mut pt: PageTable<X86PtPort> = match PageTable::new(&mut arena) {
        Ok(pt) => pt,
        Err(_) => return TestResult::Fail,
    };

    let page = VirtAddr::new(0x4000);
    if pt
        .insert(&mut arena, page, PhysAddr::new(0x10_0000), TEST_FLAGS)
        .is_err()
    {
        return TestResult::Fail;
    }

    let old = match pt.find(page) {
        Some(pte) => pte,
        None => return TestResult::Fail,
    };

    // Bit accessed (5) é bookkeeping.
    let new = X86Pte::from_raw(old.raw() | (1 << 5));
    pt.update(page, new);

    match pt.find(page) {
        Some(pte) => kassert_eq!(pte.raw(), new.raw()),
        None => return TestResult::Fail,
    }

    TestResult::Pass
}

/// Tabelas instaladas por make_global sobrevivem ao remove.
fn test_make_global_persists() -> TestResult {
    if !identity_window() {
        return TestResult::Skip;
    }
    let cfg = match crate::config::try_get() {
        Some(cfg) => cfg,
        None => return TestResult::Skip,
    };
    if cfg.km_size == 0 {
        return TestResult::Skip;
    }

    let mut arena = match TestArena::new(16) {
        Some(a) => a,
        None => return TestResult::Fail,
    };
    let mut pt: PageTable<X86PtPort> = match PageTable::new(&mut arena) {
        Ok(pt) => pt,
        Err(_) => return TestResult::Fail,
    };

    if pt
        .make_global(&mut arena, VirtAddr::new(cfg.km_base), cfg.km_size)
        .is_err()
    {
        return TestResult::Fail;
    }
    // Uma PTL1 por entrada da raiz coberta (km_size = 2 spans).
    let globals = arena.outstanding - 1;
    kassert!(globals > 0);

    // Mapear e desmapear dentro da região km: PTL2/PTL3 vão e voltam,
    // mas as tabelas globais ficam.
    let page = VirtAddr::new(cfg.km_base + 0x4000);
    if pt
        .insert(&mut arena, page, PhysAddr::new(0x30_0000), TEST_FLAGS)
        .is_err()
    {
        return TestResult::Fail;
    }
    kassert_eq!(arena.outstanding, 1 + globals + 2);

    pt.remove(&mut arena, page);
    kassert_eq!(arena.outstanding, 1 + globals);

    match pt.find(page) {
        None => {}
        Some(pte) => kassert!(!pte.is_present()),
    }

    TestResult::Pass
}

/// O lock do address space cobre as operações; lookup_unlocked funciona
/// sem ele.
fn test_aspace_lock() -> TestResult {
    if !identity_window() {
        return TestResult::Skip;
    }
    let mut arena = match TestArena::new(16) {
        Some(a) => a,
        None => return TestResult::Fail,
    };

    let aspace: AddressSpace<X86PtPort> = match AddressSpace::new(&mut arena) {
        Ok(a) => a,
        Err(_) => return TestResult::Fail,
    };

    let page = VirtAddr::new(0x4000);
    {
        let mut pt = aspace.lock();
        kassert!(aspace.is_locked());
        if pt
            .insert(&mut arena, page, PhysAddr::new(0x10_0000), TEST_FLAGS)
            .is_err()
        {
            return TestResult::Fail;
        }
    }
    kassert!(!aspace.is_locked());

    match aspace.lookup_unlocked(page) {
        Some(pte) => kassert!(pte.is_present()),
        None => return TestResult::Fail,
    }

    TestResult::Pass
}
