// Arquivo: caps/mod.rs
//
// Propósito: Capability space - nomes task-locais (handles inteiros)
// para referências a kernel objects.
//
// Uma capability é Allocated ou Published. Alocar reserva o handle no
// namespace da task; publicar associa um kernel object existente (a
// referência do chamador é CONSUMIDA pela capability). Despublicar
// devolve a referência ao chamador; liberar devolve o handle à arena.
// Userspace só enxerga capabilities Published.
//
// Detalhes de Implementação:
// - O estado mora em `CapSpace`, protegido pelo mutex passivo de
//   `CapInfo`. Esse mutex é FOLHA na ordem global de locks.
// - Callbacks de iteração recebem `&mut CapSpace`: operações reentrantes
//   usam o lock já em mãos (sem mutex recursivo).
// - Published <=> referência presente, por construção (o estado carrega
//   o KObjRef).

//! Capability space

pub mod kobject;

#[cfg(feature = "self_test")]
pub mod test;

pub use kobject::{KObjRef, KObjectType, KRaw, KOBJECT_TYPE_MAX};

use crate::klib::arena::RaArena;
use crate::klib::hash::{hash_mix, HashTable, TableOps};
use crate::sync::{Mutex, MutexGuard};
use crate::task::Task;
use alloc::vec::Vec;

/// Handle nulo (nunca alocado).
pub const CAP_NIL: usize = 0;

/// Primeiro handle válido.
pub const CAPS_START: usize = 1;

/// Quantidade de handles no namespace.
pub const CAPS_SIZE: usize = i32::MAX as usize - CAPS_START;

/// Último handle válido.
pub const CAPS_LAST: usize = CAPS_START + CAPS_SIZE - 1;

/// Erros do capability space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapError {
    OutOfMemory,
    InvalidHandle,
    TypeMismatch,
}

/// Handle opaco de capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CapHandle(pub usize);

impl CapHandle {
    pub const NIL: CapHandle = CapHandle(CAP_NIL);

    pub const fn raw(self) -> usize {
        self.0
    }

    /// Dentro do intervalo de handles válidos?
    pub const fn in_range(self) -> bool {
        self.0 >= CAPS_START && self.0 <= CAPS_LAST
    }
}

/// Estado de uma capability viva.
///
/// Capability livre não existe no espaço (o handle volta à arena), então
/// "Published <=> kobject presente" vale por construção.
pub enum CapState {
    Allocated,
    Published(KObjRef),
}

/// Uma capability: um handle ligado (ou não) a um kernel object.
pub struct Cap {
    handle: CapHandle,
    state: CapState,
}

impl Cap {
    pub fn handle(&self) -> CapHandle {
        self.handle
    }

    pub fn state(&self) -> &CapState {
        &self.state
    }

    /// Kernel object publicado, se houver.
    pub fn kobject(&self) -> Option<&KObjRef> {
        match &self.state {
            CapState::Published(kobj) => Some(kobj),
            CapState::Allocated => None,
        }
    }
}

/// Ops da tabela handle -> capability.
struct CapTableOps;

impl TableOps<Cap> for CapTableOps {
    type Key = CapHandle;

    fn hash(item: &Cap) -> u64 {
        hash_mix(item.handle.0)
    }

    fn key_hash(key: &CapHandle) -> u64 {
        hash_mix(key.0)
    }

    fn key_equal(key: &CapHandle, item: &Cap) -> bool {
        *key == item.handle
    }
}

/// Estado do capability space de uma task (acessado sob o lock de
/// `CapInfo`).
pub struct CapSpace {
    /// Namespace dos handles.
    handles: RaArena,
    /// handle -> capability.
    table: HashTable<Cap, CapTableOps>,
    /// Handles publicados, por tipo de kernel object.
    type_lists: [Vec<CapHandle>; KOBJECT_TYPE_MAX],
}

impl CapSpace {
    fn with_span(start: usize, count: usize) -> Result<Self, CapError> {
        let mut handles = RaArena::new();
        handles.span_add(start, count);
        let table = HashTable::new(0, 0).map_err(|_| CapError::OutOfMemory)?;
        Ok(Self {
            handles,
            table,
            type_lists: [Vec::new(), Vec::new(), Vec::new()],
        })
    }

    /// Capability do handle, no estado que for.
    fn cap(&self, handle: CapHandle) -> Option<&Cap> {
        if !handle.in_range() {
            return None;
        }
        self.table.find(&handle)
    }

    fn cap_mut(&mut self, handle: CapHandle) -> Option<&mut Cap> {
        if !handle.in_range() {
            return None;
        }
        self.table.find_mut(&handle)
    }

    /// Reserva um handle e cria a capability Allocated.
    pub fn alloc(&mut self) -> Result<CapHandle, CapError> {
        let base = self.handles.alloc(1, 1).ok_or(CapError::OutOfMemory)?;
        let handle = CapHandle(base);
        self.table.insert(Cap {
            handle,
            state: CapState::Allocated,
        });
        Ok(handle)
    }

    /// Publica `kobj` no handle. A referência do chamador é consumida
    /// pela capability (refcount inalterado).
    ///
    /// Panic se o handle não estiver Allocated (violação de invariante do
    /// chamador).
    pub fn publish(&mut self, handle: CapHandle, kobj: KObjRef) {
        let typ = kobj.obj_type();
        let cap = match self.cap_mut(handle) {
            Some(cap) => cap,
            None => panic!("publish em handle inexistente"),
        };
        assert!(
            matches!(cap.state, CapState::Allocated),
            "publish em capability nao-Allocated"
        );
        cap.state = CapState::Published(kobj);
        self.type_lists[typ.index()].push(handle);
    }

    /// Despublica o handle se o tipo casar, devolvendo a referência ao
    /// chamador. Tipo errado ou estado errado: None, sem efeitos.
    pub fn unpublish(&mut self, handle: CapHandle, typ: KObjectType) -> Option<KObjRef> {
        let cap = self.cap_mut(handle)?;
        match &cap.state {
            CapState::Published(kobj) if kobj.obj_type() == typ => {}
            _ => return None,
        }
        // A referência da capability passa para o chamador.
        let kobj = match core::mem::replace(&mut cap.state, CapState::Allocated) {
            CapState::Published(kobj) => kobj,
            CapState::Allocated => unreachable!(),
        };
        let list = &mut self.type_lists[typ.index()];
        if let Some(pos) = list.iter().position(|h| *h == handle) {
            list.remove(pos);
        }
        Some(kobj)
    }

    /// Libera um handle Allocated de volta para a arena.
    ///
    /// Panic se o handle não estiver Allocated (double-free ou free de
    /// capability publicada são violações de invariante).
    pub fn free(&mut self, handle: CapHandle) {
        assert!(handle.in_range(), "free de handle fora do intervalo");
        match self.cap(handle) {
            Some(cap) => assert!(
                matches!(cap.state, CapState::Allocated),
                "free de capability nao-Allocated"
            ),
            None => panic!("free de handle inexistente"),
        }
        self.table.remove(&handle);
        self.handles.free(handle.0, 1);
    }

    /// Nova referência ao kernel object publicado no handle (incrementa o
    /// refcount). Tipo errado: None, sem efeitos.
    pub fn get(&self, handle: CapHandle, typ: KObjectType) -> Option<KObjRef> {
        match self.cap(handle)?.kobject() {
            Some(kobj) if kobj.obj_type() == typ => Some(kobj.clone()),
            _ => None,
        }
    }

    /// Invoca `f` nas capabilities publicadas do tipo dado. O callback
    /// recebe o próprio espaço (lock já em mãos) e pode remover a entrada
    /// corrente; a iteração trabalha sobre um snapshot e revalida cada
    /// handle antes de chamar.
    ///
    /// Retorna false se algum callback abortou a iteração.
    pub fn apply_to_type<F>(&mut self, typ: KObjectType, mut f: F) -> bool
    where
        F: FnMut(&mut CapSpace, CapHandle) -> bool,
    {
        let snapshot = self.type_lists[typ.index()].clone();
        for handle in snapshot {
            let still_published = matches!(
                self.cap(handle),
                Some(Cap {
                    state: CapState::Published(kobj),
                    ..
                }) if kobj.obj_type() == typ
            );
            if !still_published {
                continue;
            }
            if !f(self, handle) {
                return false;
            }
        }
        true
    }

    /// Quantidade de capabilities vivas (diagnóstico e testes).
    pub fn live_count(&self) -> usize {
        self.table.len()
    }

    /// Handles livres na arena (diagnóstico e testes).
    pub fn free_handles(&self) -> usize {
        self.handles.free_count()
    }
}

/// Capability info de uma task: o espaço sob seu mutex passivo.
pub struct CapInfo {
    space: Mutex<CapSpace>,
}

impl CapInfo {
    pub fn new() -> Result<Self, CapError> {
        Ok(Self {
            space: Mutex::new(CapSpace::with_span(CAPS_START, CAPS_SIZE)?),
        })
    }

    /// Espaço reduzido para os self-tests (exaustão de arena).
    #[cfg(feature = "self_test")]
    pub fn new_with_span(start: usize, count: usize) -> Result<Self, CapError> {
        Ok(Self {
            space: Mutex::new(CapSpace::with_span(start, count)?),
        })
    }

    /// Mutex de capabilities: FOLHA na ordem de locks. Nenhum outro mutex
    /// do kernel pode ser adquirido com este guard vivo.
    pub fn lock(&self) -> MutexGuard<'_, CapSpace> {
        self.space.lock()
    }
}

// -----------------------------------------------------------------------------
// API task-scoped (a forma consumida pelo resto do kernel)
// -----------------------------------------------------------------------------

/// Aloca uma capability na task.
pub fn cap_alloc(task: &Task) -> Result<CapHandle, CapError> {
    task.cap_info.lock().alloc()
}

/// Publica `kobj` no handle da task (consome a referência do chamador).
pub fn cap_publish(task: &Task, handle: CapHandle, kobj: KObjRef) {
    task.cap_info.lock().publish(handle, kobj);
}

/// Despublica, devolvendo a referência ao chamador.
pub fn cap_unpublish(task: &Task, handle: CapHandle, typ: KObjectType) -> Option<KObjRef> {
    task.cap_info.lock().unpublish(handle, typ)
}

/// Libera um handle Allocated.
pub fn cap_free(task: &Task, handle: CapHandle) {
    task.cap_info.lock().free(handle);
}

/// Nova referência ao objeto publicado (incrementa o refcount).
pub fn kobject_get(task: &Task, handle: CapHandle, typ: KObjectType) -> Option<KObjRef> {
    task.cap_info.lock().get(handle, typ)
}

/// Itera as capabilities publicadas do tipo dado.
pub fn caps_apply_to_type<F>(task: &Task, typ: KObjectType, f: F) -> bool
where
    F: FnMut(&mut CapSpace, CapHandle) -> bool,
{
    task.cap_info.lock().apply_to_type(typ, f)
}
