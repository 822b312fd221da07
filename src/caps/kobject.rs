// Arquivo: caps/kobject.rs
//
// Propósito: Kernel objects - wrappers com contagem de referência em
// volta dos recursos crus que podem ser expostos a userspace via
// capabilities (chamadas IPC, phones, registros de IRQ).
//
// Detalhes de Implementação:
// - `KObjRef` é a referência dona: clone incrementa, drop decrementa e,
//   na última referência, roda o hook destroy() exatamente uma vez e
//   libera o wrapper.
// - O contador vive dentro do próprio wrapper (AtomicUsize): release no
//   decremento, fence acquire em quem zera. Quem destrói enxerga todas
//   as escritas feitas sob as referências que morreram antes.
// - A sincronização do conteúdo do recurso é responsabilidade do tipo
//   (não há lock por objeto).

//! Kernel objects com refcount

use alloc::boxed::Box;
use core::ptr::NonNull;
use core::sync::atomic::{fence, AtomicUsize, Ordering};

/// Tipos de recurso encapsuláveis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KObjectType {
    /// Chamada IPC
    Call = 0,
    /// Phone IPC
    Phone = 1,
    /// Registro de IRQ
    Irq = 2,
}

/// Número de tipos (dimensiona as listas por tipo do capability space).
pub const KOBJECT_TYPE_MAX: usize = 3;

impl KObjectType {
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Comportamento por tipo do recurso cru.
pub trait KRaw: Send + Sync {
    /// Hook de destruição: roda exatamente uma vez, quando a última
    /// referência cai.
    fn destroy(&mut self) {}
}

struct KObject {
    typ: KObjectType,
    /// Referências vivas: capabilities publicadas + referências
    /// explícitas. O objeto morre quando zera.
    refs: AtomicUsize,
    raw: Box<dyn KRaw>,
}

/// Referência dona a um kernel object.
///
/// Uma capability Published guarda exatamente uma destas; `kobject_get`
/// clona (incrementa); largar a referência é o `put`.
pub struct KObjRef {
    ptr: NonNull<KObject>,
}

// SAFETY: o conteúdo é Send + Sync (exigido por KRaw) e o refcount é
// atômico.
unsafe impl Send for KObjRef {}
unsafe impl Sync for KObjRef {}

impl KObjRef {
    /// Cria o kernel object com refcount = 1.
    pub fn initialize(typ: KObjectType, raw: Box<dyn KRaw>) -> Self {
        let obj = Box::new(KObject {
            typ,
            refs: AtomicUsize::new(1),
            raw,
        });
        Self {
            ptr: NonNull::from(Box::leak(obj)),
        }
    }

    #[inline]
    fn inner(&self) -> &KObject {
        // SAFETY: enquanto este KObjRef existe, refcount >= 1 e o wrapper
        // está vivo.
        unsafe { self.ptr.as_ref() }
    }

    pub fn obj_type(&self) -> KObjectType {
        self.inner().typ
    }

    /// Recurso cru. Mutação interna é assunto do tipo.
    pub fn raw(&self) -> &dyn KRaw {
        &*self.inner().raw
    }

    /// Valor atual do refcount (diagnóstico e testes).
    pub fn refcount(&self) -> usize {
        self.inner().refs.load(Ordering::Relaxed)
    }

    /// Registra uma referência extra sem materializar o clone.
    ///
    /// Relaxed basta: quem chama já segura uma referência viva, então não
    /// há corrida com a destruição.
    pub fn add_ref(&self) {
        self.inner().refs.fetch_add(1, Ordering::Relaxed);
    }

    /// Dois refs apontam para o mesmo objeto?
    pub fn same_object(&self, other: &KObjRef) -> bool {
        self.ptr == other.ptr
    }
}

impl Clone for KObjRef {
    fn clone(&self) -> Self {
        self.add_ref();
        Self { ptr: self.ptr }
    }
}

impl Drop for KObjRef {
    fn drop(&mut self) {
        // Release pareado com o fence: as escritas feitas sob esta
        // referência ficam visíveis para quem for destruir o objeto.
        if self.inner().refs.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        fence(Ordering::Acquire);

        // Última referência: hook de destruição e liberação do wrapper.
        // A corrida entre puts concorrentes é resolvida pelo decremento
        // atômico, então isto roda uma única vez.
        unsafe {
            let mut obj = Box::from_raw(self.ptr.as_ptr());
            obj.raw.destroy();
        }
    }
}
