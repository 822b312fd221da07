//! Testes do capability space

use crate::{kassert, kassert_eq};
use crate::caps::{
    cap_alloc, cap_free, cap_publish, cap_unpublish, caps_apply_to_type, kobject_get, CapError,
    CapHandle, KObjRef, KObjectType, KRaw,
};
use crate::klib::test_framework::{TestCase, TestResult};
use crate::task::Task;
use alloc::boxed::Box;
use core::sync::atomic::{AtomicUsize, Ordering};

pub const CAPS_TESTS: &[TestCase] = &[
    TestCase::new("caps_publish_unpublish_lifecycle", test_publish_unpublish),
    TestCase::new("caps_type_mismatch", test_type_mismatch),
    TestCase::new("caps_out_of_handles", test_out_of_handles),
    TestCase::new("caps_alloc_free_roundtrip", test_alloc_free_roundtrip),
    TestCase::new("caps_out_of_range_handle", test_out_of_range_handle),
    TestCase::new("caps_apply_to_type", test_apply_to_type),
];

/// Recurso de teste que conta destruições.
struct Probe;

static DESTROYED: AtomicUsize = AtomicUsize::new(0);

impl KRaw for Probe {
    fn destroy(&mut self) {
        DESTROYED.fetch_add(1, Ordering::Relaxed);
    }
}

fn new_task(id: u64) -> Option<Task> {
    Task::new(id).ok()
}

/// Ciclo completo: alloc -> publish -> get -> unpublish -> free, com o
/// refcount seguindo o contrato (publish consome, unpublish devolve).
fn test_publish_unpublish() -> TestResult {
    DESTROYED.store(0, Ordering::Relaxed);

    let task = match new_task(1) {
        Some(t) => t,
        None => return TestResult::Fail,
    };
    let free_before = task.cap_info.lock().free_handles();

    let handle = match cap_alloc(&task) {
        Ok(h) => h,
        Err(_) => return TestResult::Fail,
    };

    let kobj = KObjRef::initialize(KObjectType::Phone, Box::new(Probe));
    kassert_eq!(kobj.refcount(), 1);

    // Publicar consome a referência do chamador: refcount inalterado.
    cap_publish(&task, handle, kobj);

    let got = match kobject_get(&task, handle, KObjectType::Phone) {
        Some(k) => k,
        None => return TestResult::Fail,
    };
    kassert_eq!(got.refcount(), 2);
    drop(got); // put

    let back = match cap_unpublish(&task, handle, KObjectType::Phone) {
        Some(k) => k,
        None => return TestResult::Fail,
    };
    kassert_eq!(back.refcount(), 1);
    kassert_eq!(DESTROYED.load(Ordering::Relaxed), 0);

    // Capability Allocated não entrega mais objeto.
    kassert!(kobject_get(&task, handle, KObjectType::Phone).is_none());

    drop(back); // última referência: destroy roda exatamente uma vez
    kassert_eq!(DESTROYED.load(Ordering::Relaxed), 1);

    cap_free(&task, handle);

    // Estado final: espaço vazio, handle de volta na arena.
    let space = task.cap_info.lock();
    kassert_eq!(space.live_count(), 0);
    kassert_eq!(space.free_handles(), free_before);

    TestResult::Pass
}

/// Tipo errado em get/unpublish: None, sem mexer no refcount.
fn test_type_mismatch() -> TestResult {
    DESTROYED.store(0, Ordering::Relaxed);

    let task = match new_task(2) {
        Some(t) => t,
        None => return TestResult::Fail,
    };

    let handle = match cap_alloc(&task) {
        Ok(h) => h,
        Err(_) => return TestResult::Fail,
    };

    let kobj = KObjRef::initialize(KObjectType::Call, Box::new(Probe));
    cap_publish(&task, handle, kobj);

    kassert!(kobject_get(&task, handle, KObjectType::Phone).is_none());
    kassert!(cap_unpublish(&task, handle, KObjectType::Phone).is_none());

    // Continua publicada com uma única referência.
    let got = match kobject_get(&task, handle, KObjectType::Call) {
        Some(k) => k,
        None => return TestResult::Fail,
    };
    kassert_eq!(got.refcount(), 2);
    drop(got);

    let back = match cap_unpublish(&task, handle, KObjectType::Call) {
        Some(k) => k,
        None => return TestResult::Fail,
    };
    drop(back);
    kassert_eq!(DESTROYED.load(Ordering::Relaxed), 1);
    cap_free(&task, handle);

    TestResult::Pass
}

/// Arena exaurida: alloc devolve OutOfMemory.
fn test_out_of_handles() -> TestResult {
    let cap_info = match crate::caps::CapInfo::new_with_span(1, 2) {
        Ok(c) => c,
        Err(_) => return TestResult::Fail,
    };

    let mut space = cap_info.lock();
    kassert!(space.alloc().is_ok());
    kassert!(space.alloc().is_ok());
    match space.alloc() {
        Err(CapError::OutOfMemory) => {}
        _ => return TestResult::Fail,
    }

    TestResult::Pass
}

/// alloc seguido de free deixa arena e tabela observavelmente iguais.
fn test_alloc_free_roundtrip() -> TestResult {
    let task = match new_task(3) {
        Some(t) => t,
        None => return TestResult::Fail,
    };

    let (free_before, live_before) = {
        let space = task.cap_info.lock();
        (space.free_handles(), space.live_count())
    };

    let handle = match cap_alloc(&task) {
        Ok(h) => h,
        Err(_) => return TestResult::Fail,
    };
    cap_free(&task, handle);

    let space = task.cap_info.lock();
    kassert_eq!(space.free_handles(), free_before);
    kassert_eq!(space.live_count(), live_before);

    TestResult::Pass
}

/// Handle fora do intervalo falha sempre, sem efeitos.
fn test_out_of_range_handle() -> TestResult {
    let task = match new_task(4) {
        Some(t) => t,
        None => return TestResult::Fail,
    };

    kassert!(kobject_get(&task, CapHandle::NIL, KObjectType::Phone).is_none());
    kassert!(cap_unpublish(&task, CapHandle(usize::MAX), KObjectType::Phone).is_none());

    TestResult::Pass
}

/// Iteração por tipo: aborta no primeiro false e tolera remoção da
/// entrada corrente pelo callback.
fn test_apply_to_type() -> TestResult {
    let task = match new_task(5) {
        Some(t) => t,
        None => return TestResult::Fail,
    };

    let mut handles = [CapHandle::NIL; 4];
    for slot in handles.iter_mut() {
        let handle = match cap_alloc(&task) {
            Ok(h) => h,
            Err(_) => return TestResult::Fail,
        };
        cap_publish(
            &task,
            handle,
            KObjRef::initialize(KObjectType::Irq, Box::new(Probe)),
        );
        *slot = handle;
    }

    // Conta todas as publicadas do tipo.
    let mut seen = 0usize;
    kassert!(caps_apply_to_type(&task, KObjectType::Irq, |_, _| {
        seen += 1;
        true
    }));
    kassert_eq!(seen, 4);

    // Tipo sem capabilities: zero chamadas.
    let mut other = 0usize;
    kassert!(caps_apply_to_type(&task, KObjectType::Phone, |_, _| {
        other += 1;
        true
    }));
    kassert_eq!(other, 0);

    // Aborta no primeiro false.
    let mut early = 0usize;
    kassert!(!caps_apply_to_type(&task, KObjectType::Irq, |_, _| {
        early += 1;
        false
    }));
    kassert_eq!(early, 1);

    // O callback pode despublicar (e liberar) a entrada corrente.
    kassert!(caps_apply_to_type(&task, KObjectType::Irq, |space, handle| {
        if let Some(kobj) = space.unpublish(handle, KObjectType::Irq) {
            drop(kobj);
            space.free(handle);
        }
        true
    }));
    kassert_eq!(task.cap_info.lock().live_count(), 0);

    TestResult::Pass
}
