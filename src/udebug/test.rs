//! Testes do udebug
//!
//! Cobrem as transições que não estacionam a thread em go_wq (os
//! caminhos que dormem pressupõem um debugger vivo do outro lado).

use crate::{kassert, kassert_eq};
use crate::ipc::DebugCall;
use crate::klib::test_framework::{TestCase, TestResult};
use crate::task::{Task, Thread};
use crate::udebug::{
    stoppable_begin, stoppable_end, syscall_event, thread_attach, thread_e_event, udebug_begin,
    udebug_end, udebug_go, udebug_set_evmask, udebug_stop, EvMask, SessionState, UdebugError,
    UdebugEvent,
};
use alloc::sync::Arc;

pub const UDEBUG_TESTS: &[TestCase] = &[
    TestCase::new("udebug_begin_immediate", test_begin_immediate),
    TestCase::new("udebug_begin_deferred", test_begin_deferred),
    TestCase::new("udebug_stop_in_stoppable_section", test_stop_in_stoppable),
    TestCase::new("udebug_syscall_event_masked", test_syscall_event_masked),
    TestCase::new("udebug_thread_end_event", test_thread_end_event),
    TestCase::new("udebug_cleanup_finished", test_cleanup_finished),
    TestCase::new("udebug_invalid_states", test_invalid_states),
];

const DEBUGGER: u64 = 99;

fn new_task(id: u64) -> Option<Task> {
    Task::new(id).ok()
}

/// Sem threads fora de seção stoppable, o BEGIN responde na hora.
fn test_begin_immediate() -> TestResult {
    let task = match new_task(10) {
        Some(t) => t,
        None => return TestResult::Fail,
    };

    match udebug_begin(&task, DebugCall::new(), DEBUGGER, EvMask::all()) {
        Ok(answered) => kassert!(answered),
        Err(_) => return TestResult::Fail,
    }
    kassert_eq!(task.answerbox.len(), 1);
    kassert!(task.udebug.state.lock().dt_state == SessionState::Active);

    // Segundo BEGIN é recusado.
    match udebug_begin(&task, DebugCall::new(), DEBUGGER, EvMask::all()) {
        Err(UdebugError::Busy) => {}
        _ => return TestResult::Fail,
    }

    kassert!(udebug_end(&task).is_ok());
    kassert!(task.udebug.state.lock().dt_state == SessionState::Inactive);

    TestResult::Pass
}

/// Com uma thread fora de seção stoppable, o BEGIN fica pendente até o
/// próximo stoppable_begin dela.
fn test_begin_deferred() -> TestResult {
    let task = match new_task(11) {
        Some(t) => t,
        None => return TestResult::Fail,
    };
    let thread = Thread::new(1, true);
    thread_attach(&task, Arc::clone(&thread));

    match udebug_begin(&task, DebugCall::new(), DEBUGGER, EvMask::all()) {
        Ok(answered) => kassert!(!answered),
        Err(_) => return TestResult::Fail,
    }
    kassert!(task.udebug.state.lock().dt_state == SessionState::Beginning);
    kassert!(task.answerbox.is_empty());
    kassert!(thread.udebug.state.lock().active);

    // A última thread não-stoppable entra na seção: BEGIN respondido.
    stoppable_begin(&task, &thread);
    kassert_eq!(task.answerbox.len(), 1);
    kassert!(task.udebug.state.lock().dt_state == SessionState::Active);

    // GO autoriza; stoppable_end não bloqueia com go vigente.
    kassert!(udebug_go(&task, &thread, DebugCall::new()).is_ok());
    stoppable_end(&task, &thread);
    kassert!(!thread.udebug.state.lock().stoppable);
    kassert_eq!(task.udebug.state.lock().not_stoppable_count as u64, 1);

    kassert!(udebug_end(&task).is_ok());

    TestResult::Pass
}

/// STOP numa thread em seção stoppable responde o GO pendente com o
/// evento STOP; um GO novo retoma (metade observável do cenário
/// stop-durante-syscall-bloqueada).
fn test_stop_in_stoppable() -> TestResult {
    let task = match new_task(12) {
        Some(t) => t,
        None => return TestResult::Fail,
    };
    let thread = Thread::new(1, true);
    thread_attach(&task, Arc::clone(&thread));

    let _ = udebug_begin(&task, DebugCall::new(), DEBUGGER, EvMask::all());
    stoppable_begin(&task, &thread); // responde BEGIN, sessão ativa
    kassert!(udebug_go(&task, &thread, DebugCall::new()).is_ok());

    // Thread "bloqueada numa syscall" dentro da seção stoppable.
    kassert!(udebug_stop(&task, &thread).is_ok());

    {
        let th = thread.udebug.state.lock();
        kassert!(th.active);
        kassert!(!th.go);
        kassert!(th.go_call.is_none());
        kassert!(th.cur_event == Some(UdebugEvent::Stop));
    }

    // A resposta do GO carrega o evento STOP.
    let mut stop_seen = false;
    while let Some(answer) = task.answerbox.take() {
        if answer.data.args[0] == UdebugEvent::Stop as u64 {
            stop_seen = true;
        }
    }
    kassert!(stop_seen);

    // GO do debugger: a thread sai da seção stoppable sem estacionar.
    kassert!(udebug_go(&task, &thread, DebugCall::new()).is_ok());
    stoppable_end(&task, &thread);
    kassert!(!thread.udebug.state.lock().stoppable);

    kassert!(udebug_end(&task).is_ok());

    TestResult::Pass
}

/// Evento fora da assinatura não responde nem derruba o GO.
fn test_syscall_event_masked() -> TestResult {
    let task = match new_task(13) {
        Some(t) => t,
        None => return TestResult::Fail,
    };
    let thread = Thread::new(1, true);
    thread_attach(&task, Arc::clone(&thread));

    let _ = udebug_begin(&task, DebugCall::new(), DEBUGGER, EvMask::STOP);
    stoppable_begin(&task, &thread);
    let _ = udebug_go(&task, &thread, DebugCall::new());
    let answers_before = task.answerbox.len();

    syscall_event(&task, &thread, [1, 2, 3, 4, 5, 6], 42, 0, false);

    kassert_eq!(task.answerbox.len(), answers_before);
    {
        let th = thread.udebug.state.lock();
        kassert!(th.go);
        kassert!(th.go_call.is_some());
    }

    stoppable_end(&task, &thread);
    kassert!(udebug_end(&task).is_ok());

    TestResult::Pass
}

/// THREAD_END responde o GO e encerra a depuração da thread, sem dormir.
fn test_thread_end_event() -> TestResult {
    let task = match new_task(14) {
        Some(t) => t,
        None => return TestResult::Fail,
    };
    let thread = Thread::new(1, true);
    thread_attach(&task, Arc::clone(&thread));

    let _ = udebug_begin(&task, DebugCall::new(), DEBUGGER, EvMask::all());
    stoppable_begin(&task, &thread);
    let _ = udebug_go(&task, &thread, DebugCall::new());
    let answers_before = task.answerbox.len();

    thread_e_event(&task, &thread);

    kassert_eq!(task.answerbox.len(), answers_before + 1);
    {
        let th = thread.udebug.state.lock();
        kassert!(!th.active);
        kassert!(!th.go);
        kassert!(th.go_call.is_none());
    }

    kassert!(udebug_end(&task).is_ok());

    TestResult::Pass
}

/// Teardown: GO pendente vira FINISHED, nada some em silêncio.
fn test_cleanup_finished() -> TestResult {
    let task = match new_task(15) {
        Some(t) => t,
        None => return TestResult::Fail,
    };
    let thread = Thread::new(1, true);
    thread_attach(&task, Arc::clone(&thread));

    let _ = udebug_begin(&task, DebugCall::new(), DEBUGGER, EvMask::all());
    stoppable_begin(&task, &thread);
    kassert!(udebug_go(&task, &thread, DebugCall::new()).is_ok());

    // Sessão encerra com a thread sob GO (chamada pendente).
    kassert!(udebug_end(&task).is_ok());

    let mut finished_seen = false;
    while let Some(answer) = task.answerbox.take() {
        if answer.data.args[0] == UdebugEvent::Finished as u64 {
            finished_seen = true;
        }
    }
    kassert!(finished_seen);

    {
        let th = thread.udebug.state.lock();
        kassert!(!th.active);
        kassert!(!th.go);
        kassert!(th.go_call.is_none());
    }
    kassert!(task.udebug.state.lock().dt_state == SessionState::Inactive);

    // A thread segue em seção stoppable; sair dela agora não bloqueia.
    stoppable_end(&task, &thread);

    TestResult::Pass
}

/// Operações fora do estado correto devolvem erro distinto.
fn test_invalid_states() -> TestResult {
    let task = match new_task(16) {
        Some(t) => t,
        None => return TestResult::Fail,
    };
    let thread = Thread::new(1, true);
    thread_attach(&task, Arc::clone(&thread));

    // Sem sessão: cleanup, evmask, go e stop falham.
    match udebug_end(&task) {
        Err(UdebugError::InvalidState) => {}
        _ => return TestResult::Fail,
    }
    match udebug_set_evmask(&task, EvMask::all()) {
        Err(UdebugError::InvalidState) => {}
        _ => return TestResult::Fail,
    }
    match udebug_go(&task, &thread, DebugCall::new()) {
        Err(UdebugError::InvalidState) => {}
        _ => return TestResult::Fail,
    }
    match udebug_stop(&task, &thread) {
        Err(UdebugError::InvalidState) => {}
        _ => return TestResult::Fail,
    }

    TestResult::Pass
}
