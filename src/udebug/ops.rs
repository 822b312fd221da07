// Arquivo: udebug/ops.rs
//
// Propósito: Operações do lado do DEBUGGER: abrir/fechar sessão,
// assinar eventos, autorizar (GO) e parar (STOP) threads do debugado.

//! Operações do lado do debugger

use super::{EvMask, SessionState, UdebugError, UdebugEvent};
use crate::ipc::{DebugCall, EOK};
use crate::task::{Task, TaskId, Thread};
use alloc::boxed::Box;

/// Abre uma sessão de depuração na task.
///
/// A chamada BEGIN fica pendente até todas as threads estarem em seção
/// stoppable; se já estiverem, a sessão ativa e a resposta sai na hora.
/// Retorna `true` se o BEGIN foi respondido imediatamente.
pub fn udebug_begin(
    task: &Task,
    call: Box<DebugCall>,
    debugger: TaskId,
    evmask: EvMask,
) -> Result<bool, UdebugError> {
    let mut t = task.udebug.state.lock();

    if t.dt_state != SessionState::Inactive {
        return Err(UdebugError::Busy);
    }

    crate::kdebug!("(udebug) begin na task", task.id);

    t.debugger = Some(debugger);
    t.evmask = evmask;
    t.begin_call = Some(call);

    let answered = if t.not_stoppable_count == 0 {
        // Nenhuma thread fora de seção stoppable: ativa já.
        t.dt_state = SessionState::Active;
        let mut call = t.begin_call.take().expect("BEGIN recem-guardado sumiu");
        call.set_retval(EOK);
        task.answerbox.answer(call);
        true
    } else {
        t.dt_state = SessionState::Beginning;
        false
    };

    // Marca as threads de userspace como ativas na sessão (go == false:
    // param no próximo ponto stoppable até receberem GO).
    for thread in task.threads() {
        let mut th = thread.udebug.state.lock();
        if thread.uspace {
            th.active = true;
            drop(th);
            thread.udebug.active_cv.notify_all();
        }
    }

    Ok(answered)
}

/// Redefine a assinatura de eventos de uma sessão aberta.
pub fn udebug_set_evmask(task: &Task, evmask: EvMask) -> Result<(), UdebugError> {
    let mut t = task.udebug.state.lock();

    match t.dt_state {
        SessionState::Beginning | SessionState::Active => {
            t.evmask = evmask;
            Ok(())
        }
        SessionState::Inactive => Err(UdebugError::InvalidState),
    }
}

/// Autoriza a thread a executar. A chamada GO fica pendente e será
/// respondida com o próximo evento.
pub fn udebug_go(task: &Task, thread: &Thread, call: Box<DebugCall>) -> Result<(), UdebugError> {
    let t = task.udebug.state.lock();

    if t.dt_state != SessionState::Active {
        return Err(UdebugError::InvalidState);
    }

    let mut th = thread.udebug.state.lock();

    if !th.active {
        return Err(UdebugError::InvalidState);
    }
    if th.go {
        return Err(UdebugError::Busy);
    }

    th.go_call = Some(call);
    th.go = true;
    th.cur_event = None;

    // O mutex da thread não pode estar em mãos durante o wakeup.
    drop(th);
    drop(t);

    thread.udebug.go_wq.wakeup_first();

    Ok(())
}

/// Para a thread: derruba o GO. Se a thread está em seção stoppable, a
/// chamada GO pendente é respondida com STOP agora; caso contrário o
/// próximo stoppable_begin responde.
pub fn udebug_stop(task: &Task, thread: &Thread) -> Result<(), UdebugError> {
    let t = task.udebug.state.lock();

    if t.dt_state != SessionState::Active {
        return Err(UdebugError::InvalidState);
    }

    let mut th = thread.udebug.state.lock();

    if !th.active || !th.go {
        return Err(UdebugError::InvalidState);
    }

    th.go = false;

    if th.stoppable {
        if let Some(mut call) = th.go_call.take() {
            call.set_retval(EOK);
            call.set_arg(1, UdebugEvent::Stop as u64);
            th.cur_event = Some(UdebugEvent::Stop);
            task.answerbox.answer(call);
        }
    }

    drop(th);
    drop(t);

    Ok(())
}

/// Fecha a sessão de depuração (teardown gracioso com FINISHED).
pub fn udebug_end(task: &Task) -> Result<(), UdebugError> {
    super::hooks::task_cleanup(task)
}
