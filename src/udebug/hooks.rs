// Arquivo: udebug/hooks.rs
//
// Propósito: Hooks chamados pela (ou em nome da) thread debugada:
// seções stoppable, eventos de syscall/thread, teardown da sessão e
// espera de fault.
//
// Uma seção stoppable é um trecho em que a thread garante não executar
// instruções de userspace até ser retomada. Isso é melhor do que pontos
// de parada: a thread pode ser parada mesmo bloqueada indefinidamente
// numa syscall. É a base do acesso à memória do debugado sem corridas.

//! Hooks do lado do debugado

use super::{SessionState, UdebugError, UdebugEvent};
use crate::ipc::EOK;
use crate::sync::WaitQ;
use crate::task::{Task, Thread};
use alloc::sync::Arc;

/// Bloqueia até chegar uma mensagem GO.
///
/// Wakeups antigos são descartados antes de dormir (o bloqueio aqui é
/// obrigatório por definição: thread parada não sai da seção stoppable).
fn wait_for_go(wq: &WaitQ) {
    wq.reset();
    wq.sleep();
}

/// Início de seção stoppable.
pub fn stoppable_begin(task: &Task, thread: &Thread) {
    let mut t = task.udebug.state.lock();

    t.not_stoppable_count -= 1;
    let nsc = t.not_stoppable_count;

    // Ordem de locks ok: o mutex da thread vem depois do da task.
    let mut th = thread.udebug.state.lock();
    debug_assert!(!th.stoppable);
    th.stoppable = true;

    if t.dt_state == SessionState::Beginning && nsc == 0 {
        // Esta era a última thread não-stoppable: responder o BEGIN.
        let mut call = t
            .begin_call
            .take()
            .expect("sessao Beginning sem chamada BEGIN");
        t.dt_state = SessionState::Active;
        call.set_retval(EOK);
        task.answerbox.answer(call);
    } else if t.dt_state == SessionState::Active && th.active && !th.go {
        // STOP pendente: responder a chamada GO com o evento.
        if let Some(mut call) = th.go_call.take() {
            call.set_retval(EOK);
            call.set_arg(1, UdebugEvent::Stop as u64);
            th.cur_event = Some(UdebugEvent::Stop);
            task.answerbox.answer(call);
        }
    }
}

/// Fim de seção stoppable. É aqui que uma thread parada bloqueia (por
/// definição, thread parada não deixa a seção stoppable).
pub fn stoppable_end(task: &Task, thread: &Thread) {
    loop {
        let mut t = task.udebug.state.lock();
        let mut th = thread.udebug.state.lock();

        if th.active && !th.go {
            drop(th);
            drop(t);

            wait_for_go(&thread.udebug.go_wq);

            // Tentar de novo: perder a stoppability exige segurar ambos
            // os locks e observar go == true.
            continue;
        }

        t.not_stoppable_count += 1;
        debug_assert!(th.stoppable);
        th.stoppable = false;
        return;
    }
}

/// Chamado pelo scheduler antes de qualquer thread do debugado rodar:
/// torna a fronteira ready-to-run um ponto de parada.
pub fn before_thread_runs(task: &Task, thread: &Thread) {
    stoppable_begin(task, thread);
    stoppable_end(task, thread);
}

/// Hook de syscall (antes e depois do serviço). Gera SYSCALL_BEGIN ou
/// SYSCALL_END conforme `end_variant`.
pub fn syscall_event(
    task: &Task,
    thread: &Thread,
    args: [u64; 6],
    id: u64,
    rc: u64,
    end_variant: bool,
) {
    let etype = if end_variant {
        UdebugEvent::SyscallEnd
    } else {
        UdebugEvent::SyscallBegin
    };

    {
        let t = task.udebug.state.lock();
        let mut th = thread.udebug.state.lock();

        // Só gera eventos em sessão ativa, com GO vigente e assinatura.
        if !th.active || !th.go || !t.evmask.contains(etype.mask()) {
            return;
        }

        let mut call = th.go_call.take().expect("thread em GO sem chamada GO");
        call.set_retval(EOK);
        call.set_arg(1, etype as u64);
        call.set_arg(2, id);
        call.set_arg(3, rc);

        th.syscall_args = args;

        // go volta a false antes de dormir: se formos acordados por um
        // DEBUG_END, é o valor inicial esperado.
        th.go = false;
        th.cur_event = Some(etype);

        task.answerbox.answer(call);
    }

    wait_for_go(&thread.udebug.go_wq);
}

/// Hook de criação de thread, combinado com o attach.
///
/// O attach e a checagem de sessão acontecem sob os mesmos locks para não
/// haver janela entre anexar a thread e decidir o THREAD_BEGIN: sem isso,
/// um BEGIN/THREAD_READ concorrente poderia perder threads ou vê-las em
/// duplicidade.
pub fn thread_b_event_attach(task: &Task, cur_thread: &Thread, new_thread: Arc<Thread>) {
    let should_wait;
    {
        let mut t = task.udebug.state.lock();
        let mut th = cur_thread.udebug.state.lock();

        let new_id = new_thread.id;
        super::attach_locked(&mut t, task, new_thread);

        crate::ktrace!("(udebug) thread_b: checando sessao");

        if !th.active {
            return;
        }

        let mut call = th.go_call.take().expect("thread em GO sem chamada GO");
        call.set_retval(EOK);
        call.set_arg(1, UdebugEvent::ThreadBegin as u64);
        call.set_arg(2, new_id);

        th.go = false;
        th.cur_event = Some(UdebugEvent::ThreadBegin);

        task.answerbox.answer(call);
        should_wait = true;
    }

    if should_wait {
        crate::ktrace!("(udebug) thread_b: esperando GO");
        wait_for_go(&cur_thread.udebug.go_wq);
    }
}

/// Hook de término de thread. Gera THREAD_END e encerra a atividade de
/// depuração na thread (este evento não dorme).
pub fn thread_e_event(task: &Task, thread: &Thread) {
    let t = task.udebug.state.lock();
    let mut th = thread.udebug.state.lock();

    if !th.active {
        return;
    }

    let mut call = th.go_call.take().expect("thread em GO sem chamada GO");
    call.set_retval(EOK);
    call.set_arg(1, UdebugEvent::ThreadEnd as u64);

    th.active = false;
    th.cur_event = None;
    th.go = false;

    task.answerbox.answer(call);
    drop(th);
    drop(t);
}

/// Encerra a sessão de depuração da task.
///
/// Toda chamada GO pendente é respondida com FINISHED (eventos nunca
/// somem em silêncio); threads parcadas em `go_wq` são acordadas e
/// `active_cv` é difundida para threads esperando em `thread_fault`.
pub fn task_cleanup(task: &Task) -> Result<(), UdebugError> {
    let mut t = task.udebug.state.lock();

    if t.dt_state != SessionState::Beginning && t.dt_state != SessionState::Active {
        return Err(UdebugError::InvalidState);
    }

    crate::kdebug!("(udebug) cleanup da task", task.id);

    for thread in task.threads() {
        let mut th = thread.udebug.state.lock();

        if !thread.uspace {
            continue;
        }

        th.active = false;
        th.cur_event = None;

        let was_parked = !th.go;
        th.go = false;

        if let Some(mut call) = th.go_call.take() {
            call.set_retval(EOK);
            call.set_arg(1, UdebugEvent::Finished as u64);
            task.answerbox.answer(call);
        }

        // O mutex da thread não pode estar em mãos durante o wakeup.
        drop(th);
        if was_parked {
            thread.udebug.go_wq.wakeup_first();
        }
        thread.udebug.active_cv.notify_all();
    }

    t.dt_state = SessionState::Inactive;
    t.debugger = None;

    Ok(())
}

/// Espera o debugger atender a um fault desta thread.
///
/// Entra em seção stoppable, espera uma sessão anexar (`active` subir) e
/// depois terminar (`active` cair), e então devolve o controle para a
/// limpeza do fault handler.
pub fn thread_fault(task: &Task, thread: &Thread) {
    stoppable_begin(task, thread);

    // Espera um debugger nos atender.
    let mut th = thread.udebug.state.lock();
    while !th.active {
        th = thread.udebug.active_cv.wait(th);
    }
    drop(th);

    // Espera a sessão de depuração terminar antes de prosseguir.
    let mut th = thread.udebug.state.lock();
    while th.active {
        th = thread.udebug.active_cv.wait(th);
    }
    drop(th);

    stoppable_end(task, thread);
}
