// Arquivo: udebug/mod.rs
//
// Propósito: Estruturas do udebug - a interface que torna possíveis os
// debuggers de userspace. Uma task debugada tem uma sessão (Inactive ->
// Beginning -> Active) e cada thread sua máquina de stop/go: eventos são
// reportados respondendo a chamada GO pendente e a thread dorme em
// `go_wq` até o próximo GO.
//
// Detalhes de Implementação:
// - Ordem de locks: mutex de udebug da TASK antes do mutex da THREAD.
// - `go_wq`/`active_cv` ficam fora do mutex da thread (a thread dorme
//   sem lock em mãos).

//! Udebug - controle de depuração de userspace

pub mod hooks;
pub mod ops;

#[cfg(feature = "self_test")]
pub mod test;

pub use hooks::{
    before_thread_runs, stoppable_begin, stoppable_end, syscall_event, task_cleanup,
    thread_b_event_attach, thread_e_event, thread_fault,
};
pub use ops::{udebug_begin, udebug_end, udebug_go, udebug_set_evmask, udebug_stop};

use crate::ipc::DebugCall;
use crate::mm::VirtAddr;
use crate::sync::{CondVar, Mutex, WaitQ};
use crate::task::{Task, TaskId, Thread};
use alloc::boxed::Box;
use alloc::sync::Arc;
use bitflags::bitflags;

/// Erros do udebug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UdebugError {
    /// Operação não cabe no estado atual da sessão/thread.
    InvalidState,
    /// Já existe sessão (BEGIN) ou GO pendente.
    Busy,
}

/// Eventos de depuração.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum UdebugEvent {
    /// Sessão encerrada; supersede qualquer evento pendente.
    Finished = 1,
    Stop = 2,
    SyscallBegin = 3,
    SyscallEnd = 4,
    ThreadBegin = 5,
    ThreadEnd = 6,
}

impl UdebugEvent {
    /// Bit correspondente na máscara de assinatura.
    pub const fn mask(self) -> EvMask {
        EvMask::from_bits_truncate(1 << (self as u32 - 1))
    }
}

bitflags! {
    /// Assinatura de eventos (definida no BEGIN).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EvMask: u32 {
        const FINISHED      = 1 << 0;
        const STOP          = 1 << 1;
        const SYSCALL_BEGIN = 1 << 2;
        const SYSCALL_END   = 1 << 3;
        const THREAD_BEGIN  = 1 << 4;
        const THREAD_END    = 1 << 5;
    }
}

/// Estado da sessão de depuração de uma task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Inactive,
    /// BEGIN recebido; esperando todas as threads ficarem stoppable.
    Beginning,
    Active,
}

/// Estado de udebug da task (sob o mutex).
pub struct UdebugTaskState {
    pub dt_state: SessionState,
    /// Chamada BEGIN pendente (respondida quando a sessão ativa).
    pub begin_call: Option<Box<DebugCall>>,
    /// Threads fora de seção stoppable.
    pub not_stoppable_count: i64,
    /// Eventos assinados pelo debugger.
    pub evmask: EvMask,
    /// Task do debugger.
    pub debugger: Option<TaskId>,
}

/// Parte de udebug da estrutura da task.
pub struct UdebugTask {
    pub state: Mutex<UdebugTaskState>,
}

impl UdebugTask {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(UdebugTaskState {
                dt_state: SessionState::Inactive,
                begin_call: None,
                not_stoppable_count: 0,
                evmask: EvMask::empty(),
                debugger: None,
            }),
        }
    }
}

/// Estado de udebug da thread (sob o mutex).
pub struct UdebugThreadState {
    /// Chamada GO pendente (respondida no próximo evento).
    pub go_call: Option<Box<DebugCall>>,
    /// Thread autorizada a executar (GO vigente).
    pub go: bool,
    /// Thread dentro de seção stoppable (não executa userspace).
    pub stoppable: bool,
    /// Thread sob sessão de depuração.
    pub active: bool,
    /// Evento corrente reportado.
    pub cur_event: Option<UdebugEvent>,
    /// Argumentos da syscall interceptada.
    pub syscall_args: [u64; 6],
    /// Ponteiro (cacheado) para os registradores de userspace.
    pub uspace_state: Option<VirtAddr>,
}

/// Parte de udebug da estrutura da thread.
pub struct UdebugThread {
    pub state: Mutex<UdebugThreadState>,
    /// A thread dorme aqui quando parada (go == false).
    pub go_wq: WaitQ,
    /// Sinalizada quando um debugger anexa/desanexa.
    pub active_cv: CondVar,
}

impl UdebugThread {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(UdebugThreadState {
                go_call: None,
                go: false,
                // Threads nascem fora de seção stoppable; o primeiro
                // stoppable_begin assume stoppable == false.
                stoppable: false,
                active: false,
                cur_event: None,
                syscall_args: [0; 6],
                uspace_state: None,
            }),
            go_wq: WaitQ::new(),
            active_cv: CondVar::new(),
        }
    }
}

/// Anexa a thread à task, com a contabilidade de udebug (threads de
/// userspace entram fora de seção stoppable).
pub fn thread_attach(task: &Task, thread: Arc<Thread>) {
    let mut t = task.udebug.state.lock();
    attach_locked(&mut t, task, thread);
}

pub(crate) fn attach_locked(
    t: &mut UdebugTaskState,
    task: &Task,
    thread: Arc<Thread>,
) {
    if thread.uspace {
        t.not_stoppable_count += 1;
    }
    task.link_thread(thread);
}
