//! # Task / Thread
//!
//! Portadores mínimos dos estados que este core gerencia: o capability
//! space e o estado de udebug. Criação/destruição de tasks, scheduling e
//! o restante do ciclo de vida são colaboradores externos.

use crate::caps::{CapError, CapInfo};
use crate::ipc::Answerbox;
use crate::sync::SpinMutex;
use crate::udebug::{UdebugTask, UdebugThread};
use alloc::sync::Arc;
use alloc::vec::Vec;

pub type TaskId = u64;
pub type ThreadId = u64;

/// Uma task: dona de um capability space e de uma sessão de udebug.
pub struct Task {
    pub id: TaskId,
    /// Fila de respostas (o debugger desta task coleta aqui).
    pub answerbox: Answerbox,
    pub cap_info: CapInfo,
    pub udebug: UdebugTask,
    threads: SpinMutex<Vec<Arc<Thread>>>,
}

impl Task {
    pub fn new(id: TaskId) -> Result<Self, CapError> {
        Ok(Self {
            id,
            answerbox: Answerbox::new(),
            cap_info: CapInfo::new()?,
            udebug: UdebugTask::new(),
            threads: SpinMutex::new(Vec::new()),
        })
    }

    /// Anexa uma thread à lista da task. A contabilidade de udebug fica
    /// com `udebug::thread_attach`, que chama isto.
    pub(crate) fn link_thread(&self, thread: Arc<Thread>) {
        self.threads.lock().push(thread);
    }

    /// Snapshot da lista de threads (interface de iteração read-only,
    /// requerida pelo teardown do udebug).
    pub fn threads(&self) -> Vec<Arc<Thread>> {
        self.threads.lock().clone()
    }

    pub fn thread_count(&self) -> usize {
        self.threads.lock().len()
    }
}

/// Uma thread: portadora do estado de udebug por thread.
pub struct Thread {
    pub id: ThreadId,
    /// Thread executa código de userspace? (threads puras de kernel não
    /// participam de udebug)
    pub uspace: bool,
    pub udebug: UdebugThread,
}

impl Thread {
    pub fn new(id: ThreadId, uspace: bool) -> Arc<Self> {
        Arc::new(Self {
            id,
            uspace,
            udebug: UdebugThread::new(),
        })
    }
}
