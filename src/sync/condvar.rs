//! Condition Variable

use crate::sync::mutex::MutexGuard;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Condition Variable.
///
/// Threads esperam por uma condição protegida por um `Mutex`. `wait`
/// consome o guard (unlock), dorme até uma notificação e readquire o lock
/// antes de retornar. Como toda condvar, wakeups espúrios são possíveis:
/// sempre use dentro de `while !condicao { guard = cv.wait(guard); }`.
pub struct CondVar {
    /// Contador de notificações. `wait` dorme enquanto ele não mudar.
    seq: AtomicUsize,
}

impl CondVar {
    pub const fn new() -> Self {
        Self {
            seq: AtomicUsize::new(0),
        }
    }

    /// Libera o lock, dorme até ser notificada, readquire o lock.
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        let seq = self.seq.load(Ordering::Acquire);
        let mutex = guard.mutex();
        drop(guard);

        while self.seq.load(Ordering::Acquire) == seq {
            core::hint::spin_loop();
        }

        mutex.lock()
    }

    /// Acorda uma thread esperando.
    pub fn notify_one(&self) {
        self.seq.fetch_add(1, Ordering::Release);
    }

    /// Acorda todas as threads esperando.
    pub fn notify_all(&self) {
        self.seq.fetch_add(1, Ordering::Release);
    }
}
