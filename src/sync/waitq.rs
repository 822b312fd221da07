//! Wait queue para bloqueio

use core::sync::atomic::{AtomicUsize, Ordering};

/// Resultado de `sleep_timeout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepError {
    /// O prazo expirou antes de qualquer wakeup.
    Timeout,
}

/// Iterações de spin por microssegundo (calibração grosseira; sem timer
/// acoplado a este core, o orçamento de timeout é medido em spins).
const SPINS_PER_US: u64 = 16;

/// Wait queue com semântica de wakeup perdido.
///
/// `wakeup_first` deposita um token mesmo sem ninguém dormindo; o próximo
/// `sleep` o consome e retorna imediatamente. `wakeup_all` avança uma
/// geração que libera todos os que estão dormindo agora. `reset` descarta
/// tokens depositados - usado quando o chamador precisa garantir que vai
/// realmente bloquear (udebug wait-for-GO).
pub struct WaitQ {
    tokens: AtomicUsize,
    generation: AtomicUsize,
}

impl WaitQ {
    pub const fn new() -> Self {
        Self {
            tokens: AtomicUsize::new(0),
            generation: AtomicUsize::new(0),
        }
    }

    /// Descarta wakeups pendentes (força o próximo sleep a bloquear).
    pub fn reset(&self) {
        self.tokens.store(0, Ordering::Release);
    }

    /// Dorme até um wakeup (token pendente conta como wakeup).
    pub fn sleep(&self) {
        let generation = self.generation.load(Ordering::Acquire);
        loop {
            if self.try_take_token() {
                return;
            }
            if self.generation.load(Ordering::Acquire) != generation {
                return;
            }
            core::hint::spin_loop();
        }
    }

    /// Dorme até um wakeup ou até `usec` microssegundos.
    pub fn sleep_timeout(&self, usec: u64) -> Result<(), SleepError> {
        let generation = self.generation.load(Ordering::Acquire);
        let budget = usec.saturating_mul(SPINS_PER_US);

        for _ in 0..budget {
            if self.try_take_token() {
                return Ok(());
            }
            if self.generation.load(Ordering::Acquire) != generation {
                return Ok(());
            }
            core::hint::spin_loop();
        }

        Err(SleepError::Timeout)
    }

    /// Acorda o primeiro dorminhoco (ou deposita um token).
    pub fn wakeup_first(&self) {
        self.tokens.fetch_add(1, Ordering::Release);
    }

    /// Acorda todos os que dormem neste momento.
    pub fn wakeup_all(&self) {
        self.generation.fetch_add(1, Ordering::Release);
    }

    fn try_take_token(&self) -> bool {
        self.tokens
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |t| t.checked_sub(1))
            .is_ok()
    }
}
