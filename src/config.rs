// Arquivo: config.rs
//
// Propósito: Registro de configuração do sistema (singleton de boot).
// Contagem de CPUs, região do identity map e região kernel não-identity
// (tabelas globais compartilhadas do km).
//
// Detalhes de Implementação:
// - Escrito UMA vez durante o boot via `init` (spin::Once), lido depois.
// - Imutável após a publicação: leitores não precisam de lock.

//! Configuração global de boot

use spin::Once;

/// Registro de configuração publicado no boot.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Total de CPUs detectadas (BSP incluso).
    pub cpu_count: usize,
    /// Base do identity map do kernel.
    pub identity_base: u64,
    /// Tamanho do identity map.
    pub identity_size: u64,
    /// Base da região kernel não-identity (mapeamentos km globais).
    pub km_base: u64,
    /// Tamanho da região km.
    pub km_size: u64,
}

static CONFIG: Once<Config> = Once::new();

/// Publica a configuração. Chamadas subsequentes são ignoradas
/// (vale a primeira).
pub fn init(cfg: Config) -> &'static Config {
    CONFIG.call_once(|| cfg)
}

/// Configuração publicada. Panic se chamada antes de `init`.
pub fn get() -> &'static Config {
    CONFIG.get().expect("config lida antes do boot publicar")
}

/// Variante que tolera boot incompleto.
pub fn try_get() -> Option<&'static Config> {
    CONFIG.get()
}
