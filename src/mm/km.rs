//! Região kernel não-identity (km)
//!
//! Tabelas de página que servem a região km são globais e compartilhadas
//! entre todos os address spaces (ver `page::PageTable::make_global`);
//! `remove` nunca as libera.

use crate::config;
use crate::mm::VirtAddr;

/// O endereço pertence à região kernel não-identity?
pub fn is_non_identity(addr: VirtAddr) -> bool {
    match config::try_get() {
        Some(cfg) => {
            let a = addr.as_u64();
            a >= cfg.km_base && a - cfg.km_base < cfg.km_size
        }
        // Sem config publicada não há região km registrada.
        None => false,
    }
}
