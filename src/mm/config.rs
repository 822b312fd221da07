//! Constantes compartilhadas do MM

/// Tamanho de página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// log2(PAGE_SIZE)
pub const PAGE_WIDTH: u32 = 12;
