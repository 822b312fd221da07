// Arquivo: smp/mp.rs
//
// Propósito: Porta x86 da descoberta SMP - Intel MultiProcessor
// Specification. Localiza a MP Floating Pointer Structure (16 bytes com
// checksum), valida a MP Configuration Table (checksums base/estendido)
// e enumera os processor entries.
//
// Detalhes de Implementação:
// - Qualquer defeito na tabela degrada para uniprocessor (erro, nunca
//   panic): checksum ruim, assinatura errada, entrada desconhecida.
// - Modo PIC e configuração default não são suportados.
// - Múltiplos I/O APICs: vale o primeiro habilitado.

//! MP Specification (x86)

use super::{topology::CpuRecord, SmpError};
use alloc::vec::Vec;

/// "_MP_"
pub const FS_SIGNATURE: [u8; 4] = *b"_MP_";

/// "PCMP"
pub const CT_SIGNATURE: [u8; 4] = *b"PCMP";

/// MP Floating Pointer Structure (16 bytes).
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
pub struct MpFloatingPointer {
    pub signature: [u8; 4],
    /// Endereço físico da configuration table (0 = ausente).
    pub configuration_table: u32,
    pub length: u8,
    pub revision: u8,
    pub checksum: u8,
    /// Feature byte 1: 0 = tabela presente, senão configuração default.
    pub config_type: u8,
    /// Feature byte 2: bit 7 = modo PIC (IMCR presente).
    pub mpfib2: u8,
    pub reserved: [u8; 3],
}

/// Cabeçalho da MP Configuration Table (44 bytes; entradas em seguida).
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
pub struct MpConfigTable {
    pub signature: [u8; 4],
    pub base_table_length: u16,
    pub revision: u8,
    pub checksum: u8,
    pub oem_id: [u8; 8],
    pub product_id: [u8; 12],
    pub oem_table: u32,
    pub oem_table_size: u16,
    pub entry_count: u16,
    pub l_apic: u32,
    pub ext_table_length: u16,
    pub ext_table_checksum: u8,
    pub reserved: u8,
}

/// Entrada tipo 0: processador (20 bytes).
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
pub struct MpProcessorEntry {
    pub entry_type: u8,
    pub l_apic_id: u8,
    pub l_apic_version: u8,
    /// Bit 0 = habilitado, bit 1 = BSP.
    pub cpu_flags: u8,
    pub cpu_signature: u32,
    pub feature_flags: u32,
    pub reserved: [u32; 2],
}

/// Entrada tipo 2: I/O APIC (8 bytes).
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
pub struct MpIoApicEntry {
    pub entry_type: u8,
    pub io_apic_id: u8,
    pub io_apic_version: u8,
    /// Bit 0 = usável.
    pub io_apic_flags: u8,
    pub io_apic: u32,
}

/// Resultado da descoberta via MP table.
#[derive(Debug)]
pub struct MpInfo {
    pub cpus: Vec<CpuRecord>,
    /// Base física dos local APICs.
    pub l_apic: u32,
    /// Primeiro I/O APIC usável.
    pub io_apic: Option<u32>,
}

/// Soma (wrapping) dos bytes deve dar zero.
fn checksum_ok(bytes: &[u8]) -> bool {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b)) == 0
}

/// Procura a floating pointer structure numa região (passo de 16 bytes,
/// como manda a especificação).
pub fn find_floating_pointer(region: &[u8]) -> Option<MpFloatingPointer> {
    let mut off = 0;
    while off + 16 <= region.len() {
        if region[off..off + 4] == FS_SIGNATURE && checksum_ok(&region[off..off + 16]) {
            let fs = unsafe {
                core::ptr::read_unaligned(region.as_ptr().add(off) as *const MpFloatingPointer)
            };
            return Some(fs);
        }
        off += 16;
    }
    None
}

/// Procura em várias regiões candidatas (EBDA, último KiB da memória
/// base, ROM do BIOS), na ordem dada.
pub fn find_in_regions(regions: &[&[u8]]) -> Result<MpFloatingPointer, SmpError> {
    for region in regions {
        if let Some(fs) = find_floating_pointer(region) {
            crate::kinfo!("(SMP) MP Floating Pointer Structure encontrada");
            return Ok(fs);
        }
    }
    Err(SmpError::HardwareMissing)
}

/// Valida os feature bytes da floating structure antes de seguir para a
/// configuration table.
pub fn check_floating(fs: &MpFloatingPointer) -> Result<(), SmpError> {
    if fs.config_type != 0 || fs.configuration_table == 0 {
        return configure_via_default(fs.config_type).map(|_| ());
    }
    if fs.mpfib2 >> 7 != 0 {
        crate::kerror!("(SMP) modo PIC nao suportado");
        return Err(SmpError::UnsupportedPlatform);
    }
    Ok(())
}

/// Configurações default da MP spec não são suportadas: o chamador
/// segue em uniprocessor.
pub fn configure_via_default(config_type: u8) -> Result<MpInfo, SmpError> {
    crate::kwarn!("(SMP) configuracao default nao suportada", config_type as u64);
    Err(SmpError::UnsupportedPlatform)
}

/// Valida e enumera a MP Configuration Table.
pub fn parse_config_table(bytes: &[u8]) -> Result<MpInfo, SmpError> {
    const HEADER_LEN: usize = 44;

    if bytes.len() < HEADER_LEN {
        return Err(SmpError::InvalidTable);
    }

    let ct =
        unsafe { core::ptr::read_unaligned(bytes.as_ptr() as *const MpConfigTable) };

    if ct.signature != CT_SIGNATURE {
        crate::kerror!("(SMP) assinatura da configuration table invalida");
        return Err(SmpError::InvalidTable);
    }

    let base_len = ct.base_table_length as usize;
    let ext_len = ct.ext_table_length as usize;
    if base_len < HEADER_LEN || base_len + ext_len > bytes.len() {
        return Err(SmpError::InvalidTable);
    }

    // Checksum da tabela base e da estendida.
    if !checksum_ok(&bytes[..base_len]) {
        crate::kerror!("(SMP) checksum da configuration table invalido");
        return Err(SmpError::InvalidTable);
    }
    if ext_len > 0 {
        if !checksum_ok(&bytes[base_len..base_len + ext_len]) {
            crate::kerror!("(SMP) checksum da tabela estendida invalido");
            return Err(SmpError::InvalidTable);
        }
        crate::kwarn!("(SMP) entradas estendidas ignoradas");
    }

    if ct.oem_table != 0 {
        crate::kwarn!("(SMP) oem table nao suportada");
        return Err(SmpError::InvalidTable);
    }

    let mut info = MpInfo {
        cpus: Vec::new(),
        l_apic: ct.l_apic,
        io_apic: None,
    };

    let mut io_apic_count = 0;
    let mut cur = HEADER_LEN;

    for _ in 0..ct.entry_count {
        if cur >= base_len {
            return Err(SmpError::InvalidTable);
        }
        match bytes[cur] {
            // Processador
            0 => {
                if cur + 20 > base_len {
                    return Err(SmpError::InvalidTable);
                }
                let pr = unsafe {
                    core::ptr::read_unaligned(
                        bytes.as_ptr().add(cur) as *const MpProcessorEntry
                    )
                };
                // No x86 a MP table não descreve núcleos físicos: cada
                // CPU forma sua própria execution unit.
                info.cpus.push(CpuRecord {
                    fw_id: pr.l_apic_id as u64,
                    hw_id: pr.l_apic_id as u64,
                    unit_id: pr.l_apic_id as u64,
                    enabled: pr.cpu_flags & (1 << 0) != 0,
                    is_bsp: pr.cpu_flags & (1 << 1) != 0,
                });
                cur += 20;
            }
            // Bus
            1 => {
                cur += 8;
            }
            // I/O APIC
            2 => {
                if cur + 8 > base_len {
                    return Err(SmpError::InvalidTable);
                }
                let ioa = unsafe {
                    core::ptr::read_unaligned(bytes.as_ptr().add(cur) as *const MpIoApicEntry)
                };
                // I/O APIC marcado como inutilizável.
                if (ioa.io_apic_flags & 1) == 0 {
                    cur += 8;
                    continue;
                }
                io_apic_count += 1;
                if io_apic_count > 1 {
                    // Múltiplos I/O APICs: só o primeiro é usado.
                    crate::kwarn!("(SMP) multiplos I/O APICs, usando o primeiro");
                } else {
                    info.io_apic = Some(ioa.io_apic);
                }
                cur += 8;
            }
            // I/O Interrupt Assignment / Local Interrupt Assignment
            3 | 4 => {
                cur += 8;
            }
            _ => {
                // Tabela doente: fallback para UP.
                crate::kerror!("(SMP) entrada desconhecida na configuration table");
                return Err(SmpError::InvalidTable);
            }
        }
    }

    Ok(info)
}
