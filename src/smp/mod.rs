// Arquivo: smp/mod.rs
//
// Propósito: Máquina de estados genérica do bringup SMP:
// 1. Descobrir CPUs na descrição de firmware (porta mp ou sun4v).
// 2. Classificar por núcleo físico (execution unit), BSP primeiro.
// 3. Escalonar a ordem de wake intercalando os núcleos.
// 4. Acordar cada AP (INIT/START da plataforma) e esperar o handshake
//    com timeout de 10s - AP ausente é logado, não fatal.
//
// Detalhes de Implementação:
// - O primitivo de START e a preparação de tabelas per-CPU (cópia da GDT
//   do BSP ou equivalente) entram pelo trait `SmpPlatform`.
// - O AP sinaliza `ap_signal_completion` exatamente uma vez após seu
//   early-init.

//! Bringup SMP

pub mod mp;
pub mod sun4v;
pub mod topology;


pub use topology::{CpuRecord, ExecUnit, Topology};

use crate::sync::WaitQ;
use alloc::vec::Vec;

/// Erros do bringup SMP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmpError {
    /// Descrição de firmware ausente.
    HardwareMissing,
    /// Tabela presente mas corrompida (assinatura/checksum/entrada).
    InvalidTable,
    /// Configuração que não suportamos (modo PIC, configuração default).
    UnsupportedPlatform,
    /// AP não completou o bringup no prazo.
    Timeout,
}

/// Prazo do handshake de cada AP (10 segundos).
pub const AP_START_TIMEOUT_US: u64 = 10_000_000;

/// Fila de conclusão dos APs.
static AP_COMPLETION_WQ: WaitQ = WaitQ::new();

/// Chamado pelo AP, exatamente uma vez, ao fim do seu early-init.
pub fn ap_signal_completion() {
    AP_COMPLETION_WQ.wakeup_first();
}

/// Primitivas de plataforma consumidas pelo wake loop.
pub trait SmpPlatform {
    /// Prepara as tabelas per-CPU do AP (cópia da GDT do BSP ou
    /// equivalente). Falha aqui é fatal: não há boot parcial limpo.
    fn prepare_cpu(&mut self, cpu: &CpuRecord) -> Result<(), SmpError>;

    /// Dispara o primitivo INIT/START da plataforma para o AP.
    fn start_cpu(&mut self, cpu: &CpuRecord) -> Result<(), SmpError>;
}

/// Resultado do wake loop.
#[derive(Debug, Default)]
pub struct KmpResult {
    /// CPUs rodando (BSP incluso), por hw_id.
    pub running: Vec<u64>,
    /// APs que não completaram no prazo.
    pub timed_out: Vec<u64>,
}

/// Thread de bringup dos APs.
///
/// Percorre a ordem de wake (intercalada por núcleo), pulando o BSP e
/// CPUs desabilitadas. Um AP que estoura o prazo é logado e o loop segue.
pub fn kmp(platform: &mut dyn SmpPlatform, topo: &Topology) -> KmpResult {
    let mut result = KmpResult::default();

    if let Some(bsp) = topo.bsp() {
        result.running.push(bsp.hw_id);
    }

    for cpu in topo.wake_order() {
        if cpu.is_bsp {
            continue;
        }
        if !cpu.enabled {
            crate::kdebug!("(SMP) pulando CPU desabilitada", cpu.hw_id);
            continue;
        }

        if platform.prepare_cpu(&cpu).is_err() {
            panic!("(SMP) sem memoria para tabelas per-CPU");
        }

        if platform.start_cpu(&cpu).is_err() {
            crate::kerror!("(SMP) INIT/START falhou para a CPU", cpu.hw_id);
            continue;
        }

        // Um AP por vez: quando terminar de subir, ele nos acorda.
        match AP_COMPLETION_WQ.sleep_timeout(AP_START_TIMEOUT_US) {
            Ok(()) => {
                crate::kinfo!("(SMP) AP online", cpu.hw_id);
                result.running.push(cpu.hw_id);
            }
            Err(_) => {
                crate::kwarn!("(SMP) timeout esperando a CPU", cpu.hw_id);
                result.timed_out.push(cpu.hw_id);
            }
        }
    }

    result
}
