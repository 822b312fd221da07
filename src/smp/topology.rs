// Arquivo: smp/topology.rs
//
// Propósito: Topologia de CPUs descobertas: agrupamento por núcleo
// físico (execution unit), reordenação com o BSP em primeiro e a ordem
// de wake intercalada (uma strand de cada núcleo por passada, para o
// paralelismo inicial cair em caches distintos).

//! Topologia de CPUs (SMP)

use alloc::vec::Vec;
use core::sync::atomic::AtomicUsize;

/// Uma CPU descoberta no firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuRecord {
    /// Id na descrição de firmware (ACPI id, id do nó MD).
    pub fw_id: u64,
    /// Id de hardware (APIC id em x86, strand id em sun4v).
    pub hw_id: u64,
    /// Núcleo físico a que pertence.
    pub unit_id: u64,
    /// CPU habilitada pelo firmware?
    pub enabled: bool,
    /// Bootstrap processor?
    pub is_bsp: bool,
}

/// Um núcleo físico (execution unit) com suas strands.
pub struct ExecUnit {
    pub unit_id: u64,
    /// hw_ids das strands, na ordem de descoberta (BSP promovido a 0).
    pub strands: Vec<u64>,
    /// Threads prontas no núcleo (balanceamento de carga do scheduler).
    pub nrdy: AtomicUsize,
}

impl ExecUnit {
    fn new(unit_id: u64) -> Self {
        Self {
            unit_id,
            strands: Vec::new(),
            nrdy: AtomicUsize::new(0),
        }
    }
}

/// Topologia completa após a classificação.
pub struct Topology {
    pub units: Vec<ExecUnit>,
    pub cpus: Vec<CpuRecord>,
    /// Total de CPUs reportadas (habilitadas ou não).
    pub cpu_count: usize,
}

impl Topology {
    /// Agrupa as CPUs por núcleo físico e reordena: o núcleo do BSP vai
    /// para o índice 0 e a strand do BSP para o índice 0 dentro dele.
    pub fn classify(cpus: Vec<CpuRecord>) -> Topology {
        let mut units: Vec<ExecUnit> = Vec::new();
        let mut bsp_unit = 0usize;
        let mut bsp_strand = 0usize;

        for cpu in &cpus {
            let i = match units.iter().position(|u| u.unit_id == cpu.unit_id) {
                Some(i) => i,
                None => {
                    units.push(ExecUnit::new(cpu.unit_id));
                    units.len() - 1
                }
            };
            if cpu.is_bsp {
                bsp_unit = i;
                bsp_strand = units[i].strands.len();
            }
            units[i].strands.push(cpu.hw_id);
        }

        if !units.is_empty() {
            units.swap(0, bsp_unit);
            units[0].strands.swap(0, bsp_strand);
        }

        let cpu_count = cpus.len();
        Topology {
            units,
            cpus,
            cpu_count,
        }
    }

    /// Maior número de strands num núcleo.
    pub fn max_core_strands(&self) -> usize {
        self.units.iter().map(|u| u.strands.len()).max().unwrap_or(0)
    }

    /// O BSP, se houver.
    pub fn bsp(&self) -> Option<&CpuRecord> {
        self.cpus.iter().find(|c| c.is_bsp)
    }

    /// Ordem de wake: round-robin pelos núcleos, uma strand de cada por
    /// passada, até esgotar todas.
    pub fn wake_order(&self) -> Vec<CpuRecord> {
        let mut order = Vec::new();
        for pass in 0..self.max_core_strands() {
            for unit in &self.units {
                if pass >= unit.strands.len() {
                    continue;
                }
                let hw_id = unit.strands[pass];
                if let Some(cpu) = self.cpus.iter().find(|c| c.hw_id == hw_id) {
                    order.push(*cpu);
                }
            }
        }
        order
    }
}
