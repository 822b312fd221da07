// Arquivo: smp/sun4v.rs
//
// Propósito: Porta sun4v (SPARCv9) da descoberta SMP - a machine
// description é uma árvore de nós tipados entregue pelo hypervisor.
// Cada nó "cpu" é uma strand; o núcleo físico (execution unit) é o filho
// de tipo "integer" (cada núcleo Niagara tem exatamente uma unidade
// inteira, então os termos se equivalem).
//
// Detalhes de Implementação:
// - Firmware antigo (ou Simics) pode não expor as unidades: o fallback
//   finge um único núcleo com todas as CPUs.
// - A reordenação BSP-primeiro fica com `Topology::classify`.

//! Machine description sun4v

use super::topology::CpuRecord;
use alloc::string::String;
use alloc::vec::Vec;

/// Um nó da machine description.
pub struct MdNode {
    /// Nome do nó ("cpu", "exec-unit", ...).
    pub name: String,
    /// Propriedade "type" ("integer" para unidades inteiras).
    pub node_type: String,
    /// Propriedade "id" (strand id nos nós cpu; identifica a unidade nos
    /// nós de execução).
    pub id: u64,
    pub children: Vec<MdNode>,
}

impl MdNode {
    pub fn new(name: &str, node_type: &str, id: u64) -> Self {
        Self {
            name: String::from(name),
            node_type: String::from(node_type),
            id,
            children: Vec::new(),
        }
    }
}

/// Unidade fictícia usada no fallback.
const FALLBACK_UNIT_ID: u64 = 1;

fn collect_cpu_nodes<'a>(node: &'a MdNode, out: &mut Vec<&'a MdNode>) {
    if node.name == "cpu" {
        out.push(node);
    }
    for child in &node.children {
        collect_cpu_nodes(child, out);
    }
}

/// Descobre as CPUs e seus núcleos físicos na machine description.
///
/// Retorna os registros (com `unit_id` preenchido) e o total de CPUs.
/// `bsp_id` é o resultado do hypercall CPU_MYID no BSP.
pub fn detect_execution_units(root: &MdNode, bsp_id: u64) -> (Vec<CpuRecord>, usize) {
    let mut cpu_nodes = Vec::new();
    collect_cpu_nodes(root, &mut cpu_nodes);

    let cpu_count = cpu_nodes.len();
    let mut assign_error = false;
    let mut cpus = Vec::new();

    for node in &cpu_nodes {
        // A unidade inteira do núcleo deste strand.
        let unit_id = node
            .children
            .iter()
            .find(|child| child.node_type == "integer")
            .map(|child| child.id)
            .unwrap_or(0);

        if unit_id == 0 {
            assign_error = true;
        }

        cpus.push(CpuRecord {
            fw_id: node.id,
            hw_id: node.id,
            unit_id,
            enabled: true,
            is_bsp: node.id == bsp_id,
        });
    }

    if assign_error {
        // Detecção de núcleos falhou em alguma CPU: fingir uma única
        // execution unit com todas elas.
        crate::kwarn!("(SMP) machine description sem execution units, usando fallback");
        for cpu in cpus.iter_mut() {
            cpu.unit_id = FALLBACK_UNIT_ID;
        }
    }

    (cpus, cpu_count)
}
