//! # Arch - Camada de Arquitetura
//!
//! O que é específico de porta fica aqui: barreiras de memória e o layout
//! de bits de PTE de cada porta do page-table engine genérico.

pub mod barrier;
pub mod x86_64;
