// Arquivo: klib/hash/mod.rs
//
// Propósito: Hashing para as estruturas internas do kernel.
// Exporta a tabela encadeada com resize (`table`) e o hasher FNV-1a
// usado para misturar chaves inteiras (handles, ids).

//! Hashing

pub mod table;

pub use table::{Action, Cursor, HashError, HashTable, TableOps, HT_MAX_LOAD, HT_MIN_BUCKETS};

use core::hash::{Hash, Hasher};

/// Hasher FNV-1a de 64 bits.
///
/// Em no_std não temos `RandomState`; FNV-1a é barato, determinístico e
/// espalha bem chaves pequenas (inteiros sequenciais como handles).
pub struct FnvHasher {
    state: u64,
}

impl FnvHasher {
    pub fn new() -> Self {
        Self {
            state: 0xcbf2_9ce4_8422_2325,
        }
    }
}

impl Hasher for FnvHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state ^= byte as u64;
            self.state = self.state.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }

    fn finish(&self) -> u64 {
        self.state
    }
}

/// Mistura um valor inteiro via FNV-1a.
///
/// Atalho para chaves que são um único inteiro (caso comum: handles).
pub fn hash_mix<T: Hash>(val: T) -> u64 {
    let mut hasher = FnvHasher::new();
    val.hash(&mut hasher);
    hasher.finish()
}
