// Arquivo: klib/arena.rs
//
// Propósito: Arena de recursos inteiros (resource allocator).
// Gerencia um namespace de inteiros (ex: handles de capability) como uma
// lista de spans livres, com alocação first-fit alinhada e coalescência
// na liberação.
//
// Detalhes de Implementação:
// - Spans livres ordenados por base em um Vec.
// - alloc(count, align) varre os spans e recorta o primeiro que couber.
// - free(base, count) reinsere e funde com vizinhos adjacentes.

//! Arena de recursos inteiros

use alloc::vec::Vec;

/// Um intervalo livre [base, base + count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    base: usize,
    count: usize,
}

/// Arena de inteiros.
pub struct RaArena {
    /// Spans livres, ordenados por base, sem sobreposição nem adjacência.
    spans: Vec<Span>,
}

impl RaArena {
    /// Cria uma arena vazia (sem spans).
    pub const fn new() -> Self {
        Self { spans: Vec::new() }
    }

    /// Adiciona um span de recursos disponíveis.
    pub fn span_add(&mut self, base: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.insert_free(Span { base, count });
    }

    /// Aloca `count` inteiros consecutivos com base alinhada a `align`.
    /// Retorna a base ou None se a arena estiver exaurida.
    pub fn alloc(&mut self, count: usize, align: usize) -> Option<usize> {
        debug_assert!(align.is_power_of_two());
        if count == 0 {
            return None;
        }

        for i in 0..self.spans.len() {
            let span = self.spans[i];
            let aligned = crate::klib::align::align_up(span.base, align);
            let skip = aligned - span.base;

            if skip + count > span.count {
                continue;
            }

            // Recorta [aligned, aligned + count) do span.
            self.spans.remove(i);
            if skip > 0 {
                self.insert_free(Span {
                    base: span.base,
                    count: skip,
                });
            }
            let tail = span.count - skip - count;
            if tail > 0 {
                self.insert_free(Span {
                    base: aligned + count,
                    count: tail,
                });
            }
            return Some(aligned);
        }

        None
    }

    /// Devolve `count` inteiros a partir de `base`.
    pub fn free(&mut self, base: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.insert_free(Span { base, count });
    }

    /// Total de inteiros livres (diagnóstico e testes).
    pub fn free_count(&self) -> usize {
        self.spans.iter().map(|s| s.count).sum()
    }

    /// Insere mantendo a ordenação por base e fundindo com vizinhos.
    fn insert_free(&mut self, span: Span) {
        let pos = self
            .spans
            .iter()
            .position(|s| s.base > span.base)
            .unwrap_or(self.spans.len());

        self.spans.insert(pos, span);

        // Funde com o sucessor.
        if pos + 1 < self.spans.len() {
            let next = self.spans[pos + 1];
            debug_assert!(span.base + span.count <= next.base, "span duplicado na arena");
            if span.base + span.count == next.base {
                self.spans[pos].count += next.count;
                self.spans.remove(pos + 1);
            }
        }
        // Funde com o antecessor.
        if pos > 0 {
            let prev = self.spans[pos - 1];
            let cur = self.spans[pos];
            debug_assert!(prev.base + prev.count <= cur.base, "span duplicado na arena");
            if prev.base + prev.count == cur.base {
                self.spans[pos - 1].count += cur.count;
                self.spans.remove(pos);
            }
        }
    }
}
