// Arquivo: klib/hash/table.rs
//
// Propósito: Tabela hash encadeada genérica com resize automático.
// Usada pelo capability space (handle -> capability) e disponível para o
// restante do kernel.
//
// Detalhes de Implementação:
// - Encadeamento para colisões (Vec de buckets, itens por valor).
// - Cresce para 2n+1 buckets começando em n == 89 (recomendação de
//   Thomas Wang): os primeiros tamanhos são primos e os demais têm
//   divisores grandes, o que mitiga funções de hash fracas.
// - Encolhe para n/2 quando a carga cai a 1/4 do limite, nunca abaixo
//   de 89.
// - SEM lock interno: a sincronização é responsabilidade do chamador.

//! Hash Table encadeada com resize

use alloc::vec::Vec;
use core::marker::PhantomData;

/// Número inicial (e mínimo) de buckets.
pub const HT_MIN_BUCKETS: usize = 89;

/// Carga média máxima por bucket antes do resize.
pub const HT_MAX_LOAD: usize = 2;

/// Erros da tabela hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashError {
    /// Falha de alocação na criação. Falha de alocação no *resize* não é
    /// erro: a tabela continua no tamanho atual.
    OutOfMemory,
}

/// Operações fornecidas pelo usuário da tabela.
///
/// `hash`, `key_hash` e `key_equal` são obrigatórias (o trait as exige).
/// `equal` só é necessária se `insert_unique` for usada; a implementação
/// default aborta se invocada sem override.
pub trait TableOps<T> {
    /// Tipo da chave de busca.
    type Key;

    /// Hash de um item já inserido.
    fn hash(item: &T) -> u64;

    /// Hash de uma chave de busca.
    fn key_hash(key: &Self::Key) -> u64;

    /// Compara chave de busca com item.
    fn key_equal(key: &Self::Key, item: &T) -> bool;

    /// Compara dois itens (apenas para `insert_unique`/`find_next`).
    fn equal(_a: &T, _b: &T) -> bool {
        panic!("TableOps::equal nao implementada para esta tabela");
    }

    /// Invocada para cada item removido (remove/clear/apply-Remove).
    fn on_remove(_item: T) {}
}

/// Resultado do callback de `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Segue para o próximo item.
    Continue,
    /// Encerra a iteração.
    Stop,
    /// Remove o item atual (e segue). O iterador só remove o item
    /// corrente, nunca o sucessor, então a posição seguinte permanece
    /// válida.
    Remove,
}

/// Posição estável de um item dentro da tabela (enquanto não houver
/// inserção/remoção/resize). Usada pelo par find_cursor/find_next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    bucket: usize,
    index: usize,
}

pub struct HashTable<T, O: TableOps<T>> {
    buckets: Vec<Vec<T>>,
    item_cnt: usize,
    max_load: usize,
    /// max_load * buckets.len(), cacheado.
    full_item_cnt: usize,
    /// Resize é suprimido durante `apply` e adiado para a saída.
    apply_ongoing: bool,
    _ops: PhantomData<O>,
}

impl<T, O: TableOps<T>> HashTable<T, O> {
    /// Cria a tabela. `init_size == 0` e `max_load == 0` usam os defaults.
    pub fn new(init_size: usize, max_load: usize) -> Result<Self, HashError> {
        let bucket_cnt = round_up_size(init_size);
        let buckets = alloc_buckets(bucket_cnt)?;
        let max_load = if max_load == 0 { HT_MAX_LOAD } else { max_load };

        Ok(Self {
            buckets,
            item_cnt: 0,
            max_load,
            full_item_cnt: max_load * bucket_cnt,
            apply_ongoing: false,
            _ops: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.item_cnt
    }

    pub fn is_empty(&self) -> bool {
        self.item_cnt == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_of_hash(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Insere um item. O(1) amortizado; pode disparar crescimento.
    pub fn insert(&mut self, item: T) {
        debug_assert!(!self.apply_ongoing);

        let idx = self.bucket_of_hash(O::hash(&item));
        self.buckets[idx].push(item);
        self.item_cnt += 1;
        self.grow_if_needed();
    }

    /// Insere apenas se não houver item igual (via `O::equal`).
    /// Em caso de duplicata devolve o item ao chamador.
    pub fn insert_unique(&mut self, item: T) -> Result<(), T> {
        debug_assert!(!self.apply_ongoing);

        let idx = self.bucket_of_hash(O::hash(&item));
        // Poderíamos filtrar por hash primeiro, mas equal() tende a ser
        // tão barata quanto hash().
        if self.buckets[idx].iter().any(|cur| O::equal(cur, &item)) {
            return Err(item);
        }

        self.buckets[idx].push(item);
        self.item_cnt += 1;
        self.grow_if_needed();
        Ok(())
    }

    /// Primeiro item cuja chave casa, ou None.
    pub fn find(&self, key: &O::Key) -> Option<&T> {
        let idx = self.bucket_of_hash(O::key_hash(key));
        self.buckets[idx].iter().find(|item| O::key_equal(key, item))
    }

    /// Variante mutável de `find`.
    pub fn find_mut(&mut self, key: &O::Key) -> Option<&mut T> {
        let idx = self.bucket_of_hash(O::key_hash(key));
        self.buckets[idx]
            .iter_mut()
            .find(|item| O::key_equal(key, item))
    }

    /// Como `find`, mas devolve a posição do item para iteração via
    /// `find_next`.
    pub fn find_cursor(&self, key: &O::Key) -> Option<Cursor> {
        let bucket = self.bucket_of_hash(O::key_hash(key));
        self.buckets[bucket]
            .iter()
            .position(|item| O::key_equal(key, item))
            .map(|index| Cursor { bucket, index })
    }

    /// Item na posição do cursor.
    pub fn get(&self, cur: Cursor) -> Option<&T> {
        self.buckets.get(cur.bucket)?.get(cur.index)
    }

    /// Próximo item igual (via `O::equal`) ao item em `cur`, percorrendo
    /// o bucket circularmente até voltar a `first`.
    pub fn find_next(&self, first: Cursor, cur: Cursor) -> Option<Cursor> {
        debug_assert_eq!(first.bucket, cur.bucket);

        let bucket = &self.buckets[cur.bucket];
        let item = &bucket[cur.index];

        // Sucessores diretos do item atual.
        for index in cur.index + 1..bucket.len() {
            if O::equal(&bucket[index], item) {
                return Some(Cursor {
                    bucket: cur.bucket,
                    index,
                });
            }
        }
        // Volta circular: do início do bucket até o primeiro match.
        for index in 0..first.index {
            if O::equal(&bucket[index], item) {
                return Some(Cursor {
                    bucket: cur.bucket,
                    index,
                });
            }
        }

        None
    }

    /// Remove todos os itens que casam com a chave, invocando
    /// `O::on_remove` para cada um. Retorna quantos foram removidos.
    pub fn remove(&mut self, key: &O::Key) -> usize {
        debug_assert!(!self.apply_ongoing);

        let idx = self.bucket_of_hash(O::key_hash(key));
        let bucket = &mut self.buckets[idx];

        let mut removed = 0;
        let mut i = 0;
        while i < bucket.len() {
            if O::key_equal(key, &bucket[i]) {
                O::on_remove(bucket.remove(i));
                removed += 1;
            } else {
                i += 1;
            }
        }

        self.item_cnt -= removed;
        self.shrink_if_needed();
        removed
    }

    /// Aplica `f` a todos os itens.
    ///
    /// O callback pode remover o item corrente (retornando
    /// `Action::Remove`); o sucessor permanece válido. Resize fica
    /// desabilitado durante a iteração e é avaliado na saída.
    pub fn apply<F: FnMut(&mut T) -> Action>(&mut self, mut f: F) {
        if self.item_cnt == 0 {
            return;
        }

        self.apply_ongoing = true;

        'outer: for bucket in self.buckets.iter_mut() {
            let mut i = 0;
            while i < bucket.len() {
                match f(&mut bucket[i]) {
                    Action::Continue => i += 1,
                    Action::Remove => {
                        O::on_remove(bucket.remove(i));
                        self.item_cnt -= 1;
                    }
                    Action::Stop => break 'outer,
                }
            }
        }

        self.apply_ongoing = false;
        self.shrink_if_needed();
        self.grow_if_needed();
    }

    /// Remove todos os itens e encolhe ao tamanho mínimo.
    pub fn clear(&mut self) {
        debug_assert!(!self.apply_ongoing);

        for bucket in self.buckets.iter_mut() {
            for item in bucket.drain(..) {
                O::on_remove(item);
            }
        }
        self.item_cnt = 0;

        if self.buckets.len() > HT_MIN_BUCKETS {
            self.resize(HT_MIN_BUCKETS);
        }
    }

    /// Cresce quando a carga média excede max_load.
    fn grow_if_needed(&mut self) {
        if self.full_item_cnt < self.item_cnt {
            // Mantém bucket_cnt ímpar (possivelmente primo).
            let new_cnt = 2 * self.buckets.len() + 1;
            self.resize(new_cnt);
        }
    }

    /// Encolhe quando a tabela está esparsa.
    fn shrink_if_needed(&mut self) {
        if self.item_cnt <= self.full_item_cnt / 4 && HT_MIN_BUCKETS < self.buckets.len() {
            // De 2n+1 para n: a divisão inteira descarta o +1.
            let new_cnt = self.buckets.len() / 2;
            self.resize(new_cnt);
        }
    }

    /// Realoca os buckets e redistribui os itens. Em falha de alocação a
    /// tabela permanece como está.
    fn resize(&mut self, new_cnt: usize) {
        debug_assert!(new_cnt >= HT_MIN_BUCKETS);

        // Estamos no meio de um apply: resize bagunçaria os buckets.
        if self.apply_ongoing {
            return;
        }

        let mut new_buckets = match alloc_buckets(new_cnt) {
            Ok(b) => b,
            Err(_) => return,
        };

        for bucket in self.buckets.iter_mut() {
            for item in bucket.drain(..) {
                let idx = (O::hash(&item) % new_cnt as u64) as usize;
                new_buckets[idx].push(item);
            }
        }

        self.buckets = new_buckets;
        self.full_item_cnt = self.max_load * new_cnt;
    }
}

/// Arredonda para o tamanho de tabela adequado mais próximo
/// (89, 179, 359, ... = 2^n * 90 - 1).
pub fn round_up_size(size: usize) -> usize {
    let mut rounded = HT_MIN_BUCKETS;
    while rounded < size {
        rounded = 2 * rounded + 1;
    }
    rounded
}

/// Aloca o vetor de buckets de forma falível.
fn alloc_buckets<T>(bucket_cnt: usize) -> Result<Vec<Vec<T>>, HashError> {
    let mut buckets = Vec::new();
    buckets
        .try_reserve_exact(bucket_cnt)
        .map_err(|_| HashError::OutOfMemory)?;
    for _ in 0..bucket_cnt {
        buckets.push(Vec::new());
    }
    Ok(buckets)
}
