//! # Framework de Self-Tests do Kernel
//!
//! Estruturas e macros para testes padronizados executados durante o boot
//! (feature `self_test`).
//!
//! # Uso
//! ```rust
//! use crate::klib::test_framework::*;
//!
//! pub const MY_TESTS: &[TestCase] = &[
//!     TestCase::new("meu_teste", test_something),
//! ];
//! ```

/// Resultado de um teste individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestResult {
    /// Teste passou com sucesso.
    Pass,
    /// Teste falhou.
    Fail,
    /// Teste foi pulado (não aplicável no contexto atual).
    Skip,
}

/// Um caso de teste.
pub struct TestCase {
    /// Nome do teste (para logging).
    pub name: &'static str,
    /// Função que executa o teste.
    pub func: fn() -> TestResult,
}

impl TestCase {
    pub const fn new(name: &'static str, func: fn() -> TestResult) -> Self {
        Self { name, func }
    }

    /// Executa o teste e loga o resultado.
    pub fn run(&self) -> TestResult {
        let result = (self.func)();
        match result {
            TestResult::Pass => {
                crate::kinfo!("[Test] ok   ", self.name);
            }
            TestResult::Fail => {
                crate::kerror!("[Test] FAIL ", self.name);
            }
            TestResult::Skip => {
                crate::kwarn!("[Test] skip ", self.name);
            }
        }
        result
    }
}

/// Executa uma suíte de testes.
///
/// Qualquer falha derruba o kernel em panic: o boot só prossegue se todos
/// os testes passarem.
pub fn run_test_suite(suite_name: &str, tests: &[TestCase]) {
    crate::kinfo!("==== TEST SUITE: ", suite_name);

    let mut passed = 0usize;
    let mut skipped = 0usize;

    for test in tests {
        match test.run() {
            TestResult::Pass => passed += 1,
            TestResult::Fail => {
                crate::kerror!("SUITE FAILED: ", suite_name);
                panic!("self-test falhou - kernel parado");
            }
            TestResult::Skip => skipped += 1,
        }
    }

    crate::kinfo!("==== SUITE PASSED, testes: ", passed as u64);
    if skipped > 0 {
        crate::kwarn!("==== pulados: ", skipped as u64);
    }
}

/// Asserção de teste: se a condição for falsa, loga e retorna Fail.
#[macro_export]
macro_rules! kassert {
    ($cond:expr) => {
        if !($cond) {
            $crate::kerror!("ASSERTION FAILED: ", stringify!($cond));
            return $crate::klib::test_framework::TestResult::Fail;
        }
    };
    ($cond:expr, $msg:expr) => {
        if !($cond) {
            $crate::kerror!("ASSERTION FAILED: ", $msg);
            return $crate::klib::test_framework::TestResult::Fail;
        }
    };
}

/// Asserção de igualdade (valores conversíveis para u64).
#[macro_export]
macro_rules! kassert_eq {
    ($left:expr, $right:expr) => {
        if ($left) != ($right) {
            $crate::kerror!("ASSERTION FAILED: left != right");
            $crate::kerror!("  left  = ", ($left) as u64);
            $crate::kerror!("  right = ", ($right) as u64);
            return $crate::klib::test_framework::TestResult::Fail;
        }
    };
}
