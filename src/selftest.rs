//! # Self-Tests do Núcleo
//!
//! Executados pelo boot (feature `self_test`) depois do heap estar de pé
//! e antes do HHDM sair do identity. Qualquer falha para o kernel.

use crate::config::{self, Config};
use crate::klib::test_framework::run_test_suite;

/// Configuração usada quando o boot ainda não publicou a sua (os testes
/// de região km dependem dela).
fn publish_test_config() {
    config::init(Config {
        cpu_count: 1,
        identity_base: 0,
        identity_size: 0x8000_0000,
        km_base: 0xFFFF_8000_0000_0000,
        km_size: 2 << 39,
    });
}

/// Roda todas as suítes de self-test do núcleo.
pub fn run_all() {
    publish_test_config();

    run_test_suite("KLib", crate::klib::test::KLIB_TESTS);
    run_test_suite("Caps", crate::caps::test::CAPS_TESTS);
    run_test_suite("MM", crate::mm::test::MM_TESTS);
    run_test_suite("Udebug", crate::udebug::test::UDEBUG_TESTS);
    run_test_suite("SMP", crate::smp::test::SMP_TESTS);
}
