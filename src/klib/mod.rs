//! # Kernel Library (KLib)
//!
//! Coleção de utilitários de baixo nível, agnósticos de arquitetura, que
//! complementam a `core` library do Rust para ambiente bare-metal.
//!
//! | Módulo           | Responsabilidade                                        |
//! |------------------|---------------------------------------------------------|
//! | `align`          | Alinhamento de endereços (`const fn`).                   |
//! | `arena`          | Arena de recursos inteiros (namespace de handles).       |
//! | `hash`           | Hash table encadeada com resize automático.              |
//! | `test_framework` | Infraestrutura de self-tests do kernel.                  |

pub mod align;
pub mod arena;
pub mod hash;
pub mod test_framework;
