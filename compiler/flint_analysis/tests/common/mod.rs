//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Once;

use flint_ir::types::{TypeDeclId, TypeDeclKind, TypeSystem};

static TRACING_INIT: Once = Once::new();

/// Install a subscriber when `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_test_writer())
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}

/// Declare `System.Exception` and the exceptions the default rules use.
pub fn declare_runtime(types: &mut TypeSystem) -> Vec<TypeDeclId> {
    let exception = types.declare_type("System.Exception", TypeDeclKind::Class);
    let mut declared = vec![exception];
    for name in [
        "System.NullReferenceException",
        "System.IndexOutOfRangeException",
        "System.ArrayTypeMismatchException",
        "System.InvalidCastException",
    ] {
        let decl = types.declare_type(name, TypeDeclKind::Class);
        types.add_base(decl, exception);
        declared.push(decl);
    }
    declared
}
