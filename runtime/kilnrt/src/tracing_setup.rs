//! Log output for the `kiln` binary and embedders.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the global tracing subscriber, once per process.
///
/// Does nothing unless `RUST_LOG` is set. With `KILN_LOG_TREE` set, spans
/// are rendered as an indented tree instead of flat lines.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};
        use tracing_tree::HierarchicalLayer;

        if std::env::var("RUST_LOG").is_err() {
            return;
        }

        let tree = std::env::var("KILN_LOG_TREE").is_ok();
        tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tree.then(|| HierarchicalLayer::new(2).with_targets(true)))
            .with((!tree).then(|| fmt::layer().with_target(true).with_level(true)))
            .init();
    });
}
