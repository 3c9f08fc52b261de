//! `kiln` demo binary.
//!
//! Boots the runtime, registers a small type hierarchy, prints the type
//! forest, and shuts down with a leak report.

use kilnrt::{init_tracing, Runtime, RuntimeConfig, TypeError, TypeFlags, TypeRef};

fn main() {
    init_tracing();

    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(2);
        }
    };

    let runtime = match Runtime::startup(config) {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("error: runtime startup failed: {error}");
            std::process::exit(1);
        }
    };

    if let Err(error) = define_demo_types(&runtime) {
        eprintln!("error: type registration failed: {error}");
        let report = runtime.shutdown();
        eprintln!("{report}");
        std::process::exit(1);
    }

    if let Some(root) = runtime.root_type() {
        print_tree(&runtime, &root, 0);
    }
    println!("{} types registered", runtime.registry().len());

    let report = runtime.shutdown();
    println!("{report}");
    if !report.is_clean() {
        std::process::exit(1);
    }
}

fn define_demo_types(runtime: &Runtime) -> Result<(), TypeError> {
    let root = runtime.root_type();
    let entity = runtime.define_type("Entity", root.as_ref(), TypeFlags::ABSTRACT)?;
    let actor = runtime.define_type("Actor", Some(&entity), TypeFlags::empty())?;
    runtime.define_type("Pawn", Some(&actor), TypeFlags::FINAL)?;
    runtime.define_type("Light", Some(&actor), TypeFlags::empty())?;
    let component = runtime.define_type("Component", root.as_ref(), TypeFlags::ABSTRACT)?;
    runtime.define_type("Camera", Some(&component), TypeFlags::TRANSIENT)?;
    runtime.define_type("EditorGizmo", Some(&component), TypeFlags::EDITOR_ONLY)?;
    Ok(())
}

fn print_tree(runtime: &Runtime, ty: &TypeRef, depth: usize) {
    let interner = runtime.interner();
    println!(
        "{:indent$}{} {:?}",
        "",
        interner.lookup(ty.name()),
        ty.flags(),
        indent = depth * 2
    );

    let mut children = runtime.registry().subtypes_of(ty);
    children.sort_by_key(|child| interner.lookup(child.name()));
    for child in &children {
        print_tree(runtime, child, depth + 1);
    }
}
