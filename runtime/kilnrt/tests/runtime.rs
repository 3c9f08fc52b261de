//! End-to-end runtime lifecycle tests.

use kilnrt::{
    Ref, Runtime, RuntimeConfig, ShutdownReport, TypeError, TypeFlags, TypeRef, WeakRef,
    TYPE_PACKAGE_NAME,
};
use pretty_assertions::assert_eq;

fn config() -> RuntimeConfig {
    RuntimeConfig {
        pool_block_size: 8,
        track_proxies: true,
    }
}

fn start() -> Runtime {
    match Runtime::startup(config()) {
        Ok(runtime) => runtime,
        Err(error) => panic!("startup failed: {error}"),
    }
}

fn define(runtime: &Runtime, name: &str, parent: Option<&TypeRef>) -> TypeRef {
    match runtime.define_type(name, parent, TypeFlags::empty()) {
        Ok(ty) => ty,
        Err(error) => panic!("defining `{name}` failed: {error}"),
    }
}

#[test]
fn startup_registers_root_type_and_package() {
    let runtime = start();

    let Some(root) = runtime.root_type() else {
        panic!("no root type");
    };
    assert_eq!(runtime.interner().lookup(root.name()), "Object");
    assert_eq!(runtime.registry().len(), 1);
    assert!(runtime
        .objects()
        .find_object(&format!("/{TYPE_PACKAGE_NAME}/Object"))
        .is_some());
    assert!(runtime.type_package().is_some_and(|p| p.is_package()));
}

#[test]
fn base_and_derived_scenario() {
    let runtime = start();
    let registry = runtime.registry();
    let base = define(&runtime, "Base", None);
    let derived = define(&runtime, "Derived", Some(&base));

    let Some(found) = registry.find_by_str("Derived") else {
        panic!("Derived not found");
    };
    let Some(found_base) = registry.find_by_str("Base") else {
        panic!("Base not found");
    };
    assert!(found.is_subtype_of(&found_base));
    drop((found, found_base));

    assert_eq!(registry.unregister(&derived), Ok(()));
    assert!(registry.find_by_str("Derived").is_none());
    assert!(registry.find_by_str("Base").is_some());

    drop((base, derived));
    let report = runtime.shutdown();
    assert_eq!(
        report,
        ShutdownReport {
            // Root and Base.
            released_types: 2,
            released_objects: 0,
            leaked_types: 0,
            leaked_objects: 0,
        }
    );
}

#[test]
fn hierarchy_under_root() {
    let runtime = start();
    let Some(root) = runtime.root_type() else {
        panic!("no root type");
    };
    let entity = define(&runtime, "Entity", Some(&root));
    let actor = define(&runtime, "Actor", Some(&entity));

    assert!(actor.is_subtype_of(&root));
    assert_eq!(actor.depth(), 2);
    assert_eq!(
        runtime.registry().unregister(&root),
        Err(TypeError::HasSubtypes {
            name: "Object".to_owned(),
            subtypes: vec!["Entity".to_owned()],
        })
    );
}

#[test]
fn clean_shutdown_reports_no_leaks() {
    let runtime = start();
    {
        let root = runtime.root_type();
        let entity = define(&runtime, "Entity", root.as_ref());
        let _actor = define(&runtime, "Actor", Some(&entity));
    }

    let report = runtime.shutdown();
    assert_eq!(report.released_types, 3);
    assert!(report.is_clean(), "{report}");
}

#[test]
fn held_handles_are_reported_and_become_inert() {
    let runtime = start();
    let kept = define(&runtime, "Kept", None);
    let weak: WeakRef<_> = Ref::downgrade(&kept);
    let loose = runtime
        .objects()
        .create_object(runtime.interner().intern("Loose"));

    let report = runtime.shutdown();
    assert_eq!(report.leaked_types, 1);
    assert_eq!(report.leaked_objects, 1);
    assert!(!report.is_clean());

    // The descriptor itself is still readable, but its pool is gone.
    assert!(kept.parent().is_none());
    assert!(!weak.is_alive());
    assert_eq!(Ref::strong_count(&kept), 0);
    drop((kept, weak, loose));
}

#[test]
fn extra_object_registrations_are_released() {
    let runtime = start();
    let objects = runtime.objects();
    let level = objects.create_package(runtime.interner().intern("Level"));
    assert_eq!(objects.register_object(&level), Ok(()));
    drop(level);

    let report = runtime.shutdown();
    assert_eq!(report.released_objects, 1);
    assert!(report.is_clean(), "{report}");
}

#[test]
fn runtimes_are_independent() {
    let first = start();
    let second = start();

    define(&first, "OnlyInFirst", None);
    assert!(second.registry().find_by_str("OnlyInFirst").is_none());

    assert!(first.shutdown().is_clean());
    assert!(second.shutdown().is_clean());
}
