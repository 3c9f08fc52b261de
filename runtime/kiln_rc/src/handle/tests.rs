use super::*;
use crate::PoolConfig;
use pretty_assertions::assert_eq;

fn pool<T>() -> ProxyPool<T> {
    ProxyPool::with_config(
        "test",
        PoolConfig {
            block_size: 8,
            track_active: true,
        },
    )
}

#[test]
fn adopt_starts_with_one_strong_reference() {
    let pool = pool();
    let handle = pool.adopt(String::from("mesh"));

    assert_eq!(*handle, "mesh");
    assert_eq!(Ref::strong_count(&handle), 1);
    assert_eq!(Ref::weak_count(&handle), 0);
    assert_eq!(pool.active_count(), Some(1));
}

#[test]
fn clone_and_drop_track_strong_count() {
    let pool = pool();
    let a = pool.adopt(7u32);
    let b = a.clone();
    assert_eq!(Ref::strong_count(&a), 2);
    assert!(Ref::ptr_eq(&a, &b));
    assert_eq!(a, b);

    drop(b);
    assert_eq!(Ref::strong_count(&a), 1);

    drop(a);
    assert_eq!(pool.active_count(), Some(0));
    assert_eq!(pool.stats().in_use, 0);
}

#[test]
fn distinct_objects_are_not_equal() {
    let pool = pool();
    let a = pool.adopt(1u32);
    let b = pool.adopt(1u32);
    assert_ne!(a, b);
    assert_ne!(Ref::id(&a), Ref::id(&b));
}

#[test]
fn weak_upgrade_while_alive() {
    let pool = pool();
    let strong = pool.adopt(vec![1, 2, 3]);
    let weak = Ref::downgrade(&strong);
    assert_eq!(Ref::weak_count(&strong), 1);
    assert!(weak.is_alive());

    let again = weak.upgrade();
    assert_eq!(again.as_deref(), Some(&vec![1, 2, 3]));
    assert_eq!(Ref::strong_count(&strong), 2);
}

#[test]
fn weak_keeps_proxy_but_not_object() {
    let pool = pool();
    let strong = pool.adopt(5u32);
    let weak = Ref::downgrade(&strong);

    drop(strong);
    assert!(!weak.is_alive());
    assert!(weak.upgrade().is_none());
    // Proxy stays checked out while a weak handle exists.
    assert_eq!(pool.active_count(), Some(1));

    drop(weak);
    assert_eq!(pool.active_count(), Some(0));
}

#[test]
fn weak_clone_counts() {
    let pool = pool();
    let strong = pool.adopt(0u8);
    let w1 = Ref::downgrade(&strong);
    let w2 = w1.clone();
    assert_eq!(Ref::weak_count(&strong), 2);
    assert_eq!(w1.id(), w2.id());
    drop(w1);
    assert_eq!(Ref::weak_count(&strong), 1);
}

#[test]
fn object_is_dropped_when_last_strong_handle_goes() {
    struct Flag(Arc<std::sync::atomic::AtomicBool>);
    impl Drop for Flag {
        fn drop(&mut self) {
            self.0.store(true, std::sync::atomic::Ordering::SeqCst);
        }
    }

    let dropped = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let pool = pool();
    let handle = pool.adopt(Flag(Arc::clone(&dropped)));
    let weak = Ref::downgrade(&handle);
    let second = handle.clone();

    drop(handle);
    assert!(!dropped.load(std::sync::atomic::Ordering::SeqCst));
    drop(second);
    assert!(dropped.load(std::sync::atomic::Ordering::SeqCst));
    assert!(weak.upgrade().is_none());
}

#[test]
fn nested_handles_in_same_pool_do_not_deadlock() {
    struct Node {
        _child: Option<Ref<Node>>,
    }

    let pool = pool();
    let leaf = pool.adopt(Node { _child: None });
    let root = pool.adopt(Node {
        _child: Some(leaf.clone()),
    });
    drop(leaf);
    assert_eq!(pool.active_count(), Some(2));

    drop(root);
    assert_eq!(pool.active_count(), Some(0));
}

#[test]
fn handles_are_inert_after_shutdown() {
    let pool = pool();
    let strong = pool.adopt(String::from("leak"));
    let weak = Ref::downgrade(&strong);

    pool.shutdown();
    assert_eq!(*strong, "leak");
    assert_eq!(Ref::strong_count(&strong), 0);
    assert!(weak.upgrade().is_none());

    let fresh = pool.adopt(String::from("fresh"));
    drop(strong);
    drop(weak);
    assert_eq!(Ref::strong_count(&fresh), 1);
    assert_eq!(pool.active_count(), Some(1));
}

#[test]
fn handles_move_across_threads() {
    let pool = pool();
    let handle = pool.adopt(42u64);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let copy = handle.clone();
                    assert_eq!(*copy, 42);
                }
            })
        })
        .collect();
    for worker in workers {
        assert!(worker.join().is_ok());
    }

    assert_eq!(Ref::strong_count(&handle), 1);
    drop(handle);
    assert_eq!(pool.active_count(), Some(0));
}
