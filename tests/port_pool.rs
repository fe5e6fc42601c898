//! Port pool properties: ascending deterministic acquisition, exhaustion,
//! idempotent release, seeding from persisted assignments.

use branchbox::errors::LifecycleError;
use branchbox::PortAllocator;

#[test]
fn test_acquire_ascending_from_minimum() {
    let mut pool = PortAllocator::with_range(3000, 3005);
    assert_eq!(pool.acquire().unwrap(), 3000);
    assert_eq!(pool.acquire().unwrap(), 3001);
    assert_eq!(pool.acquire().unwrap(), 3002);
}

#[test]
fn test_exhaustion_reports_range() {
    let mut pool = PortAllocator::with_range(3000, 3001);
    pool.acquire().unwrap();
    pool.acquire().unwrap();
    let err = pool.acquire().expect_err("two-port pool exhausted");
    assert!(matches!(
        err,
        LifecycleError::PoolExhausted { min: 3000, max: 3001 }
    ));
}

#[test]
fn test_released_port_comes_back_as_minimum_free() {
    let mut pool = PortAllocator::with_range(3000, 3010);
    let a = pool.acquire().unwrap();
    let b = pool.acquire().unwrap();
    let c = pool.acquire().unwrap();
    assert_eq!((a, b, c), (3000, 3001, 3002));

    pool.release(b);
    // 3001 is now the minimum free port, so it is handed out next
    assert_eq!(pool.acquire().unwrap(), 3001);
    // ...but a freed port that is not the minimum is not
    pool.release(c);
    pool.release(a);
    assert_eq!(pool.acquire().unwrap(), 3000);
}

#[test]
fn test_acquire_release_roundtrip_restores_free_count() {
    let mut pool = PortAllocator::with_range(3000, 3007);
    let before = pool.free_count();
    let ports: Vec<u16> = (0..4).map(|_| pool.acquire().unwrap()).collect();
    assert_eq!(pool.free_count(), before - 4);
    for p in ports {
        pool.release(p);
    }
    assert_eq!(pool.free_count(), before);
}

#[test]
fn test_release_is_idempotent() {
    let mut pool = PortAllocator::with_range(3000, 3002);
    let p = pool.acquire().unwrap();
    pool.release(p);
    let once = pool.free_count();
    pool.release(p);
    assert_eq!(pool.free_count(), once);
}

#[test]
fn test_release_out_of_range_is_noop() {
    let mut pool = PortAllocator::with_range(3000, 3001);
    let before = pool.free_count();
    pool.release(9999);
    assert_eq!(pool.free_count(), before);
}

#[test]
fn test_seeded_skips_persisted_assignments() {
    let mut pool = PortAllocator::seeded(3000, 3003, [3000, 3002]);
    assert_eq!(pool.acquire().unwrap(), 3001);
    assert_eq!(pool.acquire().unwrap(), 3003);
    assert!(pool.acquire().is_err());
}

#[test]
fn test_seeded_ignores_out_of_range_assignments() {
    let pool = PortAllocator::seeded(3000, 3001, [5000]);
    assert_eq!(pool.free_count(), 2);
}
