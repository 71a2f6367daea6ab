//! Tests for ConnectionPool
//!
//! These tests verify:
//! - Open/close lifecycle and config validation
//! - Round-robin address assignment
//! - Lazy vs aggressive initialization
//! - Exhaustion reported as NoConnectionsAvailable
//! - RAII checkout and synchronous batch execution
//! - Connections returned with unread replies never reach the next caller

#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use common::{closes_for, dead_addr, FakeServer, MockConnection};
use pipepool::config::{InitializationMode, PoolConfig};
use pipepool::{BatchCommand, BatchCommandSet, Connection, ConnectionPool, PipeError, Reply, TcpConnection};

// =============================================================================
// Helper Functions
// =============================================================================

fn mock_pool(capacity: usize, addresses: &[&str], mode: InitializationMode) -> ConnectionPool<MockConnection> {
    let config = PoolConfig::builder()
        .capacity(capacity)
        .addresses(addresses.iter().copied())
        .init_mode(mode)
        .build();
    ConnectionPool::new(config)
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_new_pool_is_closed() {
    let pool = mock_pool(2, &["lifecycle:1"], InitializationMode::Lazy);

    assert!(pool.is_closed());
    assert!(!pool.is_open());
    assert!(matches!(pool.pop(), Err(PipeError::PoolClosed)));
}

#[test]
fn test_open_then_close() {
    let pool = mock_pool(3, &["lifecycle:2"], InitializationMode::Lazy);

    pool.open().unwrap();
    assert!(pool.is_open());
    assert_eq!(pool.size(), 3);
    assert_eq!(pool.len(), 3);

    pool.close();
    assert!(pool.is_closed());
    assert_eq!(pool.len(), 0);
    assert_eq!(closes_for("lifecycle:2"), 3);

    // Second close is a no-op
    pool.close();
    assert_eq!(closes_for("lifecycle:2"), 3);
}

#[test]
fn test_open_twice_fails() {
    let pool = mock_pool(1, &["lifecycle:3"], InitializationMode::Lazy);

    pool.open().unwrap();
    assert!(matches!(pool.open(), Err(PipeError::PoolAlreadyOpen)));
}

#[test]
fn test_open_rejects_bad_config() {
    let zero = mock_pool(0, &["cfg:1"], InitializationMode::Lazy);
    assert!(matches!(zero.open(), Err(PipeError::Config(_))));

    let no_addrs = mock_pool(1, &[], InitializationMode::Lazy);
    assert!(matches!(no_addrs.open(), Err(PipeError::Config(_))));

    assert!(zero.is_closed());
    assert!(no_addrs.is_closed());
}

#[test]
fn test_zero_timeout_uses_default() {
    let config = PoolConfig::builder().timeout(Duration::ZERO).build();
    assert_eq!(config.effective_timeout(), Duration::from_secs(15));
}

// =============================================================================
// Initialization Mode Tests
// =============================================================================

#[test]
fn test_addresses_assigned_round_robin() {
    let pool = mock_pool(5, &["rr:a", "rr:b", "rr:c"], InitializationMode::Lazy);
    pool.open().unwrap();

    let mut addrs: Vec<String> = (0..5).map(|_| pool.pop().unwrap().addr().to_string()).collect();
    addrs.sort();

    assert_eq!(addrs, vec!["rr:a", "rr:a", "rr:b", "rr:b", "rr:c"]);
}

#[test]
fn test_lazy_mode_does_not_open() {
    let pool = mock_pool(2, &["lazy:1"], InitializationMode::Lazy);
    pool.open().unwrap();

    let conn = pool.pop().unwrap();
    assert!(!conn.is_open());
    assert!(!conn.is_closed());
}

#[test]
fn test_aggressive_mode_opens_every_connection() {
    let pool = mock_pool(2, &["eager:1"], InitializationMode::Aggressive);
    pool.open().unwrap();

    let conn = pool.pop().unwrap();
    assert!(conn.is_open());
}

#[test]
fn test_aggressive_mode_aborts_on_failed_probe() {
    // Second address refuses, so the second connection fails its probe
    let pool = mock_pool(4, &["probe:up", "down:probe"], InitializationMode::Aggressive);

    let err = pool.open().unwrap_err();
    assert!(matches!(err, PipeError::Io(_)));
    assert!(pool.is_closed());
    assert_eq!(closes_for("down:probe"), 1, "failed connection is closed");
}

#[test]
fn test_aggressive_mode_against_dead_tcp_address() {
    let config = PoolConfig::builder()
        .capacity(1)
        .addresses([dead_addr()])
        .timeout(Duration::from_secs(1))
        .init_mode(InitializationMode::Aggressive)
        .build();
    let pool: ConnectionPool<TcpConnection> = ConnectionPool::new(config);

    assert!(pool.open().unwrap_err().is_connection_error());
    assert!(pool.is_closed());
}

// =============================================================================
// Checkout Tests
// =============================================================================

#[test]
fn test_pop_until_exhausted() {
    let pool = mock_pool(2, &["pop:1"], InitializationMode::Lazy);
    pool.open().unwrap();

    let a = pool.pop().unwrap();
    let b = pool.pop().unwrap();
    assert!(matches!(pool.pop(), Err(PipeError::NoConnectionsAvailable)));

    pool.push(a);
    assert_eq!(pool.len(), 1);
    pool.push(b);
    assert_eq!(pool.len(), 2);
}

#[test]
fn test_closed_connection_is_replaced_on_push() {
    let pool = mock_pool(1, &["replace:1"], InitializationMode::Lazy);
    pool.open().unwrap();

    let mut conn = pool.pop().unwrap();
    conn.close().unwrap();
    pool.push(conn);

    let fresh = pool.pop().unwrap();
    assert!(!fresh.is_closed());
}

#[test]
fn test_connection_with_unread_replies_is_replaced_on_push() {
    let pool = mock_pool(1, &["unread:1"], InitializationMode::Lazy);
    pool.open().unwrap();

    let mut conn = pool.pop().unwrap();
    conn.enqueue("GET", &[]).unwrap();
    assert_eq!(conn.pending(), 1);
    pool.push(conn);

    assert_eq!(closes_for("unread:1"), 1);
    let fresh = pool.pop().unwrap();
    assert_eq!(fresh.pending(), 0);
    assert!(!fresh.is_closed());
}

#[test]
fn test_push_after_close_closes_connection() {
    let pool = mock_pool(1, &["late:1"], InitializationMode::Lazy);
    pool.open().unwrap();

    let conn = pool.pop().unwrap();
    pool.close();
    assert_eq!(closes_for("late:1"), 0, "checked-out connection untouched");

    pool.push(conn);
    assert_eq!(closes_for("late:1"), 1);
}

#[test]
fn test_guard_returns_connection_on_drop() {
    let pool = mock_pool(1, &["guard:1"], InitializationMode::Lazy);
    pool.open().unwrap();

    {
        let mut conn = pool.get().unwrap();
        assert_eq!(pool.len(), 0);
        let reply = conn.execute("PING", &[]).unwrap();
        assert_eq!(reply, Reply::Status("PING:".to_string()));
    }

    assert_eq!(pool.len(), 1);
}

#[test]
fn test_guard_detach_keeps_connection() {
    let pool = mock_pool(1, &["detach:1"], InitializationMode::Lazy);
    pool.open().unwrap();

    let conn = pool.get().unwrap().detach();
    assert_eq!(pool.len(), 0);
    assert_eq!(conn.addr(), "detach:1");
}

// =============================================================================
// Batch Execution Tests
// =============================================================================

#[test]
fn test_abandoned_pipeline_does_not_leak_into_next_batch() {
    let server = FakeServer::start();
    let config = PoolConfig::builder()
        .capacity(1)
        .addresses([server.addr()])
        .build();
    let pool: ConnectionPool<TcpConnection> = ConnectionPool::new(config);
    pool.open().unwrap();

    {
        // Checked out, one command sent, guard dropped before the reply is read
        let mut conn = pool.get().unwrap();
        conn.enqueue("GET", &[bytes::Bytes::from_static(b"missing")]).unwrap();
    }

    let mut set: BatchCommandSet = vec![BatchCommand::set("x", "y")].into();
    pool.execute_batch(&mut set).unwrap();

    assert_eq!(set[0].reply(), Some(&Reply::Status("OK".to_string())));
    assert_eq!(pool.len(), 1);
    pool.close();
}

#[test]
fn test_execute_batch_refuses_connection_with_unread_replies() {
    let mut conn = MockConnection::new("unread:2");
    conn.enqueue("GET", &[]).unwrap();

    let mut set: BatchCommandSet = vec![BatchCommand::get("k")].into();
    let err = set.execute(&mut conn).unwrap_err();

    assert!(matches!(err, PipeError::Protocol(_)));
    assert!(!set[0].is_executed());
    assert_eq!(conn.pending(), 1, "nothing else was sent");
}

#[test]
fn test_execute_batch_over_tcp_pool() {
    let server = FakeServer::start();
    let config = PoolConfig::builder()
        .capacity(2)
        .addresses([server.addr()])
        .init_mode(InitializationMode::Aggressive)
        .build();
    let pool: ConnectionPool<TcpConnection> = ConnectionPool::new(config);
    pool.open().unwrap();

    let mut set: BatchCommandSet = [
        BatchCommand::set("greeting", "Hello"),
        BatchCommand::get("greeting"),
        BatchCommand::exists("missing"),
    ]
    .into_iter()
    .collect();

    pool.execute_batch(&mut set).unwrap();

    assert_eq!(set[0].reply(), Some(&Reply::Status("OK".to_string())));
    assert_eq!(set[1].reply(), Some(&Reply::Bulk("Hello".into())));
    assert_eq!(set[2].reply(), Some(&Reply::Integer(0)));
    assert_eq!(pool.len(), 2);

    pool.close();
}
