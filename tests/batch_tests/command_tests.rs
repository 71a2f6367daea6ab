//! Tests for BatchCommand factories and pipelined execution
//!
//! These tests verify:
//! - Exact argument encoding for every factory
//! - Reply i belongs to command i, whatever the mix of commands
//! - Command-level errors stay on their command
//! - A connection lost mid-batch aborts the rest of the batch

#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;

use bytes::Bytes;
use common::{FakeServer, MockConnection};
use pipepool::batch::{execute_batch, BitOp};
use pipepool::{BatchCommand, BatchCommandSet, Connection, PipeError, Reply, TcpConnection};

// =============================================================================
// Helper Functions
// =============================================================================

fn args_of(command: &BatchCommand) -> Vec<&[u8]> {
    command.args().iter().map(Bytes::as_ref).collect()
}

fn assert_encodes(command: BatchCommand, name: &str, expected: &[&[u8]]) {
    assert_eq!(command.name(), name);
    assert_eq!(args_of(&command), expected.to_vec(), "arguments of {}", name);
    assert!(command.reply().is_none());
}

// =============================================================================
// Argument Encoding Tests
// =============================================================================

#[test]
fn test_key_commands() {
    assert_encodes(BatchCommand::exists("k"), "EXISTS", &[b"k"]);
    assert_encodes(BatchCommand::del(["a", "b"]), "DEL", &[b"a", b"b"]);
}

#[test]
fn test_expire_truncates_to_whole_seconds() {
    assert_encodes(
        BatchCommand::expire("k", Duration::from_millis(90_999)),
        "EXPIRE",
        &[b"k", b"90"],
    );
    assert_encodes(
        BatchCommand::expire("k", Duration::from_millis(400)),
        "EXPIRE",
        &[b"k", b"0"],
    );
}

#[test]
fn test_string_commands() {
    assert_encodes(BatchCommand::get("k"), "GET", &[b"k"]);
    assert_encodes(BatchCommand::set("k", b"\x00\xff"), "SET", &[b"k", b"\x00\xff"]);
    assert_encodes(
        BatchCommand::set_with_expiry("k", "v", Duration::from_secs(30)),
        "SETEX",
        &[b"k", b"30", b"v"],
    );
    assert_encodes(BatchCommand::mget(["x", "y", "z"]), "MGET", &[b"x", b"y", b"z"]);
}

#[test]
fn test_hash_commands() {
    assert_encodes(BatchCommand::hget("h", "f"), "HGET", &[b"h", b"f"]);
    assert_encodes(BatchCommand::hset("h", "f", "v"), "HSET", &[b"h", b"f", b"v"]);
    assert_encodes(BatchCommand::hmget("h", ["a", "b"]), "HMGET", &[b"h", b"a", b"b"]);
    assert_encodes(
        BatchCommand::hmset("h", [("a", "1"), ("b", "2")]),
        "HMSET",
        &[b"h", b"a", b"1", b"b", b"2"],
    );
    assert_encodes(BatchCommand::hgetall("h"), "HGETALL", &[b"h"]);
    assert_encodes(BatchCommand::hincrby("h", "f", -25), "HINCRBY", &[b"h", b"f", b"-25"]);
    assert_encodes(BatchCommand::hdel("h", ["a", "b"]), "HDEL", &[b"h", b"a", b"b"]);
}

#[test]
fn test_bit_commands() {
    assert_encodes(
        BatchCommand::bitop(BitOp::And, "dest", ["s1", "s2", "s3"]),
        "BITOP",
        &[b"AND", b"dest", b"s1", b"s2", b"s3"],
    );
    assert_encodes(BatchCommand::bitop(BitOp::Not, "d", ["s"]), "BITOP", &[b"NOT", b"d", b"s"]);
    assert_encodes(BatchCommand::getbit("b", 1024), "GETBIT", &[b"b", b"1024"]);
    assert_encodes(BatchCommand::setbit("b", 7, true), "SETBIT", &[b"b", b"7", b"1"]);
    assert_encodes(BatchCommand::setbit("b", 7, false), "SETBIT", &[b"b", b"7", b"0"]);
    assert_encodes(BatchCommand::bitcount("b"), "BITCOUNT", &[b"b"]);
}

#[test]
fn test_bitop_tokens() {
    let tokens: Vec<&str> = [BitOp::And, BitOp::Or, BitOp::Xor, BitOp::Not]
        .iter()
        .map(BitOp::as_str)
        .collect();
    assert_eq!(tokens, vec!["AND", "OR", "XOR", "NOT"]);
}

// =============================================================================
// Pipelined Execution Tests
// =============================================================================

#[test]
fn test_replies_follow_submission_order() {
    let mut conn = MockConnection::new("order:1");
    let mut commands = vec![
        BatchCommand::get("a"),
        BatchCommand::hincrby("b", "f", 1),
        BatchCommand::setbit("c", 3, true),
    ];

    execute_batch(&mut commands, &mut conn).unwrap();

    let replies: Vec<_> = commands.iter().map(|c| c.reply().cloned()).collect();
    assert_eq!(
        replies,
        vec![
            Some(Reply::Status("GET:a".to_string())),
            Some(Reply::Status("HINCRBY:b".to_string())),
            Some(Reply::Status("SETBIT:c".to_string())),
        ]
    );
}

#[test]
fn test_command_error_does_not_abort_siblings() {
    let mut conn = MockConnection::new("siblings:1");
    let mut set = BatchCommandSet::new();
    set.push(BatchCommand::get("before"));
    let failing = set.push(BatchCommand::new("FAIL", Vec::new()));
    set.push(BatchCommand::get("after"));

    set.execute(&mut conn).unwrap();

    assert_eq!(set[failing].error(), Some("ERR forced failure"));
    assert!(set[0].error().is_none());
    assert_eq!(set[2].reply(), Some(&Reply::Status("GET:after".to_string())));
}

#[test]
fn test_connection_loss_leaves_remaining_unset() {
    let mut conn = MockConnection::new("lost:1").fail_after(2);
    let mut commands: Vec<_> = (0..4).map(|i| BatchCommand::get(format!("k{}", i))).collect();

    let err = execute_batch(&mut commands, &mut conn).unwrap_err();

    assert!(matches!(err, PipeError::ConnectionClosed));
    assert!(commands[0].is_executed());
    assert!(commands[1].is_executed());
    assert!(!commands[2].is_executed());
    assert!(!commands[3].is_executed());
}

#[test]
fn test_empty_batch_is_a_noop() {
    let mut conn = MockConnection::new("empty:1");
    let mut set = BatchCommandSet::new();

    set.execute(&mut conn).unwrap();

    assert!(set.is_empty());
    assert!(!conn.is_open());
}

#[test]
fn test_mixed_batch_over_tcp() {
    let server = FakeServer::start();
    let mut conn = TcpConnection::new(server.addr(), Duration::from_secs(2));

    let mut set: BatchCommandSet = vec![
        BatchCommand::hset("user:1", "name", "ada"),
        BatchCommand::hincrby("user:1", "visits", 3),
        BatchCommand::hmget("user:1", ["name", "visits", "missing"]),
        BatchCommand::new("NOSUCH", Vec::new()),
        BatchCommand::hdel("user:1", ["name"]),
    ]
    .into();

    set.execute(&mut conn).unwrap();

    assert_eq!(set[0].reply(), Some(&Reply::Integer(1)));
    assert_eq!(set[1].reply(), Some(&Reply::Integer(3)));
    assert_eq!(
        set[2].reply().cloned().unwrap().into_bytes_list().unwrap(),
        vec![Some(Bytes::from("ada")), Some(Bytes::from("3")), None]
    );
    assert!(set[3].error().unwrap().contains("unknown command"));
    assert_eq!(set[4].reply(), Some(&Reply::Integer(1)));

    // All five went out before any reply was read, in order
    let names: Vec<Vec<u8>> = server.commands().into_iter().map(|c| c[0].clone()).collect();
    assert_eq!(
        names,
        vec![
            b"HSET".to_vec(),
            b"HINCRBY".to_vec(),
            b"HMGET".to_vec(),
            b"NOSUCH".to_vec(),
            b"HDEL".to_vec()
        ]
    );
}

#[test]
fn test_server_hangup_mid_batch_over_tcp() {
    let server = FakeServer::start_with_limit(Some(2));
    let mut conn = TcpConnection::new(server.addr(), Duration::from_secs(2));
    let mut commands: Vec<_> = (0..3).map(|i| BatchCommand::set(format!("k{}", i), "v")).collect();

    let err = execute_batch(&mut commands, &mut conn).unwrap_err();

    assert!(err.is_connection_error());
    assert!(conn.is_closed());
    assert!(commands[0].is_executed());
    assert!(commands[1].is_executed());
    assert!(!commands[2].is_executed());
}
