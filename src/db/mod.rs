// src/db/mod.rs
//
// Database module
//
// Provides:
// - Connection pooling
// - Schema migrations
// - Timestamp encoding shared by the repositories

pub mod connection;
pub mod migrations;
pub mod timestamps;

pub use connection::{
    create_connection_pool, create_pool_at, get_connection, get_database_path, ConnectionPool,
    PooledConn,
};

pub use migrations::initialize_database;

pub use timestamps::{from_db_timestamp, to_db_timestamp};
