//! Configuration for the log HTTP server.

use std::time::Duration;

use clap::Parser;
use common::StorageConfig;
use common::storage::config::{
    AwsObjectStoreConfig, LocalObjectStoreConfig, ObjectStoreConfig, SlateDbStorageConfig,
};

use crate::{Config, RetryConfig};

/// CLI arguments for the log server.
#[derive(Debug, Parser)]
#[command(name = "commitlog")]
#[command(about = "Commit Log HTTP Server")]
pub struct CliArgs {
    /// HTTP server port.
    #[arg(long, default_value = "8080")]
    pub port: u16,

    /// Storage data directory path (for local storage).
    #[arg(long, default_value = ".data")]
    pub data_dir: String,

    /// Use in-memory storage (for testing).
    #[arg(long, default_value = "false")]
    pub in_memory: bool,

    /// S3 bucket name (enables S3 storage when set).
    #[arg(long)]
    pub s3_bucket: Option<String>,

    /// AWS region for S3 storage.
    #[arg(long, default_value = "us-east-1")]
    pub s3_region: String,

    /// Deadline in milliseconds for compare-and-swap retries.
    #[arg(long, default_value = "10000")]
    pub cas_timeout_ms: u64,
}

impl CliArgs {
    /// Convert CLI args to log configuration.
    pub fn to_log_config(&self) -> Config {
        let storage = if self.in_memory {
            StorageConfig::InMemory
        } else if let Some(bucket) = &self.s3_bucket {
            StorageConfig::SlateDb(SlateDbStorageConfig {
                object_store: ObjectStoreConfig::Aws(AwsObjectStoreConfig {
                    region: self.s3_region.clone(),
                    bucket: bucket.clone(),
                }),
                ..Default::default()
            })
        } else {
            StorageConfig::SlateDb(SlateDbStorageConfig {
                object_store: ObjectStoreConfig::Local(LocalObjectStoreConfig {
                    path: self.data_dir.clone(),
                }),
                ..Default::default()
            })
        };

        Config {
            storage,
            retry: RetryConfig {
                timeout: Duration::from_millis(self.cas_timeout_ms),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Configuration for the log HTTP server.
#[derive(Debug, Clone)]
pub struct LogServerConfig {
    /// HTTP server port.
    pub port: u16,
}

impl Default for LogServerConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl From<&CliArgs> for LogServerConfig {
    fn from(args: &CliArgs) -> Self {
        Self { port: args.port }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("commitlog").chain(args.iter().copied()))
    }

    #[test]
    fn should_apply_cli_defaults() {
        // given/when
        let args = parse(&[]);

        // then
        assert_eq!(args.port, 8080);
        assert_eq!(args.data_dir, ".data");
        assert!(!args.in_memory);
        assert_eq!(args.s3_bucket, None);
        assert_eq!(args.s3_region, "us-east-1");
        assert_eq!(args.cas_timeout_ms, 10_000);
    }

    #[test]
    fn should_create_in_memory_config() {
        // given
        let args = parse(&["--in-memory", "--port", "9090"]);

        // when
        let config = args.to_log_config();

        // then
        assert!(matches!(config.storage, StorageConfig::InMemory));
    }

    #[test]
    fn should_create_local_slatedb_config() {
        // given
        let args = parse(&["--data-dir", "/tmp/log-data"]);

        // when
        let config = args.to_log_config();

        // then
        match config.storage {
            StorageConfig::SlateDb(slate_config) => match slate_config.object_store {
                ObjectStoreConfig::Local(local_config) => {
                    assert_eq!(local_config.path, "/tmp/log-data");
                }
                _ => panic!("Expected Local object store"),
            },
            _ => panic!("Expected SlateDb config"),
        }
    }

    #[test]
    fn should_create_s3_slatedb_config() {
        // given
        let args = parse(&["--s3-bucket", "my-bucket", "--s3-region", "us-west-2"]);

        // when
        let config = args.to_log_config();

        // then
        match config.storage {
            StorageConfig::SlateDb(slate_config) => match slate_config.object_store {
                ObjectStoreConfig::Aws(aws_config) => {
                    assert_eq!(aws_config.bucket, "my-bucket");
                    assert_eq!(aws_config.region, "us-west-2");
                }
                _ => panic!("Expected Aws object store"),
            },
            _ => panic!("Expected SlateDb config"),
        }
    }

    #[test]
    fn should_carry_cas_timeout_into_retry_config() {
        // given
        let args = parse(&["--in-memory", "--cas-timeout-ms", "250"]);

        // when
        let config = args.to_log_config();

        // then
        assert_eq!(config.retry.timeout, Duration::from_millis(250));
        assert_eq!(config.retry.initial_backoff, Duration::from_millis(1));
        assert_eq!(config.start_offset, 1000);
        assert_eq!(config.poll_batch_size, 3);
    }

    #[test]
    fn should_create_server_config_from_cli_args() {
        // given
        let args = parse(&["--port", "9090"]);

        // when
        let server_config = LogServerConfig::from(&args);

        // then
        assert_eq!(server_config.port, 9090);
    }
}
