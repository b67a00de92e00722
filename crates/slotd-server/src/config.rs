//! 服务端配置：监听地址、backlog 与缓冲池尺寸。
//!
//! # 设计动机（Why）
//! - 端口、backlog 与缓冲池容量原本都是编译期常量，且池容量隐式等于 backlog；
//!   这里把三者显式化，池容量缺省时仍沿用 backlog，但可以独立配置；
//! - 配置来自可选的 TOML 文件，缺省值与内置常量完全一致，未提供文件时行为不变。
//!
//! # 契约（What）
//! - 所有字段均有默认值，TOML 中未出现的键取默认；未知键视为错误，避免拼写错误被静默忽略；
//! - `port` 接受整数或字符串，最终以字符串形式交给地址解析，非数字服务名会在解析阶段失败；
//! - [`ServerConfig::validate`] 拒绝 backlog、池容量或槽位尺寸为 0 的配置。

use std::{fs, io, path::Path};

use serde::{Deserialize, Deserializer};
use slotd_pool::MAX_REQUEST_SIZE;
use thiserror::Error;

/// 默认监听端口。
pub const DEFAULT_PORT: &str = "8080";
/// 默认 backlog 深度。
pub const DEFAULT_BACKLOG: u32 = 10;

/// 监听与缓冲池配置。
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// 监听主机；缺省表示全部本地地址。
    pub host: Option<String>,
    /// 服务端口（字符串形式）。
    #[serde(deserialize_with = "deserialize_port")]
    pub port: String,
    pub backlog: u32,
    pub pool: PoolConfig,
}

/// 缓冲池尺寸配置。
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// 槽位数量；缺省时等于 backlog。
    pub capacity: Option<usize>,
    /// 单个槽位的字节数。
    pub slot_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT.to_owned(),
            backlog: DEFAULT_BACKLOG,
            pool: PoolConfig::default(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            slot_size: MAX_REQUEST_SIZE,
        }
    }
}

impl ServerConfig {
    /// 从 TOML 文本解析并校验配置。
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 读取并解析配置文件。
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// 实际使用的缓冲池容量。
    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity.unwrap_or(self.backlog as usize)
    }

    /// 校验数值约束。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backlog == 0 {
            return Err(ConfigError::Invalid {
                field: "backlog",
                reason: "must be at least 1",
            });
        }
        if i32::try_from(self.backlog).is_err() {
            return Err(ConfigError::Invalid {
                field: "backlog",
                reason: "exceeds the platform listen limit",
            });
        }
        if self.pool_capacity() == 0 {
            return Err(ConfigError::Invalid {
                field: "pool.capacity",
                reason: "must be at least 1",
            });
        }
        if self.pool.slot_size == 0 {
            return Err(ConfigError::Invalid {
                field: "pool.slot_size",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// 配置加载失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u64),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match PortRepr::deserialize(deserializer)? {
        PortRepr::Number(number) => number.to_string(),
        PortRepr::Text(text) => text,
    })
}
