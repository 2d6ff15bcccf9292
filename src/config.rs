//! C11 — ambient configuration. Hand-rolled argv loop with environment
//! fallbacks, matching the same shape as the original instance-tag parser
//! this was grown from: CLI/config parsing stays outside the hot path, but
//! `engine_demo` still needs somewhere to get its sizing from.

use crate::types::{MAX_SYMBOLS, N_ORDERS, RING_CAPACITY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub instance_name: String,
    pub lanes: u8,
    pub pool_size: u32,
    pub queue_capacity: u32,
    pub symbol_capacity: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            instance_name: "DEFAULT".to_string(),
            lanes: 2,
            pool_size: N_ORDERS as u32,
            queue_capacity: RING_CAPACITY as u32,
            symbol_capacity: MAX_SYMBOLS as u32,
        }
    }
}

/// Parses `--name`/`--tag`, `--lanes`, `--pool-size`, `--queue-capacity`,
/// `--symbol-capacity` from argv, falling back to `INST_NAME`, `POOL_SIZE`,
/// `QUEUE_CAPACITY` environment variables, then to the defaults above.
pub fn get_config() -> Result<EngineConfig, String> {
    parse_args(std::env::args().skip(1))
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<EngineConfig, String> {
    let args: Vec<String> = args.collect();
    let mut instance_name = None;
    let mut lanes_str = None;
    let mut pool_size_str = None;
    let mut queue_capacity_str = None;
    let mut symbol_capacity_str = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--name" | "--tag" => {
                if i + 1 < args.len() {
                    instance_name = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--lanes" => {
                if i + 1 < args.len() {
                    lanes_str = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--pool-size" => {
                if i + 1 < args.len() {
                    pool_size_str = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--queue-capacity" => {
                if i + 1 < args.len() {
                    queue_capacity_str = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--symbol-capacity" => {
                if i + 1 < args.len() {
                    symbol_capacity_str = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    let defaults = EngineConfig::default();

    let instance_name = instance_name
        .or_else(|| std::env::var("INST_NAME").ok())
        .unwrap_or(defaults.instance_name);
    if instance_name.len() > 16 {
        return Err(format!(
            "instance tag '{instance_name}' exceeds maximum length of 16 characters"
        ));
    }

    let lanes = match lanes_str {
        Some(s) => {
            let n: u8 = s
                .parse()
                .map_err(|_| format!("invalid --lanes value '{s}': must be 1 or 2"))?;
            if n != 1 && n != 2 {
                return Err(format!("invalid --lanes value '{n}': must be 1 or 2"));
            }
            n
        }
        None => defaults.lanes,
    };

    let pool_size = resolve_size(pool_size_str, "POOL_SIZE", defaults.pool_size)?;
    let queue_capacity = resolve_size(queue_capacity_str, "QUEUE_CAPACITY", defaults.queue_capacity)?;
    let symbol_capacity = match symbol_capacity_str {
        Some(s) => parse_human_readable_u32(&s)
            .map_err(|e| format!("invalid --symbol-capacity value '{s}': {e}"))?,
        None => defaults.symbol_capacity,
    };

    Ok(EngineConfig {
        instance_name,
        lanes,
        pool_size,
        queue_capacity,
        symbol_capacity,
    })
}

fn resolve_size(arg: Option<String>, env_var: &str, default: u32) -> Result<u32, String> {
    let raw = arg.or_else(|| std::env::var(env_var).ok());
    match raw {
        Some(s) => parse_human_readable_u32(&s).map_err(|e| format!("invalid value '{s}': {e}")),
        None => Ok(default),
    }
}

/// Parses a bare integer or one with a `k`/`m`/`g` (case-insensitive) size
/// suffix, e.g. `"20k"` -> `20_000`. The only place this crate needs
/// human-readable sizes is argv/env parsing, so it lives here rather than
/// in its own module.
fn parse_human_readable_u32(s: &str) -> Result<u32, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("value cannot be empty".to_string());
    }
    let (digits, multiplier) = match trimmed.chars().next_back() {
        Some(c) if c.is_ascii_alphabetic() => {
            let multiplier: u64 = match c.to_ascii_lowercase() {
                'k' => 1_000,
                'm' => 1_000_000,
                'g' => 1_000_000_000,
                other => return Err(format!("unsupported unit '{other}'")),
            };
            (&trimmed[..trimmed.len() - c.len_utf8()], multiplier)
        }
        _ => (trimmed, 1),
    };
    let base: u64 = digits
        .parse()
        .map_err(|_| format!("'{digits}' is not a valid number"))?;
    u32::try_from(base.saturating_mul(multiplier))
        .map_err(|_| format!("'{s}' overflows a u32"))
}
