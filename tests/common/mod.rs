#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use service_tools::config::{CacheConfig, LoggerConfig};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Logger settings writing only to `dir`.
pub fn logger_config(dir: &Path) -> LoggerConfig {
    LoggerConfig {
        dir: dir.to_path_buf(),
        log_in_console: false,
        ..LoggerConfig::default()
    }
}

/// Concatenated contents of every regular `.log` file in `dir`.
pub fn read_logs(dir: &Path) -> String {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "log")
                && fs::symlink_metadata(path).unwrap().is_file()
        })
        .collect();
    paths.sort();

    paths
        .iter()
        .map(|path| fs::read_to_string(path).unwrap())
        .collect()
}

/// Cache settings for the Redis instance named by `TEST_REDIS_ADDR`.
pub fn redis_config() -> CacheConfig {
    CacheConfig {
        addr: std::env::var("TEST_REDIS_ADDR").unwrap_or_else(|_| "127.0.0.1:6379".to_string()),
        password: std::env::var("TEST_REDIS_PASSWORD").unwrap_or_default(),
        db: std::env::var("TEST_REDIS_DB")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub name: String,
    pub active: bool,
    pub score: f64,
    pub tags: Vec<String>,
    pub manager_id: Option<u64>,
}

pub fn sample_profile() -> Profile {
    Profile {
        id: 7,
        name: "Grace".to_string(),
        active: true,
        score: 98.5,
        tags: vec!["navy".to_string(), "cobol".to_string()],
        manager_id: None,
    }
}

/// Unique key per test run so parallel runs do not collide.
pub fn unique_key(name: &str) -> String {
    format!(
        "service-tools:test:{}:{}:{}",
        name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

type Store = Arc<Mutex<HashMap<Vec<u8>, (Vec<u8>, Option<Instant>)>>>;

/// Minimal RESP2 server on a loopback port.
///
/// Answers PING, SELECT, CLIENT, SET, SETEX, PSETEX, GET and DEL, honors
/// expirations, and rejects a zero expire time the way Redis does. Every
/// received command is recorded.
pub struct RedisStub {
    addr: String,
    commands: Arc<Mutex<Vec<Vec<String>>>>,
}

impl RedisStub {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let store: Store = Arc::default();
        let commands: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();

        let log = Arc::clone(&commands);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&store), Arc::clone(&log)));
            }
        });

        Self { addr, commands }
    }

    pub fn config(&self) -> CacheConfig {
        CacheConfig {
            addr: self.addr.clone(),
            password: String::new(),
            db: 0,
        }
    }

    /// Received commands whose name matches `name`, arguments included.
    pub fn commands_named(&self, name: &str) -> Vec<Vec<String>> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .filter(|cmd| cmd.first().is_some_and(|n| n.eq_ignore_ascii_case(name)))
            .cloned()
            .collect()
    }
}

async fn serve(stream: TcpStream, store: Store, log: Arc<Mutex<Vec<Vec<String>>>>) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    while let Some(args) = read_command(&mut reader).await {
        log.lock().unwrap().push(
            args.iter()
                .map(|arg| String::from_utf8_lossy(arg).into_owned())
                .collect(),
        );
        let reply = execute(&args, &store);
        if write.write_all(&reply).await.is_err() {
            break;
        }
    }
}

async fn read_command<R: AsyncBufRead + Unpin>(reader: &mut R) -> Option<Vec<Vec<u8>>> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let count: usize = line.trim_end().strip_prefix('*')?.parse().ok()?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await.ok()?;
        let len: usize = line.trim_end().strip_prefix('$')?.parse().ok()?;
        let mut buf = vec![0; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(buf);
    }

    Some(args)
}

fn execute(args: &[Vec<u8>], store: &Store) -> Vec<u8> {
    let name = String::from_utf8_lossy(&args[0]).to_uppercase();
    let mut store = store.lock().unwrap();
    let now = Instant::now();

    match (name.as_str(), args.len()) {
        ("PING", 1) => b"+PONG\r\n".to_vec(),
        ("SELECT", 2) | ("CLIENT", _) => b"+OK\r\n".to_vec(),
        ("SET", 3) => {
            store.insert(args[1].clone(), (args[2].clone(), None));
            b"+OK\r\n".to_vec()
        }
        ("SETEX", 4) | ("PSETEX", 4) => {
            let amount: u64 = String::from_utf8_lossy(&args[2]).parse().unwrap_or(0);
            if amount == 0 {
                return format!(
                    "-ERR invalid expire time in '{}' command\r\n",
                    name.to_lowercase()
                )
                .into_bytes();
            }
            let ttl = if name == "SETEX" {
                Duration::from_secs(amount)
            } else {
                Duration::from_millis(amount)
            };
            store.insert(args[1].clone(), (args[3].clone(), Some(now + ttl)));
            b"+OK\r\n".to_vec()
        }
        ("GET", 2) => match store.get(&args[1]) {
            Some((value, deadline)) if deadline.is_none_or(|d| now < d) => {
                let mut reply = format!("${}\r\n", value.len()).into_bytes();
                reply.extend_from_slice(value);
                reply.extend_from_slice(b"\r\n");
                reply
            }
            _ => b"$-1\r\n".to_vec(),
        },
        ("DEL", n) if n > 1 => {
            let removed = args[1..]
                .iter()
                .filter_map(|key| store.remove(key))
                .filter(|(_, deadline)| deadline.is_none_or(|d| now < d))
                .count();
            format!(":{removed}\r\n").into_bytes()
        }
        _ => format!("-ERR unknown command '{name}'\r\n").into_bytes(),
    }
}
