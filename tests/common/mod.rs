#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use hostpulse::system::MetricError;
use hostpulse::system::command::CommandRunner;

pub const DF_OUTPUT: &str = "Filesystem     1M-blocks   Used Available Use% Mounted on\n\
                             overlay           467464 201234    242390  46% /\n";

pub const MEMINFO: &str = "MemTotal:       16000000 kB\n\
                           MemFree:         1000000 kB\n\
                           MemAvailable:    8000000 kB\n";

pub enum Reply {
    Output(&'static str),
    Fail,
    Panic,
}

/// Stands in for `df`; records every invocation.
pub struct ScriptedRunner {
    reply: Reply,
    pub calls: AtomicUsize,
    pub last_args: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new(reply: Reply) -> Self {
        ScriptedRunner {
            reply,
            calls: AtomicUsize::new(0),
            last_args: Mutex::new(Vec::new()),
        }
    }
}

impl CommandRunner for ScriptedRunner {
    fn run<'a>(&'a self, program: &'a str, args: &'a [&'a str]) -> BoxFuture<'a, Result<String, MetricError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut recorded = vec![program.to_string()];
        recorded.extend(args.iter().map(|a| a.to_string()));
        *self.last_args.lock().unwrap() = recorded;

        Box::pin(async move {
            match self.reply {
                Reply::Output(out) => Ok(out.to_string()),
                Reply::Fail => Err(MetricError::Timeout {
                    program: program.to_string(),
                    timeout: std::time::Duration::from_secs(5),
                }),
                Reply::Panic => panic!("runner exploded"),
            }
        })
    }
}

/// A file under the temp dir removed on drop.
pub struct TempFile(pub PathBuf);

impl TempFile {
    pub fn new(name: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("hostpulse_{}_{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        TempFile(path)
    }

    pub fn rewrite(&self, contents: &str) {
        std::fs::write(&self.0, contents).unwrap();
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
