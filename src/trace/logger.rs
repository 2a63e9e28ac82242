use std::{fs::OpenOptions, io::Write, sync::Mutex};

use crate::trace::trace::TraceEvent;

/// JSONL trace sink. Never fails the caller: problems go to stderr.
pub struct TraceLogger {
    file: Option<Mutex<std::fs::File>>,
    memory: Option<Mutex<Vec<TraceEvent>>>,
}

impl TraceLogger {
    pub fn new(path: &str) -> Self {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path);

        match file {
            Ok(f) => Self {
                file: Some(Mutex::new(f)),
                memory: None,
            },
            Err(e) => {
                eprintln!("Warning: could not open trace file '{}': {}", path, e);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            file: None,
            memory: None,
        }
    }

    /// Keep events in memory instead of writing them out.
    pub fn in_memory() -> Self {
        Self {
            file: None,
            memory: Some(Mutex::new(Vec::new())),
        }
    }

    pub fn log(&self, event: TraceEvent) {
        if let Some(file_mutex) = &self.file {
            write_line(file_mutex, &event);
        }

        if let Some(memory) = &self.memory {
            match memory.lock() {
                Ok(mut events) => events.push(event),
                Err(e) => eprintln!("Warning: trace buffer lock poisoned: {}", e),
            }
        }
    }

    /// Events kept by an in-memory logger, oldest first.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.memory
            .as_ref()
            .and_then(|memory| memory.lock().ok().map(|events| events.clone()))
            .unwrap_or_default()
    }
}

fn write_line(file_mutex: &Mutex<std::fs::File>, event: &TraceEvent) {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Warning: failed to serialize trace event: {}", e);
            return;
        }
    };

    let mut file = match file_mutex.lock() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: trace logger lock poisoned: {}", e);
            return;
        }
    };

    if let Err(e) = writeln!(file, "{}", json) {
        eprintln!("Warning: failed to write trace event: {}", e);
    }
}
