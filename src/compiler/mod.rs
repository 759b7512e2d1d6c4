//! Contract compiler capability and the compiled code cache
//!
//! Compilation itself is provided by the caller through [`Compiler`]. The
//! produced code is a BoC that is parsed into a code cell and otherwise
//! treated as opaque.


use crate::tvm::{Cell, EncodingError, deserialize_boc};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error;

/// Result of one compiler invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileOutcome {
    Ok { code_bytes: Vec<u8> },
    Error { message: String },
}

/// Turns a set of named sources into contract code
pub trait Compiler: Send + Sync {
    fn compile(&self, sources: &BTreeMap<String, String>, entry_point: &str) -> CompileOutcome;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Compilation failed: {0}")]
    Compilation(String),
    #[error("Compiler produced invalid code: {0}")]
    InvalidCode(#[from] EncodingError),
}

/// Named sources plus the entry point handed to the compiler
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
    pub sources: BTreeMap<String, String>,
    pub entry_point: String,
}

impl SourceSet {
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            sources: BTreeMap::new(),
            entry_point: entry_point.into(),
        }
    }

    pub fn with_source(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.sources.insert(name.into(), text.into());
        self
    }

    /// SHA-256 over the entry point and every (name, text) pair in name order
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
        };

        field(self.entry_point.as_bytes());
        for (name, text) in &self.sources {
            field(name.as_bytes());
            field(text.as_bytes());
        }

        hasher.finalize().into()
    }
}

/// Process-wide memo of compiled code keyed by [`SourceSet::digest`]
///
/// A successful compilation is stored and reused for the same source set.
/// A failed one is not stored, so the next request compiles again.
#[derive(Debug, Default)]
pub struct CodeCache {
    entries: Mutex<HashMap<[u8; 32], Arc<Cell>>>,
}

impl CodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared instance for callers that do not inject their own
    pub fn global() -> &'static CodeCache {
        static GLOBAL: OnceLock<CodeCache> = OnceLock::new();
        GLOBAL.get_or_init(CodeCache::new)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<[u8; 32], Arc<Cell>>> {
        // Entries are inserted whole, a poisoned map is still consistent
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns the cached code cell or compiles and caches it
    ///
    /// The lock is held across compilation, so concurrent requests for any
    /// source set compile at most once.
    pub fn get_or_compile(
        &self,
        compiler: &dyn Compiler,
        sources: &SourceSet,
    ) -> Result<Arc<Cell>, CompileError> {
        let key = sources.digest();
        let mut entries = self.lock();

        if let Some(code) = entries.get(&key) {
            log::debug!("Code cache hit for {}", hex::encode(key));
            return Ok(code.clone());
        }

        log::debug!(
            "Compiling {} ({} sources)",
            sources.entry_point,
            sources.sources.len()
        );
        let code = match compiler.compile(&sources.sources, &sources.entry_point) {
            CompileOutcome::Ok { code_bytes } => deserialize_boc(&code_bytes)?,
            CompileOutcome::Error { message } => {
                log::warn!("Compilation of {} failed: {}", sources.entry_point, message);
                return Err(CompileError::Compilation(message));
            }
        };

        entries.insert(key, code.clone());
        Ok(code)
    }
}
