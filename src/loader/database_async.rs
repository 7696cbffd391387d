//! Async card catalog
//!
//! Loads every catalog file below a directory in parallel: a blocking task
//! walks the tree with jwalk and streams `*.json` paths to the runtime, and
//! each file is read and compiled in its own task as soon as it is found.

use crate::compiler::Compiler;
use crate::core::{name_key, Card};
use crate::loader::catalog::{compile_record, parse_records, CardCatalog, CompileReport};
use crate::{GameError, Result};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Cards and compile failures from one file
type Loaded = (Vec<Card>, CompileReport);

/// Catalog shared between tasks; clones share the cache
#[derive(Clone)]
pub struct AsyncCardCatalog {
    dir: PathBuf,
    compiler: Arc<Compiler>,
    cards: Arc<RwLock<FxHashMap<String, Card>>>,
    report: Arc<RwLock<CompileReport>>,
}

impl AsyncCardCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        AsyncCardCatalog {
            dir: dir.into(),
            compiler: Arc::new(Compiler::new()),
            cards: Arc::new(RwLock::new(FxHashMap::default())),
            report: Arc::new(RwLock::new(CompileReport::default())),
        }
    }

    /// Load every catalog file below the directory
    ///
    /// Returns the number of cards loaded and how long it took. The first
    /// unreadable file or malformed record fails the whole load.
    pub async fn eager_load(&self) -> Result<(usize, std::time::Duration)> {
        let start = Instant::now();
        let dir = self.dir.clone();
        if !dir.is_dir() {
            return Err(GameError::CatalogError(format!("catalog directory not found: {}", dir.display())));
        }

        let (path_tx, mut path_rx) = tokio::sync::mpsc::unbounded_channel::<PathBuf>();
        let walker = tokio::task::spawn_blocking(move || -> Result<()> {
            for entry in jwalk::WalkDir::new(&dir).sort(true) {
                let entry = entry.map_err(|e| GameError::CatalogError(format!("walking {}: {e}", dir.display())))?;
                let path = entry.path();
                if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
                    if path_tx.send(path).is_err() {
                        break;
                    }
                }
            }
            Ok(())
        });

        let mut tasks = Vec::new();
        while let Some(path) = path_rx.recv().await {
            let compiler = Arc::clone(&self.compiler);
            tasks.push(tokio::spawn(async move { Self::load_file(&compiler, path).await }));
        }
        walker.await??;

        let mut loaded = FxHashMap::default();
        let mut report = CompileReport::default();
        for task in tasks {
            let (cards, file_report) = task.await??;
            for card in cards {
                loaded.insert(card.name().key(), card);
            }
            report.merge(file_report);
        }

        let count = loaded.len();
        *self.cards.write().await = loaded;
        *self.report.write().await = report;
        Ok((count, start.elapsed()))
    }

    async fn load_file(compiler: &Compiler, path: PathBuf) -> Result<Loaded> {
        let json = tokio::fs::read_to_string(&path).await?;
        let records = parse_records(&json).map_err(|e| Self::in_file(&path, e))?;
        let mut cards = Vec::with_capacity(records.len());
        let mut report = CompileReport::default();
        for record in &records {
            let (card, card_report) = compile_record(compiler, record).map_err(|e| Self::in_file(&path, e))?;
            cards.push(card);
            report.merge(card_report);
        }
        Ok((cards, report))
    }

    fn in_file(path: &Path, error: GameError) -> GameError {
        GameError::CatalogError(format!("{}: {error}", path.display()))
    }

    pub async fn get(&self, name: &str) -> Option<Card> {
        self.cards.read().await.get(&name_key(name)).cloned()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.cards.read().await.contains_key(&name_key(name))
    }

    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }

    pub async fn report(&self) -> CompileReport {
        self.report.read().await.clone()
    }

    /// A synchronous catalog holding the loaded cards
    pub async fn snapshot(&self) -> CardCatalog {
        let mut catalog = CardCatalog::new();
        let cards = self.cards.read().await;
        let mut names: Vec<_> = cards.keys().collect();
        names.sort();
        for name in names {
            if let Some(card) = cards.get(name) {
                catalog.insert(card.clone(), CompileReport::default());
            }
        }
        catalog.insert_report(self.report.read().await.clone());
        catalog
    }
}
