//! Quote dataset
//!
//! The dataset is compiled into the binary. A JSON file with the same shape
//! can replace it at startup and again on every scheduled refresh.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rand::RngExt;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::prelude::*;

const EMBEDDED_QUOTES: &str = include_str!("data/quotes.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
	pub quote: Box<str>,
	pub character: Box<str>,
	pub anime: Box<str>,
}

impl std::fmt::Display for Quote {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "Quote: {}", self.quote)?;
		writeln!(f, "Character: {}", self.character)?;
		write!(f, "Anime: {}", self.anime)
	}
}

fn parse_quotes(json: &str) -> ClResult<Vec<Quote>> {
	let quotes: Vec<Quote> = serde_json::from_str(json)?;
	if quotes.is_empty() {
		return Err(Error::ValidationError("quote dataset is empty".into()));
	}
	Ok(quotes)
}

/// In-memory quote dataset, replaced wholesale on reload
#[derive(Debug)]
pub struct QuoteStore {
	quotes: RwLock<Arc<Vec<Quote>>>,
}

impl QuoteStore {
	pub fn new(quotes: Vec<Quote>) -> ClResult<Self> {
		if quotes.is_empty() {
			return Err(Error::ValidationError("quote dataset is empty".into()));
		}
		Ok(Self { quotes: RwLock::new(Arc::new(quotes)) })
	}

	pub fn embedded() -> ClResult<Self> {
		Self::new(parse_quotes(EMBEDDED_QUOTES)?)
	}

	pub async fn from_file(path: &Path) -> ClResult<Self> {
		let json = tokio::fs::read_to_string(path).await?;
		Self::new(parse_quotes(&json)?)
	}

	pub async fn all(&self) -> Arc<Vec<Quote>> {
		self.quotes.read().await.clone()
	}

	pub async fn len(&self) -> usize {
		self.quotes.read().await.len()
	}

	pub async fn random(&self) -> Option<Quote> {
		let quotes = self.all().await;
		if quotes.is_empty() {
			return None;
		}
		let idx = rand::rng().random_range(0..quotes.len());
		quotes.get(idx).cloned()
	}

	/// Replaces the dataset with the contents of `path`.
	/// On error the current dataset stays in place.
	pub async fn reload_from(&self, path: &Path) -> ClResult<usize> {
		let json = tokio::fs::read_to_string(path).await?;
		let quotes = parse_quotes(&json)?;
		let count = quotes.len();
		*self.quotes.write().await = Arc::new(quotes);
		Ok(count)
	}
}

/// Source of fresh quote data for the weekly refresh task
#[async_trait]
pub trait DatasetRefresher: std::fmt::Debug + Send + Sync {
	/// Returns the number of quotes now loaded
	async fn refresh(&self) -> ClResult<usize>;
}

/// Re-reads the configured quotes file
#[derive(Debug)]
pub struct QuoteFileRefresher {
	store: Arc<QuoteStore>,
	path: Box<Path>,
}

impl QuoteFileRefresher {
	pub fn new(store: Arc<QuoteStore>, path: impl Into<Box<Path>>) -> Self {
		Self { store, path: path.into() }
	}
}

#[async_trait]
impl DatasetRefresher for QuoteFileRefresher {
	async fn refresh(&self) -> ClResult<usize> {
		let count = self.store.reload_from(&self.path).await?;
		info!("Reloaded {} quotes from {}", count, self.path.display());
		Ok(count)
	}
}


// vim: ts=4
