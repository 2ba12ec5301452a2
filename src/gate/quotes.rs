use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("failed to read quotes from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no quotes to serve")]
    Empty,
}

/// Supplier of the reward handed out for an accepted proof.
pub trait QuoteStore: Send + Sync {
    fn next(&self) -> &str;
}

/// Preloaded, non-empty list of quotes; each call picks one at random.
#[derive(Debug, Clone)]
pub struct QuoteBook {
    quotes: Vec<String>,
}

impl QuoteBook {
    /// Build from lines, skipping blank ones.
    pub fn from_lines<I, S>(lines: I) -> Result<Self, QuoteError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let quotes: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().trim_end().to_owned())
            .filter(|line| !line.trim().is_empty())
            .collect();
        if quotes.is_empty() {
            return Err(QuoteError::Empty);
        }
        Ok(Self { quotes })
    }

    /// Load one quote per line from a text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuoteError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| QuoteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_lines(text.lines())
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn quotes(&self) -> &[String] {
        &self.quotes
    }
}

impl QuoteStore for QuoteBook {
    fn next(&self) -> &str {
        let idx = rand::thread_rng().gen_range(0..self.quotes.len());
        &self.quotes[idx]
    }
}
