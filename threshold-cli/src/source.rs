use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

use threshold_engine::{DeckError, DeckList, DeckSource};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read deck from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Deck(#[from] DeckError),
}

/// Deck read from a JSON file, or stdin when the path is `-`.
#[derive(Debug, Clone)]
pub struct JsonFileDeckSource {
    path: PathBuf,
}

impl JsonFileDeckSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_stdin(&self) -> bool {
        self.path.as_os_str() == "-"
    }

    fn read_to_string(&self) -> Result<String, SourceError> {
        let read_error = |source| SourceError::Read {
            path: self.path.display().to_string(),
            source,
        };
        if self.is_stdin() {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(read_error)?;
            Ok(buffer)
        } else {
            std::fs::read_to_string(&self.path).map_err(read_error)
        }
    }
}

impl DeckSource for JsonFileDeckSource {
    type Error = SourceError;

    fn load_deck(&self) -> Result<DeckList, Self::Error> {
        let json = self.read_to_string()?;
        let deck = DeckList::from_json(&json)?;
        log::debug!(
            "loaded {} cards from {}",
            deck.cards.len(),
            self.path.display()
        );
        Ok(deck)
    }
}
