use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read records from {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid layout config: {0}")]
    Config(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("PDF error: {0}")]
    Pdf(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// Wrap an I/O error with the path it happened on.
    pub(crate) fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
        move |e| Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
    }
}
