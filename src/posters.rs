use std::{
    io,
    path::{Component, Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum PosterError {
    #[error("poster {0:?} not found")]
    NotFound(String),
    #[error("poster storage i/o: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug)]
pub struct Poster {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Poster images on local disk, keyed by their uploaded filename.
///
/// Saving a name that already exists replaces the old file.
#[derive(Clone, Debug)]
pub struct PosterStore {
    dir: PathBuf,
}

impl PosterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), PosterError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub async fn save(&self, bytes: &[u8], filename: &str) -> Result<PathBuf, PosterError> {
        if !is_plain_filename(filename) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to write poster outside upload dir: {filename:?}"),
            )
            .into());
        }
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), size = bytes.len(), "poster saved");
        Ok(path)
    }

    pub async fn read(&self, filename: &str) -> Result<Poster, PosterError> {
        if !is_plain_filename(filename) {
            return Err(PosterError::NotFound(filename.to_string()));
        }
        let bytes = match tokio::fs::read(self.dir.join(filename)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(PosterError::NotFound(filename.to_string()));
            },
            Err(err) => return Err(err.into()),
        };
        let content_type = infer::get(&bytes).map_or("application/octet-stream", |k| k.mime_type());
        Ok(Poster { bytes, content_type })
    }
}

/// True when `name` is exactly one normal path component.
pub fn is_plain_filename(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(first)), None) if first == name
    ) && !name.contains(['/', '\\'])
}
