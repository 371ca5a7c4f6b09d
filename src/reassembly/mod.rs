//! Shard download and reassembly
//!
//! Shards are downloaded one after another into a private temporary
//! directory next to the output file, then folded in order into a single
//! gzip stream: each shard is bzip2-decoded in fixed-size reads and every
//! block goes straight into the encoder, so neither a whole shard nor the
//! corpus is ever held in memory.
//!
//! Concatenation order is the order of the shard list. The document order of
//! the corpus is reconstructed purely from that order.

use crate::client::{ArchiveClient, DownloadFailure};
use crate::error::ReassemblyError;
use crate::progress::ProgressReporter;
use crate::types::ShardReference;
use bzip2::read::MultiBzDecoder;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

/// Default read size when decompressing a shard
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Transient state of one reassembly
///
/// Tracks every temporary shard path created so far so that a failure can
/// remove exactly those files, and the uncompressed bytes written to the
/// output so far.
#[derive(Clone, Debug)]
pub struct ReassemblyJob {
    temp_dir: PathBuf,
    shard_paths: Vec<PathBuf>,
    output_path: PathBuf,
    bytes_written: u64,
}

impl ReassemblyJob {
    /// Start a job writing to `output_path`
    pub fn new(output_path: &Path) -> Self {
        Self {
            temp_dir: Self::temp_dir_for(output_path),
            shard_paths: Vec::new(),
            output_path: output_path.to_path_buf(),
            bytes_written: 0,
        }
    }

    /// Working directory for an output path: `.temp_{stem}` beside it
    ///
    /// Deterministic, so a directory left behind by an interrupted run is
    /// reused rather than duplicated.
    pub fn temp_dir_for(output_path: &Path) -> PathBuf {
        let stem = output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        let parent = output_path.parent().unwrap_or_else(|| Path::new(""));
        parent.join(format!(".temp_{stem}"))
    }

    /// Decode each bzip2 shard in order into one gzip output file
    ///
    /// Blocks are read `chunk_size` bytes at a time and written straight into
    /// the encoder; each shard file is deleted as soon as its content has been
    /// written. `bytes_written` is kept current so an error reports how far
    /// the job got. Returns the total number of decompressed bytes.
    fn fold(
        &mut self,
        chunk_size: usize,
        progress: &dyn ProgressReporter,
    ) -> Result<u64, ReassemblyError> {
        self.bytes_written = 0;
        let file = File::create(&self.output_path).map_err(|e| self.output_error(e))?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        let mut buf = vec![0u8; chunk_size.max(1)];
        let total = self.shard_paths.len();
        progress.start("processing shards", None);

        for index in 1..=total {
            let path = self.shard_paths[index - 1].clone();
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            progress.message(&format!("[{index}/{total}] processing {name}"));

            let shard = File::open(&path).map_err(|e| self.stream_error(index, e))?;
            let mut decoder = MultiBzDecoder::new(BufReader::new(shard));

            loop {
                let n = match decoder.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(self.stream_error(index, e)),
                };
                encoder
                    .write_all(&buf[..n])
                    .map_err(|e| self.output_error(e))?;
                self.bytes_written += n as u64;
                progress.update(self.bytes_written, None);
            }

            drop(decoder);
            std::fs::remove_file(&path).map_err(|e| self.stream_error(index, e))?;
            debug!(?path, index, total, bytes = self.bytes_written, "folded shard");
        }

        let mut inner = encoder.finish().map_err(|e| self.output_error(e))?;
        inner.flush().map_err(|e| self.output_error(e))?;
        progress.finish(&format!("processed {total} shard(s)"));

        Ok(self.bytes_written)
    }

    fn output_error(&self, source: std::io::Error) -> ReassemblyError {
        ReassemblyError::Output {
            path: self.output_path.clone(),
            bytes_written: self.bytes_written,
            source,
        }
    }

    fn stream_error(&self, index: usize, source: std::io::Error) -> ReassemblyError {
        ReassemblyError::Stream {
            path: self.shard_paths[index - 1].clone(),
            index,
            total: self.shard_paths.len(),
            bytes_written: self.bytes_written,
            source,
        }
    }

    /// Remove the (now empty) working directory after success
    async fn finish(&self) {
        if let Err(e) = tokio::fs::remove_dir(&self.temp_dir).await {
            warn!(path = ?self.temp_dir, error = %e, "failed to remove temporary directory");
        }
    }

    /// Remove every remaining shard file and try to remove the directory
    ///
    /// Directory removal errors are swallowed; the caller is already
    /// reporting the failure that got us here.
    async fn discard(&self) {
        for path in &self.shard_paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(?path, "removed temporary shard"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(?path, error = %e, "failed to remove temporary shard"),
            }
        }

        if let Err(e) = tokio::fs::remove_dir(&self.temp_dir).await {
            debug!(path = ?self.temp_dir, error = %e, "temporary directory left in place");
        }
    }
}

/// Downloads a shard set and folds it into one gzip file
pub struct ShardReassembler<'a> {
    client: &'a ArchiveClient,
    progress: Arc<dyn ProgressReporter>,
    chunk_size: usize,
}

impl<'a> ShardReassembler<'a> {
    /// Create a reassembler reporting to `progress`
    pub fn new(client: &'a ArchiveClient, progress: Arc<dyn ProgressReporter>) -> Self {
        Self {
            client,
            progress,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the decompression read size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Download `shards` in order and write their concatenated content to
    /// `output_path` as gzip
    ///
    /// Returns the number of uncompressed bytes written.
    ///
    /// # Errors
    /// Returns a [`ReassemblyError`] if the shard list is empty or any
    /// download or stream step fails. All temporary shard files are removed
    /// before the error is returned; a partially written output file is left
    /// in place and must be treated as incomplete.
    pub async fn reassemble(
        &self,
        shards: &[ShardReference],
        output_path: &Path,
    ) -> Result<u64, ReassemblyError> {
        if shards.is_empty() {
            return Err(ReassemblyError::NoShards);
        }

        let mut job = ReassemblyJob::new(output_path);
        tokio::fs::create_dir_all(&job.temp_dir)
            .await
            .map_err(|source| ReassemblyError::TempDir {
                path: job.temp_dir.clone(),
                source,
            })?;

        let downloaded = self.download_all(&mut job, shards).await;
        let (job, result) = match downloaded {
            Ok(()) => self.fold(job).await,
            Err(e) => (job, Err(e)),
        };

        match result {
            Ok(total) => {
                job.finish().await;
                info!(
                    output = ?job.output_path,
                    bytes = total,
                    "created corpus ({:.1} MB uncompressed)",
                    total as f64 / (1024.0 * 1024.0)
                );
                Ok(total)
            }
            Err(e) => {
                self.progress.finish_with_error(&e.to_string());
                job.discard().await;
                Err(e)
            }
        }
    }

    async fn download_all(
        &self,
        job: &mut ReassemblyJob,
        shards: &[ShardReference],
    ) -> Result<(), ReassemblyError> {
        let total = shards.len();
        info!(count = total, "downloading shard files");

        for (i, shard) in shards.iter().enumerate() {
            let index = i + 1;
            let dest = job.temp_dir.join(shard.filename());
            info!(index, total, url = %shard, "downloading shard");

            job.shard_paths.push(dest.clone());
            self.client
                .download_to_file(shard.url(), &dest, self.progress.as_ref())
                .await
                .map_err(|failure| match failure {
                    DownloadFailure::Fetch(source) => ReassemblyError::Download {
                        url: shard.to_string(),
                        index,
                        total,
                        source,
                    },
                    DownloadFailure::Io(source) => ReassemblyError::Store {
                        path: dest.clone(),
                        index,
                        total,
                        source,
                    },
                })?;
        }

        Ok(())
    }

    /// Run the blocking fold off the async runtime, handing the job back
    async fn fold(&self, job: ReassemblyJob) -> (ReassemblyJob, Result<u64, ReassemblyError>) {
        info!("concatenating and compressing shards");

        let fallback = job.clone();
        let chunk_size = self.chunk_size;
        let progress = Arc::clone(&self.progress);

        let folded = spawn_blocking(move || {
            let mut job = job;
            let result = job.fold(chunk_size, progress.as_ref());
            (job, result)
        })
        .await;

        match folded {
            Ok(done) => done,
            Err(e) => (fallback, Err(ReassemblyError::Aborted(e.to_string()))),
        }
    }
}
