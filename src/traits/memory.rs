//! Instrument memory: mass storage file transfer and state save/recall.
//!
//! Uploads use an IEEE 488.2 definite-length block: the `:MMEM:DATA` header
//! carries the target name and the byte count, and the payload follows as a
//! separate raw write. Complete instrument settings are stored in numbered
//! state memories with `*SAV` and restored with `*RCL`.

use crate::driver::SmDriver;
use crate::error::{DriverError, DriverResult};
use crate::model::Capability;
use crate::scpi;
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Memory capability.
#[async_trait]
pub trait MassMemory: Send {
    /// Copy a local file into instrument mass memory.
    ///
    /// `destination` is a directory prefix and is concatenated verbatim with
    /// the file name of `source`, so it should end with a separator.
    async fn write_file_to_instrument(
        &mut self,
        source: &Path,
        destination: &str,
    ) -> DriverResult<()>;

    /// Not supported; always fails with `NotImplemented`.
    async fn read_file_from_instrument(
        &mut self,
        source: &str,
        destination: &Path,
    ) -> DriverResult<()>;

    /// Delete a file from instrument mass memory.
    async fn delete_file_from_instrument(&mut self, path: &str) -> DriverResult<()>;

    /// Store the current instrument settings in state memory `index` (`*SAV`).
    async fn save_state(&mut self, index: usize) -> DriverResult<()>;

    /// Restore settings from state memory `index` (`*RCL`). Every cache entry
    /// goes stale, since the instrument changes its settings on its own.
    async fn recall_state(&mut self, index: usize) -> DriverResult<()>;
}

impl SmDriver {
    fn check_memory_index(&self, index: usize) -> DriverResult<()> {
        self.require(Capability::Memory)?;
        if index >= self.profile().memory_size {
            return Err(DriverError::ValueNotSupported {
                attribute: "memory_index".to_string(),
                value: index.to_string(),
            });
        }
        Ok(())
    }
}

/// Build the `:MMEM:DATA` header for a payload of `len` bytes.
fn data_command(destination: &str, file_name: &str, len: usize) -> String {
    format!(
        ":MMEM:DATA {} ,{}",
        scpi::quote(&format!("{destination}{file_name}")),
        scpi::block_header(len)
    )
}

#[async_trait]
impl MassMemory for SmDriver {
    async fn write_file_to_instrument(
        &mut self,
        source: &Path,
        destination: &str,
    ) -> DriverResult<()> {
        self.require(Capability::Memory)?;
        let data = tokio::fs::read(source).await?;
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.write(&data_command(destination, &file_name, data.len()))
            .await?;
        self.write_raw(&data).await?;
        info!(
            "Uploaded {} ({} bytes) to {}{}",
            source.display(),
            data.len(),
            destination,
            file_name
        );
        Ok(())
    }

    async fn read_file_from_instrument(
        &mut self,
        _source: &str,
        _destination: &Path,
    ) -> DriverResult<()> {
        Err(DriverError::NotImplemented(
            "read_file_from_instrument".to_string(),
        ))
    }

    async fn delete_file_from_instrument(&mut self, path: &str) -> DriverResult<()> {
        self.require(Capability::Memory)?;
        self.write(&format!(":MMEM:DEL {}", scpi::quote(path))).await
    }

    async fn save_state(&mut self, index: usize) -> DriverResult<()> {
        self.check_memory_index(index)?;
        self.write(&format!("*SAV {index}")).await
    }

    async fn recall_state(&mut self, index: usize) -> DriverResult<()> {
        self.check_memory_index(index)?;
        self.write(&format!("*RCL {index}")).await?;
        self.invalidate_cache();
        info!("Recalled instrument state {}", index);
        Ok(())
    }
}
