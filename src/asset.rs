//! # Image Asset Module
//!
//! Un `ImageAsset` rappresenta una singola immagine, prima o dopo l'elaborazione:
//! nome, dimensione in byte e payload binario.
//!
//! Il payload è immutabile e condiviso tramite `Arc<[u8]>`: clonare un asset non
//! copia i byte, e la memoria viene liberata solo quando nessuna anteprima o
//! step di archiviazione lo referenzia più.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// A single image, either as submitted or as produced by the optimizer
#[derive(Clone, Serialize)]
pub struct ImageAsset {
    name: String,
    byte_size: u64,
    #[serde(skip)]
    data: Arc<[u8]>,
}

impl ImageAsset {
    /// Creates an asset; the byte size is taken from the payload.
    pub fn new(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            byte_size: data.len() as u64,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Shared handle to the payload, for moving the bytes into a blocking task.
    pub fn shared_data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("name", &self.name)
            .field("byte_size", &self.byte_size)
            .finish_non_exhaustive()
    }
}
