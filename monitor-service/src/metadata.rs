//! CBOR metadata-trailer decoding.
//!
//! Solidity (and compatible toolchains) append a CBOR-encoded map to
//! deployed bytecode, followed by a two-byte big-endian length of that map.
//! This adapter strips the trailer and decodes it; the resulting JSON value
//! is handed back to the monitoring core unchanged.

use monitor_core::{
    CborMetadata, MetadataDecoder, MonitorError, Result, SourceAddress, SourceAddressFactory,
};

/// Length, in bytes, of the trailing length field itself.
const LENGTH_FIELD_SIZE: usize = 2;

/// [`MetadataDecoder`] + [`SourceAddressFactory`] pair grounded in the
/// standard Solidity metadata trailer format.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborTrailerDecoder;

impl CborTrailerDecoder {
    /// Build a decoder. Stateless; provided for symmetry with other
    /// adapters that do carry configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl MetadataDecoder for CborTrailerDecoder {
    fn decode(&self, bytecode: &[u8]) -> Result<CborMetadata> {
        if bytecode.len() < LENGTH_FIELD_SIZE {
            return Err(MonitorError::MetadataDecode(
                "bytecode shorter than the trailer length field".into(),
            ));
        }

        let (body, length_field) = bytecode.split_at(bytecode.len() - LENGTH_FIELD_SIZE);
        let cbor_len = u16::from_be_bytes([length_field[0], length_field[1]]) as usize;

        if body.len() < cbor_len {
            return Err(MonitorError::MetadataDecode(format!(
                "declared trailer length {cbor_len} exceeds bytecode length {}",
                body.len()
            )));
        }

        let cbor_bytes = &body[body.len() - cbor_len..];
        let value: serde_json::Value = cbor4ii::serde::from_slice(cbor_bytes)
            .map_err(|err| MonitorError::MetadataDecode(err.to_string()))?;

        Ok(CborMetadata(value))
    }
}

impl SourceAddressFactory for CborTrailerDecoder {
    fn from_cbor_data(&self, metadata: &CborMetadata) -> Result<SourceAddress> {
        if metadata.0.is_null() {
            return Err(MonitorError::MetadataDecode(
                "decoded trailer carries no usable pointer".into(),
            ));
        }
        Ok(SourceAddress(metadata.0.clone()))
    }
}
