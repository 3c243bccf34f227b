//! The `AppendedData` section: one base64 blob per file, addressed by character offsets.

use crate::prelude::*;

/// The base64 text of the `AppendedData` element with the leading `_` marker removed.
///
/// `offset="N"` on an appended `DataArray` is the index of the first base64 character of
/// that array inside this blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendedData {
    blob: String,
}

impl AppendedData {
    /// build the store from the raw text content of an `AppendedData` element
    pub fn from_section(text: &str) -> Result<Self, error::Structural> {
        let text = text.trim();

        let blob = text
            .strip_prefix('_')
            .ok_or(error::MissingSentinel)?
            .to_string();

        Ok(Self { blob })
    }

    /// locate the single optional `AppendedData` child of the `VTKFile` root
    pub fn from_root(root: &Element) -> Result<Option<Self>, ParseError> {
        let node = match root.child("AppendedData") {
            Some(node) => node,
            None => return Ok(None),
        };

        let encoding = node
            .required_attribute("encoding")
            .map_err(error::Structural::from)?;

        if encoding != "base64" {
            let unsupported = error::UnsupportedAttribute::new(
                "AppendedData".into(),
                "encoding".into(),
                encoding.into(),
                "base64",
            );
            return Err(error::Unsupported::from(unsupported).into());
        }

        let appended = Self::from_section(node.text())?;
        log::debug!(
            "AppendedData section holds {} base64 characters",
            appended.len()
        );

        Ok(Some(appended))
    }

    pub fn len(&self) -> usize {
        self.blob.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.is_empty()
    }

    /// everything from `offset` to the end of the blob
    pub fn window(&self, offset: usize, array_name: &str) -> Result<&str, error::Structural> {
        self.blob.get(offset..).ok_or_else(|| {
            error::AppendedOffset::new(array_name.into(), offset, self.blob.len()).into()
        })
    }
}
