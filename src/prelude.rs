//! Common traits and types that are useful for working with `vtk_xml_codec`
#![allow(unused_imports)]

pub use crate::data::{GridInfo, VtkDataset};
pub use crate::traits::{BuildTopology, FromBuffer, Numeric};
pub use crate::{AttributeManager, CodecConfig, DatasetKind, Element, NumericType};

pub(crate) use crate::parse::error;
pub(crate) use crate::parse::ParseError;
pub(crate) use crate::Error;

pub(crate) use std::io::BufRead;
pub(crate) use std::io::Write;

pub(crate) use derive_more::{Constructor, Display, From};
