use crate::prelude::*;

use super::cast_value;

/// parse whitespace separated tokens as the declared type `S`, converting each to `T`
pub(crate) fn parse_values<S: Numeric, T: Numeric>(
    text: &str,
    array_name: &str,
) -> Result<Vec<T>, error::Decode> {
    text.split_ascii_whitespace()
        .enumerate()
        .map(|(index, token)| -> Result<T, error::Decode> {
            let value: S = token.parse().map_err(|_| {
                error::AsciiValue::new(array_name.into(), token.into(), S::TYPE)
            })?;

            cast_value::<S, T>(value, index, array_name)
        })
        .collect()
}
