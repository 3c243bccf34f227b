use crate::prelude::*;

use super::{
    AttributeValue, GenericAttribute, Index, StorageKind, StorageScalar, VariableAttribute,
};
use crate::array::{decode_array, Codec, DataArrayDescriptor};

/// Pick the scalar an array is stored as from its declared type and its range hints.
///
/// Floating point arrays are always `Double` and `UInt8` always fits an `Index`. Every
/// other integer array is an `Index` only when `RangeMin >= 0` and `RangeMax` is below
/// `Index::MAX`, and a `Long` otherwise (including when the range is missing).
pub fn select_storage(descriptor: &DataArrayDescriptor<'_>) -> StorageKind {
    match descriptor.numeric_type {
        NumericType::Float32 | NumericType::Float64 => StorageKind::Double,
        NumericType::UInt8 => StorageKind::Index,
        _ => match (descriptor.range_min, descriptor.range_max) {
            (Some(min), Some(max)) if min >= 0.0 && max < Index::MAX as f64 => StorageKind::Index,
            _ => StorageKind::Long,
        },
    }
}

/// Set the values of the attribute `name` for elements `offset..offset + values.len() / components`.
///
/// The attribute is created on first use; an existing attribute keeps its default and
/// only the given elements change.
pub fn build_attribute<T: StorageScalar + AttributeValue<Scalar = T>>(
    store: &mut AttributeManager,
    name: &str,
    values: &[T],
    components: usize,
    offset: usize,
) -> Result<(), ParseError> {
    if components == 0 || values.len() % components != 0 {
        return Err(error::DataShape::new(name.into(), values.len(), components).into());
    }

    match components {
        1 => {
            let attribute = store.find_or_create_attribute(name, T::ZERO)?;
            for (i, value) in values.iter().enumerate() {
                attribute.set_value(offset + i, *value);
            }
            Ok(())
        }
        2 => set_components(store, name, [T::ZERO; 2], values, offset),
        3 => set_components(store, name, [T::ZERO; 3], values, offset),
        _ => set_components(store, name, vec![T::ZERO; components], values, offset),
    }
}

fn set_components<V: AttributeValue>(
    store: &mut AttributeManager,
    name: &str,
    default: V,
    values: &[V::Scalar],
    offset: usize,
) -> Result<(), ParseError> {
    let components = default.components();
    let attribute = store.find_or_create_attribute(name, default)?;

    for (i, group) in values.chunks_exact(components).enumerate() {
        attribute.modify_value(offset + i, |value| {
            for (component, scalar) in group.iter().enumerate() {
                value.set_component(component, *scalar);
            }
        });
    }

    Ok(())
}

#[derive(Debug)]
enum DecodedValues {
    Double(Vec<f64>),
    Index(Vec<Index>),
    Long(Vec<i64>),
}

#[derive(Debug)]
struct PendingAttribute<'a> {
    name: &'a str,
    components: usize,
    values: DecodedValues,
}

/// Decode every `DataArray` child of a `PointData` / `CellData` element into `store`,
/// element `i` of each array landing at `index_offset + i`.
///
/// All arrays are decoded before the store is touched: if any of them fails, the store is
/// left exactly as it was.
pub fn read_attribute_block(
    node: &Element,
    index_offset: usize,
    store: &mut AttributeManager,
    codec: &Codec<'_>,
) -> Result<(), ParseError> {
    let mut pending: Vec<PendingAttribute> = Vec::new();

    for element in node.children_named("DataArray") {
        let descriptor = DataArrayDescriptor::from_element(element)?;
        let name = element
            .required_attribute("Name")
            .map_err(error::Structural::from)?;

        // an attribute seen before (in an earlier piece or earlier in this block) decides
        // how the values are stored
        let existing = pending
            .iter()
            .find(|p| p.name == name)
            .map(|p| (p.values.storage(), p.components))
            .or_else(|| {
                store
                    .find_generic_attribute(name)
                    .map(|attribute| (attribute.storage(), attribute.components()))
            });

        let storage = match existing {
            Some((_, components)) if components != descriptor.components => {
                let mismatch =
                    error::ComponentMismatch::new(name.into(), components, descriptor.components);
                return Err(error::Shape::from(mismatch).into());
            }
            Some((storage, _)) => storage,
            None => select_storage(&descriptor),
        };

        // a user created attribute may hold the right scalars under another grouping,
        // which would only fail once earlier arrays are already applied
        if let Some(attribute) = store.find_generic_attribute(name) {
            if !groups_components(attribute, storage, descriptor.components) {
                let mismatch = error::ComponentMismatch::new(
                    name.into(),
                    attribute.components(),
                    descriptor.components,
                );
                return Err(error::Shape::from(mismatch).into());
            }
        }

        log::trace!(
            "reading {} attribute `{}` ({} components) at element offset {}",
            storage.as_str(),
            name,
            descriptor.components,
            index_offset
        );

        let values = match storage {
            StorageKind::Double => DecodedValues::Double(decode_array(&descriptor, codec)?),
            StorageKind::Index => DecodedValues::Index(decode_array(&descriptor, codec)?),
            StorageKind::Long => DecodedValues::Long(decode_array(&descriptor, codec)?),
        };

        pending.push(PendingAttribute {
            name,
            components: descriptor.components,
            values,
        });
    }

    for attribute in pending {
        let PendingAttribute {
            name,
            components,
            values,
        } = attribute;

        match values {
            DecodedValues::Double(values) => {
                build_attribute(store, name, &values, components, index_offset)?
            }
            DecodedValues::Index(values) => {
                build_attribute(store, name, &values, components, index_offset)?
            }
            DecodedValues::Long(values) => {
                build_attribute(store, name, &values, components, index_offset)?
            }
        }
    }

    Ok(())
}

/// whether `attribute` is the `VariableAttribute` `build_attribute` writes for this storage
fn groups_components(
    attribute: &dyn GenericAttribute,
    storage: StorageKind,
    components: usize,
) -> bool {
    match storage {
        StorageKind::Double => is_grouped_as::<f64>(attribute, components),
        StorageKind::Index => is_grouped_as::<Index>(attribute, components),
        StorageKind::Long => is_grouped_as::<i64>(attribute, components),
    }
}

fn is_grouped_as<T: StorageScalar>(attribute: &dyn GenericAttribute, components: usize) -> bool {
    let any = attribute.as_any();
    match components {
        1 => any.is::<VariableAttribute<T>>(),
        2 => any.is::<VariableAttribute<[T; 2]>>(),
        3 => any.is::<VariableAttribute<[T; 3]>>(),
        _ => any.is::<VariableAttribute<Vec<T>>>(),
    }
}

impl DecodedValues {
    fn storage(&self) -> StorageKind {
        match self {
            Self::Double(_) => StorageKind::Double,
            Self::Index(_) => StorageKind::Index,
            Self::Long(_) => StorageKind::Long,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block;
    use crate::config::HeaderType;

    fn descriptor_element(numeric_type: &str, range: Option<(&str, &str)>) -> Element {
        let element = Element::new("DataArray")
            .with_attribute("type", numeric_type)
            .with_attribute("Name", "ids")
            .with_attribute("format", "ascii");

        match range {
            Some((min, max)) => element
                .with_attribute("RangeMin", min)
                .with_attribute("RangeMax", max),
            None => element,
        }
    }

    fn storage_of(numeric_type: &str, range: Option<(&str, &str)>) -> StorageKind {
        let element = descriptor_element(numeric_type, range);
        let descriptor = DataArrayDescriptor::from_element(&element).unwrap();
        select_storage(&descriptor)
    }

    fn ascii_array(name: &str, numeric_type: &str, components: usize, text: &str) -> Element {
        Element::new("DataArray")
            .with_attribute("type", numeric_type)
            .with_attribute("Name", name)
            .with_attribute("NumberOfComponents", components.to_string())
            .with_attribute("format", "ascii")
            .with_text(text)
    }

    #[test]
    fn integer_width_selection() {
        assert_eq!(storage_of("Int32", Some(("0", "200"))), StorageKind::Index);
        assert_eq!(storage_of("Int64", Some(("-1", "200"))), StorageKind::Long);
        assert_eq!(storage_of("Int64", Some(("-1", "1"))), StorageKind::Long);
        assert_eq!(storage_of("UInt64", Some(("0", "4294967295"))), StorageKind::Long);
        assert_eq!(storage_of("UInt64", None), StorageKind::Long);
        assert_eq!(storage_of("Int8", Some(("0", "100"))), StorageKind::Index);
        assert_eq!(storage_of("Int8", Some(("-5", "100"))), StorageKind::Long);
        assert_eq!(storage_of("UInt8", None), StorageKind::Index);
        assert_eq!(storage_of("Float32", Some(("-1", "1"))), StorageKind::Double);
    }

    #[test]
    fn three_components_end_to_end() {
        let point_data = Element::new("PointData")
            .with_child(ascii_array("displacement", "Float64", 3, "1 2 3 4 5 6"));

        let mut store = AttributeManager::new();
        read_attribute_block(&point_data, 0, &mut store, &Codec::default()).unwrap();

        assert_eq!(store.len(), 1);
        let attribute = store.find_attribute::<[f64; 3]>("displacement").unwrap();
        assert_eq!(attribute.len(), 2);
        assert_eq!(attribute.value(0), &[1.0, 2.0, 3.0]);
        assert_eq!(attribute.value(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn same_attribute_across_pieces() {
        let first = Element::new("CellData").with_child(ascii_array("material", "Float32", 1, "1 2"));
        let second = Element::new("CellData").with_child(ascii_array("material", "Float32", 1, "7 8 9"));

        let mut store = AttributeManager::new();
        read_attribute_block(&first, 0, &mut store, &Codec::default()).unwrap();
        read_attribute_block(&second, 2, &mut store, &Codec::default()).unwrap();

        assert_eq!(store.len(), 1);
        let attribute = store.find_attribute::<f64>("material").unwrap();
        assert_eq!(attribute.values(), &[1.0, 2.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn first_writer_decides_storage() {
        let first = Element::new("PointData").with_child(
            ascii_array("region", "Int32", 1, "0 1")
                .with_attribute("RangeMin", "0")
                .with_attribute("RangeMax", "1"),
        );
        // no range hints here, on its own this array would be stored as `Long`
        let second = Element::new("PointData").with_child(ascii_array("region", "Int64", 1, "3"));

        let mut store = AttributeManager::new();
        read_attribute_block(&first, 0, &mut store, &Codec::default()).unwrap();
        read_attribute_block(&second, 2, &mut store, &Codec::default()).unwrap();

        let attribute = store.find_attribute::<Index>("region").unwrap();
        assert_eq!(attribute.values(), &[0, 1, 3]);

        // a negative value cannot be stored in the existing attribute
        let third = Element::new("PointData").with_child(ascii_array("region", "Int64", 1, "-3"));
        let out = read_attribute_block(&third, 3, &mut store, &Codec::default());
        assert!(matches!(out, Err(ParseError::Decode(_))));
    }

    #[test]
    fn component_mismatch_across_pieces() {
        let first = Element::new("PointData").with_child(ascii_array("v", "Float64", 2, "1 2"));
        let second = Element::new("PointData").with_child(ascii_array("v", "Float64", 3, "1 2 3"));

        let mut store = AttributeManager::new();
        read_attribute_block(&first, 0, &mut store, &Codec::default()).unwrap();

        let out = read_attribute_block(&second, 1, &mut store, &Codec::default());
        assert!(matches!(out, Err(ParseError::DataShape(_))));
    }

    #[test]
    fn many_components() {
        let point_data = Element::new("PointData")
            .with_child(ascii_array("stress", "Float64", 4, "1 2 3 4 5 6 7 8"));

        let mut store = AttributeManager::new();
        read_attribute_block(&point_data, 1, &mut store, &Codec::default()).unwrap();

        let attribute = store.find_attribute::<Vec<f64>>("stress").unwrap();
        assert_eq!(attribute.value(0), &vec![0.0; 4]);
        assert_eq!(attribute.value(1), &vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(attribute.value(2), &vec![5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn uint8_and_int8_are_upcast() {
        let point_data = Element::new("PointData")
            .with_child(ascii_array("flag", "UInt8", 2, "0 255 1 3"))
            .with_child(ascii_array("sign", "Int8", 1, "-1 1"));

        let mut store = AttributeManager::new();
        read_attribute_block(&point_data, 0, &mut store, &Codec::default()).unwrap();

        let flag = store.find_attribute::<[Index; 2]>("flag").unwrap();
        assert_eq!(flag.values(), &[[0, 255], [1, 3]]);

        let sign = store.find_attribute::<i64>("sign").unwrap();
        assert_eq!(sign.values(), &[-1, 1]);
    }

    #[test]
    fn failing_array_leaves_store_untouched() {
        let good = ascii_array("good", "Float64", 1, "1 2 3");
        let bad_base64 = Element::new("DataArray")
            .with_attribute("type", "Float64")
            .with_attribute("Name", "bad")
            .with_attribute("format", "binary")
            .with_text("!!!!not-base64!!!!");

        let point_data = Element::new("PointData").with_child(good).with_child(bad_base64);

        let mut store = AttributeManager::new();
        let out = read_attribute_block(&point_data, 0, &mut store, &Codec::default());

        assert!(matches!(out, Err(ParseError::Decode(error::Decode::Base64(_)))));
        assert!(store.is_empty());
    }

    #[test]
    fn failing_inflate_leaves_store_untouched() {
        let mut header = Vec::new();
        for value in [1usize, 8, 8, 4] {
            HeaderType::UInt32.extend_le_bytes(value, &mut header).unwrap();
        }
        let mut payload = base64::encode(&header);
        payload.push_str(&base64::encode(&[9u8, 9, 9, 9]));

        let good = Element::new("DataArray")
            .with_attribute("type", "Float64")
            .with_attribute("Name", "good")
            .with_attribute("format", "binary")
            .with_text(block::encode_compressed(&1.0f64.to_le_bytes(), HeaderType::UInt32, 8).unwrap());
        let bad = Element::new("DataArray")
            .with_attribute("type", "Float64")
            .with_attribute("Name", "bad")
            .with_attribute("format", "binary")
            .with_text(payload);

        let point_data = Element::new("PointData").with_child(good).with_child(bad);
        let config = CodecConfig::new(crate::config::Compression::ZLib, HeaderType::UInt32);

        let mut store = AttributeManager::new();
        let out = read_attribute_block(&point_data, 0, &mut store, &Codec::new(config, None));

        assert!(matches!(out, Err(ParseError::Decode(error::Decode::Inflate(_)))));
        assert!(store.is_empty());
    }

    #[test]
    fn float_piece_into_integer_attribute() {
        let first = Element::new("PointData").with_child(
            ascii_array("region", "Int32", 1, "0 1")
                .with_attribute("RangeMin", "0")
                .with_attribute("RangeMax", "1"),
        );
        let second = Element::new("PointData").with_child(ascii_array("region", "Float64", 1, "2.75"));

        let mut store = AttributeManager::new();
        read_attribute_block(&first, 0, &mut store, &Codec::default()).unwrap();

        let out = read_attribute_block(&second, 2, &mut store, &Codec::default());
        assert!(matches!(out, Err(ParseError::Decode(error::Decode::ValueRange(_)))));
        assert_eq!(store.find_attribute::<Index>("region").unwrap().values(), &[0, 1]);

        // whole values are accepted
        let third = Element::new("PointData").with_child(ascii_array("region", "Float64", 1, "2"));
        read_attribute_block(&third, 2, &mut store, &Codec::default()).unwrap();
        assert_eq!(store.find_attribute::<Index>("region").unwrap().values(), &[0, 1, 2]);
    }

    #[test]
    fn grouping_mismatch_leaves_store_untouched() {
        let mut store = AttributeManager::new();
        store
            .find_or_create_attribute::<Vec<f64>>("velocity", vec![0.0; 3])
            .unwrap();

        let point_data = Element::new("PointData")
            .with_child(ascii_array("pressure", "Float64", 1, "1 2"))
            .with_child(ascii_array("velocity", "Float64", 3, "1 2 3 4 5 6"));

        let out = read_attribute_block(&point_data, 0, &mut store, &Codec::default());

        assert!(matches!(out, Err(ParseError::DataShape(_))));
        assert!(!store.contains("pressure"));
        assert!(store.find_attribute::<Vec<f64>>("velocity").unwrap().is_empty());
    }

    #[test]
    fn missing_name() {
        let point_data = Element::new("PointData").with_child(
            Element::new("DataArray")
                .with_attribute("type", "Float64")
                .with_attribute("format", "ascii")
                .with_text("1"),
        );

        let mut store = AttributeManager::new();
        let out = read_attribute_block(&point_data, 0, &mut store, &Codec::default());
        assert!(matches!(out, Err(ParseError::Structural(_))));
    }
}
