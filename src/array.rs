//! Typed, n-dimensional arrays that travel between the mesh and the heavy data backends
//!
//! Every array in an xdmf document is one of four element types. [`DataArray`] keeps the
//! element type and the full shape together so that a backend that stores shapes natively
//! (HDF5 datasets) can hand back exactly what was written, while the text and
//! binary backends rebuild the shape from the `Dimensions` declared in the light data.

use crate::prelude::*;

use byteorder::ByteOrder;
use ndarray::{Array, ArrayD, Axis, Dimension, IxDyn};
use num_traits::AsPrimitive;

use std::fmt;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// element type of a heavy data array
pub enum ElementType {
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ElementType {
    /// number of bytes a single element occupies when tightly packed
    pub fn size(&self) -> usize {
        match self {
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// value of the `DataType` attribute of a `DataItem`
    pub(crate) fn data_type(&self) -> &'static str {
        if self.is_float() {
            "Float"
        } else {
            "Int"
        }
    }

    /// value of the `Precision` attribute of a `DataItem`
    pub(crate) fn precision(&self) -> usize {
        self.size()
    }

    /// map a `DataType` / `Precision` attribute pair to an element type. Xdmf defaults
    /// the precision to 4 bytes when the attribute is missing.
    pub(crate) fn from_xdmf(
        data_type: &str,
        precision: Option<&str>,
    ) -> Result<Self, UnsupportedFeature> {
        let precision = precision.unwrap_or("4").trim();

        let element_type = match (data_type.trim(), precision) {
            ("Int", "4") => Self::Int32,
            ("Int", "8") => Self::Int64,
            ("Float", "4") => Self::Float32,
            ("Float", "8") => Self::Float64,
            (data_type, precision) => {
                return Err(UnsupportedDataType::new(data_type.into(), precision.into()).into())
            }
        };

        Ok(element_type)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        };
        write!(f, "{name}")
    }
}

/// Element types that can be stored in a [`DataArray`]
pub trait Numeric: Copy + PartialEq + fmt::Debug + AsPrimitive<f64> + 'static {
    const ELEMENT_TYPE: ElementType;

    fn wrap(array: ArrayD<Self>) -> DataArray;

    /// append the canonical text form of this value
    fn write_token(self, out: &mut String);

    fn parse_token(token: &str) -> Option<Self>;

    fn read_slice<B: ByteOrder>(src: &[u8], dst: &mut [Self]);

    fn write_slice<B: ByteOrder>(src: &[Self], dst: &mut [u8]);
}

macro_rules! impl_numeric {
    ($num:ty, $variant:ident, $read:ident, $write:ident, $token:literal) => {
        impl Numeric for $num {
            const ELEMENT_TYPE: ElementType = ElementType::$variant;

            fn wrap(array: ArrayD<Self>) -> DataArray {
                DataArray::$variant(array)
            }

            fn write_token(self, out: &mut String) {
                // writing into a String cannot fail
                let _ = write!(out, $token, self);
            }

            fn parse_token(token: &str) -> Option<Self> {
                token.parse().ok()
            }

            fn read_slice<B: ByteOrder>(src: &[u8], dst: &mut [Self]) {
                B::$read(src, dst)
            }

            fn write_slice<B: ByteOrder>(src: &[Self], dst: &mut [u8]) {
                B::$write(src, dst)
            }
        }
    };
}

impl_numeric!(i32, Int32, read_i32_into, write_i32_into, "{}");
impl_numeric!(i64, Int64, read_i64_into, write_i64_into, "{}");
// enough digits that the text parses back to the identical float
impl_numeric!(f32, Float32, read_f32_into, write_f32_into, "{:.8e}");
impl_numeric!(f64, Float64, read_f64_into, write_f64_into, "{:.16e}");

#[derive(Debug, Clone, PartialEq)]
/// An n-dimensional array of one of the element types xdmf can describe
pub enum DataArray {
    Int32(ArrayD<i32>),
    Int64(ArrayD<i64>),
    Float32(ArrayD<f32>),
    Float64(ArrayD<f64>),
}

macro_rules! each_variant {
    ($value:expr, $arr:ident => $body:expr) => {
        match $value {
            DataArray::Int32($arr) => $body,
            DataArray::Int64($arr) => $body,
            DataArray::Float32($arr) => $body,
            DataArray::Float64($arr) => $body,
        }
    };
}

impl DataArray {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Int32(_) => ElementType::Int32,
            Self::Int64(_) => ElementType::Int64,
            Self::Float32(_) => ElementType::Float32,
            Self::Float64(_) => ElementType::Float64,
        }
    }

    pub fn shape(&self) -> &[usize] {
        each_variant!(self, arr => arr.shape())
    }

    /// total number of elements
    pub fn len(&self) -> usize {
        each_variant!(self, arr => arr.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// length of the first axis; one row per point or per cell
    pub fn rows(&self) -> usize {
        self.shape().first().copied().unwrap_or(1)
    }

    /// size in bytes of the tightly packed array
    pub fn byte_len(&self) -> usize {
        self.len() * self.element_type().size()
    }

    /// widen every element to `f64`
    pub fn to_f64(&self) -> ArrayD<f64> {
        each_variant!(self, arr => arr.mapv(AsPrimitive::<f64>::as_))
    }

    /// integer arrays as `i64`, `None` for floating point data
    pub fn to_i64(&self) -> Option<ArrayD<i64>> {
        match self {
            Self::Int32(arr) => Some(arr.mapv(i64::from)),
            Self::Int64(arr) => Some(arr.clone()),
            Self::Float32(_) | Self::Float64(_) => None,
        }
    }

    /// double precision arrays narrowed to single precision. Every other array is
    /// returned unchanged.
    pub fn to_single_precision(&self) -> DataArray {
        match self {
            Self::Float64(arr) => Self::Float32(arr.mapv(|x| x as f32)),
            other => other.clone(),
        }
    }

    /// largest absolute elementwise difference, or `None` if the shapes differ
    pub fn max_abs_diff(&self, other: &DataArray) -> Option<f64> {
        if self.shape() != other.shape() {
            return None;
        }

        let diff = self
            .to_f64()
            .iter()
            .zip(other.to_f64().iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);

        Some(diff)
    }

    /// the given rows of the first axis, in the given order
    pub(crate) fn select_rows(&self, rows: &[usize]) -> DataArray {
        each_variant!(self, arr => DataArray::from(arr.select(Axis(0), rows)))
    }

    /// whitespace separated text, one line per row of the first axis
    pub(crate) fn to_text(&self) -> String {
        each_variant!(self, arr => text_of(arr))
    }

    /// parse whitespace separated text. If the number of values does not match `dims` the
    /// values are returned as a flat array so that the caller can report the mismatch.
    pub(crate) fn from_text(
        text: &str,
        element_type: ElementType,
        dims: &[usize],
    ) -> Result<DataArray, FormatError> {
        let array = match element_type {
            ElementType::Int32 => i32::wrap(parse_text(text, dims)?),
            ElementType::Int64 => i64::wrap(parse_text(text, dims)?),
            ElementType::Float32 => f32::wrap(parse_text(text, dims)?),
            ElementType::Float64 => f64::wrap(parse_text(text, dims)?),
        };

        Ok(array)
    }

    /// tightly packed bytes in row-major order
    pub(crate) fn to_bytes<B: ByteOrder>(&self) -> Vec<u8> {
        each_variant!(self, arr => bytes_of::<_, B>(arr))
    }

    /// rebuild an array from tightly packed bytes. `bytes` must hold exactly
    /// `product(dims)` elements.
    pub(crate) fn from_bytes<B: ByteOrder>(
        bytes: &[u8],
        element_type: ElementType,
        dims: &[usize],
    ) -> DataArray {
        match element_type {
            ElementType::Int32 => i32::wrap(array_of_bytes::<_, B>(bytes, dims)),
            ElementType::Int64 => i64::wrap(array_of_bytes::<_, B>(bytes, dims)),
            ElementType::Float32 => f32::wrap(array_of_bytes::<_, B>(bytes, dims)),
            ElementType::Float64 => f64::wrap(array_of_bytes::<_, B>(bytes, dims)),
        }
    }
}

impl<NUM, D> From<Array<NUM, D>> for DataArray
where
    NUM: Numeric,
    D: Dimension,
{
    fn from(array: Array<NUM, D>) -> Self {
        NUM::wrap(array.into_dyn())
    }
}

fn text_of<NUM: Numeric>(array: &ArrayD<NUM>) -> String {
    let row_length = array.shape().iter().skip(1).product::<usize>().max(1);
    let mut out = String::with_capacity(array.len() * 24);

    for (idx, value) in array.iter().enumerate() {
        if idx > 0 {
            if idx % row_length == 0 {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        value.write_token(&mut out);
    }

    out
}

fn parse_text<NUM: Numeric>(text: &str, dims: &[usize]) -> Result<ArrayD<NUM>, FormatError> {
    let values = text
        .split_ascii_whitespace()
        .map(|token| {
            NUM::parse_token(token)
                .ok_or_else(|| FormatError::from(InlineValue::new(token.into(), NUM::ELEMENT_TYPE)))
        })
        .collect::<Result<Vec<NUM>, FormatError>>()?;

    Ok(shaped_or_flat(values, dims))
}

fn bytes_of<NUM: Numeric, B: ByteOrder>(array: &ArrayD<NUM>) -> Vec<u8> {
    let values: Vec<NUM> = array.iter().copied().collect();
    let mut bytes = vec![0; values.len() * NUM::ELEMENT_TYPE.size()];
    NUM::write_slice::<B>(&values, &mut bytes);
    bytes
}

fn array_of_bytes<NUM: Numeric + Default, B: ByteOrder>(bytes: &[u8], dims: &[usize]) -> ArrayD<NUM> {
    let count = bytes.len() / NUM::ELEMENT_TYPE.size();
    let mut values = vec![NUM::default(); count];
    NUM::read_slice::<B>(&bytes[..count * NUM::ELEMENT_TYPE.size()], &mut values);
    shaped_or_flat(values, dims)
}

/// number of elements of an array with shape `dims`, `None` if that overflows `usize`
pub(crate) fn element_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |count, &dim| count.checked_mul(dim))
}

pub(crate) fn shaped_or_flat<NUM>(values: Vec<NUM>, dims: &[usize]) -> ArrayD<NUM> {
    let len = values.len();
    let shape = if element_count(dims) == Some(len) {
        IxDyn(dims)
    } else {
        IxDyn(&[len])
    };

    ArrayD::from_shape_vec(shape, values)
        .unwrap_or_else(|_| unreachable!("shape was checked against the element count"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, LittleEndian};
    use ndarray::array;

    #[test]
    fn xdmf_type_names() {
        assert_eq!(
            ElementType::from_xdmf("Float", Some("8")).unwrap(),
            ElementType::Float64
        );
        assert_eq!(ElementType::from_xdmf("Int", None).unwrap(), ElementType::Int32);
        assert!(ElementType::from_xdmf("UChar", Some("1")).is_err());
        assert!(ElementType::from_xdmf("Float", Some("16")).is_err());

        for element_type in [
            ElementType::Int32,
            ElementType::Int64,
            ElementType::Float32,
            ElementType::Float64,
        ] {
            let precision = element_type.precision().to_string();
            let parsed =
                ElementType::from_xdmf(element_type.data_type(), Some(&precision)).unwrap();
            assert_eq!(parsed, element_type);
        }
    }

    #[test]
    fn text_is_written_one_row_per_line() {
        let values = DataArray::from(array![[0i64, 1, 2], [2, 3, 0]]);
        assert_eq!(values.to_text(), "0 1 2\n2 3 0");
    }

    #[test]
    fn float_text_is_exact() {
        let values = DataArray::from(array![0.1f64, 1.0 / 3.0, -2.5e-300, 7.0e12]);
        let text = values.to_text();
        let parsed = DataArray::from_text(&text, ElementType::Float64, &[4]).unwrap();
        assert_eq!(parsed, values);

        let values = DataArray::from(array![0.1f32, 1.0 / 3.0, f32::MAX]);
        let parsed = DataArray::from_text(&values.to_text(), ElementType::Float32, &[3]).unwrap();
        assert_eq!(parsed, values);
    }

    #[test]
    fn text_with_wrong_count_stays_flat() {
        let parsed = DataArray::from_text("1 2 3 4 5", ElementType::Int32, &[2, 3]).unwrap();
        assert_eq!(parsed.shape(), &[5]);
    }

    #[test]
    fn bad_inline_token() {
        let err = DataArray::from_text("1 2 x", ElementType::Int64, &[3]).unwrap_err();
        assert!(matches!(err, FormatError::InlineValue(_)));
    }

    #[test]
    fn bytes_respect_byte_order() {
        let values = DataArray::from(array![[1.5f64, -2.0], [3.25, 4.0]]);

        let little = values.to_bytes::<LittleEndian>();
        let big = values.to_bytes::<BigEndian>();
        assert_eq!(little.len(), 32);
        assert_ne!(little, big);

        let parsed = DataArray::from_bytes::<BigEndian>(&big, ElementType::Float64, &[2, 2]);
        assert_eq!(parsed, values);
    }

    #[test]
    fn element_counts() {
        assert_eq!(element_count(&[10, 3]), Some(30));
        assert_eq!(element_count(&[4, 0, 2]), Some(0));
        assert_eq!(element_count(&[1 << 32, 1 << 32, 2]), None);

        let parsed = DataArray::from_text("1 2 3 4", ElementType::Int32, &[usize::MAX, 2, 2]).unwrap();
        assert_eq!(parsed.shape(), &[4]);
    }

    #[test]
    fn row_selection() {
        let values = DataArray::from(array![[1i64, 1], [2, 2], [3, 3]]);
        let picked = values.select_rows(&[2, 0]);
        assert_eq!(picked, DataArray::from(array![[3i64, 3], [1, 1]]));
    }

    #[test]
    fn narrowing_only_touches_doubles() {
        let doubles = DataArray::from(array![0.1f64, 0.2]);
        let narrowed = doubles.to_single_precision();
        assert_eq!(narrowed.element_type(), ElementType::Float32);
        assert!(narrowed.max_abs_diff(&doubles).unwrap() < 1e-6);

        let ints = DataArray::from(array![1i32, 2]);
        assert_eq!(ints.to_single_precision(), ints);
    }
}
