//! Heavy data stored as text inside the `DataItem` itself

use crate::prelude::*;
use crate::reference::Locator;

pub(crate) fn store(array: &DataArray) -> Locator {
    Locator::Inline(array.to_text())
}

/// parse the item text as `element_type`. A value count that does not match `dims` is
/// returned flat and rejected by the caller.
pub(crate) fn load(
    text: &str,
    element_type: ElementType,
    dims: &[usize],
) -> Result<DataArray, FormatError> {
    DataArray::from_text(text, element_type, dims)
}
