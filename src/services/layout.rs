use serde::Serialize;

/// Second cell of a display row; `Empty` pads an odd-length list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Slot<T> {
    Filled(T),
    Empty,
}

/// Two-up grid row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row<T> {
    pub left: T,
    pub right: Slot<T>,
}

impl<T> Row<T> {
    /// Filled cells, left to right
    pub fn items(&self) -> impl Iterator<Item = &T> {
        let right = match &self.right {
            Slot::Filled(item) => Some(item),
            Slot::Empty => None,
        };
        std::iter::once(&self.left).chain(right)
    }
}

/// Pairs items into rows of two, keeping order
pub fn pair_rows<T: Clone>(items: &[T]) -> Vec<Row<T>> {
    items
        .chunks(2)
        .map(|pair| Row {
            left: pair[0].clone(),
            right: pair.get(1).cloned().map_or(Slot::Empty, Slot::Filled),
        })
        .collect()
}
