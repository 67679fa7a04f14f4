//! List move helper shared by zone and stop reordering.

/// Moves the items at `from_indices` so they land before `to_index`.
///
/// `to_index` is expressed in pre-move positions (`0..=len`), like a drop
/// target between rows. Moved items keep their relative order. Empty or
/// out-of-range input hands the list back unchanged as `Err`.
pub fn move_items<T>(
    items: Vec<T>,
    from_indices: &[usize],
    to_index: usize,
) -> Result<Vec<T>, Vec<T>> {
    let mut from = from_indices.to_vec();
    from.sort_unstable();
    from.dedup();

    let out_of_range = from.last().is_some_and(|last| *last >= items.len());
    if from.is_empty() || out_of_range || to_index > items.len() {
        return Err(items);
    }

    let shift = from.iter().filter(|index| **index < to_index).count();
    let mut moved = Vec::with_capacity(from.len());
    let mut rest = Vec::with_capacity(items.len() - from.len());
    for (index, item) in items.into_iter().enumerate() {
        if from.binary_search(&index).is_ok() {
            moved.push(item);
        } else {
            rest.push(item);
        }
    }

    let destination = to_index - shift;
    rest.splice(destination..destination, moved);
    Ok(rest)
}
