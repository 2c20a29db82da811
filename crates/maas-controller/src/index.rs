//! Secondary index from Model name to the intents referencing it (§9:
//! "an arena-of-intents indexed by model name... built from the informer
//! cache"), breaking the Model <-> intent cycle without direct pointers.

use std::collections::HashMap;

/// Groups `items` by every Model name each one references, via
/// `model_names`. Tombstoned items should be filtered out by the caller
/// before indexing — "all live intents referencing that Model" (§4.4).
#[must_use]
pub fn index_by_model<'a, T>(
    items: &'a [T],
    model_names: impl Fn(&T) -> Vec<String>,
) -> HashMap<String, Vec<&'a T>> {
    let mut index: HashMap<String, Vec<&'a T>> = HashMap::new();
    for item in items {
        for model in model_names(item) {
            index.entry(model).or_default().push(item);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_items_under_every_referenced_model() {
        let items = vec![vec!["m1".to_owned(), "m2".to_owned()], vec!["m1".to_owned()]];
        let index = index_by_model(&items, |v| v.clone());
        assert_eq!(index.get("m1").unwrap().len(), 2);
        assert_eq!(index.get("m2").unwrap().len(), 1);
    }
}
