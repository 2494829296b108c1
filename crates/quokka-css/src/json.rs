//! Stable JSON serialization of layout and paint output.
//!
//! Field order follows struct declaration order and no output type contains
//! a hash map, so the same input always serializes to the same bytes.

use crate::layout::FragmentTree;
use crate::paint::DisplayList;

/// Pretty-printed JSON for a fragment tree.
///
/// # Errors
///
/// Returns the serializer's error; plain data structures never produce one
/// in practice.
pub fn fragment_tree_to_json(tree: &FragmentTree) -> serde_json::Result<String> {
    serde_json::to_string_pretty(tree)
}

/// Pretty-printed JSON for a display list.
///
/// # Errors
///
/// Returns the serializer's error; plain data structures never produce one
/// in practice.
pub fn display_list_to_json(list: &DisplayList) -> serde_json::Result<String> {
    serde_json::to_string_pretty(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Rect;
    use crate::paint::DisplayItem;
    use crate::values::Color;

    #[test]
    fn test_display_item_tagged_by_type() {
        let list: DisplayList = [
            DisplayItem::FillRect {
                rect: Rect::new(0.0, 0.0, 2.0, 3.0),
                color: Color::BLACK,
            },
            DisplayItem::Restore,
        ]
        .into_iter()
        .collect();
        let json = display_list_to_json(&list).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["items"][0]["type"], "FillRect");
        assert_eq!(value["items"][0]["rect"]["height"], 3.0);
        assert_eq!(value["items"][1]["type"], "Restore");
    }

    #[test]
    fn test_fragment_tree_fields_in_declaration_order() {
        let tree = crate::layout_html("<p>x</p>", 100.0, 100.0);
        let json = fragment_tree_to_json(&tree).unwrap();
        let id = json.find("\"id\"").unwrap();
        let label = json.find("\"label\"").unwrap();
        let children = json.find("\"children\"").unwrap();
        assert!(id < label && label < children);
    }
}
