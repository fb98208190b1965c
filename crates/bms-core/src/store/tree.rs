// ── Tree helpers ──
//
// Path-addressed reads and writes on a `Value` tree. Shared by the
// in-memory store, the streaming adapter and the mirror.

use indexmap::IndexMap;

use crate::model::Value;

/// Value under `segs`, starting at `root`.
pub(crate) fn get_at<'a>(root: Option<&'a Value>, segs: &[&str]) -> Option<&'a Value> {
    segs.iter().try_fold(root?, |node, seg| node.get(seg))
}

/// Replace (or, with `None`, delete) the value under `segs`.
///
/// Missing or non-map intermediates are replaced by maps. Deleting the
/// last child of a map removes the map too, so the tree never holds
/// empty maps.
pub(crate) fn set_at(root: &mut Option<Value>, segs: &[&str], value: Option<Value>) {
    let Some((first, rest)) = segs.split_first() else {
        *root = value;
        return;
    };

    if value.is_none() && !matches!(root, Some(Value::Map(_))) {
        return;
    }

    if !matches!(root, Some(Value::Map(_))) {
        *root = Some(Value::Map(IndexMap::new()));
    }
    let Some(Value::Map(map)) = root else {
        return;
    };

    let mut child = map.get(*first).cloned();
    set_at(&mut child, rest, value);
    match child {
        Some(v) => {
            map.insert((*first).to_owned(), v);
        }
        None => {
            map.shift_remove(*first);
        }
    }

    if map.is_empty() {
        *root = None;
    }
}

/// Apply a patch: each child of `patch` replaces the same child under
/// `segs`; other children are left alone.
pub(crate) fn merge_at(
    root: &mut Option<Value>,
    segs: &[&str],
    patch: IndexMap<String, Option<Value>>,
) {
    for (key, value) in patch {
        let mut child_segs = segs.to_vec();
        child_segs.push(&key);
        set_at(root, &child_segs, value);
    }
}
