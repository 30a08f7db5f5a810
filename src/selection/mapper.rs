//! Pure mapping between rendered-tree positions and raw offsets.
//!
//! Only text node lengths are summed, so decoration contributes exactly its
//! visible text. In editable mode syntax markers are real text and count;
//! in read-only mode the renderer already removed them.

use crate::render::{Element, Node};

use super::MappingError;

/// Raw offset of a point inside a rendered line.
///
/// `path` is relative to the line element. When it ends on a text node,
/// `offset` counts characters into that node; when it ends on an element
/// (or is empty), `offset` counts children, as DOM ranges do.
pub fn raw_offset(line: &Element, path: &[usize], offset: usize) -> Result<usize, MappingError> {
    let Some((&index, rest)) = path.split_first() else {
        let children = line.nodes();
        if offset > children.len() {
            return Err(MappingError::OffsetOutOfRange {
                offset,
                len: children.len(),
            });
        }
        return Ok(children[..offset].iter().map(Node::char_len).sum());
    };

    let children = line.nodes();
    let child = children
        .get(index)
        .ok_or_else(|| MappingError::Detached(path.to_vec()))?;
    let before: usize = children[..index].iter().map(Node::char_len).sum();
    match child {
        Node::Text(text) => {
            if !rest.is_empty() {
                return Err(MappingError::Detached(path.to_vec()));
            }
            let len = text.chars().count();
            if offset > len {
                return Err(MappingError::OffsetOutOfRange { offset, len });
            }
            Ok(before + offset)
        }
        Node::Element(el) => Ok(before + raw_offset(el, rest, offset)?),
    }
}

/// Tree position for a raw offset, clamped to end of line.
///
/// At a boundary between two text nodes the earlier node wins, so a caret
/// typed after a marker stays with the text before it.
pub fn point_for_offset(line: &Element, raw_offset: usize) -> (Vec<usize>, usize) {
    let mut remaining = raw_offset;
    let mut last_text = None;
    let mut path = Vec::new();
    find_point(line, &mut path, &mut remaining, &mut last_text)
        .or(last_text)
        .unwrap_or_default()
}

fn find_point(
    el: &Element,
    path: &mut Vec<usize>,
    remaining: &mut usize,
    last_text: &mut Option<(Vec<usize>, usize)>,
) -> Option<(Vec<usize>, usize)> {
    for (index, child) in el.nodes().iter().enumerate() {
        path.push(index);
        match child {
            Node::Text(text) => {
                let len = text.chars().count();
                if *remaining <= len {
                    return Some((path.clone(), *remaining));
                }
                *remaining -= len;
                *last_text = Some((path.clone(), len));
            }
            Node::Element(inner) => {
                if let Some(found) = find_point(inner, path, remaining, last_text) {
                    return Some(found);
                }
            }
        }
        path.pop();
    }
    None
}
