//! Ordering of a directory's children.

use std::cmp::Ordering;
use std::path::PathBuf;

use crate::node::{Node, NodeId};
use crate::settings::SortMethod;

struct SortKey {
    id: NodeId,
    name: String,
    modtime: u64,
    path: PathBuf,
}

/// Sort child ids by `method`.
///
/// Directories and files sort together. Ties are broken by path so the
/// result does not depend on the incoming order. Ids that `lookup` cannot
/// resolve are kept at the end in their current order.
pub fn sort_children<'a, F>(children: &mut Vec<NodeId>, method: SortMethod, lookup: F)
where
    F: Fn(NodeId) -> Option<&'a Node>,
{
    let mut keyed = Vec::with_capacity(children.len());
    let mut unresolved = Vec::new();

    for id in children.drain(..) {
        match lookup(id) {
            Some(node) => keyed.push(SortKey {
                id,
                name: node.name().to_lowercase(),
                modtime: node.modtime(),
                path: node.path().to_path_buf(),
            }),
            None => unresolved.push(id),
        }
    }

    keyed.sort_by(|a, b| compare(a, b, method));

    children.extend(keyed.into_iter().map(|k| k.id));
    children.extend(unresolved);
}

fn compare(a: &SortKey, b: &SortKey, method: SortMethod) -> Ordering {
    let primary = match method {
        SortMethod::NameUp => natural_cmp(&a.name, &b.name),
        SortMethod::NameDown => natural_cmp(&b.name, &a.name),
        SortMethod::TimeUp => a.modtime.cmp(&b.modtime),
        SortMethod::TimeDown => b.modtime.cmp(&a.modtime),
    };
    primary.then_with(|| a.path.cmp(&b.path))
}

/// Compare strings treating runs of ASCII digits as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let left = take_number(&mut a);
                let right = take_number(&mut b);
                let ord = left
                    .trim_start_matches('0')
                    .len()
                    .cmp(&right.trim_start_matches('0').len())
                    .then_with(|| {
                        left.trim_start_matches('0')
                            .cmp(right.trim_start_matches('0'))
                    })
                    .then_with(|| left.len().cmp(&right.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}
