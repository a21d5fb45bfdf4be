//! Document model: flat, lazy traversal of a blueprint's parsed tree.
//!
//! [`traverse`] turns a nested JSON value into a pre-order sequence of
//! [`Element`] events. Containers produce an `Enter` event before their
//! children and an `Exit` event after them, so the sum of all nesting deltas
//! of a complete walk is always zero. Object members come out in declaration
//! order and array items in index order.
//!
//! Walks keep no state between calls: the only mutable state is the iterator's
//! own stack, so walking the same tree twice yields identical sequences.
//!
//! ```text
//! {"a": 1, "b": [true]}   labelled "root"
//!
//! Enter root
//!   Leaf  a = 1
//!   Enter b
//!     Leaf 0 = true
//!   Exit  b
//! Exit  root
//! ```

use crate::reference;
use crate::types::Guid;
use serde_json::Value;
use std::borrow::Cow;

/// Position of an element relative to the nesting level of its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    /// Entering an object or array.
    Enter,
    /// A scalar at the current level.
    Leaf,
    /// Leaving the object or array most recently entered.
    Exit,
}

impl Nesting {
    /// `+1`, `0` or `-1`.
    pub fn delta(self) -> i32 {
        match self {
            Nesting::Enter => 1,
            Nesting::Leaf => 0,
            Nesting::Exit => -1,
        }
    }
}

/// JSON kind of the node an element was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Object,
    Array,
    String,
    Number,
    Bool,
    Null,
}

impl NodeKind {
    pub fn of(value: &Value) -> NodeKind {
        match value {
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
            Value::String(_) => NodeKind::String,
            Value::Number(_) => NodeKind::Number,
            Value::Bool(_) => NodeKind::Bool,
            Value::Null => NodeKind::Null,
        }
    }
}

/// One step of a traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct Element<'a> {
    /// Member name, array index, or the root label. `Exit` events repeat the
    /// key of the matching `Enter`.
    pub key: Cow<'a, str>,
    pub nesting: Nesting,
    pub kind: NodeKind,
    /// Textual value for leaves; `None` for container boundaries.
    pub value: Option<Cow<'a, str>>,
    /// Target of a string leaf that is a reference token.
    pub link: Option<Guid>,
    pub node: &'a Value,
}

impl<'a> Element<'a> {
    fn enter(key: Cow<'a, str>, node: &'a Value) -> Self {
        Element {
            key,
            nesting: Nesting::Enter,
            kind: NodeKind::of(node),
            value: None,
            link: None,
            node,
        }
    }

    fn exit(key: Cow<'a, str>, node: &'a Value) -> Self {
        Element {
            nesting: Nesting::Exit,
            ..Element::enter(key, node)
        }
    }

    fn leaf(key: Cow<'a, str>, node: &'a Value) -> Self {
        let (value, link) = match node {
            Value::String(s) => (Cow::Borrowed(s.as_str()), reference::parse_reference(s)),
            Value::Number(n) => (Cow::Owned(n.to_string()), None),
            Value::Bool(true) => (Cow::Borrowed("true"), None),
            Value::Bool(false) => (Cow::Borrowed("false"), None),
            _ => (Cow::Borrowed("null"), None),
        };
        Element {
            key,
            nesting: Nesting::Leaf,
            kind: NodeKind::of(node),
            value: Some(value),
            link,
            node,
        }
    }

    pub fn delta(&self) -> i32 {
        self.nesting.delta()
    }

    /// An object or array with no children.
    pub fn is_empty_container(&self) -> bool {
        match self.node {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

enum Children<'a> {
    Object(serde_json::map::Iter<'a>),
    Array(std::iter::Enumerate<std::slice::Iter<'a, Value>>),
}

impl<'a> Iterator for Children<'a> {
    type Item = (Cow<'a, str>, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Children::Object(members) => members.next().map(|(k, v)| (Cow::Borrowed(k.as_str()), v)),
            Children::Array(items) => items.next().map(|(i, v)| (Cow::Owned(i.to_string()), v)),
        }
    }
}

struct Frame<'a> {
    key: Cow<'a, str>,
    node: &'a Value,
    children: Children<'a>,
}

/// Lazy pre-order walk produced by [`traverse`].
pub struct Elements<'a> {
    root: Option<(Cow<'a, str>, &'a Value)>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Elements<'a> {
    fn visit(&mut self, key: Cow<'a, str>, node: &'a Value) -> Element<'a> {
        let children = match node {
            Value::Object(map) => Children::Object(map.iter()),
            Value::Array(items) => Children::Array(items.iter().enumerate()),
            _ => return Element::leaf(key, node),
        };
        self.stack.push(Frame {
            key: key.clone(),
            node,
            children,
        });
        Element::enter(key, node)
    }

    /// Attach the slash-joined path of each element. See [`Paths`].
    pub fn with_paths(self) -> Paths<'a> {
        Paths {
            inner: self,
            stack: Vec::new(),
        }
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Element<'a>> {
        if let Some((key, node)) = self.root.take() {
            return Some(self.visit(key, node));
        }

        let next = self.stack.last_mut()?.children.next();
        match next {
            Some((key, child)) => Some(self.visit(key, child)),
            None => {
                let frame = self.stack.pop()?;
                Some(Element::exit(frame.key, frame.node))
            }
        }
    }
}

/// Walk `tree` depth-first, labelling the root element `root_label`.
pub fn traverse<'a>(tree: &'a Value, root_label: &'a str) -> Elements<'a> {
    Elements {
        root: Some((Cow::Borrowed(root_label), tree)),
        stack: Vec::new(),
    }
}

/// Targets of every reference token in the tree, in traversal order.
///
/// Duplicates are preserved.
pub fn direct_references<'a>(tree: &'a Value, root_label: &'a str) -> impl Iterator<Item = Guid> + 'a {
    traverse(tree, root_label).filter_map(|e| e.link)
}

/// Elements paired with their full slash-joined path from the root label.
///
/// Only `Enter` and `Leaf` events are yielded; `Exit` events just pop the
/// path. A container's path ends with its own key, as does a leaf's.
pub struct Paths<'a> {
    inner: Elements<'a>,
    stack: Vec<Cow<'a, str>>,
}

impl<'a> Iterator for Paths<'a> {
    type Item = (Element<'a>, String);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let element = self.inner.next()?;
            match element.nesting {
                Nesting::Enter => {
                    self.stack.push(element.key.clone());
                    let path = self.stack.join("/");
                    return Some((element, path));
                }
                Nesting::Exit => {
                    self.stack.pop();
                }
                Nesting::Leaf => {
                    let path = if self.stack.is_empty() {
                        element.key.to_string()
                    } else {
                        format!("{}/{}", self.stack.join("/"), element.key)
                    };
                    return Some((element, path));
                }
            }
        }
    }
}

/// The type of an embedded object, from its `"$type"` member.
///
/// Dumps spell types as `"<type guid>, <ShortName>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub type_guid: String,
    pub name: String,
}

impl TypeRef {
    pub fn parse(raw: &str) -> Option<TypeRef> {
        let (guid, name) = raw.split_once(',')?;
        let (guid, name) = (guid.trim(), name.trim());
        if guid.is_empty() || name.is_empty() {
            return None;
        }
        Some(TypeRef {
            type_guid: guid.to_string(),
            name: name.to_string(),
        })
    }
}

/// Every typed object in the tree, in traversal order, the root included.
pub fn type_refs(tree: &Value) -> Vec<TypeRef> {
    traverse(tree, "")
        .filter(|e| e.nesting == Nesting::Enter)
        .filter_map(|e| e.node.get("$type")?.as_str().and_then(TypeRef::parse))
        .collect()
}

/// Decide which elements of a walk survive a filter.
///
/// An element survives if `keep` accepts it, if an enclosing container was
/// accepted, or, for a container, if any of its descendants survives. The
/// root always survives. The returned mask lines up with `elements`; an
/// `Exit` shares the verdict of its `Enter`. `keep` is never called for
/// `Exit` events.
pub fn prune<'a, F>(elements: &[Element<'a>], mut keep: F) -> Vec<bool>
where
    F: FnMut(&Element<'a>) -> bool,
{
    struct Open {
        at: usize,
        inherited: bool,
        survives: bool,
    }

    let mut mask = vec![false; elements.len()];
    let mut open: Vec<Open> = Vec::new();

    for (i, element) in elements.iter().enumerate() {
        let inherited = open.last().map(|o| o.inherited).unwrap_or(false);
        match element.nesting {
            Nesting::Enter => {
                let accepted = inherited || keep(element);
                open.push(Open {
                    at: i,
                    inherited: accepted,
                    survives: accepted,
                });
            }
            Nesting::Leaf => {
                let survives = open.is_empty() || inherited || keep(element);
                mask[i] = survives;
                if let Some(parent) = open.last_mut() {
                    parent.survives |= survives;
                }
            }
            Nesting::Exit => {
                let Some(closed) = open.pop() else { continue };
                let survives = closed.survives || open.is_empty();
                mask[closed.at] = survives;
                mask[i] = survives;
                if let Some(parent) = open.last_mut() {
                    parent.survives |= survives;
                }
            }
        }
    }

    mask
}
