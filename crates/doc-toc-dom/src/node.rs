use html_escape::{decode_html_entities, encode_text};

/// Handle to a node stored in a [`Document`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Element attribute. `value` is stored decoded; `None` marks a bare attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn bare(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            value: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element {
        name: String,
        attributes: Vec<Attribute>,
    },
    /// Character data exactly as it appears in markup (entities not decoded).
    Text(String),
    Comment(String),
    /// Markup declaration such as `DOCTYPE html`, without the `<!` and `>`.
    Doctype(String),
}

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree.
///
/// Nodes are never freed; detaching a node only unlinks it from its parent.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root node.
    pub fn new() -> Self {
        Document {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Lowercase tag name for element nodes.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.kind(id) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Attribute value by name. Bare attributes yield an empty string.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|candidate| candidate == class)
    }

    /// Pre-order traversal of everything below `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack = self.children(id).to_vec();
        stack.reverse();
        Descendants {
            document: self,
            stack,
        }
    }

    /// Iterate over the ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|candidate| candidate == ancestor)
    }

    /// Concatenated, entity-decoded text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if let NodeKind::Text(raw) = self.kind(id) {
            text.push_str(&decode_html_entities(raw));
        }
        for descendant in self.descendants(id) {
            if let NodeKind::Text(raw) = self.kind(descendant) {
                text.push_str(&decode_html_entities(raw));
            }
        }
        text
    }

    /// Create a detached element with the provided attributes.
    pub fn create_element<'a, I>(&mut self, name: &str, attributes: I) -> NodeId
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let attributes = attributes
            .into_iter()
            .map(|(name, value)| Attribute::new(name, value))
            .collect();
        self.push(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes,
        })
    }

    /// Create a detached text node from plain text; markup characters are escaped.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(encode_text(text).into_owned()))
    }

    pub(crate) fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.is_ancestor(child, parent) {
            return;
        }
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Move `node` so that it becomes the previous sibling of `reference`.
    /// Does nothing when `reference` is detached.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        if node == reference || self.is_ancestor(node, reference) {
            return;
        }
        self.detach(node);
        let position = self.position_in_parent(parent, reference);
        self.nodes[parent.0].children.insert(position, node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Replace `target` by `wrapper` in the tree and move `target` inside it.
    pub fn wrap(&mut self, target: NodeId, wrapper: NodeId) {
        if self.parent(target).is_none() || wrapper == target {
            return;
        }
        self.insert_before(target, wrapper);
        self.append_child(wrapper, target);
    }

    /// Unlink `id` from its parent. The node and its subtree stay in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    fn position_in_parent(&self, parent: NodeId, child: NodeId) -> usize {
        self.children(parent)
            .iter()
            .position(|candidate| *candidate == child)
            .unwrap_or(self.children(parent).len())
    }
}

/// Iterator returned by [`Document::descendants`].
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.document.children(next).iter().rev().copied());
        Some(next)
    }
}
