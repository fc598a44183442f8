use std::io;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use thiserror::Error;
use tracing::warn;

use super::engine::DockLayout;
use crate::model::tree::{ChangeLog, LayoutTree, NodeId, NodeKind, PropValue, props};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("unknown element <{0}>")]
    UnknownElement(String),
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Window properties a placement-agnostic template must not carry.
const TEMPLATE_STRIPPED: [&str; 6] = [
    props::X,
    props::Y,
    props::WIDTH,
    props::HEIGHT,
    props::MINIMIZED,
    props::MAXIMIZED,
];

/// XML persistence. The document mirrors the tree exactly: one element per
/// node, tag per kind, attributes per property. Open never touches the
/// in-memory layout unless the whole document parsed.
impl DockLayout {
    pub fn save_to_file(&self, path: &Path) -> bool {
        match self.render(None).and_then(|text| Ok(std::fs::write(path, text)?)) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to save layout");
                false
            }
        }
    }

    pub fn save_layout(&self, out: &mut dyn io::Write) -> bool {
        match self.render(None).and_then(|text| Ok(out.write_all(text.as_bytes())?)) {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "failed to save layout");
                false
            }
        }
    }

    /// Saves a window-placement-agnostic variant: window geometry and
    /// minimized/maximized state are stripped, and the layout takes the
    /// destination file's stem as its name.
    pub fn save_as_template(&self, path: &Path) -> bool {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("template")
            .to_owned();
        match self.render(Some(&stem)).and_then(|text| Ok(std::fs::write(path, text)?)) {
            Ok(()) => true,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to save template");
                false
            }
        }
    }

    pub fn open_from_file(&mut self, path: &Path) -> bool {
        match std::fs::read_to_string(path) {
            Ok(text) => self.open_layout(&text),
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read layout");
                false
            }
        }
    }

    /// Replaces the current layout with the parsed document. On any parse
    /// error the current layout stays as it was.
    pub fn open_layout(&mut self, text: &str) -> bool {
        match parse_document(text) {
            Ok((mut tree, root)) => {
                tree.observer.drain();
                self.tree = tree;
                self.root = root;
                true
            }
            Err(err) => {
                warn!(%err, "failed to parse layout");
                false
            }
        }
    }

    /// The serialized document, empty on render failure.
    pub fn to_xml(&self) -> String {
        self.render(None).unwrap_or_else(|err| {
            warn!(%err, "failed to render layout");
            String::new()
        })
    }

    fn render(&self, template_name: Option<&str>) -> Result<String, PersistError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        self.write_node(&mut writer, self.root, template_name)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| PersistError::Malformed(e.to_string()))
    }

    fn write_node(
        &self,
        writer: &mut Writer<Vec<u8>>,
        node: NodeId,
        template_name: Option<&str>,
    ) -> Result<(), PersistError> {
        let Some(kind) = self.tree.kind(node) else { return Ok(()) };
        let tag = kind.tag();
        let strip_geometry = template_name.is_some() && kind == NodeKind::Window;
        let attrs: Vec<(&str, String)> = self
            .tree
            .map()[node]
            .props()
            .filter(|(key, _)| !(strip_geometry && TEMPLATE_STRIPPED.contains(key)))
            .map(|(key, value)| {
                if key == props::NAME && node == self.root {
                    if let Some(name) = template_name {
                        return (key, name.to_owned());
                    }
                }
                (key, value.to_attr())
            })
            .collect();
        let mut elem = BytesStart::new(tag);
        for (key, value) in &attrs {
            elem.push_attribute((*key, value.as_str()));
        }
        if self.tree.first_child(node).is_none() {
            writer.write_event(Event::Empty(elem))?;
        } else {
            writer.write_event(Event::Start(elem))?;
            let children: Vec<NodeId> = self.tree.children(node).collect();
            for child in children {
                self.write_node(writer, child, template_name)?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        Ok(())
    }
}

fn parse_document(text: &str) -> Result<(LayoutTree<ChangeLog>, NodeId), PersistError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut tree = LayoutTree::with_observer(ChangeLog::default());
    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let node = read_element(&mut tree, &e, stack.last().copied(), &mut root)?;
                stack.push(node);
            }
            Event::Empty(e) => {
                read_element(&mut tree, &e, stack.last().copied(), &mut root)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(_) | Event::CData(_) => {
                return Err(PersistError::Malformed("unexpected text content".into()));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    let root = root.ok_or_else(|| PersistError::Malformed("empty document".into()))?;
    Ok((tree, root))
}

fn read_element(
    tree: &mut LayoutTree<ChangeLog>,
    elem: &BytesStart<'_>,
    parent: Option<NodeId>,
    root: &mut Option<NodeId>,
) -> Result<NodeId, PersistError> {
    let tag = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
    let kind = NodeKind::from_tag(&tag).ok_or_else(|| PersistError::UnknownElement(tag.clone()))?;
    if parent.is_none() {
        if root.is_some() {
            return Err(PersistError::Malformed("multiple document roots".into()));
        }
        if kind != NodeKind::RootCollection {
            return Err(PersistError::Malformed(format!("document root must be <root>, got <{tag}>")));
        }
    }
    let node = tree.mk_node(kind);
    for attr in elem.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = attr
            .unescape_value()
            .map_err(|e| PersistError::Malformed(e.to_string()))?;
        tree.set_prop(node, &key, decode_prop(&key, &raw)?);
    }
    match parent {
        Some(parent) => tree.insert_child(parent, node, None),
        None => *root = Some(node),
    }
    Ok(node)
}

fn decode_prop(key: &str, raw: &str) -> Result<PropValue, PersistError> {
    match key {
        props::X | props::Y | props::WIDTH | props::HEIGHT => raw
            .parse::<f64>()
            .map(PropValue::Num)
            .map_err(|_| PersistError::Malformed(format!("bad number for {key}: {raw:?}"))),
        props::LOCKED | props::MINIMIZED | props::MAXIMIZED => match raw {
            "true" => Ok(PropValue::Bool(true)),
            "false" => Ok(PropValue::Bool(false)),
            _ => Err(PersistError::Malformed(format!("bad flag for {key}: {raw:?}"))),
        },
        _ => Ok(PropValue::Str(raw.to_owned())),
    }
}
