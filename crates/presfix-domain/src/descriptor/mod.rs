//! In-memory model of a presentation's `content.xml`.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use tracing::debug;
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::cache_key::is_local_locator;

mod steps;

pub use steps::{plan_step_removals, StepRefs, StepVerdict};

pub const DESCRIPTOR_FILE: &str = "content.xml";

const TABLE: &str = "zui-table";
const OBJECT: &str = "object";
const SOURCE: &str = "source";
const URL: &str = "url";
const PATH: &str = "path";
const STEP: &str = "s";
const MEDIA_TYPES: [&str; 2] = ["image", "video"];

#[derive(thiserror::Error, Debug)]
pub enum DescriptorError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("descriptor is not well-formed XML: {0}")]
    Parse(String),
    #[error("unable to serialize descriptor: {0}")]
    Serialize(String),
}

/// One change made to a descriptor, rendered as a transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Reference(String),
    EagleTarget(String),
    FadeInTarget(String),
    ImplicitAction,
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Removal::Reference(locator) => write!(f, "- Removing reference to {locator}"),
            Removal::EagleTarget(id) => write!(f, "- Removing eagle-to object {id}"),
            Removal::FadeInTarget(id) => write!(f, "- Removing fade-in object {id}"),
            Removal::ImplicitAction => f.write_str("- Implicitly removing path action"),
        }
    }
}

pub struct ContentDescriptor {
    root: Element,
}

impl ContentDescriptor {
    /// Parses a descriptor from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::Parse`] when the bytes are not well-formed XML.
    pub fn parse(bytes: &[u8]) -> Result<Self, DescriptorError> {
        Ok(Self {
            root: parse_tree(bytes)?,
        })
    }

    pub fn read(path: &Path) -> Result<Self, DescriptorError> {
        let bytes = fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Local media locators of every table object, in document order.
    ///
    /// Objects with a missing or foreign `type`, with zero or several
    /// `source/url` nodes, or with a non-local locator are skipped.
    #[must_use]
    pub fn local_media_locators(&self) -> Vec<String> {
        let mut locators = Vec::new();
        for table in child_elements(&self.root, TABLE) {
            for object in child_elements(table, OBJECT) {
                if !is_media_object(object) {
                    continue;
                }
                let urls: Vec<&Element> = child_elements(object, SOURCE)
                    .flat_map(|source| child_elements(source, URL))
                    .collect();
                let [url] = urls.as_slice() else {
                    debug!(count = urls.len(), "skipping object without a single source url");
                    continue;
                };
                match element_text(url) {
                    Some(locator) if is_local_locator(&locator) => locators.push(locator),
                    _ => debug!("skipping object with a non-local source url"),
                }
            }
        }
        locators
    }

    /// Drops media objects whose cache entry `is_available` rejects, then the
    /// path steps that referenced them.
    ///
    /// Returns the removals in discovery order: objects in table order, then
    /// steps in path order. An empty result means the tree is unchanged.
    pub fn prune_unavailable_media<F>(&mut self, mut is_available: F) -> Vec<Removal>
    where
        F: FnMut(&str) -> bool,
    {
        let mut removals = Vec::new();
        let mut removed_ids = HashSet::new();

        if let Some(table) = self.root.get_mut_child(TABLE) {
            table.children.retain(|node| {
                let Some(object) = node.as_element().filter(|e| e.name == OBJECT) else {
                    return true;
                };
                let Some(locator) = repairable_locator(object) else {
                    return true;
                };
                if is_available(&locator) {
                    return true;
                }
                if let Some(id) = object.attributes.get("id") {
                    removed_ids.insert(id.clone());
                }
                removals.push(Removal::Reference(locator));
                false
            });
        }

        if let Some(path) = self.root.get_mut_child(PATH) {
            let refs: Vec<StepRefs> = child_elements(path, STEP).map(StepRefs::of).collect();
            let verdicts = plan_step_removals(&refs, &removed_ids);
            let mut keep = Vec::with_capacity(verdicts.len());
            for verdict in verdicts {
                match verdict {
                    StepVerdict::Keep => keep.push(true),
                    StepVerdict::Remove(reasons) => {
                        keep.push(false);
                        removals.extend(reasons);
                    }
                }
            }
            let mut keep = keep.into_iter();
            path.children.retain(|node| match node.as_element() {
                Some(step) if step.name == STEP => keep.next().unwrap_or(true),
                _ => true,
            });
        }

        removals
    }

    /// Serializes the tree as US-ASCII without an XML declaration; characters
    /// outside ASCII become decimal character references.
    pub fn to_ascii_bytes(&self) -> Result<Vec<u8>, DescriptorError> {
        let mut raw = Vec::new();
        let config = EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(false);
        self.root
            .write_with_config(&mut raw, config)
            .map_err(|err| DescriptorError::Serialize(err.to_string()))?;
        let text =
            String::from_utf8(raw).map_err(|err| DescriptorError::Serialize(err.to_string()))?;
        Ok(escape_non_ascii(&text).into_bytes())
    }
}

/// Builds the element tree keeping whitespace between elements as text, so a
/// rewritten descriptor keeps its layout. Comments and processing
/// instructions are dropped.
fn parse_tree(bytes: &[u8]) -> Result<Element, DescriptorError> {
    let config = ParserConfig::new().whitespace_to_characters(true);
    let mut reader = EventReader::new_with_config(bytes, config);
    let mut open: Vec<Element> = Vec::new();
    let mut root = None;
    loop {
        let event = reader
            .next()
            .map_err(|err| DescriptorError::Parse(err.to_string()))?;
        match event {
            XmlEvent::StartElement {
                name,
                attributes,
                namespace,
            } => {
                let mut element = Element::new(&name.local_name);
                element.prefix = name.prefix;
                element.namespace = name.namespace;
                if !namespace.is_essentially_empty() {
                    element.namespaces = Some(namespace);
                }
                element.attributes = attributes
                    .into_iter()
                    .map(|attr| (attr.name.local_name, attr.value))
                    .collect();
                open.push(element);
            }
            XmlEvent::EndElement { .. } => {
                let Some(element) = open.pop() else {
                    return Err(DescriptorError::Parse("unbalanced end tag".to_string()));
                };
                match open.last_mut() {
                    Some(parent) => parent.children.push(XMLNode::Element(element)),
                    None => root = Some(element),
                }
            }
            XmlEvent::Characters(text) | XmlEvent::Whitespace(text) | XmlEvent::CData(text) => {
                if let Some(parent) = open.last_mut() {
                    parent.children.push(XMLNode::Text(text));
                }
            }
            XmlEvent::EndDocument => {
                return root.ok_or_else(|| DescriptorError::Parse("no root element".to_string()));
            }
            XmlEvent::StartDocument { .. }
            | XmlEvent::Comment(_)
            | XmlEvent::ProcessingInstruction { .. } => {}
        }
    }
}

fn child_elements<'e>(parent: &'e Element, name: &'e str) -> impl Iterator<Item = &'e Element> {
    parent
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |child| child.name == name)
}

fn is_media_object(object: &Element) -> bool {
    object
        .attributes
        .get("type")
        .is_some_and(|kind| MEDIA_TYPES.contains(&kind.as_str()))
}

/// Locator of the first `source/url` of a local media object.
fn repairable_locator(object: &Element) -> Option<String> {
    if !is_media_object(object) {
        return None;
    }
    let url = child_elements(object, SOURCE).find_map(|source| child_elements(source, URL).next())?;
    element_text(url).filter(|locator| is_local_locator(locator))
}

fn element_text(element: &Element) -> Option<String> {
    element.get_text().map(|text| text.into_owned())
}

fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("&#{};", u32::from(c)));
        }
    }
    out
}
