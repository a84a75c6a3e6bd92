//! The ContainerIndex manifest: the decoded XML document enumerating every
//! file packaged in a container.

use crate::SourceRange;
use snafu::{OptionExt, ResultExt, Snafu};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// XML namespace of the ContainerIndex vocabulary.
pub const CONTAINER_INDEX_NS: &str = "urn:ContainerIndex";

/// Errors when decoding a manifest document.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ManifestError {
    #[snafu(display("manifest is not well-formed XML"))]
    MalformedXml { source: roxmltree::Error },

    #[snafu(display("manifest has no Files collection"))]
    MissingFiles,

    #[snafu(display("File #{index} has no name attribute"))]
    MissingName { index: usize },

    #[snafu(display("'{name}' has no Delta/Source descriptor"))]
    MissingSource { name: String },

    #[snafu(display("'{name}' has no {attribute} attribute on its Source"))]
    MissingAttribute {
        name: String,
        attribute: &'static str,
    },

    #[snafu(display("'{name}' has a non-integer {attribute} attribute"))]
    InvalidInteger {
        name: String,
        attribute: &'static str,
        source: std::num::ParseIntError,
    },
}

type Result<T, E = ManifestError> = std::result::Result<T, E>;

/// Encoding of an entry's payload within the container.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeltaKind {
    /// Payload is stored as-is.
    Raw,
    /// Payload is a PA30 delta against an implicit empty baseline.
    Pa30,
    /// Unrecognized encoding; the payload is extracted as-is.
    Other(String),
}

impl DeltaKind {
    fn from_type_attr(attr: Option<&str>) -> Self {
        match attr {
            None | Some("RAW") => Self::Raw,
            Some("PA30") => Self::Pa30,
            Some(other) => Self::Other(other.to_string()),
        }
    }

    /// Returns `true` if the payload must be run through a delta decoder
    /// after extraction.
    #[must_use]
    pub fn needs_decode(&self) -> bool {
        matches!(self, Self::Pa30)
    }
}

impl fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Raw => "RAW",
            Self::Pa30 => "PA30",
            Self::Other(other) => other,
        };
        f.pad(name)
    }
}

/// A single packaged file described by the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Relative destination path, in either separator convention.
    pub name: String,
    /// Payload encoding.
    pub delta: DeltaKind,
    /// Byte range of the (possibly delta-compressed) payload.
    pub source: SourceRange,
}

impl ManifestEntry {
    /// Resolves the entry name to a destination path under `base`.
    ///
    /// Names may use either `/` or `\` as separators; both resolve to the
    /// same layout on the host filesystem.
    #[must_use]
    pub fn to_path<B: AsRef<Path>>(&self, base: B) -> PathBuf {
        let mut path = base.as_ref().to_path_buf();

        for part in self.name.split(['/', '\\']).filter(|p| !p.is_empty()) {
            path.push(part);
        }

        path
    }
}

/// An ordered view of every file packaged in a container.
///
/// The document order of the `File` elements is preserved; it is also the
/// extraction order.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Decodes a ContainerIndex document.
    ///
    /// Locates every `File` element under the `Files` collection and reads
    /// its `name` attribute plus the nested `Delta/Source` descriptor. A
    /// structurally malformed document fails with a [`ManifestError`]
    /// naming the offending element.
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = roxmltree::Document::parse(xml).context(MalformedXmlSnafu)?;

        let files = doc
            .root_element()
            .children()
            .find(|node| node.has_tag_name((CONTAINER_INDEX_NS, "Files")))
            .context(MissingFilesSnafu)?;

        let mut entries = Vec::new();

        for (index, file) in files
            .children()
            .filter(|node| node.has_tag_name((CONTAINER_INDEX_NS, "File")))
            .enumerate()
        {
            let name = file.attribute("name").context(MissingNameSnafu { index })?;

            let source = file
                .children()
                .find(|node| node.has_tag_name((CONTAINER_INDEX_NS, "Delta")))
                .and_then(|delta| {
                    delta
                        .children()
                        .find(|node| node.has_tag_name((CONTAINER_INDEX_NS, "Source")))
                })
                .context(MissingSourceSnafu { name })?;

            let delta = DeltaKind::from_type_attr(source.attribute("type"));
            let offset = int_attr(&source, name, "offset")?;
            let length = int_attr(&source, name, "length")?;

            entries.push(ManifestEntry {
                name: name.to_string(),
                delta,
                source: SourceRange { offset, length },
            });
        }

        debug!("decoded manifest with {} entries", entries.len());

        Ok(Self { entries })
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the manifest describes no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the entries in document order.
    pub fn entries(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn int_attr(node: &roxmltree::Node<'_, '_>, name: &str, attribute: &'static str) -> Result<i64> {
    let value = node
        .attribute(attribute)
        .context(MissingAttributeSnafu { name, attribute })?;

    value
        .parse()
        .context(InvalidIntegerSnafu { name, attribute })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<Container xmlns="urn:ContainerIndex" version="1.0">
  <Files>
    <File name="Windows\System32\kernel.bin">
      <Delta>
        <Source type="PA30" offset="56" length="1024"/>
      </Delta>
    </File>
    <File name="setup/install.ini">
      <Delta>
        <Source type="RAW" offset="1080" length="0"/>
      </Delta>
    </File>
  </Files>
</Container>"#;

    #[test]
    fn decodes_entries_in_document_order() {
        let manifest = Manifest::parse(SAMPLE).unwrap();

        assert_eq!(manifest.len(), 2);

        let entries: Vec<_> = manifest.entries().collect();
        assert_eq!(entries[0].name, "Windows\\System32\\kernel.bin");
        assert_eq!(entries[0].delta, DeltaKind::Pa30);
        assert_eq!(
            entries[0].source,
            SourceRange {
                offset: 56,
                length: 1024
            }
        );
        assert_eq!(entries[1].name, "setup/install.ini");
        assert_eq!(entries[1].delta, DeltaKind::Raw);
        assert_eq!(entries[1].source.length, 0);
    }

    #[test]
    fn missing_type_defaults_to_raw() {
        let manifest = Manifest::parse(
            r#"<C xmlns="urn:ContainerIndex"><Files>
                 <File name="a"><Delta><Source offset="0" length="1"/></Delta></File>
               </Files></C>"#,
        )
        .unwrap();

        let entry = manifest.entries().next().unwrap();
        assert_eq!(entry.delta, DeltaKind::Raw);
        assert!(!entry.delta.needs_decode());
    }

    #[test]
    fn unknown_type_is_passthrough() {
        let manifest = Manifest::parse(
            r#"<C xmlns="urn:ContainerIndex"><Files>
                 <File name="a"><Delta><Source type="PA19" offset="0" length="1"/></Delta></File>
               </Files></C>"#,
        )
        .unwrap();

        let entry = manifest.entries().next().unwrap();
        assert_eq!(entry.delta, DeltaKind::Other("PA19".to_string()));
        assert!(!entry.delta.needs_decode());
    }

    #[test]
    fn rejects_non_xml_input() {
        assert!(matches!(
            Manifest::parse("this is not xml <<<"),
            Err(ManifestError::MalformedXml { .. })
        ));
    }

    #[test]
    fn rejects_missing_files_collection() {
        assert!(matches!(
            Manifest::parse(r#"<Container xmlns="urn:ContainerIndex"/>"#),
            Err(ManifestError::MissingFiles)
        ));
    }

    #[test]
    fn rejects_file_without_name() {
        let result = Manifest::parse(
            r#"<C xmlns="urn:ContainerIndex"><Files>
                 <File><Delta><Source offset="0" length="1"/></Delta></File>
               </Files></C>"#,
        );

        assert!(matches!(
            result,
            Err(ManifestError::MissingName { index: 0 })
        ));
    }

    #[test]
    fn rejects_file_without_source_descriptor() {
        let result = Manifest::parse(
            r#"<C xmlns="urn:ContainerIndex"><Files>
                 <File name="a"><Delta/></File>
               </Files></C>"#,
        );

        assert!(matches!(result, Err(ManifestError::MissingSource { .. })));
    }

    #[test]
    fn rejects_non_integer_offset() {
        let result = Manifest::parse(
            r#"<C xmlns="urn:ContainerIndex"><Files>
                 <File name="a"><Delta><Source offset="twelve" length="1"/></Delta></File>
               </Files></C>"#,
        );

        assert!(matches!(
            result,
            Err(ManifestError::InvalidInteger {
                attribute: "offset",
                ..
            })
        ));
    }

    #[test]
    fn elements_outside_the_namespace_are_ignored() {
        // A Files collection in no namespace does not satisfy the schema.
        assert!(matches!(
            Manifest::parse(r#"<Container xmlns="urn:ContainerIndex"><Files xmlns=""/></Container>"#),
            Err(ManifestError::MissingFiles)
        ));
    }

    #[test]
    fn both_separator_conventions_resolve_identically() {
        let backslashes = ManifestEntry {
            name: "dir\\sub\\file.bin".to_string(),
            delta: DeltaKind::Raw,
            source: SourceRange { offset: 0, length: 0 },
        };
        let slashes = ManifestEntry {
            name: "dir/sub/file.bin".to_string(),
            ..backslashes.clone()
        };

        assert_eq!(backslashes.to_path("out"), slashes.to_path("out"));
    }

    #[test]
    fn empty_path_components_are_dropped() {
        let entry = ManifestEntry {
            name: "dir//file.bin".to_string(),
            delta: DeltaKind::Raw,
            source: SourceRange { offset: 0, length: 0 },
        };

        assert_eq!(
            entry.to_path("out"),
            Path::new("out").join("dir").join("file.bin")
        );
    }
}
