//! Record store built from an Apple Health export document.
//!
//! Parses the whole document once, keeping every record element (with its
//! nested beat sub-records) in document order plus the root's `Me` node.
//! Category lookups are linear scans over the kept records.

use crate::constants::{DEFAULT_RECORD_TAG, INSTANTANEOUS_BPM_TAG, ME_TAG, attributes};
use crate::error::{HealthError, Result};
use crate::models::{BeatSample, Category, MeNode, RawRecord};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Placeholder path reported for documents parsed from memory
const IN_MEMORY_SOURCE: &str = "<memory>";

/// Parsed export document
#[derive(Debug, Clone)]
pub struct RecordStore {
    source: PathBuf,
    record_tag: String,
    records: Vec<RawRecord>,
    me: Option<MeNode>,
}

impl RecordStore {
    /// Parse an export file, collecting `Record` elements
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_tag(path, DEFAULT_RECORD_TAG)
    }

    /// Parse an export file, collecting elements named `record_tag`
    pub fn open_with_tag(path: impl AsRef<Path>, record_tag: &str) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(HealthError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let start = Instant::now();
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| HealthError::Parse {
            path: path.to_path_buf(),
            reason: format!("document is not valid UTF-8: {}", e),
        })?;

        let store = Self::parse(&text, record_tag, path.to_path_buf())?;

        info!(
            "Loaded {} records from {} in {}ms (profile node {})",
            store.records.len(),
            path.display(),
            start.elapsed().as_millis(),
            if store.me.is_some() { "present" } else { "absent" }
        );

        Ok(store)
    }

    /// Parse an export document held in memory
    pub fn from_xml_str(xml: &str, record_tag: &str) -> Result<Self> {
        Self::parse(xml, record_tag, PathBuf::from(IN_MEMORY_SOURCE))
    }

    fn parse(xml: &str, record_tag: &str, source: PathBuf) -> Result<Self> {
        let mut builder = StoreBuilder::new(record_tag.as_bytes());
        let mut reader = Reader::from_str(xml);

        let parse_error = |reason: String| HealthError::Parse {
            path: source.clone(),
            reason,
        };

        loop {
            let position = reader.buffer_position();
            match reader.read_event() {
                Ok(Event::Start(element)) => builder
                    .open_element(&element, false)
                    .map_err(|e| parse_error(format!("{} at byte {}", e, position)))?,
                Ok(Event::Empty(element)) => builder
                    .open_element(&element, true)
                    .map_err(|e| parse_error(format!("{} at byte {}", e, position)))?,
                Ok(Event::End(_)) => builder.close_element(),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(parse_error(format!("{} at byte {}", e, position))),
            }
        }

        let (records, me) = builder.finish().map_err(parse_error)?;

        debug!(
            "Parsed {} <{}> elements from {}",
            records.len(),
            record_tag,
            source.display()
        );

        Ok(Self {
            source,
            record_tag: record_tag.to_string(),
            records,
            me,
        })
    }

    /// Records whose `type` equals `category_id`, in document order
    pub fn filter_by_category(&self, category_id: &str) -> Vec<&RawRecord> {
        self.records
            .iter()
            .filter(|record| record.attr(attributes::TYPE) == Some(category_id))
            .collect()
    }

    /// Number of records per known category
    ///
    /// Records whose `type` is not one of the extracted categories are not
    /// counted.
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for category in self
            .records
            .iter()
            .filter_map(|record| record.record_type().and_then(Category::from_identifier))
        {
            *counts.entry(category).or_insert(0) += 1;
        }
        counts
    }

    /// The root's `Me` node, when the document has one
    pub fn me(&self) -> Option<&MeNode> {
        self.me.as_ref()
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn record_tag(&self) -> &str {
        &self.record_tag
    }
}

/// Incremental state while walking the XML event stream
struct StoreBuilder<'t> {
    record_tag: &'t [u8],
    depth: usize,
    seen_root: bool,
    /// (element depth, index into `records`) for each open record element
    open_records: Vec<(usize, usize)>,
    records: Vec<RawRecord>,
    me: Option<MeNode>,
}

impl<'t> StoreBuilder<'t> {
    fn new(record_tag: &'t [u8]) -> Self {
        Self {
            record_tag,
            depth: 0,
            seen_root: false,
            open_records: Vec::new(),
            records: Vec::new(),
            me: None,
        }
    }

    fn open_element(&mut self, element: &BytesStart<'_>, self_closing: bool) -> std::result::Result<(), String> {
        let depth = self.depth + 1;

        if depth == 1 {
            if self.seen_root {
                return Err("content after the document element".to_string());
            }
            self.seen_root = true;
        }

        let name = element.name();
        let name = name.as_ref();

        // The root itself never counts as a record
        if depth >= 2 && name == self.record_tag {
            let index = self.records.len();
            self.records.push(RawRecord {
                attributes: collect_attributes(element)?,
                beats: Vec::new(),
            });
            if !self_closing {
                self.open_records.push((depth, index));
            }
        } else if depth == 2 && name == ME_TAG.as_bytes() && self.me.is_none() {
            self.me = Some(MeNode {
                attributes: collect_attributes(element)?,
            });
        } else if name == INSTANTANEOUS_BPM_TAG.as_bytes() && !self.open_records.is_empty() {
            let attrs = collect_attributes(element)?;
            let lookup = |key: &str| {
                attrs
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.clone())
            };
            let sample = BeatSample {
                bpm: lookup(attributes::BPM),
                time: lookup(attributes::TIME),
            };
            // Every enclosing record sees the sample as a descendant
            for &(_, index) in &self.open_records {
                self.records[index].beats.push(sample.clone());
            }
        }

        if !self_closing {
            self.depth = depth;
        }

        Ok(())
    }

    fn close_element(&mut self) {
        while let Some(&(depth, _)) = self.open_records.last() {
            if depth < self.depth {
                break;
            }
            self.open_records.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    fn finish(self) -> std::result::Result<(Vec<RawRecord>, Option<MeNode>), String> {
        if !self.seen_root {
            return Err("no element found".to_string());
        }
        if self.depth != 0 {
            return Err(format!("{} unclosed element(s) at end of document", self.depth));
        }
        Ok((self.records, self.me))
    }
}

/// Owned, unescaped attributes of an element in document order
fn collect_attributes(element: &BytesStart<'_>) -> std::result::Result<Vec<(String, String)>, String> {
    element
        .attributes()
        .map(|attribute| {
            let attribute = attribute.map_err(|e| e.to_string())?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| e.to_string())?
                .into_owned();
            Ok((key, value))
        })
        .collect()
}
