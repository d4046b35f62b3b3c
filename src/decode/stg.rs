use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};

use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use super::DecodeError;
use crate::model::{SignalGroupId, SignalGroupType};

const SECTION: &str = "#SIGNALGRUPPENDATEN";

// <id>, '<name>', '<type>' followed by columns we don't use
static RECORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+),\s*'([^']+)',\s*'([^']+)'.*$").expect("signal group record pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalGroupEntry {
    pub name: String,
    pub group_type: SignalGroupType,
}

/// Authoritative names and types of physical signal groups, read from the signal plan (STG)
/// export. Immutable once parsed, so one table can back any number of runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalGroupTable {
    entries: BTreeMap<SignalGroupId, SignalGroupEntry>,
}

impl SignalGroupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<R: Read>(reader: R) -> Result<Self, DecodeError> {
        let mut table = Self::new();
        let mut in_section = false;

        for line in BufReader::new(reader).lines() {
            let line = line?;
            if line.starts_with(SECTION) {
                in_section = true;
                continue;
            }
            if line.starts_with('#') {
                in_section = false;
            }
            if !in_section || line.trim().is_empty() || line.contains("::") {
                continue;
            }

            let caps = match RECORD.captures(&line) {
                Some(caps) => caps,
                None => continue,
            };
            let id: u32 = caps[1].parse().map_err(|_| DecodeError::InvalidValue {
                field: "signal group id",
                value: caps[1].to_string(),
            })?;
            match caps[3].parse::<SignalGroupType>() {
                Ok(group_type) => {
                    debug!("Signal group {}: '{}' ({})", id, &caps[2], group_type);
                    table.insert(SignalGroupId(id), caps[2].to_string(), group_type);
                }
                Err(err) => warn!("Skipping signal group {}: {}", id, err),
            }
        }

        info!("Read {} signal groups from table", table.len());
        Ok(table)
    }

    pub fn parse_str(raw: &str) -> Result<Self, DecodeError> {
        Self::parse(raw.as_bytes())
    }

    pub fn insert(&mut self, id: SignalGroupId, name: impl Into<String>, group_type: SignalGroupType) {
        self.entries.insert(
            id,
            SignalGroupEntry {
                name: name.into(),
                group_type,
            },
        );
    }

    pub fn get(&self, id: SignalGroupId) -> Option<&SignalGroupEntry> {
        self.entries.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalGroupId, &SignalGroupEntry)> {
        self.entries.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
