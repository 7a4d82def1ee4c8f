use std::collections::HashMap;

use crate::model::{Location, Observer, Species};

/// Placeholder shown by an empty selection widget.
pub const EMPTY_CHOICE: &str = "-";

pub fn species_label(common_name: &str, scientific_name: Option<&str>) -> String {
    format!("{} ({})", common_name, scientific_name.unwrap_or(""))
}

pub fn location_label(location_name: &str, region: Option<&str>) -> String {
    format!("{} - {}", location_name, region.unwrap_or(""))
}

pub fn observer_label(name: &str, organization: Option<&str>) -> String {
    format!("{} ({})", name, organization.unwrap_or(""))
}

pub trait Labelled {
    fn label(&self) -> String;
    fn key(&self) -> i64;
}

impl Labelled for Species {
    fn label(&self) -> String {
        species_label(&self.common_name, self.scientific_name.as_deref())
    }

    fn key(&self) -> i64 {
        self.species_id
    }
}

impl Labelled for Location {
    fn label(&self) -> String {
        location_label(&self.location_name, self.region.as_deref())
    }

    fn key(&self) -> i64 {
        self.location_id
    }
}

impl Labelled for Observer {
    fn label(&self) -> String {
        observer_label(&self.name, self.organization.as_deref())
    }

    fn key(&self) -> i64 {
        self.observer_id
    }
}

/// Ordered label list plus label → primary key lookup. When two rows share a
/// label the later row wins, like a dict comprehension over the rows would.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    labels: Vec<String>,
    keys: HashMap<String, i64>,
}

impl LabelIndex {
    pub fn build<'a, T, I>(rows: I) -> Self
    where
        T: Labelled + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut index = LabelIndex::default();
        for row in rows {
            let label = row.label();
            if index.keys.insert(label.clone(), row.key()).is_none() {
                index.labels.push(label);
            }
        }
        index
    }

    pub fn resolve(&self, label: &str) -> Option<i64> {
        if label == EMPTY_CHOICE {
            return None;
        }
        self.keys.get(label).copied()
    }

    /// Labels in row order, or the placeholder when there are none.
    pub fn options(&self) -> Vec<String> {
        if self.labels.is_empty() {
            vec![EMPTY_CHOICE.to_string()]
        } else {
            self.labels.clone()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
